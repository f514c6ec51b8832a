//! Fixtures shared by every spec.
//!
//! Graph edges are written `"src -> dest"`. Bare node names get a job with id
//! `<pipeline>/<name>`; `~` triggers and `sd@` names get none. Every
//! pipeline's repository head is `sha-<pipeline>`, and user `admin` holds a
//! token for every pipeline.

pub use junction_adapters::FakeScmAdapter;
pub use junction_core::{Build, BuildId, BuildStatus, Event, EventId, JobRef, PipelineId};
pub use junction_engine::{
    EngineConfig, EngineDeps, NextJobOutcome, NextJobsRequest, TriggerEngine, TriggerOutcome,
};
pub use junction_storage::{MemoryStore, Snapshot};

use junction_core::SequentialIdGen;
use serde_json::{json, Map, Value};

pub type Engine = TriggerEngine<MemoryStore<SequentialIdGen>, FakeScmAdapter>;

fn split_edge(edge: &str) -> (&str, &str) {
    let Some((src, dest)) = edge.split_once(" -> ") else {
        panic!("edge {edge:?} is not `src -> dest`");
    };
    (src.trim(), dest.trim())
}

fn has_job(name: &str) -> bool {
    !name.starts_with('~') && !name.starts_with("sd@")
}

/// Store contents, built up as JSON.
#[derive(Default)]
pub struct Fixture {
    pipelines: Map<String, Value>,
    jobs: Map<String, Value>,
    events: Map<String, Value>,
    builds: Map<String, Value>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline(mut self, id: &str, edges: &[&str], joins: &[&str]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        let mut edge_values = Vec::new();
        for (edge, join) in edges.iter().map(|e| (e, false)).chain(joins.iter().map(|e| (e, true)))
        {
            let (src, dest) = split_edge(edge);
            for name in [src, dest] {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            edge_values.push(json!({ "src": src, "dest": dest, "join": join }));
        }

        let mut nodes = Vec::new();
        for name in names {
            if has_job(name) {
                let job_id = format!("{id}/{name}");
                nodes.push(json!({ "name": name, "id": job_id }));
                self.jobs.insert(
                    job_id.clone(),
                    json!({ "id": job_id, "pipeline_id": id, "name": name, "state": "ENABLED" }),
                );
            } else {
                nodes.push(json!({ "name": name }));
            }
        }

        self.pipelines.insert(
            id.to_string(),
            json!({
                "id": id,
                "name": format!("acme/{id}"),
                "scm_uri": format!("github.com:{id}:main"),
                "scm_context": "github:github.com",
                "admins": ["admin"],
                "workflow_graph": { "nodes": nodes, "edges": edge_values },
            }),
        );
        self
    }

    /// Turn on PR chaining for a pipeline.
    pub fn chain_pr(mut self, pipeline: &str) -> Self {
        self.pipelines[pipeline]["chain_pr"] = json!(true);
        self
    }

    /// Drop the job ids from a pipeline's graph nodes, leaving names only.
    pub fn without_node_ids(mut self, pipeline: &str) -> Self {
        if let Some(nodes) = self.pipelines[pipeline]["workflow_graph"]["nodes"].as_array_mut() {
            for node in nodes.iter_mut().filter_map(Value::as_object_mut) {
                node.remove("id");
            }
        }
        self
    }

    /// Add a job the graph has no node for, such as a PR copy.
    pub fn job(mut self, pipeline: &str, name: &str) -> Self {
        let job_id = format!("{pipeline}/{name}");
        self.jobs.insert(
            job_id.clone(),
            json!({ "id": job_id, "pipeline_id": pipeline, "name": name, "state": "ENABLED" }),
        );
        self
    }

    pub fn disable(mut self, pipeline: &str, name: &str) -> Self {
        self.jobs[&format!("{pipeline}/{name}")]["state"] = json!("DISABLED");
        self
    }

    pub fn event(self, id: &str, pipeline: &str) -> Self {
        self.event_with(id, pipeline, json!({}))
    }

    /// Re-run of `parent` restarting at `start_from`.
    pub fn rerun(self, id: &str, pipeline: &str, parent: &str, start_from: &str) -> Self {
        self.event_with(
            id,
            pipeline,
            json!({ "parent_event_id": parent, "start_from": start_from }),
        )
    }

    fn event_with(mut self, id: &str, pipeline: &str, extra: Value) -> Self {
        let mut event = json!({
            "id": id,
            "pipeline_id": pipeline,
            "workflow_graph": self.pipelines[pipeline]["workflow_graph"].clone(),
            "start_from": "~commit",
            "sha": format!("sha-{pipeline}"),
            "cause_message": "Started by admin",
            "scm_context": "github:github.com",
            "username": "admin",
        });
        if let (Some(event), Value::Object(extra)) = (event.as_object_mut(), extra) {
            event.extend(extra);
        }
        self.events.insert(id.to_string(), event);
        self
    }

    /// Build of job `name` in `event`, with a wire status such as `"RUNNING"`.
    pub fn build(mut self, id: &str, event: &str, name: &str, status: &str) -> Self {
        let pipeline = self.events[event]["pipeline_id"].as_str().unwrap_or_default().to_string();
        self.builds.insert(
            id.to_string(),
            json!({
                "id": id,
                "job_id": format!("{pipeline}/{name}"),
                "event_id": event,
                "sha": format!("sha-{pipeline}"),
                "status": status,
                "username": "admin",
                "scm_context": "github:github.com",
            }),
        );
        self
    }

    /// Record that `build` was fed by `parent`, a build of `name` in `event`.
    pub fn fed_by(mut self, build: &str, event: &str, name: &str, parent: &str) -> Self {
        let pipeline = self.events[event]["pipeline_id"].as_str().unwrap_or_default().to_string();
        self.builds[build]["parent_builds"] =
            json!({ pipeline: { "event_id": event, "jobs": { name: parent } } });
        self
    }

    pub fn to_json(&self) -> String {
        json!({
            "pipelines": self.pipelines,
            "jobs": self.jobs,
            "events": self.events,
            "builds": self.builds,
        })
        .to_string()
    }

    pub fn load(self) -> World {
        World::from_snapshot(Snapshot::from_json(&self.to_json()).unwrap())
    }
}

/// An engine over a seeded store.
pub struct World {
    pub engine: Engine,
    pub store: MemoryStore<SequentialIdGen>,
    pub scm: FakeScmAdapter,
}

impl World {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let scm = FakeScmAdapter::new();
        scm.set_token("admin", "t0k3n");
        for pipeline in snapshot.pipelines.values() {
            scm.set_sha(&pipeline.scm_uri, &format!("sha-{}", pipeline.id));
        }
        let store = MemoryStore::from_snapshot(snapshot, SequentialIdGen::new("new"));
        let engine = TriggerEngine::new(
            EngineDeps { store: store.clone(), scm: scm.clone() },
            EngineConfig::default(),
        );
        Self { engine, store, scm }
    }

    /// Move a build to `status` and trigger what follows it.
    pub async fn finish(&self, build: &str, status: BuildStatus) -> Vec<NextJobOutcome> {
        self.finish_with(build, status, true).await
    }

    pub async fn finish_with(
        &self,
        build: &str,
        status: BuildStatus,
        external_join: bool,
    ) -> Vec<NextJobOutcome> {
        let build = self.store.set_build_status(&BuildId::new(build), status).unwrap();
        let snapshot = self.store.snapshot();
        let job = snapshot.jobs[&build.job_id].clone();
        let pipeline = snapshot.pipelines[&job.pipeline_id].clone();
        let request =
            NextJobsRequest::new(pipeline, job, build, "admin", "github:github.com")
                .external_join(external_join);
        self.engine.trigger_next_jobs(&request).await.unwrap()
    }

    /// The build of job `name` in `event`, if any.
    pub fn build_of(&self, event: &str, name: &str) -> Option<Build> {
        let snapshot = self.store.snapshot();
        let event = snapshot.events.get(event)?;
        let job_id = format!("{}/{name}", event.pipeline_id);
        self.store.find_build(&event.id, &job_id.into())
    }

    pub fn events_of(&self, pipeline: &str) -> Vec<Event> {
        self.store.pipeline_events(&PipelineId::new(pipeline))
    }

    pub fn started(&self) -> Vec<BuildId> {
        self.store.started()
    }
}

/// Successful outcome for successor `name`.
pub fn outcome<'a>(results: &'a [NextJobOutcome], name: &str) -> &'a TriggerOutcome {
    let Some(result) = results.iter().find(|r| r.job_name == name) else {
        panic!("no outcome for {name}");
    };
    match &result.outcome {
        Ok(outcome) => outcome,
        Err(e) => panic!("{name} failed: {e}"),
    }
}

pub fn job(pipeline: &str, name: &str) -> JobRef {
    JobRef::internal(&PipelineId::new(pipeline), name)
}
