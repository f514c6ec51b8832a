// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.
//!
//! Jobs created here get the id `<pipeline>/<name>`; every pipeline's
//! repository is `github.com:<pipeline>:main` at commit `sha-<pipeline>`.

use crate::{EngineConfig, EngineDeps, NextJobsRequest, TriggerEngine};
use junction_adapters::FakeScmAdapter;
use junction_core::test_support::graph;
use junction_core::{
    Build, BuildStatus, Event, Job, JobId, JobState, Pipeline, PipelineId, SequentialIdGen,
};
use junction_storage::MemoryStore;
use tracing_subscriber::EnvFilter;

/// Convenience alias for the fully-typed test engine.
pub(crate) type TestEngine = TriggerEngine<MemoryStore<SequentialIdGen>, FakeScmAdapter>;

/// Test context holding the engine and handles on its collaborators.
pub(crate) struct TestContext {
    pub engine: TestEngine,
    pub store: MemoryStore<SequentialIdGen>,
    pub scm: FakeScmAdapter,
}

/// Engine over an empty store, with user `admin` holding an SCM token.
pub(crate) fn setup() -> TestContext {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let store = MemoryStore::with_ids(SequentialIdGen::new("id"));
    let scm = FakeScmAdapter::new();
    scm.set_token("admin", "t0k3n");
    let engine = TriggerEngine::new(
        EngineDeps { store: store.clone(), scm: scm.clone() },
        EngineConfig::default(),
    );
    TestContext { engine, store, scm }
}

pub(crate) fn job_id(pipeline_id: &str, name: &str) -> JobId {
    JobId::new(format!("{pipeline_id}/{name}"))
}

pub(crate) fn scm_uri(pipeline_id: &str) -> String {
    format!("github.com:{pipeline_id}:main")
}

impl TestContext {
    /// Pipeline with a job for every bare node of the graph built from
    /// `edges` and `joins`.
    pub(crate) fn pipeline(
        &self,
        pipeline_id: &str,
        edges: &[(&str, &str)],
        joins: &[(&str, &str)],
    ) -> Pipeline {
        let mut workflow = graph(edges, joins);
        for node in &mut workflow.nodes {
            if node.id.is_some() {
                node.id = Some(job_id(pipeline_id, &node.name));
                self.add_job(pipeline_id, &node.name);
            }
        }
        let pipeline = Pipeline::builder()
            .id(pipeline_id)
            .scm_uri(scm_uri(pipeline_id))
            .workflow_graph(workflow)
            .build();
        self.scm.set_sha(&pipeline.scm_uri, &format!("sha-{pipeline_id}"));
        self.store.insert_pipeline(pipeline.clone());
        pipeline
    }

    /// Same as [`TestContext::pipeline`], with PR chaining on.
    pub(crate) fn pr_pipeline(
        &self,
        pipeline_id: &str,
        edges: &[(&str, &str)],
        joins: &[(&str, &str)],
    ) -> Pipeline {
        let mut pipeline = self.pipeline(pipeline_id, edges, joins);
        pipeline.chain_pr = true;
        self.store.insert_pipeline(pipeline.clone());
        pipeline
    }

    /// Add a job the graph has no node for, such as a PR copy.
    pub(crate) fn add_job(&self, pipeline_id: &str, name: &str) -> Job {
        let job = Job::builder()
            .id(job_id(pipeline_id, name))
            .pipeline_id(pipeline_id)
            .name(name)
            .build();
        self.store.insert_job(job.clone());
        job
    }

    pub(crate) fn job(&self, pipeline_id: &str, name: &str) -> Job {
        Job::builder().id(job_id(pipeline_id, name)).pipeline_id(pipeline_id).name(name).build()
    }

    pub(crate) fn disable(&self, pipeline_id: &str, name: &str) {
        let mut job = self.job(pipeline_id, name);
        job.state = JobState::Disabled;
        self.store.insert_job(job);
    }

    /// Event of `pipeline` snapshotting its current graph.
    pub(crate) fn event(&self, pipeline: &Pipeline, id: &str) -> Event {
        let event = Event::builder()
            .id(id)
            .pipeline_id(pipeline.id.clone())
            .sha(format!("sha-{}", pipeline.id))
            .workflow_graph(pipeline.workflow_graph.clone())
            .build();
        self.store.insert_event(event.clone());
        event
    }

    /// Re-run of `parent` restarting at `start_from`.
    pub(crate) fn rerun_event(
        &self,
        pipeline: &Pipeline,
        id: &str,
        parent: &Event,
        start_from: &str,
    ) -> Event {
        let mut event = self.event(pipeline, id);
        event.parent_event_id = Some(parent.id.clone());
        event.start_from = start_from.to_string();
        self.store.insert_event(event.clone());
        event
    }

    /// Build of job `name` of the event's pipeline.
    pub(crate) fn build(&self, event: &Event, name: &str, id: &str, status: BuildStatus) -> Build {
        let build = Build::builder()
            .id(id)
            .job_id(job_id(&event.pipeline_id, name))
            .event_id(event.id.clone())
            .sha(event.sha.clone())
            .status(status)
            .build();
        self.store.insert_build(build.clone());
        build
    }

    /// Request for `build`, a build of job `name`, run by `admin`.
    pub(crate) fn request(&self, pipeline: &Pipeline, name: &str, build: &Build) -> NextJobsRequest {
        NextJobsRequest::new(
            pipeline.clone(),
            self.job(&pipeline.id, name),
            build.clone(),
            "admin",
            "github:github.com",
        )
    }

    /// The build of job `name` in `event`, if any.
    pub(crate) fn find(&self, event: &Event, name: &str) -> Option<Build> {
        self.store.find_build(&event.id, &job_id(&event.pipeline_id, name))
    }

    /// Events of a pipeline, oldest first.
    pub(crate) fn events(&self, pipeline_id: &str) -> Vec<Event> {
        self.store.pipeline_events(&PipelineId::new(pipeline_id))
    }
}
