// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Store`].
//!
//! All state sits behind one lock, so every call is atomic. Clones share the
//! same state.

use crate::snapshot::Snapshot;
use async_trait::async_trait;
use junction_adapters::{NewBuild, NewEvent, Store, StoreError};
use junction_core::{
    Build, BuildId, BuildStatus, Event, EventId, IdGen, Job, JobId, Pipeline, PipelineId,
    UuidIdGen,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct MemoryState {
    snapshot: Snapshot,
    /// Event ids in creation order, oldest first.
    event_order: Vec<EventId>,
    /// Builds handed to execution, in start order.
    started: Vec<BuildId>,
}

#[derive(Clone)]
pub struct MemoryStore<G: IdGen = UuidIdGen> {
    inner: Arc<Mutex<MemoryState>>,
    ids: G,
}

impl MemoryStore<UuidIdGen> {
    pub fn new() -> Self {
        Self::with_ids(UuidIdGen)
    }
}

impl Default for MemoryStore<UuidIdGen> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: IdGen> MemoryStore<G> {
    pub fn with_ids(ids: G) -> Self {
        Self { inner: Arc::new(Mutex::new(MemoryState::default())), ids }
    }

    /// Seed from a snapshot. Loaded events count as created in id order.
    pub fn from_snapshot(snapshot: Snapshot, ids: G) -> Self {
        let event_order = snapshot.events.keys().cloned().collect();
        let state = MemoryState { snapshot, event_order, started: Vec::new() };
        Self { inner: Arc::new(Mutex::new(state)), ids }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().snapshot.clone()
    }

    pub fn insert_pipeline(&self, pipeline: Pipeline) {
        self.inner.lock().snapshot.pipelines.insert(pipeline.id.clone(), pipeline);
    }

    pub fn insert_job(&self, job: Job) {
        self.inner.lock().snapshot.jobs.insert(job.id.clone(), job);
    }

    pub fn insert_event(&self, event: Event) {
        let mut inner = self.inner.lock();
        if !inner.event_order.contains(&event.id) {
            inner.event_order.push(event.id.clone());
        }
        inner.snapshot.events.insert(event.id.clone(), event);
    }

    pub fn insert_build(&self, build: Build) {
        self.inner.lock().snapshot.builds.insert(build.id.clone(), build);
    }

    /// Move a build to `status`, as its executor would.
    pub fn set_build_status(&self, id: &BuildId, status: BuildStatus) -> Result<Build, StoreError> {
        let mut inner = self.inner.lock();
        let build = inner.snapshot.builds.get_mut(id).ok_or_else(|| missing("build", id))?;
        build.status = status;
        Ok(build.clone())
    }

    /// The build of `job_id` in `event_id`, if one exists.
    pub fn find_build(&self, event_id: &EventId, job_id: &JobId) -> Option<Build> {
        let inner = self.inner.lock();
        find_build(&inner.snapshot, event_id, job_id).cloned()
    }

    /// Every event of a pipeline, oldest first.
    pub fn pipeline_events(&self, pipeline_id: &PipelineId) -> Vec<Event> {
        let inner = self.inner.lock();
        inner
            .event_order
            .iter()
            .filter_map(|id| inner.snapshot.events.get(id))
            .filter(|e| e.pipeline_id == *pipeline_id)
            .cloned()
            .collect()
    }

    /// Builds handed to execution so far, in start order.
    pub fn started(&self) -> Vec<BuildId> {
        self.inner.lock().started.clone()
    }
}

fn missing(kind: &'static str, id: &str) -> StoreError {
    StoreError::Missing { kind, id: id.to_string() }
}

fn find_build<'a>(snapshot: &'a Snapshot, event_id: &EventId, job_id: &JobId) -> Option<&'a Build> {
    snapshot.builds.values().find(|b| b.event_id == *event_id && b.job_id == *job_id)
}

#[async_trait]
impl<G: IdGen> Store for MemoryStore<G> {
    async fn get_pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, StoreError> {
        Ok(self.inner.lock().snapshot.pipelines.get(id).cloned())
    }

    async fn find_job(
        &self,
        pipeline_id: &PipelineId,
        name: &str,
    ) -> Result<Option<Job>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .snapshot
            .jobs
            .values()
            .find(|j| j.pipeline_id == *pipeline_id && j.name == name)
            .cloned())
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.inner.lock().snapshot.events.get(id).cloned())
    }

    async fn create_event(&self, new: NewEvent) -> Result<Event, StoreError> {
        let mut inner = self.inner.lock();
        let pipeline = inner
            .snapshot
            .pipelines
            .get(&new.pipeline_id)
            .ok_or_else(|| missing("pipeline", &new.pipeline_id))?;

        let event = Event {
            id: EventId::new(self.ids.next()),
            workflow_graph: pipeline.workflow_graph.clone(),
            pipeline_id: new.pipeline_id,
            start_from: new.start_from,
            parent_event_id: new.parent_event_id,
            parent_build_id: new.parent_build_id,
            parent_builds: new.parent_builds.unwrap_or_default(),
            sha: new.sha,
            config_pipeline_sha: None,
            pr_ref: None,
            base_branch: None,
            cause_message: new.cause_message,
            scm_context: new.scm_context,
            username: new.username,
        };
        tracing::debug!(
            event_id = %event.id,
            pipeline_id = %event.pipeline_id,
            start_from = %event.start_from,
            "event created",
        );
        inner.event_order.push(event.id.clone());
        inner.snapshot.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn find_triggered_event(
        &self,
        pipeline_id: &PipelineId,
        source_pipeline_id: &PipelineId,
        source_event_id: &EventId,
    ) -> Result<Option<Event>, StoreError> {
        let inner = self.inner.lock();
        // Newest first: a re-triggered source event reuses the latest one.
        Ok(inner
            .event_order
            .iter()
            .rev()
            .filter_map(|id| inner.snapshot.events.get(id))
            .find(|e| {
                e.pipeline_id == *pipeline_id
                    && e.parent_builds.event_id(source_pipeline_id) == Some(source_event_id)
            })
            .cloned())
    }

    async fn event_builds(&self, event_id: &EventId) -> Result<Vec<Build>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.snapshot.builds.values().filter(|b| b.event_id == *event_id).cloned().collect())
    }

    async fn get_build(&self, id: &BuildId) -> Result<Option<Build>, StoreError> {
        Ok(self.inner.lock().snapshot.builds.get(id).cloned())
    }

    async fn create_build(&self, new: NewBuild) -> Result<Build, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.snapshot.jobs.contains_key(&new.job_id) {
            return Err(missing("job", &new.job_id));
        }
        if !inner.snapshot.events.contains_key(&new.event_id) {
            return Err(missing("event", &new.event_id));
        }
        if let Some(existing) = find_build(&inner.snapshot, &new.event_id, &new.job_id) {
            return Err(StoreError::Conflict {
                event_id: new.event_id,
                job_id: new.job_id,
                existing: existing.id.clone(),
            });
        }

        let build = Build {
            id: BuildId::new(self.ids.next()),
            job_id: new.job_id,
            event_id: new.event_id,
            sha: new.sha,
            status: if new.start { BuildStatus::Queued } else { BuildStatus::Created },
            parent_build_id: new.parent_build_id,
            parent_builds: new.parent_builds,
            base_branch: new.base_branch,
            pr_ref: new.pr_ref,
            config_pipeline_sha: new.config_pipeline_sha,
            username: new.username,
            scm_context: new.scm_context,
        };
        tracing::debug!(
            build_id = %build.id,
            job_id = %build.job_id,
            status = %build.status,
            "build created",
        );
        if new.start {
            inner.started.push(build.id.clone());
        }
        inner.snapshot.builds.insert(build.id.clone(), build.clone());
        Ok(build)
    }

    async fn update_build(&self, build: &Build) -> Result<Build, StoreError> {
        let mut inner = self.inner.lock();
        let stored =
            inner.snapshot.builds.get_mut(&build.id).ok_or_else(|| missing("build", &build.id))?;
        *stored = build.clone();
        Ok(build.clone())
    }

    async fn remove_build(&self, id: &BuildId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.snapshot.builds.remove(id).ok_or_else(|| missing("build", id))?;
        tracing::debug!(build_id = %id, "build removed");
        Ok(())
    }

    async fn start_build(&self, id: &BuildId) -> Result<Build, StoreError> {
        let mut inner = self.inner.lock();
        let stored = inner.snapshot.builds.get_mut(id).ok_or_else(|| missing("build", id))?;
        if stored.status != BuildStatus::Created {
            return Err(StoreError::AlreadyStarted { id: id.clone(), status: stored.status });
        }
        stored.status = BuildStatus::Queued;
        let started = stored.clone();
        inner.started.push(id.clone());
        tracing::debug!(build_id = %id, "build started");
        Ok(started)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
