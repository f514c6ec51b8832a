// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence contract for pipelines, jobs, events, and builds.
//!
//! Each call is atomic for the single entity it touches; nothing spans
//! entities. `create_build` enforces that an event holds at most one build
//! per job, and `start_build` that a build is started at most once.

use async_trait::async_trait;
use junction_core::{
    Build, BuildId, BuildStatus, Event, EventId, Job, JobId, ParentBuilds, Pipeline, PipelineId,
};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event already has a build for this job.
    #[error("event {event_id} already has build {existing} for job {job_id}")]
    Conflict { event_id: EventId, job_id: JobId, existing: BuildId },
    /// The build left `CREATED` before this caller could start it.
    #[error("build {id} is already {status}")]
    AlreadyStarted { id: BuildId, status: BuildStatus },
    /// Update or remove of an entity that does not exist.
    #[error("{kind} {id} does not exist")]
    Missing { kind: &'static str, id: String },
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Fields for a new build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuild {
    pub job_id: JobId,
    pub event_id: EventId,
    pub sha: String,
    pub parent_build_id: Vec<BuildId>,
    pub parent_builds: ParentBuilds,
    pub username: String,
    pub scm_context: String,
    pub config_pipeline_sha: Option<String>,
    pub pr_ref: Option<String>,
    pub base_branch: Option<String>,
    /// Queue and start the build as part of creating it.
    pub start: bool,
}

/// Fields for a new event. The store snapshots the pipeline's current
/// workflow graph into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub pipeline_id: PipelineId,
    pub start_from: String,
    pub sha: String,
    pub cause_message: String,
    pub scm_context: String,
    pub username: String,
    pub parent_build_id: Option<BuildId>,
    pub parent_builds: Option<ParentBuilds>,
    pub parent_event_id: Option<EventId>,
}

/// Entity store used by the trigger engine.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    async fn get_pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, StoreError>;

    /// Look a job up by its compound key.
    async fn find_job(
        &self,
        pipeline_id: &PipelineId,
        name: &str,
    ) -> Result<Option<Job>, StoreError>;

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, StoreError>;

    async fn create_event(&self, new: NewEvent) -> Result<Event, StoreError>;

    /// Event of `pipeline_id` whose provenance records `source_event_id`
    /// for `source_pipeline_id`, i.e. the event that pipeline opened when
    /// triggered from that source event.
    async fn find_triggered_event(
        &self,
        pipeline_id: &PipelineId,
        source_pipeline_id: &PipelineId,
        source_event_id: &EventId,
    ) -> Result<Option<Event>, StoreError>;

    /// All builds of an event.
    async fn event_builds(&self, event_id: &EventId) -> Result<Vec<Build>, StoreError>;

    async fn get_build(&self, id: &BuildId) -> Result<Option<Build>, StoreError>;

    /// Create a build. Fails with [`StoreError::Conflict`] if the event
    /// already has a build for the job.
    async fn create_build(&self, new: NewBuild) -> Result<Build, StoreError>;

    /// Persist every field of `build`, replacing the stored copy.
    async fn update_build(&self, build: &Build) -> Result<Build, StoreError>;

    async fn remove_build(&self, id: &BuildId) -> Result<(), StoreError>;

    /// Move a `CREATED` build to `QUEUED` and hand it to execution, as one
    /// step. Fails with [`StoreError::AlreadyStarted`] if the stored build
    /// is in any other status, so a build is started at most once.
    async fn start_build(&self, id: &BuildId) -> Result<Build, StoreError>;
}
