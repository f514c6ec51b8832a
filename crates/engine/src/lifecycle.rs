// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build lifecycle: create, merge into, remove, and start single builds.

use crate::error::TriggerError;
use crate::event::TriggerEvent;
use crate::trigger::TriggerEngine;
use junction_adapters::{NewBuild, ScmAdapter, Store, StoreError};
use junction_core::{
    Build, BuildId, Event, Job, JobId, JobRef, ParentBuilds, PipelineId, WorkflowGraph,
};

/// A build to create for a job of the event's pipeline.
///
/// `sha`, `config_pipeline_sha`, and `pr_ref` come from the event.
#[derive(Debug, Clone)]
pub struct InternalBuild<'a> {
    pub event: &'a Event,
    pub job_name: &'a str,
    pub parent_build_id: Vec<BuildId>,
    pub parent_builds: ParentBuilds,
    pub username: &'a str,
    pub scm_context: &'a str,
    pub base_branch: Option<String>,
    /// Queue and start on creation. Defaults to `true`.
    pub start: bool,
}

impl<'a> InternalBuild<'a> {
    pub fn new(event: &'a Event, job_name: &'a str) -> Self {
        Self {
            event,
            job_name,
            parent_build_id: Vec::new(),
            parent_builds: ParentBuilds::new(),
            username: &event.username,
            scm_context: &event.scm_context,
            base_branch: event.base_branch.clone(),
            start: true,
        }
    }

    pub fn parent(mut self, id: &BuildId) -> Self {
        if !self.parent_build_id.contains(id) {
            self.parent_build_id.push(id.clone());
        }
        self
    }

    pub fn provenance(mut self, parent_builds: ParentBuilds) -> Self {
        self.parent_builds = parent_builds;
        self
    }

    pub fn actor(mut self, username: &'a str, scm_context: &'a str) -> Self {
        self.username = username;
        self.scm_context = scm_context;
        self
    }

    pub fn base_branch(mut self, base_branch: Option<String>) -> Self {
        self.base_branch = base_branch;
        self
    }

    pub fn start(mut self, start: bool) -> Self {
        self.start = start;
        self
    }
}

/// Where a requested build ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Created(Build),
    /// The event already had a build of the job; the request's provenance and
    /// parents were merged into it.
    Merged(Build),
}

impl Placement {
    pub fn build(&self) -> &Build {
        match self {
            Placement::Created(build) | Placement::Merged(build) => build,
        }
    }

    pub fn into_build(self) -> Build {
        match self {
            Placement::Created(build) | Placement::Merged(build) => build,
        }
    }
}

impl<S: Store, M: ScmAdapter> TriggerEngine<S, M> {
    /// Look a job up by pipeline and name.
    pub(crate) async fn require_job(
        &self,
        pipeline_id: &PipelineId,
        name: &str,
    ) -> Result<Job, TriggerError> {
        self.store.find_job(pipeline_id, name).await?.ok_or_else(|| TriggerError::JobNotFound {
            pipeline_id: pipeline_id.clone(),
            name: name.to_string(),
        })
    }

    pub(crate) async fn require_build(&self, id: &BuildId) -> Result<Build, TriggerError> {
        self.store.get_build(id).await?.ok_or_else(|| TriggerError::BuildNotFound(id.clone()))
    }

    /// Job behind node `name` of a graph of `pipeline_id`: the node's own id,
    /// else the pipeline's job of that name. PR copies have no node and are
    /// always looked up by name.
    pub(crate) async fn resolve_job_id(
        &self,
        pipeline_id: &PipelineId,
        graph: &WorkflowGraph,
        name: &str,
    ) -> Result<Option<JobId>, TriggerError> {
        if let Some(id) = graph.node(name).and_then(|n| n.id.clone()) {
            return Ok(Some(id));
        }
        Ok(self.store.find_job(pipeline_id, name).await?.map(|j| j.id))
    }

    /// Create a build of a job in the request's event.
    ///
    /// Returns `None` for a disabled job. If the event already has a build of
    /// the job, the request is merged into that build instead.
    pub async fn create_internal_build(
        &self,
        request: InternalBuild<'_>,
    ) -> Result<Option<Placement>, TriggerError> {
        let event = request.event;
        let job = self.require_job(&event.pipeline_id, request.job_name).await?;
        if !job.accepts_builds() {
            tracing::debug!(
                pipeline_id = %event.pipeline_id,
                job = request.job_name,
                "job disabled, no build created",
            );
            return Ok(None);
        }

        let new = NewBuild {
            job_id: job.id.clone(),
            event_id: event.id.clone(),
            sha: event.sha.clone(),
            parent_build_id: request.parent_build_id.clone(),
            parent_builds: request.parent_builds.clone(),
            username: request.username.to_string(),
            scm_context: request.scm_context.to_string(),
            config_pipeline_sha: event.config_pipeline_sha.clone(),
            pr_ref: event.pr_ref.clone(),
            base_branch: request.base_branch.clone(),
            start: request.start,
        };
        match self.store.create_build(new).await {
            Ok(build) => {
                tracing::info!(
                    build_id = %build.id,
                    event_id = %event.id,
                    job = request.job_name,
                    status = %build.status,
                    "build created",
                );
                Ok(Some(Placement::Created(build)))
            }
            Err(StoreError::Conflict { existing, .. }) => {
                let existing = self.require_build(&existing).await?;
                let merged = self
                    .merge_provenance(
                        &existing,
                        &[&request.parent_builds],
                        &request.parent_build_id,
                    )
                    .await?;
                tracing::info!(
                    build_id = %merged.id,
                    job = request.job_name,
                    "build already exists, merged provenance",
                );
                Ok(Some(Placement::Merged(merged)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open an event in the target's pipeline starting from the target job,
    /// and create the target's build in it.
    ///
    /// The build is `None` when the target job is disabled.
    pub async fn create_external_build(
        &self,
        target: &JobRef,
        parent_build: &Build,
        parent_builds: ParentBuilds,
        cause_message: String,
        start: bool,
    ) -> Result<(Event, Option<Build>), TriggerError> {
        let event = self
            .trigger_event(TriggerEvent {
                pipeline_id: target.pipeline_id.clone(),
                start_from: target.job_name.clone(),
                cause_message,
                parent_build_id: Some(parent_build.id.clone()),
                parent_builds: Some(parent_builds.clone()),
                parent_event_id: None,
            })
            .await?;

        let request = InternalBuild::new(&event, &target.job_name)
            .parent(&parent_build.id)
            .provenance(parent_builds)
            .start(start);
        let build = self.create_internal_build(request).await?.map(Placement::into_build);
        Ok((event, build))
    }

    /// Merge provenance sources into a build and record `parent` as one of
    /// its parents. Later sources win.
    pub async fn update_with_provenance(
        &self,
        build: &Build,
        sources: &[&ParentBuilds],
        parent: &BuildId,
    ) -> Result<Build, TriggerError> {
        self.merge_provenance(build, sources, std::slice::from_ref(parent)).await
    }

    /// Every provenance write goes through here. Nothing is persisted when
    /// the merge changes nothing.
    pub(crate) async fn merge_provenance(
        &self,
        build: &Build,
        sources: &[&ParentBuilds],
        parents: &[BuildId],
    ) -> Result<Build, TriggerError> {
        let mut updated = build.clone();
        let sources = std::iter::once(&build.parent_builds).chain(sources.iter().copied());
        updated.parent_builds = ParentBuilds::merge_all(sources);
        for parent in parents {
            updated.add_parent(parent);
        }
        if updated == *build {
            return Ok(updated);
        }
        Ok(self.store.update_build(&updated).await?)
    }

    /// Discard a build created for a join that can no longer pass.
    pub async fn remove_speculative_build(
        &self,
        build: Option<&Build>,
    ) -> Result<Option<BuildId>, TriggerError> {
        let Some(build) = build else {
            return Ok(None);
        };
        self.store.remove_build(&build.id).await?;
        tracing::info!(build_id = %build.id, job_id = %build.job_id, "speculative build removed");
        Ok(Some(build.id.clone()))
    }

    /// Queue a build and hand it to execution.
    ///
    /// Fails with [`StoreError::AlreadyStarted`] when the build is no longer
    /// `CREATED`, e.g. a sibling join member started it first.
    pub async fn promote_and_start(&self, build: &Build) -> Result<Build, TriggerError> {
        let started = self.store.start_build(&build.id).await?;
        tracing::info!(build_id = %started.id, job_id = %started.job_id, "build started");
        Ok(started)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
