// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger orchestration.
//!
//! When a build finishes, every successor of its job in the event's workflow
//! graph gets one branch. A branch either creates and starts the successor
//! (no join), records the finished build in the successor's join and starts
//! or discards it once the join is settled, or opens an event in another
//! pipeline. Branches run concurrently and fail independently.

mod join;
mod scope;

use crate::completion::JoinPolicy;
use crate::env::{self, EngineConfig};
use crate::error::TriggerError;
use futures_util::stream::{self, StreamExt};
use junction_adapters::{ScmAdapter, Store};
use junction_core::{Build, BuildId, Event, Job, JobRef, ParentBuilds, Pipeline};

pub(crate) use scope::Scope;

/// Collaborators of the engine
pub struct EngineDeps<S, M> {
    pub store: S,
    pub scm: M,
}

/// Decides and applies the downstream effects of finished builds.
///
/// Holds no state between calls; everything is re-read from the store.
pub struct TriggerEngine<S, M> {
    pub(crate) store: S,
    pub(crate) scm: M,
    pub(crate) config: EngineConfig,
}

/// A finished build whose successors should be triggered.
#[derive(Debug, Clone)]
pub struct NextJobsRequest {
    pub pipeline: Pipeline,
    /// Job the build ran, named as in the pipeline's graph.
    pub job: Job,
    pub build: Build,
    pub username: String,
    pub scm_context: String,
    /// Resolve joins that span pipelines. When off, a failed join member
    /// discards the join target at once and external successors always get a
    /// fresh event.
    pub external_join: bool,
}

impl NextJobsRequest {
    pub fn new(
        pipeline: Pipeline,
        job: Job,
        build: Build,
        username: impl Into<String>,
        scm_context: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            job,
            build,
            username: username.into(),
            scm_context: scm_context.into(),
            external_join: true,
        }
    }

    /// Like [`NextJobsRequest::new`], with `external_join` from
    /// `JUNCTION_EXTERNAL_JOIN`.
    pub fn from_env_defaults(
        pipeline: Pipeline,
        job: Job,
        build: Build,
        username: impl Into<String>,
        scm_context: impl Into<String>,
    ) -> Self {
        Self::new(pipeline, job, build, username, scm_context)
            .external_join(env::external_join())
    }

    pub fn external_join(mut self, enabled: bool) -> Self {
        self.external_join = enabled;
        self
    }
}

/// What happened to one successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Queued and handed to execution.
    Started(Build),
    /// Join target recorded but its join is not settled yet.
    Waiting(Build),
    /// The successor's build was already past `CREATED`; only its provenance
    /// and parents were updated.
    Merged(Build),
    /// Speculative join target discarded after a member failed.
    Removed(BuildId),
    /// A fresh event was opened in another pipeline. `build` is the
    /// successor's build in it, `None` if that job is disabled.
    EventCreated { event: Event, build: Option<Build> },
    /// Nothing to do: disabled job, or a failed build with no join to settle.
    Skipped,
}

impl TriggerOutcome {
    /// The successor's build, if it still has one.
    pub fn build(&self) -> Option<&Build> {
        match self {
            TriggerOutcome::Started(build)
            | TriggerOutcome::Waiting(build)
            | TriggerOutcome::Merged(build) => Some(build),
            TriggerOutcome::EventCreated { build, .. } => build.as_ref(),
            TriggerOutcome::Removed(_) | TriggerOutcome::Skipped => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TriggerOutcome::Started(_) => "started",
            TriggerOutcome::Waiting(_) => "waiting",
            TriggerOutcome::Merged(_) => "merged",
            TriggerOutcome::Removed(_) => "removed",
            TriggerOutcome::EventCreated { .. } => "event_created",
            TriggerOutcome::Skipped => "skipped",
        }
    }
}

/// Result of one successor branch.
#[derive(Debug)]
pub struct NextJobOutcome {
    /// Successor as named in the finished build's graph.
    pub job_name: String,
    pub outcome: Result<TriggerOutcome, TriggerError>,
}

impl NextJobOutcome {
    pub fn build(&self) -> Option<&Build> {
        self.outcome.as_ref().ok().and_then(TriggerOutcome::build)
    }
}

/// The finished build, as every branch sees it.
pub(crate) struct Trigger<'a> {
    pub request: &'a NextJobsRequest,
    pub event: Event,
    pub job: JobRef,
    /// The build's own provenance plus an entry for the build itself.
    pub provenance: ParentBuilds,
    pub policy: JoinPolicy,
}

impl Trigger<'_> {
    pub fn build(&self) -> &Build {
        &self.request.build
    }

    /// A failed build starts nothing; it can only settle joins.
    pub fn failed(&self) -> bool {
        self.request.build.status.is_failure()
    }

    pub fn is(&self, member: &JobRef) -> bool {
        member.is(&self.job.pipeline_id, &self.job.job_name)
    }

    pub fn cause_message(&self) -> String {
        format!("Triggered by {}", self.job.qualified())
    }
}

impl<S: Store, M: ScmAdapter> TriggerEngine<S, M> {
    pub fn new(deps: EngineDeps<S, M>, config: EngineConfig) -> Self {
        Self { store: deps.store, scm: deps.scm, config }
    }

    /// Trigger every successor of the finished build's job.
    ///
    /// Returns one outcome per successor, in graph order. A failing branch is
    /// logged and reported in its outcome without affecting the others; only
    /// failing to load the build's event fails the whole call.
    pub async fn trigger_next_jobs(
        &self,
        request: &NextJobsRequest,
    ) -> Result<Vec<NextJobOutcome>, TriggerError> {
        let build = &request.build;
        let pipeline = &request.pipeline;
        let event = self
            .store
            .get_event(&build.event_id)
            .await?
            .ok_or_else(|| TriggerError::EventNotFound(build.event_id.clone()))?;

        let successors = event.workflow_graph.next_jobs(&request.job.name, pipeline.chain_pr);
        let own = ParentBuilds::single(&pipeline.id, &event.id, &request.job.name, &build.id);
        let trigger = Trigger {
            request,
            job: JobRef::internal(&pipeline.id, &request.job.name),
            provenance: build.parent_builds.merge(&own),
            policy: JoinPolicy::for_external_join(request.external_join),
            event,
        };
        tracing::info!(
            build_id = %build.id,
            job = %trigger.job,
            status = %build.status,
            successors = successors.len(),
            "triggering next jobs",
        );

        let trigger = &trigger;
        let outcomes = stream::iter(successors)
            .map(|job_name| async move {
                let outcome = self.trigger_successor(trigger, &job_name).await;
                match &outcome {
                    Ok(o) => tracing::info!(
                        build_id = %trigger.build().id,
                        next_job = %job_name,
                        outcome = o.kind(),
                        "successor handled",
                    ),
                    Err(e) => tracing::error!(
                        build_id = %trigger.build().id,
                        next_job = %job_name,
                        error = %e,
                        "successor failed",
                    ),
                }
                NextJobOutcome { job_name, outcome }
            })
            .buffered(self.config.fanout_limit.max(1))
            .collect()
            .await;
        Ok(outcomes)
    }

    /// Classify one successor and drive it.
    async fn trigger_successor(
        &self,
        trigger: &Trigger<'_>,
        name: &str,
    ) -> Result<TriggerOutcome, TriggerError> {
        let local = Scope::local(trigger);
        let target = JobRef::parse(name, local.pipeline_id())?;
        let members = local.join_members(name)?;

        if !target.is_external() {
            return self.run_in_scope(trigger, &local, &target.job_name, &members).await;
        }
        if !trigger.request.external_join {
            return self.open_external_event(trigger, &target).await;
        }

        if members.iter().any(|m| trigger.is(m)) {
            let Some(remote) = self.join_scope(trigger, &target).await? else {
                return Ok(TriggerOutcome::Skipped);
            };
            let members = remote.join_members_with(&target.job_name, &members)?;
            return self.run_in_scope(trigger, &remote, &target.job_name, &members).await;
        }

        // Not a member here, but the build came from the target's pipeline:
        // the successor belongs to that pipeline's running event, and any
        // join it has there must settle before it starts.
        if let Some(event_id) = trigger.build().parent_builds.event_id(&target.pipeline_id) {
            let remote = self.event_scope(event_id).await?;
            let members = remote.join_members(&target.job_name)?;
            if members.is_empty() {
                return self.run_in_scope(trigger, &remote, &target.job_name, &members).await;
            }
            return self.settle_join(trigger, &remote, &target.job_name, &members).await;
        }
        self.open_external_event(trigger, &target).await
    }

    /// Start a fresh event in the target's pipeline.
    async fn open_external_event(
        &self,
        trigger: &Trigger<'_>,
        target: &JobRef,
    ) -> Result<TriggerOutcome, TriggerError> {
        if trigger.failed() {
            return Ok(TriggerOutcome::Skipped);
        }
        let (event, build) = self
            .create_external_build(
                target,
                trigger.build(),
                trigger.provenance.clone(),
                trigger.cause_message(),
                true,
            )
            .await?;
        Ok(TriggerOutcome::EventCreated { event, build })
    }
}

#[cfg(test)]
#[path = "trigger_tests/mod.rs"]
mod tests;
