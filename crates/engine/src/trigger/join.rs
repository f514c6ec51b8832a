// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Successors inside one scope: plain triggers and joins.

use super::{Scope, Trigger, TriggerEngine, TriggerOutcome};
use crate::completion::{JoinDecision, JoinStatus};
use crate::error::TriggerError;
use crate::lifecycle::Placement;
use junction_adapters::{ScmAdapter, Store, StoreError};
use junction_core::{Build, BuildId, BuildStatus, JobId, JobRef, ParentBuilds};
use std::collections::HashMap;

impl<S: Store, M: ScmAdapter> TriggerEngine<S, M> {
    /// Drive successor `name` of `scope`: as a join when the finished job is
    /// one of `members`, otherwise as a plain trigger.
    pub(super) async fn run_in_scope(
        &self,
        trigger: &Trigger<'_>,
        scope: &Scope,
        name: &str,
        members: &[JobRef],
    ) -> Result<TriggerOutcome, TriggerError> {
        if members.iter().any(|m| trigger.is(m)) {
            self.settle_join(trigger, scope, name, members).await
        } else {
            self.start_plain(trigger, scope, name).await
        }
    }

    async fn start_plain(
        &self,
        trigger: &Trigger<'_>,
        scope: &Scope,
        name: &str,
    ) -> Result<TriggerOutcome, TriggerError> {
        if trigger.failed() {
            tracing::debug!(next_job = name, "trigger failed, not starting successor");
            return Ok(TriggerOutcome::Skipped);
        }

        let request = scope
            .build_request(name)
            .parent(&trigger.build().id)
            .provenance(trigger.provenance.clone());
        let outcome = match self.create_internal_build(request).await? {
            None => TriggerOutcome::Skipped,
            Some(Placement::Created(build)) => TriggerOutcome::Started(build),
            Some(Placement::Merged(build)) if build.status == BuildStatus::Created => {
                self.start_target(&build).await?
            }
            Some(Placement::Merged(build)) => TriggerOutcome::Merged(build),
        };
        Ok(outcome)
    }

    /// Record the finished build in the join target's provenance, then start
    /// or discard the target once its join is settled.
    pub(super) async fn settle_join(
        &self,
        trigger: &Trigger<'_>,
        scope: &Scope,
        name: &str,
        members: &[JobRef],
    ) -> Result<TriggerOutcome, TriggerError> {
        let job = self.require_job(scope.pipeline_id(), name).await?;
        if !job.accepts_builds() {
            tracing::debug!(next_job = name, "join target disabled");
            return Ok(TriggerOutcome::Skipped);
        }

        let skeleton = ParentBuilds::skeleton(members);
        let existing = self
            .store
            .event_builds(&scope.event.id)
            .await?
            .into_iter()
            .find(|b| b.job_id == job.id);
        let build = match existing {
            Some(existing) => {
                let sources = [&skeleton, &trigger.provenance];
                self.update_with_provenance(&existing, &sources, &trigger.build().id).await?
            }
            // Nothing speculative to discard
            None if trigger.failed() => return Ok(TriggerOutcome::Skipped),
            None => {
                let request = scope
                    .build_request(name)
                    .parent(&trigger.build().id)
                    .provenance(skeleton.merge(&trigger.provenance))
                    .start(false);
                match self.create_internal_build(request).await? {
                    Some(placement) => placement.into_build(),
                    None => return Ok(TriggerOutcome::Skipped),
                }
            }
        };

        let build = self.fill_provenance_gaps(scope, members, build).await?;
        let status = self.join_status(trigger, members, &build.parent_builds).await?;
        tracing::info!(
            build_id = %build.id,
            next_job = name,
            done = status.done,
            has_failure = status.has_failure,
            "join evaluated",
        );

        // Already queued or past it; nothing left to decide
        if build.status != BuildStatus::Created {
            return Ok(TriggerOutcome::Merged(build));
        }
        let outcome = match trigger.policy.decide(status) {
            JoinDecision::Wait => TriggerOutcome::Waiting(build),
            JoinDecision::Remove => {
                self.remove_speculative_build(Some(&build)).await?;
                TriggerOutcome::Removed(build.id)
            }
            JoinDecision::Start => self.start_target(&build).await?,
        };
        Ok(outcome)
    }

    /// Start a `CREATED` build. One a concurrent caller started first is
    /// reported as merged.
    async fn start_target(&self, build: &Build) -> Result<TriggerOutcome, TriggerError> {
        match self.promote_and_start(build).await {
            Ok(started) => Ok(TriggerOutcome::Started(started)),
            Err(TriggerError::Store(StoreError::AlreadyStarted { status, .. })) => {
                tracing::debug!(build_id = %build.id, %status, "build already started");
                Ok(TriggerOutcome::Merged(self.require_build(&build.id).await?))
            }
            Err(e) => Err(e),
        }
    }

    /// Record builds for members the provenance has no build for, taken from
    /// the work visible to the scope: the scope event's builds (with re-run
    /// upstream) for its own pipeline, and the recorded event's builds for
    /// other pipelines.
    async fn fill_provenance_gaps(
        &self,
        scope: &Scope,
        members: &[JobRef],
        build: Build,
    ) -> Result<Build, TriggerError> {
        let gaps: Vec<&JobRef> =
            members.iter().filter(|m| build.parent_builds.member_build(m).is_none()).collect();
        if gaps.is_empty() {
            return Ok(build);
        }

        let visible = self.visible_builds(&scope.event).await?;
        let mut found = Vec::new();
        for member in gaps {
            let candidate = if member.pipeline_id == *scope.pipeline_id() {
                let job_id = self.member_job_id(scope, member).await?;
                job_id.and_then(|id| visible.iter().find(|b| b.job_id == id).cloned())
            } else {
                self.external_member_build(member, &build.parent_builds).await?
            };
            // The target never satisfies its own join
            if let Some(candidate) = candidate.filter(|c| c.id != build.id) {
                found.push(ParentBuilds::member(member, &candidate.id));
            }
        }
        if found.is_empty() {
            return Ok(build);
        }

        tracing::debug!(build_id = %build.id, filled = found.len(), "filled provenance gaps");
        let sources: Vec<&ParentBuilds> = found.iter().collect();
        self.merge_provenance(&build, &sources, &[]).await
    }

    /// Job backing a member of the scope's own pipeline.
    async fn member_job_id(
        &self,
        scope: &Scope,
        member: &JobRef,
    ) -> Result<Option<JobId>, TriggerError> {
        let graph = scope.graph();
        let qualified = member.qualified();
        let name = if graph.node(&member.job_name).is_none() && graph.node(&qualified).is_some() {
            qualified.as_str()
        } else {
            member.job_name.as_str()
        };
        if graph.node(name).is_none() && !graph.contains(name) {
            return Err(TriggerError::MalformedGraph(format!(
                "join member {member} is not in the graph of pipeline {}",
                scope.pipeline_id()
            )));
        }
        if let Some(id) = graph.node(name).and_then(|n| n.id.clone()) {
            return Ok(Some(id));
        }
        self.resolve_job_id(&member.pipeline_id, graph, &member.job_name).await
    }

    /// Build of a member owned by another pipeline, from the event recorded
    /// for that pipeline.
    async fn external_member_build(
        &self,
        member: &JobRef,
        provenance: &ParentBuilds,
    ) -> Result<Option<Build>, TriggerError> {
        let Some(event_id) = provenance.event_id(&member.pipeline_id) else {
            return Ok(None);
        };
        let Some(job) = self.store.find_job(&member.pipeline_id, &member.job_name).await? else {
            return Ok(None);
        };
        let builds = self.store.event_builds(event_id).await?;
        Ok(builds.into_iter().find(|b| b.job_id == job.id))
    }

    /// Fetch the status of every recorded member build and evaluate the join.
    async fn join_status(
        &self,
        trigger: &Trigger<'_>,
        members: &[JobRef],
        provenance: &ParentBuilds,
    ) -> Result<JoinStatus, TriggerError> {
        let mut statuses: HashMap<BuildId, BuildStatus> = HashMap::new();
        for member in members {
            let Some(id) = provenance.member_build(member) else {
                continue;
            };
            if statuses.contains_key(id) {
                continue;
            }
            // The request carries the finished build's final status
            let status = if *id == trigger.build().id {
                trigger.build().status
            } else {
                self.require_build(id).await?.status
            };
            statuses.insert(id.clone(), status);
        }
        Ok(JoinStatus::evaluate(members, provenance, |id| statuses.get(id).copied()))
    }
}
