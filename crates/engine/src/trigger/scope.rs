// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event a successor is resolved in.
//!
//! Usually that is the finished build's own event. A successor owned by
//! another pipeline whose join includes the finished job is resolved in that
//! pipeline's event instead, using that event's graph.

use super::{Trigger, TriggerEngine};
use crate::error::TriggerError;
use crate::event::TriggerEvent;
use crate::lifecycle::InternalBuild;
use junction_adapters::{ScmAdapter, Store};
use junction_core::{Event, EventId, JobRef, PipelineId, WorkflowGraph};

pub(crate) struct Scope {
    pub event: Event,
    /// Identity new builds in this scope run as.
    pub username: String,
    pub scm_context: String,
    pub base_branch: Option<String>,
}

impl Scope {
    /// The finished build's event, acting as the request's user.
    pub fn local(trigger: &Trigger<'_>) -> Self {
        Self {
            event: trigger.event.clone(),
            username: trigger.request.username.clone(),
            scm_context: trigger.request.scm_context.clone(),
            base_branch: trigger.build().base_branch.clone(),
        }
    }

    /// Another pipeline's event, acting as that event's user.
    pub fn remote(event: Event) -> Self {
        Self {
            username: event.username.clone(),
            scm_context: event.scm_context.clone(),
            base_branch: event.base_branch.clone(),
            event,
        }
    }

    pub fn pipeline_id(&self) -> &PipelineId {
        &self.event.pipeline_id
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.event.workflow_graph
    }

    /// Members of `name`'s join in this scope's graph.
    pub fn join_members(&self, name: &str) -> Result<Vec<JobRef>, TriggerError> {
        self.graph()
            .join_sources(name)?
            .iter()
            .map(|source| JobRef::parse(source, self.pipeline_id()).map_err(TriggerError::from))
            .collect()
    }

    /// This scope's members of `name`'s join, plus members another graph
    /// declared for it.
    pub fn join_members_with(
        &self,
        name: &str,
        declared: &[JobRef],
    ) -> Result<Vec<JobRef>, TriggerError> {
        let mut members = self.join_members(name)?;
        for member in declared {
            if !members.iter().any(|m| m.is(&member.pipeline_id, &member.job_name)) {
                members.push(member.rescope(self.pipeline_id()));
            }
        }
        Ok(members)
    }

    pub fn build_request<'a>(&'a self, job_name: &'a str) -> InternalBuild<'a> {
        InternalBuild::new(&self.event, job_name)
            .actor(&self.username, &self.scm_context)
            .base_branch(self.base_branch.clone())
    }
}

impl<S: Store, M: ScmAdapter> TriggerEngine<S, M> {
    pub(crate) async fn event_scope(&self, id: &EventId) -> Result<Scope, TriggerError> {
        let event = self
            .store
            .get_event(id)
            .await?
            .ok_or_else(|| TriggerError::EventNotFound(id.clone()))?;
        Ok(Scope::remote(event))
    }

    /// Event of the target's pipeline holding a cross-pipeline join.
    ///
    /// Prefers the event the finished build's provenance names for that
    /// pipeline, then an event already opened from the finished build's event,
    /// and otherwise opens one. A failed build never opens an event; `None`
    /// means there is nothing to settle.
    pub(crate) async fn join_scope(
        &self,
        trigger: &Trigger<'_>,
        target: &JobRef,
    ) -> Result<Option<Scope>, TriggerError> {
        if let Some(event_id) = trigger.build().parent_builds.event_id(&target.pipeline_id) {
            return self.event_scope(event_id).await.map(Some);
        }

        let existing = self
            .store
            .find_triggered_event(&target.pipeline_id, &trigger.job.pipeline_id, &trigger.event.id)
            .await?;
        if let Some(event) = existing {
            tracing::debug!(event_id = %event.id, target = %target, "joining existing event");
            return Ok(Some(Scope::remote(event)));
        }
        if trigger.failed() {
            return Ok(None);
        }

        let event = self
            .trigger_event(TriggerEvent {
                pipeline_id: target.pipeline_id.clone(),
                start_from: target.job_name.clone(),
                cause_message: trigger.cause_message(),
                parent_build_id: Some(trigger.build().id.clone()),
                parent_builds: Some(trigger.provenance.clone()),
                parent_event_id: None,
            })
            .await?;
        Ok(Some(Scope::remote(event)))
    }
}
