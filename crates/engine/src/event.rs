// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event creation.

use crate::error::TriggerError;
use crate::trigger::TriggerEngine;
use junction_adapters::{NewEvent, ScmAdapter, ScmConfig, ScmError, Store};
use junction_core::{BuildId, Event, EventId, ParentBuilds, Pipeline, PipelineId};

/// Request to open an event in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub pipeline_id: PipelineId,
    pub start_from: String,
    pub cause_message: String,
    pub parent_build_id: Option<BuildId>,
    pub parent_builds: Option<ParentBuilds>,
    pub parent_event_id: Option<EventId>,
}

/// Admin acting for a pipeline, with the token the SCM issued them.
struct Admin {
    username: String,
    token: String,
}

impl<S: Store, M: ScmAdapter> TriggerEngine<S, M> {
    /// Open an event in a pipeline at the repository's current commit.
    ///
    /// The event runs as the first pipeline admin the SCM holds a credential
    /// for.
    pub async fn trigger_event(&self, request: TriggerEvent) -> Result<Event, TriggerError> {
        let pipeline = self
            .store
            .get_pipeline(&request.pipeline_id)
            .await?
            .ok_or_else(|| TriggerError::PipelineNotFound(request.pipeline_id.clone()))?;
        let admin = self.resolve_admin(&pipeline).await?;

        let sha = self
            .scm
            .commit_sha(&ScmConfig {
                scm_context: pipeline.scm_context.clone(),
                scm_uri: pipeline.scm_uri.clone(),
                token: admin.token,
            })
            .await?;

        let event = self
            .store
            .create_event(NewEvent {
                pipeline_id: pipeline.id.clone(),
                start_from: request.start_from,
                sha,
                cause_message: request.cause_message,
                scm_context: pipeline.scm_context.clone(),
                username: admin.username,
                parent_build_id: request.parent_build_id,
                parent_builds: request.parent_builds,
                parent_event_id: request.parent_event_id,
            })
            .await?;
        tracing::info!(
            event_id = %event.id,
            pipeline_id = %pipeline.id,
            start_from = %event.start_from,
            username = %event.username,
            "event opened",
        );
        Ok(event)
    }

    async fn resolve_admin(&self, pipeline: &Pipeline) -> Result<Admin, TriggerError> {
        for username in &pipeline.admins {
            match self.scm.admin_token(&pipeline.scm_context, username).await {
                Ok(token) => return Ok(Admin { username: username.clone(), token }),
                Err(ScmError::NoCredential { .. }) => {
                    tracing::debug!(
                        pipeline_id = %pipeline.id,
                        %username,
                        "admin has no credential",
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(TriggerError::NoPipelineAdmin(pipeline.id.clone()))
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
