// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger engine errors

use junction_adapters::{ScmError, StoreError};
use junction_core::{BuildId, EventId, GraphError, JobRefError, PipelineId};
use thiserror::Error;

/// Errors that can occur while triggering downstream work
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("pipeline not found: {0}")]
    PipelineNotFound(PipelineId),
    #[error("job {name:?} not found in pipeline {pipeline_id}")]
    JobNotFound { pipeline_id: PipelineId, name: String },
    #[error("event not found: {0}")]
    EventNotFound(EventId),
    #[error("build not found: {0}")]
    BuildNotFound(BuildId),
    #[error("pipeline {0} has no admin with a usable scm credential")]
    NoPipelineAdmin(PipelineId),
    /// The workflow graph names a job it does not contain, or names one in a
    /// form that cannot be parsed.
    #[error("malformed workflow graph: {0}")]
    MalformedGraph(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("scm error: {0}")]
    Scm(#[from] ScmError),
}

impl TriggerError {
    /// A referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TriggerError::PipelineNotFound(_)
                | TriggerError::JobNotFound { .. }
                | TriggerError::EventNotFound(_)
                | TriggerError::BuildNotFound(_)
                | TriggerError::Store(StoreError::Missing { .. })
        )
    }
}

impl From<GraphError> for TriggerError {
    fn from(e: GraphError) -> Self {
        TriggerError::MalformedGraph(e.to_string())
    }
}

impl From<JobRefError> for TriggerError {
    fn from(e: JobRefError) -> Self {
        TriggerError::MalformedGraph(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
