// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job: a named node of a pipeline's workflow.

use crate::pipeline::PipelineId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job.
    ///
    /// A job is identified by `(pipeline, name)`; the ID is the opaque handle
    /// builds and graph nodes refer to.
    pub struct JobId;
}

/// Whether builds may be created for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Enabled,
    Disabled,
}

impl JobState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, JobState::Enabled)
    }
}

crate::wire_enum! {
    JobState {
        Enabled => "ENABLED",
        Disabled => "DISABLED",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub pipeline_id: PipelineId,
    pub name: String,
    pub state: JobState,
}

impl Job {
    /// Only enabled jobs get builds; creation for a disabled job is a no-op.
    pub fn accepts_builds(&self) -> bool {
        self.state.is_enabled()
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-1",
            pipeline_id: PipelineId = "1",
            name: String = "main",
        }
        set {
            state: JobState = JobState::Enabled,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
