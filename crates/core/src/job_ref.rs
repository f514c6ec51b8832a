// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline-qualified job references.
//!
//! Workflow graphs name jobs of other pipelines as `sd@<pipeline>:<job>` and
//! their own jobs by bare name. [`JobRef`] is the parsed form, always carrying
//! the owning pipeline, so callers never string-match the prefix.

use crate::pipeline::PipelineId;
use std::fmt;
use thiserror::Error;

/// Prefix marking a job name as qualified by its owning pipeline.
pub const QUALIFIED_PREFIX: &str = "sd@";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobRefError {
    #[error("malformed qualified job name {0:?}: expected sd@<pipeline>:<job>")]
    Malformed(String),
}

/// Whether `name` carries the `sd@` qualification.
pub fn is_qualified(name: &str) -> bool {
    name.starts_with(QUALIFIED_PREFIX)
}

/// A job identified by owning pipeline and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobRef {
    pub pipeline_id: PipelineId,
    pub job_name: String,
    /// Owned by a pipeline other than the one whose graph named it.
    pub external: bool,
}

impl JobRef {
    /// A job of `pipeline_id`, named from inside that pipeline.
    pub fn internal(pipeline_id: &PipelineId, job_name: impl Into<String>) -> Self {
        Self { pipeline_id: pipeline_id.clone(), job_name: job_name.into(), external: false }
    }

    /// Parse `name` as written in the graph of pipeline `scope`.
    ///
    /// Bare names belong to `scope`. A qualified name naming `scope` itself is
    /// treated as internal.
    pub fn parse(name: &str, scope: &PipelineId) -> Result<Self, JobRefError> {
        let Some(rest) = name.strip_prefix(QUALIFIED_PREFIX) else {
            return Ok(Self::internal(scope, name));
        };
        let (pipeline, job) =
            rest.split_once(':').ok_or_else(|| JobRefError::Malformed(name.to_string()))?;
        if pipeline.is_empty() || job.is_empty() {
            return Err(JobRefError::Malformed(name.to_string()));
        }
        Ok(Self {
            external: pipeline != scope.as_str(),
            pipeline_id: PipelineId::new(pipeline),
            job_name: job.to_string(),
        })
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Same job, regardless of how it was named.
    pub fn is(&self, pipeline_id: &PipelineId, job_name: &str) -> bool {
        self.pipeline_id == *pipeline_id && self.job_name == job_name
    }

    /// `sd@<pipeline>:<job>`
    pub fn qualified(&self) -> String {
        format!("{}{}:{}", QUALIFIED_PREFIX, self.pipeline_id, self.job_name)
    }

    /// Re-anchor to the graph of pipeline `scope`.
    pub fn rescope(&self, scope: &PipelineId) -> Self {
        Self { external: self.pipeline_id != *scope, ..self.clone() }
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", QUALIFIED_PREFIX, self.pipeline_id, self.job_name)
    }
}

#[cfg(test)]
#[path = "job_ref_tests.rs"]
mod tests;
