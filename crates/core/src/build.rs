// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build: one execution of one job within one event.

use crate::event::EventId;
use crate::job::JobId;
use crate::provenance::ParentBuilds;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a build.
    pub struct BuildId;
}

/// Lifecycle status of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStatus {
    /// Exists but has not been asked to run (e.g. waiting on a join)
    Created,
    Queued,
    Running,
    Success,
    Failure,
    Aborted,
    /// Finished with warnings; does not block a join
    Unstable,
    /// Superseded by a newer build of the same job
    Collapsed,
}

impl BuildStatus {
    /// Finished for join purposes.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            BuildStatus::Success
                | BuildStatus::Failure
                | BuildStatus::Aborted
                | BuildStatus::Unstable
                | BuildStatus::Collapsed
        )
    }

    /// Fails any join it is a member of.
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildStatus::Failure | BuildStatus::Aborted | BuildStatus::Collapsed)
    }
}

crate::wire_enum! {
    BuildStatus {
        Created => "CREATED",
        Queued => "QUEUED",
        Running => "RUNNING",
        Success => "SUCCESS",
        Failure => "FAILURE",
        Aborted => "ABORTED",
        Unstable => "UNSTABLE",
        Collapsed => "COLLAPSED",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub job_id: JobId,
    pub event_id: EventId,
    pub sha: String,
    pub status: BuildStatus,
    /// Builds that triggered this one. Join targets collect one per member.
    #[serde(default)]
    pub parent_build_id: Vec<BuildId>,
    /// Which upstream build fed this build, per pipeline and job.
    #[serde(default)]
    pub parent_builds: ParentBuilds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_pipeline_sha: Option<String>,
    pub username: String,
    pub scm_context: String,
}

impl Build {
    /// Record `id` as a parent. Already-recorded parents are not repeated.
    pub fn add_parent(&mut self, id: &BuildId) {
        if !self.parent_build_id.contains(id) {
            self.parent_build_id.push(id.clone());
        }
    }
}

crate::builder! {
    pub struct BuildBuilder => Build {
        into {
            id: BuildId = "build-1",
            job_id: JobId = "job-1",
            event_id: EventId = "event-1",
            sha: String = "58393af682d61de87789fb4961645c42180cec5a",
            username: String = "admin",
            scm_context: String = "github:github.com",
        }
        set {
            status: BuildStatus = BuildStatus::Success,
            parent_build_id: Vec<BuildId> = Vec::new(),
            parent_builds: ParentBuilds = ParentBuilds::default(),
            base_branch: Option<String> = None,
            pr_ref: Option<String> = None,
            config_pipeline_sha: Option<String> = None,
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
