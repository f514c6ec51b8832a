// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serializable image of a store's contents.
//!
//! Used to seed a [`crate::MemoryStore`] from fixtures and to dump it for
//! inspection. Maps are ordered so dumps are stable.

use junction_core::{Build, BuildId, Event, EventId, Job, JobId, Pipeline, PipelineId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A record points at an entity the snapshot does not contain.
    #[error("{kind} {id} references missing {missing}")]
    Dangling { kind: &'static str, id: String, missing: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub pipelines: BTreeMap<PipelineId, Pipeline>,
    #[serde(default)]
    pub jobs: BTreeMap<JobId, Job>,
    #[serde(default)]
    pub events: BTreeMap<EventId, Event>,
    #[serde(default)]
    pub builds: BTreeMap<BuildId, Build>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.check_references()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write atomically: serialize to a sibling temp file, then rename.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_json()?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Every job names a known pipeline, every event a known pipeline, and
    /// every build a known job and event.
    pub fn check_references(&self) -> Result<(), SnapshotError> {
        for job in self.jobs.values() {
            if !self.pipelines.contains_key(&job.pipeline_id) {
                return Err(dangling("job", &job.id, format!("pipeline {}", job.pipeline_id)));
            }
        }
        for event in self.events.values() {
            if !self.pipelines.contains_key(&event.pipeline_id) {
                return Err(dangling("event", &event.id, format!("pipeline {}", event.pipeline_id)));
            }
        }
        for build in self.builds.values() {
            if !self.jobs.contains_key(&build.job_id) {
                return Err(dangling("build", &build.id, format!("job {}", build.job_id)));
            }
            if !self.events.contains_key(&build.event_id) {
                return Err(dangling("build", &build.id, format!("event {}", build.event_id)));
            }
        }
        Ok(())
    }
}

fn dangling(kind: &'static str, id: &str, missing: String) -> SnapshotError {
    SnapshotError::Dangling { kind, id: id.to_string(), missing }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
