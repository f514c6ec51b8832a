// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build provenance (`parent_builds`).
//!
//! Records, per pipeline and per job, which upstream build fed a downstream
//! build, and which event that pipeline's builds belong to. A `None` build
//! means the upstream job has not produced a build for this join yet.
//!
//! Maps are values: they are combined with [`ParentBuilds::merge`], which is
//! right-biased, associative and idempotent, and never lets a `None` erase a
//! recorded id.

use crate::build::BuildId;
use crate::event::EventId;
use crate::job_ref::JobRef;
use crate::pipeline::PipelineId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance recorded for one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineBuilds {
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub jobs: BTreeMap<String, Option<BuildId>>,
}

impl PipelineBuilds {
    fn merge_from(&mut self, later: &PipelineBuilds) {
        if later.event_id.is_some() {
            self.event_id.clone_from(&later.event_id);
        }
        for (job, build) in &later.jobs {
            let slot = self.jobs.entry(job.clone()).or_default();
            if build.is_some() {
                slot.clone_from(build);
            }
        }
    }
}

/// Provenance map: pipeline → event + job → build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentBuilds(BTreeMap<PipelineId, PipelineBuilds>);

impl ParentBuilds {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `None` entry per join member, grouped by owning pipeline.
    pub fn skeleton<'a>(members: impl IntoIterator<Item = &'a JobRef>) -> Self {
        let mut map = BTreeMap::<PipelineId, PipelineBuilds>::new();
        for member in members {
            map.entry(member.pipeline_id.clone())
                .or_default()
                .jobs
                .insert(member.job_name.clone(), None);
        }
        Self(map)
    }

    /// The single entry recording `build_id` of `job_name` in `event_id`.
    pub fn single(
        pipeline_id: &PipelineId,
        event_id: &EventId,
        job_name: &str,
        build_id: &BuildId,
    ) -> Self {
        let mut jobs = BTreeMap::new();
        jobs.insert(job_name.to_string(), Some(build_id.clone()));
        let entry = PipelineBuilds { event_id: Some(event_id.clone()), jobs };
        Self(BTreeMap::from([(pipeline_id.clone(), entry)]))
    }

    /// Records `build_id` for `member` without touching its pipeline's event.
    pub fn member(member: &JobRef, build_id: &BuildId) -> Self {
        let mut jobs = BTreeMap::new();
        jobs.insert(member.job_name.clone(), Some(build_id.clone()));
        let entry = PipelineBuilds { event_id: None, jobs };
        Self(BTreeMap::from([(member.pipeline_id.clone(), entry)]))
    }

    /// Right-biased merge: recorded values in `later` win, `None` in `later`
    /// never overwrites, and every key of either side is kept.
    pub fn merge(&self, later: &ParentBuilds) -> ParentBuilds {
        let mut merged = self.clone();
        for (pipeline_id, builds) in &later.0 {
            merged.0.entry(pipeline_id.clone()).or_default().merge_from(builds);
        }
        merged
    }

    /// Merge left to right.
    pub fn merge_all<'a>(maps: impl IntoIterator<Item = &'a ParentBuilds>) -> ParentBuilds {
        maps.into_iter().fold(ParentBuilds::new(), |acc, map| acc.merge(map))
    }

    pub fn pipeline(&self, pipeline_id: &PipelineId) -> Option<&PipelineBuilds> {
        self.0.get(pipeline_id)
    }

    /// Event recorded for a pipeline, if any.
    pub fn event_id(&self, pipeline_id: &PipelineId) -> Option<&EventId> {
        self.pipeline(pipeline_id)?.event_id.as_ref()
    }

    /// Build recorded for a job, if any.
    pub fn build_id(&self, pipeline_id: &PipelineId, job_name: &str) -> Option<&BuildId> {
        self.pipeline(pipeline_id)?.jobs.get(job_name)?.as_ref()
    }

    /// Build recorded for a join member, if any.
    pub fn member_build(&self, member: &JobRef) -> Option<&BuildId> {
        self.build_id(&member.pipeline_id, &member.job_name)
    }
}

#[cfg(test)]
#[path = "provenance_tests.rs"]
mod tests;
