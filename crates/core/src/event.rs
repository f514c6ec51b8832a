// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event: one execution of a pipeline's workflow.

use crate::build::BuildId;
use crate::graph::WorkflowGraph;
use crate::pipeline::PipelineId;
use crate::provenance::ParentBuilds;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an event.
    pub struct EventId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub pipeline_id: PipelineId,
    /// Snapshot of the pipeline's graph when the event was created. Never
    /// changes afterwards, even if the pipeline config does.
    pub workflow_graph: WorkflowGraph,
    /// Job (or `~` trigger) the event started from.
    pub start_from: String,
    /// Set when this event re-runs part of an earlier event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_build_id: Option<BuildId>,
    #[serde(default)]
    pub parent_builds: ParentBuilds,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_pipeline_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default)]
    pub cause_message: String,
    pub scm_context: String,
    pub username: String,
}

impl Event {
    pub fn is_rerun(&self) -> bool {
        self.parent_event_id.is_some()
    }
}

crate::builder! {
    pub struct EventBuilder => Event {
        into {
            id: EventId = "event-1",
            pipeline_id: PipelineId = "1",
            start_from: String = "~commit",
            sha: String = "58393af682d61de87789fb4961645c42180cec5a",
            cause_message: String = "Started by admin",
            scm_context: String = "github:github.com",
            username: String = "admin",
        }
        set {
            workflow_graph: WorkflowGraph = WorkflowGraph::default(),
            parent_event_id: Option<EventId> = None,
            parent_build_id: Option<BuildId> = None,
            parent_builds: ParentBuilds = ParentBuilds::default(),
            config_pipeline_sha: Option<String> = None,
            pr_ref: Option<String> = None,
            base_branch: Option<String> = None,
        }
    }
}
