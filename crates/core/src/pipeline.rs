// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline: the unit that owns jobs, a repository, and a workflow graph.

use crate::graph::WorkflowGraph;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier of a pipeline.
    ///
    /// Also appears inside qualified job names (`sd@<pipeline>:<job>`), so it
    /// never contains a `:`.
    pub struct PipelineId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    /// Repository the pipeline builds, in the SCM's own URI format.
    pub scm_uri: String,
    /// Which SCM the repository lives in (e.g. `github:github.com`).
    pub scm_context: String,
    /// Usernames allowed to act for the pipeline, in preference order.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Whether PR jobs trigger their downstream PR jobs.
    #[serde(default)]
    pub chain_pr: bool,
    /// Current workflow graph. Events snapshot it at creation.
    pub workflow_graph: WorkflowGraph,
}

crate::builder! {
    pub struct PipelineBuilder => Pipeline {
        into {
            id: PipelineId = "1",
            name: String = "acme/app",
            scm_uri: String = "github.com:1000:main",
            scm_context: String = "github:github.com",
        }
        set {
            admins: Vec<String> = vec!["admin".to_string()],
            chain_pr: bool = false,
            workflow_graph: WorkflowGraph = WorkflowGraph::default(),
        }
    }
}
