// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow graph and the queries the trigger engine makes of it.
//!
//! Node names are job names as written in the owning pipeline: bare for the
//! pipeline's own jobs, `sd@<pipeline>:<job>` for jobs of other pipelines,
//! `~commit`/`~pr` for pseudo-triggers, and `PR-<n>:<job>` for PR copies of a
//! job (which have no node of their own).

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("job {0:?} is not in the workflow graph")]
    UnknownJob(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Job backing the node, when the graph knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), id: None }
    }

    pub fn with_id(name: impl Into<String>, id: impl Into<JobId>) -> Self {
        Self { name: name.into(), id: Some(id.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: String,
    pub dest: String,
    /// `dest` requires every join edge's `src` before it runs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub join: bool,
}

impl Edge {
    pub fn new(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self { src: src.into(), dest: dest.into(), join: false }
    }

    pub fn join(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self { src: src.into(), dest: dest.into(), join: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Split `PR-<n>:<job>` into (`PR-<n>`, `<job>`).
pub fn split_pr_job(name: &str) -> Option<(&str, &str)> {
    let (prefix, job) = name.split_once(':')?;
    let number = prefix.strip_prefix("PR-")?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) || job.is_empty() {
        return None;
    }
    Some((prefix, job))
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Node with exactly this name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Whether `name` is a node, or the PR copy of one.
    pub fn contains(&self, name: &str) -> bool {
        let base = split_pr_job(name).map(|(_, job)| job).unwrap_or(name);
        self.node(base).is_some()
    }

    /// Direct successors of `name` along any edge, in edge order.
    pub fn successors<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges.iter().filter(move |e| e.src == name).map(|e| e.dest.as_str())
    }

    /// Jobs to trigger once `trigger` finishes.
    ///
    /// A PR job (`PR-<n>:<job>`) triggers the PR copies of `<job>`'s
    /// in-pipeline successors only when `chain_pr` is set. Duplicates are
    /// dropped.
    pub fn next_jobs(&self, trigger: &str, chain_pr: bool) -> Vec<String> {
        let mut seen = HashSet::new();
        let names: Vec<String> = match split_pr_job(trigger) {
            Some((prefix, job)) if chain_pr => self
                .successors(job)
                .filter(|dest| !crate::job_ref::is_qualified(dest))
                .map(|dest| format!("{prefix}:{dest}"))
                .collect(),
            Some(_) => Vec::new(),
            None => self.successors(trigger).map(str::to_string).collect(),
        };
        names.into_iter().filter(|n| seen.insert(n.clone())).collect()
    }

    /// Members of `job`'s join, as written in this graph.
    ///
    /// Empty when `job` is not a join target. Both `job` and every member
    /// must be nodes of the graph.
    pub fn join_sources(&self, job: &str) -> Result<Vec<String>, GraphError> {
        let (prefix, base) = match split_pr_job(job) {
            Some((prefix, base)) => (Some(prefix), base),
            None => (None, job),
        };
        if self.node(base).is_none() {
            return Err(GraphError::UnknownJob(job.to_string()));
        }

        let mut sources = Vec::new();
        for edge in self.edges.iter().filter(|e| e.join && e.dest == base) {
            if self.node(&edge.src).is_none() {
                return Err(GraphError::UnknownJob(edge.src.clone()));
            }
            let name = match prefix {
                Some(prefix) if !crate::job_ref::is_qualified(&edge.src) => {
                    format!("{prefix}:{}", edge.src)
                }
                _ => edge.src.clone(),
            };
            if !sources.contains(&name) {
                sources.push(name);
            }
        }
        Ok(sources)
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
