// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partial re-runs.
//!
//! A re-run event restarts its parent event at `start_from`. Builds of the
//! parent that cannot be reached from the restart point stay valid and count
//! as already finished for the re-run's joins.

use crate::error::TriggerError;
use crate::trigger::TriggerEngine;
use junction_adapters::{ScmAdapter, Store};
use junction_core::{is_qualified, split_pr_job, Build, Event, JobId, WorkflowGraph};
use std::collections::HashSet;

/// Jobs a re-run from `start_from` runs again: the start itself and every
/// job reachable from it along successor edges.
///
/// A PR start (`PR-<n>:<job>`) walks from `<job>` and names the PR copies of
/// the in-pipeline jobs it reaches.
pub fn rerun_jobs(graph: &WorkflowGraph, start_from: &str) -> Vec<String> {
    let (prefix, start) = match split_pr_job(start_from) {
        Some((prefix, job)) => (Some(prefix), job),
        None => (None, start_from),
    };

    let mut visited = HashSet::new();
    let mut names = Vec::new();
    let mut stack = vec![start];
    while let Some(name) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }
        match prefix {
            Some(_) if is_qualified(name) => continue,
            Some(prefix) => names.push(format!("{prefix}:{name}")),
            None => names.push(name.to_string()),
        }
        stack.extend(graph.successors(name));
    }
    names
}

impl<S: Store, M: ScmAdapter> TriggerEngine<S, M> {
    /// Finished work an event's joins may count on: its own builds plus, for
    /// a re-run, the parent event's builds upstream of the restart point.
    /// Where both have a build of one job, the event's own wins.
    pub async fn visible_builds(&self, event: &Event) -> Result<Vec<Build>, TriggerError> {
        let mut builds = self.store.event_builds(&event.id).await?;
        let Some(parent_id) = &event.parent_event_id else {
            return Ok(builds);
        };

        let parent = self
            .store
            .get_event(parent_id)
            .await?
            .ok_or_else(|| TriggerError::EventNotFound(parent_id.clone()))?;

        let mut rerun: HashSet<JobId> = HashSet::new();
        for name in rerun_jobs(&parent.workflow_graph, &event.start_from) {
            let graph = &parent.workflow_graph;
            rerun.extend(self.resolve_job_id(&parent.pipeline_id, graph, &name).await?);
        }

        let mut own: HashSet<JobId> = builds.iter().map(|b| b.job_id.clone()).collect();
        own.extend(rerun);
        let upstream = self.store.event_builds(&parent.id).await?;
        builds.extend(upstream.into_iter().filter(|b| !own.contains(&b.job_id)));
        Ok(builds)
    }
}

#[cfg(test)]
#[path = "rerun_tests.rs"]
mod tests;
