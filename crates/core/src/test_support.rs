// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Edge, Node, WorkflowGraph};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for provenance and graph types.
pub mod strategies {
    use crate::provenance::ParentBuilds;
    use crate::{BuildId, EventId, JobRef, PipelineId};
    use proptest::prelude::*;

    /// Small key domains so generated maps collide often.
    pub fn arb_job_ref() -> impl Strategy<Value = JobRef> {
        (prop::sample::select(vec!["1", "2", "3"]), prop::sample::select(vec!["a", "b", "c", "d"]))
            .prop_map(|(p, j)| JobRef::internal(&PipelineId::new(p), j))
    }

    pub fn arb_parent_builds() -> impl Strategy<Value = ParentBuilds> {
        let entry = (
            arb_job_ref(),
            proptest::option::of(prop::sample::select(vec!["e1", "e2"])),
            proptest::option::of(prop::sample::select(vec!["10", "11", "12", "13"])),
        );
        prop::collection::vec(entry, 0..6).prop_map(|entries| {
            entries.into_iter().fold(ParentBuilds::new(), |acc, (job, event, build)| {
                let skeleton = ParentBuilds::skeleton([&job]);
                let recorded = match (event, build) {
                    (Some(event), Some(build)) => ParentBuilds::single(
                        &job.pipeline_id,
                        &EventId::new(event),
                        &job.job_name,
                        &BuildId::new(build),
                    ),
                    _ => ParentBuilds::new(),
                };
                acc.merge(&skeleton).merge(&recorded)
            })
        })
    }
}

// ── Graph factory functions ─────────────────────────────────────────────

/// Build a graph from `(src, dest)` plain edges and `(src, dest)` join edges.
///
/// Every name mentioned becomes a node. Bare names (other than `~` triggers)
/// get a job id equal to their name.
pub fn graph(edges: &[(&str, &str)], joins: &[(&str, &str)]) -> WorkflowGraph {
    let mut nodes: Vec<Node> = Vec::new();
    let mut add = |name: &str| {
        if nodes.iter().any(|n| n.name == name) {
            return;
        }
        if name.starts_with('~') || crate::job_ref::is_qualified(name) {
            nodes.push(Node::new(name));
        } else {
            nodes.push(Node::with_id(name, name));
        }
    };
    for &(src, dest) in edges.iter().chain(joins) {
        add(src);
        add(dest);
    }
    let edges = edges
        .iter()
        .map(|(s, d)| Edge::new(*s, *d))
        .chain(joins.iter().map(|(s, d)| Edge::join(*s, *d)))
        .collect();
    WorkflowGraph::new(nodes, edges)
}
