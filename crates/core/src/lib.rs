// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! junction-core: domain types for the junction trigger engine

pub mod macros;

pub mod build;
pub mod event;
pub mod graph;
pub mod id;
pub mod job;
pub mod job_ref;
pub mod pipeline;
pub mod provenance;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use build::{Build, BuildId, BuildStatus};
pub use event::{Event, EventId};
pub use graph::{split_pr_job, Edge, GraphError, Node, WorkflowGraph};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{Job, JobId, JobState};
pub use job_ref::{is_qualified, JobRef, JobRefError, QUALIFIED_PREFIX};
pub use macros::UnknownVariant;
pub use pipeline::{Pipeline, PipelineId};
pub use provenance::{ParentBuilds, PipelineBuilds};
