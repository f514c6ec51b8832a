// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! junction-engine: decides and applies what happens downstream when a
//! build finishes.

pub mod completion;
pub mod env;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod rerun;
pub mod trigger;

#[cfg(test)]
mod test_helpers;

pub use completion::{JoinDecision, JoinPolicy, JoinStatus};
pub use env::EngineConfig;
pub use error::TriggerError;
pub use event::TriggerEvent;
pub use lifecycle::{InternalBuild, Placement};
pub use rerun::rerun_jobs;
pub use trigger::{EngineDeps, NextJobOutcome, NextJobsRequest, TriggerEngine, TriggerOutcome};
