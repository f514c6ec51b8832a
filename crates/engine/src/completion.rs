// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Join completion detection.
//!
//! A join is done when every member has a recorded build and every recorded
//! build has finished. Failure is tracked independently of completion, so a
//! [`JoinPolicy`] can act on a failure before the rest of the join finishes.

use junction_core::{BuildId, BuildStatus, JobRef, ParentBuilds};

/// Completion state of one join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinStatus {
    pub done: bool,
    pub has_failure: bool,
}

impl JoinStatus {
    /// Evaluate `members` against the builds recorded in `provenance`.
    ///
    /// `status_of` resolves a recorded build id to its status. An id it cannot
    /// resolve leaves the join not done.
    pub fn evaluate(
        members: &[JobRef],
        provenance: &ParentBuilds,
        status_of: impl Fn(&BuildId) -> Option<BuildStatus>,
    ) -> Self {
        let mut status = JoinStatus { done: true, has_failure: false };
        for member in members {
            let Some(build_id) = provenance.member_build(member) else {
                status.done = false;
                continue;
            };
            match status_of(build_id) {
                Some(s) => {
                    if s.is_failure() {
                        status.has_failure = true;
                    }
                    if !s.is_finished() {
                        status.done = false;
                    }
                }
                None => status.done = false,
            }
        }
        status
    }
}

/// What to do with a join target given its [`JoinStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    Wait,
    /// Discard the speculative build.
    Remove,
    Start,
}

/// When a failed member discards the join target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Act only once every member has finished.
    AwaitAll,
    /// Discard as soon as any member failed.
    FailFast,
}

impl JoinPolicy {
    pub fn for_external_join(enabled: bool) -> Self {
        if enabled {
            JoinPolicy::AwaitAll
        } else {
            JoinPolicy::FailFast
        }
    }

    pub fn decide(self, status: JoinStatus) -> JoinDecision {
        match (self, status.done, status.has_failure) {
            (JoinPolicy::FailFast, _, true) => JoinDecision::Remove,
            (_, false, _) => JoinDecision::Wait,
            (_, true, true) => JoinDecision::Remove,
            (_, true, false) => JoinDecision::Start,
        }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
