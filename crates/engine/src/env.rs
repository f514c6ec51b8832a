// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

/// Successor branches processed at once when `JUNCTION_FANOUT_LIMIT` is unset.
pub const DEFAULT_FANOUT_LIMIT: usize = 8;

/// Concurrent successor branches per `trigger_next_jobs` call (default 8,
/// never below 1).
pub fn fanout_limit() -> usize {
    std::env::var("JUNCTION_FANOUT_LIMIT")
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .map(|n| n.max(1))
        .unwrap_or(DEFAULT_FANOUT_LIMIT)
}

/// Default for a request's external-join flag (`JUNCTION_EXTERNAL_JOIN`,
/// default on). Unrecognized values keep the default.
pub fn external_join() -> bool {
    match std::env::var("JUNCTION_EXTERNAL_JOIN").ok().as_deref().map(str::trim) {
        Some("0" | "false" | "off" | "no") => false,
        _ => true,
    }
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub fanout_limit: usize,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self { fanout_limit: fanout_limit() }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fanout_limit: DEFAULT_FANOUT_LIMIT }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
