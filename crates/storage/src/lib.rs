// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! junction-storage: in-memory store and snapshots

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotError};
