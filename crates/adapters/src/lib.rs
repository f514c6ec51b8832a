// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the collaborators the trigger engine talks to

pub mod scm;
pub mod store;

pub use scm::{ScmAdapter, ScmConfig, ScmError};
pub use store::{NewBuild, NewEvent, Store, StoreError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use scm::{FakeScmAdapter, ScmCall};
