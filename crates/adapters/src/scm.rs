// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-control adapter: admin credentials and commit lookup.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from SCM operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScmError {
    /// The user has no credential usable for this SCM.
    #[error("no credential for {username} in {scm_context}")]
    NoCredential { scm_context: String, username: String },
    #[error("scm request failed: {0}")]
    Request(String),
}

/// Everything the SCM needs to act on one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmConfig {
    pub scm_context: String,
    pub scm_uri: String,
    pub token: String,
}

/// Adapter for the source-control provider
#[async_trait]
pub trait ScmAdapter: Clone + Send + Sync + 'static {
    /// Unseal `username`'s access token for `scm_context`.
    async fn admin_token(&self, scm_context: &str, username: &str) -> Result<String, ScmError>;

    /// Current head commit of the repository in `config`.
    async fn commit_sha(&self, config: &ScmConfig) -> Result<String, ScmError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ScmAdapter, ScmConfig, ScmError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Recorded SCM call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ScmCall {
        AdminToken { scm_context: String, username: String },
        CommitSha { scm_uri: String, token: String },
    }

    #[derive(Default)]
    struct FakeScmState {
        /// username -> token; users not listed have no credential
        tokens: HashMap<String, String>,
        /// scm_uri -> sha
        shas: HashMap<String, String>,
        commit_error: Option<ScmError>,
        calls: Vec<ScmCall>,
    }

    /// Fake SCM adapter for testing
    #[derive(Clone, Default)]
    pub struct FakeScmAdapter {
        inner: Arc<Mutex<FakeScmState>>,
    }

    impl FakeScmAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Give `username` a usable token.
        pub fn set_token(&self, username: &str, token: &str) {
            self.inner.lock().tokens.insert(username.to_string(), token.to_string());
        }

        /// Head commit reported for `scm_uri`.
        pub fn set_sha(&self, scm_uri: &str, sha: &str) {
            self.inner.lock().shas.insert(scm_uri.to_string(), sha.to_string());
        }

        /// Make every `commit_sha` call fail.
        pub fn set_commit_error(&self, error: ScmError) {
            self.inner.lock().commit_error = Some(error);
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<ScmCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl ScmAdapter for FakeScmAdapter {
        async fn admin_token(&self, scm_context: &str, username: &str) -> Result<String, ScmError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ScmCall::AdminToken {
                scm_context: scm_context.to_string(),
                username: username.to_string(),
            });
            inner.tokens.get(username).cloned().ok_or_else(|| ScmError::NoCredential {
                scm_context: scm_context.to_string(),
                username: username.to_string(),
            })
        }

        async fn commit_sha(&self, config: &ScmConfig) -> Result<String, ScmError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ScmCall::CommitSha {
                scm_uri: config.scm_uri.clone(),
                token: config.token.clone(),
            });
            if let Some(error) = inner.commit_error.clone() {
                return Err(error);
            }
            inner
                .shas
                .get(&config.scm_uri)
                .cloned()
                .ok_or_else(|| ScmError::Request(format!("unknown repository {}", config.scm_uri)))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeScmAdapter, ScmCall};

#[cfg(test)]
#[path = "scm_tests.rs"]
mod tests;
