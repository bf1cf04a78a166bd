// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Join strategy configuration
//!

/// Default number of outer rows per BatchHashJoin seek
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Configuration options for the operator builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinConfig {
    /// Outer rows gathered before each batched index seek
    /// Default: 100
    pub batch_size: usize,

    /// Whether BatchHashJoin may be chosen when an index fits
    /// Default: true
    pub enable_batch_hash_join: bool,

    /// Whether HashMatch may be chosen when equi-join keys exist
    /// Default: true
    pub enable_hash_match: bool,

    /// Whether a non-correlated nested-loop inner side is buffered once and
    /// replayed per outer row
    /// Default: true
    pub cache_uncorrelated_inner: bool,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            enable_batch_hash_join: true,
            enable_hash_match: true,
            cache_uncorrelated_inner: true,
        }
    }
}

impl JoinConfig {
    /// Creates a new JoinConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Every join runs as a nested loop
    pub fn nested_loop_only() -> Self {
        Self {
            enable_batch_hash_join: false,
            enable_hash_match: false,
            ..Self::default()
        }
    }

    /// Hash joins allowed, index seeks not
    pub fn without_index_joins() -> Self {
        Self {
            enable_batch_hash_join: false,
            ..Self::default()
        }
    }

    /// Builder method to set the batch size (clamped to at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Builder method to enable/disable inner-side caching
    pub fn with_inner_cache(mut self, enabled: bool) -> Self {
        self.cache_uncorrelated_inner = enabled;
        self
    }

    /// Batch size actually used, never below 1
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
