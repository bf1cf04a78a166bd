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

//! Hash table for the build side of HashMatch and BatchHashJoin.
//!
//! Build rows stay in a `Vec<Row>` owned by the join; the table only stores
//! `(hash, row index)` entries chained per bucket, so probing never touches
//! row data until a full hash match is found.
//!
//! # Memory Layout
//!
//! ```text
//! JoinHashTable
//! ├── bucket_heads: Vec<i32>    [bucket_count]     // First entry index per bucket
//! ├── entries: Vec<HashEntry>   [row_count]        // One per keyed build row
//! └── bucket_mask: u64                             // For fast modulo
//!
//! HashEntry
//! ├── hash: u64     // Full hash for quick rejection
//! ├── row_idx: u32  // Index into build rows
//! └── next: u32     // Next in chain (EMPTY = end)
//! ```

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::core::Value;

/// Sentinel value indicating end of chain or empty bucket.
const EMPTY: u32 = u32::MAX;

/// Minimum number of buckets (must be power of 2).
const MIN_BUCKETS: usize = 16;

#[derive(Debug, Clone, Copy)]
struct HashEntry {
    /// Full 64-bit hash for quick rejection during probe.
    hash: u64,
    /// Index into the build rows vector.
    row_idx: u32,
    /// Index of next entry in the chain (EMPTY = end).
    next: u32,
}

/// Chained hash table keyed by pre-computed join-key hashes.
#[derive(Debug)]
pub struct JoinHashTable {
    /// First entry index for each bucket (-1 if empty).
    bucket_heads: Vec<i32>,

    /// Flat storage of all entries.
    entries: Vec<HashEntry>,

    /// Mask for computing bucket index: bucket = hash & mask
    bucket_mask: u64,
}

impl JoinHashTable {
    /// Create a new hash table with capacity for the given number of rows.
    ///
    /// Bucket count is sized to achieve ~75% load factor.
    pub fn with_capacity(row_count: usize) -> Self {
        let bucket_count = (row_count * 4 / 3).max(MIN_BUCKETS).next_power_of_two();

        Self {
            bucket_heads: vec![-1; bucket_count],
            entries: Vec::with_capacity(row_count),
            bucket_mask: (bucket_count - 1) as u64,
        }
    }

    /// Build a table from `(hash, row index)` pairs.
    ///
    /// Pairs are inserted back to front so that every chain yields row
    /// indices in ascending order, which keeps probe output in build order.
    pub fn from_hashes(hashes: &[(u64, u32)]) -> Self {
        let mut table = Self::with_capacity(hashes.len());
        for &(hash, row_idx) in hashes.iter().rev() {
            table.insert(hash, row_idx);
        }
        table
    }

    /// Insert a row index with its pre-computed hash at the head of its chain.
    #[inline]
    pub fn insert(&mut self, hash: u64, row_idx: u32) {
        let bucket = (hash & self.bucket_mask) as usize;
        let old_head = self.bucket_heads[bucket];

        let entry_idx = self.entries.len() as u32;
        let next = if old_head >= 0 {
            old_head as u32
        } else {
            EMPTY
        };
        self.entries.push(HashEntry {
            hash,
            row_idx,
            next,
        });
        self.bucket_heads[bucket] = entry_idx as i32;
    }

    /// Probe the hash table for row indices with a matching hash.
    ///
    /// The caller must verify actual key equality for each returned index.
    #[inline]
    pub fn probe(&self, hash: u64) -> ProbeIter<'_> {
        let bucket = (hash & self.bucket_mask) as usize;
        ProbeIter {
            table: self,
            hash,
            current: self.bucket_heads[bucket],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.bucket_heads.len()
    }
}

/// Zero-allocation iterator over probe results.
pub struct ProbeIter<'a> {
    table: &'a JoinHashTable,
    hash: u64,
    current: i32,
}

impl Iterator for ProbeIter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.current >= 0 {
            let entry = &self.table.entries[self.current as usize];
            self.current = if entry.next == EMPTY {
                -1
            } else {
                entry.next as i32
            };

            if entry.hash == self.hash {
                return Some(entry.row_idx as usize);
            }
        }
        None
    }
}

// ============================================================================
// Hashing Utilities
// ============================================================================

/// Hash a join-key tuple into a single u64.
///
/// Goes through `Value`'s `Hash` impl, so keys that compare equal across
/// numeric types (`1` and `1.0`) land in the same bucket.
#[inline]
pub fn hash_values(values: &[Value]) -> u64 {
    let mut hasher = FxHasher::default();
    values.len().hash(&mut hasher);
    for value in values {
        value.hash(&mut hasher);
    }
    hasher.finish()
}

/// Check if a key tuple contains NULL (such keys can never match)
#[inline]
pub fn has_null_key(values: &[Value]) -> bool {
    values.iter().any(Value::is_null)
}
