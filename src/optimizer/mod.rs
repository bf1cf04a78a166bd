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

//! Predicate analysis for join planning
//!
//! ## Modules
//!
//! - `analyzer` - decomposition of ON predicates into join keys and filters
//! - `pushdown` - splitting a filter into the part local to one alias and the rest

pub mod analyzer;
pub mod pushdown;

pub use analyzer::{analyze, AnalyzeItem, AnalyzeResult, EquiKey};
pub use pushdown::{split_pushdown, PushdownSplit};

#[cfg(test)]
mod tests;
