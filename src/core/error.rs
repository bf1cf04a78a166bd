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

//! Error types for the join core
//!
//! Errors fall into three groups:
//!
//! - build-time errors, raised while the operator tree is assembled and
//!   before any row is produced
//! - evaluation errors, raised while rows are being pulled
//! - catalog errors, raised by the storage collaborator and propagated as-is
//!
//! None of them is recoverable at the join level: any error aborts the row
//! production of the whole query.

use thiserror::Error;

/// Result type alias for join core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the join core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Build-time errors
    // =========================================================================
    /// Alias collides with an alias in its ancestor chain or sibling subtrees
    #[error("alias '{alias}' already exists")]
    DuplicateAlias { alias: String },

    /// Expression references an alias that is not visible from the join
    #[error("alias '{0}' not found")]
    UnknownAlias(String),

    /// Alias exists but does not expose the column
    #[error("column '{column}' not found in alias '{alias}'")]
    UnknownColumn { alias: String, column: String },

    /// A strategy requiring full-row indexing was given a partial index
    #[error("index on {table} ({columns}) does not cover full rows")]
    IndexNotFullRow { table: String, columns: String },

    /// Logical plan is malformed
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    // =========================================================================
    // Evaluation errors
    // =========================================================================
    /// Predicate produced something other than a boolean
    #[error("predicate evaluated to non-boolean value {value} ({data_type})")]
    NonBooleanPredicate { value: String, data_type: String },

    /// Seek request referenced an index the catalog does not provide
    #[error("index on {table} ({columns}) is not provided by the catalog")]
    IndexNotProvided { table: String, columns: String },

    /// Cannot compare incompatible types
    #[error("cannot compare incompatible types")]
    IncomparableTypes,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Expression evaluation failed with message
    #[error("expression evaluation failed: {0}")]
    Evaluation(String),

    // =========================================================================
    // Resource errors
    // =========================================================================
    /// Table not known to the catalog
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// Failure reported by the catalog's scan or seek machinery
    #[error("catalog error: {0}")]
    Catalog(String),

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new DuplicateAlias error
    pub fn duplicate_alias(alias: impl Into<String>) -> Self {
        Error::DuplicateAlias {
            alias: alias.into(),
        }
    }

    /// Create a new UnknownColumn error
    pub fn unknown_column(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Error::UnknownColumn {
            alias: alias.into(),
            column: column.into(),
        }
    }

    /// Create a new IndexNotFullRow error
    pub fn index_not_full_row(table: impl Into<String>, columns: &[String]) -> Self {
        Error::IndexNotFullRow {
            table: table.into(),
            columns: columns.join(", "),
        }
    }

    /// Create a new IndexNotProvided error
    pub fn index_not_provided(table: impl Into<String>, columns: &[String]) -> Self {
        Error::IndexNotProvided {
            table: table.into(),
            columns: columns.join(", "),
        }
    }

    /// Create a new InvalidPlan error
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Error::InvalidPlan(message.into())
    }

    /// Create a new Evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation(message.into())
    }

    /// Create a new Catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Error::Catalog(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is raised while building the operator tree
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateAlias { .. }
                | Error::UnknownAlias(_)
                | Error::UnknownColumn { .. }
                | Error::IndexNotFullRow { .. }
                | Error::InvalidPlan(_)
        )
    }

    /// Check if this error is raised while pulling rows
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            Error::NonBooleanPredicate { .. }
                | Error::IndexNotProvided { .. }
                | Error::IncomparableTypes
                | Error::DivisionByZero
                | Error::Evaluation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::duplicate_alias("a").to_string(),
            "alias 'a' already exists"
        );
        assert_eq!(
            Error::UnknownAlias("x".to_string()).to_string(),
            "alias 'x' not found"
        );
        assert_eq!(
            Error::unknown_column("a", "qty").to_string(),
            "column 'qty' not found in alias 'a'"
        );
        assert_eq!(
            Error::index_not_provided("articles", &["art_id".to_string(), "club_id".to_string()])
                .to_string(),
            "index on articles (art_id, club_id) is not provided by the catalog"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::duplicate_alias("a").is_build_error());
        assert!(Error::invalid_plan("bad").is_build_error());
        assert!(!Error::duplicate_alias("a").is_evaluation_error());

        let err = Error::NonBooleanPredicate {
            value: "1".to_string(),
            data_type: "INTEGER".to_string(),
        };
        assert!(err.is_evaluation_error());
        assert!(!err.is_build_error());

        assert!(!Error::catalog("disk").is_build_error());
        assert!(!Error::catalog("disk").is_evaluation_error());

        let err = Error::internal("inner side finished without an outer row");
        assert_eq!(err.to_string(), "inner side finished without an outer row");
        assert!(!err.is_build_error());
        assert!(!err.is_evaluation_error());
    }
}
