// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CompileError {
    #[error("Could not resolve member '{path}': {reason}")]
    MemberResolution { path: String, reason: String },

    #[error("Member '{0}' is not a settable column")]
    NotSettableColumn(String),

    #[error("Malformed setter: {0}")]
    MalformedSetterPath(String),

    #[error("Unsupported query shape: {0}")]
    UnsupportedShape(String),

    #[error("Update target is ambiguous: already '{first}', now '{second}'")]
    AmbiguousTarget { first: String, second: String },

    #[error("Expected exactly one builder for {operator}, found [{}]", .candidates.join(", "))]
    AmbiguousBuilder {
        operator: String,
        candidates: Vec<String>,
    },

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Setter nesting exceeds the limit of {0}")]
    SetterTooDeep(usize),

    #[error("Incomplete statement: {0}")]
    IncompleteStatement(String),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<CompileError>),
}

impl CompileError {
    pub fn with_context(self, context: String) -> CompileError {
        CompileError::WithContext(context, Box::new(self))
    }

    /// The innermost error, looking through any context wrappers
    pub fn root_cause(&self) -> &CompileError {
        match self {
            CompileError::WithContext(_, source) => source.root_cause(),
            error => error,
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, CompileError> {
    fn with_context(self, context: String) -> Result<T, CompileError> {
        self.map_err(|e| e.with_context(context))
    }
}

/// Errors building a [`Database`](crate::Database) and [`Mapping`](crate::mapping::Mapping) from
/// specs
#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Duplicate entity '{0}'")]
    DuplicateEntity(String),
}
