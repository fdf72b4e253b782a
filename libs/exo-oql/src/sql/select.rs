// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::expression::SqlExpression;

/// The ordered column list of a statement. Positions in this list are the ordinals handed out
/// by by-ordinal addressing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectClause {
    pub columns: Vec<SqlExpression>,
}

impl SelectClause {
    /// Register an expression and return its ordinal. An equal expression already in the list is
    /// reused, so addressing the same member twice yields the same ordinal.
    pub fn add(&mut self, expression: SqlExpression) -> usize {
        match self.columns.iter().position(|column| column == &expression) {
            Some(index) => index,
            None => self.push(expression),
        }
    }

    /// Append without deduplication
    pub fn push(&mut self, expression: SqlExpression) -> usize {
        self.columns.push(expression);
        self.columns.len() - 1
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
