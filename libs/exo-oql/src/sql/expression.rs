// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{ColumnId, ParamEquality};

use super::{predicate::ConcretePredicate, query_model::ModelId};

/// A literal value that can appear in a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A named placeholder. Parameters supplied by the caller at execution time carry no value;
/// parameters the compiler synthesizes from constants carry the value to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub name: String,
    pub value: Option<SqlValue>,
}

impl SqlParam {
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
}

/// Any usage where a value could appear in a statement. For example, in `price = price * 1.1`
/// both `price` and `price * 1.1` are expressions, as is `1.1`.
///
/// Essentially represents `<column>` in a `select <column>, <column> from <table>`, `<column> =
/// <value>` in a predicate, or `<value>` in an `update <table> set <column> = <value>`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpression {
    /// An actual physical column in a table, qualified by the alias of the table source it is
    /// read from
    Column {
        column_id: ColumnId,
        table_alias: Option<String>,
    },
    /// A placeholder, see [`SqlParam`]
    Param(SqlParam),
    /// An inlined literal
    Value(SqlValue),
    Null,
    Arithmetic {
        operator: ArithmeticOperator,
        lhs: Box<SqlExpression>,
        rhs: Box<SqlExpression>,
    },
    /// A function applied to arguments. For example, `lower(name)` or `count(*)`.
    Function {
        name: String,
        args: Vec<SqlExpression>,
    },
    /// A boolean-valued expression used as a value (`set sold_out = (capacity = 0)`)
    Condition(Box<ConcretePredicate>),
    /// A scalar sub-select. The id refers to a model compiled alongside the statement.
    SubQuery(ModelId),
    /// All columns (`*`), used as an aggregate argument
    Star,
}

impl SqlExpression {
    pub fn physical(column_id: ColumnId, table_alias: Option<String>) -> Self {
        Self::Column {
            column_id,
            table_alias,
        }
    }

    pub fn column_id(&self) -> Option<ColumnId> {
        match self {
            Self::Column { column_id, .. } => Some(*column_id),
            _ => None,
        }
    }
}

impl ParamEquality for SqlExpression {
    fn param_eq(&self, other: &Self) -> Option<bool> {
        match (self, other) {
            (Self::Value(v1), Self::Value(v2)) => Some(v1 == v2),
            _ => None,
        }
    }
}

impl From<SqlValue> for SqlExpression {
    fn from(value: SqlValue) -> Self {
        SqlExpression::Value(value)
    }
}
