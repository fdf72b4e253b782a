// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::sql::expression::SqlValue;

use super::operator::OperatorNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
        }
    }
}

/// `member = value` inside a construction expression
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    pub member: String,
    pub value: Expr,
}

/// An argument expression as handed over by a query front-end.
///
/// Member accesses are nested outside-in: `c.venue.name` is `Member { object: Member { object:
/// Parameter("c"), member: "venue" }, member: "name" }`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A reference to a lambda parameter
    Parameter(String),
    Member {
        object: Box<Expr>,
        member: String,
    },
    Constant(SqlValue),
    /// A value captured from the caller's environment (a local variable or a query parameter).
    /// It is never part of the row being queried.
    External(String),
    Null,
    /// A type conversion, transparent to the compiler
    Convert(Box<Expr>),
    Binary {
        operator: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Call {
        function: String,
        args: Vec<Expr>,
    },
    /// Construct an object and assign its members (bindings may nest)
    New(Vec<MemberBinding>),
    /// A scalar aggregate over a nested query, which may refer to parameters of the enclosing
    /// lambdas
    Aggregate {
        function: AggregateFunction,
        source: Box<OperatorNode>,
        selector: Option<Box<Lambda>>,
    },
}

impl Expr {
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    pub fn external(name: impl Into<String>) -> Self {
        Expr::External(name.into())
    }

    pub fn constant(value: impl Into<SqlValue>) -> Self {
        Expr::Constant(value.into())
    }

    /// `self.<member>`
    pub fn member(self, member: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(self),
            member: member.into(),
        }
    }

    pub fn binary(operator: BinaryOperator, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn convert(self) -> Self {
        Expr::Convert(Box::new(self))
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: function.into(),
            args,
        }
    }

    pub fn new_object<S: Into<String>>(bindings: Vec<(S, Expr)>) -> Self {
        Expr::New(
            bindings
                .into_iter()
                .map(|(member, value)| MemberBinding {
                    member: member.into(),
                    value,
                })
                .collect(),
        )
    }

    pub fn aggregate(
        function: AggregateFunction,
        source: OperatorNode,
        selector: Option<Lambda>,
    ) -> Self {
        Expr::Aggregate {
            function,
            source: Box::new(source),
            selector: selector.map(Box::new),
        }
    }

    /// The expression with any (nested) conversions removed
    pub fn strip_convert(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Convert(inner) = expr {
            expr = inner;
        }
        expr
    }
}

/// `|parameters| body`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<String>,
    pub body: Expr,
}

impl Lambda {
    pub fn new(parameter: impl Into<String>, body: Expr) -> Self {
        Self {
            parameters: vec![parameter.into()],
            body,
        }
    }

    /// The first (row) parameter
    pub fn parameter(&self) -> Option<&str> {
        self.parameters.first().map(|p| p.as_str())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_chain_nests_outside_in() {
        let expr = Expr::param("c").member("venue").member("name");

        assert_eq!(
            expr,
            Expr::Member {
                object: Box::new(Expr::Member {
                    object: Box::new(Expr::Parameter("c".to_string())),
                    member: "venue".to_string()
                }),
                member: "name".to_string()
            }
        );
    }

    #[test]
    fn conversions_are_stripped() {
        let inner = Expr::param("c").member("price");
        let expr = inner.clone().convert().convert();

        assert_eq!(expr.strip_convert(), &inner);
    }
}
