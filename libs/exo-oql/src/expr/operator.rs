// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::expression::{Expr, Lambda};

/// The operators the compiler recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// The entity sequence a query starts from
    Source,
    Where,
    Select,
    Update,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A child sequence. The first argument of every operator except `Source` is the sequence it
    /// applies to.
    Sequence(Box<OperatorNode>),
    Lambda(Lambda),
    /// A table reference by entity name
    Entity(String),
    /// A plain (non-lambda) value
    Value(Expr),
}

/// One step in a chained query such as `concerts.filter(..).update(..)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub kind: OperatorKind,
    pub arguments: Vec<Argument>,
}

impl OperatorNode {
    pub fn new(kind: OperatorKind, arguments: Vec<Argument>) -> Self {
        Self { kind, arguments }
    }

    pub fn source(entity: impl Into<String>) -> Self {
        Self::new(OperatorKind::Source, vec![Argument::Entity(entity.into())])
    }

    pub fn filter(self, predicate: Lambda) -> Self {
        self.chain(OperatorKind::Where, vec![Argument::Lambda(predicate)])
    }

    pub fn select(self, projection: Lambda) -> Self {
        self.chain(OperatorKind::Select, vec![Argument::Lambda(projection)])
    }

    /// Update using the set items accumulated so far
    pub fn update(self) -> Self {
        self.chain(OperatorKind::Update, vec![])
    }

    /// `update(|row| Entity { .. })`
    pub fn update_with(self, setter: Lambda) -> Self {
        self.chain(OperatorKind::Update, vec![Argument::Lambda(setter)])
    }

    /// `update(|row| predicate, |row| Entity { .. })`
    pub fn update_where(self, predicate: Lambda, setter: Lambda) -> Self {
        self.chain(
            OperatorKind::Update,
            vec![Argument::Lambda(predicate), Argument::Lambda(setter)],
        )
    }

    /// `update(target, |row| Target { .. })`: rows of this sequence drive assignments to rows
    /// of `target`
    pub fn update_into(self, target: OperatorNode, setter: Lambda) -> Self {
        self.chain(
            OperatorKind::Update,
            vec![
                Argument::Sequence(Box::new(target)),
                Argument::Lambda(setter),
            ],
        )
    }

    /// `set(|row| row.column, value)`
    pub fn set(self, extract: Lambda, value: Expr) -> Self {
        self.chain(
            OperatorKind::Set,
            vec![Argument::Lambda(extract), Argument::Value(value)],
        )
    }

    /// `set(|row| row.column, |row| value)`
    pub fn set_with(self, extract: Lambda, value: Lambda) -> Self {
        self.chain(
            OperatorKind::Set,
            vec![Argument::Lambda(extract), Argument::Lambda(value)],
        )
    }

    fn chain(self, kind: OperatorKind, rest: Vec<Argument>) -> Self {
        let mut arguments = vec![Argument::Sequence(Box::new(self))];
        arguments.extend(rest);
        Self::new(kind, arguments)
    }

    /// The sequence this operator applies to
    pub fn primary_source(&self) -> Option<&OperatorNode> {
        match self.arguments.first() {
            Some(Argument::Sequence(source)) => Some(source),
            _ => None,
        }
    }

    /// The arguments following the primary source
    pub fn operands(&self) -> &[Argument] {
        match self.arguments.first() {
            Some(Argument::Sequence(_)) => &self.arguments[1..],
            _ => &self.arguments,
        }
    }
}
