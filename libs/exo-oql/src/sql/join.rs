// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::TableId;

use super::predicate::ConcretePredicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A table source: the physical table plus the alias columns read from it are qualified with.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub table_id: TableId,
    pub alias: String,
}

/// A join against the root table source, such as `concerts INNER JOIN venues ON concerts.venue_id
/// = venues.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub source: TableSource,
    pub kind: JoinKind,
    /// The join predicate such as `t1.venue_id = t2.id`.
    pub predicate: ConcretePredicate,
    /// A weak join is introduced by traversing an association and is still provisional. It
    /// becomes concrete through [`FromClause::resolve_weak_joins`].
    pub is_weak: bool,
}

/// The `FROM` part of a statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FromClause {
    pub root: Option<TableSource>,
    pub joins: Vec<Join>,
}

impl FromClause {
    pub fn add_weak_join(
        &mut self,
        source: TableSource,
        kind: JoinKind,
        predicate: ConcretePredicate,
    ) {
        self.joins.push(Join {
            source,
            kind,
            predicate,
            is_weak: true,
        });
    }

    /// Turn every provisional join into a concrete one. Needed before the association contexts
    /// that introduced them go away (for example, when an update is retargeted at a different
    /// table).
    pub fn resolve_weak_joins(&mut self) {
        for join in self.joins.iter_mut() {
            join.is_weak = false;
        }
    }

    pub fn has_weak_joins(&self) -> bool {
        self.joins.iter().any(|join| join.is_weak)
    }
}
