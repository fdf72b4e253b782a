// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use typed_generational_arena::{IgnoreGeneration, Index};

use crate::compile_error::CompileError;

use super::{
    database::SerializableSlab,
    join::FromClause,
    predicate::{ConcretePredicate, Predicate},
    select::SelectClause,
    update::UpdateSubModel,
};

pub type ModelId = Index<SqlQueryModel, usize, IgnoreGeneration>;
pub type ModelArena = SerializableSlab<SqlQueryModel>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    #[default]
    Select,
    Update,
}

/// The intermediate representation of one statement. Build contexts mutate it in place while
/// operators compile; once compilation finishes it is handed, read-only, to a dialect provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQueryModel {
    pub query_type: QueryType,
    pub select: SelectClause,
    pub from: FromClause,
    pub where_clause: ConcretePredicate,
    pub update: UpdateSubModel,
}

impl SqlQueryModel {
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            select: SelectClause::default(),
            from: FromClause::default(),
            where_clause: Predicate::True,
            update: UpdateSubModel::default(),
        }
    }

    /// Conjoin `predicate` with the current where clause
    pub fn add_predicate(&mut self, predicate: ConcretePredicate) {
        let current = std::mem::replace(&mut self.where_clause, Predicate::True);
        self.where_clause = Predicate::and(current, predicate);
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        match self.query_type {
            QueryType::Select if !self.update.items.is_empty() => {
                Err(CompileError::IncompleteStatement(
                    "set items without an update".to_string(),
                ))
            }
            QueryType::Select => Ok(()),
            QueryType::Update => self.update.validate(),
        }
    }
}

impl Default for SqlQueryModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::sql::expression::{SqlExpression, SqlValue};

    use super::*;

    #[test]
    fn predicates_accumulate() {
        let mut model = SqlQueryModel::new();
        let p1 = ConcretePredicate::Gt(SqlExpression::Null, SqlExpression::Value(SqlValue::Int(1)));
        let p2 = ConcretePredicate::IsNull(SqlExpression::Null);

        model.add_predicate(p1.clone());
        assert_eq!(model.where_clause, p1);

        model.add_predicate(p2.clone());
        assert_eq!(
            model.where_clause,
            Predicate::And(Box::new(p1), Box::new(p2))
        );
    }

    #[test]
    fn select_models_always_validate() {
        assert_eq!(SqlQueryModel::new().validate(), Ok(()));
    }
}
