// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::debug;

use crate::{ColumnId, Database, TableId, compile_error::CompileError};

use super::expression::SqlExpression;

/// One `<column> = <value>` assignment of an update statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub column: ColumnId,
    pub value: SqlExpression,
}

/// The update-specific part of a statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateSubModel {
    /// The table the set items apply to
    pub target: Option<TableId>,
    /// The assignments, in the order they were declared
    pub items: Vec<SetItem>,
}

impl UpdateSubModel {
    /// Bind the target table. Re-asserting the same table is a no-op, but a different table is an
    /// error: silently replacing it would apply the set items to the wrong table.
    pub fn set_target(&mut self, table_id: TableId, database: &Database) -> Result<(), CompileError> {
        match self.target {
            Some(existing) if existing != table_id => Err(CompileError::AmbiguousTarget {
                first: database.get_table(existing).name.clone(),
                second: database.get_table(table_id).name.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                debug!("Update target: {}", database.get_table(table_id).name);
                self.target = Some(table_id);
                Ok(())
            }
        }
    }

    pub fn add_item(&mut self, column: ColumnId, value: SqlExpression) {
        self.items.push(SetItem { column, value });
    }

    /// Check the rules a dialect relies on when rendering `UPDATE <target> SET <items>`
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.target.is_none() {
            return Err(CompileError::IncompleteStatement(
                "update statement has no target table".to_string(),
            ));
        }

        if self.items.is_empty() {
            return Err(CompileError::IncompleteStatement(
                "update statement has no set items".to_string(),
            ));
        }

        Ok(())
    }
}
