// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{Database, TableId};

use serde::{Deserialize, Serialize};

/// A column in a physical table
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct PhysicalColumn {
    /// The table this column belongs to
    pub table_id: TableId,
    /// The name of the column
    pub name: String,
    /// The type of the column
    pub typ: PhysicalColumnType,
    /// Is this column a part of the PK for the table
    pub is_pk: bool,
    /// should this type have a NOT NULL constraint or not?
    pub is_nullable: bool,
}

/// Simpler implementation of Debug for PhysicalColumn.
///
/// The derived implementation of Debug for PhysicalColumn is not very useful, since it includes
/// every field of the struct and obscures the actual useful information. This implementation only
/// prints the table index and column name.
impl std::fmt::Debug for PhysicalColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!(
            "Column: {}.{}",
            &self.table_id.arr_idx(),
            &self.name
        ))
    }
}

impl PhysicalColumn {
    pub fn get_table_name(&self, database: &Database) -> String {
        database.get_table(self.table_id).name.clone()
    }
}

/// A handle to a column: the owning table plus the column's position in that table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId {
    pub table_id: TableId,
    pub column_index: usize,
}

impl ColumnId {
    pub fn get_column<'a>(&self, database: &'a Database) -> &'a PhysicalColumn {
        database.get_column(*self)
    }

    /// `<table>.<column>`, for diagnostics
    pub fn qualified_name(&self, database: &Database) -> String {
        let column = self.get_column(database);
        format!("{}.{}", column.get_table_name(database), column.name)
    }
}

/// The type of a column in a physical table. Dialect providers use it to pick parameter types.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalColumnType {
    Int { bits: IntBits },
    String { max_length: Option<usize> },
    Boolean,
    Float { bits: FloatBits },
    Timestamp { timezone: bool },
    Uuid,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntBits {
    _16,
    _32,
    _64,
}

/// Number of bits in the float's mantissa.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatBits {
    _24,
    _53,
}
