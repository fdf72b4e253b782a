// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Debug, Formatter};

use crate::{ColumnId, PhysicalColumn, PhysicalTable};

use serde::{Deserialize, Serialize};
use typed_generational_arena::{Arena, IgnoreGeneration, Index};

pub type SerializableSlab<T> = Arena<T, usize, IgnoreGeneration>;
pub type TableId = Index<PhysicalTable, usize, IgnoreGeneration>;

/// The physical side of the mapping: every table (and its columns) a query may touch.
///
/// Compilation only reads from the database, so a single instance can be shared by any number
/// of compilations.
#[derive(Serialize, Deserialize)]
pub struct Database {
    tables: SerializableSlab<PhysicalTable>,
}

impl Database {
    pub fn get_table(&self, id: TableId) -> &PhysicalTable {
        &self.tables[id]
    }

    pub fn get_column(&self, column_id: ColumnId) -> &PhysicalColumn {
        &self.tables[column_id.table_id].columns[column_id.column_index]
    }

    pub fn tables(&self) -> &SerializableSlab<PhysicalTable> {
        &self.tables
    }

    pub fn insert_table(&mut self, table: PhysicalTable) -> TableId {
        self.tables.insert(table)
    }

    pub fn get_table_mut(&mut self, id: TableId) -> &mut PhysicalTable {
        &mut self.tables[id]
    }

    pub fn get_table_id(&self, table_name: &str) -> Option<TableId> {
        self.tables.iter().find_map(|(id, table)| {
            if table.name == table_name {
                Some(id)
            } else {
                None
            }
        })
    }

    pub fn get_pk_column_ids(&self, table_id: TableId) -> Vec<ColumnId> {
        self.tables[table_id]
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.is_pk)
            .map(|(column_index, _)| new_column_id(table_id, column_index))
            .collect()
    }

    pub fn get_column_id(&self, table_id: TableId, column_name: &str) -> Option<ColumnId> {
        self.tables[table_id]
            .column_index(column_name)
            .map(|column_index| new_column_id(table_id, column_index))
    }
}

fn new_column_id(table_id: TableId, column_index: usize) -> ColumnId {
    ColumnId {
        table_id,
        column_index,
    }
}

impl Default for Database {
    fn default() -> Self {
        Database {
            tables: SerializableSlab::new(),
        }
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (id, table) in self.tables.iter() {
            writeln!(f, "{}: {}", id.arr_idx(), table.name)?;
            writeln!(f, "  columns: ")?;
            for (column_id, column) in table.columns.iter().enumerate() {
                writeln!(f, "    {}: {:?}", column_id, column)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::TestSetup;

    #[test]
    fn lookup_by_name() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 concerts_table,
                 concerts_title_column,
                 ..
             }| {
                assert_eq!(database.get_table_id("concerts"), Some(concerts_table));
                assert_eq!(database.get_table_id("tours"), None);
                assert_eq!(
                    database.get_column_id(concerts_table, "title"),
                    Some(concerts_title_column)
                );
                assert_eq!(database.get_column(concerts_title_column).name, "title");
            },
        )
    }

    #[test]
    fn pk_columns() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 venues_table,
                 venues_id_column,
                 ..
             }| {
                assert_eq!(
                    database.get_pk_column_ids(venues_table),
                    vec![venues_id_column]
                );
            },
        )
    }
}
