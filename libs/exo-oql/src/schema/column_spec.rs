// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{PhysicalColumn, PhysicalColumnType, TableId};

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub typ: PhysicalColumnType,
    pub is_pk: bool,
    pub is_nullable: bool,
}

impl ColumnSpec {
    pub(super) fn to_column(self, table_id: TableId) -> PhysicalColumn {
        PhysicalColumn {
            table_id,
            name: self.name,
            typ: self.typ,
            is_pk: self.is_pk,
            is_nullable: self.is_nullable,
        }
    }
}
