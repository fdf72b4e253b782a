// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{FloatBits, IntBits, PhysicalColumnType};

use super::column_spec::ColumnSpec;

pub fn pk_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        name: name.into(),
        typ: PhysicalColumnType::Int { bits: IntBits::_32 },
        is_pk: true,
        is_nullable: false,
    }
}

/// A non-nullable column holding the primary key of another table
pub fn reference_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        name: name.into(),
        typ: PhysicalColumnType::Int { bits: IntBits::_32 },
        is_pk: false,
        is_nullable: false,
    }
}

pub fn optional_reference_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        is_nullable: true,
        ..reference_column(name)
    }
}

pub fn int_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        name: name.into(),
        typ: PhysicalColumnType::Int { bits: IntBits::_32 },
        is_pk: false,
        is_nullable: false,
    }
}

pub fn string_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        name: name.into(),
        typ: PhysicalColumnType::String { max_length: None },
        is_pk: false,
        is_nullable: false,
    }
}

pub fn bool_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        name: name.into(),
        typ: PhysicalColumnType::Boolean,
        is_pk: false,
        is_nullable: false,
    }
}

pub fn float_column(name: impl Into<String>) -> ColumnSpec {
    ColumnSpec {
        name: name.into(),
        typ: PhysicalColumnType::Float {
            bits: FloatBits::_53,
        },
        is_pk: false,
        is_nullable: false,
    }
}
