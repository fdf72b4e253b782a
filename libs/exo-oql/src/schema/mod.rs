// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Declarative specs for building a [`Database`](crate::Database) together with the entity
//! [`Mapping`](crate::mapping::Mapping) over it.

pub mod column_spec;
pub mod entity_spec;
pub mod mapping_spec;
pub mod table_spec;

#[cfg(test)]
pub mod test_helper;
