// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The SQL query model: physical descriptors and the provider-agnostic statement representation
//! that compilation produces.

pub mod database;
pub mod expression;
pub mod join;
pub mod physical_column;
pub mod physical_table;
pub mod predicate;
pub mod query_model;
pub mod select;
pub mod update;
