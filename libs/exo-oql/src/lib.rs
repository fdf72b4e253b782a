// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// A compiler for chained object queries. A caller describes a query as a tree of
/// [OperatorNode]s (a source entity, filters, projections, and updates) and
/// [QueryCompiler] turns it into a provider-agnostic statement model
/// ([SqlQueryModel]) that a [DialectProvider] renders as SQL text.
///
/// Compilation walks the operator tree outside-in: each operator's source is compiled
/// first into a build context (a table, an association reached from it, a projection,
/// ...), and the operator's builder then refines the shared statement model through that
/// context. Member accesses such as `c.venue.location.city` resolve against the context
/// chain into columns, computed expressions, or joined tables.
///
/// Updates come in several shapes: a whole-object setter (`update(|c| Concert { .. })`),
/// a filter plus a setter, a setter assigning the rows of another table, and incremental
/// `set(|c| c.title, value)` operators. All of them accumulate `column = value` items
/// against a single target table.
///
/// The entity-to-table [Mapping] is supplied by the caller through [MappingSchema];
/// [MappingSpec] builds one (along with the [Database]) from declarative specs.
pub mod builder;
pub mod compile_error;
pub mod compiler;
pub mod config;
pub mod context;
pub mod dialect;
pub mod expr;
pub mod mapping;
pub mod path;
pub mod schema;
pub mod sql;

mod test_util;

/// Public types at the root level of this crate
pub use compile_error::{CompileError, SchemaError, WithContext};
pub use compiler::{CompiledQuery, QueryCompiler};
pub use config::{CompilerConfig, ConfigError, Environment, MapEnvironment, SystemEnvironment};
pub use dialect::{DialectProvider, RenderedStatement};
pub use expr::{
    expression::{AggregateFunction, BinaryOperator, Expr, Lambda, MemberBinding},
    operator::{Argument, OperatorKind, OperatorNode},
};
pub use mapping::{AssociationMapping, EntityMapping, Mapping, MappingSchema, MemberMapping};
pub use schema::mapping_spec::MappingSpec;
pub use sql::{
    database::{Database, TableId},
    expression::{SqlExpression, SqlParam, SqlValue},
    physical_column::{ColumnId, FloatBits, IntBits, PhysicalColumn, PhysicalColumnType},
    physical_table::PhysicalTable,
    predicate::{ConcretePredicate, ParamEquality, Predicate},
    query_model::{ModelId, QueryType, SqlQueryModel},
};
