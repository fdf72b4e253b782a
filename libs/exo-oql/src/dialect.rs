// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    Database, compile_error::CompileError, compiler::CompiledQuery, sql::expression::SqlParam,
};

/// Statement text plus the parameters to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Turns a compiled query into the text of one SQL dialect.
///
/// Implementations should call [`CompiledQuery::validate_for_render`] before rendering, so that
/// incomplete statements (such as an update without set items) are rejected.
pub trait DialectProvider {
    fn name(&self) -> &'static str;

    fn render(
        &self,
        query: &CompiledQuery,
        database: &Database,
    ) -> Result<RenderedStatement, CompileError>;
}
