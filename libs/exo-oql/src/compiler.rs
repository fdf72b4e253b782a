// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Debug, Formatter};

use tracing::debug;

use crate::{
    Database,
    builder::{builder_registry::BuilderRegistry, query_builder::QueryBuilder},
    compile_error::CompileError,
    config::CompilerConfig,
    context::{BuildContext, ContextArena, ContextId, capability::ConvertFlags},
    expr::operator::OperatorNode,
    mapping::MappingSchema,
    sql::query_model::{ModelArena, ModelId, SqlQueryModel},
};

/// Compiles operator trees against one database and mapping.
///
/// The compiler holds no per-query state, so one instance may compile any number of queries.
pub struct QueryCompiler<'a> {
    database: &'a Database,
    mapping: &'a dyn MappingSchema,
    registry: BuilderRegistry<'a>,
    config: CompilerConfig,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(
        database: &'a Database,
        mapping: &'a dyn MappingSchema,
        config: CompilerConfig,
    ) -> Self {
        Self {
            database,
            mapping,
            registry: BuilderRegistry::default(),
            config,
        }
    }

    /// Replace the default builders
    pub fn with_registry(self, registry: BuilderRegistry<'a>) -> Self {
        Self { registry, ..self }
    }

    pub fn compile(&self, node: &OperatorNode) -> Result<CompiledQuery, CompileError> {
        let mut builder = QueryBuilder::new(
            self.database,
            self.mapping,
            self.registry.clone(),
            self.config.clone(),
        );

        let root_context = builder.build_root(node)?;

        // A read statement selects whatever its root context stands for
        if !matches!(builder.context(root_context), BuildContext::UpdateTerminal(_)) {
            builder.convert_to_index(root_context, &[], ConvertFlags::All)?;
        }

        let root_model = builder.context(root_context).model();

        debug!(
            "Compiled {:?} into {} model(s) and {} context(s)",
            node.kind,
            builder.models.len(),
            builder.contexts.len()
        );

        Ok(CompiledQuery {
            models: builder.models,
            contexts: builder.contexts,
            root_model,
            root_context,
        })
    }
}

/// The result of compiling one operator tree: the statement model (plus any sub-query models it
/// refers to) and the contexts built along the way.
pub struct CompiledQuery {
    pub models: ModelArena,
    pub contexts: ContextArena,
    pub root_model: ModelId,
    pub root_context: ContextId,
}

impl CompiledQuery {
    /// The statement to render
    pub fn model(&self) -> &SqlQueryModel {
        &self.models[self.root_model]
    }

    pub fn get_model(&self, id: ModelId) -> &SqlQueryModel {
        &self.models[id]
    }

    pub fn context(&self, id: ContextId) -> &BuildContext {
        &self.contexts[id]
    }

    /// Check every model is complete enough to render. Dialect providers call this before
    /// rendering.
    pub fn validate_for_render(&self) -> Result<(), CompileError> {
        self.models.iter().try_for_each(|(_, model)| model.validate())
    }
}

impl PartialEq for CompiledQuery {
    fn eq(&self, other: &Self) -> bool {
        self.root_model == other.root_model
            && self.root_context == other.root_context
            && self.models.len() == other.models.len()
            && self.contexts.len() == other.contexts.len()
            && self
                .models
                .iter()
                .zip(other.models.iter())
                .all(|((id1, m1), (id2, m2))| id1 == id2 && m1 == m2)
            && self
                .contexts
                .iter()
                .zip(other.contexts.iter())
                .all(|((id1, c1), (id2, c2))| id1 == id2 && c1 == c2)
    }
}

impl Debug for CompiledQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "root model: {}", self.root_model.arr_idx())?;
        for (id, model) in self.models.iter() {
            writeln!(f, "  {}: {:?}", id.arr_idx(), model)?;
        }
        writeln!(f, "root context: {}", self.root_context.arr_idx())?;
        for (id, context) in self.contexts.iter() {
            writeln!(f, "  {}: {:?}", id.arr_idx(), context)?;
        }

        Ok(())
    }
}
