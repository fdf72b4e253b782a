// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::trace;

use crate::{
    compile_error::CompileError,
    context::{BuildContext, ContextId, TableContext},
    expr::operator::{Argument, OperatorKind, OperatorNode},
    sql::join::TableSource,
};

use super::{BuildInfo, SequenceBuilder, query_builder::QueryBuilder};

/// Compiles `Source(entity)`: a fresh model reading from the entity's table.
pub struct TableBuilder {}

impl SequenceBuilder for TableBuilder {
    fn id(&self) -> &'static str {
        "source"
    }

    fn can_build(&self, node: &OperatorNode) -> bool {
        node.kind == OperatorKind::Source && matches!(node.arguments.as_slice(), [Argument::Entity(_)])
    }

    fn build(
        &self,
        builder: &mut QueryBuilder<'_>,
        node: &OperatorNode,
        _sequence: Option<ContextId>,
        info: &BuildInfo,
    ) -> Result<ContextId, CompileError> {
        let Some(Argument::Entity(entity_name)) = node.arguments.first() else {
            return Err(CompileError::UnsupportedShape(
                "a source must name an entity".to_string(),
            ));
        };

        let entity = builder.entity(entity_name)?;
        let alias = builder.next_alias();

        let model = builder.add_model();
        builder.models[model].from.root = Some(TableSource {
            table_id: entity.table_id,
            alias: alias.clone(),
        });

        trace!(
            "{} reads from {} as {}",
            entity.name,
            builder.database.get_table(entity.table_id).name,
            alias
        );

        Ok(builder.add_context(BuildContext::Table(TableContext {
            parent: info.parent,
            model,
            entity: entity.name.clone(),
            table_id: entity.table_id,
            alias,
            associations: Default::default(),
        })))
    }
}
