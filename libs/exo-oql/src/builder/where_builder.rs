// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    compile_error::CompileError,
    context::ContextId,
    expr::operator::{Argument, OperatorKind, OperatorNode},
};

use super::{BuildInfo, SequenceBuilder, query_builder::QueryBuilder, required_sequence};

/// Compiles `Where(source, |row| predicate)` by conjoining the predicate into the source's model.
pub struct WhereBuilder {}

impl SequenceBuilder for WhereBuilder {
    fn id(&self) -> &'static str {
        "where"
    }

    fn can_build(&self, node: &OperatorNode) -> bool {
        node.kind == OperatorKind::Where
            && node.primary_source().is_some()
            && matches!(node.operands(), [Argument::Lambda(_)])
    }

    fn build(
        &self,
        builder: &mut QueryBuilder<'_>,
        node: &OperatorNode,
        sequence: Option<ContextId>,
        info: &BuildInfo,
    ) -> Result<ContextId, CompileError> {
        let sequence = required_sequence(node, sequence)?;
        builder.ensure_composable(sequence, "a filter")?;

        let [Argument::Lambda(predicate)] = node.operands() else {
            return Err(CompileError::UnsupportedShape(
                "a filter takes a single predicate".to_string(),
            ));
        };

        build_where(builder, sequence, predicate, info)?;
        Ok(sequence)
    }
}

/// Compile `predicate` over `sequence` and conjoin it into the sequence's where clause
pub(super) fn build_where(
    builder: &mut QueryBuilder<'_>,
    sequence: ContextId,
    predicate: &crate::expr::expression::Lambda,
    info: &BuildInfo,
) -> Result<(), CompileError> {
    let scope = builder.lambda_scope(predicate, sequence, info.parent)?;
    let predicate = builder.convert_to_predicate(scope, &predicate.body)?;

    let model = builder.context(sequence).model();
    builder.models[model].add_predicate(predicate);

    Ok(())
}
