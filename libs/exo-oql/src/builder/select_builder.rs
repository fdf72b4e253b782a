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
    context::{BuildContext, ContextId, ProjectionContext},
    expr::{
        expression::Expr,
        operator::{Argument, OperatorKind, OperatorNode},
    },
};

use super::{BuildInfo, SequenceBuilder, query_builder::QueryBuilder, required_sequence};

/// Compiles `Select(source, |row| projection)` into a projection context. The select list is only
/// populated once the projection is read (or used as an update source).
pub struct SelectBuilder {}

impl SequenceBuilder for SelectBuilder {
    fn id(&self) -> &'static str {
        "select"
    }

    fn can_build(&self, node: &OperatorNode) -> bool {
        node.kind == OperatorKind::Select
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
        builder.ensure_composable(sequence, "a projection")?;

        let [Argument::Lambda(lambda)] = node.operands() else {
            return Err(CompileError::UnsupportedShape(
                "a projection takes a single lambda".to_string(),
            ));
        };

        let model = builder.context(sequence).model();
        let is_scalar = !matches!(lambda.body.strip_convert(), Expr::New(_));

        Ok(builder.add_context(BuildContext::Projection(ProjectionContext {
            parent: info.parent,
            model,
            sequence,
            lambda: lambda.clone(),
            is_scalar,
        })))
    }
}
