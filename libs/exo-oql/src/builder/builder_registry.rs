// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::debug;

use crate::{compile_error::CompileError, expr::operator::OperatorNode};

use super::{
    SequenceBuilder,
    select_builder::SelectBuilder,
    table_builder::TableBuilder,
    update_builder::{SetBuilder, UpdateBuilder},
    where_builder::WhereBuilder,
};

/// The builders an operator tree may be compiled with.
#[derive(Clone)]
pub struct BuilderRegistry<'s> {
    builders: Vec<&'s dyn SequenceBuilder>,
}

impl<'s> BuilderRegistry<'s> {
    pub fn new(builders: Vec<&'s dyn SequenceBuilder>) -> Self {
        Self { builders }
    }

    /// Find the builder for `node`. Exactly one builder must claim it: dispatch is never
    /// resolved by registration order.
    pub fn find(&self, node: &OperatorNode) -> Result<&'s dyn SequenceBuilder, CompileError> {
        let candidates: Vec<&'s dyn SequenceBuilder> = self
            .builders
            .iter()
            .copied()
            .filter(|builder| builder.can_build(node))
            .collect();

        match candidates.as_slice() {
            [builder] => {
                debug!("Using builder: {}", builder.id());
                Ok(*builder)
            }
            _ => Err(CompileError::AmbiguousBuilder {
                operator: format!("{:?}", node.kind),
                candidates: candidates
                    .iter()
                    .map(|builder| builder.id().to_string())
                    .collect(),
            }),
        }
    }
}

impl Default for BuilderRegistry<'_> {
    fn default() -> Self {
        Self::new(vec![
            &TableBuilder {},
            &WhereBuilder {},
            &SelectBuilder {},
            &UpdateBuilder {},
            &SetBuilder {},
        ])
    }
}
