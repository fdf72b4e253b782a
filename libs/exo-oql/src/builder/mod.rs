// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! One strategy ("sequence builder") per operator shape, plus the services they share.

use crate::{compile_error::CompileError, context::ContextId, expr::operator::OperatorNode};

use query_builder::QueryBuilder;

pub mod builder_registry;
pub mod query_builder;
pub mod select_builder;
pub mod table_builder;
pub mod update_builder;
pub mod where_builder;

/// What an operator is being built for
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuildInfo {
    /// The enclosing scope. Set when compiling a nested query (such as an aggregate sub-query), so
    /// that its lambdas may refer to parameters of the enclosing lambdas.
    pub parent: Option<ContextId>,
}

/// A strategy for compiling one operator shape.
pub trait SequenceBuilder: Sync {
    /// A unique identifier for this builder (for debugging purposes)
    fn id(&self) -> &'static str;

    /// Returns true if this builder handles the operator's kind and argument shape. Exactly one
    /// registered builder may claim any given node.
    fn can_build(&self, node: &OperatorNode) -> bool;

    /// Compile `node`. `sequence` is the already compiled primary source of the node (if it has
    /// one).
    fn build(
        &self,
        builder: &mut QueryBuilder<'_>,
        node: &OperatorNode,
        sequence: Option<ContextId>,
        info: &BuildInfo,
    ) -> Result<ContextId, CompileError>;
}

/// The compiled primary source, which every operator other than `Source` requires
pub(crate) fn required_sequence(
    node: &OperatorNode,
    sequence: Option<ContextId>,
) -> Result<ContextId, CompileError> {
    sequence.ok_or_else(|| {
        CompileError::UnsupportedShape(format!("{:?} requires a source sequence", node.kind))
    })
}
