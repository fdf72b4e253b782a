// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The scopes operators compile against.
//!
//! Every compiled operator yields a context. Contexts live in a per-compilation arena and point to
//! their parent scope (if any) and to the model they mutate. Capability queries (see
//! [`capability`]) walk parent links until some context claims a member path.

use indexmap::IndexMap;
use typed_generational_arena::{IgnoreGeneration, Index};

use crate::{TableId, expr::expression::Lambda, sql::database::SerializableSlab};
use crate::sql::query_model::ModelId;

pub mod capability;

pub type ContextId = Index<BuildContext, usize, IgnoreGeneration>;
pub type ContextArena = SerializableSlab<BuildContext>;

#[derive(Debug, Clone, PartialEq)]
pub enum BuildContext {
    Table(TableContext),
    Association(AssociationContext),
    Projection(ProjectionContext),
    Lambda(LambdaContext),
    UpdateTerminal(UpdateTerminalContext),
}

/// The rows of an entity's table, such as `concerts AS t1`
#[derive(Debug, Clone, PartialEq)]
pub struct TableContext {
    pub parent: Option<ContextId>,
    pub model: ModelId,
    pub entity: String,
    pub table_id: TableId,
    pub alias: String,
    /// Association contexts already traversed from this context, keyed by member name
    pub associations: IndexMap<String, ContextId>,
}

/// The rows reached by traversing an association (`c.venue`). Introduces a (weak) join into the
/// owner's model. Its scope is the owner's, so it has no parent link of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationContext {
    pub model: ModelId,
    pub name: String,
    pub entity: String,
    pub table_id: TableId,
    pub alias: String,
    pub owner: ContextId,
    pub associations: IndexMap<String, ContextId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionContext {
    pub parent: Option<ContextId>,
    pub model: ModelId,
    pub sequence: ContextId,
    pub lambda: Lambda,
    /// A scalar projection selects a single value or row (`c => c.venue`) rather than
    /// constructing a new object
    pub is_scalar: bool,
}

/// Binds lambda parameters to the sequences they range over
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaContext {
    pub parent: Option<ContextId>,
    pub model: ModelId,
    pub bindings: Vec<(String, ContextId)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTerminalContext {
    pub parent: Option<ContextId>,
    pub model: ModelId,
    pub sequence: ContextId,
}

impl BuildContext {
    pub fn parent(&self) -> Option<ContextId> {
        match self {
            BuildContext::Table(context) => context.parent,
            BuildContext::Association(context) => Some(context.owner),
            BuildContext::Projection(context) => context.parent,
            BuildContext::Lambda(context) => context.parent,
            BuildContext::UpdateTerminal(context) => context.parent,
        }
    }

    pub fn set_parent(&mut self, parent: Option<ContextId>) {
        match self {
            BuildContext::Table(context) => context.parent = parent,
            // Follows its owner
            BuildContext::Association(_) => {}
            BuildContext::Projection(context) => context.parent = parent,
            BuildContext::Lambda(context) => context.parent = parent,
            BuildContext::UpdateTerminal(context) => context.parent = parent,
        }
    }

    pub fn model(&self) -> ModelId {
        match self {
            BuildContext::Table(context) => context.model,
            BuildContext::Association(context) => context.model,
            BuildContext::Projection(context) => context.model,
            BuildContext::Lambda(context) => context.model,
            BuildContext::UpdateTerminal(context) => context.model,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            BuildContext::Table(_) => "table",
            BuildContext::Association(_) => "association",
            BuildContext::Projection(_) => "projection",
            BuildContext::Lambda(_) => "lambda",
            BuildContext::UpdateTerminal(_) => "update",
        }
    }

    /// The parameter bound to `name` by this context, if it is a lambda scope
    pub fn binding(&self, name: &str) -> Option<ContextId> {
        match self {
            BuildContext::Lambda(context) => context
                .bindings
                .iter()
                .find_map(|(parameter, sequence)| (parameter == name).then_some(*sequence)),
            _ => None,
        }
    }

    /// Entity, table, and alias for contexts that range over a table's rows
    pub fn table_source(&self) -> Option<(&str, TableId, &str)> {
        match self {
            BuildContext::Table(context) => {
                Some((&context.entity, context.table_id, &context.alias))
            }
            BuildContext::Association(context) => {
                Some((&context.entity, context.table_id, &context.alias))
            }
            _ => None,
        }
    }

    pub(crate) fn associations_mut(&mut self) -> Option<&mut IndexMap<String, ContextId>> {
        match self {
            BuildContext::Table(context) => Some(&mut context.associations),
            BuildContext::Association(context) => Some(&mut context.associations),
            _ => None,
        }
    }

    pub(crate) fn associations(&self) -> Option<&IndexMap<String, ContextId>> {
        match self {
            BuildContext::Table(context) => Some(&context.associations),
            BuildContext::Association(context) => Some(&context.associations),
            _ => None,
        }
    }
}
