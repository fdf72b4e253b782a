// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The mapping from entities (and their members) to physical tables and columns.
//!
//! Discovering a mapping (from annotations, a schema file, etc.) is up to the caller. The
//! compiler only consumes it through [`MappingSchema`].

use indexmap::IndexMap;

use crate::{ColumnId, TableId, expr::expression::Lambda};

/// A relationship from one entity to another, such as `Concert.venue`. For example, for
/// `concert.venue`, the self column is `concerts.venue_id` and the foreign column is
/// `venues.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationMapping {
    pub target_entity: String,
    pub self_column: ColumnId,
    pub foreign_column: ColumnId,
    /// Whether a row may lack an associated row (maps to a left join)
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberMapping {
    /// A member stored in a column. Members of complex (embedded) objects are flattened into
    /// their owner with a qualified name such as `location.city`.
    Column(ColumnId),
    /// A read-only member computed from other members of the same entity. The lambda's single
    /// parameter is the entity itself.
    Computed(Lambda),
    Association(AssociationMapping),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityMapping {
    pub name: String,
    pub table_id: TableId,
    /// Keyed by (qualified) member name, in declaration order
    pub members: IndexMap<String, MemberMapping>,
}

impl EntityMapping {
    pub fn member(&self, qualified_name: &str) -> Option<&MemberMapping> {
        self.members.get(qualified_name)
    }

    /// Is `qualified_name` a complex member, i.e. the prefix of flattened members (such as
    /// `location` for `location.city`)?
    pub fn is_complex(&self, qualified_name: &str) -> bool {
        let prefix = format!("{qualified_name}.");
        self.members.keys().any(|name| name.starts_with(&prefix))
    }

    /// Column-backed members whose name starts with `prefix` (all of them when `prefix` is
    /// `None`), in declaration order
    pub fn columns(&self, prefix: Option<&str>) -> Vec<(&str, ColumnId)> {
        let prefix = prefix.map(|prefix| format!("{prefix}."));

        self.members
            .iter()
            .filter_map(|(name, member)| match member {
                MemberMapping::Column(column_id) => Some((name.as_str(), *column_id)),
                _ => None,
            })
            .filter(|(name, _)| match &prefix {
                Some(prefix) => name.starts_with(prefix.as_str()),
                None => true,
            })
            .collect()
    }
}

/// Supplies the mapping to the compiler.
pub trait MappingSchema {
    fn entity(&self, name: &str) -> Option<&EntityMapping>;

    fn entity_for_table(&self, table_id: TableId) -> Option<&EntityMapping>;
}

/// An in-memory [`MappingSchema`], typically built through
/// [`MappingSpec`](crate::schema::mapping_spec::MappingSpec).
#[derive(Debug, Default)]
pub struct Mapping {
    entities: IndexMap<String, EntityMapping>,
}

impl Mapping {
    pub fn new(entities: Vec<EntityMapping>) -> Self {
        Self {
            entities: entities
                .into_iter()
                .map(|entity| (entity.name.clone(), entity))
                .collect(),
        }
    }
}

impl MappingSchema for Mapping {
    fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    fn entity_for_table(&self, table_id: TableId) -> Option<&EntityMapping> {
        self.entities
            .values()
            .find(|entity| entity.table_id == table_id)
    }
}
