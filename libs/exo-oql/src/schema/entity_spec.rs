// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::expr::expression::Lambda;

pub enum MemberSpec {
    /// Stored in the named column of the entity's table
    Column(String),
    Computed(Lambda),
    Association {
        target_entity: String,
        /// Column in the entity's table
        self_column: String,
        /// Column in the target entity's table
        foreign_column: String,
        optional: bool,
    },
}

/// An entity over a table. Members of complex (embedded) objects use a qualified name such as
/// `location.city`.
pub struct EntitySpec {
    pub(super) name: String,
    pub(super) table: String,
    pub(super) members: Vec<(String, MemberSpec)>,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            members: vec![],
        }
    }

    pub fn column(self, member: impl Into<String>, column: impl Into<String>) -> Self {
        self.with_member(member, MemberSpec::Column(column.into()))
    }

    pub fn computed(self, member: impl Into<String>, lambda: Lambda) -> Self {
        self.with_member(member, MemberSpec::Computed(lambda))
    }

    pub fn association(
        self,
        member: impl Into<String>,
        target_entity: impl Into<String>,
        self_column: impl Into<String>,
        foreign_column: impl Into<String>,
        optional: bool,
    ) -> Self {
        self.with_member(
            member,
            MemberSpec::Association {
                target_entity: target_entity.into(),
                self_column: self_column.into(),
                foreign_column: foreign_column.into(),
                optional,
            },
        )
    }

    pub fn with_member(mut self, member: impl Into<String>, spec: MemberSpec) -> Self {
        self.members.push((member.into(), spec));
        self
    }
}
