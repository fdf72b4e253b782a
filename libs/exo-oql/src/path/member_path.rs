// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use crate::expr::expression::Expr;

/// A symbolic access path: a lambda parameter followed by member accessors. For example,
/// `c.venue.name` is rooted at `c` with the steps `["venue", "name"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPath {
    pub root: String,
    pub steps: Vec<String>,
}

impl MemberPath {
    pub fn new(root: impl Into<String>, steps: Vec<String>) -> Self {
        Self {
            root: root.into(),
            steps,
        }
    }

    /// Peel member accesses off `expr`, outermost first, until reaching the root. Returns `None`
    /// unless the root is a lambda parameter (conversions along the way are ignored).
    pub fn from_expr(expr: &Expr) -> Option<MemberPath> {
        let mut steps = vec![];
        let mut current = expr.strip_convert();

        loop {
            match current {
                Expr::Member { object, member } => {
                    steps.push(member.clone());
                    current = object.strip_convert();
                }
                Expr::Parameter(name) => {
                    steps.reverse();
                    return Some(MemberPath::new(name.clone(), steps));
                }
                _ => return None,
            }
        }
    }

    /// The steps joined with `.`, which is how flattened (complex) members are named in the
    /// mapping. For example, `v.location.city` yields `location.city`.
    pub fn qualified_name(&self) -> String {
        self.steps.join(".")
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Display for MemberPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.root)?;
        for step in &self.steps {
            write!(f, ".{step}")?;
        }
        Ok(())
    }
}

/// Split `steps` into a qualified member name and the remaining steps, longest name first. A
/// resolver tries each candidate in turn so that `location.city` binds as one flattened member
/// before `location` is considered on its own.
pub fn qualified_prefixes(steps: &[String]) -> impl Iterator<Item = (String, &[String])> {
    (1..=steps.len())
        .rev()
        .map(move |len| (steps[..len].join("."), &steps[len..]))
}
