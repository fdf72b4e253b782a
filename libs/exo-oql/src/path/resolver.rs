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
    builder::query_builder::QueryBuilder,
    compile_error::CompileError,
    context::{AssociationContext, BuildContext, ContextId, LambdaContext},
    expr::expression::{Expr, Lambda},
    mapping::{AssociationMapping, MemberMapping},
    sql::{
        expression::SqlExpression,
        join::{JoinKind, TableSource},
        predicate::Predicate,
    },
};

use super::member_path::{MemberPath, qualified_prefixes};

/// What a member path denotes within a context.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberClass {
    /// The rows of a table (the path stops at the root sequence)
    Table(ContextId),
    /// The rows reached through an association
    Association(ContextId),
    /// A physical column
    Field(SqlExpression),
    /// A computed value (a computed member or a non-member projection)
    Expression(SqlExpression),
    /// A complex member or a constructed object. `steps` are relative to `context`.
    Object {
        context: ContextId,
        steps: Vec<String>,
    },
}

impl QueryBuilder<'_> {
    /// Classify `path` from the point of view of `scope`.
    ///
    /// Finds the context binding the path's root parameter by walking parent links from
    /// `scope`, then lets that sequence classify the steps.
    pub fn resolve_path(
        &mut self,
        scope: ContextId,
        path: &MemberPath,
    ) -> Result<MemberClass, CompileError> {
        let sequence = self.find_binding(scope, &path.root).ok_or_else(|| {
            CompileError::MemberResolution {
                path: path.to_string(),
                reason: format!("parameter '{}' is not in scope", path.root),
            }
        })?;

        trace!("Resolving {} against a {} context", path, self.context(sequence).kind_name());

        self.classify(sequence, &path.steps).map_err(|error| match error {
            CompileError::MemberResolution { reason, .. } => CompileError::MemberResolution {
                path: path.to_string(),
                reason,
            },
            error => error,
        })
    }

    pub(crate) fn find_binding(&self, scope: ContextId, parameter: &str) -> Option<ContextId> {
        let mut current = Some(scope);
        while let Some(context_id) = current {
            let context = self.context(context_id);
            if let Some(sequence) = context.binding(parameter) {
                return Some(sequence);
            }
            current = context.parent();
        }
        None
    }

    /// Classify `steps` relative to the sequence `context_id`
    pub fn classify(
        &mut self,
        context_id: ContextId,
        steps: &[String],
    ) -> Result<MemberClass, CompileError> {
        match self.context(context_id) {
            BuildContext::Table(_) | BuildContext::Association(_) => {
                self.classify_table_member(context_id, steps)
            }
            BuildContext::Projection(projection) => {
                let sequence = projection.sequence;
                let is_scalar = projection.is_scalar;
                let lambda = projection.lambda.clone();
                let body = lambda.body.strip_convert();
                if is_scalar {
                    self.classify_projected_value(context_id, sequence, &lambda, body, steps)
                } else {
                    self.classify_projected(context_id, sequence, &lambda, body, steps)
                }
            }
            BuildContext::Lambda(_) => Err(CompileError::UnsupportedShape(
                "a lambda scope is not a sequence".to_string(),
            )),
            BuildContext::UpdateTerminal(_) => Err(CompileError::UnsupportedShape(
                "an update statement has no readable members".to_string(),
            )),
        }
    }

    fn classify_table_member(
        &mut self,
        context_id: ContextId,
        steps: &[String],
    ) -> Result<MemberClass, CompileError> {
        let context = self.context(context_id);

        if steps.is_empty() {
            return Ok(match context {
                BuildContext::Association(_) => MemberClass::Association(context_id),
                _ => MemberClass::Table(context_id),
            });
        }

        let (entity_name, _, alias) = context.table_source().ok_or_else(|| {
            CompileError::UnsupportedShape(format!(
                "a {} context has no table members",
                context.kind_name()
            ))
        })?;
        let alias = alias.to_string();
        let entity = self.entity(entity_name)?;

        // Longest prefix first, so that a flattened member such as `location.city` wins over `location`
        for (name, rest) in qualified_prefixes(steps) {
            let Some(member) = entity.member(&name) else {
                continue;
            };

            trace!("Member {} of {} is {:?}", name, entity.name, member);

            return match member {
                MemberMapping::Column(column_id) if rest.is_empty() => Ok(MemberClass::Field(
                    SqlExpression::physical(*column_id, Some(alias)),
                )),
                MemberMapping::Computed(lambda) if rest.is_empty() => {
                    let scope = self.lambda_scope(lambda, context_id, Some(context_id))?;
                    let sql = self.convert_to_sql_expression(scope, &lambda.body)?;
                    Ok(MemberClass::Expression(sql))
                }
                MemberMapping::Association(association) => {
                    let target = self.association_context(context_id, &name, association)?;
                    self.classify(target, rest)
                }
                _ => Err(CompileError::MemberResolution {
                    path: steps.join("."),
                    reason: format!("'{name}' of {} has no members", entity.name),
                }),
            };
        }

        let qualified_name = steps.join(".");
        if entity.is_complex(&qualified_name) {
            Ok(MemberClass::Object {
                context: context_id,
                steps: steps.to_vec(),
            })
        } else {
            Err(CompileError::MemberResolution {
                path: qualified_name,
                reason: format!("no such member in {}", entity.name),
            })
        }
    }

    /// Classify `steps` relative to `expr`, a (part of a) projection body
    fn classify_projected(
        &mut self,
        projection: ContextId,
        sequence: ContextId,
        lambda: &Lambda,
        expr: &Expr,
        steps: &[String],
    ) -> Result<MemberClass, CompileError> {
        match expr.strip_convert() {
            Expr::New(bindings) => match steps.split_first() {
                None => Ok(MemberClass::Object {
                    context: projection,
                    steps: vec![],
                }),
                Some((first, rest)) => {
                    let binding = bindings
                        .iter()
                        .find(|binding| &binding.member == first)
                        .ok_or_else(|| CompileError::MemberResolution {
                            path: steps.join("."),
                            reason: "no such member in the projection".to_string(),
                        })?;
                    let class =
                        self.classify_projected(projection, sequence, lambda, &binding.value, rest)?;
                    match class {
                        // Re-root objects in this projection, so that their members are found
                        // through the construction
                        MemberClass::Object { context, .. } if context == projection => {
                            Ok(MemberClass::Object {
                                context: projection,
                                steps: steps.to_vec(),
                            })
                        }
                        class => Ok(class),
                    }
                }
            },
            expr => self.classify_projected_value(projection, sequence, lambda, expr, steps),
        }
    }

    /// Classify `steps` relative to `expr`, a projected value other than a construction. A path
    /// rooted at the projection's parameter delegates to the projected sequence.
    fn classify_projected_value(
        &mut self,
        projection: ContextId,
        sequence: ContextId,
        lambda: &Lambda,
        expr: &Expr,
        steps: &[String],
    ) -> Result<MemberClass, CompileError> {
        let rooted_path =
            MemberPath::from_expr(expr).filter(|path| Some(path.root.as_str()) == lambda.parameter());

        match rooted_path {
            Some(path) => {
                let mut full_steps = path.steps;
                full_steps.extend(steps.iter().cloned());
                self.classify(sequence, &full_steps)
            }
            None if steps.is_empty() => {
                let parent = self.context(projection).parent();
                let scope = self.lambda_scope(lambda, sequence, parent)?;
                let sql = self.convert_to_sql_expression(scope, expr)?;
                Ok(MemberClass::Expression(sql))
            }
            None => Err(CompileError::MemberResolution {
                path: steps.join("."),
                reason: "a projected value has no members".to_string(),
            }),
        }
    }

    /// The context for the rows reached through `association`, introducing a weak join the first
    /// time the association is traversed from `owner`
    fn association_context(
        &mut self,
        owner: ContextId,
        name: &str,
        association: &AssociationMapping,
    ) -> Result<ContextId, CompileError> {
        if let Some(existing) = self
            .context(owner)
            .associations()
            .and_then(|associations| associations.get(name))
        {
            return Ok(*existing);
        }

        let owner_context = self.context(owner);
        let model = owner_context.model();
        let owner_alias = owner_context
            .table_source()
            .map(|(_, _, alias)| alias.to_string());

        let target = self.entity(&association.target_entity)?;
        let alias = self.next_alias();

        let kind = if association.optional {
            JoinKind::Left
        } else {
            JoinKind::Inner
        };
        let predicate = Predicate::eq(
            SqlExpression::physical(association.self_column, owner_alias),
            SqlExpression::physical(association.foreign_column, Some(alias.clone())),
        );

        trace!(
            "Adding a weak {:?} join to {} as {} for {}",
            kind,
            self.database.get_table(target.table_id).name,
            alias,
            name
        );

        self.models[model].from.add_weak_join(
            TableSource {
                table_id: target.table_id,
                alias: alias.clone(),
            },
            kind,
            predicate,
        );

        let context_id = self.add_context(BuildContext::Association(AssociationContext {
            model,
            name: name.to_string(),
            entity: target.name.clone(),
            table_id: target.table_id,
            alias,
            owner,
            associations: Default::default(),
        }));

        if let Some(associations) = self.context_mut(owner).associations_mut() {
            associations.insert(name.to_string(), context_id);
        }

        Ok(context_id)
    }

    /// A lambda scope binding the lambda's (row) parameter to `sequence`
    pub fn lambda_scope(
        &mut self,
        lambda: &Lambda,
        sequence: ContextId,
        parent: Option<ContextId>,
    ) -> Result<ContextId, CompileError> {
        let parameter = lambda.parameter().ok_or_else(|| {
            CompileError::UnsupportedShape("a lambda without parameters".to_string())
        })?;
        let model = self.context(sequence).model();

        Ok(self.add_context(BuildContext::Lambda(LambdaContext {
            parent,
            model,
            bindings: vec![(parameter.to_string(), sequence)],
        })))
    }
}
