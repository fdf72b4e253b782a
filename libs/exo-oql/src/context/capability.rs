// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The questions operators ask of a context: "is this path a table/association/field?" and "what
//! SQL does this path stand for?" (either as expressions or as ordinals in the select list).

use crate::{
    ColumnId,
    builder::query_builder::QueryBuilder,
    compile_error::CompileError,
    expr::expression::Expr,
    path::{member_path::MemberPath, resolver::MemberClass},
    sql::expression::SqlExpression,
};

use super::{BuildContext, ContextId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFor {
    Field,
    Association,
    Table,
    Expression,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertFlags {
    /// The value of a single field
    Field,
    /// The primary key columns of a row
    Key,
    /// Every column of a row (or every member of an object)
    All,
}

/// One SQL expression a member path stands for
#[derive(Debug, Clone, PartialEq)]
pub struct SqlInfo {
    /// The (qualified) member name relative to the converted object, if the expression belongs
    /// to a member
    pub member: Option<String>,
    pub sql: SqlExpression,
    /// Position in the owning model's select list (set by by-ordinal conversion)
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsExpressionResult {
    pub result: bool,
    /// The context claiming the path, for table and association requests
    pub context: Option<ContextId>,
}

impl IsExpressionResult {
    const NO: IsExpressionResult = IsExpressionResult {
        result: false,
        context: None,
    };
}

impl QueryBuilder<'_> {
    /// Does `steps` (relative to the sequence `context_id`) denote what `request` asks for?
    pub fn is_expression(
        &mut self,
        context_id: ContextId,
        steps: &[String],
        request: RequestFor,
    ) -> Result<IsExpressionResult, CompileError> {
        if let BuildContext::UpdateTerminal(_) = self.context(context_id) {
            return Err(CompileError::UnsupportedShape(
                "an update statement cannot be queried".to_string(),
            ));
        }

        let class = match self.classify(context_id, steps) {
            Ok(class) => class,
            Err(CompileError::MemberResolution { .. }) => return Ok(IsExpressionResult::NO),
            Err(error) => return Err(error),
        };

        Ok(match (request, class) {
            (RequestFor::Table, MemberClass::Table(context))
            | (RequestFor::Table, MemberClass::Association(context))
            | (RequestFor::Association, MemberClass::Association(context)) => IsExpressionResult {
                result: true,
                context: Some(context),
            },
            (RequestFor::Field, MemberClass::Field(_))
            | (RequestFor::Expression, MemberClass::Field(_))
            | (RequestFor::Expression, MemberClass::Expression(_)) => IsExpressionResult {
                result: true,
                context: None,
            },
            (RequestFor::Object, MemberClass::Object { context, .. }) => IsExpressionResult {
                result: true,
                context: Some(context),
            },
            _ => IsExpressionResult::NO,
        })
    }

    /// The SQL expressions `steps` (relative to the sequence `context_id`) stands for. Rows and
    /// objects expand to one item per column, named relative to the object; a single value is
    /// named by its path.
    pub fn convert_to_sql(
        &mut self,
        context_id: ContextId,
        steps: &[String],
        flags: ConvertFlags,
    ) -> Result<Vec<SqlInfo>, CompileError> {
        let path_name = (!steps.is_empty()).then(|| steps.join("."));

        Ok(self
            .convert_members(context_id, steps, flags)?
            .into_iter()
            .map(|(member, sql)| SqlInfo {
                member: member.or_else(|| path_name.clone()),
                sql,
                index: None,
            })
            .collect())
    }

    /// Expressions for `steps` paired with member names relative to `steps` (`None` for a single
    /// value)
    fn convert_members(
        &mut self,
        context_id: ContextId,
        steps: &[String],
        flags: ConvertFlags,
    ) -> Result<Vec<(Option<String>, SqlExpression)>, CompileError> {
        match self.classify(context_id, steps)? {
            MemberClass::Field(sql) | MemberClass::Expression(sql) => Ok(vec![(None, sql)]),
            MemberClass::Table(row) | MemberClass::Association(row) => {
                self.row_columns(row, None, flags)
            }
            MemberClass::Object {
                context,
                steps: object_steps,
            } => match self.context(context) {
                BuildContext::Projection(projection) => {
                    let names = projected_members(&projection.lambda.body, &object_steps);

                    let mut members = vec![];
                    for name in names {
                        let mut member_steps = object_steps.clone();
                        member_steps.push(name.clone());

                        for (member, sql) in self.convert_members(context, &member_steps, flags)? {
                            let member = match member {
                                Some(member) => format!("{name}.{member}"),
                                None => name.clone(),
                            };
                            members.push((Some(member), sql));
                        }
                    }
                    Ok(members)
                }
                _ => self.row_columns(context, Some(&object_steps.join(".")), flags),
            },
        }
    }

    /// Convert `expr` as seen from `scope`. Member paths expand like [`Self::convert_to_sql`];
    /// any other expression yields a single unnamed value.
    pub fn convert_expr_to_sql(
        &mut self,
        scope: ContextId,
        expr: &Expr,
        flags: ConvertFlags,
    ) -> Result<Vec<SqlInfo>, CompileError> {
        match MemberPath::from_expr(expr) {
            Some(path) => {
                let sequence = self.find_binding(scope, &path.root).ok_or_else(|| {
                    CompileError::MemberResolution {
                        path: path.to_string(),
                        reason: format!("parameter '{}' is not in scope", path.root),
                    }
                })?;
                self.convert_to_sql(sequence, &path.steps, flags)
            }
            None => Ok(vec![SqlInfo {
                member: None,
                sql: self.convert_to_sql_expression(scope, expr)?,
                index: None,
            }]),
        }
    }

    /// Convert as [`Self::convert_to_sql`] does, then register each expression in the select list
    /// of the context's model
    pub fn convert_to_index(
        &mut self,
        context_id: ContextId,
        steps: &[String],
        flags: ConvertFlags,
    ) -> Result<Vec<SqlInfo>, CompileError> {
        let infos = self.convert_to_sql(context_id, steps, flags)?;
        let model = self.context(context_id).model();
        let select = &mut self.models[model].select;

        Ok(infos
            .into_iter()
            .map(|info| SqlInfo {
                index: Some(select.add(info.sql.clone())),
                ..info
            })
            .collect())
    }

    /// The columns of a row of a table-like context. For `prefix`, only those of that complex
    /// member (named relative to it).
    fn row_columns(
        &self,
        context_id: ContextId,
        prefix: Option<&str>,
        flags: ConvertFlags,
    ) -> Result<Vec<(Option<String>, SqlExpression)>, CompileError> {
        let context = self.context(context_id);
        let (entity_name, table_id, alias) = context.table_source().ok_or_else(|| {
            CompileError::UnsupportedShape(format!(
                "a {} context has no columns",
                context.kind_name()
            ))
        })?;
        let entity = self.entity(entity_name)?;

        let columns: Vec<(&str, ColumnId)> = match flags {
            ConvertFlags::Key => {
                let pk_columns = self.database.get_pk_column_ids(table_id);
                entity
                    .columns(prefix)
                    .into_iter()
                    .filter(|(_, column_id)| pk_columns.contains(column_id))
                    .collect()
            }
            ConvertFlags::Field | ConvertFlags::All => entity.columns(prefix),
        };

        let prefix_len = prefix.map(|prefix| prefix.len() + 1).unwrap_or(0);

        Ok(columns
            .into_iter()
            .map(|(name, column_id)| {
                (
                    Some(name[prefix_len..].to_string()),
                    SqlExpression::physical(column_id, Some(alias.to_string())),
                )
            })
            .collect())
    }
}

/// The member names constructed at `steps` inside a projection body
fn projected_members(body: &Expr, steps: &[String]) -> Vec<String> {
    let mut current = body.strip_convert();
    for step in steps {
        let Expr::New(bindings) = current else {
            return vec![];
        };
        match bindings.iter().find(|binding| &binding.member == step) {
            Some(binding) => current = binding.value.strip_convert(),
            None => return vec![],
        }
    }

    match current {
        Expr::New(bindings) => bindings
            .iter()
            .map(|binding| binding.member.clone())
            .collect(),
        _ => vec![],
    }
}
