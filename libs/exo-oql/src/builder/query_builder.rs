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
    Database, TableId,
    compile_error::{CompileError, WithContext},
    config::CompilerConfig,
    context::{BuildContext, ContextArena, ContextId, capability::ConvertFlags},
    expr::{
        expression::{AggregateFunction, BinaryOperator, Expr, Lambda},
        operator::OperatorNode,
    },
    mapping::{EntityMapping, MappingSchema},
    path::{member_path::MemberPath, resolver::MemberClass},
    sql::{
        expression::{ArithmeticOperator, SqlExpression, SqlParam, SqlValue},
        predicate::{ConcretePredicate, Predicate},
        query_model::{ModelArena, ModelId, SqlQueryModel},
    },
};

use super::{BuildInfo, builder_registry::BuilderRegistry};

/// The services builders share while compiling one operator tree: the context and model arenas,
/// alias and parameter numbering, and expression compilation.
pub struct QueryBuilder<'a> {
    pub database: &'a Database,
    mapping: &'a dyn MappingSchema,
    pub config: CompilerConfig,
    registry: BuilderRegistry<'a>,
    pub models: ModelArena,
    pub contexts: ContextArena,
    alias_counter: usize,
    param_counter: usize,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        database: &'a Database,
        mapping: &'a dyn MappingSchema,
        registry: BuilderRegistry<'a>,
        config: CompilerConfig,
    ) -> Self {
        Self {
            database,
            mapping,
            config,
            registry,
            models: ModelArena::new(),
            contexts: ContextArena::new(),
            alias_counter: 0,
            param_counter: 0,
        }
    }

    pub fn build_root(&mut self, node: &OperatorNode) -> Result<ContextId, CompileError> {
        self.build_sequence(node, &BuildInfo::default())
    }

    /// Compile `node`: pick its builder, compile its primary source, then let the builder compile
    /// the node itself over the source's context.
    pub fn build_sequence(
        &mut self,
        node: &OperatorNode,
        info: &BuildInfo,
    ) -> Result<ContextId, CompileError> {
        let builder = self.registry.find(node)?;

        let sequence = match node.primary_source() {
            Some(source) => Some(self.build_sequence(source, info)?),
            None => None,
        };

        builder.build(self, node, sequence, info)
    }

    pub fn context(&self, id: ContextId) -> &BuildContext {
        &self.contexts[id]
    }

    pub fn context_mut(&mut self, id: ContextId) -> &mut BuildContext {
        &mut self.contexts[id]
    }

    pub fn add_context(&mut self, context: BuildContext) -> ContextId {
        self.contexts.insert(context)
    }

    pub fn add_model(&mut self) -> ModelId {
        self.models.insert(SqlQueryModel::new())
    }

    pub fn entity(&self, name: &str) -> Result<&'a EntityMapping, CompileError> {
        let mapping = self.mapping;
        mapping
            .entity(name)
            .ok_or_else(|| CompileError::UnknownEntity(name.to_string()))
    }

    pub fn entity_for_table(&self, table_id: TableId) -> Result<&'a EntityMapping, CompileError> {
        let mapping = self.mapping;
        mapping.entity_for_table(table_id).ok_or_else(|| {
            CompileError::UnknownEntity(format!(
                "<entity for table {}>",
                self.database.get_table(table_id).name
            ))
        })
    }

    /// A table alias unique within this compilation (`t1`, `t2`, ...)
    pub fn next_alias(&mut self) -> String {
        self.alias_counter += 1;
        format!("t{}", self.alias_counter)
    }

    fn next_param_name(&mut self) -> String {
        self.param_counter += 1;
        format!("p{}", self.param_counter)
    }

    /// Fail unless read operators may be composed over `context_id`
    pub fn ensure_composable(
        &self,
        context_id: ContextId,
        operator: &str,
    ) -> Result<(), CompileError> {
        match self.context(context_id) {
            BuildContext::UpdateTerminal(_) => Err(CompileError::UnsupportedShape(format!(
                "cannot apply {operator} to an update statement"
            ))),
            _ => Ok(()),
        }
    }

    /// Run `f` with `context_id` temporarily placed under `parent`. The original parent link is
    /// restored whether or not `f` succeeds.
    pub fn with_reparented<T>(
        &mut self,
        context_id: ContextId,
        parent: Option<ContextId>,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        let original = self.context(context_id).parent();
        self.context_mut(context_id).set_parent(parent);

        let result = f(self);

        self.context_mut(context_id).set_parent(original);
        result
    }

    /// Compile a value expression in `scope`
    pub fn convert_to_sql_expression(
        &mut self,
        scope: ContextId,
        expr: &Expr,
    ) -> Result<SqlExpression, CompileError> {
        match expr {
            Expr::Constant(value) => {
                if self.config.parameterize_constants {
                    Ok(SqlExpression::Param(SqlParam {
                        name: self.next_param_name(),
                        value: Some(value.clone()),
                    }))
                } else {
                    Ok(SqlExpression::Value(value.clone()))
                }
            }
            Expr::External(name) => Ok(SqlExpression::Param(SqlParam::external(name.clone()))),
            Expr::Null => Ok(SqlExpression::Null),
            Expr::Convert(inner) => self.convert_to_sql_expression(scope, inner),
            Expr::Parameter(_) | Expr::Member { .. } => {
                let path = MemberPath::from_expr(expr).ok_or_else(|| {
                    CompileError::UnsupportedShape(format!(
                        "member access on something other than a lambda parameter: {expr:?}"
                    ))
                })?;

                match self.resolve_path(scope, &path)? {
                    MemberClass::Field(sql) | MemberClass::Expression(sql) => Ok(sql),
                    _ => Err(CompileError::MemberResolution {
                        path: path.to_string(),
                        reason: "refers to a row or an object, not a value".to_string(),
                    }),
                }
            }
            Expr::Binary { operator, lhs, rhs } => match arithmetic_operator(*operator) {
                Some(operator) => Ok(SqlExpression::Arithmetic {
                    operator,
                    lhs: Box::new(self.convert_to_sql_expression(scope, lhs)?),
                    rhs: Box::new(self.convert_to_sql_expression(scope, rhs)?),
                }),
                None => Ok(SqlExpression::Condition(Box::new(
                    self.convert_to_predicate(scope, expr)?,
                ))),
            },
            Expr::Not(_) => Ok(SqlExpression::Condition(Box::new(
                self.convert_to_predicate(scope, expr)?,
            ))),
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.convert_to_sql_expression(scope, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SqlExpression::Function {
                    name: function.clone(),
                    args,
                })
            }
            Expr::New(_) => Err(CompileError::UnsupportedShape(
                "object construction is only supported in projections and setters".to_string(),
            )),
            Expr::Aggregate {
                function,
                source,
                selector,
            } => self
                .build_aggregate(scope, *function, source, selector.as_deref())
                .with_context(format!("While compiling the {} sub-query", function.name())),
        }
    }

    /// Compile a boolean expression in `scope`
    pub fn convert_to_predicate(
        &mut self,
        scope: ContextId,
        expr: &Expr,
    ) -> Result<ConcretePredicate, CompileError> {
        match expr.strip_convert() {
            Expr::Binary { operator, lhs, rhs } => match operator {
                BinaryOperator::AndAlso => Ok(Predicate::and(
                    self.convert_to_predicate(scope, lhs)?,
                    self.convert_to_predicate(scope, rhs)?,
                )),
                BinaryOperator::OrElse => Ok(Predicate::or(
                    self.convert_to_predicate(scope, lhs)?,
                    self.convert_to_predicate(scope, rhs)?,
                )),
                BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual => {
                    let lhs = self.convert_to_sql_expression(scope, lhs)?;
                    let rhs = self.convert_to_sql_expression(scope, rhs)?;
                    Ok(comparison(*operator, lhs, rhs))
                }
                BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Concat => Err(CompileError::UnsupportedShape(format!(
                    "{operator:?} does not produce a condition"
                ))),
            },
            Expr::Not(inner) => Ok(!self.convert_to_predicate(scope, inner)?),
            Expr::Constant(SqlValue::Bool(value)) => Ok((*value).into()),
            expr => match self.convert_to_sql_expression(scope, expr)? {
                SqlExpression::Condition(predicate) => Ok(*predicate),
                // A boolean-valued member such as `c.sold_out`
                sql => Ok(Predicate::eq(sql, SqlExpression::Value(SqlValue::Bool(true)))),
            },
        }
    }

    /// Compile `source` into its own model (correlated through `scope`) selecting a single
    /// aggregate value
    fn build_aggregate(
        &mut self,
        scope: ContextId,
        function: AggregateFunction,
        source: &OperatorNode,
        selector: Option<&Lambda>,
    ) -> Result<SqlExpression, CompileError> {
        let info = BuildInfo {
            parent: Some(scope),
        };
        let sequence = self.build_sequence(source, &info)?;
        self.ensure_composable(sequence, function.name())?;

        let argument = match (selector, function) {
            (Some(selector), _) => {
                let selector_scope = self.lambda_scope(selector, sequence, Some(scope))?;
                self.convert_to_sql_expression(selector_scope, &selector.body)?
            }
            (None, AggregateFunction::Count) => SqlExpression::Star,
            (None, _) => {
                let infos = self.convert_to_sql(sequence, &[], ConvertFlags::Field)?;
                match infos.as_slice() {
                    [info] => info.sql.clone(),
                    _ => {
                        return Err(CompileError::UnsupportedShape(format!(
                            "{} over rows requires a selector",
                            function.name()
                        )));
                    }
                }
            }
        };

        let model_id = self.context(sequence).model();
        trace!("Aggregate {} selects from model {}", function.name(), model_id.arr_idx());

        let model = &mut self.models[model_id];
        model.select.clear();
        model.select.push(SqlExpression::Function {
            name: function.name().to_string(),
            args: vec![argument],
        });

        Ok(SqlExpression::SubQuery(model_id))
    }
}

#[cfg(test)]
impl<'a> QueryBuilder<'a> {
    pub fn for_test(database: &'a Database, mapping: &'a crate::mapping::Mapping) -> Self {
        Self::new(
            database,
            mapping,
            BuilderRegistry::default(),
            CompilerConfig::default(),
        )
    }
}

fn arithmetic_operator(operator: BinaryOperator) -> Option<ArithmeticOperator> {
    match operator {
        BinaryOperator::Add => Some(ArithmeticOperator::Add),
        BinaryOperator::Subtract => Some(ArithmeticOperator::Subtract),
        BinaryOperator::Multiply => Some(ArithmeticOperator::Multiply),
        BinaryOperator::Divide => Some(ArithmeticOperator::Divide),
        BinaryOperator::Concat => Some(ArithmeticOperator::Concat),
        _ => None,
    }
}

fn comparison(operator: BinaryOperator, lhs: SqlExpression, rhs: SqlExpression) -> ConcretePredicate {
    match (operator, lhs, rhs) {
        (BinaryOperator::Equal, lhs, SqlExpression::Null)
        | (BinaryOperator::Equal, SqlExpression::Null, lhs) => Predicate::IsNull(lhs),
        (BinaryOperator::NotEqual, lhs, SqlExpression::Null)
        | (BinaryOperator::NotEqual, SqlExpression::Null, lhs) => !Predicate::IsNull(lhs),
        (BinaryOperator::Equal, lhs, rhs) => Predicate::eq(lhs, rhs),
        (BinaryOperator::NotEqual, lhs, rhs) => Predicate::neq(lhs, rhs),
        (BinaryOperator::LessThan, lhs, rhs) => Predicate::Lt(lhs, rhs),
        (BinaryOperator::LessThanOrEqual, lhs, rhs) => Predicate::Lte(lhs, rhs),
        (BinaryOperator::GreaterThan, lhs, rhs) => Predicate::Gt(lhs, rhs),
        (_, lhs, rhs) => Predicate::Gte(lhs, rhs),
    }
}
