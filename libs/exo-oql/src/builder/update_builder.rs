// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The `Update` and `Set` operators.
//!
//! An update binds a target table and accumulates `column = value` items in the model of the
//! sequence being updated:
//!
//! - `update()`: the target is inferred from the source (an association projection targets the
//!   associated table) and the items come from earlier `Set` operators
//! - `update(|row| Entity { .. })`: a construction expression is flattened into one item per
//!   assigned column
//! - `update(|row| predicate, |row| Entity { .. })`: filters first
//! - `update(target, |row| Target { .. })`: rows of the source drive assignments to another table
//! - `set(|row| row.column, value)`: appends a single item

use tracing::debug;

use crate::{
    ColumnId, TableId,
    compile_error::CompileError,
    context::{
        BuildContext, ContextId, UpdateTerminalContext,
        capability::{ConvertFlags, RequestFor},
    },
    expr::{
        expression::{Expr, Lambda, MemberBinding},
        operator::{Argument, OperatorKind, OperatorNode},
    },
    mapping::MemberMapping,
    path::{member_path::MemberPath, resolver::MemberClass},
    sql::{
        query_model::{ModelId, QueryType},
        update::SetItem,
    },
};

use super::{
    BuildInfo, SequenceBuilder, query_builder::QueryBuilder, required_sequence,
    where_builder::build_where,
};

pub struct UpdateBuilder {}

impl SequenceBuilder for UpdateBuilder {
    fn id(&self) -> &'static str {
        "update"
    }

    fn can_build(&self, node: &OperatorNode) -> bool {
        node.kind == OperatorKind::Update
            && node.primary_source().is_some()
            && matches!(
                node.operands(),
                []
                    | [Argument::Lambda(_)]
                    | [Argument::Lambda(_), Argument::Lambda(_)]
                    | [Argument::Sequence(_), Argument::Lambda(_)]
            )
    }

    fn build(
        &self,
        builder: &mut QueryBuilder<'_>,
        node: &OperatorNode,
        sequence: Option<ContextId>,
        info: &BuildInfo,
    ) -> Result<ContextId, CompileError> {
        let sequence = required_sequence(node, sequence)?;
        builder.ensure_composable(sequence, "an update")?;

        let model = builder.context(sequence).model();

        match node.operands() {
            [] => {
                if let Some((_, table_id)) = check_association(builder, sequence)? {
                    bind_target(builder, model, table_id)?;
                }
            }
            [Argument::Lambda(setter)] => {
                update_with_setter(builder, model, sequence, setter, info)?;
            }
            [Argument::Lambda(predicate), Argument::Lambda(setter)] => {
                build_where(builder, sequence, predicate, info)?;
                update_with_setter(builder, model, sequence, setter, info)?;
            }
            [Argument::Sequence(target), Argument::Lambda(setter)] => {
                update_into(builder, model, sequence, target, setter, info)?;
            }
            _ => {
                return Err(CompileError::UnsupportedShape(
                    "unrecognized update arguments".to_string(),
                ));
            }
        }

        complete_update(builder, model)?;

        Ok(builder.add_context(BuildContext::UpdateTerminal(UpdateTerminalContext {
            parent: info.parent,
            model,
            sequence,
        })))
    }
}

/// The table an update over `sequence` applies to: the associated table if the sequence
/// (possibly through scalar projections) denotes an association, else its table, if any
fn check_association(
    builder: &mut QueryBuilder<'_>,
    sequence: ContextId,
) -> Result<Option<(ContextId, TableId)>, CompileError> {
    let association = builder.is_expression(sequence, &[], RequestFor::Association)?;

    let context = if association.result {
        association.context
    } else {
        let table = builder.is_expression(sequence, &[], RequestFor::Table)?;
        if table.result { table.context } else { None }
    };

    Ok(context.and_then(|context| {
        builder
            .context(context)
            .table_source()
            .map(|(_, table_id, _)| (context, table_id))
    }))
}

fn update_with_setter(
    builder: &mut QueryBuilder<'_>,
    model: ModelId,
    sequence: ContextId,
    setter: &Lambda,
    info: &BuildInfo,
) -> Result<(), CompileError> {
    let items = match check_association(builder, sequence)? {
        Some((target, table_id)) => {
            bind_target(builder, model, table_id)?;
            build_setter(builder, setter, target, Some(table_id), sequence, info)?
        }
        None => {
            // Assigned members resolve through the sequence itself (a constructed projection) and
            // the items name the target
            let items = build_setter(builder, setter, sequence, None, sequence, info)?;
            for item in items.iter() {
                bind_target(builder, model, item.column.table_id)?;
            }
            items
        }
    };
    builder.models[model].update.items.extend(items);

    Ok(())
}

/// Rows of `sequence` drive assignments to the rows of `target`
fn update_into(
    builder: &mut QueryBuilder<'_>,
    model: ModelId,
    sequence: ContextId,
    target: &OperatorNode,
    setter: &Lambda,
    info: &BuildInfo,
) -> Result<(), CompileError> {
    let into = builder.build_sequence(target, info)?;
    let into_table = match builder.context(into) {
        BuildContext::Table(table) => table.table_id,
        other => {
            return Err(CompileError::UnsupportedShape(format!(
                "the target of an update must be a table, not a {} context",
                other.kind_name()
            )));
        }
    };

    builder.convert_to_index(sequence, &[], ConvertFlags::All)?;

    let source_model = &mut builder.models[model];
    source_model.from.resolve_weak_joins();
    source_model.select.clear();

    let items = build_setter(builder, setter, into, Some(into_table), sequence, info)?;

    let source_model = &mut builder.models[model];
    // Joins introduced by the setter's values
    source_model.from.resolve_weak_joins();
    source_model.select.clear();
    for item in items.iter() {
        source_model.select.push(item.value.clone());
    }

    bind_target(builder, model, into_table)?;
    builder.models[model].update.items.extend(items);

    Ok(())
}

/// Flatten `setter` into set items. Left-hand members resolve against `into` and, when `table` is
/// given, must be columns of that table; values compile with the setter's parameter ranging over
/// `sequence`.
fn build_setter(
    builder: &mut QueryBuilder<'_>,
    setter: &Lambda,
    into: ContextId,
    table: Option<TableId>,
    sequence: ContextId,
    info: &BuildInfo,
) -> Result<Vec<SetItem>, CompileError> {
    let scope = builder.lambda_scope(setter, sequence, info.parent)?;
    let mut items = vec![];

    match setter.body.strip_convert() {
        Expr::New(bindings) => {
            let into = SetterTarget { context: into, table };
            flatten_bindings(builder, &into, scope, &[], bindings, 1, &mut items)?;
        }
        body => {
            // Assign each member of the referenced object by name
            for info in builder.convert_expr_to_sql(scope, body, ConvertFlags::All)? {
                let member = info.member.ok_or_else(|| {
                    CompileError::UnsupportedShape(
                        "a setter must construct an object or refer to one".to_string(),
                    )
                })?;
                let steps: Vec<String> = member.split('.').map(str::to_string).collect();
                let column = settable_column(builder, into, &steps, table)?;
                items.push(SetItem {
                    column,
                    value: info.sql,
                });
            }
        }
    }

    Ok(items)
}

/// Where left-hand members of a setter resolve
struct SetterTarget {
    context: ContextId,
    table: Option<TableId>,
}

fn flatten_bindings(
    builder: &mut QueryBuilder<'_>,
    into: &SetterTarget,
    scope: ContextId,
    prefix: &[String],
    bindings: &[MemberBinding],
    depth: usize,
    items: &mut Vec<SetItem>,
) -> Result<(), CompileError> {
    if depth > builder.config.max_setter_depth {
        return Err(CompileError::SetterTooDeep(builder.config.max_setter_depth));
    }

    for binding in bindings {
        let mut steps = prefix.to_vec();
        steps.push(binding.member.clone());

        let value = binding.value.strip_convert();

        // A nested construction assigns the members of a complex member (`location.city`)
        if let Expr::New(nested) = value {
            if !builder
                .is_expression(into.context, &steps, RequestFor::Field)?
                .result
            {
                flatten_bindings(builder, into, scope, &steps, nested, depth + 1, items)?;
                continue;
            }
        }

        let column = settable_column(builder, into.context, &steps, into.table)?;
        let value = builder.convert_to_sql_expression(scope, value)?;
        items.push(SetItem { column, value });
    }

    Ok(())
}

/// The column `steps` denotes in `context`, which must be a plain column (of `table`, if given)
fn settable_column(
    builder: &mut QueryBuilder<'_>,
    context: ContextId,
    steps: &[String],
    table: Option<TableId>,
) -> Result<ColumnId, CompileError> {
    let not_settable = || CompileError::NotSettableColumn(steps.join("."));

    let column = match builder.classify(context, steps) {
        Ok(MemberClass::Field(sql)) => sql.column_id().ok_or_else(not_settable)?,
        Ok(_) | Err(CompileError::MemberResolution { .. }) => return Err(not_settable()),
        Err(error) => return Err(error),
    };

    match table {
        Some(table) if column.table_id != table => Err(not_settable()),
        _ => Ok(column),
    }
}

fn bind_target(
    builder: &mut QueryBuilder<'_>,
    model: ModelId,
    table_id: TableId,
) -> Result<(), CompileError> {
    let database = builder.database;
    builder.models[model].update.set_target(table_id, database)
}

/// Check that every item belongs to the target and turn the model into an update statement. Items
/// added by `Set` have already bound the target to their table.
fn complete_update(builder: &mut QueryBuilder<'_>, model: ModelId) -> Result<(), CompileError> {
    let database = builder.database;
    let model = &mut builder.models[model];

    if let Some(target) = model.update.target {
        if let Some(foreign) = model
            .update
            .items
            .iter()
            .find(|item| item.column.table_id != target)
        {
            return Err(CompileError::NotSettableColumn(
                foreign.column.qualified_name(database),
            ));
        }
    }

    debug!("Update compiled with {} item(s)", model.update.items.len());

    model.query_type = QueryType::Update;
    Ok(())
}

/// Compiles `Set(source, |row| row.member, value)`, appending one item to the source's update.
pub struct SetBuilder {}

impl SequenceBuilder for SetBuilder {
    fn id(&self) -> &'static str {
        "set"
    }

    fn can_build(&self, node: &OperatorNode) -> bool {
        node.kind == OperatorKind::Set
            && node.primary_source().is_some()
            && matches!(
                node.operands(),
                [Argument::Lambda(_), Argument::Value(_)]
                    | [Argument::Lambda(_), Argument::Lambda(_)]
            )
    }

    fn build(
        &self,
        builder: &mut QueryBuilder<'_>,
        node: &OperatorNode,
        sequence: Option<ContextId>,
        info: &BuildInfo,
    ) -> Result<ContextId, CompileError> {
        let sequence = required_sequence(node, sequence)?;
        builder.ensure_composable(sequence, "a set")?;

        let [Argument::Lambda(extract), value] = node.operands() else {
            return Err(CompileError::UnsupportedShape(
                "a set takes a member selector and a value".to_string(),
            ));
        };

        let parameter = extract.parameter().ok_or_else(|| {
            CompileError::MalformedSetterPath("a member selector without a parameter".to_string())
        })?;
        let path = MemberPath::from_expr(&extract.body)
            .filter(|path| path.root == parameter && !path.is_root())
            .ok_or_else(|| {
                CompileError::MalformedSetterPath(format!(
                    "expected a member of '{parameter}', found {:?}",
                    extract.body
                ))
            })?;

        let model = builder.context(sequence).model();

        let (column, value) = match value {
            Argument::Lambda(value) => {
                let column = match builder.models[model].update.target {
                    Some(target) => target_column(builder, target, &path.qualified_name())?,
                    None => settable_column(builder, sequence, &path.steps, None)?,
                };

                let scope = builder.lambda_scope(value, sequence, info.parent)?;
                let value = builder.with_reparented(sequence, Some(scope), |builder| {
                    builder.convert_to_sql_expression(scope, &value.body)
                })?;
                (column, value)
            }
            Argument::Value(value) => {
                let column = settable_column(builder, sequence, &path.steps, None)?;
                let scope = builder.lambda_scope(extract, sequence, info.parent)?;
                let value = builder.convert_to_sql_expression(scope, value)?;
                (column, value)
            }
            _ => {
                return Err(CompileError::UnsupportedShape(
                    "a set value must be an expression or a lambda".to_string(),
                ));
            }
        };

        bind_target(builder, model, column.table_id)?;
        builder.models[model].update.add_item(column, value);

        Ok(sequence)
    }
}

/// Look up a member of the target table's entity by its qualified name
fn target_column(
    builder: &QueryBuilder<'_>,
    target: TableId,
    qualified_name: &str,
) -> Result<ColumnId, CompileError> {
    match builder.entity_for_table(target)?.member(qualified_name) {
        Some(MemberMapping::Column(column_id)) => Ok(*column_id),
        _ => Err(CompileError::NotSettableColumn(qualified_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::{
        Database,
        builder::builder_registry::BuilderRegistry,
        config::CompilerConfig,
        expr::expression::BinaryOperator,
        mapping::Mapping,
        sql::{
            expression::{SqlExpression, SqlParam, SqlValue},
            query_model::SqlQueryModel,
        },
        test_util::TestSetup,
    };

    use super::*;

    fn compile(
        builder: &mut QueryBuilder<'_>,
        node: &OperatorNode,
    ) -> Result<(ContextId, ModelId), CompileError> {
        let context = builder.build_root(node)?;
        Ok((context, builder.context(context).model()))
    }

    fn items(model: &SqlQueryModel) -> Vec<(ColumnId, SqlExpression)> {
        model
            .update
            .items
            .iter()
            .map(|item| (item.column, item.value.clone()))
            .collect()
    }

    fn value(value: impl Into<SqlValue>) -> SqlExpression {
        SqlExpression::Value(value.into())
    }

    fn concert(body: Expr) -> Lambda {
        Lambda::new("c", body)
    }

    fn builder<'a>(database: &'a Database, mapping: &'a Mapping) -> QueryBuilder<'a> {
        QueryBuilder::for_test(database, mapping)
    }

    #[test]
    fn whole_object_setter() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 concerts_table,
                 concerts_title_column,
                 concerts_price_column,
                 concerts_sold_out_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let node = OperatorNode::source("Concert").update_with(concert(Expr::new_object(
                    vec![
                        ("title", Expr::external("title")),
                        (
                            "price",
                            Expr::binary(
                                BinaryOperator::Multiply,
                                Expr::param("c").member("price"),
                                Expr::constant(2),
                            ),
                        ),
                        ("sold_out", Expr::constant(false)),
                    ],
                )));

                let (context, model) = compile(&mut builder, &node).unwrap();
                let model = &builder.models[model];

                assert!(matches!(
                    builder.context(context),
                    BuildContext::UpdateTerminal(_)
                ));
                assert_eq!(model.query_type, QueryType::Update);
                assert_eq!(model.update.target, Some(concerts_table));
                assert_eq!(
                    items(model),
                    vec![
                        (
                            concerts_title_column,
                            SqlExpression::Param(SqlParam::external("title"))
                        ),
                        (
                            concerts_price_column,
                            SqlExpression::Arithmetic {
                                operator: crate::sql::expression::ArithmeticOperator::Multiply,
                                lhs: Box::new(SqlExpression::physical(
                                    concerts_price_column,
                                    Some("t1".to_string())
                                )),
                                rhs: Box::new(value(2)),
                            }
                        ),
                        (concerts_sold_out_column, value(false)),
                    ]
                );
            },
        )
    }

    #[test]
    fn predicate_and_setter() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 concerts_title_column,
                 concerts_sold_out_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let node = OperatorNode::source("Concert").update_where(
                    concert(Expr::param("c").member("sold_out")),
                    concert(Expr::new_object(vec![("title", Expr::constant("Sold out"))])),
                );

                let (_, model) = compile(&mut builder, &node).unwrap();
                let model = &builder.models[model];

                assert_eq!(
                    model.where_clause,
                    crate::sql::predicate::Predicate::Eq(
                        SqlExpression::physical(concerts_sold_out_column, Some("t1".to_string())),
                        value(true)
                    )
                );
                assert_eq!(
                    items(model),
                    vec![(concerts_title_column, value("Sold out"))]
                );
            },
        )
    }

    #[test]
    fn setter_referring_to_a_row() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 venues_table,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                // Every column of the venue assigned from itself
                let node = OperatorNode::source("Venue")
                    .update_with(Lambda::new("v", Expr::param("v")));

                let (_, model) = compile(&mut builder, &node).unwrap();
                let model = &builder.models[model];

                assert_eq!(model.update.target, Some(venues_table));
                assert_eq!(model.update.items.len(), 4);
                assert!(
                    model
                        .update
                        .items
                        .iter()
                        .all(|item| item.value.column_id() == Some(item.column))
                );
            },
        )
    }

    #[test]
    fn incremental_sets() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 concerts_table,
                 concerts_title_column,
                 concerts_price_column,
                 concerts_sold_out_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let two_sets = OperatorNode::source("Concert")
                    .set(concert(Expr::param("c").member("title")), Expr::constant("v1"))
                    .set_with(
                        concert(Expr::param("c").member("price")),
                        Lambda::new("x", Expr::param("x").member("price")),
                    );

                let (_, model) = compile(&mut builder, &two_sets.clone().update()).unwrap();
                let model = &builder.models[model];

                assert_eq!(model.update.target, Some(concerts_table));
                assert_eq!(
                    items(model),
                    vec![
                        (concerts_title_column, value("v1")),
                        (
                            concerts_price_column,
                            SqlExpression::physical(concerts_price_column, Some("t1".to_string()))
                        ),
                    ]
                );

                let mut builder = QueryBuilder::for_test(&database, &mapping);
                let three_sets = two_sets
                    .set(
                        concert(Expr::param("c").member("sold_out").convert()),
                        Expr::constant(true),
                    )
                    .update();
                let (_, model) = compile(&mut builder, &three_sets).unwrap();

                assert_eq!(
                    items(&builder.models[model])
                        .into_iter()
                        .map(|(column, _)| column)
                        .collect::<Vec<_>>(),
                    vec![
                        concerts_title_column,
                        concerts_price_column,
                        concerts_sold_out_column
                    ]
                );
            },
        )
    }

    #[test]
    fn target_inference() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 concerts_table,
                 venues_table,
                 ..
             }| {
                let target = |node: OperatorNode| {
                    let mut builder = QueryBuilder::for_test(&database, &mapping);
                    let (_, model) = compile(&mut builder, &node.update()).unwrap();
                    builder.models[model].update.target
                };

                assert_eq!(target(OperatorNode::source("Concert")), Some(concerts_table));
                assert_eq!(
                    target(OperatorNode::source("Concert").select(concert(Expr::param("c")))),
                    Some(concerts_table)
                );
                assert_eq!(
                    target(
                        OperatorNode::source("Concert")
                            .select(concert(Expr::param("c")))
                            .select(concert(Expr::param("c").member("venue")))
                    ),
                    Some(venues_table)
                );
                assert_eq!(
                    target(OperatorNode::source("Concert").select(concert(Expr::new_object(
                        vec![("title", Expr::param("c").member("title"))]
                    )))),
                    None
                );
            },
        )
    }

    #[test]
    fn association_setter() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 venues_table,
                 venues_name_column,
                 concerts_title_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let node = OperatorNode::source("Concert")
                    .select(concert(Expr::param("c").member("venue")))
                    .update_with(Lambda::new(
                        "v",
                        Expr::new_object(vec![(
                            "name",
                            Expr::param("v").member("name"),
                        )]),
                    ));

                let (_, model) = compile(&mut builder, &node).unwrap();
                let model = &builder.models[model];

                assert_eq!(model.update.target, Some(venues_table));
                assert_eq!(
                    items(model),
                    vec![(
                        venues_name_column,
                        SqlExpression::physical(venues_name_column, Some("t2".to_string()))
                    )]
                );
                assert_ne!(venues_name_column, concerts_title_column);
            },
        )
    }

    #[test]
    fn nested_construction() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 venues_city_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let node = OperatorNode::source("Venue").update_with(Lambda::new(
                    "v",
                    Expr::new_object(vec![(
                        "location",
                        Expr::new_object(vec![("city", Expr::constant("Paris"))]),
                    )]),
                ));

                let (_, model) = compile(&mut builder, &node).unwrap();

                assert_eq!(
                    items(&builder.models[model]),
                    vec![(venues_city_column, value("Paris"))]
                );
            },
        )
    }

    #[test]
    fn setter_depth_is_limited() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let mut builder = QueryBuilder::new(
                &database,
                &mapping,
                BuilderRegistry::default(),
                CompilerConfig {
                    max_setter_depth: 1,
                    ..CompilerConfig::default()
                },
            );
            let node = OperatorNode::source("Venue").update_with(Lambda::new(
                "v",
                Expr::new_object(vec![(
                    "location",
                    Expr::new_object(vec![("city", Expr::constant("Paris"))]),
                )]),
            ));

            assert_eq!(
                compile(&mut builder, &node),
                Err(CompileError::SetterTooDeep(1))
            );
        })
    }

    #[test]
    fn retarget() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 venues_table,
                 venues_name_column,
                 venues_city_column,
                 concerts_title_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                // Three columns projected, two assigned
                let source = OperatorNode::source("Concert").select(concert(Expr::new_object(
                    vec![
                        ("title", Expr::param("c").member("title")),
                        ("price", Expr::param("c").member("price")),
                        ("venue", Expr::param("c").member("venue").member("name")),
                    ],
                )));
                let node = source.update_into(
                    OperatorNode::source("Venue"),
                    Lambda::new(
                        "r",
                        Expr::new_object(vec![
                            ("name", Expr::param("r").member("title")),
                            (
                                "location",
                                Expr::new_object(vec![("city", Expr::param("r").member("venue"))]),
                            ),
                        ]),
                    ),
                );

                let (_, model) = compile(&mut builder, &node).unwrap();
                let model = &builder.models[model];

                assert_eq!(model.query_type, QueryType::Update);
                assert_eq!(model.update.target, Some(venues_table));
                assert_eq!(
                    model
                        .update
                        .items
                        .iter()
                        .map(|item| item.column)
                        .collect::<Vec<_>>(),
                    vec![venues_name_column, venues_city_column]
                );

                assert_eq!(model.select.len(), 2);
                assert_eq!(
                    model.select.columns[0],
                    SqlExpression::physical(concerts_title_column, Some("t1".to_string()))
                );

                assert_eq!(model.from.joins.len(), 1);
                assert!(!model.from.has_weak_joins());
            },
        )
    }

    #[test]
    fn retarget_conflicts_with_earlier_sets() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let mut builder = builder(&database, &mapping);
            let node = OperatorNode::source("Concert")
                .set(concert(Expr::param("c").member("title")), Expr::constant("x"))
                .update_into(
                    OperatorNode::source("Venue"),
                    Lambda::new(
                        "r",
                        Expr::new_object(vec![("name", Expr::param("r").member("title"))]),
                    ),
                );

            assert_eq!(
                compile(&mut builder, &node),
                Err(CompileError::AmbiguousTarget {
                    first: "concerts".to_string(),
                    second: "venues".to_string()
                })
            );
        })
    }

    #[test]
    fn setter_over_a_constructed_projection() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 concerts_table,
                 concerts_title_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let node = OperatorNode::source("Concert")
                    .select(concert(Expr::new_object(vec![
                        ("title", Expr::param("c").member("title")),
                        ("price", Expr::param("c").member("price")),
                    ])))
                    .update_with(Lambda::new(
                        "r",
                        Expr::new_object(vec![("title", Expr::constant("x"))]),
                    ));

                let (_, model) = compile(&mut builder, &node).unwrap();
                let model = &builder.models[model];

                assert_eq!(model.query_type, QueryType::Update);
                assert_eq!(model.update.target, Some(concerts_table));
                assert_eq!(items(model), vec![(concerts_title_column, value("x"))]);

                // Members of different tables cannot be updated together
                let mut builder = QueryBuilder::for_test(&database, &mapping);
                let node = OperatorNode::source("Concert")
                    .select(concert(Expr::new_object(vec![
                        ("title", Expr::param("c").member("title")),
                        ("venue", Expr::param("c").member("venue").member("name")),
                    ])))
                    .update_with(Lambda::new(
                        "r",
                        Expr::new_object(vec![
                            ("title", Expr::constant("x")),
                            ("venue", Expr::constant("y")),
                        ]),
                    ));

                assert_eq!(
                    compile(&mut builder, &node),
                    Err(CompileError::AmbiguousTarget {
                        first: "concerts".to_string(),
                        second: "venues".to_string()
                    })
                );
            },
        )
    }

    #[test]
    fn retarget_requires_a_table() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let mut builder = builder(&database, &mapping);
            let node = OperatorNode::source("Concert").update_into(
                OperatorNode::source("Venue").select(Lambda::new("v", Expr::param("v"))),
                Lambda::new("r", Expr::new_object(vec![("name", Expr::Null)])),
            );

            assert!(matches!(
                compile(&mut builder, &node),
                Err(CompileError::UnsupportedShape(_))
            ));
        })
    }

    #[test]
    fn malformed_setter_leaves_items_unchanged() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let mut builder = builder(&database, &mapping);
            let source = OperatorNode::source("Concert")
                .set(concert(Expr::param("c").member("title")), Expr::constant("x"));
            let (sequence, model) = compile(&mut builder, &source).unwrap();

            for extract in [
                concert(Expr::external("other").member("title")),
                concert(Expr::param("c")),
                Lambda::new("c", Expr::param("d").member("title")),
                Lambda {
                    parameters: vec![],
                    body: Expr::param("c").member("title"),
                },
            ] {
                let node = source.clone().set(extract, Expr::constant("y"));
                let result = SetBuilder {}.build(
                    &mut builder,
                    &node,
                    Some(sequence),
                    &BuildInfo::default(),
                );

                assert!(matches!(result, Err(CompileError::MalformedSetterPath(_))));
                assert_eq!(builder.models[model].update.items.len(), 1);
            }
        })
    }

    #[test]
    fn not_settable() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let error = |node: OperatorNode| {
                let mut builder = QueryBuilder::for_test(&database, &mapping);
                compile(&mut builder, &node).unwrap_err()
            };

            assert_eq!(
                error(
                    OperatorNode::source("Concert")
                        .set(concert(Expr::param("c").member("venue")), Expr::Null)
                ),
                CompileError::NotSettableColumn("venue".to_string())
            );
            assert_eq!(
                error(OperatorNode::source("Venue").update_with(Lambda::new(
                    "v",
                    Expr::new_object(vec![("display_name", Expr::constant("x"))])
                ))),
                CompileError::NotSettableColumn("display_name".to_string())
            );
            assert_eq!(
                error(OperatorNode::source("Venue").update_with(Lambda::new(
                    "v",
                    Expr::new_object(vec![("capacity", Expr::constant(1))])
                ))),
                CompileError::NotSettableColumn("capacity".to_string())
            );
            // A column reached through an association belongs to another table
            assert_eq!(
                error(OperatorNode::source("Concert").update_with(concert(Expr::new_object(
                    vec![(
                        "venue",
                        Expr::new_object(vec![("name", Expr::constant("x"))])
                    )]
                )))),
                CompileError::NotSettableColumn("venue.name".to_string())
            );
        })
    }

    #[test]
    fn set_by_name_once_the_target_is_known() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 venues_city_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let node = OperatorNode::source("Venue")
                    .set(Lambda::new("v", Expr::param("v").member("name")), Expr::constant("x"))
                    .set_with(
                        Lambda::new("v", Expr::param("v").member("location").member("city")),
                        Lambda::new("v", Expr::constant("Paris")),
                    )
                    .update();

                let (_, model) = compile(&mut builder, &node).unwrap();
                assert_eq!(
                    items(&builder.models[model])[1],
                    (venues_city_column, value("Paris"))
                );

                let mut builder = QueryBuilder::for_test(&database, &mapping);
                let node = OperatorNode::source("Venue")
                    .set(Lambda::new("v", Expr::param("v").member("name")), Expr::constant("x"))
                    .set_with(
                        Lambda::new("v", Expr::param("v").member("display_name")),
                        Lambda::new("v", Expr::constant("Paris")),
                    );
                assert_eq!(
                    compile(&mut builder, &node),
                    Err(CompileError::NotSettableColumn("display_name".to_string()))
                );
            },
        )
    }

    #[test]
    fn conflicting_targets() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let mut builder = builder(&database, &mapping);
            let node = OperatorNode::source("Concert")
                .set(concert(Expr::param("c").member("title")), Expr::constant("x"))
                .select(concert(Expr::param("c").member("venue")))
                .update();

            assert_eq!(
                compile(&mut builder, &node),
                Err(CompileError::AmbiguousTarget {
                    first: "concerts".to_string(),
                    second: "venues".to_string()
                })
            );
        })
    }

    #[test]
    fn nothing_composes_over_an_update() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let update = OperatorNode::source("Concert")
                .set(concert(Expr::param("c").member("title")), Expr::constant("x"))
                .update();

            for node in [
                update.clone().filter(concert(Expr::constant(true))),
                update.clone().select(concert(Expr::param("c"))),
                update.clone().update(),
                update
                    .clone()
                    .set(concert(Expr::param("c").member("title")), Expr::Null),
            ] {
                let mut builder = QueryBuilder::for_test(&database, &mapping);
                assert!(matches!(
                    compile(&mut builder, &node),
                    Err(CompileError::UnsupportedShape(_))
                ));
            }
        })
    }

    #[test]
    fn set_value_reparents_temporarily() {
        TestSetup::with_setup(|TestSetup { database, mapping, .. }| {
            let mut builder = builder(&database, &mapping);
            let (sequence, model) =
                compile(&mut builder, &OperatorNode::source("Concert")).unwrap();
            assert_eq!(builder.context(sequence).parent(), None);

            let set = |value: Expr| {
                OperatorNode::source("Concert").set_with(
                    concert(Expr::param("c").member("title")),
                    Lambda::new("x", value),
                )
            };

            let failing = set(Expr::param("x").member("subtitle"));
            let result =
                SetBuilder {}.build(&mut builder, &failing, Some(sequence), &BuildInfo::default());
            assert!(matches!(result, Err(CompileError::MemberResolution { .. })));
            assert_eq!(builder.context(sequence).parent(), None);
            assert!(builder.models[model].update.items.is_empty());

            let succeeding = set(Expr::param("x").member("title"));
            SetBuilder {}
                .build(&mut builder, &succeeding, Some(sequence), &BuildInfo::default())
                .unwrap();
            assert_eq!(builder.context(sequence).parent(), None);
            assert_eq!(builder.models[model].update.items.len(), 1);
        })
    }

    #[test]
    fn associations_reached_from_a_set_value_keep_the_owner_scope() {
        TestSetup::with_setup(
            |TestSetup {
                 database,
                 mapping,
                 venues_name_column,
                 venues_city_column,
                 ..
             }| {
                let mut builder = builder(&database, &mapping);
                let (sequence, _) =
                    compile(&mut builder, &OperatorNode::source("Concert")).unwrap();

                let node = OperatorNode::source("Concert").set_with(
                    concert(Expr::param("c").member("title")),
                    Lambda::new("x", Expr::param("x").member("venue").member("name")),
                );
                SetBuilder {}
                    .build(&mut builder, &node, Some(sequence), &BuildInfo::default())
                    .unwrap();

                let venue = builder
                    .context(sequence)
                    .associations()
                    .and_then(|associations| associations.get("venue").copied())
                    .unwrap();

                assert_eq!(builder.context(sequence).parent(), None);
                assert_eq!(builder.context(venue).parent(), Some(sequence));
                assert_eq!(builder.find_binding(venue, "x"), None);

                let scope = builder
                    .lambda_scope(&concert(Expr::Null), sequence, None)
                    .unwrap();
                let display_name = builder
                    .resolve_path(
                        scope,
                        &MemberPath::new(
                            "c",
                            vec!["venue".to_string(), "display_name".to_string()],
                        ),
                    )
                    .unwrap();

                assert_eq!(
                    display_name,
                    MemberClass::Expression(SqlExpression::Arithmetic {
                        operator: crate::sql::expression::ArithmeticOperator::Concat,
                        lhs: Box::new(SqlExpression::physical(
                            venues_name_column,
                            Some("t2".to_string())
                        )),
                        rhs: Box::new(SqlExpression::physical(
                            venues_city_column,
                            Some("t2".to_string())
                        )),
                    })
                );
            },
        )
    }
}
