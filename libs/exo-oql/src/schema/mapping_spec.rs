// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    Database, PhysicalTable, TableId,
    compile_error::SchemaError,
    mapping::{AssociationMapping, EntityMapping, Mapping, MemberMapping},
};

use super::{
    entity_spec::{EntitySpec, MemberSpec},
    table_spec::TableSpec,
};

pub struct MappingSpec {
    tables: Vec<TableSpec>,
    entities: Vec<EntitySpec>,
}

impl MappingSpec {
    pub fn new(tables: Vec<TableSpec>, entities: Vec<EntitySpec>) -> Self {
        Self { tables, entities }
    }

    pub fn to_schema(self) -> Result<(Database, Mapping), SchemaError> {
        let mut database = Database::default();

        // Step 1: Create tables (with their columns)
        for table in self.tables {
            let table_id = database.insert_table(PhysicalTable {
                name: table.name,
                columns: vec![],
            });
            let columns = table
                .columns
                .into_iter()
                .map(|column_spec| column_spec.to_column(table_id))
                .collect();
            database.get_table_mut(table_id).columns = columns;
        }

        // Step 2: Bind entities to tables (associations refer to other entities' tables)
        let mut entity_tables: HashMap<&str, TableId> = HashMap::new();
        for entity in self.entities.iter() {
            let table_id = database
                .get_table_id(&entity.table)
                .ok_or_else(|| SchemaError::UnknownTable(entity.table.clone()))?;
            if entity_tables.insert(&entity.name, table_id).is_some() {
                return Err(SchemaError::DuplicateEntity(entity.name.clone()));
            }
        }

        // Step 3: Resolve members
        let entities = self
            .entities
            .iter()
            .map(|entity| {
                let table_id = entity_tables[entity.name.as_str()];

                let members = entity
                    .members
                    .iter()
                    .map(|(name, spec)| {
                        let member = match spec {
                            MemberSpec::Column(column) => {
                                MemberMapping::Column(column_id(&database, table_id, column)?)
                            }
                            MemberSpec::Computed(lambda) => MemberMapping::Computed(lambda.clone()),
                            MemberSpec::Association {
                                target_entity,
                                self_column,
                                foreign_column,
                                optional,
                            } => {
                                let target_table_id = *entity_tables
                                    .get(target_entity.as_str())
                                    .ok_or_else(|| {
                                        SchemaError::UnknownEntity(target_entity.clone())
                                    })?;

                                MemberMapping::Association(AssociationMapping {
                                    target_entity: target_entity.clone(),
                                    self_column: column_id(&database, table_id, self_column)?,
                                    foreign_column: column_id(
                                        &database,
                                        target_table_id,
                                        foreign_column,
                                    )?,
                                    optional: *optional,
                                })
                            }
                        };
                        Ok((name.clone(), member))
                    })
                    .collect::<Result<IndexMap<_, _>, SchemaError>>()?;

                Ok(EntityMapping {
                    name: entity.name.clone(),
                    table_id,
                    members,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok((database, Mapping::new(entities)))
    }
}

fn column_id(
    database: &Database,
    table_id: TableId,
    column: &str,
) -> Result<crate::ColumnId, SchemaError> {
    database
        .get_column_id(table_id, column)
        .ok_or_else(|| SchemaError::UnknownColumn {
            table: database.get_table(table_id).name.clone(),
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::{
        mapping::MappingSchema,
        schema::test_helper::{pk_column, reference_column, string_column},
    };

    use super::*;

    fn tables() -> Vec<TableSpec> {
        vec![
            TableSpec::new(
                "concerts",
                vec![
                    pk_column("id"),
                    string_column("title"),
                    reference_column("venue_id"),
                ],
            ),
            TableSpec::new("venues", vec![pk_column("id"), string_column("name")]),
        ]
    }

    #[test]
    fn members_keep_declaration_order() {
        let (database, mapping) = MappingSpec::new(
            tables(),
            vec![
                EntitySpec::new("Concert", "concerts")
                    .column("title", "title")
                    .column("id", "id")
                    .association("venue", "Venue", "venue_id", "id", false),
                EntitySpec::new("Venue", "venues").column("id", "id"),
            ],
        )
        .to_schema()
        .unwrap();

        let concert = mapping.entity("Concert").unwrap();
        assert_eq!(
            concert.members.keys().collect::<Vec<_>>(),
            vec!["title", "id", "venue"]
        );

        let venues_table = database.get_table_id("venues").unwrap();
        match concert.member("venue") {
            Some(MemberMapping::Association(association)) => {
                assert_eq!(association.foreign_column.table_id, venues_table);
                assert_eq!(database.get_column(association.self_column).name, "venue_id");
                assert!(!association.optional);
            }
            other => panic!("Expected an association, got {other:?}"),
        }
    }

    #[test]
    fn unknown_references() {
        let unknown_table =
            MappingSpec::new(tables(), vec![EntitySpec::new("Artist", "artists")]).to_schema();
        assert_eq!(
            unknown_table.unwrap_err(),
            SchemaError::UnknownTable("artists".to_string())
        );

        let unknown_column = MappingSpec::new(
            tables(),
            vec![EntitySpec::new("Concert", "concerts").column("price", "price")],
        )
        .to_schema();
        assert_eq!(
            unknown_column.unwrap_err(),
            SchemaError::UnknownColumn {
                table: "concerts".to_string(),
                column: "price".to_string()
            }
        );

        let unknown_entity = MappingSpec::new(
            tables(),
            vec![EntitySpec::new("Concert", "concerts").association(
                "venue", "Venue", "venue_id", "id", false,
            )],
        )
        .to_schema();
        assert_eq!(
            unknown_entity.unwrap_err(),
            SchemaError::UnknownEntity("Venue".to_string())
        );
    }
}
