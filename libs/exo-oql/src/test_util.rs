// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

use crate::expr::expression::{BinaryOperator, Expr, Lambda};
use crate::mapping::Mapping;
use crate::schema::test_helper::{
    bool_column, float_column, optional_reference_column, pk_column, reference_column,
    string_column,
};
use crate::schema::{entity_spec::EntitySpec, mapping_spec::MappingSpec, table_spec::TableSpec};
use crate::{ColumnId, Database, TableId};

/// Concerts held at venues, optionally with a headlining artist.
///
/// - `Concert`: `id`, `title`, `price`, `sold_out`, `venue_id`, `venue` (required association)
///   and `headliner` (optional association)
/// - `Venue`: `id`, `name`, `location.city` and `location.street` (a complex member flattened
///   into the `city` and `street` columns) and the computed `display_name`
/// - `Artist`: `id`, `name`
pub struct TestSetup {
    pub database: Database,
    pub mapping: Mapping,

    pub concerts_table: TableId,
    pub venues_table: TableId,
    #[allow(unused)]
    pub artists_table: TableId,

    #[allow(unused)]
    pub concerts_id_column: ColumnId,
    pub concerts_title_column: ColumnId,
    pub concerts_price_column: ColumnId,
    pub concerts_sold_out_column: ColumnId,
    pub concerts_venue_id_column: ColumnId,

    pub venues_id_column: ColumnId,
    pub venues_name_column: ColumnId,
    pub venues_city_column: ColumnId,
    pub venues_street_column: ColumnId,

    #[allow(unused)]
    pub artists_name_column: ColumnId,
}

impl TestSetup {
    pub fn with_setup(test_fn: impl Fn(TestSetup)) {
        let (database, mapping) = MappingSpec::new(
            vec![
                TableSpec::new(
                    "concerts",
                    vec![
                        pk_column("id"),
                        string_column("title"),
                        float_column("price"),
                        bool_column("sold_out"),
                        reference_column("venue_id"),
                        optional_reference_column("headliner_id"),
                    ],
                ),
                TableSpec::new(
                    "venues",
                    vec![
                        pk_column("id"),
                        string_column("name"),
                        string_column("city"),
                        string_column("street"),
                    ],
                ),
                TableSpec::new("artists", vec![pk_column("id"), string_column("name")]),
            ],
            vec![
                EntitySpec::new("Concert", "concerts")
                    .column("id", "id")
                    .column("title", "title")
                    .column("price", "price")
                    .column("sold_out", "sold_out")
                    .column("venue_id", "venue_id")
                    .association("venue", "Venue", "venue_id", "id", false)
                    .association("headliner", "Artist", "headliner_id", "id", true),
                EntitySpec::new("Venue", "venues")
                    .column("id", "id")
                    .column("name", "name")
                    .column("location.city", "city")
                    .column("location.street", "street")
                    .computed(
                        "display_name",
                        Lambda::new(
                            "v",
                            Expr::binary(
                                BinaryOperator::Concat,
                                Expr::param("v").member("name"),
                                Expr::param("v").member("location").member("city"),
                            ),
                        ),
                    ),
                EntitySpec::new("Artist", "artists")
                    .column("id", "id")
                    .column("name", "name"),
            ],
        )
        .to_schema()
        .unwrap();

        let concerts_table = database.get_table_id("concerts").unwrap();
        let venues_table = database.get_table_id("venues").unwrap();
        let artists_table = database.get_table_id("artists").unwrap();

        let column = |table_id, name| database.get_column_id(table_id, name).unwrap();

        let test_setup = TestSetup {
            concerts_id_column: column(concerts_table, "id"),
            concerts_title_column: column(concerts_table, "title"),
            concerts_price_column: column(concerts_table, "price"),
            concerts_sold_out_column: column(concerts_table, "sold_out"),
            concerts_venue_id_column: column(concerts_table, "venue_id"),

            venues_id_column: column(venues_table, "id"),
            venues_name_column: column(venues_table, "name"),
            venues_city_column: column(venues_table, "city"),
            venues_street_column: column(venues_table, "street"),

            artists_name_column: column(artists_table, "name"),

            concerts_table,
            venues_table,
            artists_table,

            database,
            mapping,
        };

        test_fn(test_setup)
    }
}
