//! Property-based tests for the analysis engines.
//!
//! Each property states an invariant that must hold for arbitrary tables:
//! filtering yields ordered subsets, projection is idempotent, CSV survives
//! a round trip, correlation is symmetric, and group counts reconcile.

use datalens_core::core::{
    correlation_analysis, filter_rows, from_csv_str, group_by, project_columns, to_csv_string,
    AggFunc, AggregateSpec, FilterOp, FilterSpec, Table, Value,
};
use proptest::prelude::*;

/// Cells as a CSV load would produce them: text or null.
fn arb_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        2 => Just(Value::Null),
        5 => (-1000i64..1000).prop_map(|n| Value::Text(n.to_string())),
        3 => "[a-z]{1,8}".prop_map(Value::Text),
    ]
}

fn arb_table() -> impl Strategy<Value = Table> {
    (1usize..5).prop_flat_map(|width| {
        let columns: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
        prop::collection::vec(prop::collection::vec(arb_cell(), width), 0..30)
            .prop_map(move |rows| Table::new(columns.clone(), rows).unwrap())
    })
}

fn arb_numeric_table() -> impl Strategy<Value = Table> {
    prop::collection::vec((-1000i64..1000, -1000i64..1000), 2..40).prop_map(|pairs| {
        Table::new(
            vec!["x".into(), "y".into()],
            pairs
                .into_iter()
                .map(|(x, y)| vec![Value::Int(x), Value::Int(y)])
                .collect(),
        )
        .unwrap()
    })
}

proptest! {
    #[test]
    fn filtered_rows_are_an_ordered_subset(table in arb_table(), threshold in -1000i64..1000) {
        let spec = FilterSpec::new().clause("c0", FilterOp::Gt, threshold);
        let filtered = filter_rows(&table, &spec, None).unwrap();

        prop_assert!(filtered.row_count() <= table.row_count());
        // Every output row appears in the input, in the same relative order.
        let mut cursor = 0;
        for row in filtered.rows() {
            let found = table.rows()[cursor..].iter().position(|r| r == row);
            prop_assert!(found.is_some());
            cursor += found.unwrap() + 1;
        }
    }

    #[test]
    fn filter_limit_is_a_prefix_of_the_unlimited_result(
        table in arb_table(),
        threshold in -1000i64..1000,
        limit in 0usize..10,
    ) {
        let spec = FilterSpec::new().clause("c0", FilterOp::Lte, threshold);
        let unlimited = filter_rows(&table, &spec, None).unwrap();
        let limited = filter_rows(&table, &spec, Some(limit)).unwrap();

        prop_assert!(limited.row_count() <= limit.min(unlimited.row_count()));
        prop_assert_eq!(
            limited.rows(),
            &unlimited.rows()[..limited.row_count()]
        );
    }

    #[test]
    fn projection_is_idempotent(table in arb_table()) {
        let names: Vec<String> = table.columns().iter().rev().cloned().collect();
        let once = project_columns(&table, &names).unwrap();
        let twice = project_columns(&once, &names).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn csv_round_trip_preserves_text_tables(table in arb_table()) {
        let exported = to_csv_string(&table).unwrap();
        let reparsed = from_csv_str(&exported).unwrap();
        // Cells are text-or-null throughout, so equality is exact.
        prop_assert_eq!(reparsed, table);
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal(table in arb_numeric_table()) {
        // Constant columns make the whole matrix undefined; only check the
        // cases where correlation succeeds.
        if let Ok(matrix) = correlation_analysis(&table, None) {
            let n = matrix.columns.len();
            for i in 0..n {
                for j in 0..n {
                    prop_assert_eq!(matrix.values[i][j], matrix.values[j][i]);
                    if let Some(r) = matrix.values[i][j] {
                        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&r));
                    }
                }
                if let Some(d) = matrix.values[i][i] {
                    prop_assert_eq!(d, 1.0);
                }
            }
        }
    }

    #[test]
    fn group_counts_reconcile_with_input_rows(table in arb_table()) {
        let spec = AggregateSpec::group_by("c0").aggregate("c0", &[AggFunc::Count]);
        let result = group_by(&table, &spec).unwrap();

        let total: i64 = result
            .table
            .rows()
            .iter()
            .map(|row| match row[1] {
                Value::Int(n) => n,
                _ => 0,
            })
            .sum();
        prop_assert_eq!(total as usize, table.row_count());
        // No more groups than rows.
        prop_assert!(result.table.row_count() <= table.row_count().max(1));
    }
}
