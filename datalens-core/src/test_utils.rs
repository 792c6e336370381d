//! Shared fixtures for unit and integration tests.
#![allow(dead_code)]

use crate::core::table::Table;
use crate::core::value::Value;

fn text(s: &str) -> Value {
    Value::Text(s.into())
}

/// A small people dataset with numeric, text, and null cells.
pub fn people_table() -> Table {
    Table::new(
        vec!["name".into(), "age".into(), "city".into()],
        vec![
            vec![text("alice"), Value::Int(34), text("Boston")],
            vec![text("bob"), Value::Int(28), text("Boston")],
            vec![text("carol"), Value::Int(41), text("Denver")],
            vec![text("dan"), Value::Null, text("Boston")],
            vec![text("erin"), Value::Int(30), text("Seattle")],
        ],
    )
    .expect("fixture is well formed")
}

/// A sales dataset with a grouping column, values, and nulls.
pub fn sales_table() -> Table {
    Table::new(
        vec!["region".into(), "units".into(), "revenue".into()],
        vec![
            vec![text("east"), Value::Int(10), Value::Float(100.0)],
            vec![text("west"), Value::Int(20), Value::Float(250.0)],
            vec![text("east"), Value::Int(15), Value::Float(180.0)],
            vec![text("west"), Value::Null, Value::Float(90.0)],
            vec![Value::Null, Value::Int(5), Value::Null],
        ],
    )
    .expect("fixture is well formed")
}

/// All cells text, the way a CSV load produces them; types are recovered
/// by inference.
pub fn untyped_measurements_table() -> Table {
    Table::new(
        vec!["day".into(), "reading".into(), "ok".into()],
        vec![
            vec![text("2024-01-01"), text("10.5"), text("yes")],
            vec![text("2024-01-02"), text("11.0"), text("no")],
            vec![text("2024-01-03"), text("9.75"), text("yes")],
        ],
    )
    .expect("fixture is well formed")
}
