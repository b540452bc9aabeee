//! Nodal stress output parsing.
//!
//! The extraction block in the deck writes one line per node number up to
//! the highest defined node: `node, status, value, value, ...`. Status 1
//! marks a node that exists and is selected; gaps in the numbering show up
//! with status 0 and are dropped here.

use serde_json::{Number, Value, json};
use stresslab_core::StressComponent;
use stresslab_results::ResultsTable;

use crate::{Error, Result};

/// Name of the node id column.
pub const NODE_COLUMN: &str = "node";

/// Parse raw nodal stress text into a `node, S<comp>...` table.
pub fn parse_nodal_stress(raw: &str, components: &[StressComponent]) -> Result<ResultsTable> {
    let expected = components.len() + 2;
    let mut rows = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != expected {
            return Err(Error::InvalidOutput {
                line: line_no,
                message: format!("expected {expected} fields, found {}", fields.len()),
            });
        }

        let status = parse_number(fields[1], line_no)?;
        if status < 0.5 {
            continue;
        }

        let node = parse_number(fields[0], line_no)?;
        if node < 1.0 || node.fract() != 0.0 {
            return Err(Error::InvalidOutput {
                line: line_no,
                message: format!("'{}' is not a node number", fields[0]),
            });
        }

        let mut row = Vec::with_capacity(expected - 1);
        row.push(json!(node as u64));
        for field in &fields[2..] {
            let value = parse_number(field, line_no)?;
            row.push(Number::from_f64(value).map_or(Value::Null, Value::Number));
        }
        rows.push(row);
    }

    let mut headers = vec![NODE_COLUMN.to_string()];
    headers.extend(components.iter().map(StressComponent::column_name));
    Ok(ResultsTable::new(headers, rows)?)
}

/// Largest absolute value of each stress column.
pub fn peak_magnitudes(table: &ResultsTable) -> Vec<(String, f64)> {
    table
        .headers()
        .iter()
        .filter(|h| h.as_str() != NODE_COLUMN)
        .filter_map(|h| {
            let peak = table
                .column(h)?
                .into_iter()
                .filter_map(Value::as_f64)
                .map(f64::abs)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))?;
            Some((h.clone(), peak))
        })
        .collect()
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    // Fortran prints asterisks when a value overflows its field width.
    if field.contains('*') {
        return Err(Error::InvalidOutput {
            line,
            message: format!("value overflowed its output field: '{field}'"),
        });
    }
    field.parse::<f64>().map_err(|_| Error::InvalidOutput {
        line,
        message: format!("'{field}' is not a number"),
    })
}
