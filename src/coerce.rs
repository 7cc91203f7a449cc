//! Column-level coercion that never fails on individual cells.

use chrono::NaiveDate;

use crate::{
    data::{parse_date, parse_number},
    error::ColumnNotFound,
    table::Table,
};

/// Converts `column` to numbers; cells that do not parse become `None`.
pub fn coerce_numeric(table: &Table, column: &str) -> Result<Vec<Option<f64>>, ColumnNotFound> {
    let values = table
        .column(column)
        .ok_or_else(|| ColumnNotFound::new(column))?;
    Ok(values.map(parse_number).collect())
}

/// Converts `column` to dates using the first matching format; failures become `None`.
pub fn coerce_dates<S: AsRef<str>>(
    table: &Table,
    column: &str,
    formats: &[S],
) -> Result<Vec<Option<NaiveDate>>, ColumnNotFound> {
    let values = table
        .column(column)
        .ok_or_else(|| ColumnNotFound::new(column))?;
    Ok(values.map(|raw| parse_date(raw, formats)).collect())
}
