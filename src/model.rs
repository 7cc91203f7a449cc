//! Column vocabulary and typed views over the source and fused tables.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    coerce,
    data::{format_date, parse_integer, parse_number},
    table::Table,
};

pub const ID_CLIENTE: &str = "id_cliente";
pub const NOMBRE_CLIENTE: &str = "nombre_cliente";
pub const CIUDAD: &str = "ciudad";
pub const FECHA_ALTA: &str = "fecha_alta";
pub const ID_PRODUCTO: &str = "id_producto";
pub const NOMBRE_PRODUCTO: &str = "nombre_producto";
pub const CATEGORIA: &str = "categoria";
pub const ID_VENTA: &str = "id_venta";
pub const FECHA: &str = "fecha";
pub const MEDIO_PAGO: &str = "medio_pago";
pub const CANTIDAD: &str = "cantidad";
pub const IMPORTE: &str = "importe";
pub const NOMBRE_CLIENTE_FINAL: &str = "nombre_cliente_final";
pub const CATEGORIA_REDEFINIDA: &str = "categoria_redefinida";

/// Rewrites `fecha` as ISO dates; values no format accepts become empty.
pub fn prepare_sales<S: AsRef<str>>(sales: &mut Table, formats: &[S]) {
    let Ok(dates) = coerce::coerce_dates(sales, FECHA, formats) else {
        debug!("Sales table has no '{FECHA}' column; dates left as-is");
        return;
    };
    let invalid = dates.iter().filter(|d| d.is_none()).count();
    if invalid > 0 {
        warn!("{invalid} sale date(s) could not be parsed and were cleared");
    }
    sales.set_column(FECHA, dates.into_iter().map(render_date).collect());
}

/// Rewrites `fecha_alta` as ISO dates, filling gaps with the earliest valid
/// signup date in the table, or `fallback` when no row has one.
pub fn prepare_customers<S: AsRef<str>>(customers: &mut Table, formats: &[S], fallback: NaiveDate) {
    let Ok(dates) = coerce::coerce_dates(customers, FECHA_ALTA, formats) else {
        debug!("Customer table has no '{FECHA_ALTA}' column; signup dates left as-is");
        return;
    };
    let fill = dates.iter().flatten().min().copied().unwrap_or(fallback);
    let filled = dates
        .into_iter()
        .map(|d| format_date(d.unwrap_or(fill)))
        .collect();
    customers.set_column(FECHA_ALTA, filled);
}

fn render_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

/// One line item after joining its sale, product and customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedRecord {
    pub id_venta: Option<i64>,
    pub fecha: Option<NaiveDate>,
    pub id_cliente: Option<i64>,
    pub nombre_cliente_final: String,
    pub ciudad: Option<String>,
    pub id_producto: Option<i64>,
    pub nombre_producto: Option<String>,
    pub categoria_redefinida: String,
    pub cantidad: Option<f64>,
    pub importe: Option<f64>,
    pub medio_pago: Option<String>,
}

impl FusedRecord {
    /// Builds typed records from the fused string table. Absent columns and
    /// blank cells map to `None`.
    pub fn from_table(table: &Table) -> Vec<FusedRecord> {
        let idx = |name: &str| table.column_index(name);
        let columns = [
            idx(ID_VENTA),
            idx(FECHA),
            idx(ID_CLIENTE),
            idx(NOMBRE_CLIENTE_FINAL),
            idx(CIUDAD),
            idx(ID_PRODUCTO),
            idx(NOMBRE_PRODUCTO),
            idx(CATEGORIA_REDEFINIDA),
            idx(CANTIDAD),
            idx(IMPORTE),
            idx(MEDIO_PAGO),
        ];
        table
            .rows()
            .iter()
            .map(|row| {
                let get = |pos: usize| columns[pos].map(|i| row[i].as_str()).unwrap_or("");
                FusedRecord {
                    id_venta: parse_integer(get(0)),
                    fecha: NaiveDate::parse_from_str(get(1), crate::data::ISO_DATE).ok(),
                    id_cliente: parse_integer(get(2)),
                    nombre_cliente_final: get(3).to_string(),
                    ciudad: non_blank(get(4)),
                    id_producto: parse_integer(get(5)),
                    nombre_producto: non_blank(get(6)),
                    categoria_redefinida: get(7).to_string(),
                    cantidad: parse_number(get(8)),
                    importe: parse_number(get(9)),
                    medio_pago: non_blank(get(10)),
                }
            })
            .collect()
    }

    pub fn importe_or_zero(&self) -> f64 {
        self.importe.unwrap_or(0.0)
    }

    pub fn cantidad_or_zero(&self) -> f64 {
        self.cantidad.unwrap_or(0.0)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
