//! Read-only lookups and aggregations over the fused table.
//!
//! Every query is a pure function of the [`FusedTable`]; an unmatched query
//! yields an empty result rather than an error. [`dispatch`] maps a parsed
//! [`QueryCommand`] onto those functions so no console interaction is needed.

use std::{
    collections::HashMap,
    fmt,
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use anyhow::{Context, Result};
use chrono::Local;
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    config::AnalyticsConfig,
    data::{format_currency, format_date, format_number},
    fusion::FusedTable,
    model::FusedRecord,
    normalize::normalize,
    table,
};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    /// At most `limit` matching records, in table order.
    pub rows: Vec<&'a FusedRecord>,
    /// Matches before the limit was applied.
    pub total_matches: usize,
}

impl QueryResult<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_importe(&self) -> f64 {
        self.rows.iter().map(|r| r.importe_or_zero()).sum()
    }
}

fn bounded<'a, F>(fused: &'a FusedTable, limit: usize, predicate: F) -> QueryResult<'a>
where
    F: Fn(&FusedRecord) -> bool,
{
    let mut rows = Vec::new();
    let mut total_matches = 0usize;
    for record in fused.records().iter().filter(|r| predicate(r)) {
        total_matches += 1;
        if rows.len() < limit {
            rows.push(record);
        }
    }
    QueryResult {
        rows,
        total_matches,
    }
}

/// Case- and accent-insensitive substring match on the customer name.
pub fn by_customer<'a>(fused: &'a FusedTable, term: &str, limit: usize) -> QueryResult<'a> {
    let needle = normalize(term);
    bounded(fused, limit, |r| {
        normalize(&r.nombre_cliente_final).contains(&needle)
    })
}

pub fn known_cities(fused: &FusedTable) -> Vec<String> {
    fused
        .records()
        .iter()
        .filter_map(|r| r.ciudad.clone())
        .sorted()
        .dedup()
        .collect()
}

pub fn by_city<'a>(fused: &'a FusedTable, city: &str, limit: usize) -> QueryResult<'a> {
    let wanted = normalize(city);
    bounded(fused, limit, |r| {
        r.ciudad.as_deref().is_some_and(|c| normalize(c) == wanted)
    })
}

pub fn known_categories(fused: &FusedTable) -> Vec<String> {
    fused
        .records()
        .iter()
        .map(|r| r.categoria_redefinida.clone())
        .filter(|c| !c.is_empty())
        .sorted()
        .dedup()
        .collect()
}

pub fn by_category<'a>(fused: &'a FusedTable, category: &str, limit: usize) -> QueryResult<'a> {
    bounded(fused, limit, |r| r.categoria_redefinida == category)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub nombre_producto: String,
    pub total_cantidad: f64,
    pub total_importe: f64,
}

/// Per-product totals for customers matching `term`, highest spend first.
/// Rows without a product name are not grouped.
pub fn summary_by_customer(fused: &FusedTable, term: &str, top: usize) -> Vec<ProductSummary> {
    let needle = normalize(term);
    let mut groups: HashMap<&str, (f64, f64)> = HashMap::new();
    for record in fused
        .records()
        .iter()
        .filter(|r| normalize(&r.nombre_cliente_final).contains(&needle))
    {
        let Some(product) = record.nombre_producto.as_deref() else {
            continue;
        };
        let entry = groups.entry(product).or_default();
        entry.0 += record.cantidad_or_zero();
        entry.1 += record.importe_or_zero();
    }
    groups
        .into_iter()
        .map(|(name, (cantidad, importe))| ProductSummary {
            nombre_producto: name.to_string(),
            total_cantidad: cantidad,
            total_importe: importe,
        })
        .sorted_by(|a, b| {
            b.total_importe
                .total_cmp(&a.total_importe)
                .then_with(|| a.nombre_producto.cmp(&b.nombre_producto))
        })
        .take(top)
        .collect()
}

/// Either a literal value or a 1-based position in an enumerated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Name(String),
    Position(usize),
}

impl Selection {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<usize>() {
            Ok(position) => Selection::Position(position),
            Err(_) => Selection::Name(trimmed.to_string()),
        }
    }

    /// Resolves against `options`; names match case- and accent-insensitively
    /// and pass through unchanged when no option matches.
    pub fn resolve(&self, options: &[String]) -> Option<String> {
        match self {
            Selection::Position(0) => None,
            Selection::Position(n) => options.get(n - 1).cloned(),
            Selection::Name(name) => {
                let wanted = normalize(name);
                Some(
                    options
                        .iter()
                        .find(|o| normalize(o) == wanted)
                        .cloned()
                        .unwrap_or_else(|| name.clone()),
                )
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Name(name) => f.write_str(name),
            Selection::Position(n) => write!(f, "#{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    Customer { term: String },
    City(Selection),
    Category(Selection),
    Summary { term: String },
    ListCities,
    ListCategories,
}

impl QueryCommand {
    /// Short tag written to the query log.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryCommand::Customer { .. } => "CLIENTE",
            QueryCommand::City(_) => "CIUDAD",
            QueryCommand::Category(_) => "CATEGORIA",
            QueryCommand::Summary { .. } => "RESUMEN",
            QueryCommand::ListCities => "CIUDADES",
            QueryCommand::ListCategories => "CATEGORIAS",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub result_limit: usize,
    pub summary_top: usize,
}

impl From<&AnalyticsConfig> for QueryLimits {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            result_limit: config.result_limit,
            summary_top: config.summary_top,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<'a> {
    Rows {
        subject: String,
        result: QueryResult<'a>,
    },
    Summary {
        subject: String,
        products: Vec<ProductSummary>,
    },
    Options(Vec<String>),
    InvalidSelection {
        requested: Selection,
        available: usize,
    },
}

pub fn dispatch<'a>(
    fused: &'a FusedTable,
    command: &QueryCommand,
    limits: QueryLimits,
) -> QueryOutcome<'a> {
    match command {
        QueryCommand::Customer { term } => QueryOutcome::Rows {
            subject: term.clone(),
            result: by_customer(fused, term, limits.result_limit),
        },
        QueryCommand::City(selection) => {
            let cities = known_cities(fused);
            match selection.resolve(&cities) {
                Some(city) => QueryOutcome::Rows {
                    result: by_city(fused, &city, limits.result_limit),
                    subject: city,
                },
                None => QueryOutcome::InvalidSelection {
                    requested: selection.clone(),
                    available: cities.len(),
                },
            }
        }
        QueryCommand::Category(selection) => {
            let categories = known_categories(fused);
            match selection.resolve(&categories) {
                Some(category) => QueryOutcome::Rows {
                    result: by_category(fused, &category, limits.result_limit),
                    subject: category,
                },
                None => QueryOutcome::InvalidSelection {
                    requested: selection.clone(),
                    available: categories.len(),
                },
            }
        }
        QueryCommand::Summary { term } => QueryOutcome::Summary {
            subject: term.clone(),
            products: summary_by_customer(fused, term, limits.summary_top),
        },
        QueryCommand::ListCities => QueryOutcome::Options(known_cities(fused)),
        QueryCommand::ListCategories => QueryOutcome::Options(known_categories(fused)),
    }
}

/// Runs `command`, prints its outcome and records it in the query log.
pub fn execute(fused: &FusedTable, command: &QueryCommand, config: &AnalyticsConfig) -> Result<()> {
    let outcome = dispatch(fused, command, QueryLimits::from(config));
    if let Some(log_path) = &config.query_log {
        log_query(log_path, command.kind(), &query_subject(command, &outcome))?;
    }
    print!("{}", render_outcome(&outcome));
    Ok(())
}

pub fn render_outcome(outcome: &QueryOutcome<'_>) -> String {
    match outcome {
        QueryOutcome::Rows { subject, result } => {
            if result.is_empty() {
                return format!("Sin coincidencias para '{subject}'\n");
            }
            let mut out = format!(
                "Coincidencias: {} (mostrando {})\n",
                result.total_matches,
                result.rows.len()
            );
            let headers = RECORD_HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>();
            let rows = result.rows.iter().map(|r| record_cells(r)).collect::<Vec<_>>();
            out.push_str(&table::render_table(&headers, &rows));
            out.push_str(&format!(
                "Importe total: {}\n",
                format_currency(result.total_importe())
            ));
            out
        }
        QueryOutcome::Summary { subject, products } => {
            if products.is_empty() {
                return format!("Sin datos para '{subject}'\n");
            }
            let headers = vec![
                "nombre_producto".to_string(),
                "total_cant".to_string(),
                "total_pesos".to_string(),
            ];
            let rows = products
                .iter()
                .map(|p| {
                    vec![
                        p.nombre_producto.clone(),
                        format_number(p.total_cantidad),
                        format_currency(p.total_importe),
                    ]
                })
                .collect::<Vec<_>>();
            table::render_table(&headers, &rows)
        }
        QueryOutcome::Options(options) => options
            .iter()
            .enumerate()
            .map(|(idx, option)| format!("{}. {option}\n", idx + 1))
            .collect(),
        QueryOutcome::InvalidSelection {
            requested,
            available,
        } => format!("Opción inválida: {requested} (hay {available} opción(es))\n"),
    }
}

const RECORD_HEADERS: &[&str] = &[
    "fecha",
    "nombre_cliente_final",
    "ciudad",
    "nombre_producto",
    "categoria_redefinida",
    "cantidad",
    "importe",
    "medio_pago",
];

fn record_cells(record: &FusedRecord) -> Vec<String> {
    vec![
        record.fecha.map(format_date).unwrap_or_default(),
        record.nombre_cliente_final.clone(),
        record.ciudad.clone().unwrap_or_default(),
        record.nombre_producto.clone().unwrap_or_default(),
        record.categoria_redefinida.clone(),
        record.cantidad.map(format_number).unwrap_or_default(),
        record.importe.map(format_number).unwrap_or_default(),
        record.medio_pago.clone().unwrap_or_default(),
    ]
}

fn query_subject(command: &QueryCommand, outcome: &QueryOutcome<'_>) -> String {
    match (command, outcome) {
        (_, QueryOutcome::Rows { subject, .. }) | (_, QueryOutcome::Summary { subject, .. }) => {
            subject.clone()
        }
        (QueryCommand::City(sel) | QueryCommand::Category(sel), _) => sel.to_string(),
        _ => String::new(),
    }
}

/// Appends `timestamp | KIND | subject` to the query log.
pub fn log_query(path: &Path, kind: &str, subject: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Opening query log {path:?}"))?;
    let line = format!(
        "{} | {kind} | {subject}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.6f")
    );
    file.write_all(line.as_bytes())
        .with_context(|| format!("Appending to query log {path:?}"))?;
    info!("Logged {kind} query");
    Ok(())
}
