//! Aggregate statistics (JSON) and the plain-text sales report.

use std::{collections::HashMap, fmt::Write as _, path::Path};

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    atomic,
    cli::ReportArgs,
    data::{format_currency, format_date},
    fusion::FusedTable,
    model::FusedRecord,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesStatistics {
    pub fecha_analisis: String,
    pub total_registros: usize,
    #[serde(rename = "período")]
    pub periodo: Option<Period>,
    #[serde(rename = "métricas_generales")]
    pub metricas_generales: SalesMetrics,
    pub categorias: Vec<String>,
    pub ciudades: Vec<String>,
    pub metodos_pago: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub inicio: NaiveDate,
    pub fin: NaiveDate,
}

/// `None` where the statistic is undefined (no amounts, or fewer than two
/// for the deviation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesMetrics {
    pub total_ventas: f64,
    pub promedio_venta: Option<f64>,
    pub maxima_venta: Option<f64>,
    pub minima_venta: Option<f64>,
    pub desviacion_estandar: Option<f64>,
}

impl SalesMetrics {
    pub fn from_amounts(amounts: &[f64]) -> Self {
        let total: f64 = amounts.iter().sum();
        let n = amounts.len();
        let mean = (n > 0).then(|| total / n as f64);
        let std_dev = mean.filter(|_| n > 1).map(|m| {
            let variance = amounts.iter().map(|a| (a - m).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        });
        Self {
            total_ventas: total,
            promedio_venta: mean,
            maxima_venta: amounts.iter().copied().reduce(f64::max),
            minima_venta: amounts.iter().copied().reduce(f64::min),
            desviacion_estandar: std_dev,
        }
    }
}

impl SalesStatistics {
    pub fn compute(fused: &FusedTable, analysed_at: NaiveDateTime) -> Self {
        let records = fused.records();
        let periodo = records
            .iter()
            .filter_map(|r| r.fecha)
            .minmax()
            .into_option()
            .map(|(inicio, fin)| Period { inicio, fin });
        let amounts = records.iter().filter_map(|r| r.importe).collect::<Vec<_>>();
        Self {
            fecha_analisis: analysed_at.format(TIMESTAMP_FORMAT).to_string(),
            total_registros: records.len(),
            periodo,
            metricas_generales: SalesMetrics::from_amounts(&amounts),
            categorias: first_seen(records, |r| Some(r.categoria_redefinida.as_str())),
            ciudades: first_seen(records, |r| r.ciudad.as_deref()),
            metodos_pago: first_seen(records, |r| r.medio_pago.as_deref()),
        }
    }
}

fn first_seen<'a, F>(records: &'a [FusedRecord], field: F) -> Vec<String>
where
    F: Fn(&'a FusedRecord) -> Option<&'a str>,
{
    records
        .iter()
        .filter_map(field)
        .filter(|v| !v.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// Sum of `importe` and line count for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub label: String,
    pub importe: f64,
    pub lineas: usize,
}

/// Groups by `key` (rows without one are skipped), largest total first,
/// ties broken by label.
pub fn totals_by<F>(records: &[FusedRecord], key: F) -> Vec<GroupTotal>
where
    F: Fn(&FusedRecord) -> Option<String>,
{
    let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
    for record in records {
        let Some(label) = key(record) else {
            continue;
        };
        let entry = groups.entry(label).or_default();
        entry.0 += record.importe_or_zero();
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(label, (importe, lineas))| GroupTotal {
            label,
            importe,
            lineas,
        })
        .sorted_by(|a, b| {
            b.importe
                .total_cmp(&a.importe)
                .then_with(|| a.label.cmp(&b.label))
        })
        .collect()
}

pub fn render_text_report(fused: &FusedTable, top: usize, generated_at: NaiveDateTime) -> String {
    let records = fused.records();
    let stats = SalesStatistics::compute(fused, generated_at);
    let metrics = &stats.metricas_generales;
    let total = metrics.total_ventas;
    let mut out = String::new();

    let _ = writeln!(out, "REPORTE DE VENTAS");
    let _ = writeln!(out, "Generado: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));

    section(&mut out, "RESUMEN EJECUTIVO");
    let _ = writeln!(out, "Registros: {}", stats.total_registros);
    let _ = writeln!(out, "Ventas totales: {}", format_currency(total));
    if let Some(mean) = metrics.promedio_venta {
        let _ = writeln!(out, "Venta promedio: {}", format_currency(mean));
    }
    let customers = records.iter().filter_map(|r| r.id_cliente).unique().count();
    let products = records.iter().filter_map(|r| r.id_producto).unique().count();
    let _ = writeln!(out, "Clientes únicos: {customers}");
    let _ = writeln!(out, "Productos únicos: {products}");
    if let Some(period) = &stats.periodo {
        let _ = writeln!(
            out,
            "Período: {} a {}",
            format_date(period.inicio),
            format_date(period.fin)
        );
    }

    section(&mut out, "VENTAS POR CATEGORÍA");
    write_totals(
        &mut out,
        &totals_by(records, |r| Some(r.categoria_redefinida.clone())),
        total,
    );

    section(&mut out, "VENTAS POR CIUDAD");
    write_totals(&mut out, &totals_by(records, |r| r.ciudad.clone()), total);

    section(&mut out, "VENTAS POR MEDIO DE PAGO");
    write_totals(&mut out, &totals_by(records, |r| r.medio_pago.clone()), total);

    section(&mut out, &format!("TOP {top} PRODUCTOS"));
    let top_products = totals_by(records, |r| r.nombre_producto.clone());
    write_ranking(&mut out, &top_products[..top.min(top_products.len())]);

    section(&mut out, &format!("TOP {top} CLIENTES"));
    let top_customers = totals_by(records, |r| Some(r.nombre_cliente_final.clone()));
    write_ranking(&mut out, &top_customers[..top.min(top_customers.len())]);

    section(&mut out, "DESTACADOS TEMPORALES");
    let monthly = totals_by(records, |r| {
        r.fecha.map(|d| format!("{:04}-{:02}", d.year(), d.month()))
    })
    .into_iter()
    .sorted_by(|a, b| a.label.cmp(&b.label))
    .collect::<Vec<_>>();
    if monthly.is_empty() {
        let _ = writeln!(out, "Sin fechas válidas");
    }
    for month in &monthly {
        let _ = writeln!(out, "{}: {}", month.label, format_currency(month.importe));
    }
    if let Some(best) = totals_by(records, |r| r.fecha.map(format_date)).first() {
        let _ = writeln!(
            out,
            "Mejor día: {} ({})",
            best.label,
            format_currency(best.importe)
        );
    }
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
}

fn write_totals(out: &mut String, totals: &[GroupTotal], grand_total: f64) {
    for group in totals {
        let share = if grand_total == 0.0 {
            0.0
        } else {
            group.importe / grand_total * 100.0
        };
        let _ = writeln!(
            out,
            "{}: {} ({} líneas, {share:.1}%)",
            group.label,
            format_currency(group.importe),
            group.lineas
        );
    }
}

fn write_ranking(out: &mut String, totals: &[GroupTotal]) {
    for (idx, group) in totals.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}: {} ({} líneas)",
            idx + 1,
            group.label,
            format_currency(group.importe),
            group.lineas
        );
    }
}

pub fn write_statistics(fused: &FusedTable, dest: &Path) -> Result<SalesStatistics> {
    let stats = SalesStatistics::compute(fused, Local::now().naive_local());
    atomic::write_json_atomic(&stats, dest)?;
    info!("Statistics for {} record(s) written to {dest:?}", stats.total_registros);
    Ok(stats)
}

pub fn execute(fused: &FusedTable, args: &ReportArgs, top: usize) -> Result<()> {
    let now = Local::now().naive_local();
    if args.text.is_none() && args.json.is_none() {
        print!("{}", render_text_report(fused, top, now));
        return Ok(());
    }
    if let Some(path) = &args.text {
        atomic::write_text_atomic(&render_text_report(fused, top, now), path)?;
        info!("Text report written to {path:?}");
    }
    if let Some(path) = &args.json {
        write_statistics(fused, path)?;
    }
    Ok(())
}
