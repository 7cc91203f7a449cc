mod common;

use std::{fs, io::Read};

use chrono::NaiveDate;
use common::{TestWorkspace, config_for};
use encoding_rs::UTF_8;
use flate2::read::GzDecoder;
use serde_json::Value;
use tienda_analytics::{
    atomic,
    export::{self, EXPORT_COLUMNS, ExportOptions},
    fusion::FusedTable,
    pipeline,
    report::{self, SalesStatistics},
};

fn sample_fused() -> (TestWorkspace, FusedTable) {
    let ws = TestWorkspace::new();
    let data_dir = ws.with_sample_dataset();
    let fused = pipeline::build_fused_table(&config_for(&data_dir), UTF_8, false).unwrap();
    (ws, fused)
}

fn noon() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn statistics_cover_period_metrics_and_distinct_values() {
    let (_ws, fused) = sample_fused();
    let stats = SalesStatistics::compute(&fused, noon());
    assert_eq!(stats.total_registros, 6);
    let period = stats.periodo.as_ref().expect("dated sales");
    assert_eq!(period.inicio, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(period.fin, NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
    assert_eq!(stats.metricas_generales.total_ventas, 965.0);
    assert_eq!(stats.metricas_generales.maxima_venta, Some(300.0));
    assert_eq!(stats.metricas_generales.minima_venta, Some(50.0));
    assert_eq!(stats.ciudades, ["Madrid", "Córdoba", "Rosario"]);
    assert_eq!(stats.metodos_pago, ["tarjeta", "efectivo", "qr"]);
}

#[test]
fn statistics_json_uses_report_keys() {
    let (ws, fused) = sample_fused();
    let dest = ws.path().join("out/estadisticas.json");
    report::write_statistics(&fused, &dest).unwrap();

    let json: Value = serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
    assert_eq!(json["total_registros"], 6);
    assert_eq!(json["período"]["inicio"], "2024-01-15");
    assert_eq!(json["métricas_generales"]["total_ventas"], 965.0);
    assert!(json["métricas_generales"]["desviacion_estandar"].is_f64());
    assert_eq!(json["categorias"][0], "LÁCTEOS");
}

#[test]
fn text_report_sections_are_in_order() {
    let (_ws, fused) = sample_fused();
    let text = report::render_text_report(&fused, 10, noon());
    let sections = [
        "RESUMEN EJECUTIVO",
        "VENTAS POR CATEGORÍA",
        "VENTAS POR CIUDAD",
        "VENTAS POR MEDIO DE PAGO",
        "TOP 10 PRODUCTOS",
        "TOP 10 CLIENTES",
        "DESTACADOS TEMPORALES",
    ];
    let positions = sections
        .iter()
        .map(|s| text.find(s).unwrap_or_else(|| panic!("missing section {s}")))
        .collect::<Vec<_>>();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(text.contains("Ventas totales: $965.00"));
    assert!(text.contains("2024-02: $620.00"));
    assert!(text.contains("Mejor día: 2024-02-20 ($350.00)"));
}

#[test]
fn export_has_fixed_columns_and_bom() {
    let (ws, fused) = sample_fused();
    let dest = ws.path().join("datos_powerbi.csv");
    let written = export::export(&fused, &dest, &ExportOptions::default()).unwrap();
    assert_eq!(written, dest);

    let bytes = fs::read(&dest).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, EXPORT_COLUMNS.join(","));
    assert_eq!(text.lines().count(), 7);
}

#[test]
fn gzip_export_appends_suffix() {
    let (ws, fused) = sample_fused();
    let dest = ws.path().join("datos_powerbi.csv");
    let options = ExportOptions {
        gzip: true,
        bom: false,
    };
    let written = export::export(&fused, &dest, &options).unwrap();
    assert_eq!(written, ws.path().join("datos_powerbi.csv.gz"));
    assert!(!dest.exists());

    let mut decoded = String::new();
    GzDecoder::new(fs::File::open(&written).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    assert!(decoded.starts_with("fecha,id_cliente,"));
}

#[test]
fn atomic_json_round_trips() {
    let ws = TestWorkspace::new();
    let dest = ws.path().join("resumen.json");
    let value = serde_json::json!({"total": 965.0, "ciudades": ["Madrid"]});
    atomic::write_json_atomic(&value, &dest).unwrap();
    let back: Value = serde_json::from_str(&fs::read_to_string(&dest).unwrap()).unwrap();
    assert_eq!(back, value);
}
