mod common;

use std::fs;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::{prelude::*, str::contains};
use serde_json::Value;

fn tienda(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("tienda-analytics").expect("binary exists");
    cmd.current_dir(ws.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn export_writes_bi_csv_in_working_directory() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["export"])
        .assert()
        .success()
        .stdout(contains("datos_powerbi.csv"));

    let contents = fs::read_to_string(ws.path().join("datos_powerbi.csv")).unwrap();
    assert!(contents.trim_start_matches('\u{feff}').starts_with("fecha,id_cliente,"));
    assert!(ws.path().join("data/productos_enriquecido.csv").exists());
}

#[test]
fn export_gzip_writes_compressed_file() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["export", "-o", "salida/bi.csv", "--gzip"])
        .assert()
        .success();
    assert!(ws.path().join("salida/bi.csv.gz").exists());
}

#[test]
fn query_customer_prints_matching_rows() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["query", "customer", "perez"])
        .assert()
        .success()
        .stdout(contains("Juan Pérez").and(contains("Coincidencias: 3")));
}

#[test]
fn query_lists_and_selects_cities() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["query", "cities"])
        .assert()
        .success()
        .stdout(contains("1. Córdoba").and(contains("3. Rosario")));

    tienda(&ws)
        .args(["query", "city", "3"])
        .assert()
        .success()
        .stdout(contains("Detergente líquido"));

    tienda(&ws)
        .args(["query", "city", "9"])
        .assert()
        .success()
        .stdout(contains("Opción inválida"));
}

#[test]
fn query_summary_ranks_products() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["query", "summary", "juan"])
        .assert()
        .success()
        .stdout(contains("Leche entera").and(contains("$225.00")));
}

#[test]
fn report_writes_text_and_json() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["report", "--text", "reporte.txt", "--json", "estadisticas.json"])
        .assert()
        .success();

    let text = fs::read_to_string(ws.path().join("reporte.txt")).unwrap();
    assert!(text.contains("RESUMEN EJECUTIVO"));
    let json: Value =
        serde_json::from_str(&fs::read_to_string(ws.path().join("estadisticas.json")).unwrap())
            .unwrap();
    assert_eq!(json["total_registros"], 6);
}

#[test]
fn report_without_outputs_prints_to_stdout() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .arg("report")
        .assert()
        .success()
        .stdout(contains("VENTAS POR MEDIO DE PAGO"));
}

#[test]
fn validate_reports_missing_columns() {
    let ws = TestWorkspace::new();
    let path = ws.write("parcial.csv", "fecha,importe\n2024-01-01,10\n");
    tienda(&ws)
        .args(["validate", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("id_cliente").and(contains("Validation failed")));

    tienda(&ws)
        .args([
            "validate",
            "-i",
            path.to_str().unwrap(),
            "--required",
            "fecha,importe",
        ])
        .assert()
        .success();
}

#[test]
fn validate_rejects_header_only_file() {
    let ws = TestWorkspace::new();
    let path = ws.write("vacio.csv", "fecha,importe,id_cliente\n");
    tienda(&ws)
        .args(["validate", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("zero rows"));
}

#[test]
fn analyze_skips_unreadable_files() {
    let ws = TestWorkspace::new();
    let data_dir = ws.with_sample_dataset();
    let ventas = data_dir.join("detalle_ventas.csv");
    tienda(&ws)
        .args([
            "analyze",
            "-i",
            ventas.to_str().unwrap(),
            "datos_marzo.csv",
        ])
        .assert()
        .success()
        .stderr(contains("datos_marzo.csv"));

    let json: Value = serde_json::from_str(
        &fs::read_to_string(ws.path().join("analisis_multiple.json")).unwrap(),
    )
    .unwrap();
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["registros"], 7);
    assert_eq!(results[0]["total_ventas"], 1340.0);
    assert!(results[0]["clientes_unicos"].is_null());
}

#[test]
fn init_config_round_trips_through_config_flag() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["init-config", "-o", "tienda.yaml"])
        .assert()
        .success();
    let yaml = fs::read_to_string(ws.path().join("tienda.yaml")).unwrap();
    assert!(yaml.contains("keyword: queso"));

    tienda(&ws)
        .args(["--config", "tienda.yaml", "query", "categories"])
        .assert()
        .success()
        .stdout(contains("LÁCTEOS"));
}

#[test]
fn categorize_prints_cached_products() {
    let ws = TestWorkspace::new();
    ws.with_sample_dataset();
    tienda(&ws)
        .args(["categorize"])
        .assert()
        .success()
        .stdout(contains("PANIFICADOS"));
}

#[test]
fn missing_data_directory_fails_with_path() {
    let ws = TestWorkspace::new();
    tienda(&ws)
        .args(["--data-dir", "no_hay_datos", "export"])
        .assert()
        .failure()
        .stderr(contains("detalle_ventas.csv"));
}
