mod common;

use common::{TestWorkspace, config_for};
use encoding_rs::UTF_8;
use tienda_analytics::{
    fusion::{FusionOptions, fuse},
    pipeline,
    query,
    table::Table,
};

fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
    Table::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

fn enriched_products() -> Table {
    table(
        &["id_producto", "nombre_producto", "categoria"],
        &[&["101", "Leche entera", "Lácteos"]],
    )
}

#[test]
fn single_sale_fuses_end_to_end() {
    let customers = table(
        &["id_cliente", "nombre_cliente", "ciudad"],
        &[&["1", "Juan Pérez", "Madrid"]],
    );
    let sales = table(&["id_venta", "id_cliente", "fecha"], &[&["9", "1", "2024-01-15"]]);
    let lines = table(
        &["id_venta", "id_producto", "cantidad", "importe"],
        &[&["9", "101", "2", "150.00"]],
    );

    let fused = fuse(
        &lines,
        &sales,
        &enriched_products(),
        &customers,
        &FusionOptions::default(),
    );
    assert_eq!(fused.len(), 1);
    let record = &fused.records()[0];
    assert_eq!(record.categoria_redefinida, "LÁCTEOS");
    assert_eq!(record.nombre_cliente_final, "Juan Pérez");
    assert_eq!(record.ciudad.as_deref(), Some("Madrid"));
    assert_eq!(record.importe, Some(150.0));

    let by_city = query::by_city(&fused, "Madrid", 50);
    assert_eq!(by_city.rows.len(), 1);
    assert_eq!(by_city.total_importe(), 150.0);
}

#[test]
fn unknown_product_survives_and_unknown_sale_is_dropped() {
    let sales = table(&["id_venta", "id_cliente"], &[&["1", "5"]]);
    let lines = table(
        &["id_venta", "id_producto", "importe"],
        &[&["1", "999", "10"], &["2", "101", "20"]],
    );
    let fused = fuse(
        &lines,
        &sales,
        &enriched_products(),
        &Table::empty(),
        &FusionOptions::default(),
    );
    assert_eq!(fused.len(), 1);
    let record = &fused.records()[0];
    assert_eq!(record.id_producto, Some(999));
    assert_eq!(record.nombre_producto, None);
    assert_eq!(record.categoria_redefinida, "OTROS");
    assert_eq!(record.nombre_cliente_final, "NO DEFINIDO");
}

#[test]
fn empty_required_inputs_yield_an_empty_result() {
    let lines = table(&["id_venta", "importe"], &[&["1", "10"]]);
    let no_sales = table(&["id_venta"], &[]);
    let fused = fuse(
        &lines,
        &no_sales,
        &Table::empty(),
        &Table::empty(),
        &FusionOptions::default(),
    );
    assert!(fused.is_empty());

    let fused = fuse(
        &Table::empty(),
        &table(&["id_venta"], &[&["1"]]),
        &Table::empty(),
        &Table::empty(),
        &FusionOptions::default(),
    );
    assert!(fused.is_empty());
}

#[test]
fn overlapping_columns_appear_once() {
    let sales = table(
        &["id_venta", "id_cliente", "nombre_cliente"],
        &[&["1", "1", "Nombre en venta"]],
    );
    let customers = table(
        &["id_cliente", "nombre_cliente", "ciudad"],
        &[&["1", "Nombre en padrón", "Rosario"]],
    );
    let lines = table(&["id_venta", "id_producto", "nombre_producto"], &[&["1", "101", "Leche"]]);
    let fused = fuse(
        &lines,
        &sales,
        &enriched_products(),
        &customers,
        &FusionOptions::default(),
    );
    let headers = fused.table().headers();
    for name in ["id_venta", "id_cliente", "nombre_cliente", "nombre_producto"] {
        assert_eq!(headers.iter().filter(|h| *h == name).count(), 1, "{name}");
    }
    assert_eq!(fused.records()[0].nombre_cliente_final, "Nombre en venta");
    assert_eq!(fused.records()[0].ciudad.as_deref(), Some("Rosario"));
}

#[test]
fn numeric_keys_match_across_formatting() {
    let sales = table(&["id_venta", "medio_pago"], &[&["7", "qr"]]);
    let lines = table(&["id_venta", "importe"], &[&[" 7.0 ", "5"]]);
    let fused = fuse(
        &lines,
        &sales,
        &Table::empty(),
        &Table::empty(),
        &FusionOptions::default(),
    );
    assert_eq!(fused.len(), 1);
    assert_eq!(fused.records()[0].medio_pago.as_deref(), Some("qr"));
}

#[test]
fn sample_dataset_pipeline() {
    let ws = TestWorkspace::new();
    let data_dir = ws.with_sample_dataset();
    let config = config_for(&data_dir);

    let fused = pipeline::build_fused_table(&config, UTF_8, false).expect("fused table");
    // Sale 8 has no header row.
    assert_eq!(fused.len(), 6);
    assert!(config.cache_path().exists());

    let total: f64 = fused.records().iter().map(|r| r.importe_or_zero()).sum();
    assert_eq!(total, 965.0);

    let invalid_date = fused
        .records()
        .iter()
        .filter(|r| r.id_venta == Some(4))
        .all(|r| r.fecha.is_none());
    assert!(invalid_date);

    let mystery = fused
        .records()
        .iter()
        .find(|r| r.id_producto == Some(999))
        .expect("unmatched product kept");
    assert_eq!(mystery.categoria_redefinida, "OTROS");
}

#[test]
fn missing_customers_file_is_tolerated() {
    let ws = TestWorkspace::new();
    let data_dir = ws.with_sample_dataset();
    std::fs::remove_file(data_dir.join("clientes.csv")).unwrap();
    let config = config_for(&data_dir);

    let fused = pipeline::build_fused_table(&config, UTF_8, false).expect("fused table");
    assert_eq!(fused.len(), 6);
    assert!(fused.records().iter().all(|r| r.ciudad.is_none()));
}

#[test]
fn missing_sales_file_is_an_error() {
    let ws = TestWorkspace::new();
    let data_dir = ws.with_sample_dataset();
    std::fs::remove_file(data_dir.join("ventas.csv")).unwrap();
    let err = pipeline::build_fused_table(&config_for(&data_dir), UTF_8, false).unwrap_err();
    assert!(format!("{err:#}").contains("ventas.csv"));
}
