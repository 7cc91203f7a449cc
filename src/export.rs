//! Flat CSV export of the fused table for BI tools.

use std::{io::Write, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    atomic,
    fusion::FusedTable,
    io_utils::{self, OutputSink, UTF8_BOM},
    model::{
        CANTIDAD, CATEGORIA_REDEFINIDA, CIUDAD, FECHA, ID_CLIENTE, ID_PRODUCTO, IMPORTE,
        MEDIO_PAGO, NOMBRE_CLIENTE_FINAL, NOMBRE_PRODUCTO,
    },
    table::Table,
};

pub const DEFAULT_EXPORT_FILE: &str = "datos_powerbi.csv";

pub const EXPORT_COLUMNS: &[&str] = &[
    FECHA,
    ID_CLIENTE,
    NOMBRE_CLIENTE_FINAL,
    CIUDAD,
    ID_PRODUCTO,
    NOMBRE_PRODUCTO,
    CATEGORIA_REDEFINIDA,
    CANTIDAD,
    IMPORTE,
    MEDIO_PAGO,
];

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub gzip: bool,
    /// Prefix the file with a UTF-8 byte-order mark.
    pub bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            gzip: false,
            bom: true,
        }
    }
}

/// The export columns present in `fused`, in export order.
pub fn export_table(fused: &FusedTable) -> Table {
    let table = fused.table();
    let (present, missing): (Vec<_>, Vec<_>) = EXPORT_COLUMNS
        .iter()
        .map(|name| (name, table.column_index(name)))
        .partition(|(_, idx)| idx.is_some());
    if !missing.is_empty() {
        let names = missing.iter().map(|(name, _)| **name).collect::<Vec<_>>();
        warn!("Export skips absent column(s): {}", names.join(", "));
    }
    let indices = present.into_iter().filter_map(|(_, idx)| idx).collect::<Vec<_>>();
    table.select(&indices)
}

/// Writes the export atomically and returns the path actually written
/// (`.gz` appended when compressing).
pub fn export(fused: &FusedTable, output: &Path, options: &ExportOptions) -> Result<PathBuf> {
    let table = export_table(fused);
    let dest = io_utils::compressed_path(output, options.gzip);
    atomic::write_atomic(&dest, |writer| write_csv(writer, &table, options))
        .with_context(|| format!("Exporting to {dest:?}"))?;
    info!(
        "Exported {} row(s) x {} column(s) to {:?}",
        table.row_count(),
        table.column_count(),
        dest
    );
    Ok(dest)
}

fn write_csv(writer: &mut dyn Write, table: &Table, options: &ExportOptions) -> Result<()> {
    let mut sink = OutputSink::new(writer, options.gzip);
    if options.bom {
        sink.write_all(UTF8_BOM)?;
    }
    {
        let mut csv = io_utils::csv_writer(&mut sink);
        csv.write_record(table.headers())?;
        for row in table.rows() {
            csv.write_record(row)?;
        }
        csv.flush()?;
    }
    sink.finish().context("Finishing export stream")?;
    Ok(())
}
