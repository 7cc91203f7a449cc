//! Quick per-file summaries over a batch of CSV files.
//!
//! Each file is analysed independently; a file that fails to load is logged
//! and recorded as a failure while the rest of the batch carries on.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Local;
use encoding_rs::Encoding;
use itertools::Itertools;
use log::{error, info};
use serde::Serialize;

use crate::{
    atomic,
    cli::AnalyzeArgs,
    coerce,
    data::canonical_key,
    error::LoadError,
    loader,
    model::{ID_CLIENTE, IMPORTE},
};

pub const DEFAULT_ANALYSIS_FILE: &str = "analisis_multiple.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileAnalysis {
    pub archivo: String,
    pub fecha_analisis: String,
    pub registros: usize,
    pub columnas: Vec<String>,
    /// Absent when the file has no `importe` column.
    pub total_ventas: Option<f64>,
    /// Absent when the file has no `id_cliente` column.
    pub clientes_unicos: Option<usize>,
}

#[derive(Debug)]
pub struct AnalysisFailure {
    pub path: PathBuf,
    pub error: LoadError,
}

#[derive(Debug, Default)]
pub struct BatchAnalysis {
    pub results: Vec<FileAnalysis>,
    pub failures: Vec<AnalysisFailure>,
}

pub fn analyze_file(path: &Path, encoding: &'static Encoding) -> Result<FileAnalysis, LoadError> {
    let table = loader::load(path, encoding)?;
    let total_ventas = coerce::coerce_numeric(&table, IMPORTE)
        .ok()
        .map(|values| values.into_iter().flatten().sum());
    let clientes_unicos = table
        .column(ID_CLIENTE)
        .map(|ids| ids.filter_map(canonical_key).unique().count());
    Ok(FileAnalysis {
        archivo: path.display().to_string(),
        fecha_analisis: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        registros: table.row_count(),
        columnas: table.headers().to_vec(),
        total_ventas,
        clientes_unicos,
    })
}

pub fn analyze_files(paths: &[PathBuf], encoding: &'static Encoding) -> BatchAnalysis {
    let mut batch = BatchAnalysis::default();
    for path in paths {
        match analyze_file(path, encoding) {
            Ok(analysis) => {
                info!(
                    "Analysed {path:?}: {} record(s), {} column(s)",
                    analysis.registros,
                    analysis.columnas.len()
                );
                batch.results.push(analysis);
            }
            Err(err) => {
                error!("Could not analyse {path:?}: {err}");
                batch.failures.push(AnalysisFailure {
                    path: path.clone(),
                    error: err,
                });
            }
        }
    }
    batch
}

pub fn execute(args: &AnalyzeArgs, encoding: &'static Encoding) -> Result<()> {
    let batch = analyze_files(&args.inputs, encoding);
    if batch.results.is_empty() {
        bail!("None of the {} file(s) could be analysed", args.inputs.len());
    }
    for analysis in &batch.results {
        println!("- {}: {} registros", analysis.archivo, analysis.registros);
    }
    atomic::write_json_atomic(&batch.results, &args.output)?;
    info!(
        "Analysis of {} file(s) written to {:?} ({} failed)",
        batch.results.len(),
        args.output,
        batch.failures.len()
    );
    Ok(())
}
