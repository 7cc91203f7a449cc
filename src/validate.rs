use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{error, info};

use crate::{cli::ValidateArgs, loader, table::Table};

pub const DEFAULT_REQUIRED: &[&str] = &["fecha", "importe", "id_cliente"];

/// Columns from `required` that `table` lacks, in the order requested.
///
/// Never fails; `None` means nothing is required.
pub fn missing_columns<S: AsRef<str>>(table: &Table, required: Option<&[S]>) -> Vec<String> {
    let Some(required) = required else {
        return Vec::new();
    };
    let mut missing: Vec<String> = Vec::new();
    for name in required.iter().map(AsRef::as_ref) {
        if !table.has_column(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}

pub fn has_rows(table: &Table) -> bool {
    table.row_count() > 0
}

/// Both validation signals for one table, kept separate so callers can decide
/// which of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub missing_columns: Vec<String>,
    pub row_count: usize,
    pub column_count: usize,
}

impl ValidationReport {
    pub fn check<S: AsRef<str>>(table: &Table, required: Option<&[S]>) -> Self {
        Self {
            missing_columns: missing_columns(table, required),
            row_count: table.row_count(),
            column_count: table.column_count(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing_columns.is_empty() && self.row_count > 0
    }
}

pub fn execute(args: &ValidateArgs, encoding: &'static Encoding) -> Result<()> {
    let required = if args.required.is_empty() {
        DEFAULT_REQUIRED.iter().map(|s| s.to_string()).collect()
    } else {
        args.required
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    let report = validate_file(&args.input, &required, encoding)?;
    if !report.missing_columns.is_empty() {
        error!(
            "{:?} is missing required column(s): {}",
            args.input,
            report.missing_columns.join(", ")
        );
    }
    if report.row_count == 0 {
        error!("{:?} has zero rows", args.input);
    }
    if !report.is_valid() {
        bail!("Validation failed for {:?}", args.input);
    }
    info!(
        "Validation OK: {} row(s), {} column(s) in {:?}",
        report.row_count, report.column_count, args.input
    );
    Ok(())
}

pub fn validate_file(
    path: &Path,
    required: &[String],
    encoding: &'static Encoding,
) -> Result<ValidationReport> {
    let table = loader::load(path, encoding).with_context(|| format!("Loading {path:?}"))?;
    Ok(ValidationReport::check(&table, Some(required)))
}
