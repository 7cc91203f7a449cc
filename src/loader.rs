//! Safe CSV loading with classified failures.
//!
//! A load either yields a fully parsed [`Table`] or one of the [`LoadError`]
//! kinds; no partially read table ever escapes.

use std::{
    fs,
    io::{self, ErrorKind},
    path::Path,
};

use encoding_rs::Encoding;
use log::{debug, error};

use crate::{error::LoadError, io_utils, table::Table};

pub fn load(path: &Path, encoding: &'static Encoding) -> Result<Table, LoadError> {
    let bytes = fs::read(path).map_err(|err| classify_io(path, err))?;
    let text = io_utils::decode_bytes(&bytes, encoding).ok_or_else(|| {
        error!("load: encoding error reading {path:?}");
        LoadError::Encoding {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        }
    })?;
    if text.trim().is_empty() {
        error!("load: empty data file: {path:?}");
        return Err(LoadError::EmptyData {
            path: path.to_path_buf(),
        });
    }

    let table = parse_table(path, text.as_bytes())?;
    debug!(
        "load: {} row(s), {} column(s) from {path:?}",
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

fn parse_table(path: &Path, text: &[u8]) -> Result<Table, LoadError> {
    let mut reader = io_utils::open_csv_reader(text);
    let headers = reader
        .headers()
        .map_err(|err| parse_error(path, err))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    // Short rows are padded by `Table::new`; long rows are rejected.
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| parse_error(path, err))?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            error!("load: parser error reading {path:?}: line {line} is too long");
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                message: format!(
                    "line {line}: expected {} field(s), found {}",
                    headers.len(),
                    record.len()
                ),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table::new(headers, rows))
}

fn classify_io(path: &Path, err: io::Error) -> LoadError {
    let path = path.to_path_buf();
    match err.kind() {
        ErrorKind::NotFound => {
            debug!("load: file not found: {path:?}");
            LoadError::NotFound { path }
        }
        ErrorKind::PermissionDenied => {
            error!("load: permission denied for {path:?}");
            LoadError::PermissionDenied { path }
        }
        _ => {
            error!("load: unexpected error reading {path:?}: {err}");
            LoadError::Unexpected {
                path,
                message: err.to_string(),
            }
        }
    }
}

fn parse_error(path: &Path, err: csv::Error) -> LoadError {
    error!("load: parser error reading {path:?}: {err}");
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => format!(
            "line {}: expected {expected_len} field(s), found {len}",
            pos.as_ref().map(|p| p.line()).unwrap_or_default()
        ),
        _ => err.to_string(),
    };
    LoadError::Parse {
        path: path.to_path_buf(),
        message,
    }
}
