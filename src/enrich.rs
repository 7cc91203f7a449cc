//! Enriched product table with an on-disk cache.
//!
//! The first run categorizes every product and persists the result next to a
//! `.sha256` sidecar holding the rule-table fingerprint. Later runs return the
//! cached table untouched, even if the rules have changed since; a mismatching
//! fingerprint only produces a warning. Deleting the cache is the one way to
//! force recategorization.
//!
//! The cache is always UTF-8; the configured encoding applies to the source
//! product file only.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::{info, warn};

use crate::{atomic, io_utils, loader, model, rules::RuleTable, table::Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    /// Read back from an existing cache file.
    Cached,
    /// Computed from the source table and written to the cache.
    Built,
}

#[derive(Debug, Clone)]
pub struct EnrichedProducts {
    pub table: Table,
    pub origin: CacheOrigin,
}

pub fn load_or_build_enriched_products(
    source: &Path,
    cache: &Path,
    rules: &RuleTable,
    encoding: &'static Encoding,
) -> Result<EnrichedProducts> {
    if cache.exists() {
        info!("Using product cache {cache:?}");
        let table = loader::load(cache, UTF_8)?;
        check_fingerprint(cache, rules);
        return Ok(EnrichedProducts {
            table,
            origin: CacheOrigin::Cached,
        });
    }

    info!("Building product cache {cache:?} from {source:?}");
    let source_table = loader::load(source, encoding)?;
    let table = enrich_products(&source_table, rules)
        .with_context(|| format!("Categorizing products from {source:?}"))?;
    write_cache(&table, cache)?;
    atomic::write_text_atomic(&format!("{}\n", rules.fingerprint()), &fingerprint_path(cache))?;
    info!(
        "Categorized {} product(s) into {:?}",
        table.row_count(),
        cache
    );
    Ok(EnrichedProducts {
        table,
        origin: CacheOrigin::Built,
    })
}

/// Adds (or overwrites) the `categoria` column from `nombre_producto`.
pub fn enrich_products(products: &Table, rules: &RuleTable) -> Result<Table> {
    let names = products
        .column(model::NOMBRE_PRODUCTO)
        .ok_or_else(|| anyhow!("Product table has no '{}' column", model::NOMBRE_PRODUCTO))?;
    let categories = names
        .map(|name| rules.category_of(name).to_string())
        .collect::<Vec<_>>();
    let mut enriched = products.clone();
    enriched.set_column(model::CATEGORIA, categories);
    Ok(enriched)
}

/// Removes the cache and its fingerprint. Missing files are not an error.
pub fn invalidate_cache(cache: &Path) -> Result<()> {
    for path in [cache.to_path_buf(), fingerprint_path(cache)] {
        match fs::remove_file(&path) {
            Ok(()) => info!("Removed {path:?}"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err).with_context(|| format!("Removing {path:?}")),
        }
    }
    Ok(())
}

pub fn fingerprint_path(cache: &Path) -> PathBuf {
    let mut name = cache.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

fn write_cache(table: &Table, cache: &Path) -> Result<()> {
    atomic::write_atomic(cache, |writer| {
        let mut csv = io_utils::csv_writer(writer);
        csv.write_record(table.headers())?;
        for row in table.rows() {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    })
    .with_context(|| format!("Writing product cache {cache:?}"))
}

fn check_fingerprint(cache: &Path, rules: &RuleTable) {
    let sidecar = fingerprint_path(cache);
    match fs::read_to_string(&sidecar) {
        Ok(stored) if stored.trim() == rules.fingerprint() => {}
        Ok(_) => warn!(
            "Product cache {cache:?} was built with different category rules; delete it to recategorize"
        ),
        Err(_) => warn!(
            "Product cache {cache:?} has no rule fingerprint; categories may be stale"
        ),
    }
}
