//! Load → prepare → enrich → fuse, driven by [`AnalyticsConfig`].

use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    config::AnalyticsConfig,
    enrich::{self, CacheOrigin},
    error::LoadError,
    fusion::{self, FusedTable, FusionOptions},
    loader, model,
    table::Table,
};

/// The four inputs after date preparation and product enrichment.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub customers: Table,
    pub products: Table,
    pub sales: Table,
    pub lines: Table,
}

pub fn load_sources(
    config: &AnalyticsConfig,
    encoding: &'static Encoding,
    rebuild_cache: bool,
) -> Result<SourceTables> {
    let lines = load_required(&config.lines_path(), encoding, "sale lines")?;
    let mut sales = load_required(&config.sales_path(), encoding, "sales")?;
    model::prepare_sales(&mut sales, config.sale_date_formats.as_slice());

    let mut customers = load_optional(&config.customers_path(), encoding, "customers")?;
    model::prepare_customers(
        &mut customers,
        config.signup_date_formats.as_slice(),
        config.signup_fallback_date,
    );

    let products = load_products(config, encoding, rebuild_cache)?;
    Ok(SourceTables {
        customers,
        products,
        sales,
        lines,
    })
}

/// Builds the fused table, failing when fusion yields nothing to analyse.
pub fn build_fused_table(
    config: &AnalyticsConfig,
    encoding: &'static Encoding,
    rebuild_cache: bool,
) -> Result<FusedTable> {
    let sources = load_sources(config, encoding, rebuild_cache)?;
    let options = FusionOptions {
        default_customer_label: config.default_customer_label.clone(),
        default_category: config.default_category.clone(),
    };
    let fused = fusion::fuse(
        &sources.lines,
        &sources.sales,
        &sources.products,
        &sources.customers,
        &options,
    );
    if fused.is_empty() {
        bail!(
            "No fused sales data from {:?} and {:?}",
            config.lines_path(),
            config.sales_path()
        );
    }
    Ok(fused)
}

/// Enriched products from the cache (building it on first use). Missing
/// product data leaves product fields blank instead of aborting.
pub fn load_products(
    config: &AnalyticsConfig,
    encoding: &'static Encoding,
    rebuild_cache: bool,
) -> Result<Table> {
    let cache = config.cache_path();
    if rebuild_cache {
        enrich::invalidate_cache(&cache)?;
    }
    let rules = config.rule_table();
    match enrich::load_or_build_enriched_products(&config.products_path(), &cache, &rules, encoding) {
        Ok(enriched) => {
            if enriched.origin == CacheOrigin::Built {
                info!("Product cache rebuilt with {} rule(s)", rules.len());
            }
            Ok(enriched.table)
        }
        Err(err) => match err.downcast_ref::<LoadError>() {
            Some(load_err) if load_err.is_absent_data() => {
                warn!("No product data ({load_err}); product fields will be blank");
                Ok(Table::empty())
            }
            _ => Err(err),
        },
    }
}

fn load_required(path: &Path, encoding: &'static Encoding, label: &str) -> Result<Table> {
    let table = loader::load(path, encoding).with_context(|| format!("Loading {label}"))?;
    info!("Loaded {} {label} row(s) from {path:?}", table.row_count());
    Ok(table)
}

fn load_optional(path: &Path, encoding: &'static Encoding, label: &str) -> Result<Table> {
    match loader::load(path, encoding) {
        Ok(table) => {
            info!("Loaded {} {label} row(s) from {path:?}", table.row_count());
            Ok(table)
        }
        Err(err) if err.is_absent_data() => {
            warn!("No {label} data ({err}); continuing without it");
            Ok(Table::empty())
        }
        Err(err) => Err(err).with_context(|| format!("Loading {label}")),
    }
}
