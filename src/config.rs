//! Run configuration.
//!
//! Defaults mirror the store's historical layout (`data/clientes.csv`, ...).
//! A YAML file can override any field; command-line flags override the file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    atomic,
    rules::{CategoryRule, DEFAULT_CATEGORY, RuleTable},
};

pub const DEFAULT_CUSTOMER_LABEL: &str = "NO DEFINIDO";
pub const DEFAULT_RESULT_LIMIT: usize = 50;
pub const DEFAULT_SUMMARY_TOP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub data_dir: PathBuf,
    pub customers_file: String,
    pub products_file: String,
    pub sales_file: String,
    pub lines_file: String,
    /// Enriched product cache, relative to `data_dir` unless absolute.
    pub product_cache: PathBuf,
    pub encoding: String,
    pub sale_date_formats: Vec<String>,
    pub signup_date_formats: Vec<String>,
    pub signup_fallback_date: NaiveDate,
    pub default_customer_label: String,
    pub default_category: String,
    pub result_limit: usize,
    pub summary_top: usize,
    pub query_log: Option<PathBuf>,
    /// Replaces the built-in categorization rules when present. Order matters.
    pub rules: Option<Vec<CategoryRule>>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            customers_file: "clientes.csv".to_string(),
            products_file: "productos.csv".to_string(),
            sales_file: "ventas.csv".to_string(),
            lines_file: "detalle_ventas.csv".to_string(),
            product_cache: PathBuf::from("productos_enriquecido.csv"),
            encoding: "utf-8".to_string(),
            sale_date_formats: vec!["%m-%d-%y".to_string(), "%Y-%m-%d".to_string()],
            signup_date_formats: vec!["%d-%m-%y".to_string(), "%Y-%m-%d".to_string()],
            signup_fallback_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            default_customer_label: DEFAULT_CUSTOMER_LABEL.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
            result_limit: DEFAULT_RESULT_LIMIT,
            summary_top: DEFAULT_SUMMARY_TOP,
            query_log: None,
            rules: None,
        }
    }
}

impl AnalyticsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing config")?;
        atomic::write_text_atomic(&serialized, path)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join(&self.customers_file)
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join(&self.products_file)
    }

    pub fn sales_path(&self) -> PathBuf {
        self.data_dir.join(&self.sales_file)
    }

    pub fn lines_path(&self) -> PathBuf {
        self.data_dir.join(&self.lines_file)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.product_cache)
    }

    pub fn rule_table(&self) -> RuleTable {
        match &self.rules {
            Some(rules) => RuleTable::new(rules.clone(), self.default_category.clone()),
            None => RuleTable::new(crate::rules::builtin_rules(), self.default_category.clone()),
        }
    }
}
