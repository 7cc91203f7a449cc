pub mod analysis;
pub mod atomic;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod data;
pub mod enrich;
pub mod error;
pub mod export;
pub mod fusion;
pub mod io_utils;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod rules;
pub mod table;
pub mod validate;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use encoding_rs::Encoding;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    config::AnalyticsConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tienda_analytics", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let encoding = resolve_encoding(&cli, &config)?;
    match &cli.command {
        Commands::Export(args) => handle_export(args, &config, encoding),
        Commands::Query(args) => handle_query(args, &config, encoding),
        Commands::Report(args) => {
            let fused = pipeline::build_fused_table(&config, encoding, args.rebuild_cache)?;
            report::execute(&fused, args, config.summary_top)
        }
        Commands::Analyze(args) => analysis::execute(args, encoding),
        Commands::Validate(args) => validate::execute(args, encoding),
        Commands::Categorize(args) => handle_categorize(args, &config, encoding),
        Commands::InitConfig(args) => handle_init_config(args, &config),
    }
}

/// Config file (or defaults), then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<AnalyticsConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(label) = &cli.encoding {
        config.encoding = label.clone();
    }
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn resolve_encoding(cli: &Cli, config: &AnalyticsConfig) -> Result<&'static Encoding> {
    io_utils::resolve_encoding(Some(&config.encoding))
        .with_context(|| match &cli.config {
            Some(path) => format!("Resolving encoding from {path:?}"),
            None => "Resolving input encoding".to_string(),
        })
}

fn handle_export(
    args: &cli::ExportArgs,
    config: &AnalyticsConfig,
    encoding: &'static Encoding,
) -> Result<()> {
    let fused = pipeline::build_fused_table(config, encoding, args.rebuild_cache)?;
    let options = export::ExportOptions {
        gzip: args.gzip,
        bom: !args.no_bom,
    };
    let written = export::export(&fused, &args.output, &options)?;
    println!("{}", written.display());
    Ok(())
}

fn handle_query(
    args: &cli::QueryArgs,
    config: &AnalyticsConfig,
    encoding: &'static Encoding,
) -> Result<()> {
    let fused = pipeline::build_fused_table(config, encoding, args.rebuild_cache)?;
    let command = args.kind.to_command();
    debug!("Query: {command:?}");
    query::execute(&fused, &command, config)
}

fn handle_categorize(
    args: &cli::CategorizeArgs,
    config: &AnalyticsConfig,
    encoding: &'static Encoding,
) -> Result<()> {
    let products = pipeline::load_products(config, encoding, args.rebuild_cache)?;
    if products.is_empty() {
        info!("No products to categorize");
        return Ok(());
    }
    print!("{}", products.render(args.limit));
    info!(
        "{} product(s) categorized; cache at {:?}",
        products.row_count(),
        config.cache_path()
    );
    Ok(())
}

fn handle_init_config(args: &cli::InitConfigArgs, config: &AnalyticsConfig) -> Result<()> {
    let mut defaults = config.clone();
    if defaults.rules.is_none() {
        defaults.rules = Some(rules::builtin_rules());
    }
    defaults
        .save(&args.output)
        .with_context(|| format!("Writing configuration to {:?}", args.output))?;
    info!("Configuration written to {:?}", args.output);
    Ok(())
}
