use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    analysis::DEFAULT_ANALYSIS_FILE,
    export::DEFAULT_EXPORT_FILE,
    query::{QueryCommand, Selection},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Retail sales analytics over CSV exports", long_about = None)]
pub struct Cli {
    /// YAML configuration file (defaults apply to anything it omits)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding the source CSV files
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "encoding", global = true)]
    pub encoding: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export the fused sales table as a flat CSV for BI tools
    Export(ExportArgs),
    /// Look up sales by customer, city or category
    Query(QueryArgs),
    /// Produce the text report and/or JSON statistics
    Report(ReportArgs),
    /// Summarize several CSV files independently
    Analyze(AnalyzeArgs),
    /// Check a CSV file for required columns and at least one row
    Validate(ValidateArgs),
    /// Build (or reuse) the categorized product cache and print it
    Categorize(CategorizeArgs),
    /// Write the default configuration as YAML
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Destination CSV file
    #[arg(short = 'o', long = "output", default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,
    /// Gzip the export (appends .gz to the file name)
    #[arg(long)]
    pub gzip: bool,
    /// Omit the UTF-8 byte-order mark
    #[arg(long = "no-bom")]
    pub no_bom: bool,
    /// Delete the product cache and recategorize before exporting
    #[arg(long = "rebuild-cache")]
    pub rebuild_cache: bool,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub kind: QueryKind,
    /// Delete the product cache and recategorize before querying
    #[arg(long = "rebuild-cache", global = true)]
    pub rebuild_cache: bool,
}

#[derive(Debug, Subcommand)]
pub enum QueryKind {
    /// Rows whose customer name contains TERM (case and accent insensitive)
    Customer { term: String },
    /// Rows for a city, by name or by its number in `query cities`
    City { selection: String },
    /// Rows for a category, by name or by its number in `query categories`
    Category { selection: String },
    /// Per-product totals for customers matching TERM
    Summary { term: String },
    /// List known cities
    Cities,
    /// List known categories
    Categories,
}

impl QueryKind {
    pub fn to_command(&self) -> QueryCommand {
        match self {
            QueryKind::Customer { term } => QueryCommand::Customer { term: term.clone() },
            QueryKind::City { selection } => QueryCommand::City(Selection::parse(selection)),
            QueryKind::Category { selection } => {
                QueryCommand::Category(Selection::parse(selection))
            }
            QueryKind::Summary { term } => QueryCommand::Summary { term: term.clone() },
            QueryKind::Cities => QueryCommand::ListCities,
            QueryKind::Categories => QueryCommand::ListCategories,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Write the text report here instead of printing it
    #[arg(long = "text")]
    pub text: Option<PathBuf>,
    /// Write JSON statistics here
    #[arg(long = "json")]
    pub json: Option<PathBuf>,
    /// Delete the product cache and recategorize first
    #[arg(long = "rebuild-cache")]
    pub rebuild_cache: bool,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// CSV files to analyse
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
    /// Destination JSON file
    #[arg(short = 'o', long = "output", default_value = DEFAULT_ANALYSIS_FILE)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// CSV file to validate
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Required columns (comma separated or repeated); defaults to fecha,importe,id_cliente
    #[arg(long = "required", action = clap::ArgAction::Append)]
    pub required: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CategorizeArgs {
    /// Delete the product cache and recategorize
    #[arg(long = "rebuild-cache")]
    pub rebuild_cache: bool,
    /// Print at most this many products
    #[arg(long = "limit")]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output", default_value = "tienda.yaml")]
    pub output: PathBuf,
}
