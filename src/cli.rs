use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::variant::{Domain, Layout};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert utility reading spreadsheets into SQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a spreadsheet into INSERT statements
    Convert(ConvertArgs),
    /// Preview the decoded records before importing
    Preview(PreviewArgs),
    /// Submit the decoded records to the remote store in batches
    Submit(SubmitArgs),
    /// List the built-in import variants
    Variants(VariantsArgs),
}

/// Options selecting and overriding the import configuration, shared by
/// every command that reads a spreadsheet.
#[derive(Debug, Args)]
pub struct ImportOpts {
    /// Built-in or file-defined import variant name
    #[arg(short = 'v', long = "variant")]
    pub variant: Option<String>,
    /// YAML file defining additional variants
    #[arg(long = "variants-file")]
    pub variants_file: Option<PathBuf>,
    /// Target table name (overrides the variant default)
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// Ordered field list for custom imports (comma separated, repeatable)
    #[arg(short = 'F', long = "fields", action = clap::ArgAction::Append)]
    pub fields: Vec<String>,
    /// Source layout (row-per-record or column-per-record)
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,
    /// Utility domain; wastewater imports upsert on the date field
    #[arg(long, value_enum)]
    pub domain: Option<Domain>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input spreadsheet (.xlsx/.xls, or .csv where the variant allows it)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output .sql file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub import: ImportOpts,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input spreadsheet to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of records to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    #[command(flatten)]
    pub import: ImportOpts,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Input spreadsheet to submit
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Base URL of the remote store
    #[arg(long)]
    pub url: String,
    /// API key (falls back to the LECTURAS_API_KEY environment variable)
    #[arg(long = "api-key")]
    pub api_key: Option<String>,
    #[command(flatten)]
    pub import: ImportOpts,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct VariantsArgs {
    /// Also list variants defined in this YAML file
    #[arg(long = "variants-file")]
    pub variants_file: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
