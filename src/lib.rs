pub mod cli;
pub mod convert;
pub mod error;
pub mod format;
pub mod grid;
pub mod io_utils;
pub mod layout;
pub mod preview;
pub mod record;
pub mod statement;
pub mod submit;
pub mod variant;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("lecturas", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => convert::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Submit(args) => submit::execute(&args),
        Commands::Variants(args) => handle_variants(&args),
    }
}

fn handle_variants(args: &cli::VariantsArgs) -> Result<()> {
    let mut variants = variant::builtins();
    if let Some(path) = &args.variants_file {
        for (name, config) in variant::load_variant_file(path)? {
            variants.retain(|(existing, _)| *existing != name);
            variants.push((name, config));
        }
    }

    let headers: Vec<String> = ["name", "table", "layout", "domain", "fields"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows: Vec<Vec<String>> = variants
        .iter()
        .map(|(name, config)| {
            vec![
                name.clone(),
                config.table.clone(),
                config.layout.to_string(),
                config.domain.to_string(),
                config.fields.join(", "),
            ]
        })
        .collect();
    print!("{}", preview::render_table(&headers, &rows));
    info!("Listed {} variant(s)", rows.len());
    Ok(())
}
