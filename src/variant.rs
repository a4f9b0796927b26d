//! Import variants: the configuration surface of the pipeline. A
//! variant fixes the target table, the ordered field list, the source
//! layout, the domain tag (which drives the conflict policy), and the
//! file-type whitelist. Built-ins mirror the historical import pages;
//! additional variants load from a YAML file.

use std::{collections::BTreeMap, fmt, fs, path::Path};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{cli::ImportOpts, error::ImportError};

/// Orientation convention of the source spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum Layout {
    /// One row per observation; the first row is a header.
    Row,
    /// One column per reporting period; column A holds labels.
    Column,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Row => f.write_str("row-per-record"),
            Layout::Column => f.write_str("column-per-record"),
        }
    }
}

/// Utility domain the data belongs to. Wastewater imports replace
/// existing rows for the same date instead of failing on duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum Domain {
    Water,
    Gas,
    Wastewater,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Water => f.write_str("water"),
            Domain::Gas => f.write_str("gas"),
            Domain::Wastewater => f.write_str("wastewater"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub table: String,
    pub fields: Vec<String>,
    pub layout: Layout,
    pub domain: Domain,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["xlsx".to_string(), "xls".to_string()]
}

impl ImportConfig {
    /// Conflict policy follows the domain tag.
    pub fn upsert(&self) -> bool {
        self.domain == Domain::Wastewater
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.table.trim().is_empty() {
            return Err(ImportError::validation("A target table name is required"));
        }
        if self.fields.is_empty() {
            return Err(ImportError::validation(
                "The import needs at least one field",
            ));
        }
        Ok(())
    }
}

fn preset(
    table: &str,
    layout: Layout,
    domain: Domain,
    fields: &[&str],
    extensions: &[&str],
) -> ImportConfig {
    ImportConfig {
        table: table.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
        layout,
        domain,
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
    }
}

/// Built-in variants, one per historical import page.
pub fn builtins() -> Vec<(String, ImportConfig)> {
    vec![
        (
            "consumo".to_string(),
            preset(
                "consumo_agua",
                Layout::Column,
                Domain::Water,
                &[
                    "fecha",
                    "produccion_m3",
                    "consumo_m3",
                    "perdidas_m3",
                    "cobertura_pct",
                ],
                &["xlsx", "xls"],
            ),
        ),
        (
            "pozos".to_string(),
            preset(
                "pozos",
                Layout::Row,
                Domain::Water,
                &[
                    "fecha",
                    "pozo",
                    "nivel_estatico",
                    "nivel_dinamico",
                    "caudal_lps",
                    "horas_bombeo",
                ],
                &["xlsx", "xls", "csv"],
            ),
        ),
        (
            "gas".to_string(),
            preset(
                "consumo_gas",
                Layout::Row,
                Domain::Gas,
                &["fecha", "sector", "consumo_m3", "presion_kpa"],
                &["xlsx", "xls"],
            ),
        ),
        (
            "saneamiento".to_string(),
            preset(
                "calidad_descarga",
                Layout::Row,
                Domain::Wastewater,
                &["fecha", "ph", "dqo", "dbo5", "sst", "caudal_lps"],
                &["xlsx", "xls"],
            ),
        ),
    ]
}

/// Loads user-defined variants from a YAML map of name -> config.
pub fn load_variant_file(path: &Path) -> Result<BTreeMap<String, ImportConfig>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Opening variants file {}", path.display()))?;
    let variants: BTreeMap<String, ImportConfig> =
        serde_yaml::from_str(&raw).context("Parsing variants YAML")?;
    Ok(variants)
}

/// Resolves the effective configuration for one invocation: a named
/// variant (user file entries shadow built-ins) or a fully custom
/// config from flags, with flag overrides applied either way.
pub fn resolve(opts: &ImportOpts) -> Result<ImportConfig> {
    let mut config = match &opts.variant {
        Some(name) => lookup(name, opts.variants_file.as_deref())?,
        None => ImportConfig {
            table: String::new(),
            fields: Vec::new(),
            layout: opts.layout.unwrap_or(Layout::Row),
            domain: opts.domain.unwrap_or(Domain::Water),
            // Custom imports are not tied to a page; accept anything we can parse.
            extensions: vec![
                "xlsx".to_string(),
                "xls".to_string(),
                "xlsm".to_string(),
                "csv".to_string(),
            ],
        },
    };

    if let Some(table) = &opts.table {
        config.table = table.clone();
    }
    if let Some(layout) = opts.layout {
        config.layout = layout;
    }
    if let Some(domain) = opts.domain {
        config.domain = domain;
    }
    let fields = split_fields(&opts.fields);
    if !fields.is_empty() {
        config.fields = fields;
    }

    config.validate()?;
    Ok(config)
}

fn lookup(name: &str, variants_file: Option<&Path>) -> Result<ImportConfig> {
    if let Some(path) = variants_file {
        let user_variants = load_variant_file(path)?;
        if let Some(config) = user_variants.get(name) {
            return Ok(config.clone());
        }
    }
    builtins()
        .into_iter()
        .find(|(builtin_name, _)| builtin_name == name)
        .map(|(_, config)| config)
        .ok_or_else(|| ImportError::validation(format!("Unknown import variant '{name}'")).into())
}

fn split_fields(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(variant: Option<&str>) -> ImportOpts {
        ImportOpts {
            variant: variant.map(str::to_string),
            variants_file: None,
            table: None,
            fields: Vec::new(),
            layout: None,
            domain: None,
        }
    }

    #[test]
    fn builtin_variants_resolve_by_name() {
        let config = resolve(&opts(Some("saneamiento"))).expect("resolve builtin");
        assert_eq!(config.table, "calidad_descarga");
        assert_eq!(config.layout, Layout::Row);
        assert!(config.upsert());
        assert_eq!(config.fields[0], "fecha");
    }

    #[test]
    fn table_override_replaces_variant_default() {
        let mut options = opts(Some("pozos"));
        options.table = Some("pozos_2023".to_string());
        let config = resolve(&options).expect("resolve with override");
        assert_eq!(config.table, "pozos_2023");
        assert!(config.allows_extension("csv"));
    }

    #[test]
    fn custom_import_requires_table_and_fields() {
        let err = resolve(&opts(None)).expect_err("missing table");
        assert!(err.to_string().contains("table name"));

        let mut options = opts(None);
        options.table = Some("lecturas_gas".to_string());
        let err = resolve(&options).expect_err("missing fields");
        assert!(err.to_string().contains("at least one field"));

        options.fields = vec!["fecha,consumo_m3".to_string()];
        let config = resolve(&options).expect("custom config");
        assert_eq!(config.fields, vec!["fecha", "consumo_m3"]);
        assert_eq!(config.layout, Layout::Row);
        assert!(!config.upsert());
    }

    #[test]
    fn unknown_variant_is_a_validation_error() {
        let err = resolve(&opts(Some("telefonia"))).expect_err("unknown variant");
        assert!(err.to_string().contains("Unknown import variant"));
    }

    #[test]
    fn variant_file_entries_shadow_builtins() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "pozos:\n  table: pozos_historico\n  fields: [fecha, pozo, caudal_lps]\n  layout: row\n  domain: water\n"
        )
        .unwrap();

        let mut options = opts(Some("pozos"));
        options.variants_file = Some(file.path().to_path_buf());
        let config = resolve(&options).expect("resolve from file");
        assert_eq!(config.table, "pozos_historico");
        assert_eq!(config.fields.len(), 3);
        // Defaulted whitelist applies to file-defined variants.
        assert!(config.allows_extension("xlsx"));
        assert!(!config.allows_extension("csv"));
    }
}
