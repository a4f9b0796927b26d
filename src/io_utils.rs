//! File-level plumbing shared by the commands: extension and encoding
//! resolution, CSV reader construction, and SQL text output. All input
//! decoding flows through `encoding_rs`; generated SQL is always UTF-8.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_csv_delimiter(provided: Option<u8>) -> u8 {
    provided.unwrap_or(DEFAULT_CSV_DELIMITER)
}

/// CSV input is read headerless: the grid keeps every physical row and
/// the layout reader decides what the first row or column means.
pub fn open_csv_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {}", path.display()))?,
        ))
    };
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    Ok(builder.from_reader(reader))
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Writes the generated SQL to the output file, or stdout when no path
/// (or `-`) is given. Output is UTF-8 with a trailing newline.
pub fn write_sql_output(path: Option<&Path>, sql: &str) -> Result<()> {
    match path {
        Some(p) if !is_dash(p) => {
            let mut file =
                File::create(p).with_context(|| format!("Creating output file {}", p.display()))?;
            writeln!(file, "{sql}").with_context(|| format!("Writing SQL to {}", p.display()))?;
        }
        _ => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{sql}").context("Writing SQL to stdout")?;
        }
    }
    Ok(())
}
