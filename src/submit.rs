//! Persistence submitter: pushes typed records to the remote store in
//! fixed-size batches. Each batch first tries the bulk-insert remote
//! procedure; when the store reports that procedure as missing, the
//! batch falls back to a direct table insert. Any other failure aborts
//! the remaining batches. Submission is the only asynchronous sequence
//! in the binary; the CLI handler blocks on it with a current-thread
//! runtime.

use std::{env, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::{
    cli::SubmitArgs, error::ImportError, grid, io_utils, layout, record::Record, variant,
};

pub const BATCH_SIZE: usize = 50;
pub const BATCH_PAUSE_MS: u64 = 100;

const API_KEY_ENV: &str = "LECTURAS_API_KEY";

/// Failure kinds a sink can report. The submitter selects the fallback
/// path by inspecting the kind, never by downcasting transport errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("the bulk-insert procedure is missing: {0}")]
    MissingProcedure(String),
    #[error("{0}")]
    Remote(String),
}

/// Remote bulk-insert sink with a preferred procedure path and a direct
/// table-insert fallback, both taking the same record shape.
#[allow(async_fn_in_trait)]
pub trait BulkSink {
    async fn procedure_insert(&self, table: &str, rows: &[Record]) -> Result<(), SinkError>;
    async fn table_insert(&self, table: &str, rows: &[Record]) -> Result<(), SinkError>;
}

/// Drives one submission: sequential batches of [`BATCH_SIZE`] with a
/// [`BATCH_PAUSE_MS`] pause in between, cumulative progress after every
/// committed batch, and an in-flight flag rejecting re-entrant use.
#[derive(Debug, Default)]
pub struct Submitter {
    in_flight: bool,
}

impl Submitter {
    pub fn new() -> Self {
        Submitter::default()
    }

    pub async fn submit<S: BulkSink>(
        &mut self,
        sink: &S,
        table: &str,
        records: &[Record],
        progress: &mut dyn FnMut(usize),
    ) -> Result<usize, ImportError> {
        if self.in_flight {
            return Err(ImportError::submission(
                "A submission is already in flight",
            ));
        }
        self.in_flight = true;
        let outcome = run_batches(sink, table, records, progress).await;
        self.in_flight = false;
        outcome
    }
}

async fn run_batches<S: BulkSink>(
    sink: &S,
    table: &str,
    records: &[Record],
    progress: &mut dyn FnMut(usize),
) -> Result<usize, ImportError> {
    let total = records.len();
    let mut inserted = 0usize;
    for (batch_index, batch) in records.chunks(BATCH_SIZE).enumerate() {
        if batch_index > 0 {
            tokio::time::sleep(Duration::from_millis(BATCH_PAUSE_MS)).await;
        }
        match sink.procedure_insert(table, batch).await {
            Ok(()) => {}
            Err(SinkError::MissingProcedure(detail)) => {
                debug!("Procedure path unavailable for '{table}': {detail}");
                sink.table_insert(table, batch)
                    .await
                    .map_err(|err| submission_error(table, true, &err))?;
            }
            Err(err) => return Err(submission_error(table, false, &err)),
        }
        inserted += batch.len();
        progress(inserted);
        info!("Inserted {inserted}/{total} record(s) into '{table}'");
    }
    Ok(inserted)
}

fn submission_error(table: &str, procedure_was_missing: bool, err: &SinkError) -> ImportError {
    let mut message = format!("Submitting to '{table}' failed: {err}");
    if procedure_was_missing || matches!(err, SinkError::MissingProcedure(_)) {
        message.push_str(&format!(
            "\n\nThe remote store has no bulk-insert procedure for '{table}'. Create it with:\n\n{}",
            remediation_sql(table)
        ));
    }
    ImportError::Submission(message)
}

pub fn procedure_name(table: &str) -> String {
    format!("bulk_insert_{table}")
}

/// SQL the operator can run to create the missing procedure.
pub fn remediation_sql(table: &str) -> String {
    format!(
        "CREATE OR REPLACE FUNCTION {proc}(rows jsonb)\nRETURNS void\nLANGUAGE sql\nAS $$\n  INSERT INTO {table}\n  SELECT * FROM jsonb_populate_recordset(NULL::{table}, rows);\n$$;",
        proc = procedure_name(table)
    )
}

/// PostgREST-style HTTP sink: `POST /rest/v1/rpc/bulk_insert_<table>`
/// with a `rows` payload, falling back to `POST /rest/v1/<table>` with
/// the bare record array.
pub struct HttpSink {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSink {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        HttpSink {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn classify(response: reqwest::Response) -> Result<(), SinkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND && looks_like_missing_procedure(&body) {
            Err(SinkError::MissingProcedure(body))
        } else {
            Err(SinkError::Remote(format!("{status}: {body}")))
        }
    }
}

fn looks_like_missing_procedure(body: &str) -> bool {
    body.contains("PGRST202") || body.contains("Could not find the function")
}

impl BulkSink for HttpSink {
    async fn procedure_insert(&self, table: &str, rows: &[Record]) -> Result<(), SinkError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, procedure_name(table));
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({ "rows": rows }))
            .send()
            .await
            .map_err(|err| SinkError::Remote(err.to_string()))?;
        Self::classify(response).await
    }

    async fn table_insert(&self, table: &str, rows: &[Record]) -> Result<(), SinkError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|err| SinkError::Remote(err.to_string()))?;
        Self::classify(response).await
    }
}

/// CLI entry point for the `submit` command.
pub fn execute(args: &SubmitArgs) -> Result<()> {
    let config = variant::resolve(&args.import)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let parsed = grid::load(&args.input, &config, args.delimiter, encoding)?;
    let extraction = layout::extract(&parsed, &config)?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| env::var(API_KEY_ENV).ok())
        .ok_or_else(|| anyhow!("An API key is required (--api-key or {API_KEY_ENV})"))?;
    let sink = HttpSink::new(&args.url, api_key);

    let total = extraction.records.len();
    info!(
        "Submitting {total} record(s) from sheet '{}' to '{}' in batches of {BATCH_SIZE}",
        parsed.sheet_name(),
        config.table
    );
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Building async runtime")?;
    let mut submitter = Submitter::new();
    let inserted = runtime.block_on(submitter.submit(
        &sink,
        &config.table,
        &extraction.records,
        &mut |done| debug!("Progress: {done}/{total}"),
    ))?;
    info!(
        "Submission complete: {inserted} record(s) inserted into '{}'",
        config.table
    );
    Ok(())
}
