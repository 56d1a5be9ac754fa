//! Shared plumbing for the three export binaries
//! (`forex-export-latest`, `forex-export-ninety-days`,
//! `forex-export-historic`): argument parsing, a pluggable JSON encoder, and
//! the fetch-rebase-write pipeline each binary drives for its own feed kind.
//!
//! These are the "external collaborators" named at their interface only by
//! the core spec — thin callers of `forex-engine`, not part of the hard
//! core.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use forex_core::error::ForexError;
use forex_core::support;
use forex_engine::feed::{FeedKind, FeedOrchestrator};
use forex_engine::rebase;

/// Options shared by every export binary, matching spec.md §6's recognized
/// option keys (`base`, `symbols`, `output`) plus `--help` (clap-provided).
#[derive(Parser, Debug)]
#[command(version, about = "Export cached ECB reference rates to a JSON file")]
pub struct ExportArgs {
    /// Rebase target currency (ISO alpha code).
    #[arg(long, default_value = "EUR")]
    pub base: String,

    /// Comma-separated ISO alpha codes to restrict the output to.
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Directory the JSON file is written into; created if absent.
    #[arg(long, default_value = ".")]
    pub output: PathBuf,
}

/// A pluggable JSON encoder so an embedding caller can swap `serde_json` for
/// another encoder without touching the export pipeline (spec.md §6: "JSON
/// encoder is configurable").
pub trait JsonEncode {
    fn encode(&self, value: &serde_json::Value) -> Result<String, String>;
}

/// Default encoder: pretty-printed `serde_json`.
#[derive(Default)]
pub struct SerdeJsonEncode;

impl JsonEncode for SerdeJsonEncode {
    fn encode(&self, value: &serde_json::Value) -> Result<String, String> {
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())
    }
}

/// `tracing_subscriber::EnvFilter`-based setup, mirroring the ambient
/// logging stack carried into every binary entrypoint in this workspace.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Fetches `kind` directly from the feed (no cache: these are one-shot
/// processes, not the long-lived fetcher), applies symbol filtering then
/// rebasing to every day, encodes the result, and writes it to
/// `<output>/<file_stem>.json`.
pub async fn run_export(
    kind: FeedKind,
    file_stem: &str,
    args: &ExportArgs,
    encoder: &dyn JsonEncode,
) -> Result<PathBuf, ForexError> {
    let orchestrator = Arc::new(FeedOrchestrator::with_defaults(forex_core::config().feed_base_url.clone()));
    run_export_with_orchestrator(&orchestrator, kind, file_stem, args, encoder).await
}

/// Same pipeline as [`run_export`] but against a caller-supplied
/// orchestrator, so tests can inject a fixture `HttpFetch`/`XmlParse` pair
/// instead of reaching the network.
pub async fn run_export_with_orchestrator(
    orchestrator: &FeedOrchestrator,
    kind: FeedKind,
    file_stem: &str,
    args: &ExportArgs,
    encoder: &dyn JsonEncode,
) -> Result<PathBuf, ForexError> {
    let payload = orchestrator.fetch(kind).await?;

    let base = support::normalize_code(&args.base);
    let mut days = Vec::with_capacity(payload.len());
    for mut day in payload {
        let filtered = day.rates.filtered(&args.symbols);
        day.rates = rebase::rebase(&filtered, &base)?;
        day.base = base.clone();
        days.push(day);
    }

    let value = serde_json::to_value(&days)
        .map_err(|e| ForexError::Format(format!("failed to serialize rate sets: {e}")))?;
    let encoded = encoder
        .encode(&value)
        .map_err(|e| ForexError::Format(format!("failed to encode JSON: {e}")))?;

    std::fs::create_dir_all(&args.output)
        .map_err(|e| ForexError::Format(format!("failed to create output directory: {e}")))?;
    let path = args.output.join(format!("{file_stem}.json"));
    std::fs::write(&path, encoded)
        .map_err(|e| ForexError::Format(format!("failed to write {}: {e}", path.display())))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forex_core::error::FeedError;
    use forex_engine::HttpFetch;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
  <Cube>
    <Cube time='2024-11-08'>
      <Cube currency='USD' rate='1.0772'/>
      <Cube currency='GBP' rate='0.83188'/>
      <Cube currency='JPY' rate='164.18'/>
    </Cube>
  </Cube>
</gesmes:Envelope>"#;

    struct FixtureHttp;

    #[async_trait]
    impl HttpFetch for FixtureHttp {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, FeedError> {
            Ok(FIXTURE.as_bytes().to_vec())
        }
    }

    fn fixture_orchestrator() -> FeedOrchestrator {
        FeedOrchestrator::new(
            "https://example.invalid",
            Arc::new(FixtureHttp),
            Arc::new(forex_engine::QuickXmlParse),
        )
    }

    #[tokio::test]
    async fn exports_latest_rates_rebased_to_requested_base() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExportArgs { base: "USD".to_string(), symbols: Vec::new(), output: dir.path().to_path_buf() };

        let path = run_export_with_orchestrator(
            &fixture_orchestrator(),
            FeedKind::Latest,
            "latest_rates",
            &args,
            &SerdeJsonEncode,
        )
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("latest_rates.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value[0]["rates"]["USD"], "1");
        assert_eq!(value[0]["base"], "USD");
    }

    #[tokio::test]
    async fn exports_filtered_symbols_only() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExportArgs {
            base: "EUR".to_string(),
            symbols: vec!["USD".to_string(), "GBP".to_string()],
            output: dir.path().to_path_buf(),
        };

        let path = run_export_with_orchestrator(
            &fixture_orchestrator(),
            FeedKind::Latest,
            "latest_rates",
            &args,
            &SerdeJsonEncode,
        )
        .await
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        let rates = value[0]["rates"].as_object().unwrap();
        assert!(rates.contains_key("USD"));
        assert!(rates.contains_key("GBP"));
        assert!(!rates.contains_key("JPY"));
    }

    #[test]
    fn export_args_parse_defaults() {
        let args = ExportArgs::parse_from(["forex-export-latest"]);
        assert_eq!(args.base, "EUR");
        assert!(args.symbols.is_empty());
        assert_eq!(args.output, PathBuf::from("."));
    }

    #[test]
    fn export_args_parse_symbols_list() {
        let args = ExportArgs::parse_from(["forex-export-latest", "--symbols", "USD,GBP,JPY"]);
        assert_eq!(args.symbols, vec!["USD", "GBP", "JPY"]);
    }
}
