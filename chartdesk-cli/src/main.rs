//! ChartDesk CLI: batch commands over the charting core.
//!
//! Commands:
//! - `indicators`: compute indicator series for one symbol and print them as JSON
//! - `fetch`: pull bars from a provider and write them as CSV
//! - `alerts`: add, list, reset, delete and check price/indicator alert rules
//! - `workspace`: validate exported tab files, inspect the saved workspace
//! - `scan`: latest indicator readings and alert checks across a directory of CSV files

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use chartdesk_core::alerts::{
    self, AlertCondition, AlertRule, AlertStore, EvaluationContext, JsonFileAlertStore,
};
use chartdesk_core::config::AppConfig;
use chartdesk_core::data::{provider_for, read_bars, write_bars, DataSource};
use chartdesk_core::domain::{Bar, Series, Timeframe};
use chartdesk_core::indicators::{compute_active, ActiveIndicator, IndicatorKey, IndicatorSet};
use chartdesk_core::workspace::{self, WorkspaceRecord};

#[derive(Parser)]
#[command(name = "chartdesk", about = "ChartDesk CLI: indicators, bars, alerts and workspaces")]
struct Cli {
    /// Log progress to stderr (repeat for debug output).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file. Defaults to the platform config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where a command reads its bars from.
#[derive(clap::Args, Debug, Clone)]
struct BarSource {
    /// Read bars from this CSV file instead of a provider.
    #[arg(long, conflicts_with = "source")]
    csv: Option<PathBuf>,

    /// Provider: yahoo, csv, synthetic or sample. Defaults to the configured feed source.
    #[arg(long)]
    source: Option<DataSource>,

    /// Bar timeframe: 1m, 5m, 1h or 1d.
    #[arg(long, default_value = "1d")]
    timeframe: Timeframe,

    /// Number of bars to request. Defaults to the configured history length.
    #[arg(long)]
    bars: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicator series for a symbol and print them as JSON.
    Indicators {
        /// Symbol (e.g., SPY).
        symbol: String,

        /// Indicators to compute (sma, ema, rsi, macd, bbands). Defaults to all.
        #[arg(short, long = "indicator")]
        indicators: Vec<IndicatorKey>,

        /// Print only the latest value of each series.
        #[arg(long, default_value_t = false)]
        latest: bool,

        #[command(flatten)]
        bars: BarSource,
    },
    /// Fetch bars from a provider and write `<SYMBOL>_<timeframe>.csv` files.
    Fetch {
        /// Symbols to fetch.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Output directory. Defaults to the configured CSV directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        bars: BarSource,
    },
    /// Manage alert rules.
    Alerts {
        /// Alert file. Defaults to the platform config dir.
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(subcommand)]
        action: AlertAction,
    },
    /// Validate or inspect workspace files.
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },
    /// Latest indicator values (and alert checks) for every CSV file in a directory.
    Scan {
        /// Directory of `<SYMBOL>[_<timeframe>].csv` files.
        dir: PathBuf,

        /// Indicators to report. Defaults to all.
        #[arg(short, long = "indicator")]
        indicators: Vec<IndicatorKey>,

        /// Check these alert rules against each file (read-only).
        #[arg(long)]
        alerts: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AlertAction {
    /// Create a rule that fires when the value is at or above the threshold.
    Add {
        symbol: String,

        /// price, rsi, macd, or any indicator series name.
        #[arg(long, default_value = "price")]
        condition: String,

        #[arg(long)]
        threshold: String,

        /// Re-arm after the snooze interval instead of staying triggered.
        #[arg(long, default_value_t = false)]
        repeat: bool,
    },
    /// List rules with their status.
    List {
        /// Only this symbol's rules.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Re-arm a triggered rule.
    Reset { id: String },
    /// Delete a rule.
    Delete { id: String },
    /// Evaluate a symbol's rules against its latest bars and persist any that fire.
    Check {
        symbol: String,

        #[command(flatten)]
        bars: BarSource,
    },
}

#[derive(Subcommand)]
enum WorkspaceAction {
    /// Check exported tab files the way the importer does.
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Summarise the saved workspace.
    Inspect {
        /// Workspace file. Defaults to the platform config dir.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(|| default_path("config.toml"));
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    config.validate()?;
    debug!(path = %config_path.display(), source = %config.feed.source, "config loaded");

    match cli.command {
        Commands::Indicators {
            symbol,
            indicators,
            latest,
            bars,
        } => run_indicators(&config, &symbol, &indicators, latest, &bars),
        Commands::Fetch {
            symbols,
            out_dir,
            bars,
        } => run_fetch(&config, &symbols, out_dir, &bars),
        Commands::Alerts { file, action } => {
            let store = JsonFileAlertStore::new(file.unwrap_or_else(|| default_path("alerts.json")));
            run_alerts(&config, store, action)
        }
        Commands::Workspace { action } => match action {
            WorkspaceAction::Validate { files } => run_workspace_validate(&files),
            WorkspaceAction::Inspect { file } => {
                run_workspace_inspect(&file.unwrap_or_else(|| default_path("workspace.json")))
            }
        },
        Commands::Scan {
            dir,
            indicators,
            alerts,
        } => run_scan(&config, &dir, &indicators, alerts.as_deref()),
    }
}

/// Stderr logging; `CHARTDESK_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("CHARTDESK_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_path(file: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chartdesk")
        .join(file)
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        bail!("symbol must not be empty");
    }
    Ok(symbol)
}

fn load_bars(config: &AppConfig, symbol: &str, src: &BarSource) -> Result<Vec<Bar>> {
    if let Some(path) = &src.csv {
        let bars = read_bars(path).with_context(|| format!("reading {}", path.display()))?;
        info!(path = %path.display(), bars = bars.len(), "bars read");
        return Ok(bars);
    }
    let source = src.source.unwrap_or(config.feed.source);
    let count = src.bars.unwrap_or(config.feed.history_bars);
    let provider = provider_for(source, config.feed.seed, &config.feed.csv_dir())?;
    let fetched = provider.fetch(symbol, src.timeframe, count)?;
    info!(%symbol, %source, bars = fetched.bars.len(), "bars fetched");
    Ok(fetched.bars)
}

/// Selected keys as an active list; empty means every catalog indicator.
fn selection(keys: &[IndicatorKey]) -> Vec<ActiveIndicator> {
    if keys.is_empty() {
        IndicatorKey::ALL.iter().map(|k| k.to_active()).collect()
    } else {
        keys.iter().map(|k| k.to_active()).collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndicatorReport {
    symbol: String,
    timeframe: Timeframe,
    bar_count: usize,
    last_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<BTreeMap<String, Series>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<BTreeMap<String, f64>>,
}

fn latest_values(set: &IndicatorSet) -> BTreeMap<String, f64> {
    set.names()
        .filter_map(|name| set.latest(name).map(|v| (name.to_string(), v)))
        .collect()
}

fn run_indicators(
    config: &AppConfig,
    symbol: &str,
    keys: &[IndicatorKey],
    latest: bool,
    src: &BarSource,
) -> Result<()> {
    let symbol = normalize_symbol(symbol)?;
    let bars = load_bars(config, &symbol, src)?;
    let set = compute_active(&bars, &selection(keys), &config.indicators);

    let report = IndicatorReport {
        symbol,
        timeframe: src.timeframe,
        bar_count: bars.len(),
        last_close: bars.last().map(|b| b.close),
        series: (!latest).then(|| set.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()),
        latest: latest.then(|| latest_values(&set)),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_fetch(config: &AppConfig, symbols: &[String], out_dir: Option<PathBuf>, src: &BarSource) -> Result<()> {
    if src.csv.is_some() {
        bail!("--csv cannot be used with fetch; pick a --source");
    }
    let out_dir = out_dir.unwrap_or_else(|| config.feed.csv_dir());
    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut failed = Vec::new();
    for raw in symbols {
        let symbol = normalize_symbol(raw)?;
        let path = out_dir.join(format!("{symbol}_{}.csv", src.timeframe));
        match load_bars(config, &symbol, src).and_then(|bars| {
            write_bars(&path, &bars)?;
            Ok(bars.len())
        }) {
            Ok(n) => println!("{symbol}: {n} bars -> {}", path.display()),
            Err(e) => {
                eprintln!("Error for {symbol}: {e:#}");
                failed.push(symbol);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} symbol(s) failed: {}", failed.len(), symbols.len(), failed.join(", "));
    }
    Ok(())
}

fn run_alerts(config: &AppConfig, mut store: JsonFileAlertStore, action: AlertAction) -> Result<()> {
    let now = Utc::now();
    match action {
        AlertAction::Add {
            symbol,
            condition,
            threshold,
            repeat,
        } => {
            let symbol = normalize_symbol(&symbol)?;
            let threshold = alerts::parse_threshold(&threshold)?;
            let rule = AlertRule::new(symbol, AlertCondition::from(condition.as_str()), threshold, repeat, now);
            let rule = alerts::create_rule(&mut store, rule)?;
            println!("Created {} ({})", rule.id, rule.title());
        }
        AlertAction::List { symbol } => {
            let rules = match symbol {
                Some(s) => store.list_for(&normalize_symbol(&s)?)?,
                None => store.list()?,
            };
            if rules.is_empty() {
                println!("No alerts in {}", store.path().display());
            }
            for rule in &rules {
                print_rule(rule, now);
            }
        }
        AlertAction::Reset { id } => {
            let mut rule = find_rule(&store, &id)?;
            rule.reset();
            store.update(&rule)?;
            println!("Reset {}", rule.id);
        }
        AlertAction::Delete { id } => {
            if !store.delete(&id)? {
                bail!("no alert with id '{id}'");
            }
            println!("Deleted {id}");
        }
        AlertAction::Check { symbol, bars } => {
            let symbol = normalize_symbol(&symbol)?;
            let series = load_bars(config, &symbol, &bars)?;
            let set = compute_active(&series, &selection(&[]), &config.indicators);
            let ctx = EvaluationContext {
                symbol: &symbol,
                last_close: series.last().map(|b| b.close),
                indicators: &set,
                now,
            };
            let fired = alerts::evaluate_store(&mut store, &config.alerts.evaluator(), &ctx)?;
            if fired.is_empty() {
                println!("{symbol}: no alerts fired");
            }
            for n in &fired {
                println!("FIRED {}: {} ({})", n.rule_id, n.title, n.body);
            }
        }
    }
    Ok(())
}

fn find_rule(store: &JsonFileAlertStore, id: &str) -> Result<AlertRule> {
    match store.list()?.into_iter().find(|r| r.id == id) {
        Some(rule) => Ok(rule),
        None => bail!("no alert with id '{id}'"),
    }
}

fn print_rule(rule: &AlertRule, now: chrono::DateTime<Utc>) {
    println!(
        "{:<18} {:<8} {:<10} {}{}",
        rule.id,
        rule.symbol,
        rule.status(now).as_str(),
        rule.title(),
        if rule.repeat { " (repeat)" } else { "" }
    );
}

fn run_workspace_validate(files: &[PathBuf]) -> Result<()> {
    let mut invalid = 0usize;
    for path in files {
        let result = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|json| workspace::import(&json).map_err(anyhow::Error::from));
        match result {
            Ok(record) => println!("ok      {}  {}", path.display(), summarize(&record)),
            Err(e) => {
                invalid += 1;
                println!("invalid {}  {e}", path.display());
            }
        }
    }
    if invalid > 0 {
        bail!("{invalid} of {} file(s) invalid", files.len());
    }
    Ok(())
}

fn summarize(record: &WorkspaceRecord) -> String {
    let indicators: Vec<&str> = record.active_indicators.iter().map(|a| a.key.as_str()).collect();
    format!(
        "{} {} {}, {} drawing(s), indicators [{}]",
        record.display_label(),
        record.symbol,
        record.timeframe,
        record.drawings.len(),
        indicators.join(", ")
    )
}

fn run_workspace_inspect(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("No workspace at {}; the TUI starts with a single {} tab.", path.display(), workspace::DEFAULT_SYMBOL);
        return Ok(());
    }
    let tabs = workspace::load(path);
    println!("Workspace: {}", path.display());
    println!("Tabs:      {}", tabs.len());
    for (i, record) in tabs.tabs().iter().enumerate() {
        let marker = if i == tabs.active_index() { "*" } else { " " };
        println!(" {marker} {i}: {}", summarize(record));
    }
    Ok(())
}

/// Symbol from a file stem: `AAPL_1d` -> `AAPL`.
fn symbol_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let symbol = stem.split('_').next().unwrap_or(stem).trim().to_uppercase();
    (!symbol.is_empty()).then_some(symbol)
}

#[derive(Debug)]
struct ScanRow {
    symbol: String,
    bars: usize,
    latest: BTreeMap<String, f64>,
    fired: Vec<String>,
}

fn scan_file(config: &AppConfig, path: &Path, active: &[ActiveIndicator], rules: &[AlertRule]) -> Result<ScanRow> {
    let symbol = symbol_from_path(path).with_context(|| format!("no symbol in {}", path.display()))?;
    let bars = read_bars(path).with_context(|| format!("reading {}", path.display()))?;
    // Alert rules may watch any series, so compute them all when checking.
    let wanted = if rules.is_empty() { active.to_vec() } else { selection(&[]) };
    let set = compute_active(&bars, &wanted, &config.indicators);

    let mut rules: Vec<AlertRule> = rules.iter().filter(|r| r.symbol == symbol).cloned().collect();
    let ctx = EvaluationContext {
        symbol: &symbol,
        last_close: bars.last().map(|b| b.close),
        indicators: &set,
        now: Utc::now(),
    };
    let fired = config.alerts.evaluator().evaluate(&mut rules, &ctx);

    let shown: Vec<&str> = active
        .iter()
        .filter_map(ActiveIndicator::parsed_key)
        .flat_map(|k| k.series_names().iter().copied())
        .collect();
    let latest = latest_values(&set)
        .into_iter()
        .filter(|(name, _)| shown.contains(&name.as_str()))
        .collect();

    Ok(ScanRow {
        symbol,
        bars: bars.len(),
        latest,
        fired: fired.into_iter().map(|n| n.title).collect(),
    })
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();
    Ok(files)
}

fn run_scan(config: &AppConfig, dir: &Path, keys: &[IndicatorKey], alerts_file: Option<&Path>) -> Result<()> {
    let files = csv_files(dir)?;
    if files.is_empty() {
        bail!("no CSV files in {}", dir.display());
    }
    let rules = match alerts_file {
        Some(path) => JsonFileAlertStore::new(path).list()?,
        None => Vec::new(),
    };
    let active = selection(keys);
    info!(files = files.len(), rules = rules.len(), "scanning");

    let results: Vec<(PathBuf, Result<ScanRow>)> = files
        .par_iter()
        .map(|path| (path.clone(), scan_file(config, path, &active, &rules)))
        .collect();

    let mut failed = 0usize;
    for (path, result) in results {
        match result {
            Ok(row) => {
                let values: Vec<String> = row.latest.iter().map(|(k, v)| format!("{k}={v:.2}")).collect();
                println!("{:<8} {:>5} bars  {}", row.symbol, row.bars, values.join(" "));
                for title in &row.fired {
                    println!("         FIRED {title}");
                }
            }
            Err(e) => {
                failed += 1;
                warn!(path = %path.display(), error = %e, "scan failed");
                eprintln!("Error for {}: {e:#}", path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} file(s) could not be scanned");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartdesk_core::data::sample_bars;

    fn csv_source(path: &Path) -> BarSource {
        BarSource {
            csv: Some(path.to_path_buf()),
            source: None,
            timeframe: Timeframe::OneDay,
            bars: None,
        }
    }

    #[test]
    fn cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "chartdesk", "-v", "alerts", "--file", "a.json", "add", "aapl", "--condition", "rsi", "--threshold", "70",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Alerts {
                file,
                action: AlertAction::Add { symbol, condition, .. },
            } => {
                assert_eq!(file, Some(PathBuf::from("a.json")));
                assert_eq!(symbol, "aapl");
                assert_eq!(condition, "rsi");
            }
            _ => panic!("expected alerts add"),
        }
    }

    #[test]
    fn cli_rejects_unknown_indicator_and_timeframe() {
        assert!(Cli::try_parse_from(["chartdesk", "indicators", "SPY", "-i", "vwap"]).is_err());
        assert!(Cli::try_parse_from(["chartdesk", "indicators", "SPY", "--timeframe", "4h"]).is_err());
        assert!(Cli::try_parse_from(["chartdesk", "indicators", "SPY", "--csv", "x.csv", "--source", "sample"]).is_err());
    }

    #[test]
    fn empty_selection_means_all() {
        assert_eq!(selection(&[]).len(), IndicatorKey::ALL.len());
        let one = selection(&[IndicatorKey::Rsi]);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].parsed_key(), Some(IndicatorKey::Rsi));
    }

    #[test]
    fn symbol_comes_from_file_stem() {
        assert_eq!(symbol_from_path(Path::new("data/aapl_1d.csv")).as_deref(), Some("AAPL"));
        assert_eq!(symbol_from_path(Path::new("SPY.csv")).as_deref(), Some("SPY"));
        assert!(normalize_symbol("   ").is_err());
    }

    #[test]
    fn load_bars_reads_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPY_1d.csv");
        write_bars(&path, &sample_bars()).unwrap();
        let bars = load_bars(&AppConfig::default(), "SPY", &csv_source(&path)).unwrap();
        assert_eq!(bars.len(), sample_bars().len());
    }

    #[test]
    fn alert_lifecycle_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let alerts_path = dir.path().join("alerts.json");
        let csv = dir.path().join("SPY_1d.csv");
        let bars = sample_bars();
        write_bars(&csv, &bars).unwrap();
        let below = bars.last().unwrap().close - 1.0;

        let config = AppConfig::default();
        let add = AlertAction::Add {
            symbol: "spy".into(),
            condition: "price".into(),
            threshold: format!("{below}"),
            repeat: false,
        };
        run_alerts(&config, JsonFileAlertStore::new(&alerts_path), add).unwrap();

        let dup = AlertAction::Add {
            symbol: "SPY".into(),
            condition: "price".into(),
            threshold: format!("{below}"),
            repeat: false,
        };
        assert!(run_alerts(&config, JsonFileAlertStore::new(&alerts_path), dup).is_err());

        let check = AlertAction::Check {
            symbol: "SPY".into(),
            bars: csv_source(&csv),
        };
        run_alerts(&config, JsonFileAlertStore::new(&alerts_path), check).unwrap();

        let rules = JsonFileAlertStore::new(&alerts_path).list().unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].triggered);

        let id = rules[0].id.clone();
        run_alerts(&config, JsonFileAlertStore::new(&alerts_path), AlertAction::Reset { id: id.clone() }).unwrap();
        assert!(!JsonFileAlertStore::new(&alerts_path).list().unwrap()[0].triggered);

        run_alerts(&config, JsonFileAlertStore::new(&alerts_path), AlertAction::Delete { id: id.clone() }).unwrap();
        assert!(JsonFileAlertStore::new(&alerts_path).list().unwrap().is_empty());
        assert!(run_alerts(&config, JsonFileAlertStore::new(&alerts_path), AlertAction::Delete { id }).is_err());
    }

    #[test]
    fn scan_reports_each_file_and_fires_matching_rules() {
        let dir = tempfile::tempdir().unwrap();
        let bars = sample_bars();
        write_bars(&dir.path().join("AAA_1d.csv"), &bars).unwrap();
        write_bars(&dir.path().join("BBB.csv"), &bars).unwrap();

        let rule = AlertRule::new("AAA", AlertCondition::Price, 1.0, false, Utc::now());
        let config = AppConfig::default();
        let row = scan_file(&config, &dir.path().join("AAA_1d.csv"), &selection(&[IndicatorKey::Sma]), &[rule])
            .unwrap();
        assert_eq!(row.symbol, "AAA");
        assert_eq!(row.fired.len(), 1);
        assert!(row.latest.contains_key("sma"));
        assert!(!row.latest.contains_key("rsi"));

        assert!(run_scan(&config, dir.path(), &[IndicatorKey::Sma], None).is_ok());
    }

    #[test]
    fn workspace_validate_flags_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        let record = WorkspaceRecord::new("AAPL", Timeframe::OneHour);
        std::fs::write(&good, workspace::export(&record).unwrap()).unwrap();
        std::fs::write(&bad, r#"{"symbol": "AAPL"}"#).unwrap();

        assert!(run_workspace_validate(&[good.clone()]).is_ok());
        assert!(run_workspace_validate(&[good, bad]).is_err());
    }
}
