mod cli;
mod files;
mod report;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use utxolink_core::explorer::EsploraClient;
use utxolink_core::outpoint::{load_start, load_targets};
use utxolink_core::snapshot::{
    collect_address_utxos, enrich_records, EnrichReport, Snapshot, SnapshotDocument,
};
use utxolink_core::{SearchMode, SearchOptions, SpendSearch};

use cli::{Cli, Command, ExplorerArgs};
use report::{ConsoleReporter, Progress};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let explorer = connect(&args.explorer)?;

    match args.command {
        Command::Snapshot {
            addresses,
            out,
            enrich,
        } => snapshot(&explorer, &args.explorer, &addresses, &out, enrich).await,
        Command::Enrich { snapshot, out } => {
            let out = out.as_deref().unwrap_or(&snapshot);
            enrich_file(&explorer, &snapshot, out).await
        }
        Command::Compare {
            reference,
            start,
            mode,
            confirmed_only,
            idle_secs,
        } => {
            let options = SearchOptions {
                mode,
                confirmed_only,
                idle_interval: Duration::from_secs(idle_secs),
                ..Default::default()
            };
            compare(&explorer, &reference, &start, options).await
        }
    }
}

fn connect(args: &ExplorerArgs) -> eyre::Result<EsploraClient> {
    let explorer = EsploraClient::new(args.base_url(), args.min_interval(), args.timeout())
        .wrap_err("configure esplora client")?;
    tracing::info!(
        url = explorer.base_url(),
        network = %args.network,
        delay_ms = args.delay_ms,
        "using esplora explorer"
    );
    Ok(explorer)
}

// ==============================================================================
// Snapshot and Enrich
// ==============================================================================

async fn snapshot(
    explorer: &EsploraClient,
    args: &ExplorerArgs,
    addresses: &[String],
    out: &Path,
    enrich: bool,
) -> eyre::Result<()> {
    let mut records = collect_address_utxos(explorer, addresses)
        .await
        .wrap_err("collect address utxos")?;
    if enrich {
        let report = enrich_records(explorer, &mut records).await;
        warn_on_failures(&report);
    }

    let mut wallet = Map::new();
    wallet.insert("addresses".into(), json!(addresses));
    wallet.insert("esplora_url".into(), Value::from(explorer.base_url()));

    let snapshot = Snapshot::new(args.network, wallet, records)?;
    files::write_json(out, &snapshot).await?;
    println!(
        "wrote {} utxo(s) from {} address(es) to {}",
        snapshot.utxos.len(),
        addresses.len(),
        out.display()
    );
    Ok(())
}

async fn enrich_file(explorer: &EsploraClient, input: &Path, out: &Path) -> eyre::Result<()> {
    let mut doc: SnapshotDocument = files::read_json(input).await?;
    let report = enrich_records(explorer, doc.records_mut()).await;
    warn_on_failures(&report);

    files::write_json(out, &doc).await?;
    println!(
        "checked {}: {} spent, {} unspent, {} failed; wrote {}",
        report.checked,
        report.spent,
        report.unspent,
        report.failed,
        out.display()
    );
    Ok(())
}

fn warn_on_failures(report: &EnrichReport) {
    if report.failed > 0 {
        tracing::warn!(
            failed = report.failed,
            "some outputs could not be checked and keep their previous status"
        );
    }
}

// ==============================================================================
// Compare
// ==============================================================================

async fn compare(
    explorer: &EsploraClient,
    reference: &Path,
    start: &Path,
    options: SearchOptions,
) -> eyre::Result<()> {
    let reference_doc: Value = files::read_json(reference).await?;
    let start_doc: Value = files::read_json(start).await?;

    let targets = load_targets(&reference_doc);
    let seeds = load_start(&start_doc);
    tracing::info!(
        targets = targets.len(),
        start = seeds.len(),
        "loaded snapshots"
    );
    if targets.is_empty() {
        tracing::warn!(path = %reference.display(), "reference snapshot has no usable outpoints");
    }
    if seeds.is_empty() {
        tracing::warn!(path = %start.display(), "start snapshot has no usable outpoints");
    }
    if options.mode == SearchMode::Bidirectional {
        tracing::info!("following funding transactions as well as spends");
    }

    let mut reporter = ConsoleReporter::new(std::io::stdout());
    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn(watch_interrupts(cancel.clone(), reporter.progress()));

    let mut search = SpendSearch::new(seeds, targets, options);
    let summary = search.run(explorer, &mut reporter, &cancel).await;
    ctrl_c.abort();

    reporter.finish(&summary);
    Ok(())
}

/// First Ctrl-C stops the search at the next hop boundary. A second one quits
/// immediately with the progress of the last completed hop.
async fn watch_interrupts(cancel: CancellationToken, progress: Arc<Progress>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("interrupt received, finishing current hop (Ctrl-C again to quit now)");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        println!("{}", progress.stop_line());
        std::process::exit(130);
    }
}
