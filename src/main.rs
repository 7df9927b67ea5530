use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tx_executor::application::coordinator::ExecutionCoordinator;
use tx_executor::config::EngineConfig;
use tx_executor::domain::account::Account;
use tx_executor::domain::transaction::TransactionKind;
use tx_executor::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedger};
use tx_executor::interfaces::queue::{ChannelConsumer, Delivery, Disposition};
use tx_executor::interfaces::status::TransactionStatusResponse;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account seed file: a JSON array of account rows
    accounts: PathBuf,

    /// Transaction requests file: one JSON payload per line
    requests: PathBuf,

    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Peeks at the declared kind to pick a channel, standing in for the
/// transport's routing. An undeclared or unknown kind still has to land
/// somewhere so the consumer can dead-letter it.
fn declared_kind(line: &str) -> TransactionKind {
    #[derive(Deserialize)]
    struct KindOnly {
        kind: TransactionKind,
    }
    serde_json::from_str::<KindOnly>(line)
        .map(|peek| peek.kind)
        .unwrap_or(TransactionKind::Deposit)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).into_diagnostic()?;
            EngineConfig::from_toml(&text).into_diagnostic()?
        }
        None => EngineConfig::default(),
    };

    let account_store = InMemoryAccountStore::new();
    let seeds: Vec<Account> =
        serde_json::from_str(&fs::read_to_string(&cli.accounts).into_diagnostic()?)
            .into_diagnostic()?;
    for account in seeds {
        account_store.insert(account).await;
    }

    let ledger = InMemoryLedger::new();
    let coordinator = Arc::new(ExecutionCoordinator::new(
        Arc::new(account_store.clone()),
        Arc::new(ledger.clone()),
        config.lock_wait(),
    ));

    // one channel per kind, binding fixed by configuration
    let mut senders = HashMap::new();
    let mut consumers = Vec::new();
    for kind in [
        TransactionKind::Deposit,
        TransactionKind::Withdrawal,
        TransactionKind::Transfer,
    ] {
        let channel = config.channel(kind);
        let (sender, receiver) = mpsc::channel(config.queue_depth);
        let consumer = ChannelConsumer::new(Arc::clone(&coordinator), kind, channel.concurrency);
        info!(queue = %channel.queue, ?kind, concurrency = channel.concurrency, "channel online");
        consumers.push(tokio::spawn(consumer.run(receiver)));
        senders.insert(kind, sender);
    }

    // replay the request file through the channels
    let requests = fs::read_to_string(&cli.requests).into_diagnostic()?;
    let mut replies = Vec::new();
    for line in requests.lines().filter(|line| !line.trim().is_empty()) {
        let (delivery, reply) = Delivery::new(line.as_bytes().to_vec());
        senders[&declared_kind(line)]
            .send(delivery)
            .await
            .map_err(|_| miette::miette!("consumer channel closed"))?;
        replies.push(reply);
    }
    drop(senders);

    let (mut acked, mut dead_lettered, mut retries) = (0usize, 0usize, 0usize);
    for reply in replies {
        match reply.await {
            Ok(Disposition::Ack) => acked += 1,
            Ok(Disposition::DeadLetter) => dead_lettered += 1,
            Ok(Disposition::Retry) => retries += 1,
            Err(_) => {}
        }
    }
    for consumer in consumers {
        consumer.await.into_diagnostic()?;
    }
    info!(acked, dead_lettered, retries, "replay finished");

    // final state: transaction records, then account snapshots
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in ledger.records().await {
        let response = TransactionStatusResponse::from(record);
        serde_json::to_writer(&mut out, &response).into_diagnostic()?;
        writeln!(out).into_diagnostic()?;
    }
    for account in account_store.accounts().await {
        serde_json::to_writer(&mut out, &account).into_diagnostic()?;
        writeln!(out).into_diagnostic()?;
    }

    Ok(())
}
