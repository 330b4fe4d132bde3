//! Cashbox server entrypoint.

use anyhow::{Context, anyhow};
use cashbox_api::{AppConfig, AppState, build_app, telemetry};
use cashbox_billing::{Invoice, InvoiceData};
use cashbox_core::{Customer, Transaction};
use chrono_tz::Tz;
use clap::Parser;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod commands;

use commands::{Commands, OutputFormat};

#[derive(Parser)]
#[command(name = "cashbox")]
#[command(author, version, about = "Billing webhook and invoice service", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./cashbox.{yaml,toml,json} if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    telemetry::init_tracing(&config.logging);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await,
        Commands::Invoice {
            customer,
            transaction,
            format,
            out,
            template,
            tz,
        } => render_invoice(
            &config,
            &customer,
            &transaction,
            format,
            out,
            template.as_deref(),
            tz.as_deref(),
        ),
    }
}

async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    let app = build_app(state);

    let listener = TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("binding {}", config.addr()))?;
    info!(addr = %listener.local_addr()?, "Cashbox listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

fn render_invoice(
    config: &AppConfig,
    customer: &Path,
    transaction: &Path,
    format: OutputFormat,
    out: Option<PathBuf>,
    template: Option<&str>,
    tz: Option<&str>,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let customer: Customer = read_document(customer)?;
    let transaction: Transaction = read_document(transaction)?;

    let mut data = InvoiceData::new(config.billing.product.clone());
    if let Some(vendor) = &config.billing.vendor {
        data = data.with_vendor(vendor.clone());
    }
    if let Some(tz) = tz {
        let zone: Tz = tz.parse().map_err(|_| anyhow!("unknown timezone: {}", tz))?;
        data = data.with_timezone(zone);
    }

    let invoice = Invoice::new(customer, transaction, state.formatter.clone());

    match format {
        OutputFormat::Html => {
            let html = invoice.view(&state.renderer, &data, template)?;
            match out {
                Some(path) => std::fs::write(&path, html)?,
                None => println!("{}", html),
            }
        }
        OutputFormat::Pdf => {
            let download = invoice.download(&state.renderer, &data, template)?;
            let path = out.unwrap_or_else(|| PathBuf::from(&download.filename));
            std::fs::write(&path, &download.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), bytes = download.bytes.len(), "Invoice written");
        }
    }

    Ok(())
}

fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
        _ => serde_json::from_str(&contents)?,
    };
    Ok(value)
}
