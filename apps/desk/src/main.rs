use std::{process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{config::parse_service_url, load_client_config, FormField, OrderDesk};
use shared::domain::OrderId;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

use render::{render_order, render_snapshot, render_status};

#[derive(Parser, Debug)]
#[command(name = "order-desk", about = "Submit and execute orders against an order service")]
struct Cli {
    /// Base URL of the order service; overrides desk.toml and the environment.
    #[arg(long)]
    service_url: Option<String>,
    /// Request timeout in seconds; must be at least 1.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh and print the order book.
    List,
    /// Print one order by id.
    Show { id: OrderId },
    /// Submit a new order, then print the refreshed book.
    Create {
        #[arg(long)]
        instrument: String,
        #[arg(long, default_value = "buy")]
        way: String,
        #[arg(long, allow_hyphen_values = true)]
        price: String,
        #[arg(long, allow_hyphen_values = true)]
        qty: String,
    },
    /// Execute an order by id, then print the refreshed book.
    Execute { id: OrderId },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut config = load_client_config().context("failed to load desk configuration")?;
    if let Some(url) = cli.service_url.as_deref() {
        config.service_url = parse_service_url(url)?;
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }

    let desk = OrderDesk::connect(config).context("failed to build order service client")?;
    let mut events = desk.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(?event, "desk event");
        }
    });

    match cli.command {
        Command::List => {
            let _ = desk.refresh().await;
        }
        Command::Show { id } => {
            return match desk.fetch_order(id).await {
                Ok(order) => {
                    println!("{}", render_order(&order));
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    eprintln!("error: {error}");
                    Ok(ExitCode::FAILURE)
                }
            };
        }
        Command::Create {
            instrument,
            way,
            price,
            qty,
        } => {
            desk.update_field(FormField::Instrument, instrument).await;
            desk.update_field(FormField::Way, way).await;
            desk.update_field(FormField::Price, price).await;
            desk.update_field(FormField::Qty, qty).await;
            let _ = desk.submit_order().await;
        }
        Command::Execute { id } => {
            let _ = desk.execute_order(id).await;
        }
    }

    let status = desk.status().await;
    if let Some(line) = render_status(&status) {
        println!("{line}");
    }
    let table = desk.with_snapshot(render_snapshot).await;
    println!("{table}");

    Ok(if status.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
