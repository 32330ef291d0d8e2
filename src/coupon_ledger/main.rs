use clap::Parser;
use colored::*;
use coupon_ledger::api::{CmdMessage, LedgerApi, MessageLevel};
use coupon_ledger::config::LedgerConfig;
use coupon_ledger::error::Result;
use coupon_ledger::http;
use coupon_ledger::store::fs::FileStore;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = LedgerConfig::resolve(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    init_tracing(&config.log_level);

    match cli.command {
        Some(Commands::Serve { bind }) => handle_serve(config, bind),
        Some(Commands::Doctor) => handle_doctor(&config),
        Some(Commands::Show { id }) => handle_show(&config, id),
        None => handle_serve(config, None),
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_serve(config: LedgerConfig, bind: Option<SocketAddr>) -> Result<()> {
    let bind = bind.unwrap_or(config.bind);
    let api = LedgerApi::new(FileStore::open(&config.data_dir)?);

    // Clear out anything a previous crash left half-written before serving.
    let swept = api.doctor()?;
    for message in &swept.messages {
        match message.level {
            MessageLevel::Warning => warn!("{}", message.content),
            _ => info!("{}", message.content),
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(listen(api, bind, &config))
}

async fn listen(api: LedgerApi<FileStore>, bind: SocketAddr, config: &LedgerConfig) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(
        %bind,
        data_dir = %config.data_dir.display(),
        version = env!("COUPON_LEDGER_VERSION"),
        "coupon ledger listening"
    );
    http::serve(api, listener, shutdown_signal()).await
}

fn handle_doctor(config: &LedgerConfig) -> Result<()> {
    let api = LedgerApi::new(FileStore::new(&config.data_dir));
    let result = api.doctor()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_show(config: &LedgerConfig, id: String) -> Result<()> {
    let api = LedgerApi::new(FileStore::new(&config.data_dir));
    let result = api.get_coupon(Some(id))?;
    for record in &result.affected_records {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested, draining connections"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
        }
    }
}
