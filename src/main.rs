use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;

mod cli;
mod config;
mod dataset;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();
    let mut cfg = config::Config::load_from(&cli.config)?;
    cfg.apply_cli(&cli);
    logger::init(&cfg)?;

    // Worker threads follow `server.workers`, defaulting to the CPU count
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_listener(addr)?;

    let state = Arc::new(config::AppState::new(cfg));
    state.paths.warn_missing();
    logger::log_server_start(&addr, &state.config, &state.paths);

    let shutdown = Arc::new(Notify::new());
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        match server::signal::wait_for_shutdown().await {
            Ok(reason) => {
                logger::log_shutdown(reason);
                signal_shutdown.notify_one();
            }
            Err(e) => {
                logger::log_error(&format!("Failed to install signal handlers: {e}"));
            }
        }
    });

    server::start_server_loop(listener, state, Arc::new(AtomicUsize::new(0)), shutdown).await;

    Ok(())
}
