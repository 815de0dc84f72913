use std::sync::Arc;
use tokio::sync::Notify;

use media_range_server::config::{AppState, Config};
use media_range_server::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = Config::load()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    cfg.apply_args(&args)?;

    logger::init(&cfg)?;

    let root = cfg.media.root.clone();
    let state =
        AppState::new(cfg).map_err(|e| format!("Media directory '{root}' is not usable: {e}"))?;

    // Worker thread count comes from config, default is one per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = state.config.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(Arc::new(state)))
}

async fn async_main(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, state.root.as_path(), &state.config);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    let in_flight = server::run(listener, state, shutdown).await;
    if in_flight > 0 {
        logger::log_warning(&format!("Dropping {in_flight} connection(s) still streaming"));
    }
    Ok(())
}
