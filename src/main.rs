use std::sync::Arc;
use std::time::Duration;

use asset_mount::config::{AssetsConfig, Config};
use asset_mount::handler::{self, AppState};
use asset_mount::resolve::ResourceTree;
use asset_mount::{logger, server};
use include_dir::{include_dir, Dir};

/// Assets baked into the binary
static RESOURCES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/resources");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let mut cfg = Config::load_from(&config_path)?;
    if cfg.mounts.is_empty() {
        cfg.mounts.push(AssetsConfig::default());
    }
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let tree: Arc<dyn ResourceTree> = Arc::new(RESOURCES.clone());
    let mounts = handler::build_mounts(&cfg, Some(tree))?;
    for mount in &mounts {
        logger::log_mount(mount);
    }
    let state = Arc::new(AppState::new(&cfg, &mounts));

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals));

    server::serve(
        listener,
        state,
        signals,
        Duration::from_secs(cfg.server.timeout_secs),
    )
    .await?;
    Ok(())
}
