// telosd: run the engine until interrupted.
//
// Thin glue only: open the store at the default location, pick up the
// persisted engine config (or defaults on first run), start the runtime,
// wait for ctrl-c, stop cleanly.

use std::sync::Arc;

use log::{error, info};
use telos::atoms::constants::STATE_KEY_ENGINE_CONFIG;
use telos::{EngineConfig, EngineResult, Runtime, StateStore, StaticSampleProvider};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("[telosd] Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> EngineResult<()> {
    let store = Arc::new(StateStore::open_default()?);

    let config: EngineConfig = store
        .get_state(STATE_KEY_ENGINE_CONFIG)?
        .unwrap_or_default();

    // Placeholder provider until a cognitive subsystem is attached.
    let provider = Arc::new(StaticSampleProvider::default());

    let runtime = Runtime::new(store, provider, config)?;
    runtime.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("[telosd] Interrupt received");

    runtime.stop().await;
    Ok(())
}
