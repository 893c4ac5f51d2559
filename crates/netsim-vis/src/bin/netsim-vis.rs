//! Netsim Playback Server
//!
//! Load a scenario file and serve the playback frontend.
//!
//! Usage: `netsim-vis [scenario.json] [port]`

use std::env;

use netsim_vis::{LoadOutcome, VisConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "netsim_vis=info,netsim_parser=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = VisConfig::from_env()?.with_args(env::args().skip(1))?;
    let scenario = config.scenario.clone();
    let options = config.parse_options();

    let server = VisServer::new(config);
    if let Some(path) = scenario {
        match server.slot().load_file(&path, options).await? {
            LoadOutcome::Installed { generation, warnings } => {
                tracing::info!(path = %path.display(), generation, warnings, "scenario ready");
            }
            LoadOutcome::Stale { .. } => {}
        }
    } else {
        tracing::info!("no scenario given; load one with POST /api/load");
    }

    server.serve().await?;
    Ok(())
}
