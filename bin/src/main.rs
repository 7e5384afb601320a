use std::{sync::Arc, time::Duration};

use clap::Parser;
use lookback_core::{chain::RpcChainClient, ens::NameCache};
use lookback_server::AppState;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> lookback_server::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let chain = Arc::new(RpcChainClient::new(cli.rpc_url, cli.ens_registry));
    let names = Arc::new(NameCache::new(
        chain.clone(),
        cli.ens_cache_ttl_secs.map(Duration::from_secs),
    ));
    let state = AppState {
        chain,
        names,
        scan_concurrency: cli.scan_concurrency,
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            signal.cancel();
        }
    });

    lookback_server::serve(cli.port, state, shutdown).await?;

    Ok(())
}
