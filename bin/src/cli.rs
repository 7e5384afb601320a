use alloy::primitives::Address;
use clap::Parser;
use lookback_core::ens::MAINNET_ENS_REGISTRY;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "lookback", bin_name = "lookback", version)]
pub struct Cli {
    /// JSON-RPC endpoint to query.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Url,

    /// Port to serve the HTTP API on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: usize,

    /// ENS registry consulted for reverse-name lookups.
    #[arg(long, env = "ENS_REGISTRY", default_value_t = MAINNET_ENS_REGISTRY)]
    pub ens_registry: Address,

    /// Seconds before a cached name is looked up again. Names are cached
    /// for the process lifetime when unset.
    #[arg(long, env = "ENS_CACHE_TTL_SECS")]
    pub ens_cache_ttl_secs: Option<u64>,

    /// How many block fetches a scan keeps in flight at once.
    #[arg(long, env = "SCAN_CONCURRENCY", default_value_t = 4)]
    pub scan_concurrency: usize,
}
