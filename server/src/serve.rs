use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use lookback_core::{
    chain::ChainClient,
    ens::NameCache,
    locator,
    scanner::{self, EnrichedTransaction},
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{
    date_start_timestamp, parse_wallet, ApiError, BalanceRequest, BalanceResponse,
    TransactionsRequest,
};

/// Shared handles the request handlers work with.
pub struct AppState<C> {
    pub chain: Arc<C>,
    pub names: Arc<NameCache<C>>,
    pub scan_concurrency: usize,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            names: Arc::clone(&self.names),
            scan_concurrency: self.scan_concurrency,
        }
    }
}

pub fn router<C: ChainClient + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/api/transactions", post(list_transactions::<C>))
        .route("/api/balanceAtDate", post(balance_at_date::<C>))
        .with_state(state)
}

/// Starts the HTTP server. Blocks until the token is cancelled (in-flight
/// requests drain) or the server fails.
pub async fn serve<C: ChainClient + 'static>(
    port: usize,
    state: AppState<C>,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| crate::Error::PortBindingFailed(port, e))?;
    info!(port, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(crate::Error::ServerCrashed)?;

    Ok(())
}

/// Transactions sent from or to the wallet, from the given block up to
/// the current chain head.
async fn list_transactions<C: ChainClient + 'static>(
    State(state): State<AppState<C>>,
    Json(payload): Json<Value>,
) -> Result<Json<Vec<EnrichedTransaction>>, ApiError> {
    let request = TransactionsRequest::parse(payload)?;
    let wallet = parse_wallet(&request.wallet)?;

    let head = state.chain.get_head_height().await?;
    let transactions = scanner::scan_for_address(
        state.chain.as_ref(),
        &state.names,
        wallet,
        request.start_block,
        head,
        state.scan_concurrency,
    )
    .await?;

    info!(
        %wallet,
        start_block = request.start_block,
        head,
        matches = transactions.len(),
        "transaction scan complete"
    );
    Ok(Json(transactions))
}

/// Wallet balance at 00:00 UTC of the given calendar date.
async fn balance_at_date<C: ChainClient + 'static>(
    State(state): State<AppState<C>>,
    Json(payload): Json<Value>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let request = BalanceRequest::parse(payload)?;
    let wallet = parse_wallet(&request.wallet)?;
    let timestamp = date_start_timestamp(&request.date)?;

    let balance = locator::balance_at_timestamp(state.chain.as_ref(), wallet, timestamp).await?;

    info!(%wallet, date = %request.date, %balance, "balance lookup complete");
    Ok(Json(BalanceResponse { balance }))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use alloy::primitives::{address, Address, TxHash, U256};
    use async_trait::async_trait;
    use lookback_core::chain::{ChainBlock, ChainTx};
    use serde_json::json;

    use super::*;

    const WALLET: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const OTHER: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    #[derive(Default)]
    struct TestChain {
        head: u64,
        blocks: BTreeMap<u64, ChainBlock>,
        balances: HashMap<(Address, u64), String>,
    }

    #[async_trait]
    impl ChainClient for TestChain {
        async fn get_block(&self, height: u64) -> lookback_core::Result<Option<ChainBlock>> {
            Ok(self.blocks.get(&height).cloned())
        }

        async fn get_head_height(&self) -> lookback_core::Result<u64> {
            Ok(self.head)
        }

        async fn get_balance_at(
            &self,
            address: Address,
            height: u64,
        ) -> lookback_core::Result<String> {
            Ok(self
                .balances
                .get(&(address, height))
                .cloned()
                .unwrap_or_else(|| "0.0".to_string()))
        }

        async fn reverse_lookup(&self, _address: Address) -> lookback_core::Result<Option<String>> {
            Ok(None)
        }
    }

    /// Chain whose every operation fails.
    struct BrokenChain;

    #[async_trait]
    impl ChainClient for BrokenChain {
        async fn get_block(&self, _height: u64) -> lookback_core::Result<Option<ChainBlock>> {
            Err(lookback_core::Error::Poisoned("test".to_string()))
        }

        async fn get_head_height(&self) -> lookback_core::Result<u64> {
            Err(lookback_core::Error::Poisoned("test".to_string()))
        }

        async fn get_balance_at(
            &self,
            _address: Address,
            _height: u64,
        ) -> lookback_core::Result<String> {
            Err(lookback_core::Error::Poisoned("test".to_string()))
        }

        async fn reverse_lookup(&self, _address: Address) -> lookback_core::Result<Option<String>> {
            Err(lookback_core::Error::Poisoned("test".to_string()))
        }
    }

    fn state_of<C: ChainClient>(chain: C) -> AppState<C> {
        let chain = Arc::new(chain);
        let names = Arc::new(NameCache::new(chain.clone(), None));
        AppState {
            chain,
            names,
            scan_concurrency: 2,
        }
    }

    fn populated_chain() -> TestChain {
        let mut chain = TestChain {
            head: 3,
            ..Default::default()
        };
        chain.blocks.insert(
            2,
            ChainBlock {
                height: 2,
                timestamp: 1_619_827_200,
                transactions: vec![ChainTx {
                    hash: TxHash::with_last_byte(1),
                    from: WALLET,
                    to: Some(OTHER),
                    value_wei: U256::from(1_000_000_000_000_000_000_u64),
                }],
            },
        );
        for (height, timestamp) in [(1u64, 1_619_827_100), (3, 1_619_827_300)] {
            chain.blocks.insert(
                height,
                ChainBlock {
                    height,
                    timestamp,
                    transactions: vec![],
                },
            );
        }
        chain
    }

    #[tokio::test]
    async fn test_list_transactions_scans_to_head() {
        let state = state_of(populated_chain());

        let Json(transactions) = list_transactions(
            State(state),
            Json(json!({ "wallet": WALLET.to_string(), "startBlock": 1 })),
        )
        .await
        .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].block_number, 2);
        assert_eq!(transactions[0].value, "1.0");
    }

    #[tokio::test]
    async fn test_list_transactions_beyond_head_is_empty() {
        let state = state_of(populated_chain());

        let Json(transactions) = list_transactions(
            State(state),
            Json(json!({ "wallet": WALLET.to_string(), "startBlock": 50 })),
        )
        .await
        .unwrap();

        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn test_list_transactions_rejects_missing_fields() {
        let state = state_of(populated_chain());

        let result =
            list_transactions(State(state), Json(json!({ "wallet": WALLET.to_string() }))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_list_transactions_rejects_malformed_wallet() {
        let state = state_of(populated_chain());

        let result = list_transactions(
            State(state),
            Json(json!({ "wallet": "0x1234", "startBlock": 1 })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_list_transactions_internal_failure_is_opaque() {
        let state = state_of(BrokenChain);

        let result = list_transactions(
            State(state),
            Json(json!({ "wallet": WALLET.to_string(), "startBlock": 1 })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn test_balance_at_date_locates_block() {
        let mut chain = populated_chain();
        // 2021-05-01 midnight falls exactly on block 2.
        chain.balances.insert((WALLET, 2), "7.5".to_string());
        let state = state_of(chain);

        let Json(response) = balance_at_date(
            State(state),
            Json(json!({ "wallet": WALLET.to_string(), "date": "2021-05-01" })),
        )
        .await
        .unwrap();

        assert_eq!(response.balance, "7.5");
    }

    #[tokio::test]
    async fn test_balance_at_date_rejects_bad_date() {
        let state = state_of(populated_chain());

        let result = balance_at_date(
            State(state),
            Json(json!({ "wallet": WALLET.to_string(), "date": "May 1st" })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_balance_at_date_rejects_missing_fields() {
        let state = state_of(populated_chain());

        let result = balance_at_date(State(state), Json(json!({ "date": "2021-05-01" }))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_balance_at_date_internal_failure_is_opaque() {
        let state = state_of(BrokenChain);

        let result = balance_at_date(
            State(state),
            Json(json!({ "wallet": WALLET.to_string(), "date": "2021-05-01" })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
