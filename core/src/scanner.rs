use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, SecondsFormat};
use futures::{stream, StreamExt};
use serde::Serialize;
use tracing::debug;

use crate::{chain::ChainClient, ens::NameCache, units};

/// A matched transaction prepared for display: resolved names, decimal
/// ether value, calendar timestamp.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    pub block_number: u64,
    pub hash: TxHash,
    pub from: String,
    /// None for contract-creation transactions.
    pub to: Option<String>,
    pub value: String,
    pub timestamp: String,
}

/// Walks every height in `[start_height, end_height]` and collects the
/// transactions sent from or to the address, in ascending block order and
/// original in-block order. Absent blocks are skipped; transport errors
/// abort the scan. Block fetches run up to `concurrency` at a time and
/// are consumed in submission order, so the result needs no re-sort.
pub async fn scan_for_address<C: ChainClient>(
    chain: &C,
    names: &NameCache<C>,
    address: Address,
    start_height: u64,
    end_height: u64,
    concurrency: usize,
) -> crate::Result<Vec<EnrichedTransaction>> {
    debug!(%address, start_height, end_height, "scanning block range");

    let mut results = Vec::new();
    let mut blocks = stream::iter(start_height..=end_height)
        .map(|height| async move { (height, chain.get_block(height).await) })
        .buffered(concurrency.max(1));

    while let Some((height, fetched)) = blocks.next().await {
        let Some(block) = fetched? else {
            debug!(height, "no block at height, skipping");
            continue;
        };

        for tx in &block.transactions {
            if tx.from != address && tx.to != Some(address) {
                continue;
            }

            let from = names
                .resolve(Some(tx.from))
                .await
                .unwrap_or_else(|| tx.from.to_string());
            let to = names.resolve(tx.to).await;

            results.push(EnrichedTransaction {
                block_number: block.height,
                hash: tx.hash,
                from,
                to,
                value: units::format_wei(tx.value_wei)?,
                timestamp: format_timestamp(block.timestamp),
            });
        }
    }

    Ok(results)
}

/// Unix seconds as an ISO-8601 UTC instant with millisecond precision.
fn format_timestamp(timestamp: u64) -> String {
    match DateTime::from_timestamp(timestamp as i64, 0) {
        Some(instant) => instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => timestamp.to_string(),
    }
}
