use alloy::primitives::Address;
use tracing::debug;

use crate::chain::ChainClient;

/// Height of the latest block whose timestamp is at or before the target,
/// found by binary search over `[0, head]`. Falls back to 0 (genesis) when
/// every block is later than the target. Valid because block timestamps
/// never decrease with height; costs O(log head) round trips.
pub async fn find_block_at_or_before<C: ChainClient>(
    chain: &C,
    target_timestamp: u64,
) -> crate::Result<u64> {
    let head = chain.get_head_height().await?;

    let mut earliest = 0u64;
    let mut latest = head;
    let mut result_block = 0u64;

    while earliest <= latest {
        let mid = earliest + (latest - earliest) / 2;
        let Some(block) = chain.get_block(mid).await? else {
            // A gap in block availability ends the search with the best
            // height found so far.
            break;
        };

        if block.timestamp == target_timestamp {
            return Ok(mid);
        } else if block.timestamp < target_timestamp {
            result_block = mid;
            earliest = mid + 1;
        } else {
            let Some(below) = mid.checked_sub(1) else {
                break;
            };
            latest = below;
        }
    }

    debug!(target_timestamp, result_block, "timestamp search finished");
    Ok(result_block)
}

/// Balance of the address at the last block mined at or before the target
/// timestamp, as a decimal ether string.
pub async fn balance_at_timestamp<C: ChainClient>(
    chain: &C,
    address: Address,
    target_timestamp: u64,
) -> crate::Result<String> {
    let height = find_block_at_or_before(chain, target_timestamp).await?;
    chain.get_balance_at(address, height).await
}
