use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use alloy::{
    primitives::{address, keccak256, Address, B256},
    providers::DynProvider,
    sol,
};
use tracing::debug;

use crate::chain::ChainClient;

/// ENS registry deployed on mainnet.
pub const MAINNET_ENS_REGISTRY: Address = address!("0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    #[sol(rpc)]
    interface EnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    interface EnsResolver {
        function name(bytes32 node) external view returns (string memory);
        function addr(bytes32 node) external view returns (address);
    }
}

/// ENS namehash of a dot-separated name. The empty name hashes to zero.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        node = keccak256([node.as_slice(), label_hash.as_slice()].concat());
    }
    node
}

/// Node of the address's reverse record, `<hex-address>.addr.reverse`.
fn reverse_node(address: Address) -> B256 {
    namehash(&format!("{address:x}.addr.reverse"))
}

/// Reverse-resolves an address through the ENS registry. The claimed name
/// is verified by resolving it forward again; a name that does not map
/// back to the address is treated as absent.
pub(crate) async fn reverse_lookup(
    provider: &DynProvider,
    registry: Address,
    address: Address,
) -> crate::Result<Option<String>> {
    let node = reverse_node(address);

    let registry = EnsRegistry::new(registry, provider.clone());
    let resolver_address = registry
        .resolver(node)
        .call()
        .await
        .map_err(|error| crate::Error::EnsResolverFailed {
            address,
            error: Box::new(error),
        })?;
    if resolver_address == Address::ZERO {
        return Ok(None);
    }

    let name = EnsResolver::new(resolver_address, provider.clone())
        .name(node)
        .call()
        .await
        .map_err(|error| crate::Error::EnsNameFailed {
            address,
            error: Box::new(error),
        })?;
    if name.is_empty() {
        return Ok(None);
    }

    let forward_node = namehash(&name);
    let forward_resolver = registry
        .resolver(forward_node)
        .call()
        .await
        .map_err(|error| crate::Error::EnsForwardCheckFailed {
            name: name.clone(),
            error: Box::new(error),
        })?;
    if forward_resolver == Address::ZERO {
        return Ok(None);
    }
    let forward_address = EnsResolver::new(forward_resolver, provider.clone())
        .addr(forward_node)
        .call()
        .await
        .map_err(|error| crate::Error::EnsForwardCheckFailed {
            name: name.clone(),
            error: Box::new(error),
        })?;

    Ok((forward_address == address).then_some(name))
}

struct CacheEntry {
    name: String,
    cached_at: Instant,
}

/// Process-wide cache of display names. Each address costs at most one
/// reverse lookup per cache lifetime; failed lookups fall back to the
/// address itself and the fallback is cached too.
pub struct NameCache<C> {
    client: Arc<C>,
    entries: RwLock<HashMap<Address, CacheEntry>>,
    ttl: Option<Duration>,
}

impl<C: ChainClient> NameCache<C> {
    /// A cache over the given client. Entries never expire unless a TTL
    /// is supplied.
    pub fn new(client: Arc<C>, ttl: Option<Duration>) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Display name for the address: the verified reverse name when one
    /// exists, otherwise the checksummed address string. Absent input
    /// stays absent. Never fails; lookup errors degrade to the fallback.
    pub async fn resolve(&self, address: Option<Address>) -> Option<String> {
        let address = address?;

        if let Some(name) = self.lookup_cached(address) {
            return Some(name);
        }

        let name = match self.client.reverse_lookup(address).await {
            Ok(Some(name)) => name,
            Ok(None) => address.to_string(),
            Err(error) => {
                debug!(%address, %error, "reverse lookup failed, falling back to address");
                address.to_string()
            }
        };
        self.store(address, name.clone());
        Some(name)
    }

    /// Drops every cached entry.
    pub fn clear(&self) -> crate::Result<()> {
        self.entries
            .write()
            .map_err(|_| crate::Error::Poisoned("name_cache_clear".to_string()))?
            .clear();
        Ok(())
    }

    fn lookup_cached(&self, address: Address) -> Option<String> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&address)?;
        if let Some(ttl) = self.ttl {
            if entry.cached_at.elapsed() >= ttl {
                return None;
            }
        }
        Some(entry.name.clone())
    }

    fn store(&self, address: Address, name: String) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                address,
                CacheEntry {
                    name,
                    cached_at: Instant::now(),
                },
            );
        }
    }
}
