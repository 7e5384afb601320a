use alloy::primitives::Address;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Rpc Error: {0}")]
    RpcError(Box<alloy::transports::RpcError<alloy::transports::TransportErrorKind>>),

    #[error("Units Error: {0}")]
    UnitsError(Box<alloy::primitives::utils::UnitsError>),

    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("Failed to get resolver from ENS registry for {address}. (Error: {error:?})")]
    EnsResolverFailed {
        address: Address,
        error: Box<alloy::contract::Error>,
    },

    #[error("Failed to get name from ENS resolver for {address}. (Error: {error:?})")]
    EnsNameFailed {
        address: Address,
        error: Box<alloy::contract::Error>,
    },

    #[error("Failed to verify ENS name '{name}'. (Error: {error:?})")]
    EnsForwardCheckFailed {
        name: String,
        error: Box<alloy::contract::Error>,
    },

    #[error("Poisoned lock: {0}.")]
    Poisoned(String),
}

impl From<alloy::transports::RpcError<alloy::transports::TransportErrorKind>> for CoreError {
    fn from(e: alloy::transports::RpcError<alloy::transports::TransportErrorKind>) -> Self {
        CoreError::RpcError(Box::new(e))
    }
}

impl From<alloy::primitives::utils::UnitsError> for CoreError {
    fn from(e: alloy::primitives::utils::UnitsError) -> Self {
        CoreError::UnitsError(Box::new(e))
    }
}
