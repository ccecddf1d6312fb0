use thiserror::Error;

/// Failure reported by the wallet provider or while reading its response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    /// The provider rejected the request. `message` is shown to the user as-is.
    #[error("{message}")]
    Provider { code: Option<i64>, message: String },
    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            code: None,
            message: message.into(),
        }
    }

    /// EIP-1193 code 4001: the user rejected the request in the wallet UI.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Provider { code: Some(4001), .. })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DappError {
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    Read(RpcError),
    #[error("{0}")]
    Quote(String),
    #[error("{0}")]
    Transaction(String),
}

impl DappError {
    pub fn quote(err: RpcError) -> Self {
        Self::Quote(err.to_string())
    }

    pub fn transaction(err: RpcError) -> Self {
        Self::Transaction(err.to_string())
    }

    pub fn connection(err: RpcError) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Read(_) => "read",
            Self::Quote(_) => "quote",
            Self::Transaction(_) => "transaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid contract address {value:?}: {reason}")]
    ContractAddress { value: String, reason: String },
    #[error("unknown event scope {0:?}, expected \"any\" or \"own\"")]
    EventScope(String),
}
