//! Error types for the wallet session store

use std::fmt;

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Provider / JSON-RPC error code for "user rejected the request"
pub const USER_REJECTED: i64 = 4001;

/// Error object returned by the wallet provider or the JSON-RPC node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Main error type for the session store
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported network: chain id {0} has no address book")]
    UnsupportedNetwork(u64),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    /// Error object reported by the provider; also covers contract reverts
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    // Session errors
    #[error("Wallet not connected")]
    NotConnected,

    #[error("No authorized account")]
    NoAccount,

    // Contract errors
    #[error("ABI decode failed: {0}")]
    AbiDecode(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    // Serialization errors
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Provider error code carried by this error, if any
    pub fn provider_code(&self) -> Option<i64> {
        match self {
            Error::Provider(e) => Some(e.code),
            _ => None,
        }
    }

    /// Check if the user declined the request in their wallet
    pub fn is_user_rejection(&self) -> bool {
        self.provider_code() == Some(USER_REJECTED)
    }

    /// Message suitable for showing to the user.
    ///
    /// Provider errors with a known code are translated through the catalog,
    /// everything else falls back to the error's own text.
    pub fn user_message(&self) -> String {
        self.provider_code()
            .and_then(catalog_message)
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

/// Known provider and JSON-RPC error codes with their display text
pub const ERROR_CATALOG: &[(i64, &str)] = &[
    (4001, "User rejected transaction"),
    (
        4100,
        "The requested method and/or account has not been authorized by the user.",
    ),
    (4200, "The Provider does not support the requested method."),
    (4900, "The Provider is disconnected from all chains."),
    (4901, "The Provider is not connected to the requested chain."),
    (-32000, "Insufficent Ethereum for Transaction"),
    (-32001, "Requested resource not found"),
    (-32002, "Requested resource not available"),
    (-32003, "Transaction creation failed"),
    (-32004, "Method is not implemented on contract"),
    (-32005, "Request exceeds defined limit"),
    (-32006, "Version of JSON-RPC protocol is not supported"),
    (-32015, "Transaction underpriced"),
    (-32016, "Transaction nonce too low"),
    (-32600, "Invalid request"),
    (-32601, "Method not found"),
    (-32602, "Invalid params"),
    (-32603, "Internal error"),
    (-32700, "Parse error"),
];

/// Look up the display text for a provider error code
pub fn catalog_message(code: i64) -> Option<&'static str> {
    ERROR_CATALOG
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, msg)| *msg)
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        Error::Provider(e)
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::RpcConnection(e.to_string())
        } else if e.is_decode() {
            Error::Deserialization(e.to_string())
        } else {
            Error::Rpc(e.to_string())
        }
    }
}

// Conversion from ABI decoding errors
impl From<alloy_sol_types::Error> for Error {
    fn from(e: alloy_sol_types::Error) -> Self {
        Error::AbiDecode(e.to_string())
    }
}

// Conversion from serde_json errors (response results only)
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Deserialization(e.to_string())
    }
}
