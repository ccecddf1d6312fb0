use std::str::FromStr;

use alloy_primitives::Address;

use crate::error::ConfigError;

const DEFAULT_CONTRACT_ADDRESS: &str = "0xEB4d6210e4076aF5347Ab98625b5Bc0C7E71cFB7";

pub const NATIVE_SYMBOL: &str = "ETH";
pub const TOKEN_SYMBOL: &str = "VES";

/// Which `tokensBought` events may attach buyer details to the local outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventScope {
    /// Every buyer, including purchases made from other sessions.
    #[default]
    Any,
    /// Only events whose buyer is the connected account.
    Own,
}

impl FromStr for EventScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "own" => Ok(Self::Own),
            other => Err(ConfigError::EventScope(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub contract_address: Address,
    /// API-key-like identifier for the wallet backend, if one was supplied at build time.
    pub wallet_backend_id: Option<String>,
    pub event_scope: EventScope,
    pub display_toggle_ms: u32,
    pub event_poll_ms: u32,
    pub receipt_poll_ms: u32,
}

impl Config {
    /// Reads the values baked in by the build environment.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_values(
            option_env!("SALE_CONTRACT_ADDRESS"),
            option_env!("WALLET_BACKEND_ID"),
            option_env!("TOKEN_EVENT_SCOPE"),
        )
    }

    pub fn from_values(
        contract_address: Option<&str>,
        wallet_backend_id: Option<&str>,
        event_scope: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let raw_address = contract_address
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONTRACT_ADDRESS);
        let contract_address =
            Address::from_str(raw_address).map_err(|e| ConfigError::ContractAddress {
                value: raw_address.to_string(),
                reason: e.to_string(),
            })?;

        let event_scope = match event_scope.filter(|s| !s.trim().is_empty()) {
            Some(scope) => scope.parse()?,
            None => EventScope::default(),
        };

        Ok(Self {
            contract_address,
            wallet_backend_id: wallet_backend_id
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            event_scope,
            display_toggle_ms: 2_000,
            event_poll_ms: 4_000,
            receipt_poll_ms: 1_000,
        })
    }
}
