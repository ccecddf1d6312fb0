//! JSON-RPC plumbing shared by the wallet provider and the contract binding.

use alloy_primitives::{hex, U256};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::RpcError;

/// Anything that answers Ethereum JSON-RPC requests on behalf of one account.
#[async_trait(?Send)]
pub trait Rpc {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

pub fn parse_quantity(value: &Value) -> Result<U256, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Decode(format!("expected hex quantity, got {value}")))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Decode(format!("bad quantity {text:?}: {e}")))
}

pub fn parse_block_number(value: &Value) -> Result<u64, RpcError> {
    let number = parse_quantity(value)?;
    u64::try_from(number).map_err(|_| RpcError::Decode(format!("block number {number} overflows")))
}

pub fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn parse_data(value: &Value) -> Result<Vec<u8>, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Decode(format!("expected hex data, got {value}")))?;
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
        .map_err(|e| RpcError::Decode(format!("bad data {text:?}: {e}")))
}
