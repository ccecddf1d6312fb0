//! In-memory RPC double for unit tests.

use std::cell::RefCell;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::RpcError;
use crate::rpc::{parse_data, to_data, Rpc};

type Handler = Box<dyn Fn(&str, &Value) -> Result<Value, RpcError>>;

pub struct MockRpc {
    handler: Handler,
    calls: RefCell<Vec<(String, Value)>>,
}

impl MockRpc {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, RpcError> + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait(?Send)]
impl Rpc for MockRpc {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.calls
            .borrow_mut()
            .push((method.to_string(), params.clone()));
        (self.handler)(method, &params)
    }
}

/// ABI-encoded single `uint256` return value.
pub fn word(value: U256) -> Value {
    json!(to_data(&value.to_be_bytes::<32>()))
}

/// Function selector of an `eth_call` / `eth_sendTransaction` request.
pub fn eth_call_selector(params: &Value) -> [u8; 4] {
    let data = parse_data(&params[0]["data"]).unwrap_or_default();
    let mut selector = [0u8; 4];
    if data.len() >= 4 {
        selector.copy_from_slice(&data[..4]);
    }
    selector
}
