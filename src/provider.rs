//! EIP-1193 bridge to wallets injected into the page.

use async_trait::async_trait;
use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Array, Function, Object, Promise, Reflect};
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::RpcError;
use crate::rpc::Rpc;

/// A wallet the connect modal can offer.
#[derive(Debug, PartialEq, Eq)]
pub struct WalletInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// Property of `window` the wallet injects its provider under.
    pub injection_key: &'static str,
}

pub const SUPPORTED_WALLETS: &[WalletInfo] = &[
    WalletInfo {
        id: "injected",
        name: "Browser Wallet",
        injection_key: "ethereum",
    },
    WalletInfo {
        id: "coinbase",
        name: "Coinbase Wallet",
        injection_key: "coinbaseWalletExtension",
    },
];

fn injected(info: &WalletInfo) -> Option<Object> {
    let window = web_sys::window()?;
    Reflect::get(&window, &JsValue::from_str(info.injection_key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
        .and_then(|value| value.dyn_into::<Object>().ok())
}

pub fn is_available(info: &WalletInfo) -> bool {
    injected(info).is_some()
}

/// Turns a rejected promise into an [`RpcError`], keeping the wallet's message.
pub fn js_error(err: JsValue) -> RpcError {
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64);
    RpcError::Provider { code, message }
}

fn method(target: &Object, name: &str) -> Result<Function, RpcError> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into::<Function>()
        .map_err(|_| RpcError::Unavailable(format!("provider has no {name}()")))
}

pub struct Eip1193Provider {
    inner: Object,
}

impl Eip1193Provider {
    pub fn locate(wallet: &'static WalletInfo) -> Result<Self, RpcError> {
        let inner = injected(wallet)
            .ok_or_else(|| RpcError::Unavailable(format!("{} not found", wallet.name)))?;
        Ok(Self { inner })
    }

    /// Asks the wallet to expose its accounts, prompting the user if needed.
    pub async fn request_accounts(&self) -> Result<Vec<String>, RpcError> {
        let accounts = self.request("eth_requestAccounts", json!([])).await?;
        serde_json::from_value(accounts).map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// Registers `handler` for a provider event until the returned guard is dropped.
    pub fn on<F>(&self, event: &'static str, handler: F) -> Result<Listener, RpcError>
    where
        F: FnMut(JsValue) + 'static,
    {
        let closure = Closure::<dyn FnMut(JsValue)>::new(handler);
        method(&self.inner, "on")?
            .call2(&self.inner, &JsValue::from_str(event), closure.as_ref())
            .map_err(js_error)?;
        Ok(Listener {
            target: self.inner.clone(),
            event,
            closure,
        })
    }
}

#[async_trait(?Send)]
impl Rpc for Eip1193Provider {
    async fn request(&self, method_name: &str, params: Value) -> Result<Value, RpcError> {
        let args = JsValue::from_serde(&json!({ "method": method_name, "params": params }))
            .map_err(|e| RpcError::Decode(e.to_string()))?;
        let promise = method(&self.inner, "request")?
            .call1(&self.inner, &args)
            .map_err(js_error)?
            .dyn_into::<Promise>()
            .map_err(|_| RpcError::Unavailable("request() did not return a promise".into()))?;
        let result = JsFuture::from(promise).await.map_err(js_error)?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        result
            .into_serde::<Value>()
            .map_err(|e| RpcError::Decode(e.to_string()))
    }
}

/// Keeps a provider event handler alive; removes it on drop.
pub struct Listener {
    target: Object,
    event: &'static str,
    closure: Closure<dyn FnMut(JsValue)>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Ok(remove) = method(&self.target, "removeListener") {
            let _ = remove.call2(
                &self.target,
                &JsValue::from_str(self.event),
                self.closure.as_ref(),
            );
        }
    }
}

/// Account list carried by an `accountsChanged` event.
pub fn accounts_from_event(value: &JsValue) -> Vec<String> {
    Array::from(value)
        .iter()
        .filter_map(|account| account.as_string())
        .collect()
}
