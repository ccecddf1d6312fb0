use wasm_bindgen::prelude::*;
mod app;
mod components;
mod config;
mod contract;
mod error;
mod events;
mod provider;
mod purchase;
mod refresh;
mod rpc;
mod session;
mod state;
mod utils;

#[cfg(test)]
mod testing;

pub use config::{Config, EventScope};
pub use error::{ConfigError, DappError, RpcError};
pub use provider::{is_available, js_error, WalletInfo, SUPPORTED_WALLETS};
pub use utils::{format_units, parse_token_quantity, reciprocal};

#[wasm_bindgen(start)]
pub fn run_app() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<app::App>::new().render();
    Ok(())
}
