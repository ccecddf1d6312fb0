use std::rc::Rc;

use alloy_primitives::Address;
use log::{error, warn};
use yew::prelude::*;

use crate::config::Config;
use crate::error::DappError;
use crate::provider::{self, WalletInfo, SUPPORTED_WALLETS};
use crate::session::{self, Session};
use crate::utils::short_address;

pub struct WalletConnect {
    modal_open: bool,
    connecting: bool,
    error: Option<String>,
}

pub enum Msg {
    OpenModal,
    Cancel,
    Select(&'static WalletInfo),
    Connected(Rc<Session>),
    Error(DappError),
    Disconnect,
}

#[derive(Properties, PartialEq)]
pub struct Props {
    pub config: Rc<Config>,
    pub account: Option<Address>,
    pub on_connect: Callback<Rc<Session>>,
    pub on_disconnect: Callback<()>,
}

impl Component for WalletConnect {
    type Message = Msg;
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            modal_open: false,
            connecting: false,
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::OpenModal => {
                self.modal_open = true;
                self.error = None;
                true
            }
            Msg::Cancel => {
                self.modal_open = false;
                let err = DappError::Connection("wallet selection cancelled".into());
                warn!("{} error: {err}", err.kind());
                true
            }
            Msg::Select(wallet) => {
                self.modal_open = false;
                self.connecting = true;
                let config = ctx.props().config.clone();
                if wallet.id == "coinbase" && config.wallet_backend_id.is_none() {
                    warn!("WALLET_BACKEND_ID not set, {} uses its own defaults", wallet.name);
                }
                let link = ctx.link().clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match session::connect(wallet, &config).await {
                        Ok(session) => link.send_message(Msg::Connected(Rc::new(session))),
                        Err(err) => link.send_message(Msg::Error(err)),
                    }
                });
                true
            }
            Msg::Connected(session) => {
                self.connecting = false;
                ctx.props().on_connect.emit(session);
                true
            }
            Msg::Error(err) => {
                error!("{} error: {err}", err.kind());
                self.connecting = false;
                self.error = Some(err.to_string());
                true
            }
            Msg::Disconnect => {
                ctx.props().on_disconnect.emit(());
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let account = ctx.props().account;

        html! {
            <div class="wallet-section">
                if let Some(account) = account {
                    <div class="connected-status">
                        <button class="connect-button" disabled={true}>{"Wallet Connected!"}</button>
                        <div class="wallet-address">{format!("Address: {}", short_address(&account))}</div>
                        <button class="disconnect-button" onclick={link.callback(|_| Msg::Disconnect)}>
                            {"Disconnect"}
                        </button>
                    </div>
                } else {
                    <button
                        class="connect-button"
                        onclick={link.callback(|_| Msg::OpenModal)}
                        disabled={self.connecting}
                    >
                        if self.connecting {
                            {"Connecting..."}
                        } else {
                            {"Connect Wallet"}
                        }
                    </button>
                }
                if self.modal_open {
                    <div class="wallet-modal">
                        <h2>{"Select a wallet"}</h2>
                        <ul>
                            { for SUPPORTED_WALLETS.iter().map(|wallet| {
                                let available = provider::is_available(wallet);
                                html! {
                                    <li>
                                        <button
                                            onclick={link.callback(move |_| Msg::Select(wallet))}
                                            disabled={!available}
                                        >
                                            {wallet.name}
                                            if !available {
                                                {" (not detected)"}
                                            }
                                        </button>
                                    </li>
                                }
                            }) }
                        </ul>
                        <button class="cancel-button" onclick={link.callback(|_| Msg::Cancel)}>
                            {"Cancel"}
                        </button>
                    </div>
                }
                if let Some(error) = &self.error {
                    <p class="error-message">{format!("Error: {error}")}</p>
                }
            </div>
        }
    }
}
