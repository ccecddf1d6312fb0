use std::rc::Rc;

use gloo_timers::callback::Interval;
use log::{debug, error, info, warn};
use yew::prelude::*;

use crate::components::{buy_form::BuyForm, market::MarketPanel, wallet::WalletConnect};
use crate::config::{Config, TOKEN_SYMBOL};
use crate::error::{ConfigError, RpcError};
use crate::events::{poll_tokens_bought, EventBatch};
use crate::provider::{accounts_from_event, Listener};
use crate::refresh::load_snapshot;
use crate::session::{parse_account, Session};
use crate::state::{MarketSnapshot, PurchaseEvent, SessionState, Ticket};

pub struct App {
    config: Result<Rc<Config>, ConfigError>,
    session: Option<Rc<Session>>,
    state: SessionState,
    display_timer: Option<Interval>,
    event_timer: Option<Interval>,
    accounts_listener: Option<Listener>,
}

pub enum Msg {
    Connected(Rc<Session>),
    Disconnect,
    AccountsChanged(Vec<String>),
    Refresh,
    SnapshotLoaded(Ticket, MarketSnapshot),
    ToggleDisplay,
    PollEvents,
    EventsPolled(Ticket, Result<EventBatch, RpcError>),
    Purchase(PurchaseEvent),
}

impl App {
    fn start_session(&mut self, ctx: &Context<Self>, session: Rc<Session>, config: &Config) {
        self.state.start(session.account());
        self.session = Some(session);

        let link = ctx.link().clone();
        self.display_timer = Some(Interval::new(config.display_toggle_ms, move || {
            link.send_message(Msg::ToggleDisplay)
        }));
        let link = ctx.link().clone();
        self.event_timer = Some(Interval::new(config.event_poll_ms, move || {
            link.send_message(Msg::PollEvents)
        }));

        ctx.link().send_message(Msg::Refresh);
        ctx.link().send_message(Msg::PollEvents);
    }

    fn watch_accounts(&mut self, ctx: &Context<Self>, session: &Session) {
        let link = ctx.link().clone();
        let listener = session.provider().on("accountsChanged", move |accounts| {
            let accounts = accounts_from_event(&accounts);
            let link = link.clone();
            // Deliver after the wallet callback returns; the handler may drop this listener.
            wasm_bindgen_futures::spawn_local(async move {
                link.send_message(Msg::AccountsChanged(accounts));
            });
        });
        self.accounts_listener = match listener {
            Ok(listener) => Some(listener),
            Err(err) => {
                warn!("cannot watch account changes: {err}");
                None
            }
        };
    }

    fn teardown(&mut self) {
        self.state.teardown();
        self.session = None;
        self.display_timer = None;
        self.event_timer = None;
        self.accounts_listener = None;
    }
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        let config = Config::from_build_env().map(Rc::new);
        match &config {
            Ok(config) => debug!("sale contract {}", config.contract_address),
            Err(err) => error!("invalid configuration: {err}"),
        }
        Self {
            config,
            session: None,
            state: SessionState::default(),
            display_timer: None,
            event_timer: None,
            accounts_listener: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let Ok(config) = self.config.clone() else {
            return false;
        };

        match msg {
            Msg::Connected(session) => {
                self.teardown();
                self.watch_accounts(ctx, &session);
                self.start_session(ctx, session, &config);
                true
            }
            Msg::Disconnect => {
                info!("wallet disconnected");
                self.teardown();
                true
            }
            Msg::AccountsChanged(accounts) => {
                let Some(session) = self.session.clone() else {
                    return false;
                };
                let Some(first) = accounts.first() else {
                    info!("wallet reports no accounts, disconnecting");
                    self.teardown();
                    return true;
                };
                match parse_account(first) {
                    Ok(account) if account == session.account() => false,
                    Ok(account) => {
                        info!("switched to account {account}");
                        let session = Rc::new(session.rebind(account, &config));
                        self.start_session(ctx, session, &config);
                        true
                    }
                    Err(err) => {
                        error!("{} error: {err}", err.kind());
                        false
                    }
                }
            }
            Msg::Refresh => {
                let (Some(session), Some(ticket)) = (self.session.clone(), self.state.refresh_ticket())
                else {
                    return false;
                };
                let link = ctx.link().clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let snapshot = load_snapshot(session.contract()).await;
                    link.send_message(Msg::SnapshotLoaded(ticket, snapshot));
                });
                false
            }
            Msg::SnapshotLoaded(ticket, snapshot) => self.state.apply_snapshot(ticket, snapshot),
            Msg::ToggleDisplay => self.state.toggle_display(),
            Msg::PollEvents => {
                let Some(session) = self.session.clone() else {
                    return false;
                };
                let Some((ticket, cursor)) = self.state.begin_poll() else {
                    return false;
                };
                let link = ctx.link().clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let result = poll_tokens_bought(session.contract(), cursor).await;
                    link.send_message(Msg::EventsPolled(ticket, result));
                });
                false
            }
            Msg::EventsPolled(ticket, result) => {
                self.state.apply_events(ticket, result, config.event_scope)
            }
            Msg::Purchase(event) => self.state.apply_purchase(event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let config = match &self.config {
            Ok(config) => config.clone(),
            Err(err) => {
                return html! {
                    <div class="container">
                        <h1>{TOKEN_SYMBOL}</h1>
                        <p class="error-message">{format!("Configuration error: {err}")}</p>
                    </div>
                };
            }
        };
        let link = ctx.link();

        html! {
            <div class="container">
                <h1>{TOKEN_SYMBOL}</h1>
                <WalletConnect
                    {config}
                    account={self.state.account()}
                    on_connect={link.callback(Msg::Connected)}
                    on_disconnect={link.callback(|_| Msg::Disconnect)}
                />
                if let Some(session) = &self.session {
                    <MarketPanel
                        snapshot={self.state.snapshot().clone()}
                        selector={self.state.selector()}
                    />
                    <button class="refresh-button" onclick={link.callback(|_| Msg::Refresh)}>
                        {"Refresh"}
                    </button>
                    <BuyForm
                        session={session.clone()}
                        epoch={self.state.epoch()}
                        outcome={self.state.outcome().clone()}
                        on_purchase={link.callback(Msg::Purchase)}
                    />
                }
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.teardown();
    }
}
