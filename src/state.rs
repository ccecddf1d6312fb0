//! UI state shared between the app shell and its components.

use alloy_primitives::{Address, U256};
use log::{debug, info, warn};

use crate::config::EventScope;
use crate::contract::TokensBought;
use crate::error::{DappError, RpcError};
use crate::events::EventBatch;

/// Hands out tickets so that only the newest outstanding request may
/// write its result back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    pub fn issue(&mut self) -> Ticket {
        self.0 += 1;
        Ticket(self.0)
    }

    /// Invalidates every ticket issued so far.
    pub fn invalidate(&mut self) {
        self.0 += 1;
    }

    pub fn current(&self) -> Ticket {
        Ticket(self.0)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0 == ticket.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplaySelector {
    #[default]
    Rate,
    Price,
}

impl DisplaySelector {
    pub fn toggle(self) -> Self {
        match self {
            Self::Rate => Self::Price,
            Self::Price => Self::Rate,
        }
    }
}

/// Latest contract and wallet reads. A `None` field is a read that failed
/// or has not happened yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    /// Tokens per unit of native currency, already inverted.
    pub rate: Option<String>,
    /// Price in native currency, already scaled.
    pub price: Option<String>,
    pub total_supply: Option<U256>,
    /// Wallet balance in native currency, already scaled.
    pub balance: Option<String>,
}

impl MarketSnapshot {
    pub fn apply_purchase(&mut self, update: &PostPurchase) {
        self.total_supply = update.total_supply;
        self.balance = update.balance.clone();
    }
}

/// Reads taken right after a mined purchase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPurchase {
    pub total_supply: Option<U256>,
    pub balance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDetail {
    pub buyer: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxOutcome {
    #[default]
    Idle,
    Pending,
    /// `detail` is filled in once a matching `tokensBought` event arrives.
    Success { detail: Option<PurchaseDetail> },
    Failed { message: String },
}

impl TxOutcome {
    pub fn submit(&mut self) {
        *self = Self::Pending;
    }

    /// The submitted transaction was mined. Keeps detail an event already attached.
    pub fn mined(&mut self) {
        if !matches!(self, Self::Success { .. }) {
            *self = Self::Success { detail: None };
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = Self::Failed {
            message: message.into(),
        };
    }

    /// Applies a `tokensBought` event. Returns whether it was accepted.
    pub fn record_event(
        &mut self,
        event: &TokensBought,
        scope: EventScope,
        account: Address,
    ) -> bool {
        if scope == EventScope::Own && event.buyer != account {
            return false;
        }
        *self = Self::Success {
            detail: Some(PurchaseDetail {
                buyer: event.buyer,
                amount: event.amount,
            }),
        };
        true
    }
}

/// Widest block range requested from `eth_getLogs` in one poll.
pub const MAX_LOG_RANGE: u64 = 1_000;

/// Block window for log polling. The first poll only records the chain
/// head so that history before connecting is never replayed. Backlogs
/// are walked in chunks of at most [`MAX_LOG_RANGE`] blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCursor {
    next_block: Option<u64>,
}

impl EventCursor {
    /// Range still to be queried given the current head. Nothing is
    /// consumed until [`EventCursor::commit`] is called for it.
    pub fn window(&mut self, head: u64) -> Option<(u64, u64)> {
        match self.next_block {
            None => {
                self.next_block = Some(head + 1);
                None
            }
            Some(next) if head >= next => {
                Some((next, head.min(next.saturating_add(MAX_LOG_RANGE - 1))))
            }
            Some(_) => None,
        }
    }

    pub fn commit(&mut self, to: u64) {
        self.next_block = Some(to + 1);
    }
}

/// Progress of a submission. Every variant carries the session epoch the
/// purchase was submitted under.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseEvent {
    Submitted(Ticket),
    Succeeded(Ticket, PostPurchase),
    Failed(Ticket, String),
}

impl PurchaseEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Submitted(ticket) | Self::Succeeded(ticket, _) | Self::Failed(ticket, _) => {
                *ticket
            }
        }
    }
}

/// Everything the app shell tracks for one connected account. Each
/// transition reports whether the view needs to re-render.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Bumped on every connect, account switch and disconnect; results
    /// tagged with an older ticket belong to a session that no longer exists.
    epoch: Generation,
    account: Option<Address>,
    snapshot: MarketSnapshot,
    selector: DisplaySelector,
    outcome: TxOutcome,
    cursor: EventCursor,
    polling: bool,
}

impl SessionState {
    /// Begins a session for `account`, discarding everything tied to the
    /// previous one. The display selector carries over.
    pub fn start(&mut self, account: Address) -> Ticket {
        self.epoch.invalidate();
        self.account = Some(account);
        self.snapshot = MarketSnapshot::default();
        self.outcome = TxOutcome::Idle;
        self.cursor = EventCursor::default();
        self.polling = false;
        self.epoch.current()
    }

    pub fn teardown(&mut self) {
        self.epoch.invalidate();
        self.account = None;
        self.snapshot = MarketSnapshot::default();
        self.selector = DisplaySelector::default();
        self.outcome = TxOutcome::Idle;
        self.cursor = EventCursor::default();
        self.polling = false;
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn epoch(&self) -> Ticket {
        self.epoch.current()
    }

    pub fn snapshot(&self) -> &MarketSnapshot {
        &self.snapshot
    }

    pub fn selector(&self) -> DisplaySelector {
        self.selector
    }

    pub fn outcome(&self) -> &TxOutcome {
        &self.outcome
    }

    pub fn toggle_display(&mut self) -> bool {
        if self.account.is_none() {
            return false;
        }
        self.selector = self.selector.toggle();
        true
    }

    /// Ticket for a snapshot read, or `None` while disconnected.
    pub fn refresh_ticket(&self) -> Option<Ticket> {
        self.account.map(|_| self.epoch.current())
    }

    pub fn apply_snapshot(&mut self, ticket: Ticket, snapshot: MarketSnapshot) -> bool {
        if !self.epoch.is_current(ticket) {
            debug!("dropping snapshot from a previous session");
            return false;
        }
        info!("market snapshot loaded");
        self.snapshot = snapshot;
        true
    }

    /// Claims the event poll. `None` while disconnected or while a poll is
    /// already running.
    pub fn begin_poll(&mut self) -> Option<(Ticket, EventCursor)> {
        if self.account.is_none() || self.polling {
            return None;
        }
        self.polling = true;
        Some((self.epoch.current(), self.cursor))
    }

    pub fn apply_events(
        &mut self,
        ticket: Ticket,
        result: Result<EventBatch, RpcError>,
        scope: EventScope,
    ) -> bool {
        if !self.epoch.is_current(ticket) {
            return false;
        }
        self.polling = false;
        let batch = match result {
            Ok(batch) => batch,
            Err(err) => {
                warn!("error polling tokensBought events: {err}");
                return false;
            }
        };
        self.cursor = batch.cursor;
        let Some(account) = self.account else {
            return false;
        };
        let mut changed = false;
        for event in &batch.events {
            if self.outcome.record_event(event, scope, account) {
                info!("{} bought {} tokens", event.buyer, event.amount);
                changed = true;
            }
        }
        changed
    }

    /// Applies purchase progress unless it was submitted under an earlier
    /// session.
    pub fn apply_purchase(&mut self, event: PurchaseEvent) -> bool {
        if self.account.is_none() || !self.epoch.is_current(event.ticket()) {
            debug!("dropping purchase result from a previous session");
            return false;
        }
        match event {
            PurchaseEvent::Submitted(_) => self.outcome.submit(),
            PurchaseEvent::Succeeded(_, update) => {
                self.snapshot.apply_purchase(&update);
                self.outcome.mined();
            }
            PurchaseEvent::Failed(_, message) => {
                warn!("error buying tokens: {message}");
                self.outcome.fail(message);
            }
        }
        true
    }
}

/// Input, quote and submission state of the buy form.
#[derive(Debug, Default)]
pub struct FormState {
    amount: String,
    quote: Option<U256>,
    quotes: Generation,
    /// Epoch of the purchase currently awaiting its result.
    in_flight: Option<Ticket>,
}

impl FormState {
    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn quote(&self) -> Option<U256> {
        self.quote
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Stores the typed quantity. Returns a ticket when a quote should be
    /// requested for it.
    pub fn set_amount(&mut self, amount: String) -> Option<Ticket> {
        self.amount = amount;
        self.requote()
    }

    pub fn requote(&mut self) -> Option<Ticket> {
        if self.amount.trim().is_empty() {
            self.quotes.invalidate();
            self.quote = None;
            return None;
        }
        Some(self.quotes.issue())
    }

    pub fn apply_quote(&mut self, ticket: Ticket, result: Result<U256, DappError>) -> bool {
        if !self.quotes.is_current(ticket) {
            return false;
        }
        self.quote = match result {
            Ok(cost) => Some(cost),
            Err(err) => {
                warn!("{} error: {err}", err.kind());
                None
            }
        };
        true
    }

    /// Marks a purchase as in flight under `epoch`. Refused while another
    /// one has not finished.
    pub fn begin_submit(&mut self, epoch: Ticket) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(epoch);
        true
    }

    /// Records the result of the purchase submitted under `epoch`. The
    /// quantity is cleared only on success. Returns `false` for a purchase
    /// the form no longer tracks.
    pub fn finish(&mut self, epoch: Ticket, succeeded: bool) -> bool {
        if self.in_flight != Some(epoch) {
            return false;
        }
        self.in_flight = None;
        if succeeded {
            self.amount.clear();
            self.quotes.invalidate();
            self.quote = None;
        }
        true
    }

    /// The form now belongs to another session; forgets the old purchase
    /// and asks for a quote under the new binding.
    pub fn session_changed(&mut self) -> Option<Ticket> {
        self.in_flight = None;
        self.requote()
    }
}
