use std::rc::Rc;

use alloy_primitives::U256;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::config::{NATIVE_SYMBOL, TOKEN_SYMBOL};
use crate::error::DappError;
use crate::purchase;
use crate::session::Session;
use crate::state::{FormState, PostPurchase, PurchaseEvent, Ticket, TxOutcome};
use crate::utils::{format_units, short_address};

pub struct BuyForm {
    form: FormState,
}

pub enum Msg {
    UpdateAmount(String),
    Quoted(Ticket, Result<U256, DappError>),
    Buy,
    Completed(Ticket, Result<PostPurchase, DappError>),
}

#[derive(Properties, PartialEq)]
pub struct Props {
    pub session: Rc<Session>,
    /// Session epoch purchases are submitted under.
    pub epoch: Ticket,
    pub outcome: TxOutcome,
    pub on_purchase: Callback<PurchaseEvent>,
}

impl BuyForm {
    fn request_quote(&self, ctx: &Context<Self>, ticket: Option<Ticket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let session = ctx.props().session.clone();
        let amount = self.form.amount().to_owned();
        let link = ctx.link().clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = purchase::quote(session.contract(), &amount).await;
            link.send_message(Msg::Quoted(ticket, result));
        });
    }

    fn status_view(outcome: &TxOutcome) -> Html {
        match outcome {
            TxOutcome::Idle => html! {},
            TxOutcome::Pending => html! { <p class="status-message">{"transaction pending..."}</p> },
            TxOutcome::Success { detail } => html! {
                <div class="status-message">
                    <p>{"Transaction successful!"}</p>
                    if let Some(detail) = detail {
                        <p class="transaction-detail">
                            {format!("{} bought {} {TOKEN_SYMBOL}", short_address(&detail.buyer), detail.amount)}
                        </p>
                    }
                </div>
            },
            TxOutcome::Failed { message } => html! {
                <div class="status-message">
                    <p class="error-message">{format!("Error: {message}")}</p>
                    <p>{"transaction failed"}</p>
                </div>
            },
        }
    }
}

impl Component for BuyForm {
    type Message = Msg;
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            form: FormState::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::UpdateAmount(amount) => {
                let ticket = self.form.set_amount(amount);
                self.request_quote(ctx, ticket);
                true
            }
            Msg::Quoted(ticket, result) => self.form.apply_quote(ticket, result),
            Msg::Buy => {
                let epoch = ctx.props().epoch;
                if !self.form.begin_submit(epoch) {
                    return false;
                }
                ctx.props().on_purchase.emit(PurchaseEvent::Submitted(epoch));
                let session = ctx.props().session.clone();
                let amount = self.form.amount().to_owned();
                let link = ctx.link().clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let result = purchase::buy(session.contract(), &amount).await;
                    link.send_message(Msg::Completed(epoch, result));
                });
                true
            }
            Msg::Completed(epoch, result) => {
                if !self.form.finish(epoch, result.is_ok()) {
                    return false;
                }
                let event = match result {
                    Ok(update) => PurchaseEvent::Succeeded(epoch, update),
                    Err(err) => PurchaseEvent::Failed(epoch, err.to_string()),
                };
                ctx.props().on_purchase.emit(event);
                true
            }
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        let props = ctx.props();
        if props.session != old_props.session || props.epoch != old_props.epoch {
            let ticket = self.form.session_changed();
            self.request_quote(ctx, ticket);
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let submitting = self.form.is_submitting();

        let oninput = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::UpdateAmount(input.value())
        });

        let onsubmit = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::Buy
        });

        html! {
            <form class="buy-form" {onsubmit}>
                <div class="input-group">
                    <label for="amount">{format!("Tokens to buy ({TOKEN_SYMBOL}):")}</label>
                    <input
                        type="number"
                        id="amount"
                        placeholder="enter the amount of tokens to buy"
                        value={self.form.amount().to_owned()}
                        {oninput}
                        required={true}
                        disabled={submitting}
                    />
                </div>
                if let Some(cost) = self.form.quote() {
                    <p class="quote">{format!("Cost: {} {NATIVE_SYMBOL}", format_units(cost))}</p>
                }
                <button type="submit" disabled={submitting}>
                    if submitting {
                        {"Processing..."}
                    } else {
                        {"Buy"}
                    }
                </button>
                { Self::status_view(&ctx.props().outcome) }
            </form>
        }
    }
}
