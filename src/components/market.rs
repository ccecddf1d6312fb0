use yew::prelude::*;

use crate::config::{NATIVE_SYMBOL, TOKEN_SYMBOL};
use crate::state::{DisplaySelector, MarketSnapshot};

/// Balance, rate or price, and total supply.
pub struct MarketPanel;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub snapshot: MarketSnapshot,
    pub selector: DisplaySelector,
}

impl Component for MarketPanel {
    type Message = ();
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let Props { snapshot, selector } = ctx.props();

        let headline = match selector {
            DisplaySelector::Rate => snapshot
                .rate
                .as_ref()
                .map(|rate| format!("1 {NATIVE_SYMBOL} = {rate} {TOKEN_SYMBOL}")),
            DisplaySelector::Price => snapshot
                .price
                .as_ref()
                .map(|price| format!("1 {TOKEN_SYMBOL} = {price} {NATIVE_SYMBOL}")),
        };

        html! {
            <div class="market-panel">
                if let Some(balance) = &snapshot.balance {
                    <p class="balance">{format!("Balance: {balance} {NATIVE_SYMBOL}")}</p>
                }
                if let Some(headline) = headline {
                    <p class="price">{headline}</p>
                }
                if let Some(supply) = &snapshot.total_supply {
                    <p class="supply">{format!("Total supply: {supply}")}</p>
                }
            </div>
        }
    }
}
