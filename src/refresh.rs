use futures::join;
use log::warn;

use crate::contract::SaleContract;
use crate::error::{DappError, RpcError};
use crate::rpc::Rpc;
use crate::state::MarketSnapshot;
use crate::utils::{format_units, reciprocal};

fn isolate<T>(field: &str, result: Result<T, DappError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("error getting the {field}: {err}");
            None
        }
    }
}

async fn read_rate<R: Rpc>(contract: &SaleContract<R>) -> Result<String, DappError> {
    let raw = contract.get_rate().await.map_err(DappError::Read)?;
    reciprocal(raw).ok_or_else(|| {
        DappError::Read(RpcError::Decode(format!(
            "rate() value {raw} has no displayable reciprocal"
        )))
    })
}

/// Reads rate, price, supply and wallet balance concurrently. A failed read
/// leaves its own field empty without affecting the others.
pub async fn load_snapshot<R: Rpc>(contract: &SaleContract<R>) -> MarketSnapshot {
    let (rate, price, supply, balance) = join!(
        read_rate(contract),
        contract.get_price(),
        contract.total_deposited(),
        contract.balance_of(contract.account()),
    );

    MarketSnapshot {
        rate: isolate("rate", rate),
        price: isolate("price", price.map(format_units).map_err(DappError::Read)),
        total_supply: isolate("total supply", supply.map_err(DappError::Read)),
        balance: isolate("balance", balance.map(format_units).map_err(DappError::Read)),
    }
}
