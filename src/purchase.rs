//! Quote and buy steps of the purchase flow.

use alloy_primitives::U256;
use futures::join;
use log::{error, info, warn};

use crate::contract::SaleContract;
use crate::error::DappError;
use crate::rpc::Rpc;
use crate::state::PostPurchase;
use crate::utils::{format_units, parse_token_quantity};

fn tokens_from_input(input: &str) -> Result<U256, DappError> {
    parse_token_quantity(input)
        .ok_or_else(|| DappError::Quote(format!("invalid token quantity {:?}", input.trim())))
}

/// Cost in native base units of buying the quantity typed by the user.
pub async fn quote<R: Rpc>(contract: &SaleContract<R>, input: &str) -> Result<U256, DappError> {
    let tokens = tokens_from_input(input)?;
    contract.get_amount(tokens).await.map_err(DappError::quote)
}

/// Re-quotes at submit time, pays exactly that amount, and re-reads supply
/// and balance once the transaction is mined.
pub async fn buy<R: Rpc>(contract: &SaleContract<R>, input: &str) -> Result<PostPurchase, DappError> {
    let tokens = tokens_from_input(input)?;
    let payment = contract.get_amount(tokens).await.map_err(|err| {
        error!("error quoting {tokens} tokens: {err}");
        DappError::quote(err)
    })?;
    info!("buying {tokens} tokens for {} wei", payment);

    let receipt = contract.buy_tokens(tokens, payment).await.map_err(|err| {
        if err.is_user_rejection() {
            info!("purchase rejected in the wallet");
        } else {
            error!("error buying tokens: {err}");
        }
        DappError::transaction(err)
    })?;
    info!("purchase {} mined in block {}", receipt.hash, receipt.block);

    let (supply, balance) = join!(
        contract.total_deposited(),
        contract.balance_of(contract.account()),
    );
    Ok(PostPurchase {
        total_supply: supply
            .map_err(|err| warn!("error getting the total supply: {err}"))
            .ok(),
        balance: balance
            .map(format_units)
            .map_err(|err| warn!("error getting the balance: {err}"))
            .ok(),
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use alloy_primitives::Address;
    use alloy_sol_types::SolCall;
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::contract::IExchange;
    use crate::error::RpcError;
    use crate::rpc::parse_data;
    use crate::testing::{eth_call_selector, word, MockRpc};

    const HASH: &str = "0x4242424242424242424242424242424242424242424242424242424242424242";

    fn sale(send_error: Option<&'static str>) -> MockRpc {
        MockRpc::new(move |method, params| match method {
            "eth_call" => match eth_call_selector(params) {
                s if s == IExchange::getAmountCall::SELECTOR => {
                    let data = parse_data(&params[0]["data"])?;
                    let call = IExchange::getAmountCall::abi_decode(&data, true)
                        .map_err(|e| RpcError::Decode(e.to_string()))?;
                    Ok(word(call.tokens * U256::from(50u8)))
                }
                s if s == IExchange::totalDepositedCall::SELECTOR => {
                    Ok(word(U256::from(1010u16)))
                }
                _ => Err(RpcError::provider("unexpected call")),
            },
            "eth_sendTransaction" => match send_error {
                Some(message) => Err(RpcError::provider(message)),
                None => Ok(json!(HASH)),
            },
            "eth_getTransactionReceipt" => Ok(json!({ "status": "0x1", "blockNumber": "0x7" })),
            "eth_getBalance" => Ok(json!("0xde0b6b3a7640000")),
            _ => Err(RpcError::provider("unexpected method")),
        })
    }

    fn contract(rpc: MockRpc) -> (Rc<MockRpc>, SaleContract<MockRpc>) {
        let rpc = Rc::new(rpc);
        let contract =
            SaleContract::new(rpc.clone(), Address::repeat_byte(0xaa), Address::repeat_byte(0x11), 0);
        (rpc, contract)
    }

    #[test]
    fn quote_uses_current_input() {
        let (_, contract) = contract(sale(None));
        assert_eq!(block_on(quote(&contract, "10")).unwrap(), U256::from(500u16));
    }

    #[test]
    fn quote_rejects_non_integer_input_without_calling_the_contract() {
        let (rpc, contract) = contract(sale(None));
        assert!(matches!(block_on(quote(&contract, "1.5")), Err(DappError::Quote(_))));
        assert!(rpc.calls().is_empty());
    }

    #[test]
    fn buy_pays_the_fresh_quote_then_rereads() {
        let (rpc, contract) = contract(sale(None));
        let update = block_on(buy(&contract, "10")).unwrap();
        assert_eq!(
            update,
            PostPurchase {
                total_supply: Some(U256::from(1010u16)),
                balance: Some("1.0".into()),
            }
        );

        let methods = rpc.methods();
        let quoted = methods.iter().position(|m| m == "eth_call").unwrap();
        let sent = methods.iter().position(|m| m == "eth_sendTransaction").unwrap();
        assert!(quoted < sent);
        assert_eq!(rpc.calls()[sent].1[0]["value"], "0x1f4");
    }

    #[test]
    fn rejected_submission_keeps_the_provider_message() {
        let (rpc, contract) = contract(sale(Some("insufficient funds")));
        let err = block_on(buy(&contract, "10")).unwrap_err();
        assert_eq!(err, DappError::Transaction("insufficient funds".into()));
        assert!(!rpc.methods().contains(&"eth_getTransactionReceipt".to_string()));
    }
}
