//! Typed binding to the token-sale contract.

use std::rc::Rc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use gloo_timers::future::TimeoutFuture;
use log::{debug, info};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::RpcError;
use crate::rpc::{parse_block_number, parse_data, parse_quantity, to_data, to_quantity, Rpc};

sol! {
    interface IExchange {
        function getPrice() external view returns (uint256);
        function rate() external view returns (uint256);
        function totalDeposited() external view returns (uint256);
        function getAmount(uint256 tokens) external view returns (uint256);
        function buyTokens(uint256 tokens) external payable;

        event tokensBought(address buyer, uint256 amount);
    }
}

/// A decoded `tokensBought` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensBought {
    pub buyer: Address,
    pub amount: U256,
    pub block: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: B256,
    pub block: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallRequest {
    from: String,
    to: String,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

pub struct SaleContract<R> {
    rpc: Rc<R>,
    address: Address,
    account: Address,
    receipt_poll_ms: u32,
}

impl<R: Rpc> SaleContract<R> {
    pub fn new(rpc: Rc<R>, address: Address, account: Address, receipt_poll_ms: u32) -> Self {
        Self {
            rpc,
            address,
            account,
            receipt_poll_ms,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    fn request_for(&self, data: Vec<u8>, value: Option<U256>) -> Result<Value, RpcError> {
        let request = CallRequest {
            from: self.account.to_string(),
            to: self.address.to_string(),
            data: to_data(&data),
            value: value.map(to_quantity),
        };
        serde_json::to_value(request).map_err(|e| RpcError::Decode(e.to_string()))
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return, RpcError> {
        let request = self.request_for(call.abi_encode(), None)?;
        let raw = self.rpc.request("eth_call", json!([request, "latest"])).await?;
        let bytes = parse_data(&raw)?;
        C::abi_decode_returns(&bytes, true)
            .map_err(|e| RpcError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }

    /// Raw price of one token in native base units.
    pub async fn get_price(&self) -> Result<U256, RpcError> {
        Ok(self.call(IExchange::getPriceCall {}).await?._0)
    }

    /// Raw `rate()` value; display code shows its reciprocal.
    pub async fn get_rate(&self) -> Result<U256, RpcError> {
        Ok(self.call(IExchange::rateCall {}).await?._0)
    }

    pub async fn total_deposited(&self) -> Result<U256, RpcError> {
        Ok(self.call(IExchange::totalDepositedCall {}).await?._0)
    }

    /// Cost in native base units of buying `tokens`.
    pub async fn get_amount(&self, tokens: U256) -> Result<U256, RpcError> {
        Ok(self.call(IExchange::getAmountCall { tokens }).await?._0)
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, RpcError> {
        let raw = self
            .rpc
            .request("eth_getBalance", json!([account.to_string(), "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let raw = self.rpc.request("eth_blockNumber", json!([])).await?;
        parse_block_number(&raw)
    }

    /// Submits `buyTokens(tokens)` paying `payment` and waits until it is mined.
    pub async fn buy_tokens(&self, tokens: U256, payment: U256) -> Result<TxReceipt, RpcError> {
        let request = self.request_for(IExchange::buyTokensCall { tokens }.abi_encode(), Some(payment))?;
        let raw_hash = self
            .rpc
            .request("eth_sendTransaction", json!([request]))
            .await?;
        let hash = parse_hash(&raw_hash)?;
        info!("buyTokens submitted: {hash}");

        loop {
            let receipt = self
                .rpc
                .request("eth_getTransactionReceipt", json!([hash.to_string()]))
                .await?;
            if !receipt.is_null() {
                return parse_receipt(hash, &receipt);
            }
            debug!("waiting for {hash} to be mined");
            TimeoutFuture::new(self.receipt_poll_ms).await;
        }
    }

    /// `tokensBought` logs emitted in the inclusive block range.
    pub async fn tokens_bought(&self, from: u64, to: u64) -> Result<Vec<TokensBought>, RpcError> {
        let filter = json!({
            "address": self.address.to_string(),
            "topics": [IExchange::tokensBought::SIGNATURE_HASH.to_string()],
            "fromBlock": to_quantity(U256::from(from)),
            "toBlock": to_quantity(U256::from(to)),
        });
        let raw = self.rpc.request("eth_getLogs", json!([filter])).await?;
        let logs = raw
            .as_array()
            .ok_or_else(|| RpcError::Decode(format!("expected log array, got {raw}")))?;
        logs.iter().map(decode_tokens_bought).collect()
    }
}

fn parse_hash(value: &Value) -> Result<B256, RpcError> {
    let bytes = parse_data(value)?;
    if bytes.len() != 32 {
        return Err(RpcError::Decode(format!("bad transaction hash {value}")));
    }
    Ok(B256::from_slice(&bytes))
}

fn parse_receipt(hash: B256, receipt: &Value) -> Result<TxReceipt, RpcError> {
    // Pre-Byzantium receipts have no status field.
    if let Some(status) = receipt.get("status").filter(|s| !s.is_null()) {
        if parse_quantity(status)?.is_zero() {
            return Err(RpcError::provider(format!("transaction {hash} reverted")));
        }
    }
    Ok(TxReceipt {
        hash,
        block: parse_block_number(&receipt["blockNumber"])?,
    })
}

fn decode_tokens_bought(log: &Value) -> Result<TokensBought, RpcError> {
    let topics = log["topics"]
        .as_array()
        .ok_or_else(|| RpcError::Decode("log without topics".into()))?
        .iter()
        .map(parse_hash)
        .collect::<Result<Vec<_>, _>>()?;
    let data = parse_data(&log["data"])?;
    let event = IExchange::tokensBought::decode_raw_log(topics, &data, true)
        .map_err(|e| RpcError::Decode(format!("tokensBought: {e}")))?;
    Ok(TokensBought {
        buyer: event.buyer,
        amount: event.amount,
        block: parse_block_number(&log["blockNumber"])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{eth_call_selector, word, MockRpc};
    use alloy_sol_types::SolValue;
    use futures::executor::block_on;

    fn contract(rpc: MockRpc) -> (Rc<MockRpc>, SaleContract<MockRpc>) {
        let rpc = Rc::new(rpc);
        let contract = SaleContract::new(
            rpc.clone(),
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0x11),
            0,
        );
        (rpc, contract)
    }

    #[test]
    fn reads_decode_uint_returns() {
        let (rpc, contract) = contract(MockRpc::new(|method, params| match method {
            "eth_call" => match eth_call_selector(params) {
                s if s == IExchange::getPriceCall::SELECTOR => Ok(word(U256::from(7u8))),
                s if s == IExchange::rateCall::SELECTOR => Ok(word(U256::from(2u8))),
                _ => Err(RpcError::provider("unexpected call")),
            },
            _ => Err(RpcError::provider("unexpected method")),
        }));

        assert_eq!(block_on(contract.get_price()).unwrap(), U256::from(7u8));
        assert_eq!(block_on(contract.get_rate()).unwrap(), U256::from(2u8));

        let calls = rpc.calls();
        assert_eq!(calls[0].1[0]["to"], Address::repeat_byte(0xaa).to_string());
        assert_eq!(calls[0].1[0]["from"], Address::repeat_byte(0x11).to_string());
        assert_eq!(calls[0].1[1], "latest");
    }

    #[test]
    fn get_amount_encodes_token_argument() {
        let (rpc, contract) = contract(MockRpc::new(|_, _| Ok(word(U256::from(42u8)))));
        assert_eq!(
            block_on(contract.get_amount(U256::from(10u8))).unwrap(),
            U256::from(42u8)
        );
        let data = parse_data(&rpc.calls()[0].1[0]["data"]).unwrap();
        let decoded = IExchange::getAmountCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.tokens, U256::from(10u8));
    }

    #[test]
    fn short_return_data_is_a_decode_error() {
        let (_, contract) = contract(MockRpc::new(|_, _| Ok(json!("0x"))));
        assert!(matches!(
            block_on(contract.total_deposited()),
            Err(RpcError::Decode(_))
        ));
    }

    #[test]
    fn buy_tokens_sends_value_and_waits_for_receipt() {
        let hash = B256::repeat_byte(0x42);
        let (rpc, contract) = contract(MockRpc::new(move |method, _| match method {
            "eth_sendTransaction" => Ok(json!(hash.to_string())),
            "eth_getTransactionReceipt" => {
                Ok(json!({ "status": "0x1", "blockNumber": "0x10" }))
            }
            _ => Err(RpcError::provider("unexpected method")),
        }));

        let receipt = block_on(contract.buy_tokens(U256::from(10u8), U256::from(500u16))).unwrap();
        assert_eq!(receipt, TxReceipt { hash, block: 16 });

        let calls = rpc.calls();
        assert_eq!(calls[0].0, "eth_sendTransaction");
        assert_eq!(calls[0].1[0]["value"], "0x1f4");
        let data = parse_data(&calls[0].1[0]["data"]).unwrap();
        assert_eq!(
            IExchange::buyTokensCall::abi_decode(&data, true).unwrap().tokens,
            U256::from(10u8)
        );
        assert_eq!(calls[1].1[0], hash.to_string());
    }

    #[test]
    fn reverted_receipt_is_an_error() {
        let hash = B256::repeat_byte(0x42);
        let (_, contract) = contract(MockRpc::new(move |method, _| match method {
            "eth_sendTransaction" => Ok(json!(hash.to_string())),
            _ => Ok(json!({ "status": "0x0", "blockNumber": "0x10" })),
        }));
        let err = block_on(contract.buy_tokens(U256::from(1u8), U256::from(1u8))).unwrap_err();
        assert!(err.to_string().contains("reverted"));
    }

    #[test]
    fn rejected_submission_passes_message_through() {
        let (_, contract) = contract(MockRpc::new(|_, _| {
            Err(RpcError::provider("insufficient funds"))
        }));
        let err = block_on(contract.buy_tokens(U256::from(1u8), U256::from(1u8))).unwrap_err();
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn decodes_tokens_bought_logs() {
        let buyer = Address::repeat_byte(0x22);
        let data = (buyer, U256::from(5u8)).abi_encode_params();
        let (rpc, contract) = contract(MockRpc::new(move |_, _| {
            Ok(json!([{
                "topics": [IExchange::tokensBought::SIGNATURE_HASH.to_string()],
                "data": to_data(&data),
                "blockNumber": "0x20",
            }]))
        }));

        let events = block_on(contract.tokens_bought(16, 32)).unwrap();
        assert_eq!(
            events,
            vec![TokensBought {
                buyer,
                amount: U256::from(5u8),
                block: 32
            }]
        );
        let filter = &rpc.calls()[0].1[0];
        assert_eq!(filter["fromBlock"], "0x10");
        assert_eq!(filter["toBlock"], "0x20");
    }
}
