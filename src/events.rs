use crate::contract::{SaleContract, TokensBought};
use crate::error::RpcError;
use crate::rpc::Rpc;
use crate::state::EventCursor;

#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    pub events: Vec<TokensBought>,
    pub cursor: EventCursor,
}

/// Fetches `tokensBought` logs mined since the cursor, at most
/// [`MAX_LOG_RANGE`](crate::state::MAX_LOG_RANGE) blocks per call. The
/// returned cursor replaces the caller's only when the poll succeeds.
pub async fn poll_tokens_bought<R: Rpc>(
    contract: &SaleContract<R>,
    mut cursor: EventCursor,
) -> Result<EventBatch, RpcError> {
    let head = contract.block_number().await?;
    let Some((from, to)) = cursor.window(head) else {
        return Ok(EventBatch {
            events: Vec::new(),
            cursor,
        });
    };
    let events = contract.tokens_bought(from, to).await?;
    cursor.commit(to);
    Ok(EventBatch { events, cursor })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use alloy_primitives::{Address, U256};
    use alloy_sol_types::{SolEvent, SolValue};
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::contract::IExchange;
    use crate::rpc::to_data;
    use crate::state::MAX_LOG_RANGE;
    use crate::testing::MockRpc;

    fn chain(head: Rc<Cell<u64>>) -> (Rc<MockRpc>, SaleContract<MockRpc>) {
        let data = (Address::repeat_byte(0x22), U256::from(3u8)).abi_encode_params();
        let rpc = MockRpc::new(move |method, _| match method {
            "eth_blockNumber" => Ok(json!(format!("0x{:x}", head.get()))),
            "eth_getLogs" => Ok(json!([{
                "topics": [IExchange::tokensBought::SIGNATURE_HASH.to_string()],
                "data": to_data(&data),
                "blockNumber": format!("0x{:x}", head.get()),
            }])),
            _ => Err(RpcError::provider("unexpected method")),
        });
        let rpc = Rc::new(rpc);
        let contract =
            SaleContract::new(rpc.clone(), Address::repeat_byte(0xaa), Address::repeat_byte(0x11), 0);
        (rpc, contract)
    }

    #[test]
    fn first_poll_only_marks_the_head() {
        let head = Rc::new(Cell::new(50));
        let (_, contract) = chain(head.clone());
        let batch = block_on(poll_tokens_bought(&contract, EventCursor::default())).unwrap();
        assert!(batch.events.is_empty());

        head.set(52);
        let batch = block_on(poll_tokens_bought(&contract, batch.cursor)).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].buyer, Address::repeat_byte(0x22));
        assert_eq!(batch.events[0].block, 52);

        let again = block_on(poll_tokens_bought(&contract, batch.cursor)).unwrap();
        assert!(again.events.is_empty());
    }

    #[test]
    fn long_gap_is_fetched_in_bounded_ranges() {
        let head = Rc::new(Cell::new(10));
        let (rpc, contract) = chain(head.clone());
        let batch = block_on(poll_tokens_bought(&contract, EventCursor::default())).unwrap();

        head.set(10 + 3 * MAX_LOG_RANGE);
        let batch = block_on(poll_tokens_bought(&contract, batch.cursor)).unwrap();
        block_on(poll_tokens_bought(&contract, batch.cursor)).unwrap();

        let ranges: Vec<_> = rpc
            .calls()
            .into_iter()
            .filter(|(method, _)| method == "eth_getLogs")
            .map(|(_, params)| (params[0]["fromBlock"].clone(), params[0]["toBlock"].clone()))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (json!("0xb"), json!("0x3f2")),
                (json!("0x3f3"), json!("0x7da")),
            ]
        );
    }

    #[test]
    fn failed_poll_surfaces_the_error() {
        let rpc = MockRpc::new(|_, _| Err(RpcError::provider("network down")));
        let contract =
            SaleContract::new(Rc::new(rpc), Address::repeat_byte(0xaa), Address::repeat_byte(0x11), 0);
        assert!(block_on(poll_tokens_bought(&contract, EventCursor::default())).is_err());
    }
}
