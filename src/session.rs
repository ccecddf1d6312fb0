use std::rc::Rc;

use alloy_primitives::Address;
use log::{error, info};

use crate::config::Config;
use crate::contract::SaleContract;
use crate::error::{DappError, RpcError};
use crate::provider::{Eip1193Provider, WalletInfo};

/// A connected wallet: the provider, the account it signs for, and the
/// contract binding derived from both.
pub struct Session {
    provider: Rc<Eip1193Provider>,
    contract: SaleContract<Eip1193Provider>,
}

impl Session {
    pub fn account(&self) -> Address {
        self.contract.account()
    }

    pub fn provider(&self) -> &Eip1193Provider {
        &self.provider
    }

    pub fn contract(&self) -> &SaleContract<Eip1193Provider> {
        &self.contract
    }

    fn bind(provider: Rc<Eip1193Provider>, account: Address, config: &Config) -> Self {
        let contract = SaleContract::new(
            provider.clone(),
            config.contract_address,
            account,
            config.receipt_poll_ms,
        );
        Self { provider, contract }
    }

    /// A new binding for `account` on the same provider.
    pub fn rebind(&self, account: Address, config: &Config) -> Self {
        Self::bind(self.provider.clone(), account, config)
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.provider, &other.provider) && self.account() == other.account()
    }
}

pub fn parse_account(raw: &str) -> Result<Address, DappError> {
    raw.parse()
        .map_err(|e| DappError::Connection(format!("wallet returned bad account {raw:?}: {e}")))
}

/// Connects to `wallet`, prompting the user to authorize the page.
pub async fn connect(wallet: &'static WalletInfo, config: &Config) -> Result<Session, DappError> {
    let provider = Eip1193Provider::locate(wallet).map_err(DappError::connection)?;
    let accounts = provider.request_accounts().await.map_err(|err| {
        error!("{} refused connection: {err}", wallet.name);
        DappError::connection(err)
    })?;
    let first = accounts
        .first()
        .ok_or_else(|| DappError::connection(RpcError::provider("wallet returned no accounts")))?;
    let account = parse_account(first)?;
    info!("connected {} as {account}", wallet.name);
    Ok(Session::bind(Rc::new(provider), account, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wallet_accounts() {
        assert_eq!(
            parse_account("0x1111111111111111111111111111111111111111").unwrap(),
            Address::repeat_byte(0x11)
        );
        assert!(matches!(parse_account("nope"), Err(DappError::Connection(_))));
    }
}
