//! Operator sweep of tokens sent straight to the market account.
//!
//! Purchase proceeds go from customer to vendor in one transfer and never
//! rest on the market account, so anything found there arrived outside
//! the purchase flow and belongs to the operator.

use bazaar_token::{Address, Amount, ItemRegistry, PaymentLedger};
use tracing::{info, warn};

use crate::error::MarketError;
use crate::market::Marketplace;

impl<P: PaymentLedger, R: ItemRegistry> Marketplace<P, R> {
    /// Move the market account's whole balance of `token` to the operator.
    ///
    /// `token` may be the payment currency or any other fungible token
    /// that was sent to the market account. Returns the amount moved; an
    /// empty balance moves nothing and returns zero.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotAuthorized`] if `caller` is not the
    /// operator, and [`MarketError::PaymentFailed`] if the token ledger
    /// rejects the balance query or transfer.
    pub async fn release_tokens<T: PaymentLedger>(
        &self,
        caller: &Address,
        token: &T,
    ) -> Result<Amount, MarketError> {
        let _guard = self.state.lock().await;
        let market = &self.config.market_account;
        let operator = &self.config.operator;

        if caller != operator {
            warn!(caller = %caller, token = %token.token(), "token release refused");
            return Err(MarketError::not_authorized(format!(
                "{caller} is not the marketplace operator"
            )));
        }

        let stray = token
            .balance_of(market)
            .await
            .map_err(MarketError::PaymentFailed)?;
        if stray.is_zero() {
            info!(token = %token.token(), "no stray tokens to release");
            return Ok(Amount::ZERO);
        }

        let transfer = token
            .transfer(market, operator, stray)
            .await
            .map_err(MarketError::PaymentFailed)?;

        info!(
            token = %token.token(),
            operator = %operator,
            amount = %stray,
            transfer = %transfer.id,
            "stray tokens released"
        );
        Ok(stray)
    }

    /// [`release_tokens`](Self::release_tokens) for the payment currency.
    ///
    /// # Errors
    ///
    /// Same as [`release_tokens`](Self::release_tokens).
    pub async fn release_currency(&self, caller: &Address) -> Result<Amount, MarketError> {
        self.release_tokens(caller, &self.payments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use bazaar_token::{InMemoryItemRegistry, InMemoryPaymentLedger};

    type TestMarket = Marketplace<InMemoryPaymentLedger, InMemoryItemRegistry>;

    fn setup_market() -> TestMarket {
        let config = MarketConfig::new(Address::generate(), Address::generate());
        Marketplace::new(config, InMemoryPaymentLedger::new(), InMemoryItemRegistry::new())
            .expect("valid config")
    }

    #[tokio::test]
    async fn test_release_sweeps_whole_balance() {
        let market = setup_market();
        let market_account = market.config().market_account.clone();
        let operator = market.config().operator.clone();
        market
            .payments()
            .mint(&market_account, Amount::new(99_000))
            .await
            .unwrap();

        let released = market.release_currency(&operator).await.expect("release");

        assert_eq!(released, Amount::new(99_000));
        assert_eq!(
            market.payments().balance_of(&operator).await.unwrap(),
            Amount::new(99_000)
        );
        assert_eq!(
            market.payments().balance_of(&market_account).await.unwrap(),
            Amount::ZERO
        );
    }

    #[tokio::test]
    async fn test_release_by_non_operator() {
        let market = setup_market();
        let market_account = market.config().market_account.clone();
        market
            .payments()
            .mint(&market_account, Amount::new(10))
            .await
            .unwrap();

        let result = market.release_currency(&Address::generate()).await;

        assert!(matches!(result, Err(MarketError::NotAuthorized(_))));
        assert_eq!(
            market.payments().balance_of(&market_account).await.unwrap(),
            Amount::new(10)
        );
    }

    #[tokio::test]
    async fn test_release_empty_balance_moves_nothing() {
        let market = setup_market();
        let operator = market.config().operator.clone();
        let before = market.payments().transfer_count().await;

        let released = market.release_currency(&operator).await.unwrap();

        assert_eq!(released, Amount::ZERO);
        assert_eq!(market.payments().transfer_count().await, before);
    }

    #[tokio::test]
    async fn test_release_other_token() {
        let market = setup_market();
        let market_account = market.config().market_account.clone();
        let operator = market.config().operator.clone();
        let other = InMemoryPaymentLedger::new();
        other.mint(&market_account, Amount::new(5)).await.unwrap();

        let released = market.release_tokens(&operator, &other).await.unwrap();

        assert_eq!(released, Amount::new(5));
        assert_eq!(other.balance_of(&operator).await.unwrap(), Amount::new(5));
        // the currency ledger is untouched
        assert_eq!(market.payments().transfer_count().await, 0);
    }
}
