//! Integration tests for the marketplace lifecycle.
//!
//! Covers:
//! 1. Quantity-priced listing, purchase, sell-out and cancellation
//! 2. Custody escrow from deposit to delivery
//! 3. Atomicity when the payment ledger rejects a transfer
//! 4. Operator recovery of stray tokens
//! 5. Snapshots and restore

use std::sync::Arc;

use bazaar_market::{
    CustomerId, MarketConfig, MarketError, MarketSnapshot, Marketplace, Purchased, VendorId,
};
use bazaar_token::{
    Address, Amount, InMemoryItemRegistry, InMemoryPaymentLedger, ItemId, ItemRegistry,
    PaymentLedger,
};
use tracing_subscriber::EnvFilter;

type Market = Marketplace<InMemoryPaymentLedger, InMemoryItemRegistry>;

// ============================================================================
// Helper Functions
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn create_market() -> Market {
    init_tracing();
    let config = MarketConfig::new(Address::generate(), Address::generate()).with_name("it-shop");
    Marketplace::new(config, InMemoryPaymentLedger::new(), InMemoryItemRegistry::new())
        .expect("valid config")
}

async fn create_customer(market: &Market, balance: u64) -> Address {
    let customer = Address::generate();
    market
        .payments()
        .mint(&customer, Amount::new(balance))
        .await
        .expect("mint");
    market
        .payments()
        .approve(&customer, &market.config().market_account, Amount::new(balance))
        .await
        .expect("approve");
    customer
}

async fn balance(market: &Market, owner: &Address) -> u64 {
    market
        .payments()
        .balance_of(owner)
        .await
        .expect("balance")
        .units()
}

// ============================================================================
// Quantity-Priced Listings
// ============================================================================

#[tokio::test]
async fn full_catalog_lifecycle() {
    let market = create_market();
    let vendor = Address::generate();
    let customer = create_customer(&market, 20_000_000).await;

    assert_eq!(market.list_product(&vendor, Amount::new(1_000_000), 3).await.unwrap(), 0);
    assert_eq!(market.list_product(&vendor, Amount::new(2_000_000), 6).await.unwrap(), 1);
    assert_eq!(market.list_product(&vendor, Amount::new(500_000), 15).await.unwrap(), 2);

    // cancelled before anyone buys
    market.cancel(&vendor, 2).await.unwrap();
    assert_eq!(market.product(&vendor, 2).await.unwrap().supply(), 0);

    for _ in 0..2 {
        market.buy(&customer, &vendor, 0).await.unwrap();
    }
    for _ in 0..6 {
        market.buy(&customer, &vendor, 1).await.unwrap();
    }

    let first = market.product(&vendor, 0).await.unwrap();
    assert_eq!((first.sold(), first.supply()), (2, 1));
    let second = market.product(&vendor, 1).await.unwrap();
    assert_eq!((second.sold(), second.supply()), (6, 0));

    let transfers = market.payments().transfer_count().await;
    assert!(matches!(
        market.buy(&customer, &vendor, 1).await,
        Err(MarketError::SoldOut { index: 1, .. })
    ));
    assert!(matches!(
        market.buy(&customer, &vendor, 2).await,
        Err(MarketError::SoldOut { index: 2, .. })
    ));
    assert_eq!(market.payments().transfer_count().await, transfers);

    assert_eq!(balance(&market, &vendor).await, 14_000_000);
    assert_eq!(balance(&market, &customer).await, 6_000_000);
    assert_eq!(market.purchase_count(&customer).await, 8);
    assert_eq!(market.total_spent(&customer).await, Amount::new(14_000_000));
    assert_eq!(
        market.purchase(&customer, 7).await.unwrap().purchased,
        Purchased::Product(1)
    );
    assert_eq!(market.vendor_count().await, 1);
    assert_eq!(market.customer_count().await, 1);
}

#[tokio::test]
async fn cancel_after_purchases_keeps_sold() {
    let market = create_market();
    let vendor = Address::generate();
    let customer = create_customer(&market, 1_000).await;
    market.list_product(&vendor, Amount::new(10), 10).await.unwrap();

    for _ in 0..4 {
        market.buy(&customer, &vendor, 0).await.unwrap();
    }
    market.cancel(&vendor, 0).await.unwrap();
    market.cancel(&vendor, 0).await.unwrap();

    let product = market.product(&vendor, 0).await.unwrap();
    assert_eq!(product.supply(), 0);
    assert_eq!(product.sold(), 4);
    assert_eq!(product.price(), Amount::new(10));
    assert!(!market.is_available(&vendor, 0).await);
}

#[tokio::test]
async fn registry_counts_distinct_addresses() {
    let market = create_market();
    let vendors: Vec<Address> = (0..3).map(|_| Address::generate()).collect();
    let mut customers = Vec::new();
    for _ in 0..4 {
        customers.push(create_customer(&market, 1_000).await);
    }

    for vendor in &vendors {
        for _ in 0..3 {
            market.list_product(vendor, Amount::new(5), 10).await.unwrap();
        }
    }
    for customer in &customers {
        for vendor in &vendors {
            market.buy(customer, vendor, 1).await.unwrap();
        }
    }

    assert_eq!(market.vendor_count().await, 3);
    assert_eq!(market.customer_count().await, 4);
    for (ordinal, vendor) in vendors.iter().enumerate() {
        assert_eq!(market.vendor_id(vendor).await, Some(VendorId(ordinal)));
        assert_eq!(&market.vendor_at(VendorId(ordinal)).await.unwrap(), vendor);
    }
    for (ordinal, customer) in customers.iter().enumerate() {
        assert_eq!(market.customer_id(customer).await, Some(CustomerId(ordinal)));
    }
    assert!(matches!(
        market.vendor_at(VendorId(3)).await,
        Err(MarketError::NotFound(_))
    ));
}

#[tokio::test]
async fn rejected_payment_changes_nothing() {
    let market = create_market();
    let vendor = Address::generate();
    market.list_product(&vendor, Amount::new(100), 2).await.unwrap();

    // funded but no allowance
    let customer = Address::generate();
    market
        .payments()
        .mint(&customer, Amount::new(1_000))
        .await
        .unwrap();

    let result = market.buy(&customer, &vendor, 0).await;

    assert!(matches!(result, Err(MarketError::PaymentFailed(_))));
    let product = market.product(&vendor, 0).await.unwrap();
    assert_eq!((product.supply(), product.sold()), (2, 0));
    assert_eq!(market.purchase_count(&customer).await, 0);
    assert_eq!(market.customer_count().await, 0);
    assert_eq!(balance(&market, &customer).await, 1_000);
}

#[tokio::test]
async fn concurrent_buyers_never_oversell() {
    let market = Arc::new(create_market());
    let vendor = Address::generate();
    market.list_product(&vendor, Amount::new(50), 3).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let customer = create_customer(&market, 50).await;
        let market = Arc::clone(&market);
        let vendor = vendor.clone();
        handles.push(tokio::spawn(async move {
            market.buy(&customer, &vendor, 0).await.is_ok()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 3);
    let product = market.product(&vendor, 0).await.unwrap();
    assert_eq!((product.supply(), product.sold()), (0, 3));
    assert_eq!(balance(&market, &vendor).await, 150);
    assert_eq!(market.customer_count().await, 3);
}

// ============================================================================
// Custody Escrow
// ============================================================================

#[tokio::test]
async fn item_custody_lifecycle() {
    let market = create_market();
    let market_account = market.config().market_account.clone();
    let vendor = Address::generate();
    let customer = create_customer(&market, 10_000).await;
    let sword = ItemId::new(1);
    let shield = ItemId::new(2);

    for item in [sword, shield] {
        market.items().mint(&vendor, item).await.unwrap();
    }
    market
        .items()
        .set_approval_for_all(&vendor, &market_account, true)
        .await
        .unwrap();

    market.deposit(&vendor, sword, Amount::new(3_000)).await.unwrap();
    market.deposit(&vendor, shield, Amount::new(1_500)).await.unwrap();
    assert_eq!(market.items().items_of(&market_account).await, vec![sword, shield]);
    assert_eq!(market.escrowed_items(&vendor).await.len(), 2);

    let receipt = market.buy_product(&customer, &vendor, sword).await.unwrap();
    assert_eq!(receipt.record.purchased, Purchased::Item(sword));
    assert_eq!(market.items().owner_of(sword).await.unwrap(), customer);
    assert_eq!(balance(&market, &vendor).await, 3_000);

    market.withdraw(&vendor, shield).await.unwrap();
    assert_eq!(market.items().owner_of(shield).await.unwrap(), vendor);

    assert!(market.escrowed_items(&vendor).await.is_empty());
    assert!(matches!(
        market.buy_product(&customer, &vendor, shield).await,
        Err(MarketError::NotFound(_))
    ));
    assert_eq!(balance(&market, &customer).await, 7_000);
}

#[tokio::test]
async fn item_purchase_with_wrong_vendor() {
    let market = create_market();
    let market_account = market.config().market_account.clone();
    let vendor = Address::generate();
    let customer = create_customer(&market, 10_000).await;
    let item = ItemId::new(9);
    market.items().mint(&vendor, item).await.unwrap();
    market
        .items()
        .set_approval_for_all(&vendor, &market_account, true)
        .await
        .unwrap();
    market.deposit(&vendor, item, Amount::new(500)).await.unwrap();

    let result = market.buy_product(&customer, &Address::generate(), item).await;

    assert!(matches!(result, Err(MarketError::VendorMismatch { .. })));
    assert_eq!(market.items().owner_of(item).await.unwrap(), market_account);
    assert_eq!(balance(&market, &customer).await, 10_000);
    assert_eq!(market.customer_count().await, 0);
}

// ============================================================================
// Recovery
// ============================================================================

#[tokio::test]
async fn stray_tokens_return_to_operator() {
    let market = create_market();
    let market_account = market.config().market_account.clone();
    let operator = market.config().operator.clone();
    let vendor = Address::generate();
    let customer = create_customer(&market, 1_000).await;

    market.list_product(&vendor, Amount::new(400), 1).await.unwrap();
    market.buy(&customer, &vendor, 0).await.unwrap();

    market
        .payments()
        .mint(&operator, Amount::new(99_000))
        .await
        .unwrap();
    market
        .payments()
        .transfer(&operator, &market_account, Amount::new(99_000))
        .await
        .unwrap();
    assert_eq!(balance(&market, &operator).await, 0);

    let released = market.release_currency(&operator).await.unwrap();

    assert_eq!(released, Amount::new(99_000));
    assert_eq!(balance(&market, &operator).await, 99_000);
    assert_eq!(balance(&market, &market_account).await, 0);
    assert_eq!(balance(&market, &vendor).await, 400);
}

#[tokio::test]
async fn only_operator_may_release() {
    let market = create_market();
    let market_account = market.config().market_account.clone();
    market
        .payments()
        .mint(&market_account, Amount::new(1))
        .await
        .unwrap();

    for caller in [market_account.clone(), Address::generate()] {
        assert!(matches!(
            market.release_currency(&caller).await,
            Err(MarketError::NotAuthorized(_))
        ));
    }
    assert_eq!(balance(&market, &market_account).await, 1);
}

// ============================================================================
// Snapshots
// ============================================================================

#[tokio::test]
async fn trading_resumes_after_restore() {
    let market = create_market();
    let vendor = Address::generate();
    let customer = create_customer(&market, 1_000).await;
    market.list_product(&vendor, Amount::new(100), 2).await.unwrap();
    market.buy(&customer, &vendor, 0).await.unwrap();

    let json = market.snapshot().await.to_json().unwrap();
    let snapshot = MarketSnapshot::from_json(&json).unwrap();
    assert_eq!(snapshot.market, "it-shop");

    let restored = Marketplace::restore(
        market.config().clone(),
        market.payments().clone(),
        market.items().clone(),
        snapshot,
    )
    .await
    .unwrap();

    restored.buy(&customer, &vendor, 0).await.unwrap();
    assert!(matches!(
        restored.buy(&customer, &vendor, 0).await,
        Err(MarketError::SoldOut { .. })
    ));
    assert_eq!(restored.purchase_count(&customer).await, 2);
    assert_eq!(restored.customer_id(&customer).await, Some(CustomerId(0)));

    let json: serde_json::Value =
        serde_json::from_str(&restored.snapshot().await.to_json().unwrap()).unwrap();
    assert_eq!(json["state"]["accounts"]["customers"].as_array().map(Vec::len), Some(1));
}
