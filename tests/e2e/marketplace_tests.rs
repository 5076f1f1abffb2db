//! End-to-end marketplace scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestHarness;
use peekly_service::store::queries::posts::{ListParams, Post, SortField, SortOrder};
use peekly_service::store::queries::users::User;
use peekly_service::{
    AccessStatus, EntitlementSource, Error, MarketplaceEvent, PaymentMethod, SettlementError,
    WalletSession,
};

const BUYER_ADDRESS: &str = "0xbuyer";
const CREATOR_ADDRESS: &str = "0xcreator";

/// Sign in a creator and publish one priced content item.
async fn publish(harness: &TestHarness, price: f64) -> (User, Post) {
    let creator = harness
        .service
        .store()
        .sign_in(Some(CREATOR_ADDRESS), Some("creator"))
        .await
        .expect("creator sign-in");
    let post = harness
        .service
        .store()
        .create_post(
            &creator.id,
            "ipfs://QmPremium",
            "premium content",
            price,
            Some(CREATOR_ADDRESS),
        )
        .await
        .expect("publish");
    (creator, post)
}

async fn buyer(harness: &TestHarness) -> User {
    harness
        .service
        .store()
        .sign_in(Some(BUYER_ADDRESS), Some("buyer"))
        .await
        .expect("buyer sign-in")
}

/// Paid content starts locked, a native purchase settles on chain, and
/// the next access check unlocks from the local record.
#[tokio::test]
async fn test_paid_content_locked_until_purchase() {
    let harness = TestHarness::setup(BUYER_ADDRESS);
    let (_, post) = publish(&harness, 0.05).await;
    let buyer = buyer(&harness).await;

    let before = harness.service.check_access(Some(&buyer.id), &post).await;
    assert_eq!(before, AccessStatus::Locked);

    let receipt = harness
        .service
        .purchase(
            &WalletSession::authenticated(BUYER_ADDRESS),
            &buyer.id,
            &post.id,
            PaymentMethod::Native,
        )
        .await
        .expect("purchase");
    assert_eq!(receipt.amount, 0.05);
    assert_eq!(receipt.units, 50_000_000_000_000_000);
    assert_eq!(harness.chain.confirmed_count(), 1);

    let after = harness.service.check_access(Some(&buyer.id), &post).await;
    assert_eq!(after, AccessStatus::Entitled(EntitlementSource::Recorded));
}

/// A settled purchase emits the settlement event and then the
/// entitlement record event, in that order.
#[tokio::test]
async fn test_purchase_emits_settlement_events() {
    let harness = TestHarness::setup(BUYER_ADDRESS);
    let (_, post) = publish(&harness, 0.05).await;
    let buyer = buyer(&harness).await;
    let mut events = harness.service.subscribe_events();

    harness
        .service
        .purchase(
            &WalletSession::authenticated(BUYER_ADDRESS),
            &buyer.id,
            &post.id,
            PaymentMethod::Native,
        )
        .await
        .expect("purchase");

    match events.recv().await.expect("first event") {
        MarketplaceEvent::PurchaseSettled {
            user_id, post_id, ..
        } => {
            assert_eq!(user_id, buyer.id);
            assert_eq!(post_id, post.id);
        }
        other => panic!("expected PurchaseSettled, got {other:?}"),
    }
    match events.recv().await.expect("second event") {
        MarketplaceEvent::ViewRecorded { user_id, post_id } => {
            assert_eq!(user_id, buyer.id);
            assert_eq!(post_id, post.id);
        }
        other => panic!("expected ViewRecorded, got {other:?}"),
    }
}

/// A payment confirmed on chain from another device unlocks content
/// here even though no local record exists, and the answer is cached.
#[tokio::test]
async fn test_payment_from_another_device_unlocks() {
    let harness = TestHarness::setup(BUYER_ADDRESS);
    let (_, post) = publish(&harness, 0.05).await;
    let buyer = buyer(&harness).await;

    harness.chain.seed_payment(BUYER_ADDRESS, &post.id);

    let status = harness.service.check_access(Some(&buyer.id), &post).await;
    assert_eq!(status, AccessStatus::Entitled(EntitlementSource::OnChain));

    let again = harness.service.check_access(Some(&buyer.id), &post).await;
    assert_eq!(again, AccessStatus::Entitled(EntitlementSource::Cached));
}

/// A token purchase with no existing allowance approves first, then
/// pays, and ends with the entitlement recorded.
#[tokio::test]
async fn test_token_purchase_with_approval() {
    let harness = TestHarness::setup(BUYER_ADDRESS);
    let (_, post) = publish(&harness, 1.2345).await;
    let buyer = buyer(&harness).await;

    let receipt = harness
        .service
        .purchase(
            &WalletSession::authenticated(BUYER_ADDRESS),
            &buyer.id,
            &post.id,
            PaymentMethod::Token {
                address: "0xusdc".into(),
                decimals: 6,
            },
        )
        .await
        .expect("token purchase");
    assert_eq!(receipt.units, 1_234_500);
    assert_eq!(harness.chain.confirmed_count(), 1);

    assert!(harness
        .service
        .store()
        .has_viewed(&buyer.id, &post.id)
        .await
        .expect("has_viewed"));
}

/// A reverted simulation submits nothing and leaves the content locked.
#[tokio::test]
async fn test_reverted_simulation_leaves_no_entitlement() {
    let harness = TestHarness::setup(BUYER_ADDRESS);
    let (_, post) = publish(&harness, 0.05).await;
    let buyer = buyer(&harness).await;

    harness.chain.revert_simulations("execution reverted");

    let err = harness
        .service
        .purchase(
            &WalletSession::authenticated(BUYER_ADDRESS),
            &buyer.id,
            &post.id,
            PaymentMethod::Native,
        )
        .await
        .expect_err("simulation must revert");
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::SimulationReverted(_))
    ));

    assert_eq!(harness.chain.confirmed_count(), 0);
    let status = harness.service.check_access(Some(&buyer.id), &post).await;
    assert_eq!(status, AccessStatus::Locked);
}

/// Without a settlement contract, purchases are rejected and paid
/// content stays locked, but free content still renders.
#[tokio::test]
async fn test_offline_service_keeps_paid_content_locked() {
    let harness = TestHarness::setup_offline();
    let (creator, post) = publish(&harness, 0.05).await;
    let buyer = buyer(&harness).await;

    let err = harness
        .service
        .purchase(
            &WalletSession::authenticated(BUYER_ADDRESS),
            &buyer.id,
            &post.id,
            PaymentMethod::Native,
        )
        .await
        .expect_err("no contract");
    assert!(matches!(err, Error::Validation(_)));

    let status = harness.service.check_access(Some(&buyer.id), &post).await;
    assert_eq!(status, AccessStatus::Locked);

    let free = harness
        .service
        .store()
        .create_post(&creator.id, "ipfs://QmFree", "free content", 0.0, None)
        .await
        .expect("free post");
    let status = harness.service.check_access(Some(&buyer.id), &free).await;
    assert_eq!(status, AccessStatus::Free);
}

/// The like toggle: like, duplicate like, unlike, duplicate unlike.
#[tokio::test]
async fn test_like_toggle_lifecycle() {
    let harness = TestHarness::setup_offline();
    let (_, post) = publish(&harness, 0.0).await;
    let buyer = buyer(&harness).await;

    let count = harness
        .service
        .like_post(&post.id, &buyer.id)
        .await
        .expect("like");
    assert_eq!(count, 1);

    let err = harness
        .service
        .like_post(&post.id, &buyer.id)
        .await
        .expect_err("double like");
    assert!(matches!(err, Error::AlreadyLiked));

    let count = harness
        .service
        .unlike_post(&post.id, &buyer.id)
        .await
        .expect("unlike");
    assert_eq!(count, 0);

    let err = harness
        .service
        .unlike_post(&post.id, &buyer.id)
        .await
        .expect_err("double unlike");
    assert!(matches!(err, Error::NotLiked));
}

/// Catalog listing with search, sort and pagination.
#[tokio::test]
async fn test_catalog_search_and_pagination() {
    let harness = TestHarness::setup_offline();
    let creator = harness
        .service
        .store()
        .sign_in(Some(CREATOR_ADDRESS), Some("alice"))
        .await
        .expect("creator");

    for i in 0..5 {
        harness
            .service
            .store()
            .create_post(
                &creator.id,
                &format!("ipfs://Qm{i}"),
                &format!("landscape photo {i}"),
                f64::from(i),
                Some(CREATOR_ADDRESS),
            )
            .await
            .expect("post");
    }
    harness
        .service
        .store()
        .create_post(&creator.id, "ipfs://QmX", "portrait", 9.0, None)
        .await
        .expect("post");

    // Search narrows to matching descriptions
    let page = harness
        .service
        .store()
        .list_posts(&ListParams {
            search: Some("landscape".into()),
            ..ListParams::default()
        })
        .await
        .expect("search");
    assert_eq!(page.total_count, 5);

    // Pagination splits the results
    let page = harness
        .service
        .store()
        .list_posts(&ListParams {
            limit: 2,
            page: 3,
            search: Some("landscape".into()),
            ..ListParams::default()
        })
        .await
        .expect("page 3");
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.posts.len(), 1);

    // Sorting by price ascending puts the cheapest first
    let page = harness
        .service
        .store()
        .list_posts(&ListParams {
            sort_by: SortField::Price,
            sort_order: SortOrder::Asc,
            ..ListParams::default()
        })
        .await
        .expect("sorted");
    assert_eq!(page.posts[0].post.price, 0.0);
    assert_eq!(page.posts[5].post.price, 9.0);
}

/// Purchase history and per-content revenue aggregate across buyers.
#[tokio::test]
async fn test_view_history_and_stats() {
    let harness = TestHarness::setup(BUYER_ADDRESS);
    let (_, post) = publish(&harness, 0.05).await;
    let first = buyer(&harness).await;
    let second = harness
        .service
        .store()
        .sign_in(Some("0xother"), None)
        .await
        .expect("second buyer");

    harness
        .service
        .store()
        .create_view_content(&first.id, &post.id, 0.05, true)
        .await
        .expect("first view");
    harness
        .service
        .store()
        .create_view_content(&second.id, &post.id, 0.05, true)
        .await
        .expect("second view");

    let history = harness
        .service
        .store()
        .user_view_history(&first.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].view.post_id, post.id);
    assert_eq!(history[0].post_description, "premium content");

    let stats = harness
        .service
        .store()
        .post_view_stats(&post.id)
        .await
        .expect("stats");
    assert_eq!(stats.view_count, 2);
    assert!((stats.total_revenue - 0.1).abs() < 1e-9);
}
