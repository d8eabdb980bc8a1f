//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify pricing and order totals across random
//! inputs, and `tokio_test` to drive the session store synchronously.

use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;

use order_admin::adapters::session::MemorySessionStore;
use order_admin::domain::pricing::apply_extra_rate;
use order_admin::domain::{Offer, Order, OrderItem};
use order_admin::ports::{SessionId, SessionStore};

fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn offer(cents: i64) -> Offer {
    Offer {
        id: 1,
        sku: "SKU".to_string(),
        title: "Item".to_string(),
        price: price(cents),
    }
}

// ── Pricing Properties ──────────────────────────────────────

proptest! {
    /// A zero extra rate leaves a two-decimal base price unchanged.
    #[test]
    fn zero_rate_is_identity(cents in 0i64..10_000_000) {
        let base = price(cents);
        prop_assert_eq!(apply_extra_rate(base, Decimal::ZERO, 2), base);
    }

    /// Raising the rate never lowers the price.
    #[test]
    fn price_monotonic_in_rate(
        cents in 0i64..10_000_000,
        rate in -100i64..1000,
        delta in 0i64..500,
    ) {
        let base = price(cents);
        let low = apply_extra_rate(base, Decimal::from(rate), 2);
        let high = apply_extra_rate(base, Decimal::from(rate + delta), 2);
        prop_assert!(high >= low, "rate {rate} -> {low}, rate {} -> {high}", rate + delta);
    }

    /// Prices are never negative and never carry more than `scale` places.
    #[test]
    fn price_respects_scale_and_floor(
        cents in 0i64..10_000_000,
        rate_bp in -50_000i64..100_000,
        scale in 0u32..5,
    ) {
        let rate = Decimal::new(rate_bp, 2);
        let result = apply_extra_rate(price(cents), rate, scale);
        prop_assert!(result >= Decimal::ZERO);
        prop_assert!(result.scale() <= scale);
    }
}

// ── Order Total Properties ──────────────────────────────────

proptest! {
    /// The order total equals the sum of price * amount, and removing an
    /// item subtracts exactly its subtotal.
    #[test]
    fn total_tracks_items(lines in prop::collection::vec((1i64..100_000, 1u32..50), 1..12)) {
        let mut order = Order::new_draft();
        let mut expected = Decimal::ZERO;
        for (cents, amount) in &lines {
            order.add_item(OrderItem::from_offer(&offer(*cents), price(*cents), *amount));
            expected += price(*cents) * Decimal::from(*amount);
        }
        prop_assert_eq!(order.total(), expected);
        prop_assert_eq!(
            order.item_count(),
            lines.iter().map(|(_, a)| u64::from(*a)).sum::<u64>()
        );

        let first = order.items[0].clone();
        order.remove_item(first.id);
        prop_assert_eq!(order.total(), expected - first.subtotal());
    }
}

// ── Session Store Properties ────────────────────────────────

proptest! {
    /// Whatever draft is saved is loaded back, and clearing removes it.
    #[test]
    fn draft_survives_session_round_trip(amounts in prop::collection::vec(1u32..20, 0..6)) {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let session = SessionId::generate();
        let mut draft = Order::new_draft();
        for amount in &amounts {
            draft.add_item(OrderItem::from_offer(&offer(250), price(250), *amount));
        }

        let loaded = tokio_test::block_on(async {
            store.save_draft(session, &draft).await.unwrap();
            store.load_draft(session).await.unwrap()
        });
        prop_assert_eq!(loaded.as_ref(), Some(&draft));

        let cleared = tokio_test::block_on(async {
            store.clear_draft(session).await.unwrap();
            store.load_draft(session).await.unwrap()
        });
        prop_assert!(cleared.is_none());
    }
}
