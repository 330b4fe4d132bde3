//! Invoice property tests
//!
//! Amount invariants checked over random transactions and tax rates.

use std::sync::Arc;

use cashbox_billing::Invoice;
use cashbox_core::{CurrencyFormat, CurrencyFormatter, Customer, Transaction};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn invoice(amount: f64, tax: f64, add_ons: &[f64], discounts: &[f64]) -> Invoice<Customer> {
    let created = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
    let tx = add_ons
        .iter()
        .enumerate()
        .fold(Transaction::new("tx_prop", amount, created), |tx, (i, a)| {
            tx.with_add_on(format!("addon-{}", i), *a)
        });
    let tx = discounts
        .iter()
        .enumerate()
        .fold(tx, |tx, (i, d)| tx.with_discount(format!("COUPON{}", i), *d));

    Invoice::new(
        Customer::new("cus_prop").with_tax_percentage(tax),
        tx,
        Arc::new(CurrencyFormat::default()),
    )
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    /// The raw total never goes below zero, whatever the provider sends.
    #[test]
    fn prop_raw_total_non_negative(amount in -1.0e7f64..1.0e7) {
        let inv = invoice(amount, 0.0, &[], &[]);
        prop_assert!(inv.raw_total() >= 0.0);
        prop_assert_eq!(inv.raw_total(), amount.max(0.0));
    }

    /// Adding the customer's tax back onto the net gives the raw total.
    #[test]
    fn prop_net_restores_raw_total(amount in -1.0e7f64..1.0e7, tax in 0.0f64..100.0) {
        let inv = invoice(amount, tax, &[], &[]);
        prop_assert!(close(inv.net() * (1.0 + tax / 100.0), inv.raw_total()));
        prop_assert!(inv.vat() >= 0.0);
    }

    /// The subtotal is the total with every discount added back.
    #[test]
    fn prop_subtotal_adds_back_discounts(
        amount in 0.0f64..1.0e6,
        discounts in prop::collection::vec(0.0f64..1.0e4, 0..5),
    ) {
        let inv = invoice(amount, 0.0, &[], &discounts);
        let expected = CurrencyFormat::default().format(inv.raw_total() + inv.discount_amount());
        prop_assert_eq!(inv.subtotal(), expected);
        prop_assert_eq!(inv.has_discount(), !discounts.is_empty());
    }

    /// Add-on amounts sum across the collection, in provider order.
    #[test]
    fn prop_add_on_amount_is_sum(add_ons in prop::collection::vec(0.0f64..1.0e4, 0..8)) {
        let inv = invoice(10.0, 0.0, &add_ons, &[]);
        prop_assert!(close(inv.add_on_amount(), add_ons.iter().sum()));
        prop_assert_eq!(inv.add_ons().len(), add_ons.len());
        prop_assert_eq!(inv.has_add_on(), !add_ons.is_empty());
    }
}
