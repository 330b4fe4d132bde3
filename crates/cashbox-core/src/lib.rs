//! Cashbox Core
//!
//! Read-only projections of payment-provider data, the ports the billing
//! layer consumes, and currency formatting. Nothing here talks to the
//! network; adapters live in `cashbox-billing` and `cashbox-api`.

pub mod customer;
pub mod error;
pub mod ids;
pub mod money;
pub mod notification;
pub mod ports;
pub mod transaction;

pub use customer::{Billable, Customer};
pub use error::{Error, Result};
pub use ids::*;
pub use money::{CurrencyFormat, CurrencyFormatter};
pub use notification::WebhookNotification;
pub use transaction::{AddOn, Discount, Transaction};
