//! Core types and traits for the buffet POS assistant
//!
//! This crate provides the foundational types shared by every other crate:
//! - Sale records, creation payloads and partial patches
//! - The slot-filling draft for new sales and its required fields
//! - Validated commands produced by the intent classifier
//! - The buffet pricing table
//! - The `SalesStore` trait the dispatcher and HTTP layer talk to

pub mod command;
pub mod draft;
pub mod error;
pub mod pricing;
pub mod sale;
pub mod traits;

mod lenient;

pub use command::{Command, CommandError, CommandKind};
pub use draft::{InvalidFieldValue, SaleDraft, SaleField};
pub use error::{Result, StoreError};
pub use pricing::{BuffetTier, PricingTable};
pub use sale::{DateRange, NewSale, Sale, SaleId, SalePatch};
pub use traits::SalesStore;
