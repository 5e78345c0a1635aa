//! Persistence layer for the buffet POS assistant
//!
//! Provides storage for:
//! - Sales records (`InMemorySalesStore`)

pub mod sales;

pub use sales::InMemorySalesStore;
