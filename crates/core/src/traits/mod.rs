//! Core traits for the buffet POS assistant
//!
//! ```text
//! Storage:
//!   - SalesStore: list / create / update / delete sale records
//! ```
//!
//! The dialogue session store and the LLM backend traits live next to their
//! implementations in the agent and llm crates.

mod sales_store;

pub use sales_store::SalesStore;
