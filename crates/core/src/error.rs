//! Error types shared by sales store implementations

use thiserror::Error;

use crate::sale::SaleId;

/// Errors returned by a [`SalesStore`](crate::traits::SalesStore)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Sale {0} not found")]
    NotFound(SaleId),

    #[error("Invalid sale data: {0}")]
    InvalidData(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
