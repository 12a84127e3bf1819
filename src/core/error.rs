use thiserror::Error;

/// Why a persisted cart value was rejected.
#[derive(Debug, Error)]
pub enum CartCodecError {
    #[error("persisted cart is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("persisted cart is not a JSON object")]
    NotAnObject,
    #[error("cart key {0:?} is not a canonical item id")]
    InvalidId(String),
    #[error("quantity for item {id} is not a positive integer: {value}")]
    InvalidQuantity { id: i64, value: serde_json::Value },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The fetch did not complete. The previous snapshot is still current.
    #[error("catalog fetch failed")]
    FetchFailed(#[source] anyhow::Error),
}
