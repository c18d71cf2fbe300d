use thiserror::Error;

#[derive(Error, Debug)]
pub enum DropshipError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid sale price: {price}")]
    InvalidSalePrice { price: f64 },

    #[error(
        "Target margin {target_margin} infeasible: percentage fees ({fee_rate}) \
         plus margin reach 100% of the sale price"
    )]
    InfeasibleMargin { target_margin: f64, fee_rate: f64 },

    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DropshipResult<T> = Result<T, DropshipError>;
