use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected request: {status} {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("FINNHUB_API_KEY is missing in .env")]
    MissingApiKey,

    #[error("batched fetch failed for every requested ticker")]
    BatchFailed,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("id sequence returned no counter document")]
    MissingCounter,

    #[error("alert {0} not found")]
    NotFound(i64),
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("chart backend error: {0}")]
    Backend(String),

    #[error("not enough data to draw a chart for {0}")]
    EmptySeries(String),
}
