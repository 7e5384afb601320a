use alloy::primitives::Address;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use lookback_core::chain::StringExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

/// Body of `POST /api/transactions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsRequest {
    pub wallet: String,
    pub start_block: u64,
}

impl TransactionsRequest {
    pub fn parse(payload: Value) -> Result<Self, ApiError> {
        serde_json::from_value(payload)
            .map_err(|_| ApiError::BadRequest("wallet and startBlock are required".to_string()))
    }
}

/// Body of `POST /api/balanceAtDate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    pub wallet: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
}

impl BalanceRequest {
    pub fn parse(payload: Value) -> Result<Self, ApiError> {
        serde_json::from_value(payload)
            .map_err(|_| ApiError::BadRequest("wallet and date are required".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: String,
}

/// Request outcome surfaced to the client. Internal failures keep their
/// detail in the server log and send an opaque body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(lookback_core::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(inner) => {
                error!(%inner, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Server error" })))
                    .into_response()
            }
        }
    }
}

impl From<lookback_core::Error> for ApiError {
    fn from(e: lookback_core::Error) -> Self {
        ApiError::Internal(e)
    }
}

pub fn parse_wallet(wallet: &str) -> Result<Address, ApiError> {
    wallet.parse_as_address().map_err(|_| {
        ApiError::BadRequest(format!("wallet '{wallet}' is not a valid Ethereum address"))
    })
}

/// Unix timestamp of 00:00:00 UTC on the given `YYYY-MM-DD` date.
pub fn date_start_timestamp(date: &str) -> Result<u64, ApiError> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("date '{date}' is not a valid YYYY-MM-DD date"))
    })?;
    let midnight = parsed.and_time(NaiveTime::MIN).and_utc();
    u64::try_from(midnight.timestamp())
        .map_err(|_| ApiError::BadRequest(format!("date '{date}' is before the Unix epoch")))
}
