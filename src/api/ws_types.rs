use serde::{Deserialize, Serialize};

use crate::services::CountUpdate;

/// Messages pushed to an explorer WebSocket client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "trader_count")]
    TraderCount(CountUpdate),

    #[serde(rename = "error")]
    Error(WsError),
}

#[derive(Debug, Clone, Serialize)]
pub struct WsError {
    pub message: String,
}

/// Messages sent by an explorer WebSocket client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Explorer query string after a filter edit.
    #[serde(rename = "query")]
    Query { query: String },
}
