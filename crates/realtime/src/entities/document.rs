use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Current full content of a shared document. No history is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSnapshot {
    pub document_id: i64,
    pub content: String,
    pub updated_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}
