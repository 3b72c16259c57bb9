//! Memory records appended to a session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable entry in a session's interaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// When the record was written, at millisecond precision.
    pub timestamp: DateTime<Utc>,
    /// Speaker or category, such as `user` or `assistant`.
    pub role: String,
    /// Record body.
    pub content: String,
}
