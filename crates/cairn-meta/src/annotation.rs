//! Comments and links attached to an entity.

use cairn_types::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text note stamped with who wrote it and when.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique within the owning entity; never reused after removal.
    pub id: String,
    pub message: String,
    pub user: String,
    pub host: String,
    pub timestamp: DateTime<Utc>,
}

/// A reference from one entity to another thing.
///
/// At least one of `name`, `uri` or `meta` is present. `meta` embeds a copy
/// of the target's document taken when the link was made.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub meta: Option<Document>,
    pub created_at: DateTime<Utc>,
}
