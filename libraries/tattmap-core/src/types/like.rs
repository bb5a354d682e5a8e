//! Like types

use super::UserId;
use serde::{Deserialize, Serialize};

/// Like count for one artist after a like/unlike
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub artist_id: UserId,
    pub likes: i64,
}

/// Whether the calling user likes an artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub artist_id: UserId,
    pub liked: bool,
}
