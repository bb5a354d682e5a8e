/// Core traits for Tattmap
use crate::error::Result;
use crate::filter::FilterPlan;
use crate::search::QueryWindow;
use crate::types::{Artist, ArtistPoint, UserId};
use async_trait::async_trait;
use std::collections::HashMap;

/// Geo-aware artist lookup
///
/// Implementers translate a [`FilterPlan`] into their own query language.
/// Two strategies exist:
/// 1. **Predicate scan**: evaluates the predicate tree as-is. Radius plans
///    over-select (the tree only carries the enclosing box), so the caller
///    refines by exact distance.
/// 2. **Spatial index**: answers the geo part exactly and returns the final
///    page itself.
#[async_trait]
pub trait GeoSearchBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether results already satisfy the exact geo filter and honour the
    /// requested order and page
    fn refines_exactly(&self) -> bool {
        false
    }

    /// Fetch artists matching `plan`, ordered and paged per `window`.
    ///
    /// A window without a page asks for every match.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails
    async fn find_artists(&self, plan: &FilterPlan, window: &QueryWindow) -> Result<Vec<Artist>>;

    /// Fetch map points for artists matching `plan`
    ///
    /// # Errors
    /// Returns an error if the underlying store fails
    async fn find_points(&self, plan: &FilterPlan) -> Result<Vec<ArtistPoint>>;
}

/// Grouped like counts
#[async_trait]
pub trait LikeCounter: Send + Sync {
    /// Count likes per artist user id in one round trip.
    ///
    /// Artists without likes may be absent from the map.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails
    async fn count_likes(&self, artist_ids: &[UserId]) -> Result<HashMap<UserId, i64>>;
}
