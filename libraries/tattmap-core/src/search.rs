//! Search orchestrator
//!
//! Clamps pagination, builds the filter plan, runs it through a
//! [`GeoSearchBackend`], applies exact geo refinement when the backend needs
//! it and finally attaches like counts.

use crate::error::Result;
use crate::filter::{build_filters, build_points_filter, FilterPlan, LocationFilter, SearchParams};
use crate::geo::{BoundingBox, GeoPoint};
use crate::likes::attach_like_counts;
use crate::traits::{GeoSearchBackend, LikeCounter};
use crate::types::{Artist, ArtistPoint, ArtistWithLikes};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// Page size when the caller does not ask for one
pub const DEFAULT_LIMIT: i64 = 50;

/// Upper bound for a single page
pub const MAX_LIMIT: i64 = 500;

/// Result ordering requested from a backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    /// Newest first, ties by storage id descending
    Recent,
    /// Closest to the point first, ties by storage id ascending
    Distance(GeoPoint),
}

/// Offset window over the ordered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub take: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryWindow {
    pub order: SortOrder,
    /// `None` fetches every match
    pub page: Option<Page>,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub skip: i64,
    pub has_more: bool,
}

/// Runs artist searches against a backend
#[derive(Clone)]
pub struct ArtistSearch {
    backend: Arc<dyn GeoSearchBackend>,
    likes: Arc<dyn LikeCounter>,
    max_limit: i64,
}

impl ArtistSearch {
    pub fn new(backend: Arc<dyn GeoSearchBackend>, likes: Arc<dyn LikeCounter>) -> Self {
        Self {
            backend,
            likes,
            max_limit: MAX_LIMIT,
        }
    }

    /// Override the page size ceiling (never below 1)
    pub fn with_max_limit(mut self, max_limit: i64) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Clamp a requested page size into `[1, max_limit]`
    pub fn clamp_limit(&self, limit: i64) -> i64 {
        limit.clamp(1, self.max_limit)
    }

    /// Run a search and return one page of artists with like counts
    pub async fn search(&self, params: &SearchParams) -> Result<SearchPage<ArtistWithLikes>> {
        let limit = self.clamp_limit(params.limit);
        let skip = params.skip.max(0);

        let plan = build_filters(params);
        let exact = self.backend.refines_exactly();
        let post_filter = plan.needs_client_side_filter && !exact;

        let order = match plan.radius() {
            Some(radius) => SortOrder::Distance(radius.center),
            None => SortOrder::Recent,
        };

        let mut artists = if post_filter && plan.radius().is_some() {
            // The store only knows the enclosing box, so paging has to wait
            // until the exact distance test has run.
            let window = QueryWindow { order, page: None };
            let mut candidates = self.backend.find_artists(&plan, &window).await?;
            candidates.retain(|artist| plan.accepts(artist));
            if let SortOrder::Distance(center) = order {
                sort_by_distance(&mut candidates, &center);
            }
            candidates
                .into_iter()
                .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                .take(usize::try_from(limit + 1).unwrap_or(usize::MAX))
                .collect()
        } else {
            let window = QueryWindow {
                order,
                page: Some(Page {
                    skip,
                    take: limit + 1,
                }),
            };
            let mut rows = self.backend.find_artists(&plan, &window).await?;
            if post_filter {
                rows.retain(|artist| plan.accepts(artist));
            }
            rows
        };

        let has_more = artists.len() as i64 > limit;
        artists.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        tracing::debug!(
            mode = %plan.mode,
            backend = self.backend.name(),
            client_side_filter = post_filter,
            spatial_index = exact,
            limit,
            skip,
            results = artists.len(),
            has_more,
            "Artist search"
        );

        let items = attach_like_counts(self.likes.as_ref(), artists).await?;

        Ok(SearchPage {
            items,
            limit,
            skip,
            has_more,
        })
    }

    /// Map points inside an optional viewport, narrowed by location filters
    pub async fn points(
        &self,
        bbox: Option<BoundingBox>,
        location: &LocationFilter,
    ) -> Result<Vec<ArtistPoint>> {
        let plan = build_points_filter(bbox, location);
        let mut points = self.backend.find_points(&plan).await?;

        if plan.needs_client_side_filter && !self.backend.refines_exactly() {
            points.retain(|point| plan.accepts_point(point.lat, point.lon));
        }

        tracing::debug!(
            mode = %plan.mode,
            backend = self.backend.name(),
            results = points.len(),
            "Artist points"
        );

        Ok(points)
    }

    /// Build the plan a search would run, without running it
    pub fn plan(&self, params: &SearchParams) -> FilterPlan {
        build_filters(params)
    }
}

/// Order artists by distance to `center`, ties by storage id
pub fn sort_by_distance(artists: &mut [Artist], center: &GeoPoint) {
    artists.sort_by(|a, b| {
        let da = distance_or_max(a, center);
        let db = distance_or_max(b, center);
        da.partial_cmp(&db)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn distance_or_max(artist: &Artist, center: &GeoPoint) -> f64 {
    artist
        .point()
        .map_or(f64::MAX, |point| center.distance_km(&point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_distance_breaks_ties_by_id() {
        let center = GeoPoint::new(0.0, 0.0);
        let at = |id: i64, lat: f64| Artist {
            id,
            lat: Some(lat),
            lon: Some(0.0),
            ..Artist::default()
        };
        let mut artists = vec![at(3, 1.0), at(2, 0.5), at(1, 1.0), Artist::default()];

        sort_by_distance(&mut artists, &center);

        let ids: Vec<i64> = artists.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 0]);
    }
}
