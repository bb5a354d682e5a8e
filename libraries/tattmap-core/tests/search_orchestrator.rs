//! Search orchestrator tests against in-memory backends
//!
//! Every scenario runs twice: once with a backend that only evaluates the
//! predicate tree (the caller must refine) and once with a backend that
//! answers geo constraints exactly.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tattmap_core::filter::{FeatureFlags, FilterPlan, LocationFilter, SearchParams};
use tattmap_core::geo::{BoundingBox, RadiusQuery};
use tattmap_core::search::{sort_by_distance, QueryWindow, SortOrder};
use tattmap_core::{
    Artist, ArtistPoint, ArtistSearch, GeoSearchBackend, LikeCounter, Result, UserId,
};

// ===== Helpers =====

struct InMemoryBackend {
    artists: Vec<Artist>,
    exact: bool,
    calls: AtomicUsize,
}

impl InMemoryBackend {
    fn new(artists: Vec<Artist>, exact: bool) -> Self {
        Self {
            artists,
            exact,
            calls: AtomicUsize::new(0),
        }
    }

    fn matching(&self, plan: &FilterPlan) -> Vec<Artist> {
        self.artists
            .iter()
            .filter(|a| plan.predicate.matches(a))
            .filter(|a| !self.exact || plan.accepts(a))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GeoSearchBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        if self.exact {
            "memory-exact"
        } else {
            "memory-scan"
        }
    }

    fn refines_exactly(&self) -> bool {
        self.exact
    }

    async fn find_artists(&self, plan: &FilterPlan, window: &QueryWindow) -> Result<Vec<Artist>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.matching(plan);

        match window.order {
            SortOrder::Distance(center) if self.exact => sort_by_distance(&mut rows, &center),
            _ => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
        }

        Ok(match window.page {
            Some(page) => rows
                .into_iter()
                .skip(page.skip as usize)
                .take(page.take as usize)
                .collect(),
            None => rows,
        })
    }

    async fn find_points(&self, plan: &FilterPlan) -> Result<Vec<ArtistPoint>> {
        Ok(self
            .matching(plan)
            .into_iter()
            .filter_map(|a| {
                Some(ArtistPoint {
                    user_id: a.user_id.clone(),
                    lat: a.lat?,
                    lon: a.lon?,
                })
            })
            .collect())
    }
}

#[derive(Default)]
struct CountingLikes {
    counts: HashMap<UserId, i64>,
    calls: AtomicUsize,
}

#[async_trait]
impl LikeCounter for CountingLikes {
    async fn count_likes(&self, ids: &[UserId]) -> Result<HashMap<UserId, i64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.counts.get(id).map(|c| (id.clone(), *c)))
            .collect())
    }
}

fn artist(id: i64, lat: f64, lon: f64) -> Artist {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id);
    Artist {
        id,
        user_id: UserId::new(format!("artist-{id}")),
        nickname: format!("artist {id}"),
        city: "Amsterdam".to_string(),
        country: "Netherlands".to_string(),
        country_code: Some("NL".to_string()),
        lat: Some(lat),
        lon: Some(lon),
        created_at: created,
        updated_at: created,
        ..Artist::default()
    }
}

fn search_with(artists: Vec<Artist>, exact: bool) -> (ArtistSearch, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new(artists, exact));
    let search = ArtistSearch::new(backend.clone(), Arc::new(CountingLikes::default()));
    (search, backend)
}

fn ids(page: &[tattmap_core::ArtistWithLikes]) -> Vec<i64> {
    page.iter().map(|a| a.artist.id).collect()
}

// ===== Tests =====

#[tokio::test]
async fn test_radius_search_finds_artist_at_center() {
    for exact in [false, true] {
        let (search, _) = search_with(vec![artist(1, 52.374, 4.897)], exact);
        let params = SearchParams {
            radius: Some(RadiusQuery::new(52.374, 4.897, 1.0)),
            ..SearchParams::default()
        };

        let page = search.search(&params).await.unwrap();
        assert_eq!(ids(&page.items), vec![1], "exact={exact}");
        assert!(!page.has_more);
    }
}

#[tokio::test]
async fn test_radius_search_drops_box_corners() {
    for exact in [false, true] {
        // (0.85, 0.85) sits in the enclosing box but ~133 km from the center
        let artists = vec![artist(1, 0.0, 0.0), artist(2, 0.85, 0.85), artist(3, 0.5, 0.0)];
        let (search, _) = search_with(artists, exact);
        let params = SearchParams {
            radius: Some(RadiusQuery::new(0.0, 0.0, 100.0)),
            ..SearchParams::default()
        };

        let page = search.search(&params).await.unwrap();
        assert_eq!(ids(&page.items), vec![1, 3], "exact={exact}");
    }
}

#[tokio::test]
async fn test_radius_search_orders_by_distance() {
    for exact in [false, true] {
        let artists = vec![artist(1, 0.3, 0.0), artist(2, 0.1, 0.0), artist(3, 0.2, 0.0)];
        let (search, _) = search_with(artists, exact);
        let params = SearchParams {
            radius: Some(RadiusQuery::new(0.0, 0.0, 50.0)),
            ..SearchParams::default()
        };

        let page = search.search(&params).await.unwrap();
        assert_eq!(ids(&page.items), vec![2, 3, 1], "exact={exact}");
    }
}

#[tokio::test]
async fn test_radius_pagination_counts_only_exact_matches() {
    for exact in [false, true] {
        let mut artists: Vec<Artist> = (1..=4).map(|i| artist(i, 0.01 * i as f64, 0.0)).collect();
        // corner decoys that the box lets through
        artists.push(artist(10, 0.85, 0.85));
        artists.push(artist(11, -0.85, -0.85));
        let (search, _) = search_with(artists, exact);

        let params = SearchParams {
            radius: Some(RadiusQuery::new(0.0, 0.0, 100.0)),
            limit: 2,
            skip: 2,
            ..SearchParams::default()
        };
        let page = search.search(&params).await.unwrap();
        assert_eq!(ids(&page.items), vec![3, 4], "exact={exact}");
        assert!(!page.has_more, "exact={exact}");
    }
}

#[tokio::test]
async fn test_recent_order_and_has_more() {
    for exact in [false, true] {
        let artists: Vec<Artist> = (1..=5).map(|i| artist(i, 52.0, 4.0)).collect();
        let (search, _) = search_with(artists, exact);

        let first = search
            .search(&SearchParams {
                limit: 2,
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&first.items), vec![5, 4]);
        assert!(first.has_more);

        let last = search
            .search(&SearchParams {
                limit: 2,
                skip: 4,
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&last.items), vec![1]);
        assert!(!last.has_more);
    }
}

#[tokio::test]
async fn test_limit_and_skip_are_clamped() {
    let artists: Vec<Artist> = (1..=3).map(|i| artist(i, 52.0, 4.0)).collect();
    let (search, _) = search_with(artists, false);

    for requested in [0, -5] {
        let page = search
            .search(&SearchParams {
                limit: requested,
                skip: -3,
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(page.limit, 1);
        assert_eq!(page.skip, 0);
        assert_eq!(page.items.len(), 1);
    }

    let page = search
        .search(&SearchParams {
            limit: 1_000_000,
            ..SearchParams::default()
        })
        .await
        .unwrap();
    assert_eq!(page.limit, tattmap_core::search::MAX_LIMIT);

    let capped = search.clone().with_max_limit(2);
    assert_eq!(capped.clamp_limit(10), 2);
}

#[tokio::test]
async fn test_antimeridian_bbox() {
    for exact in [false, true] {
        let artists = vec![
            artist(1, 0.0, 179.5),
            artist(2, 0.0, -179.8),
            artist(3, 0.0, 0.0),
            artist(4, 20.0, 179.5),
        ];
        let (search, _) = search_with(artists, exact);
        let params = SearchParams {
            bbox: Some(BoundingBox::new(179.0, -10.0, -179.5, 10.0)),
            ..SearchParams::default()
        };

        let page = search.search(&params).await.unwrap();
        let mut found = ids(&page.items);
        found.sort_unstable();
        assert_eq!(found, vec![1, 2], "exact={exact}");
    }
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let mut a = artist(1, 52.0, 4.0);
    a.styles = vec!["Realism".to_string()];
    a.color = true;
    let mut b = artist(2, 52.0, 4.0);
    b.styles = vec!["realism".to_string()];
    let mut c = artist(3, 52.0, 4.0);
    c.styles = vec!["Tribal".to_string()];
    c.color = true;
    let (search, _) = search_with(vec![a, b, c], false);

    let params = SearchParams {
        styles: vec!["REALISM".to_string()],
        flags: FeatureFlags {
            color: true,
            ..FeatureFlags::default()
        },
        location: LocationFilter {
            country_code: Some("nl".to_string()),
            ..LocationFilter::default()
        },
        ..SearchParams::default()
    };

    let page = search.search(&params).await.unwrap();
    assert_eq!(ids(&page.items), vec![1]);
}

#[tokio::test]
async fn test_free_text_matches_any_field() {
    let mut a = artist(1, 52.0, 4.0);
    a.nickname = "Black Lotus".to_string();
    let mut b = artist(2, 52.0, 4.0);
    b.address = "Lotusstraat 3".to_string();
    let c = artist(3, 52.0, 4.0);
    let (search, _) = search_with(vec![a, b, c], false);

    let page = search
        .search(&SearchParams {
            q: Some("lotus".to_string()),
            ..SearchParams::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![2, 1]);
}

#[tokio::test]
async fn test_like_counts_use_one_lookup_per_page() {
    let artists: Vec<Artist> = (1..=3).map(|i| artist(i, 52.0, 4.0)).collect();
    let backend = Arc::new(InMemoryBackend::new(artists, false));
    let likes = Arc::new(CountingLikes {
        counts: HashMap::from([(UserId::new("artist-2"), 7)]),
        ..CountingLikes::default()
    });
    let search = ArtistSearch::new(backend.clone(), likes.clone());

    let page = search.search(&SearchParams::default()).await.unwrap();

    let counts: Vec<i64> = page.items.iter().map(|a| a.likes).collect();
    assert_eq!(counts, vec![0, 7, 0]);
    assert_eq!(likes.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_result_skips_like_lookup() {
    let likes = Arc::new(CountingLikes::default());
    let backend = Arc::new(InMemoryBackend::new(Vec::new(), true));
    let search = ArtistSearch::new(backend, likes.clone());

    let page = search.search(&SearchParams::default()).await.unwrap();

    assert!(page.items.is_empty());
    assert!(!page.has_more);
    assert_eq!(likes.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_points_respect_bbox_and_location() {
    let mut no_point = artist(3, 0.0, 0.0);
    no_point.lat = None;
    let mut german = artist(4, 52.1, 4.1);
    german.country_code = Some("DE".to_string());
    let artists = vec![artist(1, 52.1, 4.1), artist(2, 10.0, 10.0), no_point, german];
    let (search, _) = search_with(artists, false);

    let location = LocationFilter {
        country_code: Some("NL".to_string()),
        ..LocationFilter::default()
    };

    let all = search.points(None, &location).await.unwrap();
    let mut all_ids: Vec<&str> = all.iter().map(|p| p.user_id.as_str()).collect();
    all_ids.sort_unstable();
    assert_eq!(all_ids, vec!["artist-1", "artist-2"]);

    let bbox = BoundingBox::new(4.0, 52.0, 5.0, 53.0);
    let inside = search.points(Some(bbox), &location).await.unwrap();
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].user_id.as_str(), "artist-1");
}
