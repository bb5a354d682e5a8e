//! Geo search backends
//!
//! - [`PredicateScan`] runs the predicate tree as a plain `WHERE` clause.
//!   Radius plans only carry their enclosing box, so results over-select
//!   and the search core refines them.
//! - [`SpatialIndexScan`] narrows candidates through the `artist_locations`
//!   R*Tree and refines radius matches by exact distance itself.

mod sql;

use crate::row::{into_artists, ArtistRow, ARTIST_COLUMNS};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tattmap_core::{
    error::Result,
    filter::FilterPlan,
    geo::from_micro_degrees,
    search::{sort_by_distance, Page, QueryWindow, SortOrder},
    traits::GeoSearchBackend,
    types::{Artist, ArtistPoint, UserId},
};

/// Full scan with the filter tree as `WHERE` clause
#[derive(Clone)]
pub struct PredicateScan {
    pool: SqlitePool,
}

impl PredicateScan {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GeoSearchBackend for PredicateScan {
    fn name(&self) -> &'static str {
        "predicate-scan"
    }

    async fn find_artists(&self, plan: &FilterPlan, window: &QueryWindow) -> Result<Vec<Artist>> {
        let builder = QueryBuilder::new(format!(
            "SELECT {ARTIST_COLUMNS} FROM artists a WHERE "
        ));
        fetch_artists(&self.pool, builder, plan, window, false).await
    }

    async fn find_points(&self, plan: &FilterPlan) -> Result<Vec<ArtistPoint>> {
        let builder = QueryBuilder::new("SELECT a.user_id, a.lat_e6, a.lon_e6 FROM artists a WHERE ");
        fetch_points(&self.pool, builder, plan, false).await
    }
}

/// R*Tree candidate lookup followed by exact refinement
#[derive(Clone)]
pub struct SpatialIndexScan {
    pool: SqlitePool,
    fallback: PredicateScan,
}

impl SpatialIndexScan {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            fallback: PredicateScan::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl GeoSearchBackend for SpatialIndexScan {
    fn name(&self) -> &'static str {
        "spatial-index"
    }

    fn refines_exactly(&self) -> bool {
        true
    }

    async fn find_artists(&self, plan: &FilterPlan, window: &QueryWindow) -> Result<Vec<Artist>> {
        let Some(geo) = plan.geo else {
            return self.fallback.find_artists(plan, window).await;
        };

        let mut builder = QueryBuilder::new(format!(
            "SELECT {ARTIST_COLUMNS} FROM artists a \
             JOIN artist_locations r ON r.id = a.id WHERE "
        ));
        sql::push_rtree_overlap(&mut builder, &geo.candidate_box());
        builder.push(" AND ");
        fetch_artists(&self.pool, builder, plan, window, true).await
    }

    async fn find_points(&self, plan: &FilterPlan) -> Result<Vec<ArtistPoint>> {
        let Some(geo) = plan.geo else {
            return self.fallback.find_points(plan).await;
        };

        let mut builder = QueryBuilder::new(
            "SELECT a.user_id, a.lat_e6, a.lon_e6 FROM artists a \
             JOIN artist_locations r ON r.id = a.id WHERE ",
        );
        sql::push_rtree_overlap(&mut builder, &geo.candidate_box());
        builder.push(" AND ");
        fetch_points(&self.pool, builder, plan, true).await
    }
}

/// Finish `builder` with the predicate, ordering and paging, then run it.
///
/// Distance order cannot be expressed in SQL here, so those windows are
/// sorted and paged after the fetch. With `refine` set, rows failing the
/// exact geo test are dropped before paging.
async fn fetch_artists(
    pool: &SqlitePool,
    mut builder: QueryBuilder<'_, Sqlite>,
    plan: &FilterPlan,
    window: &QueryWindow,
    refine: bool,
) -> Result<Vec<Artist>> {
    sql::push_predicate(&mut builder, &plan.predicate);

    let paged_in_sql = sql::is_sql_ordered(&window.order) && !(refine && plan.radius().is_some());
    if paged_in_sql {
        sql::push_recent_order(&mut builder);
        sql::push_page(&mut builder, window.page);
    } else {
        builder.push(" ORDER BY a.id");
    }

    let rows: Vec<ArtistRow> = builder.build_query_as().fetch_all(pool).await?;
    let mut artists = into_artists(rows)?;

    if refine {
        artists.retain(|artist| plan.accepts(artist));
    }

    if paged_in_sql {
        return Ok(artists);
    }

    match window.order {
        SortOrder::Distance(center) => sort_by_distance(&mut artists, &center),
        SortOrder::Recent => {
            artists.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
    }

    Ok(apply_page(artists, window.page))
}

async fn fetch_points(
    pool: &SqlitePool,
    mut builder: QueryBuilder<'_, Sqlite>,
    plan: &FilterPlan,
    refine: bool,
) -> Result<Vec<ArtistPoint>> {
    sql::push_predicate(&mut builder, &plan.predicate);
    builder.push(" AND a.lat_e6 IS NOT NULL AND a.lon_e6 IS NOT NULL ORDER BY a.id");

    let rows: Vec<(String, i64, i64)> = builder.build_query_as().fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, lat, lon)| ArtistPoint {
            user_id: UserId::new(user_id),
            lat: from_micro_degrees(lat),
            lon: from_micro_degrees(lon),
        })
        .filter(|point| !refine || plan.accepts_point(point.lat, point.lon))
        .collect())
}

fn apply_page<T>(items: Vec<T>, page: Option<Page>) -> Vec<T> {
    match page {
        Some(page) => items
            .into_iter()
            .skip(usize::try_from(page.skip).unwrap_or(0))
            .take(usize::try_from(page.take).unwrap_or(0))
            .collect(),
        None => items,
    }
}
