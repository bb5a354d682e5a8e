//! Tattmap Core
//!
//! Storage-agnostic search core for the Tattmap artist directory.
//!
//! # Architecture
//!
//! - **Geo Math** (`geo`): bounding boxes, Haversine distance, micro-degree
//!   fixed-point conversion
//! - **Filter Builder** (`filter`): turns a search request into a predicate
//!   tree plus a decision on exact client-side geo filtering
//! - **Search Orchestrator** (`search`): clamps pagination, runs the query
//!   through a [`GeoSearchBackend`], refines and attaches like counts
//! - **Like Aggregation** (`likes`): one grouped lookup per result page
//!
//! # Example
//!
//! ```rust
//! use tattmap_core::filter::{build_filters, SearchParams};
//! use tattmap_core::geo::RadiusQuery;
//!
//! let params = SearchParams {
//!     styles: vec!["realism".to_string()],
//!     radius: Some(RadiusQuery::new(52.374, 4.897, 5.0)),
//!     ..SearchParams::default()
//! };
//!
//! let plan = build_filters(&params);
//! assert!(plan.needs_client_side_filter);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod filter;
pub mod geo;
pub mod likes;
pub mod search;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TattmapError};
pub use filter::{
    build_filters, FeatureFlags, FilterPlan, GeoFilter, LocationFilter, Predicate, SearchMode,
    SearchParams,
};
pub use geo::{BoundingBox, GeoPoint, RadiusQuery};
pub use search::{ArtistSearch, Page, QueryWindow, SearchPage, SortOrder};
pub use traits::{GeoSearchBackend, LikeCounter};
pub use types::{
    Artist, ArtistPoint, ArtistWithLikes, LikeStatus, LikeSummary, Role, UpsertArtist, User,
    UserId,
};
