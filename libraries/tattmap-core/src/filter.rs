//! Filter builder
//!
//! Translates a structured search request into a storage-agnostic predicate
//! tree and decides whether geo filtering has to be re-checked exactly after
//! the store has answered.
//!
//! All constraints are AND-combined. The free-text `q` group is OR-ed
//! internally and then AND-ed with the rest.

use crate::geo::{self, BoundingBox, RadiusQuery};
use crate::types::artist::normalize_country_code;
use crate::types::Artist;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Artist attributes a predicate can constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CountryCode,
    RegionCodeFull,
    City,
    Country,
    Nickname,
    Address,
    Styles,
    Beginner,
    Color,
    BlackAndGray,
    Coverups,
    Lat,
    Lon,
}

/// Constraint applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match against any of the values
    In(Vec<String>),
    /// Case-insensitive substring match
    Contains(String),
    /// Array field shares at least one element with the values
    HasSome(Vec<String>),
    IsTrue,
    NotNull,
    /// Inclusive range in degrees
    Between { min: f64, max: f64 },
    AtLeast(f64),
    AtMost(f64),
}

/// Declarative predicate tree handed to a storage adapter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Field { field: Field, condition: Condition },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn field(field: Field, condition: Condition) -> Self {
        Self::Field { field, condition }
    }

    /// Matches everything
    pub fn always() -> Self {
        Self::And(Vec::new())
    }

    /// Evaluate the predicate against an in-memory artist.
    ///
    /// Coordinate ranges compare at stored precision, like the store does.
    pub fn matches(&self, artist: &Artist) -> bool {
        match self {
            Predicate::And(parts) => parts.iter().all(|p| p.matches(artist)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(artist)),
            Predicate::Field { field, condition } => condition_matches(artist, *field, condition),
        }
    }
}

/// Which kind of search a request resolves to, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Radius,
    Bbox,
    City,
    Region,
    Country,
    Global,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Radius => "radius",
            SearchMode::Bbox => "bbox",
            SearchMode::City => "city",
            SearchMode::Region => "region",
            SearchMode::Country => "country",
            SearchMode::Global => "global",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean work-type flags. `false` means "don't care", never "must be false".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub beginner: bool,
    pub color: bool,
    pub black_and_gray: bool,
    pub coverups: bool,
}

/// Hierarchical location filter: country -> region -> city
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
}

impl LocationFilter {
    pub fn is_empty(&self) -> bool {
        non_blank(self.country_code.as_deref()).is_none()
            && non_blank(self.region_code.as_deref()).is_none()
            && non_blank(self.city.as_deref()).is_none()
    }

    /// Location constraints (rules 1-3); blank parts add nothing
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut and = Vec::new();

        if let Some(cc) = normalize_country_code(self.country_code.as_deref()) {
            // storage casing is inconsistent
            let lower = cc.to_lowercase();
            and.push(Predicate::field(Field::CountryCode, Condition::In(vec![cc, lower])));
        }

        if let Some(region) = non_blank(self.region_code.as_deref()) {
            // the full code may carry a country prefix, e.g. "NL-NH"
            and.push(Predicate::field(
                Field::RegionCodeFull,
                Condition::Contains(region.to_string()),
            ));
        }

        if let Some(city) = non_blank(self.city.as_deref()) {
            and.push(Predicate::field(Field::City, Condition::Contains(city.to_string())));
        }

        and
    }
}

/// Structured search request, already validated at the boundary
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub styles: Vec<String>,
    pub location: LocationFilter,
    pub q: Option<String>,
    pub flags: FeatureFlags,
    pub bbox: Option<BoundingBox>,
    pub radius: Option<RadiusQuery>,
    pub limit: i64,
    pub skip: i64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            styles: Vec::new(),
            location: LocationFilter::default(),
            q: None,
            flags: FeatureFlags::default(),
            bbox: None,
            radius: None,
            limit: crate::search::DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl SearchParams {
    pub fn mode(&self) -> SearchMode {
        if self.radius.is_some() {
            SearchMode::Radius
        } else if self.bbox.is_some() {
            SearchMode::Bbox
        } else if non_blank(self.location.city.as_deref()).is_some() {
            SearchMode::City
        } else if non_blank(self.location.region_code.as_deref()).is_some() {
            SearchMode::Region
        } else if non_blank(self.location.country_code.as_deref()).is_some() {
            SearchMode::Country
        } else {
            SearchMode::Global
        }
    }
}

/// Exact geo constraint kept alongside the predicate for refinement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoFilter {
    BoundingBox(BoundingBox),
    Radius(RadiusQuery),
}

impl GeoFilter {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        match self {
            GeoFilter::BoundingBox(bbox) => bbox.contains(lat, lon),
            GeoFilter::Radius(radius) => radius.contains(lat, lon),
        }
    }

    /// Box a spatial index can use for candidate lookup
    pub fn candidate_box(&self) -> BoundingBox {
        match self {
            GeoFilter::BoundingBox(bbox) => *bbox,
            GeoFilter::Radius(radius) => radius.enclosing_box(),
        }
    }
}

/// Output of the filter builder
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    pub predicate: Predicate,
    pub geo: Option<GeoFilter>,
    /// The predicate over-selects and results need an exact geo pass
    pub needs_client_side_filter: bool,
    pub mode: SearchMode,
}

impl FilterPlan {
    pub fn radius(&self) -> Option<RadiusQuery> {
        match self.geo {
            Some(GeoFilter::Radius(radius)) => Some(radius),
            _ => None,
        }
    }

    /// Exact geo acceptance; artists without a point never pass a geo filter
    pub fn accepts(&self, artist: &Artist) -> bool {
        match (&self.geo, artist.lat, artist.lon) {
            (None, _, _) => true,
            (Some(geo), Some(lat), Some(lon)) => geo.contains(lat, lon),
            _ => false,
        }
    }

    pub fn accepts_point(&self, lat: f64, lon: f64) -> bool {
        self.geo.map_or(true, |geo| geo.contains(lat, lon))
    }
}

/// Build the predicate tree for a search request.
///
/// Radius takes precedence over a bounding box when both are present.
pub fn build_filters(params: &SearchParams) -> FilterPlan {
    let mut and = params.location.predicates();

    if !params.styles.is_empty() {
        let variants = style_variants(&params.styles);
        if !variants.is_empty() {
            and.push(Predicate::field(Field::Styles, Condition::HasSome(variants)));
        }
    }

    if let Some(q) = non_blank(params.q.as_deref()) {
        let or = [Field::Nickname, Field::City, Field::Country, Field::Address]
            .into_iter()
            .map(|field| Predicate::field(field, Condition::Contains(q.to_string())))
            .collect();
        and.push(Predicate::Or(or));
    }

    let flags = [
        (params.flags.beginner, Field::Beginner),
        (params.flags.color, Field::Color),
        (params.flags.black_and_gray, Field::BlackAndGray),
        (params.flags.coverups, Field::Coverups),
    ];
    for (set, field) in flags {
        if set {
            and.push(Predicate::field(field, Condition::IsTrue));
        }
    }

    let mut needs_client_side_filter = false;
    let geo = if let Some(radius) = params.radius {
        let bbox = radius.enclosing_box();
        push_bbox_constraints(&mut and, &bbox);
        // a box is only a superset of the circle
        needs_client_side_filter = true;
        Some(GeoFilter::Radius(radius))
    } else if let Some(bbox) = params.bbox {
        push_bbox_constraints(&mut and, &bbox);
        if bbox.crosses_antimeridian() {
            needs_client_side_filter = true;
        }
        Some(GeoFilter::BoundingBox(bbox))
    } else {
        None
    };

    FilterPlan {
        predicate: Predicate::And(and),
        geo,
        needs_client_side_filter,
        mode: params.mode(),
    }
}

/// Predicate for the map-points query: location filters plus optional box
pub fn build_points_filter(bbox: Option<BoundingBox>, location: &LocationFilter) -> FilterPlan {
    let params = SearchParams {
        location: location.clone(),
        bbox,
        ..SearchParams::default()
    };
    let mut plan = build_filters(&params);
    if bbox.is_none() {
        // points are only useful with a position
        if let Predicate::And(and) = &mut plan.predicate {
            and.push(Predicate::field(Field::Lat, Condition::NotNull));
            and.push(Predicate::field(Field::Lon, Condition::NotNull));
        }
    }
    plan
}

fn push_bbox_constraints(and: &mut Vec<Predicate>, bbox: &BoundingBox) {
    and.push(Predicate::field(Field::Lat, Condition::NotNull));
    and.push(Predicate::field(Field::Lon, Condition::NotNull));
    and.push(Predicate::field(
        Field::Lat,
        Condition::Between {
            min: bbox.south,
            max: bbox.north,
        },
    ));

    if bbox.crosses_antimeridian() {
        and.push(Predicate::Or(vec![
            Predicate::field(Field::Lon, Condition::AtLeast(bbox.west)),
            Predicate::field(Field::Lon, Condition::AtMost(bbox.east)),
        ]));
    } else {
        and.push(Predicate::field(
            Field::Lon,
            Condition::Between {
                min: bbox.west,
                max: bbox.east,
            },
        ));
    }
}

/// Expand style tokens into as-given, lowercase, uppercase and title-case
/// variants, deduplicated in first-seen order. Blank tokens are dropped.
pub fn style_variants(styles: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut variants = Vec::new();

    for style in styles.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        for variant in [
            style.to_string(),
            style.to_lowercase(),
            style.to_uppercase(),
            title_case(style),
        ] {
            if seen.insert(variant.clone()) {
                variants.push(variant);
            }
        }
    }

    variants
}

/// Lowercase, then capitalise the first letter of each whitespace-separated word
pub fn title_case(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn condition_matches(artist: &Artist, field: Field, condition: &Condition) -> bool {
    match condition {
        Condition::In(values) => {
            text_value(artist, field).is_some_and(|v| values.iter().any(|x| x == v))
        }
        Condition::Contains(needle) => text_value(artist, field)
            .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
        Condition::HasSome(values) => {
            field == Field::Styles && artist.styles.iter().any(|s| values.contains(s))
        }
        Condition::IsTrue => flag_value(artist, field),
        Condition::NotNull => coordinate(artist, field).is_some(),
        Condition::Between { min, max } => coordinate(artist, field).is_some_and(|v| {
            let v = geo::to_micro_degrees(v);
            v >= geo::micro_degrees_at_least(*min) && v <= geo::micro_degrees_at_most(*max)
        }),
        Condition::AtLeast(min) => coordinate(artist, field)
            .is_some_and(|v| geo::to_micro_degrees(v) >= geo::micro_degrees_at_least(*min)),
        Condition::AtMost(max) => coordinate(artist, field)
            .is_some_and(|v| geo::to_micro_degrees(v) <= geo::micro_degrees_at_most(*max)),
    }
}

fn text_value(artist: &Artist, field: Field) -> Option<&str> {
    match field {
        Field::CountryCode => artist.country_code.as_deref(),
        Field::RegionCodeFull => artist.region_code_full.as_deref(),
        Field::City => Some(&artist.city),
        Field::Country => Some(&artist.country),
        Field::Nickname => Some(&artist.nickname),
        Field::Address => Some(&artist.address),
        _ => None,
    }
}

fn flag_value(artist: &Artist, field: Field) -> bool {
    match field {
        Field::Beginner => artist.beginner,
        Field::Color => artist.color,
        Field::BlackAndGray => artist.black_and_gray,
        Field::Coverups => artist.coverups,
        _ => false,
    }
}

fn coordinate(artist: &Artist, field: Field) -> Option<f64> {
    match field {
        Field::Lat => artist.lat,
        Field::Lon => artist.lon,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and_parts(plan: &FilterPlan) -> &[Predicate] {
        match &plan.predicate {
            Predicate::And(parts) => parts,
            other => panic!("expected a conjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_request_is_global_search() {
        let plan = build_filters(&SearchParams::default());
        assert!(and_parts(&plan).is_empty());
        assert!(plan.geo.is_none());
        assert!(!plan.needs_client_side_filter);
        assert_eq!(plan.mode, SearchMode::Global);
    }

    #[test]
    fn test_country_code_accepts_both_casings() {
        let params = SearchParams {
            location: LocationFilter {
                country_code: Some(" nl".to_string()),
                ..LocationFilter::default()
            },
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        assert_eq!(
            and_parts(&plan),
            &[Predicate::field(
                Field::CountryCode,
                Condition::In(vec!["NL".to_string(), "nl".to_string()])
            )]
        );
        assert_eq!(plan.mode, SearchMode::Country);
    }

    #[test]
    fn test_region_and_city_are_substring_matches() {
        let params = SearchParams {
            location: LocationFilter {
                country_code: None,
                region_code: Some("NH".to_string()),
                city: Some(" Amsterdam ".to_string()),
            },
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        assert_eq!(
            and_parts(&plan),
            &[
                Predicate::field(Field::RegionCodeFull, Condition::Contains("NH".to_string())),
                Predicate::field(Field::City, Condition::Contains("Amsterdam".to_string())),
            ]
        );
        assert_eq!(plan.mode, SearchMode::City);
    }

    #[test]
    fn test_blank_location_adds_nothing() {
        let params = SearchParams {
            location: LocationFilter {
                country_code: Some("  ".to_string()),
                region_code: Some(String::new()),
                city: Some(" ".to_string()),
            },
            ..SearchParams::default()
        };
        assert!(params.location.is_empty());
        assert!(and_parts(&build_filters(&params)).is_empty());
    }

    #[test]
    fn test_style_variants() {
        let variants = style_variants(&["black work".to_string()]);
        assert_eq!(variants, vec!["black work", "BLACK WORK", "Black Work"]);

        let variants = style_variants(&["reAlism".to_string(), "realism".to_string()]);
        assert_eq!(variants, vec!["reAlism", "realism", "REALISM", "Realism"]);
    }

    #[test]
    fn test_title_case_handles_unicode_words() {
        assert_eq!(title_case("NEO   traditional"), "Neo Traditional");
        assert_eq!(title_case("ñandú"), "Ñandú");
    }

    #[test]
    fn test_free_text_is_an_or_group() {
        let params = SearchParams {
            q: Some(" ink ".to_string()),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        let parts = and_parts(&plan);
        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Predicate::Or(or) => {
                assert_eq!(or.len(), 4);
                assert!(or.contains(&Predicate::field(
                    Field::Nickname,
                    Condition::Contains("ink".to_string())
                )));
                assert!(or.contains(&Predicate::field(
                    Field::Address,
                    Condition::Contains("ink".to_string())
                )));
            }
            other => panic!("expected OR group, got {other:?}"),
        }
    }

    #[test]
    fn test_only_true_flags_constrain() {
        let params = SearchParams {
            flags: FeatureFlags {
                beginner: false,
                color: true,
                black_and_gray: false,
                coverups: true,
            },
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        assert_eq!(
            and_parts(&plan),
            &[
                Predicate::field(Field::Color, Condition::IsTrue),
                Predicate::field(Field::Coverups, Condition::IsTrue),
            ]
        );
    }

    #[test]
    fn test_plain_bbox_is_exact_in_store() {
        let params = SearchParams {
            bbox: Some(BoundingBox::new(4.0, 52.0, 5.0, 53.0)),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        assert!(!plan.needs_client_side_filter);
        assert_eq!(plan.mode, SearchMode::Bbox);
        assert!(and_parts(&plan).contains(&Predicate::field(
            Field::Lon,
            Condition::Between { min: 4.0, max: 5.0 }
        )));
    }

    #[test]
    fn test_antimeridian_bbox_splits_longitude() {
        let params = SearchParams {
            bbox: Some(BoundingBox::new(179.0, -10.0, -179.5, 10.0)),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        assert!(plan.needs_client_side_filter);
        assert!(and_parts(&plan).contains(&Predicate::Or(vec![
            Predicate::field(Field::Lon, Condition::AtLeast(179.0)),
            Predicate::field(Field::Lon, Condition::AtMost(-179.5)),
        ])));
    }

    #[test]
    fn test_radius_takes_precedence_over_bbox() {
        let params = SearchParams {
            bbox: Some(BoundingBox::new(-10.0, -10.0, 10.0, 10.0)),
            radius: Some(RadiusQuery::new(52.374, 4.897, 1.0)),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        assert!(plan.needs_client_side_filter);
        assert_eq!(plan.mode, SearchMode::Radius);
        assert!(matches!(plan.geo, Some(GeoFilter::Radius(_))));
    }

    #[test]
    fn test_high_latitude_radius_keeps_circle_edge() {
        let params = SearchParams {
            radius: Some(RadiusQuery::new(60.0, 0.0, 1000.0)),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        let artist = Artist {
            lat: Some(61.27),
            lon: Some(18.1),
            ..Artist::default()
        };
        assert!(plan.predicate.matches(&artist));
        assert!(plan.accepts(&artist));
    }

    #[test]
    fn test_bbox_edges_compare_at_stored_precision() {
        let params = SearchParams {
            bbox: Some(BoundingBox::new(4.0000004, 52.0, 4.9999996, 53.0)),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        let at = |lon: f64| Artist {
            lat: Some(52.5),
            lon: Some(lon),
            ..Artist::default()
        };
        assert!(!plan.predicate.matches(&at(4.0)));
        assert!(plan.predicate.matches(&at(4.000001)));
        assert!(!plan.predicate.matches(&at(5.0)));
        assert!(plan.predicate.matches(&at(4.999999)));
    }

    #[test]
    fn test_radius_near_antimeridian_wraps() {
        let params = SearchParams {
            radius: Some(RadiusQuery::new(0.0, 179.9, 50.0)),
            ..SearchParams::default()
        };
        let plan = build_filters(&params);
        let has_split = and_parts(&plan)
            .iter()
            .any(|p| matches!(p, Predicate::Or(parts) if parts.len() == 2));
        assert!(has_split, "expected a split longitude constraint");
    }

    #[test]
    fn test_points_filter_without_bbox_requires_coordinates() {
        let plan = build_points_filter(None, &LocationFilter::default());
        assert_eq!(
            and_parts(&plan),
            &[
                Predicate::field(Field::Lat, Condition::NotNull),
                Predicate::field(Field::Lon, Condition::NotNull),
            ]
        );
    }
}
