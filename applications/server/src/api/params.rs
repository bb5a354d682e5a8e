/// Query string parsing for the artist endpoints
///
/// Every field arrives as an optional string so malformed values can be
/// reported as 400 with a field name instead of a generic rejection.
use crate::error::{Result, ServerError};
use serde::Deserialize;
use tattmap_core::{BoundingBox, FeatureFlags, LocationFilter, RadiusQuery, SearchParams};

pub const MIN_RADIUS_KM: f64 = 0.1;
pub const MAX_RADIUS_KM: f64 = 1000.0;

/// GET /tattoo-artist
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub styles: Option<String>,
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
    pub q: Option<String>,

    pub beginner: Option<String>,
    pub color: Option<String>,
    pub black_and_gray: Option<String>,
    pub coverups: Option<String>,

    pub center_lat: Option<String>,
    pub center_lon: Option<String>,
    pub radius_km: Option<String>,

    pub bbox: Option<String>,
    pub west: Option<String>,
    pub south: Option<String>,
    pub east: Option<String>,
    pub north: Option<String>,

    pub limit: Option<String>,
    pub skip: Option<String>,
}

impl SearchQuery {
    pub fn into_params(self, default_limit: i64) -> Result<SearchParams> {
        let styles = present(&self.styles)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let flags = FeatureFlags {
            beginner: parse_flag("beginner", &self.beginner)?,
            color: parse_flag("color", &self.color)?,
            black_and_gray: parse_flag("blackAndGray", &self.black_and_gray)?,
            coverups: parse_flag("coverups", &self.coverups)?,
        };

        // a partial triple means no radius
        let radius = match (
            present(&self.center_lat),
            present(&self.center_lon),
            present(&self.radius_km),
        ) {
            (Some(lat), Some(lon), Some(radius)) => Some(RadiusQuery::new(
                parse_lat("centerLat", lat)?,
                parse_lon("centerLon", lon)?,
                parse_radius(radius)?,
            )),
            _ => None,
        };

        let bbox = match present(&self.bbox) {
            Some(raw) => Some(parse_bbox_list(raw)?),
            None => match (
                present(&self.west),
                present(&self.south),
                present(&self.east),
                present(&self.north),
            ) {
                (Some(w), Some(s), Some(e), Some(n)) => Some(checked_bbox(
                    parse_lon("west", w)?,
                    parse_lat("south", s)?,
                    parse_lon("east", e)?,
                    parse_lat("north", n)?,
                )?),
                _ => None,
            },
        };

        let limit = match present(&self.limit) {
            Some(raw) => parse_int("limit", raw)?,
            None => default_limit,
        };
        let skip = match present(&self.skip) {
            Some(raw) => parse_int("skip", raw)?,
            None => 0,
        };
        if skip < 0 {
            return Err(ServerError::BadRequest("skip must not be negative".to_string()));
        }

        Ok(SearchParams {
            styles,
            location: LocationFilter {
                country_code: owned(&self.country_code),
                region_code: owned(&self.region_code),
                city: owned(&self.city),
            },
            q: owned(&self.q),
            flags,
            bbox,
            radius,
            limit,
            skip,
        })
    }
}

/// GET /tattoo-artist/points
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsQuery {
    pub sw_lng: Option<String>,
    pub sw_lat: Option<String>,
    pub ne_lng: Option<String>,
    pub ne_lat: Option<String>,
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
}

impl PointsQuery {
    /// Viewport (all four corners or none) and location filter
    pub fn into_parts(self) -> Result<(Option<BoundingBox>, LocationFilter)> {
        let bbox = match (
            present(&self.sw_lng),
            present(&self.sw_lat),
            present(&self.ne_lng),
            present(&self.ne_lat),
        ) {
            (Some(sw_lng), Some(sw_lat), Some(ne_lng), Some(ne_lat)) => {
                let bbox = BoundingBox::from_corners(
                    parse_lon("swLng", sw_lng)?,
                    parse_lat("swLat", sw_lat)?,
                    parse_lon("neLng", ne_lng)?,
                    parse_lat("neLat", ne_lat)?,
                );
                Some(checked_bbox(bbox.west, bbox.south, bbox.east, bbox.north)?)
            }
            _ => None,
        };

        let location = LocationFilter {
            country_code: owned(&self.country_code),
            region_code: owned(&self.region_code),
            city: owned(&self.city),
        };

        Ok((bbox, location))
    }
}

/// GET /tattoo-artist/top
#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<String>,
}

impl TopQuery {
    pub fn limit(&self, default_limit: i64) -> Result<i64> {
        match present(&self.limit) {
            Some(raw) => parse_int("limit", raw),
            None => Ok(default_limit),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

fn parse_flag(name: &str, value: &Option<String>) -> Result<bool> {
    match present(value) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ServerError::BadRequest(format!(
            "{name} must be true or false, got {other:?}"
        ))),
    }
}

fn parse_float(name: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ServerError::BadRequest(format!("{name} must be a finite number")))
}

fn parse_lat(name: &str, raw: &str) -> Result<f64> {
    let lat = parse_float(name, raw)?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ServerError::BadRequest(format!("{name} must be within [-90, 90]")));
    }
    Ok(lat)
}

fn parse_lon(name: &str, raw: &str) -> Result<f64> {
    let lon = parse_float(name, raw)?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ServerError::BadRequest(format!("{name} must be within [-180, 180]")));
    }
    Ok(lon)
}

fn parse_radius(raw: &str) -> Result<f64> {
    let radius = parse_float("radiusKm", raw)?;
    if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius) {
        return Err(ServerError::BadRequest(format!(
            "radiusKm must be within [{MIN_RADIUS_KM}, {MAX_RADIUS_KM}]"
        )));
    }
    Ok(radius)
}

fn parse_int(name: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| ServerError::BadRequest(format!("{name} must be an integer")))
}

/// `bbox=west,south,east,north`
fn parse_bbox_list(raw: &str) -> Result<BoundingBox> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [west, south, east, north] = parts.as_slice() else {
        return Err(ServerError::BadRequest(
            "bbox must be west,south,east,north".to_string(),
        ));
    };

    checked_bbox(
        parse_lon("bbox west", west)?,
        parse_lat("bbox south", south)?,
        parse_lon("bbox east", east)?,
        parse_lat("bbox north", north)?,
    )
}

/// West may exceed east (antimeridian); south may not exceed north.
fn checked_bbox(west: f64, south: f64, east: f64, north: f64) -> Result<BoundingBox> {
    if south > north {
        return Err(ServerError::BadRequest(
            "bounding box south must not exceed north".to_string(),
        ));
    }
    Ok(BoundingBox::new(west, south, east, north))
}
