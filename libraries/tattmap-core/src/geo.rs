//! Geo math: bounding boxes, great-circle distance and the fixed-point
//! coordinate representation used at the storage boundary.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine law
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate kilometres per degree of latitude
pub const KM_PER_DEGREE: f64 = 111.0;

/// Stored coordinates carry 6 fractional digits (about 0.11 m)
pub const MICRODEGREES_PER_DEGREE: f64 = 1_000_000.0;

/// Floor for `cos(lat)` so the longitude span stays finite near the poles
const MIN_COS_LAT: f64 = 1e-6;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point in kilometres
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Rectangle in latitude/longitude space.
///
/// `west > east` means the box crosses the ±180° antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Build a box from map viewport corners (south-west and north-east)
    pub fn from_corners(sw_lng: f64, sw_lat: f64, ne_lng: f64, ne_lat: f64) -> Self {
        Self::new(sw_lng, sw_lat, ne_lng, ne_lat)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Exact point-in-rectangle test with antimeridian wraparound
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let in_lat = lat >= self.south && lat <= self.north;
        let in_lon = if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        };
        in_lat && in_lon
    }

    /// Wrap the longitude edges back into `[-180, 180]`.
    ///
    /// A box derived from a radius near the antimeridian can run past ±180°;
    /// wrapping turns it into a crossing box so the far side is not lost.
    /// A span of a full turn or more covers every longitude.
    pub fn normalized(&self) -> Self {
        let span = self.east - self.west;
        if span >= 360.0 {
            return Self::new(-180.0, self.south, 180.0, self.north);
        }
        if (-180.0..=180.0).contains(&self.west) && (-180.0..=180.0).contains(&self.east) {
            return *self;
        }
        Self::new(
            wrap_longitude(self.west),
            self.south,
            wrap_longitude(self.east),
            self.north,
        )
    }
}

/// Centre plus radius for circle searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl RadiusQuery {
    pub fn new(center_lat: f64, center_lon: f64, radius_km: f64) -> Self {
        Self {
            center: GeoPoint::new(center_lat, center_lon),
            radius_km,
        }
    }

    /// Loose enclosing box, see [`radius_to_bbox`]
    pub fn bounding_box(&self) -> BoundingBox {
        radius_to_bbox(self.center.lat, self.center.lon, self.radius_km)
    }

    /// Box guaranteed to contain the whole circle, see [`enclosing_box`]
    pub fn enclosing_box(&self) -> BoundingBox {
        enclosing_box(self.center.lat, self.center.lon, self.radius_km)
    }

    /// Exact acceptance test for radius search
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        distance_km(self.center.lat, self.center.lon, lat, lon) <= self.radius_km
    }
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

pub fn to_degrees(radians: f64) -> f64 {
    radians * (180.0 / std::f64::consts::PI)
}

/// Approximate box enclosing a circle of `radius_km` around `(lat, lon)`.
///
/// This is a pre-filter only: it is looser than the circle and its corners
/// are outside the radius, so callers must still test exact distance.
pub fn radius_to_bbox(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let d_lat = radius_km / KM_PER_DEGREE;
    let cos_lat = to_radians(lat).cos().max(MIN_COS_LAT);
    let d_lon = radius_km / (KM_PER_DEGREE * cos_lat);

    BoundingBox {
        west: lon - d_lon,
        south: lat - d_lat,
        east: lon + d_lon,
        north: lat + d_lat,
    }
}

/// Smallest box containing every point within `radius_km` of `(lat, lon)`.
///
/// The longitude half-span is the tangent meridian of the spherical cap,
/// `asin(sin(d) / cos(lat))`. When the cap reaches a pole the box covers
/// every longitude. Edges are padded by one micro-degree so a range test at
/// stored precision never clips the circle. The result is normalized.
pub fn enclosing_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let pad = 1.0 / MICRODEGREES_PER_DEGREE;
    let angular = radius_km / EARTH_RADIUS_KM;
    let d_lat = to_degrees(angular);

    let south = lat - d_lat - pad;
    let north = lat + d_lat + pad;
    if south <= -90.0 || north >= 90.0 || angular >= std::f64::consts::FRAC_PI_2 {
        return BoundingBox::new(-180.0, south.max(-90.0), 180.0, north.min(90.0));
    }

    let ratio = (angular.sin() / to_radians(lat).cos()).min(1.0);
    let d_lon = to_degrees(ratio.asin()) + pad;

    BoundingBox::new(lon - d_lon, south, lon + d_lon, north).normalized()
}

/// Haversine great-circle distance in kilometres
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = to_radians(lat2 - lat1);
    let d_lon = to_radians(lon2 - lon1);

    let a = (d_lat / 2.0).sin().powi(2)
        + to_radians(lat1).cos() * to_radians(lat2).cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Degrees to fixed-point micro-degrees, rounding to 6 fractional digits
pub fn to_micro_degrees(degrees: f64) -> i64 {
    (degrees * MICRODEGREES_PER_DEGREE).round() as i64
}

pub fn from_micro_degrees(micro: i64) -> f64 {
    micro as f64 / MICRODEGREES_PER_DEGREE
}

/// Smallest stored value whose coordinate is `>= degrees`
pub fn micro_degrees_at_least(degrees: f64) -> i64 {
    let mut micro = (degrees * MICRODEGREES_PER_DEGREE).ceil() as i64;
    while from_micro_degrees(micro - 1) >= degrees {
        micro -= 1;
    }
    while from_micro_degrees(micro) < degrees {
        micro += 1;
    }
    micro
}

/// Largest stored value whose coordinate is `<= degrees`
pub fn micro_degrees_at_most(degrees: f64) -> i64 {
    let mut micro = (degrees * MICRODEGREES_PER_DEGREE).floor() as i64;
    while from_micro_degrees(micro + 1) <= degrees {
        micro += 1;
    }
    while from_micro_degrees(micro) > degrees {
        micro -= 1;
    }
    micro
}

/// Round a coordinate to the precision it will have once stored
pub fn round_coordinate(degrees: f64) -> f64 {
    from_micro_degrees(to_micro_degrees(degrees))
}

fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the east edge on +180
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}
