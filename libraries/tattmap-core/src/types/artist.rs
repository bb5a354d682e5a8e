//! Artist types

use super::UserId;
use crate::error::{Result, TattmapError};
use crate::geo::{self, GeoPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An artist profile, one per user.
///
/// Coordinates are plain degrees here; the fixed-point form only exists in
/// storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    /// Storage row id, used as the stable tie-break key
    #[serde(skip)]
    pub id: i64,
    pub user_id: UserId,
    pub nickname: String,
    pub description: String,
    pub avatar: String,

    pub city: String,
    pub country: String,
    pub country_code: Option<String>,
    pub region_name: Option<String>,
    pub region_code: Option<String>,
    pub region_code_full: Option<String>,
    pub address: String,
    pub postcode: Option<String>,
    pub street_name: Option<String>,
    pub address_number: Option<String>,

    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub routable_lat: Option<f64>,
    pub routable_lon: Option<f64>,

    pub styles: Vec<String>,
    pub beginner: bool,
    pub color: bool,
    pub black_and_gray: bool,
    pub coverups: bool,
    pub photos: Vec<String>,

    pub instagram: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tiktok: Option<String>,
    pub facebook: Option<String>,
    pub telegram: Option<String>,
    pub whatsapp: Option<String>,
    pub wechat: Option<String>,
    pub snapchat: Option<String>,

    /// Geocoder payload kept verbatim, never interpreted by search
    pub geo_raw: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artist {
    /// Canonical point, when both coordinates are set
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

/// Artist plus its aggregated like count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistWithLikes {
    #[serde(flatten)]
    pub artist: Artist,
    pub likes: i64,
}

/// Minimal row for map rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPoint {
    pub user_id: UserId,
    pub lat: f64,
    pub lon: f64,
}

/// Owner-supplied profile data for create-or-update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertArtist {
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub country_code: Option<String>,
    pub address: String,
    pub nickname: String,
    pub description: String,
    pub styles: Vec<String>,
    pub instagram: String,

    #[serde(default)]
    pub beginner: Option<bool>,
    #[serde(default)]
    pub coverups: Option<bool>,
    #[serde(default)]
    pub color: Option<bool>,
    #[serde(default)]
    pub black_and_gray: Option<bool>,

    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub wechat: Option<String>,
    #[serde(default)]
    pub snapchat: Option<String>,

    #[serde(default)]
    pub photos: Option<Vec<String>>,

    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,

    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub region_code_full: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub address_number: Option<String>,
    #[serde(default)]
    pub routable_lat: Option<f64>,
    #[serde(default)]
    pub routable_lon: Option<f64>,

    #[serde(default)]
    pub geo_raw: Option<serde_json::Value>,
}

impl UpsertArtist {
    /// Reject payloads the storage layer must never see
    pub fn validate(&self) -> Result<()> {
        let limits: [(&str, Option<&str>, usize); 21] = [
            ("city", Some(self.city.as_str()), 200),
            ("country", Some(self.country.as_str()), 200),
            ("countryCode", self.country_code.as_deref(), 10),
            ("address", Some(self.address.as_str()), 500),
            ("nickname", Some(self.nickname.as_str()), 100),
            ("description", Some(self.description.as_str()), 2000),
            ("instagram", Some(self.instagram.as_str()), 100),
            ("email", self.email.as_deref(), 320),
            ("website", self.website.as_deref(), 2048),
            ("tiktok", self.tiktok.as_deref(), 100),
            ("facebook", self.facebook.as_deref(), 100),
            ("telegram", self.telegram.as_deref(), 100),
            ("whatsapp", self.whatsapp.as_deref(), 100),
            ("wechat", self.wechat.as_deref(), 100),
            ("snapchat", self.snapchat.as_deref(), 100),
            ("regionName", self.region_name.as_deref(), 200),
            ("regionCode", self.region_code.as_deref(), 50),
            ("regionCodeFull", self.region_code_full.as_deref(), 50),
            ("postcode", self.postcode.as_deref(), 20),
            ("streetName", self.street_name.as_deref(), 300),
            ("addressNumber", self.address_number.as_deref(), 20),
        ];

        for (field, value, max) in limits {
            if let Some(value) = value {
                if value.chars().count() > max {
                    return Err(TattmapError::invalid_input(format!(
                        "{field} must be at most {max} characters"
                    )));
                }
            }
        }

        if self.lat.is_some() != self.lon.is_some() {
            return Err(TattmapError::invalid_input("lat and lon must be set together"));
        }
        if self.routable_lat.is_some() != self.routable_lon.is_some() {
            return Err(TattmapError::invalid_input(
                "routableLat and routableLon must be set together",
            ));
        }

        check_latitude("lat", self.lat)?;
        check_longitude("lon", self.lon)?;
        check_latitude("routableLat", self.routable_lat)?;
        check_longitude("routableLon", self.routable_lon)?;

        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            let well_formed = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !well_formed {
                return Err(TattmapError::invalid_input("email is not a valid address"));
            }
        }

        Ok(())
    }

    /// Apply write-side normalisation.
    ///
    /// Country codes are trimmed and upper-cased (blank becomes `None`) and
    /// coordinates are rounded to the stored precision.
    pub fn normalized(mut self) -> Self {
        self.country_code = normalize_country_code(self.country_code.as_deref());
        self.lat = self.lat.map(geo::round_coordinate);
        self.lon = self.lon.map(geo::round_coordinate);
        self.routable_lat = self.routable_lat.map(geo::round_coordinate);
        self.routable_lon = self.routable_lon.map(geo::round_coordinate);
        self
    }
}

/// Trim and upper-case an ISO-2 country code; blank input yields `None`
pub fn normalize_country_code(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| code.to_uppercase())
}

fn check_latitude(field: &str, value: Option<f64>) -> Result<()> {
    check_range(field, value, 90.0)
}

fn check_longitude(field: &str, value: Option<f64>) -> Result<()> {
    check_range(field, value, 180.0)
}

fn check_range(field: &str, value: Option<f64>, bound: f64) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < -bound || v > bound => Err(
            TattmapError::invalid_input(format!("{field} must be within [-{bound}, {bound}]")),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> UpsertArtist {
        UpsertArtist {
            city: "Amsterdam".to_string(),
            country: "Netherlands".to_string(),
            country_code: Some(" nl ".to_string()),
            address: "Damrak 1".to_string(),
            nickname: "ink_master".to_string(),
            description: "Fine line".to_string(),
            styles: vec!["Traditional".to_string()],
            instagram: "@ink".to_string(),
            lat: Some(52.374_000_4),
            lon: Some(4.897),
            ..UpsertArtist::default()
        }
    }

    #[test]
    fn test_normalized_uppercases_country_code() {
        let normalized = payload().normalized();
        assert_eq!(normalized.country_code.as_deref(), Some("NL"));
        assert_eq!(normalized.lat, Some(52.374));
    }

    #[test]
    fn test_blank_country_code_becomes_none() {
        assert_eq!(normalize_country_code(Some("   ")), None);
        assert_eq!(normalize_country_code(None), None);
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut bad = payload();
        bad.lat = Some(91.0);
        assert!(bad.validate().is_err());

        let mut bad = payload();
        bad.lon = Some(f64::NAN);
        assert!(bad.validate().is_err());

        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_coordinate_pairs() {
        let mut bad = payload();
        bad.lon = None;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_nickname() {
        let mut bad = payload();
        bad.nickname = "x".repeat(101);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_payload_deserializes_camel_case() {
        let json = serde_json::json!({
            "city": "Berlin",
            "country": "Germany",
            "address": "Torstr. 1",
            "nickname": "needle",
            "description": "",
            "styles": ["Blackwork"],
            "instagram": "@needle",
            "blackAndGray": true,
            "regionCodeFull": "DE-BE"
        });
        let parsed: UpsertArtist = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.black_and_gray, Some(true));
        assert_eq!(parsed.region_code_full.as_deref(), Some("DE-BE"));
        assert!(parsed.photos.is_none());
    }
}
