//! Row types shared by the slices and the search backends

use chrono::{DateTime, Utc};
use tattmap_core::geo::from_micro_degrees;
use tattmap_core::types::{Artist, Role, User, UserId};
use tattmap_core::Result;

/// Artist columns, aliased to the `a` table name used by every query
pub(crate) const ARTIST_COLUMNS: &str = "a.id, a.user_id, a.nickname, a.description, a.avatar, \
     a.city, a.country, a.country_code, a.region_name, a.region_code, a.region_code_full, \
     a.address, a.postcode, a.street_name, a.address_number, \
     a.lat_e6, a.lon_e6, a.routable_lat_e6, a.routable_lon_e6, \
     a.styles, a.beginner, a.color, a.black_and_gray, a.coverups, a.photos, \
     a.instagram, a.email, a.website, a.tiktok, a.facebook, a.telegram, a.whatsapp, \
     a.wechat, a.snapchat, a.geo_raw, a.created_at, a.updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArtistRow {
    id: i64,
    user_id: String,
    nickname: String,
    description: String,
    avatar: String,
    city: String,
    country: String,
    country_code: Option<String>,
    region_name: Option<String>,
    region_code: Option<String>,
    region_code_full: Option<String>,
    address: String,
    postcode: Option<String>,
    street_name: Option<String>,
    address_number: Option<String>,
    lat_e6: Option<i64>,
    lon_e6: Option<i64>,
    routable_lat_e6: Option<i64>,
    routable_lon_e6: Option<i64>,
    styles: String,
    beginner: bool,
    color: bool,
    black_and_gray: bool,
    coverups: bool,
    photos: String,
    instagram: String,
    email: Option<String>,
    website: Option<String>,
    tiktok: Option<String>,
    facebook: Option<String>,
    telegram: Option<String>,
    whatsapp: Option<String>,
    wechat: Option<String>,
    snapchat: Option<String>,
    geo_raw: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl ArtistRow {
    pub(crate) fn into_artist(self) -> Result<Artist> {
        let geo_raw = match self.geo_raw {
            Some(raw) => Some(serde_json::from_str(&raw)?),
            None => None,
        };

        Ok(Artist {
            id: self.id,
            user_id: UserId::new(self.user_id),
            nickname: self.nickname,
            description: self.description,
            avatar: self.avatar,
            city: self.city,
            country: self.country,
            country_code: self.country_code,
            region_name: self.region_name,
            region_code: self.region_code,
            region_code_full: self.region_code_full,
            address: self.address,
            postcode: self.postcode,
            street_name: self.street_name,
            address_number: self.address_number,
            lat: self.lat_e6.map(from_micro_degrees),
            lon: self.lon_e6.map(from_micro_degrees),
            routable_lat: self.routable_lat_e6.map(from_micro_degrees),
            routable_lon: self.routable_lon_e6.map(from_micro_degrees),
            styles: serde_json::from_str(&self.styles)?,
            beginner: self.beginner,
            color: self.color,
            black_and_gray: self.black_and_gray,
            coverups: self.coverups,
            photos: serde_json::from_str(&self.photos)?,
            instagram: self.instagram,
            email: self.email,
            website: self.website,
            tiktok: self.tiktok,
            facebook: self.facebook,
            telegram: self.telegram,
            whatsapp: self.whatsapp,
            wechat: self.wechat,
            snapchat: self.snapchat,
            geo_raw,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

pub(crate) fn into_artists(rows: Vec<ArtistRow>) -> Result<Vec<Artist>> {
    rows.into_iter().map(ArtistRow::into_artist).collect()
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: String,
    google_id: String,
    email: String,
    name: Option<String>,
    avatar: Option<String>,
    role: String,
    created_at: i64,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User> {
        Ok(User {
            id: UserId::new(self.id),
            google_id: self.google_id,
            email: self.email,
            name: self.name,
            avatar: self.avatar,
            role: self.role.parse::<Role>()?,
            created_at: from_millis(self.created_at),
        })
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
