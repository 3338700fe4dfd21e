use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One picture-of-the-day record. Immutable once fetched; the date is the
/// only identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apod {
    pub date: NaiveDate,
    pub title: String,
    pub explanation: String,
    pub url: String,
    pub hdurl: Option<String>,
    pub media_type: MediaType,
    pub service_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "video" => MediaType::Video,
            "image" => MediaType::Image,
            _ => MediaType::Other,
        }
    }
}

/// Wire shape of the APOD endpoint. Every field is optional upstream, and
/// `media_type` arrives as free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApodResponse {
    pub date: Option<String>,
    pub title: Option<String>,
    pub explanation: Option<String>,
    pub url: Option<String>,
    pub hdurl: Option<String>,
    pub media_type: Option<String>,
    pub service_version: Option<String>,
}

impl ApodResponse {
    /// Convert to the domain record, defaulting missing text fields.
    /// Records without a parseable date have no identity and are dropped.
    pub fn into_domain(self) -> Option<Apod> {
        let date = self
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())?;

        Some(Apod {
            date,
            title: self.title.unwrap_or_default(),
            explanation: self.explanation.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            hdurl: self.hdurl,
            media_type: self
                .media_type
                .as_deref()
                .map(MediaType::parse)
                .unwrap_or_default(),
            service_version: self.service_version.unwrap_or_else(|| "v1".to_string()),
        })
    }
}

/// Favorite row, stored independently of the cache so favoriting survives
/// cache eviction.
#[derive(Debug, Clone)]
pub struct FavoriteApod {
    pub apod: Apod,
    pub added_at: DateTime<Utc>,
}
