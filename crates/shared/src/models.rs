//! Data models for the catalog client.
//!
//! This module defines the catalog records returned by the Jikan API
//! (summaries, full details, recommendation entries) and the facet filters
//! a user can apply when browsing without a text query.

use serde::{Deserialize, Serialize};

/// Anime record as it appears in search results, top lists and
/// recommendation entries.
///
/// Only `mal_id` is required; it is the identity used for de-duplication
/// and detail lookups. Everything else is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<AnimeImages>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub synopsis: Option<String>,
}

impl AnimeSummary {
    /// Minimal record with only identity and title, mostly for tests.
    pub fn new(mal_id: u32, title: impl Into<String>) -> Self {
        Self {
            mal_id,
            url: None,
            images: None,
            title: title.into(),
            title_english: None,
            anime_type: None,
            episodes: None,
            status: None,
            score: None,
            rank: None,
            popularity: None,
            members: None,
            synopsis: None,
        }
    }

    /// Regular-size cover image, if the API sent one
    pub fn image_url(&self) -> Option<&str> {
        self.images.as_ref().and_then(|i| i.jpg.image_url.as_deref())
    }

    /// Large cover image, falling back to the regular one
    pub fn large_image_url(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|i| i.jpg.large_image_url.as_deref())
            .or_else(|| self.image_url())
    }
}

/// Anime images
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimeImages {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Full anime record from `anime/{id}/full`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetails {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<AnimeImages>,

    // Titles
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,

    // Type and status
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,

    // Scores and rankings
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u32>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub favorites: Option<u32>,

    // Synopsis
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub background: Option<String>,

    // Season
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,

    #[serde(default)]
    pub genres: Vec<MalEntity>,
    #[serde(default)]
    pub themes: Vec<MalEntity>,
    #[serde(default)]
    pub studios: Vec<MalEntity>,
}

/// MAL entity (genre, studio, theme, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One item of the `recommendations/anime` feed.
///
/// The API pairs two titles per recommendation; only the first one is
/// used for identity and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    /// Pair identifier such as `"5114-11061"`
    #[serde(default)]
    pub mal_id: Option<String>,
    #[serde(default)]
    pub entry: Vec<AnimeSummary>,
    #[serde(default)]
    pub content: Option<String>,
}

impl RecommendationEntry {
    pub fn primary_entry(&self) -> Option<&AnimeSummary> {
        self.entry.first()
    }

    /// Recommendation text cut to `max_chars`, with a placeholder when the
    /// user left none.
    pub fn blurb(&self, max_chars: usize) -> String {
        match self.content.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                if text.chars().count() > max_chars {
                    let cut: String = text.chars().take(max_chars).collect();
                    format!("{}…", cut)
                } else {
                    text.to_string()
                }
            }
            _ => "No description available.".to_string(),
        }
    }
}

/// Media type facet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Tv,
    Movie,
    Ova,
    Special,
    Ona,
    Music,
    Cm,
    Pv,
    TvSpecial,
}

impl MediaType {
    pub const ALL: [MediaType; 9] = [
        MediaType::Tv,
        MediaType::Movie,
        MediaType::Ova,
        MediaType::Special,
        MediaType::Ona,
        MediaType::Music,
        MediaType::Cm,
        MediaType::Pv,
        MediaType::TvSpecial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Tv => "tv",
            MediaType::Movie => "movie",
            MediaType::Ova => "ova",
            MediaType::Special => "special",
            MediaType::Ona => "ona",
            MediaType::Music => "music",
            MediaType::Cm => "cm",
            MediaType::Pv => "pv",
            MediaType::TvSpecial => "tv_special",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "tv" => Ok(MediaType::Tv),
            "movie" => Ok(MediaType::Movie),
            "ova" => Ok(MediaType::Ova),
            "special" => Ok(MediaType::Special),
            "ona" => Ok(MediaType::Ona),
            "music" => Ok(MediaType::Music),
            "cm" => Ok(MediaType::Cm),
            "pv" => Ok(MediaType::Pv),
            "tv_special" => Ok(MediaType::TvSpecial),
            _ => Err(anyhow::anyhow!("Invalid media type: {}", s)),
        }
    }
}

/// Top-list category facet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TopFilter {
    Airing,
    Upcoming,
    ByPopularity,
    Favorite,
}

impl TopFilter {
    pub const ALL: [TopFilter; 4] = [
        TopFilter::Airing,
        TopFilter::Upcoming,
        TopFilter::ByPopularity,
        TopFilter::Favorite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopFilter::Airing => "airing",
            TopFilter::Upcoming => "upcoming",
            TopFilter::ByPopularity => "bypopularity",
            TopFilter::Favorite => "favorite",
        }
    }
}

impl std::fmt::Display for TopFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TopFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).replace('_', "").as_str() {
            "airing" => Ok(TopFilter::Airing),
            "upcoming" => Ok(TopFilter::Upcoming),
            "bypopularity" => Ok(TopFilter::ByPopularity),
            "favorite" => Ok(TopFilter::Favorite),
            _ => Err(anyhow::anyhow!("Invalid top filter: {}", s)),
        }
    }
}

/// Content rating facet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    G,
    Pg,
    Pg13,
    R17,
    R,
    Rx,
}

impl ContentRating {
    pub const ALL: [ContentRating; 6] = [
        ContentRating::G,
        ContentRating::Pg,
        ContentRating::Pg13,
        ContentRating::R17,
        ContentRating::R,
        ContentRating::Rx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRating::G => "g",
            ContentRating::Pg => "pg",
            ContentRating::Pg13 => "pg13",
            ContentRating::R17 => "r17",
            ContentRating::R => "r",
            ContentRating::Rx => "rx",
        }
    }
}

impl std::fmt::Display for ContentRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContentRating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).replace(['_', '-'], "").as_str() {
            "g" => Ok(ContentRating::G),
            "pg" => Ok(ContentRating::Pg),
            "pg13" => Ok(ContentRating::Pg13),
            "r17" => Ok(ContentRating::R17),
            "r" => Ok(ContentRating::R),
            "rx" => Ok(ContentRating::Rx),
            _ => Err(anyhow::anyhow!("Invalid content rating: {}", s)),
        }
    }
}

// "TV Special" / "By Popularity" -> "tv_special" / "by_popularity"
fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Facet filters used when browsing without a text query.
///
/// Fields are independent; `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub top_filter: Option<TopFilter>,
    #[serde(default)]
    pub rating: Option<ContentRating>,
    #[serde(default)]
    pub sfw_only: bool,
}

impl FilterSet {
    /// True when no facet constrains the browse request
    pub fn is_empty(&self) -> bool {
        self.media_type.is_none()
            && self.top_filter.is_none()
            && self.rating.is_none()
            && !self.sfw_only
    }
}
