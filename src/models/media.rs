use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Display metadata carried through scoring untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A media item eligible for scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaCandidate {
    pub media_id: String,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(flatten)]
    pub metadata: MediaMetadata,
}

impl MediaCandidate {
    pub fn new<I, S>(media_id: impl Into<String>, genres: I, popularity_score: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            media_id: media_id.into(),
            genres: genres.into_iter().map(Into::into).collect(),
            popularity_score,
            metadata: MediaMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Number of this candidate's genres present in `genres`
    pub fn genre_match_count(&self, genres: &[String]) -> usize {
        self.genres.iter().filter(|g| genres.contains(g)).count()
    }
}

/// Catalog hit for a genre query, with how many of the queried genres it carries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreMatch {
    #[serde(flatten)]
    pub candidate: MediaCandidate,
    pub genre_match_count: i64,
}

/// Ordering used when listing the whole catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrder {
    /// Highest popularity_score first
    #[default]
    Popularity,
    /// Most recently created first
    Recency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_json_flattens_metadata() {
        let candidate = MediaCandidate::new("media-3", ["ACTION", "THRILLER"], 0.9).with_metadata(
            MediaMetadata {
                title: Some("Inception".to_string()),
                release_year: Some(2010),
                ..Default::default()
            },
        );

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["media_id"], "media-3");
        assert_eq!(json["title"], "Inception");
        assert_eq!(json["release_year"], 2010);
        assert_eq!(json["genres"], serde_json::json!(["ACTION", "THRILLER"]));
        assert!(json.get("cover_url").is_none());
    }

    #[test]
    fn test_duplicate_genres_collapse() {
        let candidate = MediaCandidate::new("m", ["ACTION", "ACTION", "DRAMA"], 0.1);
        assert_eq!(candidate.genres.len(), 2);
        assert_eq!(
            candidate.genre_match_count(&["ACTION".to_string(), "HORROR".to_string()]),
            1
        );
    }

    #[test]
    fn test_catalog_order_parses_lowercase() {
        let order: CatalogOrder = serde_json::from_str("\"recency\"").unwrap();
        assert_eq!(order, CatalogOrder::Recency);
        assert_eq!(CatalogOrder::default(), CatalogOrder::Popularity);
    }
}
