use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// TMDB image CDN prefix applied to raw poster paths when surfaced.
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w200";

/// Synopses are cut to this many characters when surfaced to the client.
pub const SYNOPSIS_MAX_CHARS: usize = 360;

/// Named categorical attribute families of a catalog entry.
///
/// Values may repeat across entries but never within one entry's set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub directors: BTreeSet<String>,
    pub actors: BTreeSet<String>,
    pub genres: BTreeSet<String>,
}

impl Facets {
    /// Folds another facet set into this one.
    pub fn merge(&mut self, other: &Facets) {
        self.directors.extend(other.directors.iter().cloned());
        self.actors.extend(other.actors.iter().cloned());
        self.genres.extend(other.genres.iter().cloned());
    }
}

/// A single catalog item as produced by the snapshot loader.
///
/// Entries are rebuilt wholesale on every index refresh and immutable once
/// part of a built index.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub synopsis: Option<String>,
    pub facets: Facets,
}

/// Ranked candidate still carrying its facet sets for explanation.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub id: u64,
    pub title: String,
    pub poster: Option<String>,
    pub synopsis: Option<String>,
    pub score: f64,
    pub facets: Facets,
}

impl ScoredCandidate {
    pub fn from_entry(entry: &CatalogEntry, score: f64) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            poster: entry.poster_path.as_deref().map(poster_url),
            synopsis: entry.synopsis.as_deref().map(truncate_synopsis),
            score,
            facets: entry.facets.clone(),
        }
    }

    pub fn from_summary(summary: &MovieSummary, score: f64, facets: Facets) -> Self {
        Self {
            id: summary.id,
            title: summary.display_title(),
            poster: summary.poster_path.as_deref().map(poster_url),
            synopsis: summary.overview.as_deref().map(truncate_synopsis),
            score,
            facets,
        }
    }
}

/// Recommendation returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: u64,
    pub title: String,
    pub poster: Option<String>,
    pub synopsis: Option<String>,
    pub score: f64,
    pub reason: String,
}

pub fn poster_url(path: &str) -> String {
    format!("{}{}", POSTER_BASE_URL, path)
}

pub fn truncate_synopsis(text: &str) -> String {
    text.trim().chars().take(SYNOPSIS_MAX_CHARS).collect()
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Summary row from TMDB similar/discover result pages
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub popularity: f64,
}

impl MovieSummary {
    /// Localized title, falling back to the original title.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.original_title.clone())
            .unwrap_or_else(|| "(untitled)".to_string())
    }
}

/// One page of summary results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_cast_order")]
    pub order: u32,
}

fn default_cast_order() -> u32 {
    999
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    pub job: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Response from GET /movie/{id}?append_to_response=credits
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub credits: Credits,
}

impl MovieDetails {
    /// Crew members credited as the film's director.
    pub fn directors(&self) -> impl Iterator<Item = &CrewMember> {
        self.credits.crew.iter().filter(|c| c.job == "Director")
    }

    /// The n cast members with the best billing order.
    pub fn top_cast(&self, n: usize) -> Vec<&CastMember> {
        let mut cast: Vec<&CastMember> = self.credits.cast.iter().collect();
        cast.sort_by_key(|c| c.order);
        cast.truncate(n);
        cast
    }
}
