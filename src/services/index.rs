use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::models::CatalogEntry;

/// Per-facet weights: who made the film influences similarity more than
/// what shelf it sits on.
const DIRECTOR_WEIGHT: f64 = 1.3;
const ACTOR_WEIGHT: f64 = 1.1;
const GENRE_WEIGHT: f64 = 1.0;

/// Errors raised when building the feature index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("catalog snapshot is empty")]
    EmptyCatalog,
    #[error("no feature signal: every facet is empty across the catalog")]
    NoFeatureSignal,
}

/// The facet families indexed for similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Directors,
    Actors,
    Genres,
}

/// Block layout of the combined matrix, in column order.
const FACETS: [(Facet, f64); 3] = [
    (Facet::Directors, DIRECTOR_WEIGHT),
    (Facet::Actors, ACTOR_WEIGHT),
    (Facet::Genres, GENRE_WEIGHT),
];

impl Facet {
    fn values<'a>(&self, entry: &'a CatalogEntry) -> &'a BTreeSet<String> {
        match self {
            Facet::Directors => &entry.facets.directors,
            Facet::Actors => &entry.facets.actors,
            Facet::Genres => &entry.facets.genres,
        }
    }
}

/// One facet's column block within the combined feature matrix.
struct FacetBlock {
    facet: Facet,
    offset: usize,
    weight: f64,
    /// value -> column within the block
    columns: HashMap<String, usize>,
    /// lexicographically sorted, deduplicated across the whole catalog
    vocabulary: Vec<String>,
}

/// In-memory nearest-neighbor index over the catalog
///
/// Each entry becomes one row of a weighted sparse one-hot matrix; each facet
/// contributes a disjoint column block scaled by its weight. The structure is
/// immutable once built and replaced wholesale on refresh.
pub struct FeatureIndex {
    entries: Vec<CatalogEntry>,
    id_to_row: HashMap<u64, usize>,
    blocks: Vec<FacetBlock>,
    matrix: Array2<f64>,
    row_norms: Vec<f64>,
    built_at: DateTime<Utc>,
}

impl FeatureIndex {
    /// Builds the index from a catalog snapshot.
    ///
    /// A facet with no observed values across the catalog contributes zero
    /// columns and is omitted. Fails when the snapshot is empty or when no
    /// facet has any values at all.
    pub fn build(entries: Vec<CatalogEntry>) -> Result<Self, IndexError> {
        if entries.is_empty() {
            return Err(IndexError::EmptyCatalog);
        }

        let mut blocks = Vec::new();
        let mut width = 0;
        for (facet, weight) in FACETS {
            let mut values: BTreeSet<String> = BTreeSet::new();
            for entry in &entries {
                values.extend(facet.values(entry).iter().cloned());
            }
            if values.is_empty() {
                continue;
            }
            let vocabulary: Vec<String> = values.into_iter().collect();
            let columns = vocabulary
                .iter()
                .enumerate()
                .map(|(col, value)| (value.clone(), col))
                .collect();
            let block_width = vocabulary.len();
            blocks.push(FacetBlock {
                facet,
                offset: width,
                weight,
                columns,
                vocabulary,
            });
            width += block_width;
        }

        if width == 0 {
            return Err(IndexError::NoFeatureSignal);
        }

        let mut matrix = Array2::zeros((entries.len(), width));
        for (row, entry) in entries.iter().enumerate() {
            for block in &blocks {
                for value in block.facet.values(entry) {
                    if let Some(&col) = block.columns.get(value) {
                        matrix[[row, block.offset + col]] = block.weight;
                    }
                }
            }
        }

        let row_norms = matrix
            .rows()
            .into_iter()
            .map(|row| row.dot(&row).sqrt())
            .collect();

        let id_to_row = entries
            .iter()
            .enumerate()
            .map(|(row, entry)| (entry.id, row))
            .collect();

        Ok(Self {
            entries,
            id_to_row,
            blocks,
            matrix,
            row_norms,
            built_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Entries in index row order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry_by_id(&self, id: u64) -> Option<&CatalogEntry> {
        self.id_to_row.get(&id).map(|&row| &self.entries[row])
    }

    /// Sorted vocabulary of one facet; empty when the facet was omitted.
    pub fn vocabulary(&self, facet: Facet) -> &[String] {
        self.blocks
            .iter()
            .find(|block| block.facet == facet)
            .map(|block| block.vocabulary.as_slice())
            .unwrap_or(&[])
    }

    /// L2-normalized sum of the feature rows for the seeds present in the
    /// index. Returns None when no seed resolves; absent seeds are skipped.
    pub fn seed_vector(&self, seed_ids: &[u64]) -> Option<Array1<f64>> {
        let rows: Vec<usize> = seed_ids
            .iter()
            .filter_map(|id| self.id_to_row.get(id).copied())
            .collect();
        if rows.is_empty() {
            return None;
        }

        let mut vector = Array1::zeros(self.matrix.ncols());
        for row in rows {
            vector += &self.matrix.row(row);
        }
        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector /= norm;
        }
        Some(vector)
    }

    /// Nearest rows to the query vector by cosine distance, nearest first,
    /// skipping excluded ids. Equal distances keep build (row) order, which
    /// makes results deterministic for identical inputs. The limit is clamped
    /// to the number of available rows.
    pub fn query(
        &self,
        vector: &Array1<f64>,
        excluded_ids: &HashSet<u64>,
        limit: usize,
    ) -> Vec<(u64, f64)> {
        let query_norm = vector.dot(vector).sqrt();

        let mut neighbors: Vec<(usize, f64)> = Vec::with_capacity(self.entries.len());
        for (row, entry) in self.entries.iter().enumerate() {
            if excluded_ids.contains(&entry.id) {
                continue;
            }
            neighbors.push((row, self.distance(row, vector, query_norm)));
        }

        // stable sort keeps row order on ties
        neighbors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbors.truncate(limit.min(self.entries.len()));
        neighbors
            .into_iter()
            .map(|(row, distance)| (self.entries[row].id, distance))
            .collect()
    }

    fn distance(&self, row: usize, vector: &Array1<f64>, query_norm: f64) -> f64 {
        let denom = self.row_norms[row] * query_norm;
        if denom == 0.0 {
            // a zero vector has no direction; treat it as fully dissimilar
            return 1.0;
        }
        1.0 - self.matrix.row(row).dot(vector) / denom
    }
}
