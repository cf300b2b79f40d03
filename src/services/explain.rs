use crate::models::{Candidate, Facets, ScoredCandidate};

/// Reason attached when no structured overlap exists.
const GENERIC_REASON: &str = "Similar in style and themes";

/// Overlap between a candidate's facets and the union of the seeds' facets.
/// BTreeSet intersections come out sorted, so the names picked for the
/// reason text are deterministic.
struct FacetOverlap {
    directors: Vec<String>,
    actors: Vec<String>,
    genres: Vec<String>,
}

impl FacetOverlap {
    fn new(candidate: &Facets, seeds: &Facets) -> Self {
        Self {
            directors: candidate
                .directors
                .intersection(&seeds.directors)
                .cloned()
                .collect(),
            actors: candidate.actors.intersection(&seeds.actors).cloned().collect(),
            genres: candidate.genres.intersection(&seeds.genres).cloned().collect(),
        }
    }
}

type Rule = fn(&FacetOverlap) -> Option<String>;

/// Reason rules in priority order: director > cast > genre.
const RULES: &[Rule] = &[same_director, shared_cast, similar_genres];

fn same_director(overlap: &FacetOverlap) -> Option<String> {
    overlap
        .directors
        .first()
        .map(|name| format!("Same director: {}", name))
}

fn shared_cast(overlap: &FacetOverlap) -> Option<String> {
    match overlap.actors.as_slice() {
        [] => None,
        [name] => Some(format!("Shared cast: {}", name)),
        [first, second, ..] => Some(format!("Shared cast: {}, {}", first, second)),
    }
}

fn similar_genres(overlap: &FacetOverlap) -> Option<String> {
    match overlap.genres.as_slice() {
        [] => None,
        [name] => Some(format!("Similar genres: {}", name)),
        [first, second, ..] => Some(format!("Similar genres: {}, {}", first, second)),
    }
}

/// Derives the justification for one candidate from its attribute overlap
/// with the seed set. Affects only the attached text, never the ranking.
pub fn explain(candidate: &Facets, seed_facets: &Facets) -> String {
    let overlap = FacetOverlap::new(candidate, seed_facets);
    RULES
        .iter()
        .find_map(|rule| rule(&overlap))
        .unwrap_or_else(|| GENERIC_REASON.to_string())
}

/// Finalizes a ranked candidate into its client-facing form.
pub fn attach(candidate: ScoredCandidate, seed_facets: &Facets) -> Candidate {
    let reason = explain(&candidate.facets, seed_facets);
    Candidate {
        id: candidate.id,
        title: candidate.title,
        poster: candidate.poster,
        synopsis: candidate.synopsis,
        score: candidate.score,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facets(directors: &[&str], actors: &[&str], genres: &[&str]) -> Facets {
        Facets {
            directors: directors.iter().map(|s| s.to_string()).collect(),
            actors: actors.iter().map(|s| s.to_string()).collect(),
            genres: genres.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_director_outranks_cast_and_genre() {
        let candidate = facets(&["Lynch"], &["MacLachlan"], &["Mystery"]);
        let seeds = facets(&["Lynch"], &["MacLachlan"], &["Mystery"]);
        assert_eq!(explain(&candidate, &seeds), "Same director: Lynch");
    }

    #[test]
    fn test_two_shared_actors_lists_two_names() {
        let candidate = facets(&[], &["Blanchett", "Driver", "Adams"], &[]);
        let seeds = facets(&["Someone"], &["Adams", "Blanchett", "Driver"], &[]);
        assert_eq!(explain(&candidate, &seeds), "Shared cast: Adams, Blanchett");
    }

    #[test]
    fn test_single_shared_actor_lists_one_name() {
        let candidate = facets(&[], &["Oldman"], &["Drama"]);
        let seeds = facets(&[], &["Oldman"], &[]);
        assert_eq!(explain(&candidate, &seeds), "Shared cast: Oldman");
    }

    #[test]
    fn test_genre_overlap_lists_up_to_two() {
        let candidate = facets(&[], &[], &["Action", "Crime", "Thriller"]);
        let seeds = facets(&[], &[], &["Thriller", "Crime", "Action"]);
        assert_eq!(explain(&candidate, &seeds), "Similar genres: Action, Crime");
    }

    #[test]
    fn test_no_overlap_falls_back_to_generic_reason() {
        let candidate = facets(&["A"], &["B"], &["C"]);
        let seeds = facets(&["D"], &["E"], &["F"]);
        assert_eq!(explain(&candidate, &seeds), GENERIC_REASON);
    }

    #[test]
    fn test_names_are_picked_deterministically() {
        let candidate = facets(&[], &[], &["Western", "Drama"]);
        let seeds = facets(&[], &[], &["Drama", "Western"]);
        // sorted set order, not insertion order
        assert_eq!(explain(&candidate, &seeds), "Similar genres: Drama, Western");
    }
}
