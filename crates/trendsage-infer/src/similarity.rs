//! Cosine similarity and linear nearest-neighbour search.

use ndarray::Array1;

use trendsage_core::{Error, Result};

/// Dot product divided by the product of magnitudes, in [-1, 1].
///
/// Zero-magnitude or mismatched-length inputs score 0.0.
pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a < 1e-12 || norm_b < 1e-12 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Highest-scoring candidate from a linear scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub index: usize,
    pub score: f32,
}

/// Scan every candidate and return the most similar one.
///
/// Ties keep the earliest candidate. A candidate whose dimension differs
/// from the query is an error: vectors from different models cannot be
/// compared.
pub fn best_match<'a, I>(query: &Array1<f32>, candidates: I) -> Result<Option<BestMatch>>
where
    I: IntoIterator<Item = &'a Array1<f32>>,
{
    let mut best: Option<BestMatch> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        if candidate.len() != query.len() {
            return Err(Error::Embedding(format!(
                "dimension mismatch: query has {} values, candidate {} has {}",
                query.len(),
                index,
                candidate.len()
            )));
        }
        let score = cosine_similarity(query, candidate);
        match best {
            Some(b) if score <= b.score => {}
            _ => best = Some(BestMatch { index, score }),
        }
    }
    Ok(best)
}
