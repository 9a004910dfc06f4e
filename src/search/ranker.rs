//! Cosine-similarity ranking over a dense, row-major embedding matrix.
//!
//! Scoring `N` rows of dimension `D` is a single pass of `N` dot products, O(N·D).

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::warn;

type Float = f32;

/// Above this many rows, scores are computed on the rayon pool.
const PARALLEL_ROWS_THRESHOLD: usize = 4096;

/// Row-major `rows × dim` buffer of embeddings. Row `i` belongs to catalog entry `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<Float>,
    rows: usize,
    dim: usize,
}

impl EmbeddingMatrix {
    /// Packs rows into one buffer. All rows must share a non-zero dimension.
    pub fn from_rows(rows: Vec<Vec<Float>>) -> Result<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        if !rows.is_empty() && dim == 0 {
            return Err(anyhow!("Embeddings must have a non-zero dimension"));
        }

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(anyhow!(
                    "Embedding dimension mismatch at row {}. Expected {}, got {}.",
                    i,
                    dim,
                    row.len()
                ));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            data,
            rows: rows.len(),
            dim,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, i: usize) -> &[Float] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Cosine similarity of `query` against every row, in row order.
    ///
    /// Rows are assumed unit-norm; the query is re-normalized here. A zero query,
    /// or one whose dimension does not match, scores zero everywhere.
    pub fn scores(&self, query: &[Float]) -> Vec<Float> {
        if self.rows == 0 {
            return Vec::new();
        }
        if query.len() != self.dim {
            warn!(
                expected = self.dim,
                got = query.len(),
                "Query embedding dimension mismatch"
            );
            return vec![0.0; self.rows];
        }

        let q = l2_normalize(query);
        if q.iter().all(|x| *x == 0.0) {
            return vec![0.0; self.rows];
        }

        if self.rows >= PARALLEL_ROWS_THRESHOLD {
            self.data.par_chunks(self.dim).map(|row| dot(row, &q)).collect()
        } else {
            self.data.chunks(self.dim).map(|row| dot(row, &q)).collect()
        }
    }
}

/// A catalog position and its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: Float,
}

/// Ranks every row of `matrix` against `query`, best first, keeping `max(1, limit)`.
///
/// Equal scores keep catalog order (lower index first). Never fails: a bad limit is
/// clamped and a degenerate query yields zero scores in catalog order.
pub fn rank(query: &[Float], matrix: &EmbeddingMatrix, limit: i64) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = matrix
        .scores(query)
        .into_iter()
        .enumerate()
        .map(|(index, score)| Ranked { index, score })
        .collect();

    // Stable: ties stay in index order.
    ranked.sort_by(|a, b| descending(a.score, b.score));
    ranked.truncate(effective_limit(limit));
    ranked
}

/// Coerces a requested result count to at least one.
pub fn effective_limit(limit: i64) -> usize {
    usize::try_from(limit.max(1)).unwrap_or(usize::MAX)
}

// NaN sorts after every real score.
fn descending(a: Float, b: Float) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[inline]
fn dot(a: &[Float], b: &[Float]) -> Float {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scales `vector` to unit length. Zero or non-finite input gives the zero vector.
pub fn l2_normalize(vector: &[Float]) -> Vec<Float> {
    let norm = vector.iter().map(|x| x * x).sum::<Float>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return vec![0.0; vector.len()];
    }
    vector.iter().map(|x| x / norm).collect()
}
