//! Append-only in-memory vector index with exact cosine similarity search.
//!
//! Vectors are L2-normalized on insertion and stored contiguously, so a query
//! is a brute-force inner product against every stored row. All state lives
//! behind a single `RwLock`: an `add` appends vectors and metadata under one
//! write guard, and a `search` scores a consistent snapshot under one read
//! guard.

use std::sync::RwLock;

use cantor_core::error::{CantorError, Result};

/// A single hit returned from a vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<M> {
    /// Insertion position of the matching vector.
    pub position: usize,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
    /// Metadata stored alongside the vector.
    pub metadata: M,
}

#[derive(Debug)]
struct IndexInner<M> {
    /// Row-major unit vectors, `dimension` floats per row.
    data: Vec<f32>,
    metadata: Vec<M>,
    /// Fixed by the first non-empty insertion.
    dimension: Option<usize>,
}

/// Exact nearest-neighbor index over unit vectors with co-stored metadata.
///
/// The positional correspondence between vectors and metadata is the core
/// invariant: row `i` of the vector data always belongs to `metadata[i]`.
#[derive(Debug)]
pub struct VectorIndex<M> {
    inner: RwLock<IndexInner<M>>,
}

impl<M: Clone> VectorIndex<M> {
    /// Create a new empty vector index.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IndexInner {
                data: Vec::new(),
                metadata: Vec::new(),
                dimension: None,
            }),
        }
    }

    /// Append a batch of vectors with their metadata.
    ///
    /// The whole batch is validated before anything is written: on error the
    /// index is unchanged. NaN or infinite components reject the batch. Zero-norm vectors are stored as-is and score 0
    /// against every query.
    pub fn add(&self, vectors: Vec<Vec<f32>>, metas: Vec<M>) -> Result<()> {
        if vectors.len() != metas.len() {
            return Err(CantorError::LengthMismatch {
                vectors: vectors.len(),
                metadata: metas.len(),
            });
        }
        if vectors.is_empty() {
            return Ok(());
        }
        if vectors.iter().flatten().any(|v| !v.is_finite()) {
            return Err(CantorError::InvalidInput(
                "vectors must have finite components".to_string(),
            ));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|e| CantorError::Storage(format!("Lock poisoned: {}", e)))?;

        let dimension = match inner.dimension {
            Some(d) => d,
            None => vectors[0].len(),
        };
        if dimension == 0 {
            return Err(CantorError::InvalidInput(
                "cannot index zero-dimension vectors".to_string(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(CantorError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        inner.data.reserve(vectors.len() * dimension);
        for mut vector in vectors {
            normalize_l2(&mut vector);
            inner.data.extend_from_slice(&vector);
        }
        inner.metadata.extend(metas);
        inner.dimension = Some(dimension);
        Ok(())
    }

    /// Return up to `k` hits ordered by descending cosine similarity.
    ///
    /// Ties keep insertion order. An empty index or `k == 0` yields no hits;
    /// a query whose length differs from the indexed dimension, or that has
    /// a non-finite component, is an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<M>>> {
        if query.iter().any(|v| !v.is_finite()) {
            return Err(CantorError::InvalidInput(
                "query vector must have finite components".to_string(),
            ));
        }

        let inner = self
            .inner
            .read()
            .map_err(|e| CantorError::Storage(format!("Lock poisoned: {}", e)))?;

        let Some(dimension) = inner.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(CantorError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut unit_query = query.to_vec();
        normalize_l2(&mut unit_query);

        let mut scored: Vec<(usize, f32)> = inner
            .data
            .chunks_exact(dimension)
            // `+ 0.0` folds -0.0 into +0.0 so signed zeros tie.
            .map(|row| dot(row, &unit_query).clamp(-1.0, 1.0) + 0.0)
            .enumerate()
            .collect();

        // Stable sort keeps earlier insertions first among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                position,
                score,
                metadata: inner.metadata[position].clone(),
            })
            .collect())
    }

    /// Return the stored (normalized) vector at `position`.
    pub fn vector(&self, position: usize) -> Option<Vec<f32>> {
        let inner = self.inner.read().ok()?;
        let dimension = inner.dimension?;
        let start = position.checked_mul(dimension)?;
        inner
            .data
            .get(start..start + dimension)
            .map(|row| row.to_vec())
    }

    /// Return the metadata stored at `position`.
    pub fn metadata(&self, position: usize) -> Option<M> {
        self.inner.read().ok()?.metadata.get(position).cloned()
    }

    /// Dimension fixed by the first insertion, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.inner.read().ok().and_then(|inner| inner.dimension)
    }

    /// True when a vector of `dimension` floats could be appended.
    pub fn accepts_dimension(&self, dimension: usize) -> bool {
        dimension > 0 && self.dimension().map_or(true, |d| d == dimension)
    }

    /// Return the number of vectors currently stored in the index.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.metadata.len()).unwrap_or(0)
    }

    /// Return true if the index contains no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn row_count(&self) -> usize {
        self.inner
            .read()
            .ok()
            .and_then(|i| i.dimension.map(|d| i.data.len() / d))
            .unwrap_or(0)
    }
}

impl<M: Clone> Default for VectorIndex<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale `vector` to unit L2 norm in place. Zero vectors are left untouched.
pub fn normalize_l2(vector: &mut [f32]) {
    // Pre-scale by the largest magnitude so squaring cannot overflow.
    let max = vector.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max == 0.0 || !max.is_finite() {
        return;
    }
    for v in vector.iter_mut() {
        *v /= max;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    for v in vector.iter_mut() {
        *v /= norm;
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
