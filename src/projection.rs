// 2D projection of embeddings.
//
// The map only needs a stable 2D layout, so the default projector is plain
// PCA: the two leading principal components found by power iteration on the
// centered data, never materializing the covariance matrix. Anything that
// maps vectors to points (UMAP output loaded from disk, a test fixture) can
// stand in through the Projector trait.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Trait for reducing embeddings to 2D coordinates.
pub trait Projector: Send + Sync {
    /// One (x, y) per input vector, in input order.
    fn project(&self, embeddings: &[Vec<f32>]) -> Result<Vec<(f64, f64)>>;
}

/// Principal component projector.
#[derive(Debug, Clone)]
pub struct PcaProjector {
    pub iterations: usize,
    pub seed: u64,
}

impl Default for PcaProjector {
    fn default() -> Self {
        Self {
            iterations: 100,
            seed: 42,
        }
    }
}

impl Projector for PcaProjector {
    fn project(&self, embeddings: &[Vec<f32>]) -> Result<Vec<(f64, f64)>> {
        let Some(first) = embeddings.first() else {
            return Ok(Vec::new());
        };
        let dim = first.len();
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dim) {
            anyhow::bail!(
                "Embedding {} has {} dimensions, expected {}",
                bad,
                embeddings[bad].len(),
                dim
            );
        }

        let n = embeddings.len() as f64;
        let mut mean = vec![0.0f64; dim];
        for e in embeddings {
            for (m, &v) in mean.iter_mut().zip(e) {
                *m += v as f64;
            }
        }
        for m in &mut mean {
            *m /= n;
        }
        let centered: Vec<Vec<f64>> = embeddings
            .iter()
            .map(|e| e.iter().zip(&mean).map(|(&v, m)| v as f64 - m).collect())
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let pc1 = self.component(&centered, dim, &[], &mut rng);
        let pc2 = self.component(&centered, dim, std::slice::from_ref(&pc1), &mut rng);

        debug!(points = embeddings.len(), dim, "Projected embeddings with PCA");

        Ok(centered
            .iter()
            .map(|row| (dot(row, &pc1), dot(row, &pc2)))
            .collect())
    }
}

impl PcaProjector {
    /// Leading principal direction orthogonal to `previous`.
    /// Returns a zero vector when no variance is left.
    fn component(
        &self,
        data: &[Vec<f64>],
        dim: usize,
        previous: &[Vec<f64>],
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let mut v: Vec<f64> = (0..dim).map(|_| rng.random::<f64>() - 0.5).collect();
        orthogonalize(&mut v, previous);
        if !normalize(&mut v) {
            return vec![0.0; dim];
        }

        for _ in 0..self.iterations {
            // v <- X^T (X v)
            let scores: Vec<f64> = data.iter().map(|row| dot(row, &v)).collect();
            let mut next = vec![0.0; dim];
            for (row, s) in data.iter().zip(&scores) {
                for (n, r) in next.iter_mut().zip(row) {
                    *n += r * s;
                }
            }
            orthogonalize(&mut next, previous);
            if !normalize(&mut next) {
                return vec![0.0; dim];
            }
            let converged = dot(&next, &v).abs() > 1.0 - 1e-12;
            v = next;
            if converged {
                break;
            }
        }

        // Fix the sign: largest-magnitude coordinate positive
        if let Some(max) = v.iter().copied().max_by(|a, b| a.abs().total_cmp(&b.abs())) {
            if max < 0.0 {
                v.iter_mut().for_each(|x| *x = -*x);
            }
        }
        v
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let proj = dot(v, b);
        for (x, y) in v.iter_mut().zip(b) {
            *x -= proj * y;
        }
    }
}

/// Normalize in place; false if the vector is (numerically) zero.
fn normalize(v: &mut [f64]) -> bool {
    let norm = dot(v, v).sqrt();
    if norm < 1e-12 {
        return false;
    }
    v.iter_mut().for_each(|x| *x /= norm);
    true
}
