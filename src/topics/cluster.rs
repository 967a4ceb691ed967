// K-means clustering on the projected (x, y) plane.
//
// Clustering deliberately ignores the full embedding: topics are regions of
// the 2D map, so what the user sees as a blob is what becomes a topic.
//
// linfa-clustering does the seeded k-means++ initialization, Lloyd
// iterations and restarts. The number of clusters asked of it is capped by
// the number of distinct points; if it leaves a cluster empty the cluster is
// refilled with the point farthest from its own centroid, so the result
// always has the maximum feasible number of non-empty clusters.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use linfa::dataset::AsTargets;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans as LinfaKMeans;
use ndarray::Array2;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Document, Topic};

/// K-means parameters.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    /// Number of independent restarts
    pub n_init: usize,
    pub max_iter: u64,
    /// Convergence threshold on centroid movement
    pub tolerance: f64,
    pub seed: u64,
}

/// Result of fitting k-means to a set of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster index per input point, numbered by first appearance
    pub labels: Vec<usize>,
    /// Mean of each cluster's members
    pub centroids: Vec<(f64, f64)>,
    pub inertia: f64,
}

/// How many clusters were asked for versus formed.
///
/// Kept on the pipeline state so callers can tell a degenerate corpus from
/// a normal run without counting topics themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub requested: usize,
    pub produced: usize,
}

impl ClusterSummary {
    pub fn is_degenerate(&self) -> bool {
        self.produced < self.requested
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster `points`. Empty input gives an empty clustering; too few
    /// distinct points give fewer clusters, never an error.
    pub fn fit(&self, points: &[(f64, f64)]) -> Result<Clustering> {
        let distinct = points
            .iter()
            .map(|(x, y)| (x.to_bits(), y.to_bits()))
            .collect::<HashSet<_>>()
            .len();
        let k = self.n_clusters.min(distinct);

        if k == 0 {
            return Ok(Clustering {
                labels: Vec::new(),
                centroids: Vec::new(),
                inertia: 0.0,
            });
        }
        if k < self.n_clusters {
            warn!(
                requested = self.n_clusters,
                feasible = k,
                "Fewer distinct points than requested clusters"
            );
        }

        let mut labels = if k == 1 {
            vec![0; points.len()]
        } else {
            self.lloyd(points, k)?
        };
        let mut centroids = means(points, &labels, &vec![(0.0, 0.0); k]);
        repair_empty(points, &mut labels, &mut centroids);
        Ok(relabel(points, &labels, k))
    }

    /// Labels from linfa's k-means++ / Lloyd fit with `n_init` restarts.
    fn lloyd(&self, points: &[(f64, f64)], k: usize) -> Result<Vec<usize>> {
        let records = Array2::from_shape_fn((points.len(), 2), |(i, j)| {
            if j == 0 {
                points[i].0
            } else {
                points[i].1
            }
        });
        let dataset = DatasetBase::from(records);

        let rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let model = LinfaKMeans::params_with_rng(k, rng)
            .n_runs(self.n_init.max(1))
            .max_n_iterations(self.max_iter.max(1))
            .tolerance(self.tolerance)
            .fit(&dataset)
            .map_err(|e| anyhow::anyhow!("K-means fit failed: {}", e))?;

        let predictions = model.predict(&dataset);
        let labels: Vec<usize> = predictions.as_targets().iter().copied().collect();
        debug!(k, inertia = model.inertia(), "k-means fit finished");
        Ok(labels)
    }
}

/// Member means per cluster; an empty cluster keeps its previous centroid.
fn means(points: &[(f64, f64)], labels: &[usize], previous: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut sums = vec![(0.0, 0.0, 0usize); previous.len()];
    for (&label, &(x, y)) in labels.iter().zip(points) {
        let s = &mut sums[label];
        s.0 += x;
        s.1 += y;
        s.2 += 1;
    }
    sums.iter()
        .zip(previous)
        .map(|(&(sx, sy, n), &prev)| {
            if n == 0 {
                prev
            } else {
                (sx / n as f64, sy / n as f64)
            }
        })
        .collect()
}

/// Refill empty clusters with the point farthest from its centroid, taken
/// from a cluster that can spare it.
fn repair_empty(points: &[(f64, f64)], labels: &mut [usize], centroids: &mut [(f64, f64)]) {
    loop {
        let mut sizes = vec![0usize; centroids.len()];
        for &l in labels.iter() {
            sizes[l] += 1;
        }
        let Some(empty) = sizes.iter().position(|&s| s == 0) else {
            return;
        };

        let donor = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| sizes[l] > 1)
            .max_by(|(i, &li), (j, &lj)| {
                dist2(points[*i], centroids[li])
                    .total_cmp(&dist2(points[*j], centroids[lj]))
                    .then_with(|| j.cmp(i))
            })
            .map(|(i, _)| i);
        let Some(i) = donor else {
            return;
        };

        debug!(cluster = empty, point = i, "Refilling empty cluster");
        labels[i] = empty;
        let refreshed = means(points, labels, centroids);
        centroids.copy_from_slice(&refreshed);
    }
}

/// Renumber clusters by first appearance and recompute centroids.
fn relabel(points: &[(f64, f64)], labels: &[usize], k: usize) -> Clustering {
    let mut mapping: HashMap<usize, usize> = HashMap::with_capacity(k);
    let labels: Vec<usize> = labels
        .iter()
        .map(|&l| {
            let next = mapping.len();
            *mapping.entry(l).or_insert(next)
        })
        .collect();

    let produced = mapping.len();
    let centroids = means(points, &labels, &vec![(0.0, 0.0); produced]);
    let inertia = labels
        .iter()
        .zip(points)
        .map(|(&l, &p)| dist2(p, centroids[l]))
        .sum();

    Clustering {
        labels,
        centroids,
        inertia,
    }
}

fn dist2(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}

/// Cluster documents on their projected coordinates and build one topic per
/// cluster. Clears any earlier topic assignment, rank and relevance.
pub fn cluster_documents(
    mut docs: Vec<Document>,
    kmeans: &KMeans,
) -> Result<(Vec<Document>, Vec<Topic>, ClusterSummary)> {
    let points: Vec<(f64, f64)> = docs.iter().map(|d| (d.x, d.y)).collect();
    let clustering = kmeans.fit(&points)?;

    let mut members: Vec<Vec<String>> = vec![Vec::new(); clustering.centroids.len()];
    for (doc, &label) in docs.iter_mut().zip(&clustering.labels) {
        doc.topic_id = Some(topic_id(label));
        doc.rank = None;
        doc.relevance = None;
        members[label].push(doc.doc_id.clone());
    }

    let topics: Vec<Topic> = members
        .into_iter()
        .zip(&clustering.centroids)
        .enumerate()
        .map(|(label, (ids, &centroid))| Topic::from_cluster(topic_id(label), centroid, ids))
        .collect();

    let summary = ClusterSummary {
        requested: kmeans.n_clusters,
        produced: topics.len(),
    };
    Ok((docs, topics, summary))
}

fn topic_id(label: usize) -> String {
    format!("bt-{label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_obvious_blobs() {
        let points = vec![
            (0.0, 0.0),
            (10.0, 10.0),
            (0.2, 0.1),
            (10.1, 9.9),
            (-0.1, 0.2),
            (9.8, 10.2),
        ];
        let c = KMeans::new(2).fit(&points).unwrap();
        assert_eq!(c.centroids.len(), 2);
        assert_eq!(c.labels, vec![0, 1, 0, 1, 0, 1]);
        assert!(c.centroids[0].0.abs() < 0.5);
        assert!((c.centroids[1].0 - 10.0).abs() < 0.5);
    }

    #[test]
    fn test_fewer_distinct_points_than_clusters() {
        let points = vec![(1.0, 1.0), (1.0, 1.0), (5.0, 5.0), (5.0, 5.0)];
        let c = KMeans::new(4).fit(&points).unwrap();
        assert_eq!(c.centroids.len(), 2);
        assert_eq!(c.labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_empty_input() {
        let c = KMeans::new(3).fit(&[]).unwrap();
        assert!(c.labels.is_empty());
        assert!(c.centroids.is_empty());
    }

    #[test]
    fn test_same_seed_same_result() {
        let points: Vec<(f64, f64)> = (0..40)
            .map(|i| ((i * 7 % 13) as f64, (i * 5 % 11) as f64))
            .collect();
        let a = KMeans::new(4).seed(7).fit(&points).unwrap();
        let b = KMeans::new(4).seed(7).fit(&points).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_repair_fills_empty_cluster() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (5.0, 0.0)];
        let mut labels = vec![0, 0, 0];
        let mut centroids = vec![(2.0, 0.0), (100.0, 0.0)];
        repair_empty(&points, &mut labels, &mut centroids);
        assert_eq!(labels, vec![0, 0, 1]);
        assert_eq!(centroids[1], (5.0, 0.0));
    }

    #[test]
    fn test_cluster_documents_builds_topics() {
        let docs: Vec<Document> = (0..4)
            .map(|i| {
                let mut d = Document::new(format!("d{i}"), "text");
                d.x = if i < 2 { 0.0 } else { 8.0 };
                d.y = d.x;
                d.rank = Some(3);
                d
            })
            .collect();
        let (docs, topics, summary) = cluster_documents(docs, &KMeans::new(2)).unwrap();
        assert_eq!(summary, ClusterSummary { requested: 2, produced: 2 });
        assert_eq!(topics[0].topic_id, "bt-0");
        assert_eq!(topics[0].member_ids, vec!["d0", "d1"]);
        assert_eq!(topics[1].size, 2);
        assert!(docs.iter().all(|d| d.rank.is_none()));
        assert_eq!(docs[3].topic_id.as_deref(), Some("bt-1"));
    }
}
