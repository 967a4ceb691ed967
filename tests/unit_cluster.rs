// Unit tests for k-means clustering on the projected plane.
//
// Tests KMeans::fit and cluster_documents: topic count bounds, degenerate
// inputs, seeding determinism, centroid correctness and topic id assignment.

use std::collections::HashSet;

use topicmap::models::Document;
use topicmap::topics::cluster::{cluster_documents, KMeans};

fn doc_at(id: &str, x: f64, y: f64) -> Document {
    let mut d = Document::new(id, format!("text {id}"));
    d.x = x;
    d.y = y;
    d
}

/// Three loose blobs of 6 points each.
fn three_blobs() -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for (cx, cy) in [(0.0, 0.0), (20.0, 0.0), (10.0, 15.0)] {
        for i in 0..6 {
            let angle = i as f64;
            points.push((cx + angle.cos(), cy + angle.sin()));
        }
    }
    points
}

// ============================================================
// KMeans::fit: topic count bounds
// ============================================================

#[test]
fn never_more_clusters_than_requested() {
    let points = three_blobs();
    for k in 1..=6 {
        let c = KMeans::new(k).fit(&points).unwrap();
        assert!(c.centroids.len() <= k);
        assert_eq!(c.labels.len(), points.len());
        assert!(c.labels.iter().all(|&l| l < c.centroids.len()));
    }
}

#[test]
fn every_cluster_is_non_empty() {
    let points = three_blobs();
    let c = KMeans::new(5).fit(&points).unwrap();
    assert_eq!(c.centroids.len(), 5);
    let used: HashSet<usize> = c.labels.iter().copied().collect();
    assert_eq!(used.len(), 5);
}

#[test]
fn three_blobs_recovered() {
    let points = three_blobs();
    let c = KMeans::new(3).fit(&points).unwrap();
    for blob in 0..3 {
        let labels: HashSet<usize> = c.labels[blob * 6..(blob + 1) * 6].iter().copied().collect();
        assert_eq!(labels.len(), 1, "blob {blob} was split");
    }
    let distinct: HashSet<usize> = c.labels.iter().copied().collect();
    assert_eq!(distinct.len(), 3);
}

// ============================================================
// KMeans::fit: degenerate inputs
// ============================================================

#[test]
fn fewer_distinct_points_than_clusters() {
    let points = vec![(1.0, 1.0), (1.0, 1.0), (5.0, 5.0), (5.0, 5.0), (5.0, 5.0)];
    let c = KMeans::new(4).fit(&points).unwrap();
    assert_eq!(c.centroids.len(), 2);
    assert_eq!(c.labels, vec![0, 0, 1, 1, 1]);
}

#[test]
fn all_points_identical() {
    let c = KMeans::new(3).fit(&[(2.0, 2.0); 4]).unwrap();
    assert_eq!(c.centroids, vec![(2.0, 2.0)]);
    assert!(c.labels.iter().all(|&l| l == 0));
}

#[test]
fn empty_input() {
    let c = KMeans::new(3).fit(&[]).unwrap();
    assert!(c.labels.is_empty());
    assert!(c.centroids.is_empty());
}

#[test]
fn single_point() {
    let c = KMeans::new(2).fit(&[(3.0, -1.0)]).unwrap();
    assert_eq!(c.labels, vec![0]);
    assert_eq!(c.centroids, vec![(3.0, -1.0)]);
}

// ============================================================
// KMeans::fit: determinism and centroids
// ============================================================

#[test]
fn same_seed_same_result() {
    let points = three_blobs();
    let a = KMeans::new(4).seed(7).fit(&points).unwrap();
    let b = KMeans::new(4).seed(7).fit(&points).unwrap();
    assert_eq!(a, b);
}

#[test]
fn centroids_are_member_means() {
    let points = three_blobs();
    let c = KMeans::new(3).fit(&points).unwrap();
    for (label, &(cx, cy)) in c.centroids.iter().enumerate() {
        let members: Vec<&(f64, f64)> = points
            .iter()
            .zip(&c.labels)
            .filter(|(_, &l)| l == label)
            .map(|(p, _)| p)
            .collect();
        let n = members.len() as f64;
        let mx = members.iter().map(|p| p.0).sum::<f64>() / n;
        let my = members.iter().map(|p| p.1).sum::<f64>() / n;
        assert!((cx - mx).abs() < 1e-9 && (cy - my).abs() < 1e-9);
    }
}

#[test]
fn labels_numbered_by_first_appearance() {
    let c = KMeans::new(3).fit(&three_blobs()).unwrap();
    assert_eq!(c.labels[0], 0);
    let mut next = 0;
    for &l in &c.labels {
        assert!(l <= next);
        if l == next {
            next += 1;
        }
    }
}

// ============================================================
// cluster_documents: topics and summary
// ============================================================

#[test]
fn sizes_sum_to_document_count() {
    let docs: Vec<Document> = three_blobs()
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| doc_at(&format!("d{i}"), x, y))
        .collect();
    let (docs, topics, summary) = cluster_documents(docs, &KMeans::new(3)).unwrap();

    assert_eq!(summary.requested, 3);
    assert_eq!(summary.produced, 3);
    assert!(!summary.is_degenerate());
    assert_eq!(topics.iter().map(|t| t.size).sum::<usize>(), docs.len());

    let ids: HashSet<&str> = topics.iter().map(|t| t.topic_id.as_str()).collect();
    assert_eq!(ids, HashSet::from(["bt-0", "bt-1", "bt-2"]));
    for doc in &docs {
        let topic_id = doc.topic_id.as_deref().unwrap();
        let topic = topics.iter().find(|t| t.topic_id == topic_id).unwrap();
        assert!(topic.member_ids.contains(&doc.doc_id));
    }
}

#[test]
fn degenerate_corpus_reported_in_summary() {
    let docs = vec![doc_at("a", 0.0, 0.0), doc_at("b", 0.0, 0.0)];
    let (_, topics, summary) = cluster_documents(docs, &KMeans::new(5)).unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(summary.requested, 5);
    assert_eq!(summary.produced, 1);
    assert!(summary.is_degenerate());
}

#[test]
fn reclustering_clears_previous_ranks() {
    let mut d = doc_at("a", 0.0, 0.0);
    d.rank = Some(4);
    d.relevance = Some(2.0);
    let (docs, _, _) = cluster_documents(vec![d], &KMeans::new(1)).unwrap();
    assert_eq!(docs[0].rank, None);
    assert_eq!(docs[0].relevance, None);
}
