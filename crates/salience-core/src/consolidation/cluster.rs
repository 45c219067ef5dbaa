//! Greedy tag-overlap clustering
//!
//! Clusters are plain values; every step takes clusters in and hands new
//! clusters back, so a clustering pass has no hidden state.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::ConsolidationConfig;

/// A group of candidate notes that share topic tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Union of the members' tags
    pub tags: BTreeSet<String>,
    /// Candidate indexes, in assignment order
    pub members: Vec<usize>,
}

impl Cluster {
    /// A singleton cluster
    pub fn seed(member: usize, tags: &BTreeSet<String>) -> Self {
        Self {
            tags: tags.clone(),
            members: vec![member],
        }
    }

    /// Tags shared with `tags`
    pub fn overlap(&self, tags: &BTreeSet<String>) -> usize {
        self.tags.intersection(tags).count()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// This cluster with `member` added
    pub fn with_member(mut self, member: usize, tags: &BTreeSet<String>) -> Self {
        self.members.push(member);
        self.tags.extend(tags.iter().cloned());
        self
    }
}

/// Index of the open cluster with the highest overlap that can take another
/// member. Earlier clusters win ties.
pub fn best_fit(
    clusters: &[Cluster],
    tags: &BTreeSet<String>,
    config: &ConsolidationConfig,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, cluster) in clusters.iter().enumerate() {
        if cluster.len() >= config.max_cluster_size {
            continue;
        }
        let overlap = cluster.overlap(tags);
        if overlap < config.min_overlap {
            continue;
        }
        if best.is_none_or(|(_, b)| overlap > b) {
            best = Some((i, overlap));
        }
    }
    best.map(|(i, _)| i)
}

/// Place one candidate: join the best-fitting cluster or start a new one
pub fn assign(
    mut clusters: Vec<Cluster>,
    member: usize,
    tags: &BTreeSet<String>,
    config: &ConsolidationConfig,
) -> Vec<Cluster> {
    match best_fit(&clusters, tags, config) {
        Some(i) => {
            let cluster = clusters.remove(i);
            clusters.insert(i, cluster.with_member(member, tags));
        }
        None => clusters.push(Cluster::seed(member, tags)),
    }
    clusters
}

/// Cluster candidates in the given order, dropping clusters below the minimum size
pub fn build_clusters(tag_sets: &[BTreeSet<String>], config: &ConsolidationConfig) -> Vec<Cluster> {
    tag_sets
        .iter()
        .enumerate()
        .fold(Vec::new(), |clusters, (i, tags)| {
            assign(clusters, i, tags, config)
        })
        .into_iter()
        .filter(|c| c.len() >= config.min_cluster_size)
        .collect()
}
