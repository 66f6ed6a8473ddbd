use std::collections::HashMap;

use serde::Serialize;

use presswheel_common::{cosine_similarity, RecentArtifact};

/// Disjoint-set union with path compression and union by rank.
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Returns false if `a` and `b` were already in the same set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// A set of near-duplicate artifacts. The earliest-created one is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub keep_id: String,
    pub unpublish_ids: Vec<String>,
    /// Highest pairwise similarity seen inside the group. Reporting only.
    pub max_similarity: f64,
}

/// Pick the keeper for one group: earliest `created_at`, ties broken by id.
/// Everyone else is flagged for unpublish, in creation order.
pub fn designate_keeper(members: &[&RecentArtifact], max_similarity: f64) -> Option<DuplicateGroup> {
    let mut ordered: Vec<&RecentArtifact> = members.to_vec();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let (keep, rest) = ordered.split_first()?;
    Some(DuplicateGroup {
        keep_id: keep.id.clone(),
        unpublish_ids: rest.iter().map(|a| a.id.clone()).collect(),
        max_similarity,
    })
}

/// All-pairs cosine sweep. Pairs at or above `threshold` are unioned; every
/// resulting set with more than one member becomes a `DuplicateGroup`.
///
/// O(n²): callers bound `artifacts` to a recent window. Artifacts without an
/// embedding never join a group.
pub fn group_duplicates(artifacts: &[RecentArtifact], threshold: f64) -> Vec<DuplicateGroup> {
    let n = artifacts.len();
    let mut uf = UnionFind::new(n);
    let mut pair_max: Vec<(usize, usize, f64)> = Vec::new();

    for i in 0..n {
        let Some(a) = artifacts[i].embedding.as_deref() else {
            continue;
        };
        for j in (i + 1)..n {
            let Some(b) = artifacts[j].embedding.as_deref() else {
                continue;
            };
            let sim = cosine_similarity(a, b);
            if sim >= threshold {
                uf.union(i, j);
                pair_max.push((i, j, sim));
            }
        }
    }

    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..n {
        let root = uf.find(i);
        members.entry(root).or_default().push(i);
    }

    let mut max_by_root: HashMap<usize, f64> = HashMap::new();
    for (i, _, sim) in pair_max {
        let root = uf.find(i);
        let entry = max_by_root.entry(root).or_insert(sim);
        if sim > *entry {
            *entry = sim;
        }
    }

    let mut groups: Vec<DuplicateGroup> = members
        .into_iter()
        .filter(|(_, idx)| idx.len() > 1)
        .filter_map(|(root, idx)| {
            let group: Vec<&RecentArtifact> = idx.iter().map(|&i| &artifacts[i]).collect();
            designate_keeper(&group, max_by_root.get(&root).copied().unwrap_or(0.0))
        })
        .collect();

    // Deterministic output: by keeper creation time, then id.
    let created: HashMap<&str, _> = artifacts
        .iter()
        .map(|a| (a.id.as_str(), a.created_at))
        .collect();
    groups.sort_by(|a, b| {
        created
            .get(a.keep_id.as_str())
            .cmp(&created.get(b.keep_id.as_str()))
            .then_with(|| a.keep_id.cmp(&b.keep_id))
    });
    groups
}
