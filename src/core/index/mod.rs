//! # Similarity Index Module
//!
//! Groups near-duplicate images by fingerprint distance.
//!
//! ## Strategies
//! - **Representative** (default): each incoming fingerprint is compared
//!   against the first member of every existing cluster and joins the first
//!   cluster within threshold, otherwise it starts a new one. Amortized
//!   near-linear, at the cost of non-transitive chains: if A~B and B~C but
//!   A!~C, C lands wherever its representative comparison says. This is an
//!   accepted approximation, not a bug to fix.
//! - **Exhaustive**: all-pairs comparison plus union-find, producing fully
//!   transitive groups. Quadratic, intended for small batches.
//!
//! Insertion is single-writer. Callers sort each batch (size descending,
//! then path ascending) before inserting so the grouping and keeper choice
//! are deterministic regardless of hash completion order.

use crate::core::hasher::Fingerprint;
use crate::core::scanner::MediaFile;
use serde::Serialize;
use uuid::Uuid;

/// Similarity threshold bounds (Hamming distance on a 64-bit fingerprint)
pub const MIN_THRESHOLD: u32 = 1;
pub const MAX_THRESHOLD: u32 = 20;
pub const DEFAULT_THRESHOLD: u32 = 10;

/// How the index turns pairwise distances into groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingStrategy {
    /// Compare against each cluster's first member only
    #[default]
    Representative,
    /// All-pairs comparison with transitive closure
    Exhaustive,
}

/// A file together with its computed fingerprint
#[derive(Debug, Clone)]
pub struct HashedFile {
    pub file: MediaFile,
    pub fingerprint: Fingerprint,
}

/// A group of near-duplicate images: one keeper, the rest redundant
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    /// Stable identifier for this group within one run
    pub id: Uuid,
    /// The member selected to keep
    pub keeper: MediaFile,
    /// Remaining members, candidates for relocation
    pub redundant: Vec<MediaFile>,
}

impl DuplicateGroup {
    /// Build a group from its members, selecting the keeper.
    ///
    /// Keeper tie-break: larger file size wins; equal sizes fall back to
    /// the lexicographically smaller path.
    fn from_members(mut members: Vec<MediaFile>) -> Self {
        members.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        let keeper = members.remove(0);

        Self {
            id: Uuid::new_v4(),
            keeper,
            redundant: members,
        }
    }

    /// Total number of members including the keeper
    pub fn len(&self) -> usize {
        self.redundant.len() + 1
    }

    /// Whether the group has no redundant members (never true for a
    /// group produced by the index)
    pub fn is_empty(&self) -> bool {
        self.redundant.is_empty()
    }

    /// Directory name used when relocating this group's redundant members
    pub fn folder_name(&self) -> String {
        let id = self.id.simple().to_string();
        format!("group_{}", &id[..8])
    }
}

/// Result of draining the index: duplicate groups plus singletons
#[derive(Debug, Default)]
pub struct GroupingOutcome {
    /// Clusters with two or more members
    pub groups: Vec<DuplicateGroup>,
    /// Images that matched nothing
    pub uniques: Vec<MediaFile>,
}

impl GroupingOutcome {
    /// Total count of redundant (non-keeper) members across all groups
    pub fn redundant_count(&self) -> usize {
        self.groups.iter().map(|g| g.redundant.len()).sum()
    }
}

/// Index of fingerprinted images, clustered incrementally or at drain time
pub struct SimilarityIndex {
    threshold: u32,
    strategy: GroupingStrategy,
    /// Representative strategy: live clusters, first member is the
    /// representative. Exhaustive strategy: a single flat backlog.
    clusters: Vec<Vec<HashedFile>>,
}

impl SimilarityIndex {
    /// Create an index with the given threshold and strategy.
    ///
    /// The threshold is expected to be pre-validated (1..=20); the index
    /// itself accepts any positive value.
    pub fn new(threshold: u32, strategy: GroupingStrategy) -> Self {
        Self {
            threshold,
            strategy,
            clusters: Vec::new(),
        }
    }

    /// Insert one fingerprinted file. Single-writer: the engine serializes
    /// calls after each parallel batch completes.
    pub fn insert(&mut self, entry: HashedFile) {
        match self.strategy {
            GroupingStrategy::Representative => self.insert_representative(entry),
            GroupingStrategy::Exhaustive => {
                // Grouping is deferred to drain time
                match self.clusters.first_mut() {
                    Some(backlog) => backlog.push(entry),
                    None => self.clusters.push(vec![entry]),
                }
            }
        }
    }

    fn insert_representative(&mut self, entry: HashedFile) {
        for cluster in &mut self.clusters {
            let representative = &cluster[0].fingerprint;
            if representative.distance(&entry.fingerprint) <= self.threshold {
                cluster.push(entry);
                return;
            }
        }
        self.clusters.push(vec![entry]);
    }

    /// Number of entries inserted so far
    pub fn len(&self) -> usize {
        self.clusters.iter().map(|c| c.len()).sum()
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Drain the index into duplicate groups and singletons.
    pub fn into_groups(self) -> GroupingOutcome {
        let clusters = match self.strategy {
            GroupingStrategy::Representative => self.clusters,
            GroupingStrategy::Exhaustive => {
                let backlog = self.clusters.into_iter().flatten().collect::<Vec<_>>();
                Self::cluster_exhaustive(backlog, self.threshold)
            }
        };

        let mut outcome = GroupingOutcome::default();

        for cluster in clusters {
            if cluster.len() >= 2 {
                let members = cluster.into_iter().map(|e| e.file).collect();
                outcome.groups.push(DuplicateGroup::from_members(members));
            } else if let Some(entry) = cluster.into_iter().next() {
                outcome.uniques.push(entry.file);
            }
        }

        outcome
    }

    /// All-pairs matching with union-find transitive closure.
    fn cluster_exhaustive(entries: Vec<HashedFile>, threshold: u32) -> Vec<Vec<HashedFile>> {
        let n = entries.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if entries[i].fingerprint.distance(&entries[j].fingerprint) <= threshold {
                    let root_i = find(&mut parent, i);
                    let root_j = find(&mut parent, j);
                    if root_i != root_j {
                        parent[root_i] = root_j;
                    }
                }
            }
        }

        let mut by_root: std::collections::HashMap<usize, Vec<HashedFile>> =
            std::collections::HashMap::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let root = find(&mut parent, i);
            by_root.entry(root).or_default().push(entry);
        }

        // Deterministic cluster order: by the smallest path inside each cluster
        let mut clusters: Vec<Vec<HashedFile>> = by_root.into_values().collect();
        for cluster in &mut clusters {
            cluster.sort_by(|a, b| {
                b.file
                    .size
                    .cmp(&a.file.size)
                    .then_with(|| a.file.path.cmp(&b.file.path))
            });
        }
        clusters.sort_by(|a, b| a[0].file.path.cmp(&b[0].file.path));

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::MediaKind;
    use crate::core::hasher::HashAlgorithmKind;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn media(path: &str, size: u64) -> MediaFile {
        MediaFile {
            path: PathBuf::from(path),
            size,
            modified: SystemTime::UNIX_EPOCH,
            kind: MediaKind::Image,
        }
    }

    fn hashed(path: &str, size: u64, bytes: &[u8]) -> HashedFile {
        HashedFile {
            file: media(path, size),
            fingerprint: Fingerprint::new(bytes.to_vec(), HashAlgorithmKind::Average),
        }
    }

    #[test]
    fn identical_fingerprints_share_a_group() {
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        index.insert(hashed("/a.jpg", 100, &[0xAB; 8]));
        index.insert(hashed("/b.jpg", 100, &[0xAB; 8]));

        let outcome = index.into_groups();

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].len(), 2);
        assert!(outcome.uniques.is_empty());
    }

    #[test]
    fn distant_fingerprints_stay_unique() {
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        index.insert(hashed("/a.jpg", 100, &[0x00; 8]));
        index.insert(hashed("/b.jpg", 100, &[0xFF; 8]));

        let outcome = index.into_groups();

        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.uniques.len(), 2);
    }

    #[test]
    fn keeper_prefers_larger_file() {
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        index.insert(hashed("/small.jpg", 100, &[0xAB; 8]));
        index.insert(hashed("/large.jpg", 200, &[0xAB; 8]));

        let outcome = index.into_groups();

        assert_eq!(outcome.groups[0].keeper.path, PathBuf::from("/large.jpg"));
    }

    #[test]
    fn keeper_tie_breaks_on_smaller_path() {
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        index.insert(hashed("/zebra.jpg", 100, &[0xAB; 8]));
        index.insert(hashed("/apple.jpg", 100, &[0xAB; 8]));

        let outcome = index.into_groups();

        assert_eq!(outcome.groups[0].keeper.path, PathBuf::from("/apple.jpg"));
    }

    #[test]
    fn representative_chain_joins_by_first_member() {
        // B is within 10 of A, C is within 10 of A but would be 16 from B.
        // Representative comparison is against A only, so all three join.
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        index.insert(hashed("/a.jpg", 100, &[0x00; 8]));
        index.insert(hashed("/b.jpg", 100, &[0xFF, 0, 0, 0, 0, 0, 0, 0]));
        index.insert(hashed("/c.jpg", 100, &[0, 0xFF, 0, 0, 0, 0, 0, 0]));

        let outcome = index.into_groups();

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].len(), 3);
    }

    #[test]
    fn exhaustive_builds_transitive_groups() {
        // A~B (8 bits) and B~C (8 bits) but A vs C is 16 bits apart.
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Exhaustive);
        index.insert(hashed("/a.jpg", 100, &[0x00; 8]));
        index.insert(hashed("/b.jpg", 100, &[0xFF, 0, 0, 0, 0, 0, 0, 0]));
        index.insert(hashed("/c.jpg", 100, &[0xFF, 0xFF, 0, 0, 0, 0, 0, 0]));

        let outcome = index.into_groups();

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].len(), 3);
    }

    #[test]
    fn threshold_monotonicity() {
        let entries = vec![
            hashed("/a.jpg", 100, &[0x00; 8]),
            hashed("/b.jpg", 100, &[0x0F, 0, 0, 0, 0, 0, 0, 0]),
            hashed("/c.jpg", 100, &[0xFF, 0xFF, 0, 0, 0, 0, 0, 0]),
        ];

        let mut grouped_per_threshold = Vec::new();
        for threshold in [2, 5, 20] {
            let mut index = SimilarityIndex::new(threshold, GroupingStrategy::Representative);
            for entry in entries.clone() {
                index.insert(entry);
            }
            let outcome = index.into_groups();
            let grouped: usize = outcome.groups.iter().map(|g| g.len()).sum();
            grouped_per_threshold.push(grouped);
        }

        assert!(grouped_per_threshold.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn redundant_count_sums_non_keepers() {
        let mut index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        index.insert(hashed("/a.jpg", 100, &[0xAB; 8]));
        index.insert(hashed("/b.jpg", 100, &[0xAB; 8]));
        index.insert(hashed("/c.jpg", 100, &[0xAB; 8]));
        index.insert(hashed("/solo.jpg", 100, &[0x54; 8]));

        let outcome = index.into_groups();

        assert_eq!(outcome.redundant_count(), 2);
        assert_eq!(outcome.uniques.len(), 1);
    }

    #[test]
    fn folder_name_uses_group_id_prefix() {
        let group = DuplicateGroup::from_members(vec![media("/a.jpg", 1), media("/b.jpg", 1)]);
        let name = group.folder_name();

        assert!(name.starts_with("group_"));
        assert_eq!(name.len(), "group_".len() + 8);
    }

    #[test]
    fn empty_index_drains_to_nothing() {
        let index = SimilarityIndex::new(10, GroupingStrategy::Representative);
        let outcome = index.into_groups();

        assert!(outcome.groups.is_empty());
        assert!(outcome.uniques.is_empty());
    }
}
