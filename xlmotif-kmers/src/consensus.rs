//! Consensus labels for kmer clusters.
//!
//! Member kmers are aligned on each of their longest common substrings, every
//! alignment is collapsed into a column consensus, and the consensus best
//! supported by the members becomes the cluster label.
use std::collections::BTreeSet;

use crate::clustering::Cluster;

/// Bases a consensus column can hold, in rendering order.
const BASES: [char; 4] = ['A', 'C', 'G', 'U'];
/// Cell of an alignment matrix not covered by a kmer.
const PLACEHOLDER: char = '0';
/// Target consensus length of the seed extension.
const SEED_TARGET: usize = 5;
const SEED_MAX: usize = 6;
const MAX_EXTENSIONS: usize = 6;

/// One column of a consensus: the bases with the highest count.
type Column = Vec<char>;
type Consensus = Vec<Column>;

/// Every non-empty substring of `s`.
fn substrings(s: &str) -> BTreeSet<&str> {
    (0..s.len())
        .flat_map(|start| (start + 1..=s.len()).map(move |end| &s[start..end]))
        .collect()
}

/// Longest substrings shared by every kmer, in lexicographic order.
pub fn longest_common_substrings(kmers: &[String]) -> Vec<String> {
    let Some((first, rest)) = kmers.split_first() else {
        return vec![];
    };
    let common: Vec<&str> = substrings(first)
        .into_iter()
        .filter(|sub| rest.iter().all(|kmer| kmer.contains(sub)))
        .collect();
    let longest = common.iter().map(|s| s.len()).max().unwrap_or(0);
    common
        .into_iter()
        .filter(|s| s.len() == longest)
        .map(String::from)
        .collect()
}

///
/// Kmers aligned on the first occurrence of `anchor`, furthest occurrence
/// first. Rows are padded with [`PLACEHOLDER`] to a common length.
///
pub fn alignment_matrix(anchor: &str, kmers: &[String]) -> Vec<Vec<char>> {
    let mut indexed: Vec<(&String, usize)> = kmers
        .iter()
        .filter_map(|kmer| kmer.find(anchor).map(|idx| (kmer, idx)))
        .collect();
    indexed.sort_by(|a, b| b.1.cmp(&a.1));
    let Some(first) = indexed.first().map(|(_, idx)| *idx) else {
        return vec![];
    };

    let mut rows: Vec<Vec<char>> = indexed
        .iter()
        .map(|(kmer, idx)| {
            std::iter::repeat_n(PLACEHOLDER, first - idx)
                .chain(kmer.chars())
                .collect()
        })
        .collect();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, PLACEHOLDER);
    }
    rows
}

///
/// Column consensus of an alignment. The consensus starts from the span of
/// the best supported columns and grows towards the better supported
/// neighbour until it reaches [`SEED_TARGET`] columns.
///
pub fn column_consensus(matrix: &[Vec<char>]) -> Consensus {
    let width = matrix.first().map_or(0, Vec::len);
    if width == 0 {
        return vec![];
    }

    let mut counts = vec![[0usize; 4]; width];
    for row in matrix {
        for (pos, base) in row.iter().enumerate() {
            if let Some(b) = BASES.iter().position(|x| x == base) {
                counts[pos][b] += 1;
            }
        }
    }
    let support: Vec<usize> = counts
        .iter()
        .map(|c| c.iter().copied().max().unwrap_or(0))
        .collect();
    let columns: Vec<Column> = counts
        .iter()
        .zip(&support)
        .map(|(c, max)| {
            BASES
                .iter()
                .zip(c)
                .filter(|(_, n)| *n == max)
                .map(|(base, _)| *base)
                .collect()
        })
        .collect();

    let best = support.iter().copied().max().unwrap_or(0);
    let best_cols: Vec<usize> = (0..width).filter(|pos| support[*pos] == best).collect();
    let (lo, hi) = match (best_cols.first(), best_cols.last()) {
        (Some(lo), Some(hi)) => (*lo as i64, *hi as i64),
        _ => return vec![],
    };
    let mut seed: Vec<i64> = (lo..=hi).take(SEED_MAX).collect();

    let at = |pos: i64| -> usize {
        if pos < 0 {
            0
        } else {
            support.get(pos as usize).copied().unwrap_or(0)
        }
    };
    for _ in 0..MAX_EXTENSIONS {
        if seed.len() >= SEED_TARGET {
            break;
        }
        let (left, right) = (seed[0] - 1, seed[seed.len() - 1] + 1);
        match at(left).cmp(&at(right)) {
            std::cmp::Ordering::Greater => seed.insert(0, left),
            std::cmp::Ordering::Less => seed.push(right),
            std::cmp::Ordering::Equal if at(left) >= 2 => {
                seed.insert(0, left);
                seed.push(right);
            }
            std::cmp::Ordering::Equal => {}
        }
    }

    seed.into_iter()
        .map(|pos| {
            usize::try_from(pos)
                .ok()
                .and_then(|p| columns.get(p).cloned())
                .unwrap_or_default()
        })
        .collect()
}

/// Number of (expansion, kmer) pairs where the expansion occurs in the kmer.
fn support_score(consensus: &Consensus, kmers: &[String]) -> usize {
    if consensus.iter().any(Vec::is_empty) {
        return 0;
    }
    let mut expansions = vec![String::new()];
    for column in consensus {
        expansions = expansions
            .iter()
            .flat_map(|prefix| column.iter().map(move |base| format!("{}{}", prefix, base)))
            .collect();
    }
    expansions
        .iter()
        .map(|e| kmers.iter().filter(|kmer| kmer.contains(e.as_str())).count())
        .sum()
}

/// Trimmed variants of a consensus, in the order they are tried.
fn trimmed_variants(consensus: &Consensus) -> Vec<Consensus> {
    let n = consensus.len();
    let slice = |from: usize, to: usize| -> Consensus {
        if from >= to.min(n) {
            vec![]
        } else {
            consensus[from..to.min(n)].to_vec()
        }
    };
    vec![
        consensus.clone(),
        slice(1, n),
        slice(0, n.saturating_sub(1)),
        slice(1, n.saturating_sub(1)),
        slice(2, n),
        slice(0, n.saturating_sub(2)),
    ]
}

/// First base of every column.
fn flatten(consensus: &Consensus) -> String {
    consensus.iter().filter_map(|c| c.first()).collect()
}

///
/// Pick the consensus whose expansions occur most often in the kmers. Ties
/// are broken by the first trimmed variant of a tied consensus that occurs
/// in any kmer; `None` when nothing matches.
///
fn choose_best(consensuses: Vec<Consensus>, kmers: &[String]) -> Option<Consensus> {
    if consensuses.len() == 1 {
        return consensuses.into_iter().next();
    }
    let scores: Vec<usize> = consensuses.iter().map(|c| support_score(c, kmers)).collect();
    let top = scores.iter().copied().max().unwrap_or(0);
    let tied: Vec<Consensus> = consensuses
        .into_iter()
        .zip(&scores)
        .filter(|(_, score)| **score == top)
        .map(|(c, _)| c)
        .collect();
    if tied.len() == 1 {
        return tied.into_iter().next();
    }

    tied.iter()
        .flat_map(trimmed_variants)
        .find(|variant| {
            let flat = flatten(variant);
            kmers.iter().any(|kmer| kmer.contains(flat.as_str()))
        })
}

/// `[AC]` for ambiguous columns, `N` when all four bases are tied.
fn render(consensus: &Consensus) -> String {
    consensus
        .iter()
        .map(|column| match column.len() {
            1 => column[0].to_string(),
            4 => "N".to_string(),
            _ => format!("[{}]", column.iter().collect::<String>()),
        })
        .collect()
}

///
/// Label of a cluster with members `kmers`. A single kmer labels itself;
/// the first kmer is used whenever no consensus of at least two positions
/// can be derived.
///
pub fn cluster_label(kmers: &[String]) -> String {
    let fallback = kmers.first().cloned().unwrap_or_default();
    if kmers.len() < 2 {
        return fallback;
    }

    let anchors = longest_common_substrings(kmers);
    if anchors.is_empty() {
        return fallback;
    }
    let consensuses: Vec<Consensus> = anchors
        .iter()
        .map(|anchor| column_consensus(&alignment_matrix(anchor, kmers)))
        .collect();

    match choose_best(consensuses, kmers) {
        Some(consensus) if consensus.len() > 1 => render(&consensus),
        _ => fallback,
    }
}

///
/// Sets the label of every cluster. A label already taken by an earlier
/// cluster gets `_1` appended until it is unique.
///
pub fn name_clusters(clusters: &mut [Cluster]) {
    let mut taken: Vec<String> = Vec::with_capacity(clusters.len());
    for cluster in clusters.iter_mut() {
        let mut label = cluster_label(&cluster.members);
        while taken.contains(&label) {
            label.push_str("_1");
        }
        taken.push(label.clone());
        cluster.label = label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn kmers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn cluster(id: usize, members: &[&str]) -> Cluster {
        Cluster {
            id: format!("cluster{}", id),
            members: kmers(members),
            rank: id + 1,
            label: String::new(),
        }
    }

    #[rstest]
    fn test_longest_common_substrings() {
        assert_eq!(
            longest_common_substrings(&kmers(&["AACC", "CCAA"])),
            vec!["AA", "CC"]
        );
        assert!(longest_common_substrings(&kmers(&["AAA", "CCC"])).is_empty());
    }

    #[rstest]
    fn test_alignment_matrix_pads_both_sides() {
        let matrix = alignment_matrix("UGC", &kmers(&["UGCA", "AUGC"]));
        let rows: Vec<String> = matrix.iter().map(|r| r.iter().collect()).collect();
        assert_eq!(rows, vec!["AUGC0", "0UGCA"]);
    }

    #[rstest]
    fn test_column_consensus_extends_towards_support() {
        let matrix = alignment_matrix("AA", &kmers(&["GAAA", "GCAA", "GGAA", "GUAA"]));
        let consensus = column_consensus(&matrix);
        assert_eq!(render(&consensus), "GGAAA");
    }

    #[rstest]
    #[case(&["ACGU"], "ACGU")]
    #[case(&["AAA", "CCC"], "AAA")]
    #[case(&["AUGC", "UGCA"], "UGC")]
    #[case(&["AAGG", "ACGG"], "A[AC]GG")]
    #[case(&["AAGG", "CAGG", "GAGG", "UAGG"], "NAGG")]
    #[case(&["AACC", "CCAA"], "AA")]
    #[case(&["AC", "CA"], "AC")]
    fn test_cluster_label(#[case] members: &[&str], #[case] expected: &str) {
        assert_eq!(cluster_label(&kmers(members)), expected);
    }

    #[rstest]
    fn test_duplicate_labels_get_suffix() {
        let mut clusters = vec![
            cluster(0, &["AUGC", "UGCA"]),
            cluster(1, &["GUGC", "UGCG"]),
            cluster(2, &["CUGC", "UGCC"]),
            cluster(3, &["GGGG"]),
        ];
        name_clusters(&mut clusters);
        let labels: Vec<&str> = clusters.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["UGC", "UGC_1", "UGC_1_1", "GGGG"]);
    }

    #[rstest]
    fn test_trimmed_variants_order() {
        let consensus: Consensus = "ACGUA".chars().map(|c| vec![c]).collect();
        let flat: Vec<String> = trimmed_variants(&consensus).iter().map(flatten).collect();
        assert_eq!(flat, vec!["ACGUA", "CGUA", "ACGU", "CGU", "GUA", "ACG"]);
    }
}
