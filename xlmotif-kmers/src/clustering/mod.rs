//! Clustering of the most enriched kmers by the shape of their positional
//! distribution.
pub mod kmeans;
pub mod pca;
pub mod smoothing;

use std::ops::RangeInclusive;

use ndarray::Array2;

use crate::enrichment::EnrichmentTable;

use self::kmeans::{KMEANS_MAX_ITERATIONS, KMEANS_RESTARTS, KMEANS_SEED, kmeans};
use self::pca::pca_scores;
use self::smoothing::{centred_mean, smooth_triangular};

/// Positions of the occurrence curves reported and clustered on.
pub const REPORTED_POSITIONS: RangeInclusive<i32> = -48..=50;
pub const PCA_COMPONENTS: usize = 4;
/// Window of the moving average applied to cluster-wide sums.
pub const SUM_SMOOTHING: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// `cluster0`, `cluster1`, ...
    pub id: String,
    /// Member kmers in lexicographic order.
    pub members: Vec<String>,
    /// 1 for the cluster with the highest summed occurrence peak.
    pub rank: usize,
    /// Consensus label, filled in by naming.
    pub label: String,
}

/// A curve over consecutive positions starting at `first_pos`.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub first_pos: i32,
    pub values: Vec<f64>,
}

impl Curve {
    pub fn positions(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.values.len()).map(|i| self.first_pos + i as i32)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Top kmers by z-score, most significant first.
    pub top_kmers: Vec<String>,
    /// Smoothed occurrence curve of each top kmer, in `top_kmers` order.
    pub smoothed: Vec<(String, Curve)>,
    pub clusters: Vec<Cluster>,
    /// Moving average of the summed occurrence of each cluster, in
    /// `clusters` order.
    pub sums: Vec<Curve>,
}

impl ClusterResult {
    /// Clusters in rank order.
    pub fn ranked(&self) -> Vec<&Cluster> {
        let mut ranked: Vec<&Cluster> = self.clusters.iter().collect();
        ranked.sort_by_key(|c| c.rank);
        ranked
    }
}

#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub top_n: usize,
    pub clusters: usize,
    pub smoothing: usize,
}

///
/// Indices of the `n` records with the highest z-score. Records without a
/// z-score are never selected; ties keep kmer order.
///
pub fn top_n_by_z(table: &EnrichmentTable, n: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = table
        .records
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| r.z_score.map(|z| (idx, z)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(n).map(|(idx, _)| idx).collect()
}

pub struct KmerClusterer {
    params: ClusterParams,
}

impl KmerClusterer {
    pub fn new(params: ClusterParams) -> Self {
        KmerClusterer { params }
    }

    ///
    /// Cluster the top kmers of `table`. `None` when no kmer has a z-score.
    ///
    pub fn cluster(&self, table: &EnrichmentTable) -> Option<ClusterResult> {
        let top = top_n_by_z(table, self.params.top_n);
        if top.is_empty() {
            return None;
        }
        let first_pos = *table.positions().start();

        // smoothed curves for plotting
        let half = self.params.smoothing / 2;
        let smoothed = top
            .iter()
            .map(|idx| {
                let record = &table.records[*idx];
                let curve = Curve {
                    first_pos: first_pos + half as i32,
                    values: smooth_triangular(&record.occurrence_curve, self.params.smoothing),
                };
                (record.kmer.clone(), curve)
            })
            .collect();

        // ln curves of the top kmers in kmer order
        let mut in_kmer_order = top.clone();
        in_kmer_order.sort_unstable();
        let n_pos = REPORTED_POSITIONS.count();
        let mut ln_curves = Array2::zeros((in_kmer_order.len(), n_pos));
        for (row, idx) in in_kmer_order.iter().enumerate() {
            for (col, pos) in REPORTED_POSITIONS.enumerate() {
                ln_curves[[row, col]] = (table.occurrence(*idx, pos) + 1.0).ln();
            }
        }

        let scores = pca_scores(&ln_curves, PCA_COMPONENTS);
        let fit = kmeans(
            &scores,
            self.params.clusters,
            KMEANS_RESTARTS,
            KMEANS_MAX_ITERATIONS,
            KMEANS_SEED,
        );
        let n_clusters = fit.centroids.nrows();

        let mut clusters: Vec<Cluster> = (0..n_clusters)
            .map(|cluster| Cluster {
                id: format!("cluster{}", cluster),
                members: in_kmer_order
                    .iter()
                    .zip(&fit.labels)
                    .filter(|(_, label)| **label == cluster)
                    .map(|(idx, _)| table.records[*idx].kmer.clone())
                    .collect(),
                rank: 0,
                label: String::new(),
            })
            .collect();

        let sums: Vec<Curve> = (0..n_clusters)
            .map(|cluster| {
                let members: Vec<usize> = in_kmer_order
                    .iter()
                    .zip(&fit.labels)
                    .filter(|(_, label)| **label == cluster)
                    .map(|(idx, _)| *idx)
                    .collect();
                cluster_sum(table, &members)
            })
            .collect();

        let mut by_peak: Vec<usize> = (0..n_clusters).collect();
        by_peak.sort_by(|a, b| sums[*b].max().total_cmp(&sums[*a].max()));
        for (rank, cluster) in by_peak.into_iter().enumerate() {
            clusters[cluster].rank = rank + 1;
        }

        log::debug!(
            "{} top kmers in {} clusters",
            top.len(),
            clusters.len()
        );

        Some(ClusterResult {
            top_kmers: top.iter().map(|idx| table.records[*idx].kmer.clone()).collect(),
            smoothed,
            clusters,
            sums,
        })
    }
}

///
/// Summed occurrence of `members` at every position, smoothed with a centred
/// moving average of [`SUM_SMOOTHING`] positions; edges without a complete
/// window are dropped.
///
pub fn cluster_sum(table: &EnrichmentTable, members: &[usize]) -> Curve {
    let positions = table.positions();
    let summed: Vec<f64> = positions
        .clone()
        .map(|pos| members.iter().map(|idx| table.occurrence(*idx, pos)).sum())
        .collect();
    Curve {
        first_pos: positions.start() + (SUM_SMOOTHING as i32 - 1) / 2,
        values: centred_mean(&summed, SUM_SMOOTHING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::enrichment::{EnrichmentRecord, EnrichmentTable};

    fn record(kmer: &str, z: Option<f64>, peak: i32, height: f64) -> EnrichmentRecord {
        // curve over -60..=60 with a triangular peak
        let occurrence_curve = (-60..=60)
            .map(|pos: i32| (height - (pos - peak).abs() as f64).max(0.0))
            .collect();
        EnrichmentRecord {
            kmer: kmer.to_string(),
            mtxn: peak,
            prtxn: vec![],
            artxn: 1.0,
            aroxn: 1.0,
            etxn: None,
            z_score: z,
            p_value: None,
            occurrence_curve,
            subcounts: vec![],
        }
    }

    fn table() -> EnrichmentTable {
        EnrichmentTable::from_records(
            vec![
                record("AAAA", Some(5.0), -20, 10.0),
                record("AAAC", Some(1.0), 0, 1.0),
                record("AAAG", None, 0, 50.0),
                record("AAAU", Some(9.0), -21, 12.0),
                record("CCCC", Some(7.0), 30, 40.0),
                record("CCCG", Some(5.0), 31, 38.0),
            ],
            -60,
        )
    }

    #[rstest]
    fn test_top_n_by_z() {
        let table = table();
        assert_eq!(top_n_by_z(&table, 3), vec![3, 4, 0]);
        // records without a z-score are never selected
        assert_eq!(top_n_by_z(&table, 10).len(), 5);
    }

    #[rstest]
    fn test_cluster_groups_similar_curves() {
        let clusterer = KmerClusterer::new(ClusterParams {
            top_n: 4,
            clusters: 2,
            smoothing: 6,
        });
        let result = clusterer.cluster(&table()).unwrap();

        assert_eq!(result.top_kmers, vec!["AAAU", "CCCC", "AAAA", "CCCG"]);
        assert_eq!(result.clusters.len(), 2);

        let mut groups: Vec<Vec<String>> =
            result.clusters.iter().map(|c| c.members.clone()).collect();
        groups.sort();
        assert_eq!(
            groups,
            vec![
                vec!["AAAA".to_string(), "AAAU".to_string()],
                vec!["CCCC".to_string(), "CCCG".to_string()],
            ]
        );

        // the C cluster has the higher summed peak
        let first = result.ranked()[0];
        assert_eq!(first.members[0], "CCCC");
        assert_eq!(first.rank, 1);

        assert_eq!(result.smoothed.len(), 4);
        assert_eq!(result.smoothed[0].1.first_pos, -57);
        assert_eq!(result.smoothed[0].1.values.len(), 121 - 7);
        assert_eq!(result.sums[0].first_pos, -58);
        assert_eq!(result.sums[0].values.len(), 121 - 4);
    }

    #[rstest]
    fn test_cluster_count_capped_by_kmers() {
        let clusterer = KmerClusterer::new(ClusterParams {
            top_n: 2,
            clusters: 5,
            smoothing: 6,
        });
        let result = clusterer.cluster(&table()).unwrap();
        assert_eq!(result.clusters.len(), 2);
        let ids: Vec<&str> = result.clusters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["cluster0", "cluster1"]);
    }

    #[rstest]
    fn test_no_z_scores_no_clusters() {
        let table = EnrichmentTable::from_records(vec![record("AAAA", None, 0, 1.0)], -60);
        let clusterer = KmerClusterer::new(ClusterParams {
            top_n: 5,
            clusters: 2,
            smoothing: 6,
        });
        assert!(clusterer.cluster(&table).is_none());
    }

    #[rstest]
    fn test_cluster_sum_smoothing() {
        let table = table();
        let sum = cluster_sum(&table, &[0, 3]);
        // peaks 10 at -20 and 12 at -21: summed 21 at -20 and -21
        let at = |pos: i32| sum.values[(pos - sum.first_pos) as usize];
        assert!(at(-20) > at(-10));
        assert_eq!(sum.positions().next(), Some(-58));
    }
}
