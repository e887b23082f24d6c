//! Per-region result files.
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use xlmotif_core::models::IntervalSet;
use xlmotif_regions::ReportingRegion;

use crate::clustering::{Curve, ClusterResult, REPORTED_POSITIONS};
use crate::enrichment::EnrichmentTable;
use crate::errors::{KmerError, Result};

/// Positions of the per-kmer curves handed to plotting.
pub const PLOT_POSITIONS: std::ops::RangeInclusive<i32> = -50..=50;

fn float(value: f64) -> String {
    format!("{:.8}", value)
}

fn optional(value: Option<f64>) -> String {
    value.map(float).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotCurve {
    pub name: String,
    pub first_pos: i32,
    pub values: Vec<f64>,
}

impl PlotCurve {
    fn from_curve(name: &str, curve: &Curve, keep: Option<&std::ops::RangeInclusive<i32>>) -> Self {
        let kept: Vec<(i32, f64)> = curve
            .positions()
            .zip(curve.values.iter().copied())
            .filter(|(pos, _)| keep.is_none_or(|range| range.contains(pos)))
            .collect();
        PlotCurve {
            name: name.to_string(),
            first_pos: kept.first().map_or(curve.first_pos, |(pos, _)| *pos),
            values: kept.into_iter().map(|(_, v)| v).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotCluster {
    pub id: String,
    pub label: String,
    pub rank: usize,
    pub members: Vec<String>,
    /// Smoothed occurrence of every member.
    pub curves: Vec<PlotCurve>,
    /// Counts around the maximum of every member.
    pub subcounts: Vec<(String, Vec<(i32, f64)>)>,
}

/// Everything a figure of one region is drawn from.
#[derive(Debug, Clone, Serialize)]
pub struct PlotData {
    pub sample: String,
    pub region: String,
    /// Clusters in rank order.
    pub clusters: Vec<PlotCluster>,
    /// Summed occurrence of every cluster, labelled by consensus.
    pub sums: Vec<PlotCurve>,
}

impl PlotData {
    pub fn new(
        sample: &str,
        region: ReportingRegion,
        table: &EnrichmentTable,
        result: &ClusterResult,
    ) -> Self {
        let clusters = result
            .ranked()
            .into_iter()
            .map(|cluster| {
                let curves = result
                    .smoothed
                    .iter()
                    .filter(|(kmer, _)| cluster.members.contains(kmer))
                    .map(|(kmer, curve)| PlotCurve::from_curve(kmer, curve, Some(&PLOT_POSITIONS)))
                    .collect();
                let subcounts = table
                    .records
                    .iter()
                    .filter(|r| cluster.members.contains(&r.kmer))
                    .map(|r| (r.kmer.clone(), r.subcounts.clone()))
                    .collect();
                PlotCluster {
                    id: cluster.id.clone(),
                    label: cluster.label.clone(),
                    rank: cluster.rank,
                    members: cluster.members.clone(),
                    curves,
                    subcounts,
                }
            })
            .collect();

        let sums = result
            .ranked()
            .into_iter()
            .filter_map(|cluster| {
                let idx = result.clusters.iter().position(|c| c.id == cluster.id)?;
                Some(PlotCurve::from_curve(&cluster.label, &result.sums[idx], None))
            })
            .collect();

        PlotData {
            sample: sample.to_string(),
            region: region.to_string(),
            clusters,
            sums,
        }
    }
}

///
/// Receives the plot inputs of every completed region.
///
pub trait PlotSink {
    fn emit(&self, plot: &PlotData) -> Result<PathBuf>;
}

/// Writes plot inputs as `{sample}_{region}_plot.json`.
pub struct JsonPlotSink {
    dir: PathBuf,
}

impl JsonPlotSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        JsonPlotSink {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl PlotSink for JsonPlotSink {
    fn emit(&self, plot: &PlotData) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{}_{}_plot.json", plot.sample, plot.region));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, plot)?;
        Ok(path)
    }
}

///
/// Writes the result files of a sample into one output directory.
///
pub struct ReportEmitter {
    dir: PathBuf,
    sample: String,
    k: usize,
}

impl ReportEmitter {
    pub fn new<P: AsRef<Path>>(dir: P, sample: &str, k: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            KmerError::Report(format!("can't create {}: {}", dir.display(), e))
        })?;
        Ok(ReportEmitter {
            dir,
            sample: sample.to_string(),
            k,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn enrichment_path(&self, region: ReportingRegion) -> PathBuf {
        self.dir
            .join(format!("{}_{}mer_{}.tsv", self.sample, self.k, region))
    }

    pub fn clusters_path(&self, region: ReportingRegion) -> PathBuf {
        self.dir
            .join(format!("{}_{}_clusters.csv", self.sample, region))
    }

    pub fn sums_path(&self, region: ReportingRegion) -> PathBuf {
        self.dir.join(format!(
            "{}_sum_cluster_distribution_{}.tsv",
            self.sample, region
        ))
    }

    /// `{sample}_{what}_{region}.bed`
    pub fn sites_path(&self, what: &str, region: ReportingRegion) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}.bed", self.sample, what, region))
    }

    ///
    /// One row per kmer: scores then the occurrence at every reported
    /// position.
    ///
    pub fn write_enrichment(&self, region: ReportingRegion, table: &EnrichmentTable) -> Result<PathBuf> {
        let path = self.enrichment_path(region);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&path)?;

        let mut header: Vec<String> = [
            "", "mtxn", "prtxn", "artxn", "aroxn", "etxn", "z-score", "p-value",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        header.extend(REPORTED_POSITIONS.map(|pos| pos.to_string()));
        writer.write_record(&header)?;

        for (idx, record) in table.records.iter().enumerate() {
            let prtxn = record
                .prtxn
                .iter()
                .map(|pos| pos.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let mut row = vec![
                record.kmer.clone(),
                record.mtxn.to_string(),
                prtxn,
                float(record.artxn),
                float(record.aroxn),
                optional(record.etxn),
                optional(record.z_score),
                optional(record.p_value),
            ];
            row.extend(REPORTED_POSITIONS.map(|pos| float(table.occurrence(idx, pos))));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// `cluster_id,[members]` for every cluster, e.g. `cluster0,"['AAA', 'AAC']"`.
    pub fn write_clusters(&self, region: ReportingRegion, result: &ClusterResult) -> Result<PathBuf> {
        let path = self.clusters_path(region);
        let mut writer = csv::WriterBuilder::new().from_path(&path)?;
        for cluster in &result.clusters {
            let members = member_list(&cluster.members);
            writer.write_record([cluster.id.as_str(), members.as_str()])?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Smoothed cluster sums by position, one column per cluster label.
    pub fn write_cluster_sums(&self, region: ReportingRegion, result: &ClusterResult) -> Result<PathBuf> {
        let path = self.sums_path(region);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&path)?;

        let mut header = vec![String::new()];
        header.extend(result.clusters.iter().map(|c| c.label.clone()));
        writer.write_record(&header)?;

        if let Some(first) = result.sums.first() {
            for (row, pos) in first.positions().enumerate() {
                let mut record = vec![pos.to_string()];
                record.extend(
                    result
                        .sums
                        .iter()
                        .map(|sum| sum.values.get(row).copied().map(float).unwrap_or_default()),
                );
                writer.write_record(&record)?;
            }
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_sites(&self, what: &str, region: ReportingRegion, sites: &IntervalSet) -> Result<PathBuf> {
        let path = self.sites_path(what, region);
        sites.to_bed(&path)?;
        Ok(path)
    }
}

/// `['AAA', 'AAC']`
fn member_list(members: &[String]) -> String {
    let quoted: Vec<String> = members.iter().map(|m| format!("'{}'", m)).collect();
    format!("[{}]", quoted.join(", "))
}
