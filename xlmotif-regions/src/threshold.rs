//! Region-aware crosslink thresholding.
//!
//! Sites are scored against the other sites of the same sub-region: for
//! exonic segments the sub-region is the owning gene, for introns and
//! intergenic space it is the containing segment. Only sites scoring above the
//! group percentile are kept as thresholded.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{self, Display};
use std::str::FromStr;

use xlmotif_core::models::{GenomicInterval, IntervalSet, RegionKind, Strand};

use crate::errors::RegionError;
use crate::region_index::{Partition, PartitionName, Region};
use crate::workspace::RunContext;

/// Regions with fewer thresholded sites than this are not analysed.
pub const MIN_THRESHOLDED_SITES: usize = 100;

/// A crosslink site paired with the partition region it falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosslinkSite {
    pub interval: GenomicInterval,
    pub feature: RegionKind,
    pub attributes: String,
    pub thresholded: bool,
}

/// How sites of a partition are grouped before taking the percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingKey {
    /// Owning gene of the overlapping region.
    GeneId,
    /// Partition interval containing the site start.
    ContainingInterval,
}

impl GroupingKey {
    pub fn for_partition(name: PartitionName) -> Self {
        match name {
            PartitionName::CdsUtrNcRna => GroupingKey::GeneId,
            PartitionName::Intron | PartitionName::Intergenic => GroupingKey::ContainingInterval,
        }
    }

    fn key(&self, site: &GenomicInterval, region: &Region, partition: &Partition) -> Option<String> {
        match self {
            GroupingKey::GeneId => region.gene_id(),
            GroupingKey::ContainingInterval => partition
                .containing(&site.chrom, site.strand, site.start)
                .map(|r| format!("{}:{}-{}({})", r.chrom, r.start, r.end, r.strand)),
        }
    }
}

///
/// Quantile of `values` with linear interpolation between the closest order
/// statistics, `None` for an empty slice. `values` is sorted in place.
///
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let h = (values.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(values.len() - 1);
    Some(values[lo] + (h - lo as f64) * (values[hi] - values[lo]))
}

///
/// Mark each entry as thresholded when its score lies strictly above the
/// `percentile` quantile of its group. Returns one flag per entry.
///
pub fn percentile_filter(groups: &[String], scores: &[f64], percentile: f64) -> Vec<bool> {
    let mut by_group: HashMap<&str, Vec<f64>> = HashMap::new();
    for (group, score) in groups.iter().zip(scores) {
        by_group.entry(group.as_str()).or_default().push(*score);
    }

    let cutoffs: HashMap<&str, f64> = by_group
        .into_iter()
        .filter_map(|(group, mut values)| quantile(&mut values, percentile).map(|q| (group, q)))
        .collect();

    groups
        .iter()
        .zip(scores)
        .map(|(group, score)| cutoffs.get(group.as_str()).is_some_and(|q| *score > *q))
        .collect()
}

/// Collapse sites sharing chrom, start, end and strand, summing their scores.
fn collapse_sites(sites: &IntervalSet) -> Vec<GenomicInterval> {
    let mut collapsed: BTreeMap<(&str, u32, u32, Strand), f64> = BTreeMap::new();
    for site in sites.iter() {
        *collapsed
            .entry((site.chrom.as_str(), site.start, site.end, site.strand))
            .or_insert(0.0) += site.score;
    }
    collapsed
        .into_iter()
        .map(|((chrom, start, end, strand), score)| {
            GenomicInterval::new(chrom, start, end, strand).with_score(score)
        })
        .collect()
}

fn sort_sites(sites: &mut [CrosslinkSite]) {
    sites.sort_by(|a, b| {
        let (a, b) = (&a.interval, &b.interval);
        a.chrom
            .cmp(&b.chrom)
            .then(a.start.cmp(&b.start))
            .then(a.strand.cmp(&b.strand))
            .then(a.end.cmp(&b.end))
    });
}

///
/// Splits crosslink sites into thresholded and background sets for every
/// thresholding partition of the run.
///
pub struct ThresholdEngine<'a> {
    ctx: &'a RunContext,
    percentile: f64,
}

impl<'a> ThresholdEngine<'a> {
    pub fn new(ctx: &'a RunContext, percentile: f64) -> Self {
        ThresholdEngine { ctx, percentile }
    }

    /// Threshold `sites` within one partition.
    pub fn annotate(&self, sites: &IntervalSet, name: PartitionName) -> Vec<CrosslinkSite> {
        let partition = self.ctx.partition(name);
        let grouping = GroupingKey::for_partition(name);

        let mut paired: Vec<(GenomicInterval, &Region)> = Vec::new();
        let mut groups: Vec<String> = Vec::new();
        for site in collapse_sites(sites) {
            for region in partition.overlapping(&site.chrom, site.strand, site.start, site.end) {
                if let Some(key) = grouping.key(&site, region, partition) {
                    groups.push(key);
                    paired.push((site.clone(), region));
                }
            }
        }

        let scores: Vec<f64> = paired.iter().map(|(site, _)| site.score).collect();
        let flags = percentile_filter(&groups, &scores, self.percentile);

        let annotated: Vec<CrosslinkSite> = paired
            .into_iter()
            .zip(flags)
            .map(|((interval, region), thresholded)| CrosslinkSite {
                interval,
                feature: region.kind,
                attributes: region.attributes.clone(),
                thresholded,
            })
            .collect();

        log::debug!(
            "{}: {} annotated sites, {} thresholded",
            name,
            annotated.len(),
            annotated.iter().filter(|s| s.thresholded).count()
        );
        annotated
    }

    /// Threshold `sites` in every partition.
    pub fn run(&self, sites: &IntervalSet) -> ThresholdedSites {
        let mut annotated: Vec<CrosslinkSite> = PartitionName::ALL
            .into_iter()
            .flat_map(|name| self.annotate(sites, name))
            .collect();
        sort_sites(&mut annotated);
        ThresholdedSites { sites: annotated }
    }
}

/// Thresholding result over all partitions, sorted by chrom, start, strand.
#[derive(Debug, Default)]
pub struct ThresholdedSites {
    pub sites: Vec<CrosslinkSite>,
}

impl ThresholdedSites {
    pub fn thresholded(&self) -> impl Iterator<Item = &CrosslinkSite> {
        self.sites.iter().filter(|site| site.thresholded)
    }

    pub fn has_thresholded(&self) -> bool {
        self.thresholded().next().is_some()
    }

    ///
    /// Sites of a reporting region. Both sets hold each locus once, the
    /// thresholded set being a subset of the full one.
    ///
    pub fn select(&self, region: ReportingRegion) -> RegionSelection {
        let kinds = region.feature_kinds();

        let mut seen_all = HashSet::new();
        let mut seen_thresholded = HashSet::new();
        let mut all = Vec::new();
        let mut thresholded = Vec::new();

        for site in self.sites.iter().filter(|s| kinds.contains(&s.feature)) {
            let locus = site.interval.locus();
            if site.thresholded && seen_thresholded.insert(locus.clone()) {
                thresholded.push(site.interval.clone());
            }
            if seen_all.insert(locus) {
                all.push(site.interval.clone());
            }
        }

        RegionSelection {
            region,
            thresholded: IntervalSet::from(thresholded),
            all: IntervalSet::from(all),
        }
    }
}

/// Thresholded and background sites of one reporting region.
pub struct RegionSelection {
    pub region: ReportingRegion,
    pub thresholded: IntervalSet,
    pub all: IntervalSet,
}

impl RegionSelection {
    pub fn has_enough_sites(&self) -> bool {
        self.thresholded.len() >= MIN_THRESHOLDED_SITES
    }
}

/// Regions results are reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportingRegion {
    WholeGene,
    Intron,
    Utr3,
    OtherExon,
    Utr5,
    NcRna,
    Intergenic,
    Genome,
}

impl ReportingRegion {
    pub const ALL: [ReportingRegion; 8] = [
        ReportingRegion::WholeGene,
        ReportingRegion::Intron,
        ReportingRegion::Utr3,
        ReportingRegion::OtherExon,
        ReportingRegion::Utr5,
        ReportingRegion::NcRna,
        ReportingRegion::Intergenic,
        ReportingRegion::Genome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportingRegion::WholeGene => "whole_gene",
            ReportingRegion::Intron => "intron",
            ReportingRegion::Utr3 => "UTR3",
            ReportingRegion::OtherExon => "other_exon",
            ReportingRegion::Utr5 => "UTR5",
            ReportingRegion::NcRna => "ncRNA",
            ReportingRegion::Intergenic => "intergenic",
            ReportingRegion::Genome => "genome",
        }
    }

    /// Segment kinds whose sites make up the region.
    pub fn feature_kinds(&self) -> &'static [RegionKind] {
        match self {
            ReportingRegion::Genome => &RegionKind::ALL,
            ReportingRegion::WholeGene => &[
                RegionKind::Intron,
                RegionKind::Cds,
                RegionKind::Utr3,
                RegionKind::Utr5,
            ],
            ReportingRegion::OtherExon => &[RegionKind::Utr5, RegionKind::Cds],
            ReportingRegion::Intron => &[RegionKind::Intron],
            ReportingRegion::Utr3 => &[RegionKind::Utr3],
            ReportingRegion::Utr5 => &[RegionKind::Utr5],
            ReportingRegion::NcRna => &[RegionKind::NcRna],
            ReportingRegion::Intergenic => &[RegionKind::Intergenic],
        }
    }
}

impl FromStr for ReportingRegion {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportingRegion::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| RegionError::UnknownRegion(s.to_string()))
    }
}

impl Display for ReportingRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
