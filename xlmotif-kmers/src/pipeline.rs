//! The kmer enrichment run: thresholding once, then one analysis per
//! reporting region.
use std::path::{Path, PathBuf};
use std::time::Instant;

use xlmotif_core::models::{ChromSizes, GenomicInterval, IntervalSet};
use xlmotif_core::utils::sample_name;
use xlmotif_overlaprs::{IntervalRanges, IntoStrandedIndex, StrandedIndex};
use xlmotif_regions::threshold::RegionSelection;
use xlmotif_regions::{
    GenomeAssembly, IndexedGenome, RegionIndex, ReportingRegion, RunContext, SequenceExtractor,
    SequenceStore, ThresholdEngine,
};

use crate::clustering::{ClusterParams, KmerClusterer};
use crate::config::KmerConfig;
use crate::consensus::name_clusters;
use crate::enrichment::{EnrichmentScorer, ScoringParams};
use crate::errors::Result;
use crate::kmer::pos_count_kmer;
use crate::report::{JsonPlotSink, PlotData, PlotSink, ReportEmitter};

/// Input files of a run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub peaks: PathBuf,
    pub sites: PathBuf,
    /// Segmentation annotation.
    pub regions: PathBuf,
    pub genome: PathBuf,
    /// FASTA index; without it the whole genome is read into memory.
    pub genome_fai: Option<PathBuf>,
    /// Chromosome sizes; taken from the genome when absent.
    pub chrom_sizes: Option<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    Completed {
        region: ReportingRegion,
        ntxn: usize,
        noxn: usize,
        clusters: usize,
        files: Vec<PathBuf>,
    },
    /// Fewer thresholded sites than the analysis needs.
    Insufficient {
        region: ReportingRegion,
        thresholded: usize,
    },
}

impl RegionOutcome {
    pub fn region(&self) -> ReportingRegion {
        match self {
            RegionOutcome::Completed { region, .. } | RegionOutcome::Insufficient { region, .. } => {
                *region
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RegionOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub sample: String,
    /// Thresholded sites over all partitions.
    pub thresholded: usize,
    /// One entry per requested region; empty when nothing passed
    /// thresholding.
    pub outcomes: Vec<RegionOutcome>,
}

///
/// Run the analysis on the files of `inputs`. The genome is read through
/// its index when one is given.
///
pub fn run(inputs: &RunInputs, config: &KmerConfig, progress: bool) -> Result<RunSummary> {
    match &inputs.genome_fai {
        Some(fai) => {
            let store = IndexedGenome::from_paths(&inputs.genome, fai)?;
            run_with_store(inputs, store, config, progress)
        }
        None => {
            let store = GenomeAssembly::try_from(inputs.genome.as_path())?;
            run_with_store(inputs, store, config, progress)
        }
    }
}

fn load_sites(path: &Path, sizes: &ChromSizes) -> Result<IntervalSet> {
    let mut sites = IntervalSet::try_from(path)?;
    let removed = sites.retain_analysed_chroms(sizes);
    if removed > 0 {
        log::info!(
            "{}: {} records on excluded chromosomes dropped",
            path.display(),
            removed
        );
    }
    Ok(sites)
}

/// Per strand gaps between peaks over the analysed genome.
fn outside_peaks(peaks: &IntervalSet, sizes: &ChromSizes) -> StrandedIndex<GenomicInterval> {
    peaks.complement(sizes).into_stranded_index()
}

pub fn run_with_store<S: SequenceStore>(
    inputs: &RunInputs,
    store: S,
    config: &KmerConfig,
    progress: bool,
) -> Result<RunSummary> {
    config.validate()?;
    let start = Instant::now();
    let regions = config.reporting_regions()?;
    let sample = sample_name(&inputs.sites);

    let mut extractor = SequenceExtractor::new(store);
    let chrom_sizes = match &inputs.chrom_sizes {
        Some(path) => ChromSizes::try_from(path.as_path())?,
        None => extractor.chrom_sizes().clone(),
    };

    let sites = load_sites(&inputs.sites, &chrom_sizes)?;
    let peaks = load_sites(&inputs.peaks, &chrom_sizes)?;
    let region_index = RegionIndex::try_from(inputs.regions.as_path())?;
    let ctx = RunContext::new(region_index, chrom_sizes)?;

    log::info!("Getting thresholded crosslinks for {}", sample);
    let thresholded = ThresholdEngine::new(&ctx, config.percentile).run(&sites);
    let n_thresholded = thresholded.thresholded().count();
    log::info!(
        "Thresholding runtime: {:.2}s for {} thresholded crosslinks",
        start.elapsed().as_secs_f64(),
        n_thresholded
    );
    if !thresholded.has_thresholded() {
        log::warn!("Not able to find any thresholded sites, nothing to analyse");
        return Ok(RunSummary {
            sample,
            thresholded: 0,
            outcomes: vec![],
        });
    }

    let emitter = ReportEmitter::new(&inputs.output, &sample, config.kmer_length)?;
    let plots = JsonPlotSink::new(&inputs.output);
    let reference_index = outside_peaks(&peaks, &ctx.chrom_sizes);

    let mut outcomes = Vec::with_capacity(regions.len());
    for region in regions {
        let selection = thresholded.select(region);
        let outcome = analyse_region(
            &selection,
            &reference_index,
            &mut extractor,
            &emitter,
            &plots,
            config,
            progress,
        )?;
        outcomes.push(outcome);
    }

    log::info!(
        "{}: {} of {} regions analysed in {:.2}s",
        sample,
        outcomes.iter().filter(|o| o.is_completed()).count(),
        outcomes.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(RunSummary {
        sample,
        thresholded: n_thresholded,
        outcomes,
    })
}

fn analyse_region<S: SequenceStore>(
    selection: &RegionSelection,
    reference_index: &StrandedIndex<GenomicInterval>,
    extractor: &mut SequenceExtractor<S>,
    emitter: &ReportEmitter,
    plots: &dyn PlotSink,
    config: &KmerConfig,
    progress: bool,
) -> Result<RegionOutcome> {
    let region = selection.region;
    let start = Instant::now();
    let k = config.kmer_length;
    let mut files = Vec::new();

    log::info!(
        "{} thresholded sites on {}, {} sites in total",
        selection.thresholded.len(),
        region,
        selection.all.len()
    );
    if config.all_outputs {
        files.push(emitter.write_sites("threshold_crosslinks", region, &selection.thresholded)?);
    }
    if !selection.has_enough_sites() {
        log::warn!(
            "Less than 100 thresholded crosslinks in {}, region skipped",
            region
        );
        return Ok(RegionOutcome::Insufficient {
            region,
            thresholded: selection.thresholded.len(),
        });
    }

    let reference = selection.all.intersect(reference_index);
    let (ntxn, noxn) = (selection.thresholded.len(), reference.len());
    log::info!("ntxn {} and noxn {} on {}", ntxn, noxn, region);
    if config.all_outputs {
        files.push(emitter.write_sites("oxn", region, &reference)?);
    }

    let flank = config.window + k as u32;
    let reference_sequences =
        extractor.extract(&reference, flank, flank, config.merge_reference_overlaps)?;
    let flank_distal = config.window_distal + k as u32;
    let sequences = extractor.extract(&selection.thresholded, flank_distal, flank_distal, false)?;

    let counting = Instant::now();
    let thresholded_profile = pos_count_kmer(&sequences, k, config.window_distal)?;
    let reference_profile = pos_count_kmer(&reference_sequences, k, config.window)?;
    log::debug!(
        "Kmer positional counting runtime: {:.2}s",
        counting.elapsed().as_secs_f64()
    );

    let scorer = EnrichmentScorer::new(ScoringParams {
        k,
        window: config.window,
        window_distal: config.window_distal,
        min_relative_occurrence: config.min_relative_occurrence,
        bootstrap_draws: config.bootstrap_draws,
        seed: config.seed,
    })
    .with_progress(progress);
    let table = scorer.score(
        &thresholded_profile,
        &reference_profile,
        &reference_sequences,
        ntxn,
        noxn,
    );
    files.push(emitter.write_enrichment(region, &table)?);

    let clusterer = KmerClusterer::new(ClusterParams {
        top_n: config.top_n,
        clusters: config.clusters,
        smoothing: config.smoothing,
    });
    let n_clusters = match clusterer.cluster(&table) {
        Some(mut result) => {
            name_clusters(&mut result.clusters);
            files.push(emitter.write_clusters(region, &result)?);
            files.push(emitter.write_cluster_sums(region, &result)?);
            let plot = PlotData::new(emitter.sample(), region, &table, &result);
            files.push(plots.emit(&plot)?);
            result.clusters.len()
        }
        None => {
            log::warn!("No kmer with a z-score on {}, clustering skipped", region);
            0
        }
    };

    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "Analysing {} runtime: {:.2}s ({:.6}s per thresholded crosslink)",
        region,
        elapsed,
        elapsed / ntxn as f64
    );

    Ok(RegionOutcome::Completed {
        region,
        ntxn,
        noxn,
        clusters: n_clusters,
        files,
    })
}
