use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;

use xlmotif_kmers::pipeline::{RegionOutcome, RunInputs, run};
use xlmotif_kmers::KmerConfig;

fn path_arg(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches.get_one::<String>(name).map(PathBuf::from)
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    path_arg(matches, name).with_context(|| format!("--{} is required", name))
}

///
/// Parameters from `--config` (or the defaults), overridden by every flag
/// given on the command line.
///
pub fn build_config(matches: &ArgMatches) -> Result<KmerConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => KmerConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to read config file: {}", path))?,
        None => KmerConfig::default(),
    };

    if let Some(v) = matches.get_one::<u32>("window") {
        config.window = *v;
    }
    if let Some(v) = matches.get_one::<u32>("window-distal") {
        config.window_distal = *v;
    }
    if let Some(v) = matches.get_one::<usize>("kmer-length") {
        config.kmer_length = *v;
    }
    if let Some(v) = matches.get_one::<usize>("top-n") {
        config.top_n = *v;
    }
    if let Some(v) = matches.get_one::<f64>("percentile") {
        config.percentile = *v;
    }
    if let Some(v) = matches.get_one::<f64>("min-relative-occurrence") {
        config.min_relative_occurrence = *v;
    }
    if let Some(v) = matches.get_one::<usize>("clusters") {
        config.clusters = *v;
    }
    if let Some(v) = matches.get_one::<usize>("smoothing") {
        config.smoothing = *v;
    }
    if let Some(regions) = matches.get_many::<String>("region") {
        config.regions = regions.cloned().collect();
    }
    if let Some(v) = matches.get_one::<usize>("bootstrap-draws") {
        config.bootstrap_draws = *v;
    }
    if let Some(v) = matches.get_one::<u64>("seed") {
        config.seed = Some(*v);
    }
    if matches.get_flag("all-outputs") {
        config.all_outputs = true;
    }
    if matches.get_flag("merge-reference-overlaps") {
        config.merge_reference_overlaps = true;
    }

    config.validate().context("Invalid kmer analysis parameters")?;
    Ok(config)
}

pub fn run_kmers(matches: &ArgMatches) -> Result<()> {
    let inputs = RunInputs {
        peaks: required_path(matches, "peaks")?,
        sites: required_path(matches, "sites")?,
        regions: required_path(matches, "regions")?,
        genome: required_path(matches, "genome")?,
        genome_fai: path_arg(matches, "genome-fai"),
        chrom_sizes: path_arg(matches, "chrom-sizes"),
        output: required_path(matches, "output")?,
    };
    let config = build_config(matches)?;

    let summary = run(&inputs, &config, matches.get_flag("progress")).with_context(|| {
        format!("Kmer analysis of {} failed", inputs.sites.display())
    })?;

    for outcome in &summary.outcomes {
        match outcome {
            RegionOutcome::Completed {
                region, clusters, ..
            } => log::info!("{}: done, {} clusters", region, clusters),
            RegionOutcome::Insufficient {
                region,
                thresholded,
            } => log::info!("{}: skipped, {} thresholded sites", region, thresholded),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::kmers::cli::create_kmers_cli;

    fn matches(extra: &[&str]) -> ArgMatches {
        let mut args = vec![
            "kmers", "--peaks", "p.bed", "--sites", "s.bed", "--genome", "g.fa", "--regions",
            "r.gtf",
        ];
        args.extend_from_slice(extra);
        create_kmers_cli().try_get_matches_from(args).unwrap()
    }

    #[rstest]
    fn test_defaults_without_flags() {
        let config = build_config(&matches(&[])).unwrap();
        assert_eq!(config, KmerConfig::default());
    }

    #[rstest]
    fn test_flags_override_config_file() {
        let config = build_config(&matches(&[
            "--config",
            "../tests/data/config/kmers.toml",
            "-k",
            "6",
            "--region",
            "UTR3",
            "ncRNA",
            "--all-outputs",
        ]))
        .unwrap();
        assert_eq!(config.kmer_length, 6);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.regions, vec!["UTR3", "ncRNA"]);
        assert!(config.all_outputs);
    }

    #[rstest]
    #[case(&["-k", "8"])]
    #[case(&["--percentile", "1.5"])]
    #[case(&["--region", "exon"])]
    fn test_invalid_parameters(#[case] extra: &[&str]) {
        assert!(build_config(&matches(extra)).is_err());
    }
}
