use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const KMERS_CMD: &str = "kmers";

pub fn create_kmers_cli() -> Command {
    Command::new(KMERS_CMD)
        .about("Find kmers positionally enriched around thresholded crosslink sites.")
        .arg(
            arg!(--peaks <PEAKS>)
                .required(true)
                .help("Path to peaks BED6 file"),
        )
        .arg(
            arg!(--sites <SITES>)
                .required(true)
                .help("Path to crosslink sites BED6 file (optionally gzipped)"),
        )
        .arg(
            arg!(--genome <GENOME>)
                .required(true)
                .help("Path to genome FASTA file"),
        )
        .arg(
            Arg::new("genome-fai")
                .long("genome-fai")
                .required(false)
                .help("Path to the FASTA index; the genome is loaded in memory without it"),
        )
        .arg(
            arg!(--regions <REGIONS>)
                .required(true)
                .help("Path to genome segmentation file (9 field GTF-like, optionally gzipped)"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .default_value("results")
                .help("Output directory"),
        )
        .arg(
            Arg::new("chrom-sizes")
                .long("chrom-sizes")
                .required(false)
                .help("Path to chrom.sizes file (default: sizes of the genome)"),
        )
        .arg(
            arg!(--config <CONFIG>)
                .required(false)
                .help("TOML file with analysis parameters; flags below override it"),
        )
        .arg(
            arg!(--window <WINDOW>)
                .required(false)
                .value_parser(value_parser!(u32))
                .help("Half-width of the window kmers are scored in [default: 40]"),
        )
        .arg(
            Arg::new("window-distal")
                .long("window-distal")
                .required(false)
                .value_parser(value_parser!(u32))
                .help("Half-width of the window used for the distal background [default: 150]"),
        )
        .arg(
            Arg::new("kmer-length")
                .long("kmer-length")
                .short('k')
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Kmer length, 3 to 7 [default: 4]"),
        )
        .arg(
            Arg::new("top-n")
                .long("top-n")
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Kmers by z-score passed on to clustering [default: 20]"),
        )
        .arg(
            arg!(--percentile <PERCENTILE>)
                .required(false)
                .value_parser(value_parser!(f64))
                .help("Score percentile used for thresholding [default: 0.7]"),
        )
        .arg(
            Arg::new("min-relative-occurrence")
                .long("min-relative-occurrence")
                .required(false)
                .value_parser(value_parser!(f64))
                .help("Relative occurrence a position needs outside the inner window [default: 2]"),
        )
        .arg(
            arg!(--clusters <CLUSTERS>)
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Number of kmer clusters [default: 5]"),
        )
        .arg(
            arg!(--smoothing <SMOOTHING>)
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Smoothing window of the plotted curves [default: 6]"),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .required(false)
                .num_args(1..)
                .action(ArgAction::Append)
                .help("Reporting regions to analyse [default: all]"),
        )
        .arg(
            Arg::new("bootstrap-draws")
                .long("bootstrap-draws")
                .required(false)
                .value_parser(value_parser!(usize))
                .help("Reference samples drawn for the z-score [default: 100]"),
        )
        .arg(
            arg!(--seed <SEED>)
                .required(false)
                .value_parser(value_parser!(u64))
                .help("Seed of the bootstrap draws; results are reproducible only when set"),
        )
        .arg(
            Arg::new("all-outputs")
                .long("all-outputs")
                .action(ArgAction::SetTrue)
                .help("Also write thresholded and reference crosslink BED files"),
        )
        .arg(
            Arg::new("merge-reference-overlaps")
                .long("merge-reference-overlaps")
                .action(ArgAction::SetTrue)
                .help("Merge overlapping reference windows before extraction"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Show bootstrap progress"),
        )
}
