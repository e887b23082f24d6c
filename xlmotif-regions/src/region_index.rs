//! Genome segmentation partitions.
//!
//! A segmentation annotation classifies the genome into introns, coding and
//! untranslated exons, non-coding RNA exons and intergenic space. Sites are
//! thresholded separately within three partitions of it:
//!
//! - `intron`: introns of at least [`MIN_REGION_LENGTH`] bases
//! - `intergenic`: intergenic segments as annotated
//! - `cds_utr_ncrna`: CDS, UTR5, UTR3 and ncRNA exons of at least
//!   [`MIN_REGION_LENGTH`] bases, CDS trimmed by [`CDS_TRIM`] on both ends
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use xlmotif_core::models::{Interval, RegionKind, Strand};
use xlmotif_core::utils::get_dynamic_reader;
use xlmotif_overlaprs::StrandedIndex;

use crate::errors::{RegionError, Result};

/// Regions shorter than this are not used for thresholding.
pub const MIN_REGION_LENGTH: u32 = 100;

/// Bases removed from each end of a CDS segment.
pub const CDS_TRIM: u32 = 30;

/// Attribute marking a persisted CDS as already trimmed.
pub const TRIMMED_ATTRIBUTE: &str = "trimmed \"true\";";

///
/// One segment of the genome segmentation, in 0-based half-open
/// coordinates.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub chrom: String,
    pub source: String,
    pub kind: RegionKind,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub attributes: String,
    /// Set once a CDS has had its ends trimmed.
    pub trimmed: bool,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    ///
    /// Parse one tab separated, 9 field annotation line. The annotation is
    /// 1-based with inclusive ends; it is converted to 0-based half-open.
    ///
    /// Returns `Ok(None)` for features outside the segmentation vocabulary.
    pub fn from_annotation_line(line: &str) -> std::result::Result<Option<Self>, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            return Err(format!(
                "expected 9 tab separated fields, found {}",
                fields.len()
            ));
        }

        let kind = match fields[2].parse::<RegionKind>() {
            Ok(kind) => kind,
            Err(_) => return Ok(None),
        };

        let start = fields[3]
            .parse::<u32>()
            .map_err(|e| format!("parsing start '{}': {}", fields[3], e))?
            .saturating_sub(1);
        let end = fields[4]
            .parse::<u32>()
            .map_err(|e| format!("parsing end '{}': {}", fields[4], e))?;
        if end < start {
            return Err(format!("end {} lies before start {}", end, start + 1));
        }

        let strand = fields[6].parse::<Strand>().map_err(|e| e.to_string())?;

        let (attributes, trimmed) = match fields[8].trim_end().strip_suffix(TRIMMED_ATTRIBUTE) {
            Some(rest) => (rest.trim_end(), true),
            None => (fields[8], false),
        };

        Ok(Some(Region {
            chrom: fields[0].to_string(),
            source: fields[1].to_string(),
            kind,
            start,
            end,
            strand,
            attributes: attributes.to_string(),
            trimmed,
        }))
    }

    ///
    /// Back to a 9 field annotation line (1-based start). A trimmed region
    /// carries [`TRIMMED_ATTRIBUTE`] so it is not trimmed again when read
    /// back.
    pub fn to_annotation_line(&self) -> String {
        let attributes = match (self.trimmed, self.attributes.is_empty()) {
            (false, _) => self.attributes.clone(),
            (true, true) => TRIMMED_ATTRIBUTE.to_string(),
            (true, false) => format!("{} {}", self.attributes, TRIMMED_ATTRIBUTE),
        };
        format!(
            "{}\t{}\t{}\t{}\t{}\t.\t{}\t.\t{}",
            self.chrom,
            self.source,
            self.kind,
            self.start + 1,
            self.end,
            self.strand,
            attributes
        )
    }

    ///
    /// The owning gene of the segment.
    ///
    /// The `gene_id` attribute is used when present; otherwise the second
    /// token of the second `;` separated attribute field is taken.
    pub fn gene_id(&self) -> Option<String> {
        let unquote = |token: &str| token.trim_matches('"').to_string();

        let fields: Vec<&str> = self.attributes.split(';').map(str::trim).collect();
        for field in &fields {
            let mut tokens = field.split_whitespace();
            if tokens.next() == Some("gene_id") {
                return tokens.next().map(unquote);
            }
        }

        fields
            .get(1)
            .and_then(|field| field.split_whitespace().nth(1))
            .map(unquote)
    }
}

/// The three partitions of the segmentation used for thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionName {
    Intron,
    Intergenic,
    CdsUtrNcRna,
}

impl PartitionName {
    pub const ALL: [PartitionName; 3] = [
        PartitionName::Intron,
        PartitionName::Intergenic,
        PartitionName::CdsUtrNcRna,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionName::Intron => "intron",
            PartitionName::Intergenic => "intergenic",
            PartitionName::CdsUtrNcRna => "cds_utr_ncrna",
        }
    }

    fn admits(&self, kind: RegionKind) -> bool {
        match self {
            PartitionName::Intron => kind == RegionKind::Intron,
            PartitionName::Intergenic => kind == RegionKind::Intergenic,
            PartitionName::CdsUtrNcRna => matches!(
                kind,
                RegionKind::Cds | RegionKind::Utr5 | RegionKind::Utr3 | RegionKind::NcRna
            ),
        }
    }
}

impl Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One partition with its strand-aware index. The index payload is the
/// position of the region in `regions`.
pub struct Partition {
    pub name: PartitionName,
    pub regions: Vec<Region>,
    index: StrandedIndex<usize>,
}

impl Partition {
    fn new(name: PartitionName, regions: Vec<Region>) -> Self {
        let index = StrandedIndex::build(regions.iter().enumerate().map(|(idx, region)| {
            (
                region.chrom.clone(),
                region.strand,
                Interval {
                    start: region.start,
                    end: region.end,
                    val: idx,
                },
            )
        }));
        Partition {
            name,
            regions,
            index,
        }
    }

    /// Regions on `chrom`/`strand` overlapping `[start, end)`, ordered by
    /// coordinates.
    pub fn overlapping(&self, chrom: &str, strand: Strand, start: u32, end: u32) -> Vec<&Region> {
        let mut hits = self.index.find(chrom, strand, start, end);
        hits.sort();
        hits.into_iter().map(|hit| &self.regions[hit.val]).collect()
    }

    /// The region containing `pos`, see [`StrandedIndex::containing`].
    pub fn containing(&self, chrom: &str, strand: Strand, pos: u32) -> Option<&Region> {
        self.index
            .containing(chrom, strand, pos)
            .map(|hit| &self.regions[hit.val])
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn to_file<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for region in &self.regions {
            writeln!(writer, "{}", region.to_annotation_line())?;
        }
        writer.flush()
    }
}

/// Drop short exon-class segments and trim CDS ends.
pub fn filter_cds_utr_ncrna(regions: Vec<Region>) -> Vec<Region> {
    regions
        .into_iter()
        .filter(|region| PartitionName::CdsUtrNcRna.admits(region.kind))
        .filter(|region| region.trimmed || region.width() >= MIN_REGION_LENGTH)
        .map(|mut region| {
            if region.kind == RegionKind::Cds && !region.trimmed {
                region.start += CDS_TRIM;
                region.end -= CDS_TRIM;
                region.trimmed = true;
            }
            region
        })
        .collect()
}

/// Drop introns shorter than `min_size`.
pub fn filter_intron(regions: Vec<Region>, min_size: u32) -> Vec<Region> {
    regions
        .into_iter()
        .filter(|region| region.kind == RegionKind::Intron && region.width() >= min_size)
        .collect()
}

///
/// The partitioned segmentation the thresholding runs against.
///
pub struct RegionIndex {
    pub intron: Partition,
    pub intergenic: Partition,
    pub cds_utr_ncrna: Partition,
}

impl TryFrom<&Path> for RegionIndex {
    type Error = RegionError;

    ///
    /// Read a (optionally gzipped) segmentation annotation and partition it.
    /// Blank and `#` lines are skipped, any other line must have 9 fields.
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value).map_err(|e| {
            RegionError::Input(xlmotif_core::XlMotifError::FileReadError(format!("{:#}", e)))
        })?;

        let mut regions = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = Region::from_annotation_line(&line).map_err(|reason| {
                RegionError::MalformedAnnotation {
                    path: value.display().to_string(),
                    line: idx + 1,
                    reason,
                }
            })?;
            if let Some(region) = parsed {
                regions.push(region);
            }
        }

        Ok(RegionIndex::from_regions(regions))
    }
}

impl RegionIndex {
    pub fn from_regions(regions: Vec<Region>) -> Self {
        let (intergenic, rest): (Vec<Region>, Vec<Region>) = regions
            .into_iter()
            .partition(|region| region.kind == RegionKind::Intergenic);
        let (intron, exonic): (Vec<Region>, Vec<Region>) = rest
            .into_iter()
            .partition(|region| region.kind == RegionKind::Intron);

        RegionIndex {
            intron: Partition::new(PartitionName::Intron, filter_intron(intron, MIN_REGION_LENGTH)),
            intergenic: Partition::new(PartitionName::Intergenic, intergenic),
            cds_utr_ncrna: Partition::new(
                PartitionName::CdsUtrNcRna,
                filter_cds_utr_ncrna(exonic),
            ),
        }
    }

    pub fn partition(&self, name: PartitionName) -> &Partition {
        match name {
            PartitionName::Intron => &self.intron,
            PartitionName::Intergenic => &self.intergenic,
            PartitionName::CdsUtrNcRna => &self.cds_utr_ncrna,
        }
    }

    /// Every region kept by the partitioning, partition by partition.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        PartitionName::ALL
            .into_iter()
            .flat_map(|name| self.partition(name).regions.iter())
    }

    ///
    /// Write each partition to `{dir}/{partition}_regions.bed` and return the
    /// written paths in [`PartitionName::ALL`] order.
    pub fn persist(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        PartitionName::ALL
            .into_iter()
            .map(|name| {
                let path = dir.join(format!("{}_regions.bed", name));
                self.partition(name).to_file(&path)?;
                Ok(path)
            })
            .collect()
    }
}
