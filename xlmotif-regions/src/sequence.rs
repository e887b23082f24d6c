//! Strand-aware sequence extraction around crosslink sites.
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use bio::alphabets::dna;
use bio::io::fasta;

use xlmotif_core::models::{ChromSizes, IntervalSet, Strand};
use xlmotif_overlaprs::IntervalRanges;

use crate::errors::{RegionError, Result};

/// Source of genomic sequence.
pub trait SequenceStore {
    /// Lengths of every sequence in the store.
    fn chrom_sizes(&self) -> ChromSizes;

    /// Forward strand bases of `chrom` in `[start, end)`.
    fn fetch(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<u8>>;
}

///
/// A FASTA file read through its `.fai` index; only requested ranges are
/// loaded.
///
pub struct IndexedGenome {
    reader: fasta::IndexedReader<File>,
    sizes: ChromSizes,
}

impl IndexedGenome {
    pub fn from_paths(fasta_path: &Path, fai_path: &Path) -> Result<Self> {
        let index = fasta::Index::from_file(&fai_path).map_err(|e| {
            RegionError::GenomeReadError(format!("{}: {}", fai_path.display(), e))
        })?;

        let sizes = ChromSizes::from(
            index
                .sequences()
                .into_iter()
                .map(|seq| (seq.name, seq.len as u32))
                .collect::<Vec<_>>(),
        );

        let file = File::open(fasta_path).map_err(|e| {
            RegionError::GenomeReadError(format!("{}: {}", fasta_path.display(), e))
        })?;

        Ok(IndexedGenome {
            reader: fasta::IndexedReader::with_index(file, index),
            sizes,
        })
    }
}

impl SequenceStore for IndexedGenome {
    fn chrom_sizes(&self) -> ChromSizes {
        self.sizes.clone()
    }

    fn fetch(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<u8>> {
        let chrom_len = self
            .sizes
            .get(chrom)
            .ok_or_else(|| RegionError::UnknownChrom(chrom.to_string()))?;
        if start > end || end > chrom_len {
            return Err(RegionError::InvalidRange {
                chrom: chrom.to_string(),
                start,
                end,
            });
        }

        let mut seq = Vec::with_capacity((end - start) as usize);
        self.reader
            .fetch(chrom, start as u64, end as u64)
            .and_then(|_| self.reader.read(&mut seq))
            .map_err(|e| RegionError::GenomeReadError(format!("{}:{}-{}: {}", chrom, start, end, e)))?;
        Ok(seq)
    }
}

/// A genome held fully in memory.
pub struct GenomeAssembly {
    seq_map: HashMap<String, Vec<u8>>,
}

impl TryFrom<&Path> for GenomeAssembly {
    type Error = RegionError;

    ///
    /// Read every record of a FASTA file into memory.
    ///
    fn try_from(value: &Path) -> Result<GenomeAssembly> {
        let file = File::open(value)?;
        let genome = fasta::Reader::new(file);

        let mut seq_map: HashMap<String, Vec<u8>> = HashMap::new();
        for record in genome.records() {
            match record {
                Ok(record) => {
                    seq_map.insert(record.id().to_string(), record.seq().to_owned());
                }
                Err(e) => {
                    return Err(RegionError::GenomeReadError(format!(
                        "{}: {}",
                        value.display(),
                        e
                    )));
                }
            }
        }

        Ok(GenomeAssembly { seq_map })
    }
}

impl From<Vec<(String, Vec<u8>)>> for GenomeAssembly {
    fn from(value: Vec<(String, Vec<u8>)>) -> Self {
        GenomeAssembly {
            seq_map: value.into_iter().collect(),
        }
    }
}

impl GenomeAssembly {
    pub fn contains_chr(&self, chr: &str) -> bool {
        self.seq_map.contains_key(chr)
    }
}

impl SequenceStore for GenomeAssembly {
    fn chrom_sizes(&self) -> ChromSizes {
        ChromSizes::from(
            self.seq_map
                .iter()
                .map(|(chrom, seq)| (chrom.clone(), seq.len() as u32))
                .collect::<Vec<_>>(),
        )
    }

    fn fetch(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<u8>> {
        let seq = self
            .seq_map
            .get(chrom)
            .ok_or_else(|| RegionError::UnknownChrom(chrom.to_string()))?;
        if end as usize <= seq.len() && start <= end {
            Ok(seq[start as usize..end as usize].to_vec())
        } else {
            Err(RegionError::InvalidRange {
                chrom: chrom.to_string(),
                start,
                end,
            })
        }
    }
}

///
/// Pulls the flanking sequence of sites out of a [`SequenceStore`].
///
pub struct SequenceExtractor<S: SequenceStore> {
    store: S,
    sizes: ChromSizes,
}

impl<S: SequenceStore> SequenceExtractor<S> {
    pub fn new(store: S) -> Self {
        let sizes = store.chrom_sizes();
        SequenceExtractor { store, sizes }
    }

    pub fn chrom_sizes(&self) -> &ChromSizes {
        &self.sizes
    }

    ///
    /// Sequences of `sites` extended by `left` bases upstream and `right`
    /// bases downstream in genome coordinates, clamped to the chromosome.
    /// With `merge`, overlapping windows of a strand are fused first.
    /// Minus strand windows are reverse complemented and every sequence is
    /// upper-cased.
    pub fn extract(
        &mut self,
        sites: &IntervalSet,
        left: u32,
        right: u32,
        merge: bool,
    ) -> Result<Vec<String>> {
        if let Some(site) = sites.iter().find(|site| self.sizes.get(&site.chrom).is_none()) {
            return Err(RegionError::UnknownChrom(site.chrom.clone()));
        }

        let mut sorted = sites.clone();
        sorted.intervals.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });

        let mut windows = sorted.slop(left, right, &self.sizes);
        if merge {
            windows = windows.reduce();
        }

        let mut sequences = Vec::with_capacity(windows.len());
        for window in windows.iter() {
            let mut seq = self.store.fetch(&window.chrom, window.start, window.end)?;
            seq.make_ascii_uppercase();
            if window.strand == Strand::Minus {
                seq = dna::revcomp(&seq);
            }
            sequences.push(String::from_utf8_lossy(&seq).into_owned());
        }

        log::debug!(
            "Extracted {} sequences (-{}/+{}) for {} sites",
            sequences.len(),
            left,
            right,
            sites.len()
        );
        Ok(sequences)
    }
}
