use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::errors::{Result, XlMotifError};
use crate::utils::get_dynamic_reader;

/// Name of the mitochondrial chromosome, never analysed.
pub const MITOCHONDRIAL_CHROM: &str = "chrM";

///
/// Chromosome length table. Chromosomes are kept sorted by name so that
/// genome-wide walks (complements, partition files) visit them in the same
/// order as a lexicographically sorted BED file.
///
#[derive(Debug, Clone, Default)]
pub struct ChromSizes {
    sizes: Vec<(String, u32)>,
    index: HashMap<String, u32>,
}

impl From<Vec<(String, u32)>> for ChromSizes {
    fn from(mut sizes: Vec<(String, u32)>) -> Self {
        sizes.sort_by(|a, b| a.0.cmp(&b.0));
        sizes.dedup_by(|a, b| a.0 == b.0);
        let index = sizes.iter().cloned().collect();
        ChromSizes { sizes, index }
    }
}

impl TryFrom<&Path> for ChromSizes {
    type Error = XlMotifError;

    ///
    /// Read a two column `chrom<TAB>length` table. Extra columns are
    /// ignored, so a FASTA `.fai` index can be used directly.
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value)
            .map_err(|e| XlMotifError::FileReadError(format!("{:#}", e)))?;

        let mut sizes = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let malformed = |reason: String| XlMotifError::MalformedRecord {
                path: value.display().to_string(),
                line: idx + 1,
                reason,
            };
            let chrom = fields
                .next()
                .ok_or_else(|| malformed("missing chromosome name".to_string()))?;
            let length = fields
                .next()
                .ok_or_else(|| malformed("missing chromosome length".to_string()))?
                .parse::<u32>()
                .map_err(|e| malformed(format!("invalid chromosome length: {}", e)))?;
            sizes.push((chrom.to_string(), length));
        }

        if sizes.is_empty() {
            return Err(XlMotifError::EmptyFile(value.display().to_string()));
        }

        Ok(ChromSizes::from(sizes))
    }
}

impl ChromSizes {
    pub fn get(&self, chrom: &str) -> Option<u32> {
        self.index.get(chrom).copied()
    }

    /// A chromosome takes part in the analysis when it has a known size and
    /// is not the mitochondrial genome.
    pub fn is_analysed(&self, chrom: &str) -> bool {
        chrom != MITOCHONDRIAL_CHROM && self.index.contains_key(chrom)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.sizes.iter().map(|(chrom, len)| (chrom.as_str(), *len))
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn to_file<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for (chrom, len) in &self.sizes {
            writeln!(writer, "{}\t{}", chrom, len)?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_read_fai_uses_first_two_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr2\t500\t6\t60\t61").unwrap();
        writeln!(file, "chr1\t1000\t520\t60\t61").unwrap();
        let sizes = ChromSizes::try_from(file.path()).unwrap();
        assert_eq!(sizes.get("chr1"), Some(1000));
        assert_eq!(sizes.get("chr2"), Some(500));
        let names: Vec<&str> = sizes.iter().map(|(c, _)| c).collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
    }

    #[rstest]
    fn test_bad_length_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\tlong").unwrap();
        assert!(matches!(
            ChromSizes::try_from(file.path()),
            Err(XlMotifError::MalformedRecord { line: 1, .. })
        ));
    }

    #[rstest]
    #[case("chr1", true)]
    #[case("chrM", false)]
    #[case("chrUn_random", false)]
    fn test_is_analysed(#[case] chrom: &str, #[case] expected: bool) {
        let sizes = ChromSizes::from(vec![
            ("chr1".to_string(), 10),
            ("chrM".to_string(), 10),
        ]);
        assert_eq!(sizes.is_analysed(chrom), expected);
    }

    #[rstest]
    fn test_to_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.sizes");
        let sizes = ChromSizes::from(vec![("chrB".to_string(), 7), ("chrA".to_string(), 3)]);
        sizes.to_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "chrA\t3\nchrB\t7\n");
    }
}
