use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::{Result, XlMotifError};
use crate::models::{ChromSizes, GenomicInterval};
use crate::utils::get_dynamic_reader;

///
/// IntervalSet struct, the in-memory representation of a BED6 file such as
/// crosslink sites or peaks.
///
#[derive(Clone, Debug, Default)]
pub struct IntervalSet {
    pub intervals: Vec<GenomicInterval>,
    pub path: Option<PathBuf>,
}

impl TryFrom<&Path> for IntervalSet {
    type Error = XlMotifError;

    ///
    /// Create a new [IntervalSet] from a (optionally gzipped) BED6 file.
    ///
    /// `track`, `browser` and `#` lines are skipped. Any other line that
    /// does not parse as BED6 fails the whole file.
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value)
            .map_err(|e| XlMotifError::FileReadError(format!("{:#}", e)))?;

        let mut intervals = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty()
                || line.starts_with("track")
                || line.starts_with("browser")
                || line.starts_with('#')
            {
                continue;
            }

            let interval =
                GenomicInterval::from_bed_line(&line).map_err(|reason| {
                    XlMotifError::MalformedRecord {
                        path: value.display().to_string(),
                        line: idx + 1,
                        reason,
                    }
                })?;
            intervals.push(interval);
        }

        if intervals.is_empty() {
            return Err(XlMotifError::EmptyFile(value.display().to_string()));
        }

        Ok(IntervalSet {
            intervals,
            path: Some(value.to_owned()),
        })
    }
}

impl TryFrom<&str> for IntervalSet {
    type Error = XlMotifError;

    fn try_from(value: &str) -> Result<Self> {
        IntervalSet::try_from(Path::new(value))
    }
}

impl TryFrom<String> for IntervalSet {
    type Error = XlMotifError;

    fn try_from(value: String) -> Result<Self> {
        IntervalSet::try_from(Path::new(&value))
    }
}

impl From<Vec<GenomicInterval>> for IntervalSet {
    fn from(intervals: Vec<GenomicInterval>) -> Self {
        IntervalSet {
            intervals,
            path: None,
        }
    }
}

impl IntervalSet {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenomicInterval> {
        self.intervals.iter()
    }

    /// Stable sort by chromosome, start and strand.
    pub fn sort(&mut self) {
        self.intervals.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.start.cmp(&b.start))
                .then(a.strand.cmp(&b.strand))
        });
    }

    ///
    /// Drop intervals on chromosomes the size table excludes from the
    /// analysis (unknown chromosomes and the mitochondrial genome).
    ///
    /// Returns the number of removed intervals.
    pub fn retain_analysed_chroms(&mut self, chrom_sizes: &ChromSizes) -> usize {
        let before = self.intervals.len();
        self.intervals
            .retain(|interval| chrom_sizes.is_analysed(&interval.chrom));
        before - self.intervals.len()
    }

    ///
    /// Save the set to disk as a BED6 file, creating parent directories.
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    pub fn to_bed<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for interval in &self.intervals {
            writeln!(writer, "{}", interval.to_bed_line())?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strand;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data/sites")
            .join(file_name)
    }

    #[rstest]
    fn test_open_from_path() {
        let path = get_test_path("sample.xl.bed");
        let set = IntervalSet::try_from(path.as_path()).unwrap();
        assert_eq!(set.len(), 8);
        assert_eq!(set.intervals[0].chrom, "chr1");
    }

    #[rstest]
    fn test_open_gzipped_path() {
        let path = get_test_path("sample.xl.bed.gz");
        let plain = IntervalSet::try_from(get_test_path("sample.xl.bed").as_path()).unwrap();
        let gz = IntervalSet::try_from(path.as_path()).unwrap();
        assert_eq!(gz.intervals, plain.intervals);
    }

    #[rstest]
    fn test_open_from_string() {
        let path = get_test_path("sample.xl.bed");
        assert!(IntervalSet::try_from(path.to_str().unwrap()).is_ok());
    }

    #[rstest]
    fn test_skips_track_and_comment_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "track name=sites").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "chr1\t1\t2\t.\t4\t+").unwrap();
        let set = IntervalSet::try_from(file.path()).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    fn test_malformed_line_reports_position() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t1\t2\t.\t4\t+").unwrap();
        writeln!(file, "chr1\t1\t2\t.\t4").unwrap();
        let err = IntervalSet::try_from(file.path()).unwrap_err();
        match err {
            XlMotifError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[rstest]
    fn test_empty_file_is_error() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            IntervalSet::try_from(file.path()),
            Err(XlMotifError::EmptyFile(_))
        ));
    }

    #[rstest]
    fn test_sort_by_chrom_start_strand() {
        let mut set = IntervalSet::from(vec![
            GenomicInterval::new("chr2", 5, 6, Strand::Plus),
            GenomicInterval::new("chr1", 9, 10, Strand::Minus),
            GenomicInterval::new("chr1", 9, 10, Strand::Plus),
            GenomicInterval::new("chr1", 3, 4, Strand::Minus),
        ]);
        set.sort();
        let order: Vec<String> = set.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            order,
            vec!["chr1:3-4(-)", "chr1:9-10(+)", "chr1:9-10(-)", "chr2:5-6(+)"]
        );
    }

    #[rstest]
    fn test_retain_analysed_chroms() {
        let sizes = ChromSizes::from(vec![("chr1".to_string(), 100), ("chrM".to_string(), 50)]);
        let mut set = IntervalSet::from(vec![
            GenomicInterval::new("chr1", 5, 6, Strand::Plus),
            GenomicInterval::new("chrM", 5, 6, Strand::Plus),
            GenomicInterval::new("chrUn", 5, 6, Strand::Plus),
        ]);
        assert_eq!(set.retain_analysed_chroms(&sizes), 2);
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    fn test_to_bed_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.bed");
        let set = IntervalSet::from(vec![GenomicInterval::new("chr1", 5, 6, Strand::Minus)]);
        set.to_bed(&out).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, "chr1\t5\t6\t.\t0\t-\n");
    }
}
