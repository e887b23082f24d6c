use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Derive the sample name used to prefix every output file from the path of
/// the crosslink sites file: the file name with `.gz`, `.bed` and `.xl`
/// removed.
///
pub fn sample_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    file_name
        .replace(".gz", "")
        .replace(".bed", "")
        .replace(".xl", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::BufRead;
    use std::path::PathBuf;

    #[rstest]
    #[case("/data/hnrnpc_rep1.xl.bed.gz", "hnrnpc_rep1")]
    #[case("sample.bed", "sample")]
    #[case("relative/dir/tdp43.xl.bed", "tdp43")]
    #[case("plain", "plain")]
    fn test_sample_name(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(sample_name(Path::new(path)), expected);
    }

    #[rstest]
    fn test_dynamic_reader_reads_gzip() {
        let path = PathBuf::from("../tests/data/sites/sample.xl.bed.gz");
        let reader = get_dynamic_reader(&path).unwrap();
        let first = reader.lines().next().unwrap().unwrap();
        assert!(first.starts_with("chr1\t"));
    }

    #[rstest]
    fn test_dynamic_reader_missing_file() {
        let err = get_dynamic_reader(Path::new("does/not/exist.bed")).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to open file"));
    }
}
