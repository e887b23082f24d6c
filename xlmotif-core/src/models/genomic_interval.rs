use std::fmt::{self, Display};

use crate::models::Strand;

///
/// A stranded, scored interval in 0-based half-open coordinates. This is the
/// BED6 record every stage passes around: crosslink sites, peaks and the
/// windows extended around them.
///
#[derive(Debug, Clone, PartialEq)]
pub struct GenomicInterval {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub name: String,
    pub score: f64,
    pub strand: Strand,
}

impl GenomicInterval {
    pub fn new(chrom: &str, start: u32, end: u32, strand: Strand) -> Self {
        GenomicInterval {
            chrom: chrom.to_string(),
            start,
            end,
            name: ".".to_string(),
            score: 0.0,
            strand,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Key used to collapse duplicated records of the same site.
    pub fn locus(&self) -> (String, u32, u32, Strand) {
        (self.chrom.clone(), self.start, self.end, self.strand)
    }

    ///
    /// Parse one BED6 line. Columns past the sixth are ignored and a `.`
    /// score is read as zero.
    ///
    /// Returns the reason as a plain string so callers can attach file and
    /// line information.
    pub fn from_bed_line(line: &str) -> Result<Self, String> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 6 {
            return Err(format!(
                "expected 6 tab separated columns, found {}",
                parts.len()
            ));
        }

        let start = parts[1]
            .parse::<u32>()
            .map_err(|e| format!("error in parsing start position '{}': {}", parts[1], e))?;
        let end = parts[2]
            .parse::<u32>()
            .map_err(|e| format!("error in parsing end position '{}': {}", parts[2], e))?;
        if end < start {
            return Err(format!("end {} is smaller than start {}", end, start));
        }

        let score = match parts[4] {
            "." => 0.0,
            raw => raw
                .parse::<f64>()
                .map_err(|e| format!("error in parsing score '{}': {}", raw, e))?,
        };

        let strand = parts[5].parse::<Strand>().map_err(|e| e.to_string())?;

        Ok(GenomicInterval {
            chrom: parts[0].to_string(),
            start,
            end,
            name: parts[3].to_string(),
            score,
            strand,
        })
    }

    pub fn to_bed_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom, self.start, self.end, self.name, self.score, self.strand
        )
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}({})", self.chrom, self.start, self.end, self.strand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parse_bed6_line() {
        let site = GenomicInterval::from_bed_line("chr1\t10\t11\t.\t3.5\t-").unwrap();
        assert_eq!(site.chrom, "chr1");
        assert_eq!(site.start, 10);
        assert_eq!(site.end, 11);
        assert_eq!(site.score, 3.5);
        assert_eq!(site.strand, Strand::Minus);
    }

    #[rstest]
    fn test_parse_dot_score_as_zero() {
        let peak = GenomicInterval::from_bed_line("chr2\t0\t50\tpeak1\t.\t+").unwrap();
        assert_eq!(peak.score, 0.0);
        assert_eq!(peak.name, "peak1");
    }

    #[rstest]
    #[case("chr1\t10\t11\t.\t1", "expected 6")]
    #[case("chr1\tten\t11\t.\t1\t+", "start")]
    #[case("chr1\t10\t11\t.\tmany\t+", "score")]
    #[case("chr1\t10\t5\t.\t1\t+", "smaller")]
    #[case("chr1\t10\t11\t.\t1\t.", "strand")]
    fn test_parse_bed6_line_errors(#[case] line: &str, #[case] reason: &str) {
        let err = GenomicInterval::from_bed_line(line).unwrap_err();
        assert!(err.contains(reason), "'{}' does not mention '{}'", err, reason);
    }

    #[rstest]
    fn test_bed_line_round_trip_keeps_columns() {
        let line = "chr3\t5\t6\tx\t2\t+";
        let site = GenomicInterval::from_bed_line(line).unwrap();
        assert_eq!(site.to_bed_line(), line);
        assert_eq!(site.to_string(), "chr3:5-6(+)");
    }
}
