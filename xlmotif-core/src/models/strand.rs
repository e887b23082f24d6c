use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::XlMotifError;

/// Strand of a stranded genomic record. Unstranded records are not part of
/// the crosslink model; every site and region belongs to one strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }
}

impl FromStr for Strand {
    type Err = XlMotifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            other => Err(XlMotifError::InvalidStrand(other.to_string())),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("+", Strand::Plus)]
    #[case("-", Strand::Minus)]
    fn test_parse_strand(#[case] raw: &str, #[case] expected: Strand) {
        assert_eq!(raw.parse::<Strand>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[rstest]
    #[case(".")]
    #[case("")]
    #[case("plus")]
    fn test_parse_strand_rejects_unstranded(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<Strand>(),
            Err(XlMotifError::InvalidStrand(_))
        ));
    }

    #[rstest]
    fn test_plus_sorts_before_minus() {
        assert!(Strand::Plus < Strand::Minus);
    }
}
