use std::fmt::{self, Display};
use std::str::FromStr;

/// Feature classes of a genome segmentation. Annotation lines with any other
/// feature are not part of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionKind {
    Intron,
    Cds,
    Utr5,
    Utr3,
    NcRna,
    Intergenic,
}

impl RegionKind {
    pub const ALL: [RegionKind; 6] = [
        RegionKind::Intron,
        RegionKind::Cds,
        RegionKind::Utr5,
        RegionKind::Utr3,
        RegionKind::NcRna,
        RegionKind::Intergenic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Intron => "intron",
            RegionKind::Cds => "CDS",
            RegionKind::Utr5 => "UTR5",
            RegionKind::Utr3 => "UTR3",
            RegionKind::NcRna => "ncRNA",
            RegionKind::Intergenic => "intergenic",
        }
    }
}

impl FromStr for RegionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown region kind: {}", s))
    }
}

impl Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
