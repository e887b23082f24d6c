//! Kmer encoding and positional counting.
//!
//! Kmers are packed two bits per base (`A=0, C=1, G=2, T/U=3`), so the
//! code of a kmer is also its rank in lexicographic order and can index the
//! rows of a [`KmerProfile`] directly.
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;

use crate::errors::{KmerError, Result};

/// Letters used when rendering kmer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Dna,
    Rna,
}

impl Alphabet {
    fn letters(&self) -> [char; 4] {
        match self {
            Alphabet::Dna => ['A', 'C', 'G', 'T'],
            Alphabet::Rna => ['A', 'C', 'G', 'U'],
        }
    }
}

#[inline]
fn encode_base(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' | b'U' | b'u' => Some(3),
        _ => None,
    }
}

/// Code of a kmer, `None` when it holds anything but A, C, G, T or U.
pub fn encode_kmer(kmer: &[u8]) -> Option<usize> {
    kmer.iter()
        .try_fold(0usize, |code, base| encode_base(*base).map(|b| (code << 2) | b))
}

pub fn decode_kmer(code: usize, k: usize, alphabet: Alphabet) -> String {
    let letters = alphabet.letters();
    (0..k)
        .rev()
        .map(|i| letters[(code >> (2 * i)) & 3])
        .collect()
}

/// Every kmer of length `k` in lexicographic order.
pub fn all_kmers(k: usize, alphabet: Alphabet) -> Vec<String> {
    (0..1usize << (2 * k))
        .map(|code| decode_kmer(code, k, alphabet))
        .collect()
}

/// Position of a kmer relative to the site is reported for this base of it.
pub fn shift(k: usize) -> i32 {
    ((k + 1) / 2) as i32
}

///
/// Occurrences of every DNA kmer of length `k` in `sequences`, counted over
/// all offsets. Kmers with other characters are ignored.
///
pub fn count_kmers<S: AsRef<str>>(sequences: &[S], k: usize) -> Result<BTreeMap<String, u64>> {
    if k == 0 {
        return Err(KmerError::InvalidKmerLength);
    }
    let mut counts = vec![0u64; 1 << (2 * k)];
    for sequence in sequences {
        for window in sequence.as_ref().as_bytes().windows(k) {
            if let Some(code) = encode_kmer(window) {
                counts[code] += 1;
            }
        }
    }
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(code, count)| (decode_kmer(code, k, Alphabet::Dna), count))
        .collect())
}

///
/// Observed counts per million reference counts. A kmer absent from the
/// reference is normalised by one.
///
pub fn normalise_kmer_frequency(
    observed: &BTreeMap<String, u64>,
    reference: &BTreeMap<String, u64>,
) -> BTreeMap<String, f64> {
    observed
        .iter()
        .map(|(kmer, count)| {
            let count = *count as f64;
            let normalised = match reference.get(kmer) {
                Some(r) if *r > 0 => count / *r as f64 * 1e6,
                _ => count * 1e6,
            };
            (kmer.clone(), normalised)
        })
        .collect()
}

///
/// A table of values for all 4^k kmers over a contiguous range of positions
/// relative to the crosslink site. Rows are kmer codes, columns positions.
///
#[derive(Debug, Clone, PartialEq)]
pub struct KmerProfile {
    k: usize,
    first_pos: i32,
    values: Array2<f64>,
}

impl KmerProfile {
    ///
    /// An empty profile for `window`: positions
    /// `[-window + shift, window + shift]`.
    pub fn zeros(k: usize, window: u32) -> Self {
        let shift = shift(k);
        let window = window as i32;
        KmerProfile {
            k,
            first_pos: -window + shift,
            values: Array2::zeros((1 << (2 * k), (2 * window + 1) as usize)),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_kmers(&self) -> usize {
        self.values.nrows()
    }

    pub fn positions(&self) -> RangeInclusive<i32> {
        self.first_pos..=self.first_pos + self.values.ncols() as i32 - 1
    }

    /// Column of `pos`, `None` outside the profile.
    #[inline]
    pub fn column(&self, pos: i32) -> Option<usize> {
        let idx = pos - self.first_pos;
        (idx >= 0 && (idx as usize) < self.values.ncols()).then_some(idx as usize)
    }

    pub fn get(&self, code: usize, pos: i32) -> f64 {
        self.column(pos).map_or(0.0, |col| self.values[[code, col]])
    }

    pub fn row(&self, code: usize) -> ArrayView1<'_, f64> {
        self.values.row(code)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Value of `kmer` (either alphabet) at `pos`.
    pub fn get_kmer(&self, kmer: &str, pos: i32) -> f64 {
        encode_kmer(kmer.as_bytes()).map_or(0.0, |code| self.get(code, pos))
    }

    ///
    /// Add the kmers of one sequence. The kmer at offset `i` is counted at
    /// `i - window - k + shift`; offsets falling outside the profile are
    /// dropped. Every offset up to `len - k` is tried, so a sequence cut short
    /// by a chromosome end still contributes its last kmer.
    pub fn add_sequence(&mut self, sequence: &[u8]) {
        let k = self.k;
        if sequence.len() < k {
            return;
        }
        // window of the profile, recovered from its first position
        let window = shift(k) - self.first_pos;
        let offset_zero = -window - k as i32 + shift(k);

        for (i, kmer) in sequence.windows(k).enumerate() {
            let Some(col) = self.column(offset_zero + i as i32) else {
                continue;
            };
            if let Some(code) = encode_kmer(kmer) {
                self.values[[code, col]] += 1.0;
            }
        }
    }

    /// Same shape, each value replaced by `f(code, pos, value)`.
    pub fn map<F>(&self, f: F) -> KmerProfile
    where
        F: Fn(usize, i32, f64) -> f64,
    {
        let mut values = self.values.clone();
        for (code, mut row) in values.axis_iter_mut(Axis(0)).enumerate() {
            for (col, value) in row.iter_mut().enumerate() {
                *value = f(code, self.first_pos + col as i32, *value);
            }
        }
        KmerProfile {
            k: self.k,
            first_pos: self.first_pos,
            values,
        }
    }

    fn merge(mut self, other: KmerProfile) -> KmerProfile {
        self.values += &other.values;
        self
    }
}

///
/// Count, for every kmer of length `k`, how many times it starts at each
/// position relative to the site across `sequences`. Sequences are expected
/// to be `window + k` bases either side of the site.
///
/// For such a sequence of `2 * (window + k) + 1` bases the counted offsets
/// are `k..=2 * window + k`: the first `k` kmers and the last one fall
/// outside `[-window + shift, window + shift]`. Shorter sequences keep every
/// offset that maps inside the profile.
///
pub fn pos_count_kmer<S: AsRef<str> + Sync>(
    sequences: &[S],
    k: usize,
    window: u32,
) -> Result<KmerProfile> {
    if k == 0 {
        return Err(KmerError::InvalidKmerLength);
    }
    Ok(sequences
        .par_iter()
        .fold(
            || KmerProfile::zeros(k, window),
            |mut profile, sequence| {
                profile.add_sequence(sequence.as_ref().as_bytes());
                profile
            },
        )
        .reduce(|| KmerProfile::zeros(k, window), KmerProfile::merge))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("AAA", Some(0))]
    #[case("ACG", Some(6))]
    #[case("UUU", Some(63))]
    #[case("TTT", Some(63))]
    #[case("acg", Some(6))]
    #[case("ANA", None)]
    fn test_encode_kmer(#[case] kmer: &str, #[case] expected: Option<usize>) {
        assert_eq!(encode_kmer(kmer.as_bytes()), expected);
    }

    #[rstest]
    fn test_decode_kmer() {
        assert_eq!(decode_kmer(6, 3, Alphabet::Dna), "ACG");
        assert_eq!(decode_kmer(63, 3, Alphabet::Rna), "UUU");
    }

    #[rstest]
    #[case(1, 4)]
    #[case(3, 64)]
    #[case(5, 1024)]
    fn test_all_kmers(#[case] k: usize, #[case] n: usize) {
        let kmers = all_kmers(k, Alphabet::Rna);
        assert_eq!(kmers.len(), n);
        let mut sorted = kmers.clone();
        sorted.sort();
        assert_eq!(kmers, sorted);
    }

    #[rstest]
    #[case(3, 2)]
    #[case(4, 2)]
    #[case(5, 3)]
    fn test_shift(#[case] k: usize, #[case] expected: i32) {
        assert_eq!(shift(k), expected);
    }

    // ── plain counting ──────────────────────────────────────────────────

    #[rstest]
    fn test_count_kmers() {
        let counts = count_kmers(&["ACGTACGT"], 2).unwrap();
        assert_eq!(counts.len(), 16);
        for (kmer, count) in &counts {
            let expected = match kmer.as_str() {
                "AC" | "CG" | "GT" => 2,
                "TA" => 1,
                _ => 0,
            };
            assert_eq!(*count, expected, "{}", kmer);
        }
    }

    #[rstest]
    fn test_count_kmers_skips_unknown_bases() {
        let counts = count_kmers(&["AANAA"], 2).unwrap();
        assert_eq!(counts["AA"], 2);
        assert_eq!(counts.values().sum::<u64>(), 2);
    }

    #[rstest]
    fn test_count_kmers_rejects_zero_length() {
        assert!(matches!(
            count_kmers(&["ACGT"], 0),
            Err(KmerError::InvalidKmerLength)
        ));
    }

    #[rstest]
    fn test_normalise_kmer_frequency() {
        let observed: BTreeMap<String, u64> =
            [("AA".to_string(), 3), ("CC".to_string(), 2)].into_iter().collect();
        let reference: BTreeMap<String, u64> =
            [("AA".to_string(), 2), ("CC".to_string(), 0)].into_iter().collect();
        let normalised = normalise_kmer_frequency(&observed, &reference);
        assert_eq!(normalised["AA"], 1.5e6);
        assert_eq!(normalised["CC"], 2e6);
    }

    // ── positional counting ─────────────────────────────────────────────

    #[rstest]
    fn test_profile_shape() {
        let profile = KmerProfile::zeros(4, 40);
        assert_eq!(profile.n_kmers(), 256);
        assert_eq!(profile.positions(), -38..=42);
        assert_eq!(profile.column(-38), Some(0));
        assert_eq!(profile.column(43), None);
    }

    #[rstest]
    fn test_pos_count_kmer_all_kmers_present() {
        let profile = pos_count_kmer(&Vec::<String>::new(), 3, 10).unwrap();
        assert_eq!(profile.n_kmers(), 64);
        assert_eq!(profile.values().sum(), 0.0);
    }

    #[rstest]
    fn test_pos_count_kmer_positions() {
        // k = 2, window = 2: positions -1..=3, offset i lands on i - 3
        let seqs = ["AACCGG", "AACCTT", "AACCGG", "GGCCAA"];
        let profile = pos_count_kmer(&seqs, 2, 2).unwrap();

        assert_eq!(profile.positions(), -1..=3);
        assert_eq!(profile.get_kmer("CC", -1), 4.0);
        assert_eq!(profile.get_kmer("CG", 0), 2.0);
        assert_eq!(profile.get_kmer("CU", 0), 1.0);
        assert_eq!(profile.get_kmer("GG", 1), 2.0);
        // kmers at offsets 0 and 1 lie before the window
        assert_eq!(profile.get_kmer("AA", 1), 1.0);
        assert_eq!(profile.row(0).sum(), 1.0);
    }

    #[rstest]
    fn test_pos_count_kmer_site_centred() {
        // window + k bases either side of the site, site base is 'G'
        let k = 3;
        let window = 4;
        let seq = format!("{}{}{}", "A".repeat(7), "GCC", "A".repeat(5));
        let profile = pos_count_kmer(&[seq], k, window).unwrap();
        assert_eq!(profile.get_kmer("GCC", shift(k)), 1.0);
    }

    #[rstest]
    fn test_pos_count_kmer_skips_non_acgt() {
        let profile = pos_count_kmer(&["NNNNNN"], 2, 2).unwrap();
        assert_eq!(profile.values().sum(), 0.0);
    }

    #[rstest]
    fn test_map_keeps_shape() {
        let profile = pos_count_kmer(&["AACCGG"], 2, 2).unwrap();
        let doubled = profile.map(|_, _, v| v * 2.0);
        assert_eq!(doubled.positions(), profile.positions());
        assert_eq!(doubled.get_kmer("CC", -1), 2.0);
    }

    #[rstest]
    #[case(6)]
    #[case(10)]
    fn test_pos_count_kmer_first_position(#[case] window: u32) {
        let k = 2;
        let seqs = ["AACG", "AATT", "AAGC", "CGAA"];
        let starting_with_aa = seqs.iter().filter(|s| s.starts_with("AA")).count() as f64;
        let first = -(window as i32) + shift(k);

        // the first k offsets are flank and land before the profile
        let raw = pos_count_kmer(&seqs, k, window).unwrap();
        assert_eq!(*raw.positions().start(), first);
        assert_eq!(raw.get_kmer("AA", first), 1.0);
        assert_eq!(raw.row(0).sum(), 1.0);

        let flanked: Vec<String> = seqs
            .iter()
            .map(|s| format!("{}{}", "N".repeat(k), s))
            .collect();
        let profile = pos_count_kmer(&flanked, k, window).unwrap();
        assert_eq!(profile.get_kmer("AA", first), starting_with_aa);
        assert_eq!(profile.get_kmer("AA", first + 2), 1.0);
    }

    #[rstest]
    fn test_pos_count_kmer_truncated_sequence_keeps_last_kmer() {
        // two bases short of 2 * (window + k) + 1
        let profile = pos_count_kmer(&["NNACGTA"], 2, 2).unwrap();
        assert_eq!(profile.get_kmer("AC", -1), 1.0);
        assert_eq!(profile.get_kmer("CG", 0), 1.0);
        assert_eq!(profile.get_kmer("GT", 1), 1.0);
        assert_eq!(profile.get_kmer("TA", 2), 1.0);
        assert_eq!(profile.values().sum(), 4.0);
    }
}
