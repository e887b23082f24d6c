/// Triangular window weights of length `m`, highest in the middle.
pub fn triangular_weights(m: usize) -> Vec<f64> {
    if m == 0 {
        return vec![];
    }
    let half = m.div_ceil(2);
    let rising: Vec<f64> = if m % 2 == 0 {
        (1..=half).map(|n| (2 * n - 1) as f64 / m as f64).collect()
    } else {
        (1..=half).map(|n| (2 * n) as f64 / (m + 1) as f64).collect()
    };
    let mut weights = rising.clone();
    let mirrored = if m % 2 == 0 {
        &rising[..]
    } else {
        &rising[..half - 1]
    };
    weights.extend(mirrored.iter().rev());
    weights
}

///
/// Centred triangular moving average with window `m`. The value at `i`
/// averages `values[i - m/2 ..= i + m - m/2 - 1]`. The first `m/2` and last
/// `m/2 + 1` values are dropped, so the result starts at index `m/2` of the
/// input. Empty when the input is too short.
///
pub fn smooth_triangular(values: &[f64], m: usize) -> Vec<f64> {
    let half = m / 2;
    if m == 0 || values.len() < 2 * half + 2 {
        return vec![];
    }
    let weights = triangular_weights(m);
    let total: f64 = weights.iter().sum();

    (half..values.len() - half - 1)
        .map(|i| {
            let start = i - half;
            values[start..start + m]
                .iter()
                .zip(&weights)
                .map(|(v, w)| v * w)
                .sum::<f64>()
                / total
        })
        .collect()
}

///
/// Centred plain moving average over `m` values, keeping only the positions
/// where the window is complete; the result starts at index `(m - 1) / 2`.
///
pub fn centred_mean(values: &[f64], m: usize) -> Vec<f64> {
    if m == 0 || values.len() < m {
        return vec![];
    }
    values
        .windows(m)
        .map(|w| w.iter().sum::<f64>() / m as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn assert_close(got: &[f64], expected: &[f64]) {
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < 1e-12, "{:?} != {:?}", got, expected);
        }
    }

    #[rstest]
    #[case(1, vec![1.0])]
    #[case(4, vec![0.25, 0.75, 0.75, 0.25])]
    #[case(5, vec![1.0 / 3.0, 2.0 / 3.0, 1.0, 2.0 / 3.0, 1.0 / 3.0])]
    #[case(6, vec![1.0 / 6.0, 0.5, 5.0 / 6.0, 5.0 / 6.0, 0.5, 1.0 / 6.0])]
    fn test_triangular_weights(#[case] m: usize, #[case] expected: Vec<f64>) {
        assert_close(&triangular_weights(m), &expected);
    }

    #[rstest]
    fn test_smooth_constant_is_constant() {
        let smoothed = smooth_triangular(&[2.0; 20], 6);
        // 3 dropped at the start, 4 at the end
        assert_eq!(smoothed.len(), 13);
        assert_close(&smoothed, &[2.0; 13]);
    }

    #[rstest]
    fn test_smooth_spike() {
        let mut values = vec![0.0; 12];
        values[5] = 12.0;
        // window of 4: index i averages i-2..=i+1 with weights 1,3,3,1 / 8
        let smoothed = smooth_triangular(&values, 4);
        assert_close(&smoothed, &[0.0, 0.0, 1.5, 4.5, 4.5, 1.5, 0.0]);
    }

    #[rstest]
    fn test_smooth_too_short() {
        assert!(smooth_triangular(&[1.0, 2.0, 3.0], 6).is_empty());
    }

    #[rstest]
    fn test_centred_mean() {
        let values: Vec<f64> = (0..8).map(|v| v as f64).collect();
        assert_close(&centred_mean(&values, 5), &[2.0, 3.0, 4.0, 5.0]);
    }
}
