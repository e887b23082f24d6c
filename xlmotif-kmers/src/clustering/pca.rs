//! Principal component scores.
//!
//! The centred data `X = U·S·Vᵀ` is decomposed with a thin SVD and projected
//! on the right singular vectors, so the scores are `X·V = U·S`.
use faer::Mat;
use ndarray::{Array1, Array2, Axis};

const TOLERANCE: f64 = 1e-12;

///
/// Project the rows of `data` (samples × features) on their first
/// `n_components` principal components. The number of components is capped
/// by the number of samples and features; components without variance are
/// left at zero.
///
/// Each component is oriented so that its largest-magnitude loading is
/// positive (the first one on ties), which keeps the scores stable across
/// runs and platforms.
///
pub fn pca_scores(data: &Array2<f64>, n_components: usize) -> Array2<f64> {
    let (n_samples, n_features) = data.dim();
    let n_components = n_components.min(n_samples).min(n_features);
    let mut scores = Array2::zeros((n_samples, n_components));
    if n_components == 0 {
        return scores;
    }

    let means = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(n_features));
    let centred = data - &means;

    let matrix = Mat::<f64>::from_fn(n_samples, n_features, |i, j| centred[[i, j]]);
    let svd = match matrix.thin_svd() {
        Ok(svd) => svd,
        Err(e) => {
            log::warn!("SVD did not converge ({:?}), PCA scores left at zero", e);
            return scores;
        }
    };
    let v = svd.V();

    let mut floor = None;
    for component in 0..n_components {
        let mut loadings = Array1::from_iter((0..n_features).map(|i| v[(i, component)]));
        if let Some(pivot) = largest_magnitude(&loadings) {
            if pivot < 0.0 {
                loadings.mapv_inplace(|x| -x);
            }
        }

        let projected = centred.dot(&loadings);
        let variance = projected.dot(&projected);
        let threshold = *floor.get_or_insert(TOLERANCE * variance.max(1.0));
        if variance <= threshold {
            break;
        }
        scores.column_mut(component).assign(&projected);
    }
    scores
}

/// The entry with the largest absolute value, the first one on ties.
fn largest_magnitude(values: &Array1<f64>) -> Option<f64> {
    values
        .iter()
        .copied()
        .fold(None, |best: Option<f64>, x| match best {
            Some(b) if b.abs() >= x.abs() => Some(b),
            _ => Some(x),
        })
}
