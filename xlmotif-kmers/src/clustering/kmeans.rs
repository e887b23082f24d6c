//! Lloyd's k-means with k-means++ seeding and several restarts.
use ndarray::{Array2, ArrayView1, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

pub const KMEANS_SEED: u64 = 4242;
pub const KMEANS_RESTARTS: usize = 10;
pub const KMEANS_MAX_ITERATIONS: usize = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster of every row.
    pub labels: Vec<usize>,
    pub centroids: Array2<f64>,
    /// Sum of squared distances of rows to their centroid.
    pub inertia: f64,
}

#[inline]
fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(point: ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
    centroids
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(idx, c)| (idx, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// k-means++ seeding: each next centroid is drawn with probability
/// proportional to its squared distance from the chosen ones.
fn init_centroids(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut chosen = vec![rng.gen_range(0..n)];
    let mut distances: Vec<f64> = data
        .axis_iter(Axis(0))
        .map(|row| squared_distance(row, data.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let next = match WeightedIndex::new(&distances) {
            Ok(dist) => dist.sample(rng),
            // every point already coincides with a centroid
            Err(_) => rng.gen_range(0..n),
        };
        chosen.push(next);
        for (idx, row) in data.axis_iter(Axis(0)).enumerate() {
            distances[idx] = distances[idx].min(squared_distance(row, data.row(next)));
        }
    }
    data.select(Axis(0), &chosen)
}

fn lloyd(data: &Array2<f64>, mut centroids: Array2<f64>, max_iterations: usize) -> KMeansResult {
    let (n, k) = (data.nrows(), centroids.nrows());
    let mut labels = vec![usize::MAX; n];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (idx, row) in data.axis_iter(Axis(0)).enumerate() {
            let (label, _) = nearest(row, &centroids);
            if labels[idx] != label {
                labels[idx] = label;
                changed = true;
            }
        }

        // an empty cluster takes over the point farthest from its centroid
        for cluster in 0..k {
            if labels.contains(&cluster) {
                continue;
            }
            let farthest = (0..n)
                .filter(|idx| labels.iter().filter(|l| **l == labels[*idx]).count() > 1)
                .map(|idx| (idx, squared_distance(data.row(idx), centroids.row(labels[idx]))))
                .fold(None, |best: Option<(usize, f64)>, cur| match best {
                    Some(b) if b.1 >= cur.1 => Some(b),
                    _ => Some(cur),
                });
            if let Some((idx, _)) = farthest {
                labels[idx] = cluster;
                changed = true;
            }
        }

        for cluster in 0..k {
            let members: Vec<usize> = (0..n).filter(|idx| labels[*idx] == cluster).collect();
            if members.is_empty() {
                continue;
            }
            let mean = data
                .select(Axis(0), &members)
                .mean_axis(Axis(0))
                .unwrap_or_else(|| centroids.row(cluster).to_owned());
            centroids.row_mut(cluster).assign(&mean);
        }

        if !changed {
            break;
        }
    }

    let inertia = data
        .axis_iter(Axis(0))
        .zip(&labels)
        .map(|(row, label)| squared_distance(row, centroids.row(*label)))
        .sum();

    KMeansResult {
        labels,
        centroids,
        inertia,
    }
}

///
/// Cluster the rows of `data` into `k` groups. `k` is capped by the number of
/// rows; the run with the lowest inertia among `restarts` seedings is kept.
///
pub fn kmeans(
    data: &Array2<f64>,
    k: usize,
    restarts: usize,
    max_iterations: usize,
    seed: u64,
) -> KMeansResult {
    let n = data.nrows();
    let k = k.min(n);
    if k == 0 {
        return KMeansResult {
            labels: vec![],
            centroids: Array2::zeros((0, data.ncols())),
            inertia: 0.0,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut best: Option<KMeansResult> = None;
    for _ in 0..restarts.max(1) {
        let centroids = init_centroids(data, k, &mut rng);
        let result = lloyd(data, centroids, max_iterations);
        if best.as_ref().is_none_or(|b| result.inertia < b.inertia) {
            best = Some(result);
        }
    }
    best.unwrap_or_else(|| lloyd(data, init_centroids(data, k, &mut rng), max_iterations))
}
