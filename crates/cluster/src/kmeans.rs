use crate::error::{ClusterError, Result};
use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Iteration bound for the relocation loop.
pub const MAX_ITERATIONS: usize = 100;

const MIN_CLUSTERS: usize = 5;
const MAX_CLUSTERS: usize = 20;

/// Output of one partitioning run: a cluster index per input vector plus the
/// final centroids. Cluster ids live in `[0, k)`; a cluster may end up with
/// no members and is filtered by the caller.
#[derive(Debug, Clone)]
pub struct Partition {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
}

impl Partition {
    /// Member indices grouped per cluster id, empty clusters included.
    #[must_use]
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.centroids.len()];
        for (index, &cluster) in self.assignments.iter().enumerate() {
            members[cluster].push(index);
        }
        members
    }
}

/// Cluster-count heuristic: one cluster per ten tickets, bounded so small
/// batches still split and large ones stay readable.
#[must_use]
pub fn choose_k(ticket_count: usize) -> usize {
    (ticket_count / 10).clamp(MIN_CLUSTERS, MAX_CLUSTERS)
}

/// Partition `vectors` into `k` groups by iterative centroid relocation.
///
/// Initialization is seeded, so a fixed seed reproduces the run; across
/// seeds only permutation-invariant properties (member sets) are stable.
/// `k` larger than the input count is allowed and yields empty clusters.
pub fn partition(vectors: &[Vec<f32>], k: usize, seed: u64) -> Result<Partition> {
    if vectors.is_empty() {
        return Err(ClusterError::NoVectors);
    }
    if k == 0 {
        return Err(ClusterError::InvalidK(k));
    }

    let dim = vectors[0].len();
    for vector in vectors {
        if vector.len() != dim {
            return Err(ClusterError::InvalidDimension {
                expected: dim,
                actual: vector.len(),
            });
        }
    }

    let n = vectors.len();
    let mut data = Array2::<f32>::zeros((n, dim));
    for (row, vector) in vectors.iter().enumerate() {
        for (col, value) in vector.iter().enumerate() {
            data[(row, col)] = *value;
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = initial_centroids(&data, k, &mut rng);

    let mut assignments = assign_all(&data, &centroids);
    for iteration in 0..MAX_ITERATIONS {
        recompute_centroids(&data, &assignments, &mut centroids);

        let next = assign_all(&data, &centroids);
        let stable = next == assignments;
        assignments = next;
        if stable {
            log::debug!("k-means converged after {} iterations", iteration + 1);
            break;
        }
    }

    let centroids = centroids.axis_iter(Axis(0)).map(|row| row.to_vec()).collect();
    Ok(Partition {
        assignments,
        centroids,
    })
}

/// Seeded pick of starting centroids: distinct input rows while they last,
/// repeats once `k` exceeds the input count.
fn initial_centroids(data: &Array2<f32>, k: usize, rng: &mut StdRng) -> Array2<f32> {
    let n = data.nrows();
    let mut centroids = Array2::<f32>::zeros((k, data.ncols()));

    if k <= n {
        for (row, index) in rand::seq::index::sample(rng, n, k).into_iter().enumerate() {
            centroids.row_mut(row).assign(&data.row(index));
        }
    } else {
        for row in 0..k {
            let index = rng.gen_range(0..n);
            centroids.row_mut(row).assign(&data.row(index));
        }
    }

    centroids
}

fn assign_all(data: &Array2<f32>, centroids: &Array2<f32>) -> Vec<usize> {
    data.axis_iter(Axis(0))
        .map(|point| nearest_centroid(point, centroids))
        .collect()
}

fn nearest_centroid(point: ArrayView1<f32>, centroids: &Array2<f32>) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (index, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best = index;
            best_dist = dist;
        }
    }
    best
}

fn squared_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).fold(0.0, |acc, (x, y)| {
        let d = x - y;
        acc + d * d
    })
}

/// Move each centroid to the mean of its members. A cluster with no members
/// keeps its previous centroid.
fn recompute_centroids(data: &Array2<f32>, assignments: &[usize], centroids: &mut Array2<f32>) {
    let k = centroids.nrows();
    let mut sums = Array2::<f32>::zeros((k, data.ncols()));
    let mut counts = vec![0usize; k];

    for (index, point) in data.axis_iter(Axis(0)).enumerate() {
        let cluster = assignments[index];
        let mut row = sums.row_mut(cluster);
        row += &point;
        counts[cluster] += 1;
    }

    for cluster in 0..k {
        if counts[cluster] == 0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = counts[cluster] as f32;
        let mut row = centroids.row_mut(cluster);
        row.assign(&sums.row(cluster));
        row.mapv_inplace(|value| value / count);
    }
}
