//! Seeded train/test partitioning.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Positions (into the sample list) of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Held-out size: `ceil(n * fraction)`, keeping at least one row on each side
/// when `n >= 2`.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    if n < 2 {
        return 0;
    }
    let wanted = (n as f64 * test_fraction).ceil() as usize;
    wanted.clamp(1, n - 1)
}

/// Shuffle `0..n` with `seed` and hold out the first [`test_size`] positions.
pub fn shuffle_split(n: usize, test_fraction: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let n_test = test_size(n, test_fraction);
    let train = order.split_off(n_test);
    Split { train, test: order }
}

/// Like [`shuffle_split`], but each label keeps its share of the held-out
/// partition. Per-label test counts are the proportional floor, with the
/// remaining slots going to the largest remainders.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> Split {
    let n = labels.len();
    let n_test = test_size(n, test_fraction);

    let mut by_label: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(i);
    }

    let allocation = allocate(&by_label, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for ((_, members), take) in by_label.iter().zip(allocation) {
        let mut members = members.clone();
        members.shuffle(&mut rng);
        let rest = members.split_off(take);
        test.extend(members);
        train.extend(rest);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Split { train, test }
}

/// Largest-remainder allocation of `n_test` slots over the label groups.
fn allocate(by_label: &BTreeMap<u8, Vec<usize>>, n: usize, n_test: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let exact: Vec<f64> = by_label
        .values()
        .map(|members| n_test as f64 * members.len() as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut by_remainder: Vec<usize> = (0..exact.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });

    let sizes: Vec<usize> = by_label.values().map(Vec::len).collect();
    let mut left = n_test.saturating_sub(alloc.iter().sum());
    for &i in by_remainder.iter().cycle().take(exact.len() * 2) {
        if left == 0 {
            break;
        }
        if alloc[i] < sizes[i] {
            alloc[i] += 1;
            left -= 1;
        }
    }
    alloc
}
