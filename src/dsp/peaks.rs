//! Local-maximum peak picking with height and distance constraints.

/// Find peaks in `x` that reach `min_height` and lie at least `min_dist`
/// samples apart.
///
/// A peak is a sample strictly higher than its left neighbour and higher than
/// the first differing sample to its right; flat tops resolve to their middle
/// sample and the two end samples are never peaks. When peaks are closer than
/// `min_dist`, the higher one wins. Indices are returned in ascending order.
pub fn find_peaks(x: &[f64], min_height: f64, min_dist: usize) -> Vec<usize> {
    let peaks: Vec<usize> = local_maxima(x)
        .into_iter()
        .filter(|&i| x[i] >= min_height)
        .collect();
    if min_dist <= 1 {
        return peaks;
    }
    select_by_distance(&peaks, x, min_dist)
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if x.len() < 3 {
        return maxima;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Suppress peaks closer than `distance`, visiting the highest first.
fn select_by_distance(peaks: &[usize], x: &[f64], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];
    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &i in by_height.iter().rev() {
        if !keep[i] {
            continue;
        }
        for k in (0..i).rev() {
            if peaks[i] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in i + 1..peaks.len() {
            if peaks[k] - peaks[i] >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}
