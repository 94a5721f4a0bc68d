use crate::error::{AnalysisError, Result};

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
///
/// `a` is row-major and square. A pivot that vanishes relative to the largest
/// entry of `a` is reported as a singular system.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(AnalysisError::Numerical(format!(
            "expected a {n}x{n} system"
        )));
    }

    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    let tolerance = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= tolerance || !a[pivot][col].is_finite() {
            return Err(AnalysisError::Numerical(
                "singular matrix in least-squares system".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_with_pivoting() {
        // zero in the leading position forces a row swap
        let a = vec![vec![0.0, 2.0], vec![1.0, 1.0]];
        let x = solve(a, vec![4.0, 3.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn singular_system_is_an_error() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(matches!(
            solve(a, vec![1.0, 2.0]),
            Err(AnalysisError::Numerical(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        assert!(solve(vec![vec![1.0]], vec![1.0, 2.0]).is_err());
    }
}
