//! 谱嵌入与一维 2-means.

use super::graph::PixelGraph;
use crate::consts::split::*;
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// 计算 Fiedler 嵌入: `M = D^{-1/2} W D^{-1/2}` 在 `√d` 正交补上的最大特征向量,
/// 再逐元素除以 `√d`.
///
/// 小图直接做稠密分解, 大图使用带完全重正交化的重启 Lanczos.
pub(super) fn fiedler_embedding(graph: &PixelGraph) -> DVector<f64> {
    let n = graph.len();
    let inv_sqrt = graph.inv_sqrt_degree();
    let u0 = graph.trivial_eigenvector();
    let (theta, y) = if n <= SPLIT_DENSE_MAX_PIXELS {
        dense_second(&graph.dense_normalized(&inv_sqrt), &u0)
    } else {
        lanczos_largest(
            n,
            |x| graph.apply_normalized(&inv_sqrt, x),
            start_vector(n),
            &u0,
        )
    };
    log::debug!("fiedler eigenvalue: {theta:.6} ({n} nodes)");
    y.component_mul(&inv_sqrt)
}

/// 确定性的伪随机起始向量.
fn start_vector(n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| {
        let h = (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 40;
        h as f64 / (1u64 << 24) as f64 - 0.5
    })
}

/// 从 `v` 中减去它在单位向量 `u` 上的分量.
#[inline]
fn project_out(v: &mut DVector<f64>, u: &DVector<f64>) {
    let c = u.dot(v);
    v.axpy(-c, u, 1.0);
}

/// `m - 2 u uᵀ` 的最大特征对. `u` 是 `m` 特征值为 1 的单位特征向量,
/// 因此它被移到 -1, 结果是 `m` 在 `u` 正交补上的最大特征对.
pub(super) fn dense_second(m: &DMatrix<f64>, u: &DVector<f64>) -> (f64, DVector<f64>) {
    let n = m.nrows();
    if n == 0 {
        return (0.0, DVector::zeros(0));
    }
    let shifted = m - u * u.transpose() * 2.0;
    let eig = SymmetricEigen::new(shifted);
    let (idx, theta) = argmax(eig.eigenvalues.iter().copied());
    (theta, eig.eigenvectors.column(idx).into_owned())
}

/// 第一个最大值的位置及其值.
fn argmax<I: Iterator<Item = f64>>(it: I) -> (usize, f64) {
    it.enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
}

/// 重启 Lanczos: 求对称算子 `apply` 在单位向量 `deflate` 正交补上的最大特征对.
///
/// 每一步都对已有基和 `deflate` 做两遍 Gram-Schmidt 完全重正交化.
/// 小规模三对角特征问题交给 [`SymmetricEigen`]. 残差达到
/// [`LANCZOS_TOLERANCE`] 或重启次数用完时返回当前最好的 Ritz 对.
pub(super) fn lanczos_largest(
    n: usize,
    apply: impl Fn(&DVector<f64>) -> DVector<f64>,
    start: DVector<f64>,
    deflate: &DVector<f64>,
) -> (f64, DVector<f64>) {
    let steps = LANCZOS_MAX_STEPS.min(n.saturating_sub(1)).max(1);
    let mut q = start;
    project_out(&mut q, deflate);
    let norm = q.norm();
    if norm <= LANCZOS_TOLERANCE {
        return (0.0, DVector::zeros(n));
    }
    q /= norm;

    let mut best = (f64::NEG_INFINITY, q.clone());
    for restart in 0..LANCZOS_MAX_RESTARTS {
        let mut basis = vec![q.clone()];
        let mut alpha = Vec::with_capacity(steps);
        let mut beta = Vec::with_capacity(steps);
        loop {
            let j = basis.len() - 1;
            let mut w = apply(&basis[j]);
            alpha.push(basis[j].dot(&w));
            if basis.len() == steps {
                break;
            }
            for _ in 0..2 {
                project_out(&mut w, deflate);
                for b in basis.iter() {
                    project_out(&mut w, b);
                }
            }
            let b = w.norm();
            if b <= LANCZOS_TOLERANCE {
                break;
            }
            beta.push(b);
            basis.push(w / b);
        }

        let k = alpha.len();
        let t = DMatrix::from_fn(k, k, |i, j| {
            if i == j {
                alpha[i]
            } else if i + 1 == j {
                beta[i]
            } else if j + 1 == i {
                beta[j]
            } else {
                0.0
            }
        });
        let eig = SymmetricEigen::new(t);
        let (idx, theta) = argmax(eig.eigenvalues.iter().copied());
        let s = eig.eigenvectors.column(idx);

        let mut y = DVector::zeros(n);
        for (coef, b) in s.iter().zip(basis.iter()) {
            y.axpy(*coef, b, 1.0);
        }
        project_out(&mut y, deflate);
        let norm = y.norm();
        if norm <= LANCZOS_TOLERANCE {
            break;
        }
        y /= norm;

        let residual = (apply(&y) - &y * theta).norm();
        best = (theta, y.clone());
        if residual <= LANCZOS_TOLERANCE {
            log::debug!("lanczos converged after {} restarts", restart);
            break;
        }
        q = y;
    }
    best
}

/// 一维 2-means. 以最小值和最大值为初始中心, 返回每个元素是否属于较大的那一簇.
///
/// 所有值都相同时返回 `None`.
pub(super) fn two_means(values: &[f64]) -> Option<Vec<bool>> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let scale = hi.abs().max(lo.abs());
    if values.is_empty() || hi - lo <= scale * 1e-12 {
        return None;
    }

    let (mut c0, mut c1) = (lo, hi);
    let mut labels = vec![false; values.len()];
    for _ in 0..KMEANS_MAX_ITERATIONS {
        let next: Vec<bool> = values
            .iter()
            .map(|&v| (v - c1).abs() < (v - c0).abs())
            .collect();
        let (mut s0, mut n0, mut s1, mut n1) = (0.0, 0usize, 0.0, 0usize);
        for (&v, &l) in values.iter().zip(next.iter()) {
            if l {
                s1 += v;
                n1 += 1;
            } else {
                s0 += v;
                n0 += 1;
            }
        }
        if n0 == 0 || n1 == 0 {
            return None;
        }
        let changed = next != labels;
        labels = next;
        c0 = s0 / n0 as f64;
        c1 = s1 / n1 as f64;
        if !changed {
            break;
        }
    }
    Some(labels)
}
