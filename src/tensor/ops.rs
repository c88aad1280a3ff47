use crate::StrError;
use russell_lab::{mat_mat_mul, Matrix, Vector};

/// Defines the space dimension of second-order tensors
pub const NDIM: usize = 3;

/// Defines the dimension of the flattened index-pair representation
pub const NDIM2: usize = 9;

/// Maps the index pair (i,j) onto the flattened representation
#[inline]
fn m(i: usize, j: usize) -> usize {
    NDIM * i + j
}

/// Returns a new zeroed second-order tensor
pub fn t2_new() -> Matrix {
    Matrix::new(NDIM, NDIM)
}

/// Returns the second-order identity tensor
pub fn t2_identity() -> Matrix {
    let mut a = Matrix::new(NDIM, NDIM);
    for i in 0..NDIM {
        a.set(i, i, 1.0);
    }
    a
}

/// Returns a new zeroed fourth-order tensor (9×9)
pub fn t4_new() -> Matrix {
    Matrix::new(NDIM2, NDIM2)
}

/// Returns the fourth-order identity tensor (9×9)
pub fn t4_identity() -> Matrix {
    let mut dd = Matrix::new(NDIM2, NDIM2);
    for k in 0..NDIM2 {
        dd.set(k, k, 1.0);
    }
    dd
}

/// Computes the transpose
///
/// ```text
/// at := aᵀ
/// ```
pub fn t2_transpose(at: &mut Matrix, a: &Matrix) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            at.set(i, j, a.get(j, i));
        }
    }
}

/// Returns the determinant
pub fn t2_det(a: &Matrix) -> f64 {
    a.get(0, 0) * (a.get(1, 1) * a.get(2, 2) - a.get(1, 2) * a.get(2, 1))
        - a.get(0, 1) * (a.get(1, 0) * a.get(2, 2) - a.get(1, 2) * a.get(2, 0))
        + a.get(0, 2) * (a.get(1, 0) * a.get(2, 1) - a.get(1, 1) * a.get(2, 0))
}

/// Computes the inverse and returns the determinant
///
/// ```text
/// ai := a⁻¹
/// ```
pub fn t2_inverse(ai: &mut Matrix, a: &Matrix) -> Result<f64, StrError> {
    let det = t2_det(a);
    if f64::abs(det) < 1e-30 {
        return Err("cannot invert a singular second-order tensor");
    }
    ai.set(0, 0, (a.get(1, 1) * a.get(2, 2) - a.get(1, 2) * a.get(2, 1)) / det);
    ai.set(0, 1, (a.get(0, 2) * a.get(2, 1) - a.get(0, 1) * a.get(2, 2)) / det);
    ai.set(0, 2, (a.get(0, 1) * a.get(1, 2) - a.get(0, 2) * a.get(1, 1)) / det);
    ai.set(1, 0, (a.get(1, 2) * a.get(2, 0) - a.get(1, 0) * a.get(2, 2)) / det);
    ai.set(1, 1, (a.get(0, 0) * a.get(2, 2) - a.get(0, 2) * a.get(2, 0)) / det);
    ai.set(1, 2, (a.get(0, 2) * a.get(1, 0) - a.get(0, 0) * a.get(1, 2)) / det);
    ai.set(2, 0, (a.get(1, 0) * a.get(2, 1) - a.get(1, 1) * a.get(2, 0)) / det);
    ai.set(2, 1, (a.get(0, 1) * a.get(2, 0) - a.get(0, 0) * a.get(2, 1)) / det);
    ai.set(2, 2, (a.get(0, 0) * a.get(1, 1) - a.get(0, 1) * a.get(1, 0)) / det);
    Ok(det)
}

/// Computes the single contraction (matrix product)
///
/// ```text
/// c := a · b
/// ```
pub fn t2_dot_t2(c: &mut Matrix, a: &Matrix, b: &Matrix) {
    mat_mat_mul(c, 1.0, a, b, 0.0).unwrap();
}

/// Returns the double contraction a : b
pub fn t2_ddot_t2(a: &Matrix, b: &Matrix) -> f64 {
    let mut res = 0.0;
    for i in 0..NDIM {
        for j in 0..NDIM {
            res += a.get(i, j) * b.get(i, j);
        }
    }
    res
}

/// Returns the Frobenius norm
pub fn t2_norm(a: &Matrix) -> f64 {
    f64::sqrt(t2_ddot_t2(a, a))
}

/// Performs the update
///
/// ```text
/// b += α a
/// ```
pub fn t2_update(b: &mut Matrix, alpha: f64, a: &Matrix) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            b.set(i, j, b.get(i, j) + alpha * a.get(i, j));
        }
    }
}

/// Copies the tensor components into a 9-vector
pub fn t2_to_vector(v: &mut Vector, a: &Matrix) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            v[m(i, j)] = a.get(i, j);
        }
    }
}

/// Copies a 9-vector into the tensor components
pub fn vector_to_t2(a: &mut Matrix, v: &Vector) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            a.set(i, j, v[m(i, j)]);
        }
    }
}

/// Performs the fourth-order update with the dyadic product of two tensors
///
/// ```text
/// dd += α a ⊗ b    i.e.   dd[i,j,k,l] += α a[i,j] b[k,l]
/// ```
pub fn t4_dyad_update(dd: &mut Matrix, alpha: f64, a: &Matrix, b: &Matrix) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            for k in 0..NDIM {
                for l in 0..NDIM {
                    let p = m(i, j);
                    let q = m(k, l);
                    dd.set(p, q, dd.get(p, q) + alpha * a.get(i, j) * b.get(k, l));
                }
            }
        }
    }
}

/// Computes the double contraction of a fourth- and a second-order tensor
///
/// ```text
/// b := α dd : a    i.e.   b[i,j] = α Σ dd[i,j,k,l] a[k,l]
/// ```
pub fn t4_ddot_t2(b: &mut Matrix, alpha: f64, dd: &Matrix, a: &Matrix) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            let mut res = 0.0;
            for k in 0..NDIM {
                for l in 0..NDIM {
                    res += dd.get(m(i, j), m(k, l)) * a.get(k, l);
                }
            }
            b.set(i, j, alpha * res);
        }
    }
}

/// Computes the mixed dyadic product of two tensors
///
/// ```text
/// dd := a ⊠ b    i.e.   dd[i,j,k,l] = a[i,k] b[j,l]
/// ```
pub fn t4_mixed_ikjl(dd: &mut Matrix, a: &Matrix, b: &Matrix) {
    for i in 0..NDIM {
        for j in 0..NDIM {
            for k in 0..NDIM {
                for l in 0..NDIM {
                    dd.set(m(i, j), m(k, l), a.get(i, k) * b.get(j, l));
                }
            }
        }
    }
}

/// Assembles the derivative of the Green-Lagrange strain w.r.t. the elastic deformation
///
/// ```text
/// E = ½ (Feᵀ·Fe - I)   ⇒   dE/dFe[i,j,k,l] = ½ (δ[l,i] Fe[k,j] + δ[l,j] Fe[k,i])
/// ```
pub fn t4_deedfe(dd: &mut Matrix, fe: &Matrix) {
    dd.fill(0.0);
    for i in 0..NDIM {
        for j in 0..NDIM {
            for k in 0..NDIM {
                let p = m(i, j);
                let qi = m(k, i);
                let qj = m(k, j);
                dd.set(p, qi, dd.get(p, qi) + 0.5 * fe.get(k, j));
                dd.set(p, qj, dd.get(p, qj) + 0.5 * fe.get(k, i));
            }
        }
    }
}

/// Assembles the derivative of the elastic deformation w.r.t. the inverse plastic deformation
///
/// ```text
/// Fe = F·Fp⁻¹   ⇒   dFe/dFp⁻¹[i,j,k,l] = δ[j,l] F[i,k]
/// ```
pub fn t4_dfedfpinv(dd: &mut Matrix, f: &Matrix) {
    dd.fill(0.0);
    for i in 0..NDIM {
        for j in 0..NDIM {
            for k in 0..NDIM {
                dd.set(m(i, j), m(k, j), f.get(i, k));
            }
        }
    }
}

/// Assembles the derivative of the elastic deformation w.r.t. the total deformation
///
/// ```text
/// Fe = F·Fp⁻¹ (fixed Fp⁻¹)   ⇒   dFe/dF[i,j,k,l] = δ[i,k] Fp⁻¹[l,j]
/// ```
pub fn t4_dfedf(dd: &mut Matrix, fp_inv: &Matrix) {
    dd.fill(0.0);
    for i in 0..NDIM {
        for j in 0..NDIM {
            for l in 0..NDIM {
                dd.set(m(i, j), m(i, l), fp_inv.get(l, j));
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
