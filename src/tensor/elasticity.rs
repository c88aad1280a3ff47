use super::{t4_ddot_t2, t4_new, NDIM};
use crate::base::ParamElasticity;
use crate::StrError;
use russell_lab::Matrix;

/// Implements the fourth-order elastic stiffness of the crystal lattice
///
/// The tensor is stored in the general 9×9 representation so that it can be
/// composed directly with the kinematic derivative operators.
#[derive(Clone, Debug)]
pub struct ElasticityTensor {
    /// Stiffness components in the flattened representation (9×9)
    dd: Matrix,
}

impl ElasticityTensor {
    /// Allocates a new instance from elasticity parameters
    pub fn new(param: &ParamElasticity) -> Result<Self, StrError> {
        let mut dd = t4_new();
        let del = |i: usize, j: usize| if i == j { 1.0 } else { 0.0 };
        match *param {
            ParamElasticity::Isotropic { young, poisson } => {
                if young <= 0.0 {
                    return Err("Young's modulus must be positive");
                }
                if poisson <= -1.0 || poisson >= 0.5 {
                    return Err("Poisson's coefficient must be -1 < ν < 0.5");
                }
                let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
                let mu = young / (2.0 * (1.0 + poisson));
                for i in 0..NDIM {
                    for j in 0..NDIM {
                        for k in 0..NDIM {
                            for l in 0..NDIM {
                                let val = lambda * del(i, j) * del(k, l)
                                    + mu * (del(i, k) * del(j, l) + del(i, l) * del(j, k));
                                dd.set(NDIM * i + j, NDIM * k + l, val);
                            }
                        }
                    }
                }
            }
            ParamElasticity::Cubic { c11, c12, c44 } => {
                if c44 <= 0.0 || c11 - c12 <= 0.0 || c11 + 2.0 * c12 <= 0.0 {
                    return Err("cubic stiffness constants are not positive-definite");
                }
                let aniso = c11 - c12 - 2.0 * c44;
                for i in 0..NDIM {
                    for j in 0..NDIM {
                        for k in 0..NDIM {
                            for l in 0..NDIM {
                                let mut val = c12 * del(i, j) * del(k, l)
                                    + c44 * (del(i, k) * del(j, l) + del(i, l) * del(j, k));
                                if i == j && j == k && k == l {
                                    val += aniso;
                                }
                                dd.set(NDIM * i + j, NDIM * k + l, val);
                            }
                        }
                    }
                }
            }
        }
        Ok(ElasticityTensor { dd })
    }

    /// Returns a copy rotated into the frame given by the lattice rotation
    ///
    /// ```text
    /// C'[i,j,k,l] = R[i,p] R[j,q] R[k,r] R[l,s] C[p,q,r,s]
    /// ```
    pub fn rotated(&self, rr: &Matrix) -> Self {
        let mut dd = t4_new();
        for i in 0..NDIM {
            for j in 0..NDIM {
                for k in 0..NDIM {
                    for l in 0..NDIM {
                        let mut val = 0.0;
                        for p in 0..NDIM {
                            for q in 0..NDIM {
                                for r in 0..NDIM {
                                    for s in 0..NDIM {
                                        val += rr.get(i, p)
                                            * rr.get(j, q)
                                            * rr.get(k, r)
                                            * rr.get(l, s)
                                            * self.dd.get(NDIM * p + q, NDIM * r + s);
                                    }
                                }
                            }
                        }
                        dd.set(NDIM * i + j, NDIM * k + l, val);
                    }
                }
            }
        }
        ElasticityTensor { dd }
    }

    /// Computes the contraction with a strain tensor
    ///
    /// ```text
    /// σ := C : ε
    /// ```
    pub fn ddot(&self, sigma: &mut Matrix, epsilon: &Matrix) {
        t4_ddot_t2(sigma, 1.0, &self.dd, epsilon);
    }

    /// Returns an access to the flattened stiffness components (9×9)
    pub fn matrix(&self) -> &Matrix {
        &self.dd
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ElasticityTensor;
    use crate::base::ParamElasticity;
    use crate::tensor::{rotation_from_euler, t2_new, NDIM};
    use russell_lab::{approx_eq, mat_approx_eq};

    #[test]
    fn new_captures_errors() {
        assert_eq!(
            ElasticityTensor::new(&ParamElasticity::Isotropic {
                young: -1.0,
                poisson: 0.3
            })
            .err(),
            Some("Young's modulus must be positive")
        );
        assert_eq!(
            ElasticityTensor::new(&ParamElasticity::Isotropic {
                young: 200.0,
                poisson: 0.5
            })
            .err(),
            Some("Poisson's coefficient must be -1 < ν < 0.5")
        );
        assert_eq!(
            ElasticityTensor::new(&ParamElasticity::Cubic {
                c11: 1.0,
                c12: 2.0,
                c44: 1.0
            })
            .err(),
            Some("cubic stiffness constants are not positive-definite")
        );
    }

    #[test]
    fn isotropic_contraction_works() {
        let young = 200.0;
        let poisson = 0.25;
        let dd = ElasticityTensor::new(&ParamElasticity::Isotropic { young, poisson }).unwrap();
        let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        let mu = young / (2.0 * (1.0 + poisson));

        // ε with trace and shear
        let mut eps = t2_new();
        eps.set(0, 0, 0.001);
        eps.set(1, 1, -0.002);
        eps.set(0, 1, 0.0005);
        eps.set(1, 0, 0.0005);

        let mut sig = t2_new();
        dd.ddot(&mut sig, &eps);

        let tr = 0.001 - 0.002;
        for i in 0..NDIM {
            for j in 0..NDIM {
                let del = if i == j { 1.0 } else { 0.0 };
                approx_eq(sig.get(i, j), lambda * tr * del + 2.0 * mu * eps.get(i, j), 1e-14);
            }
        }
    }

    #[test]
    fn isotropic_zero_poisson_is_scaled_identity() {
        let dd = ElasticityTensor::new(&ParamElasticity::Isotropic {
            young: 200.0,
            poisson: 0.0,
        })
        .unwrap();
        let mut eps = t2_new();
        eps.set(0, 1, 0.01);
        eps.set(1, 0, 0.01);
        eps.set(2, 2, 0.02);
        let mut sig = t2_new();
        dd.ddot(&mut sig, &eps);
        for i in 0..NDIM {
            for j in 0..NDIM {
                approx_eq(sig.get(i, j), 200.0 * eps.get(i, j), 1e-13);
            }
        }
    }

    #[test]
    fn cubic_reduces_to_isotropic() {
        // with c11 - c12 = 2 c44, cubic equals isotropic with λ = c12, μ = c44
        let c12 = 100.0;
        let c44 = 80.0;
        let c11 = c12 + 2.0 * c44;
        let cubic = ElasticityTensor::new(&ParamElasticity::Cubic { c11, c12, c44 }).unwrap();
        let poisson = c12 / (2.0 * (c12 + c44));
        let young = c44 * (3.0 * c12 + 2.0 * c44) / (c12 + c44);
        let iso = ElasticityTensor::new(&ParamElasticity::Isotropic { young, poisson }).unwrap();
        mat_approx_eq(cubic.matrix(), iso.matrix(), 1e-12);
    }

    #[test]
    fn rotation_preserves_cubic_symmetry_axes() {
        let dd = ElasticityTensor::new(&ParamElasticity::Cubic {
            c11: 1.684e5,
            c12: 1.214e5,
            c44: 0.754e5,
        })
        .unwrap();

        // rotating a cubic crystal by 90 degrees about z maps the cube onto itself
        let rr = rotation_from_euler(90.0, 0.0, 0.0);
        let rot = dd.rotated(&rr);
        mat_approx_eq(rot.matrix(), dd.matrix(), 1e-9);

        // identity rotation is a no-op
        let rr = rotation_from_euler(0.0, 0.0, 0.0);
        let rot = dd.rotated(&rr);
        mat_approx_eq(rot.matrix(), dd.matrix(), 1e-12);
    }
}
