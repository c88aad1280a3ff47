use crate::tensor::{
    t2_det, t2_dot_t2, t2_new, t2_transpose, t4_deedfe, t4_dfedf, t4_mixed_ikjl, t4_new, ElasticityTensor, NDIM,
};
use crate::StrError;
use russell_lab::{mat_add, mat_copy, mat_inverse, mat_mat_mul, Matrix};

/// Calculates the tangent modulus for the external global solver
///
/// Two modes are available: the elastic stiffness (cheap, always available)
/// and the consistent elasto-plastic tangent, which differentiates the
/// converged stress update with respect to the total deformation gradient.
/// Both are purely algebraic; no iteration happens here.
pub struct TangentOperator {
    // scratch
    deedfe: Matrix,
    dfedf: Matrix,
    fe_mixed: Matrix,
    dsigdpk2dfe: Matrix,
    tan_mod: Matrix,
    aux4_a: Matrix,
    aux4_b: Matrix,
    jacobian_inv: Matrix,
    fet: Matrix,
    pk2fet: Matrix,
    fepk2: Matrix,
}

impl TangentOperator {
    /// Allocates a new instance
    pub fn new() -> Self {
        TangentOperator {
            deedfe: t4_new(),
            dfedf: t4_new(),
            fe_mixed: t4_new(),
            dsigdpk2dfe: t4_new(),
            tan_mod: t4_new(),
            aux4_a: t4_new(),
            aux4_b: t4_new(),
            jacobian_inv: t4_new(),
            fet: t2_new(),
            pk2fet: t2_new(),
            fepk2: t2_new(),
        }
    }

    /// Returns the elastic stiffness
    pub fn elastic(&self, elasticity: &ElasticityTensor, dd: &mut Matrix) {
        mat_copy(dd, elasticity.matrix()).unwrap();
    }

    /// Calculates the consistent tangent modulus at the converged state
    ///
    /// Composes the derivative of the Cauchy stress push-forward with the
    /// implicit derivative of the stress update,
    ///
    /// ```text
    /// dS/dFe = J⁻¹ · C · dE/dFe
    /// ```
    ///
    /// where J is the converged Newton Jacobian of the stress solver, and
    /// closes the chain rule with dFe/dF at the converged plastic state.
    pub fn consistent(
        &mut self,
        dd: &mut Matrix,
        elasticity: &ElasticityTensor,
        fe: &Matrix,
        fp_inv: &Matrix,
        pk2: &Matrix,
        jacobian: &Matrix,
    ) -> Result<(), StrError> {
        mat_inverse(&mut self.jacobian_inv, jacobian)
            .map_err(|_| "cannot invert the Newton Jacobian for the consistent tangent")?;

        // dσ/dFe = (Fe ⊠ Fe) · J⁻¹ · C · dE/dFe
        t4_deedfe(&mut self.deedfe, fe);
        mat_mat_mul(&mut self.aux4_a, 1.0, elasticity.matrix(), &self.deedfe, 0.0).unwrap();
        mat_mat_mul(&mut self.aux4_b, 1.0, &self.jacobian_inv, &self.aux4_a, 0.0).unwrap();
        t4_mixed_ikjl(&mut self.fe_mixed, fe, fe);
        mat_mat_mul(&mut self.dsigdpk2dfe, 1.0, &self.fe_mixed, &self.aux4_b, 0.0).unwrap();

        // geometric terms from the push-forward of the converged stress
        t2_transpose(&mut self.fet, fe);
        t2_dot_t2(&mut self.pk2fet, pk2, &self.fet);
        t2_dot_t2(&mut self.fepk2, fe, pk2);
        self.tan_mod.fill(0.0);
        for i in 0..NDIM {
            for j in 0..NDIM {
                for l in 0..NDIM {
                    let pi = NDIM * i + j;
                    let qi = NDIM * i + l;
                    let qj = NDIM * j + l;
                    self.tan_mod.set(pi, qi, self.tan_mod.get(pi, qi) + self.pk2fet.get(l, j));
                    self.tan_mod.set(pi, qj, self.tan_mod.get(pi, qj) + self.fepk2.get(i, l));
                }
            }
        }
        mat_add(&mut self.aux4_a, 1.0, &self.tan_mod, 1.0, &self.dsigdpk2dfe).unwrap();

        // close the chain rule with dFe/dF and the inverse elastic volume change
        let je = t2_det(fe);
        let scale = if je > 0.0 { 1.0 / je } else { 1.0 };
        t4_dfedf(&mut self.dfedf, fp_inv);
        mat_mat_mul(dd, scale, &self.aux4_a, &self.dfedf, 0.0).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::TangentOperator;
    use crate::base::ParamElasticity;
    use crate::tensor::{t2_identity, t2_new, t4_identity, ElasticityTensor, NDIM};
    use russell_lab::{approx_eq, mat_approx_eq, Matrix};

    #[test]
    fn elastic_works() {
        let elasticity = ElasticityTensor::new(&ParamElasticity::Isotropic {
            young: 200.0,
            poisson: 0.25,
        })
        .unwrap();
        let tangent = TangentOperator::new();
        let mut dd = Matrix::new(9, 9);
        tangent.elastic(&elasticity, &mut dd);
        mat_approx_eq(&dd, elasticity.matrix(), 1e-15);
    }

    #[test]
    fn consistent_captures_singular_jacobian() {
        let elasticity = ElasticityTensor::new(&ParamElasticity::Isotropic {
            young: 200.0,
            poisson: 0.0,
        })
        .unwrap();
        let mut tangent = TangentOperator::new();
        let mut dd = Matrix::new(9, 9);
        let singular = Matrix::new(9, 9);
        assert_eq!(
            tangent
                .consistent(
                    &mut dd,
                    &elasticity,
                    &t2_identity(),
                    &t2_identity(),
                    &t2_new(),
                    &singular,
                )
                .err(),
            Some("cannot invert the Newton Jacobian for the consistent tangent")
        );
    }

    #[test]
    fn consistent_at_virgin_state_matches_small_strain_stiffness() {
        // at Fe = I, Fp = I, S = 0, J = I the geometric terms vanish and the
        // consistent tangent reduces to the elastic stiffness contracted with
        // the symmetrizing dE/dF operator
        let young = 200.0;
        let elasticity = ElasticityTensor::new(&ParamElasticity::Isotropic { young, poisson: 0.0 }).unwrap();
        let mut tangent = TangentOperator::new();
        let mut dd = Matrix::new(9, 9);
        tangent
            .consistent(
                &mut dd,
                &elasticity,
                &t2_identity(),
                &t2_identity(),
                &t2_new(),
                &t4_identity(),
            )
            .unwrap();

        // contraction with a symmetric velocity gradient recovers young · sym(δF)
        let mut delta_f = t2_new();
        delta_f.set(0, 1, 1e-3);
        let mut dsig = t2_new();
        crate::tensor::t4_ddot_t2(&mut dsig, 1.0, &dd, &delta_f);
        for i in 0..NDIM {
            for j in 0..NDIM {
                let sym = 0.5 * (delta_f.get(i, j) + delta_f.get(j, i));
                approx_eq(dsig.get(i, j), young * sym, 1e-12);
            }
        }
    }
}
