use super::{DeformationState, ModelWorkspace, PlasticState, StressState};
use crate::base::{Config, LineSearchMethod, UpdateStats, UpdateStatus};
use crate::material::FlowRule;
use crate::tensor::{
    t2_ddot_t2, t2_dot_t2, t2_identity, t2_new, t2_norm, t2_to_vector, t2_transpose, t2_update, t4_deedfe,
    t4_dfedfpinv, t4_dyad_update, t4_identity, t4_new, vector_to_t2, ElasticityTensor, NDIM, NDIM2,
};
use russell_lab::{mat_inverse, mat_mat_mul, mat_vec_mul, Matrix, Vector};

/// Implements the Newton-Raphson solver for the stress equilibrium equation
///
/// At fixed internal state and fixed target deformation, finds the second
/// Piola-Kirchhoff stress S such that
///
/// ```text
/// S - C : E(Fe(S)) = 0
/// ```
///
/// where the elastic deformation Fe follows from the discrete plastic flow
/// integrated over the substep. Every residual evaluation mutates the shared
/// `PlasticState.fp_inv` as a byproduct; the line search therefore re-evaluates
/// the residual after each trial step.
pub struct StressSolver {
    /// Residual tensor R = S - C : E(Fe(S))
    residual: Matrix,

    /// Newton Jacobian dR/dS (9×9)
    jacobian: Matrix,

    /// Inverse of the Newton Jacobian (9×9)
    jacobian_inv: Matrix,

    /// Newton correction ΔS
    dpk2: Matrix,

    /// Elastic deformation gradient Fe = F·Fp⁻¹
    fe: Matrix,

    // scratch
    fet: Matrix,
    ce: Matrix,
    elastic_strain: Matrix,
    pk2_predicted: Matrix,
    eqv_slip_increment: Matrix,
    aux: Matrix,
    eye: Matrix,
    eye4: Matrix,
    deedfe: Matrix,
    dfedfpinv: Matrix,
    dfpinvdpk2: Matrix,
    aux4_a: Matrix,
    aux4_b: Matrix,
    residual_vec: Vector,
    dpk2_vec: Vector,
}

impl StressSolver {
    /// Allocates a new instance
    pub fn new() -> Self {
        StressSolver {
            residual: t2_new(),
            jacobian: t4_new(),
            jacobian_inv: t4_new(),
            dpk2: t2_new(),
            fe: t2_new(),
            fet: t2_new(),
            ce: t2_new(),
            elastic_strain: t2_new(),
            pk2_predicted: t2_new(),
            eqv_slip_increment: t2_new(),
            aux: t2_new(),
            eye: t2_identity(),
            eye4: t4_identity(),
            deedfe: t4_new(),
            dfedfpinv: t4_new(),
            dfpinvdpk2: t4_new(),
            aux4_a: t4_new(),
            aux4_b: t4_new(),
            residual_vec: Vector::new(NDIM2),
            dpk2_vec: Vector::new(NDIM2),
        }
    }

    /// Returns the elastic deformation gradient of the last residual evaluation
    pub fn elastic_deformation(&self) -> &Matrix {
        &self.fe
    }

    /// Returns the Newton Jacobian of the last evaluation
    pub fn jacobian(&self) -> &Matrix {
        &self.jacobian
    }

    /// Evaluates the stress residual
    ///
    /// Side effect: updates `plastic.fp_inv` from the slip rates at the
    /// current stress.
    fn calc_residual(
        &mut self,
        models: &[FlowRule],
        workspaces: &mut [ModelWorkspace],
        deformation: &DeformationState,
        plastic: &mut PlasticState,
        stress: &StressState,
        elasticity: &ElasticityTensor,
        substep_dt: f64,
    ) -> Result<(), UpdateStatus> {
        // equivalent plastic slip increment over all models
        self.eqv_slip_increment.fill(0.0);
        for (model, ws) in models.iter().zip(workspaces.iter_mut()) {
            for alpha in 0..model.actual.n_slip_systems() {
                ws.tau[alpha] = t2_ddot_t2(&stress.pk2, &ws.flow_direction[alpha]);
            }
            model
                .actual
                .calc_slip_rate(&ws.tau, &ws.resistance, substep_dt, &mut ws.slip_rate)?;
            for alpha in 0..model.actual.n_slip_systems() {
                t2_update(
                    &mut self.eqv_slip_increment,
                    ws.slip_rate[alpha] * substep_dt,
                    &ws.flow_direction[alpha],
                );
            }
        }

        // Fp⁻¹ = Fp⁻¹_old · (I - Σ Δγ[α] P[α])
        self.aux.fill(0.0);
        t2_update(&mut self.aux, 1.0, &self.eye);
        t2_update(&mut self.aux, -1.0, &self.eqv_slip_increment);
        t2_dot_t2(&mut plastic.fp_inv, &plastic.fp_inv_old, &self.aux);

        // Fe = F·Fp⁻¹
        t2_dot_t2(&mut self.fe, &deformation.f_current, &plastic.fp_inv);

        // E = ½ (Feᵀ·Fe - I)
        t2_transpose(&mut self.fet, &self.fe);
        t2_dot_t2(&mut self.ce, &self.fet, &self.fe);
        for i in 0..NDIM {
            for j in 0..NDIM {
                self.elastic_strain
                    .set(i, j, 0.5 * (self.ce.get(i, j) - self.eye.get(i, j)));
            }
        }

        // R = S - C : E
        elasticity.ddot(&mut self.pk2_predicted, &self.elastic_strain);
        for i in 0..NDIM {
            for j in 0..NDIM {
                self.residual
                    .set(i, j, stress.pk2.get(i, j) - self.pk2_predicted.get(i, j));
            }
        }
        Ok(())
    }

    /// Evaluates the analytic Jacobian of the stress residual
    ///
    /// ```text
    /// J = I - C · (dE/dFe) · (dFe/dFp⁻¹) · (dFp⁻¹/dS)
    /// ```
    fn calc_jacobian(
        &mut self,
        models: &[FlowRule],
        workspaces: &mut [ModelWorkspace],
        deformation: &DeformationState,
        plastic: &PlasticState,
        elasticity: &ElasticityTensor,
        substep_dt: f64,
    ) {
        t4_dfedfpinv(&mut self.dfedfpinv, &deformation.f_current);
        t4_deedfe(&mut self.deedfe, &self.fe);

        // dFp⁻¹/dS = Σ (-Fp⁻¹_old · P[α]) (d(rate[α])/dτ Δt) ⊗ P[α]
        self.dfpinvdpk2.fill(0.0);
        for (model, ws) in models.iter().zip(workspaces.iter_mut()) {
            model
                .actual
                .calc_slip_rate_derivative(&ws.tau, &ws.resistance, &mut ws.dslip_dtau);
            for alpha in 0..model.actual.n_slip_systems() {
                t2_dot_t2(&mut self.aux, &plastic.fp_inv_old, &ws.flow_direction[alpha]);
                t4_dyad_update(
                    &mut self.dfpinvdpk2,
                    -ws.dslip_dtau[alpha] * substep_dt,
                    &self.aux,
                    &ws.flow_direction[alpha],
                );
            }
        }

        // J = I - C · deedfe · dfedfpinv · dfpinvdpk2
        mat_mat_mul(&mut self.aux4_a, 1.0, elasticity.matrix(), &self.deedfe, 0.0).unwrap();
        mat_mat_mul(&mut self.aux4_b, 1.0, &self.aux4_a, &self.dfedfpinv, 0.0).unwrap();
        mat_mat_mul(&mut self.aux4_a, 1.0, &self.aux4_b, &self.dfpinvdpk2, 0.0).unwrap();
        for i in 0..NDIM2 {
            for j in 0..NDIM2 {
                self.jacobian.set(i, j, self.eye4.get(i, j) - self.aux4_a.get(i, j));
            }
        }
    }

    /// Solves the stress equilibrium equation with Newton-Raphson iterations
    pub fn solve(
        &mut self,
        models: &[FlowRule],
        workspaces: &mut [ModelWorkspace],
        deformation: &DeformationState,
        plastic: &mut PlasticState,
        stress: &mut StressState,
        elasticity: &ElasticityTensor,
        substep_dt: f64,
        config: &Config,
        stats: &mut UpdateStats,
    ) -> Result<(), UpdateStatus> {
        self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
        self.calc_jacobian(models, workspaces, deformation, plastic, elasticity, substep_dt);

        let mut rnorm = t2_norm(&self.residual);
        let rnorm0 = rnorm;
        if config.save_residual_history {
            stats.residual_history.clear();
            stats.residual_history.push(rnorm);
        }
        if config.verbose_iterations {
            println!("stress iteration {:>4}: |R| = {:>16.8e}", 0, rnorm);
        }

        let mut iteration = 0;
        while rnorm > config.tol_rel_residual * rnorm0
            && rnorm > config.tol_abs_residual
            && iteration < config.n_max_stress_iterations
        {
            // ΔS = -J⁻¹ R
            mat_inverse(&mut self.jacobian_inv, &self.jacobian).map_err(|_| UpdateStatus::StressNotConverged)?;
            t2_to_vector(&mut self.residual_vec, &self.residual);
            mat_vec_mul(&mut self.dpk2_vec, -1.0, &self.jacobian_inv, &self.residual_vec).unwrap();
            vector_to_t2(&mut self.dpk2, &self.dpk2_vec);
            t2_update(&mut stress.pk2, 1.0, &self.dpk2);

            self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
            self.calc_jacobian(models, workspaces, deformation, plastic, elasticity, substep_dt);

            let rnorm_prev = rnorm;
            rnorm = t2_norm(&self.residual);

            if config.use_line_search && rnorm > rnorm_prev {
                self.line_search(
                    models, workspaces, deformation, plastic, stress, elasticity, substep_dt, config, rnorm_prev,
                )?;
                rnorm = t2_norm(&self.residual);
            }

            iteration += 1;
            stats.n_stress_iterations += 1;
            if config.save_residual_history {
                stats.residual_history.push(rnorm);
            }
            if config.verbose_iterations {
                println!("stress iteration {:>4}: |R| = {:>16.8e}", iteration, rnorm);
            }
        }

        if iteration >= config.n_max_stress_iterations {
            return Err(UpdateStatus::StressNotConverged);
        }
        Ok(())
    }

    /// Scales the last Newton step so that the residual decreases
    ///
    /// The Jacobian is not re-evaluated here; the next Newton iteration
    /// recomputes both residual and Jacobian at the accepted stress.
    fn line_search(
        &mut self,
        models: &[FlowRule],
        workspaces: &mut [ModelWorkspace],
        deformation: &DeformationState,
        plastic: &mut PlasticState,
        stress: &mut StressState,
        elasticity: &ElasticityTensor,
        substep_dt: f64,
        config: &Config,
        rnorm_prev: f64,
    ) -> Result<(), UpdateStatus> {
        match config.line_search_method {
            LineSearchMethod::CutHalf => {
                let mut step = 1.0;
                loop {
                    t2_update(&mut stress.pk2, -step, &self.dpk2);
                    step /= 2.0;
                    t2_update(&mut stress.pk2, step, &self.dpk2);

                    self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
                    let rnorm = t2_norm(&self.residual);
                    if rnorm <= rnorm_prev {
                        return Ok(());
                    }
                    if step <= config.min_line_search_step {
                        return Err(UpdateStatus::LineSearchFailed);
                    }
                }
            }
            LineSearchMethod::Bisection => {
                let mut count = 0;
                let mut step_a = 0.0;
                let mut step_b = 1.0;
                let mut step = 1.0;

                // directional derivatives at the full step and at zero step
                self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
                let mut s_b = t2_ddot_t2(&self.residual, &self.dpk2);
                let rnorm1 = t2_norm(&self.residual);
                t2_update(&mut stress.pk2, -1.0, &self.dpk2);
                self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
                let mut s_a = t2_ddot_t2(&self.residual, &self.dpk2);
                let rnorm0 = t2_norm(&self.residual);
                t2_update(&mut stress.pk2, 1.0, &self.dpk2);

                // no bracket means the full step is accepted as-is
                if rnorm1 / rnorm0 < config.tol_line_search || s_a * s_b > 0.0 {
                    self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
                    return Ok(());
                }

                let mut rnorm = rnorm1;
                while rnorm / rnorm0 > config.tol_line_search && count < config.n_max_line_search_iterations {
                    t2_update(&mut stress.pk2, -step, &self.dpk2);
                    step = 0.5 * (step_b + step_a);
                    t2_update(&mut stress.pk2, step, &self.dpk2);
                    self.calc_residual(models, workspaces, deformation, plastic, stress, elasticity, substep_dt)?;
                    let s_m = t2_ddot_t2(&self.residual, &self.dpk2);
                    rnorm = t2_norm(&self.residual);

                    if s_m * s_a < 0.0 {
                        step_b = step;
                        s_b = s_m;
                    }
                    if s_m * s_b < 0.0 {
                        step_a = step;
                        s_a = s_m;
                    }
                    count += 1;
                }

                if rnorm / rnorm0 < config.tol_line_search && count < config.n_max_line_search_iterations {
                    return Ok(());
                }
                Err(UpdateStatus::LineSearchFailed)
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::StressSolver;
    use crate::base::{Config, SampleParams, UpdateStats, UpdateStatus};
    use crate::material::{FlowRule, SlipGeometry};
    use crate::tensor::{t2_identity, ElasticityTensor};
    use crate::update::{DeformationState, ModelWorkspace, PlasticState, StressState};
    use crate::base::ParamElasticity;
    use russell_lab::approx_eq;

    // single slip system with normal e2 and direction e1
    fn single_slip_setup(g0: f64) -> (Vec<FlowRule>, Vec<ModelWorkspace>) {
        let param = SampleParams::param_flow_rule_power_law_no_hardening(g0);
        let geometry = SlipGeometry::new_single([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        let model = FlowRule::new(&param, geometry).unwrap();
        let mut workspace = ModelWorkspace::new(&model);
        model
            .actual
            .calc_flow_direction(&t2_identity(), &mut workspace.flow_direction)
            .unwrap();
        let mut values = russell_lab::Vector::new(1);
        model.actual.initialize_internal_variables(&mut values);
        workspace.variables.set_committed(&values).unwrap();
        workspace.variables.reset_trial();
        model
            .actual
            .calc_resistance(&workspace.variables.trial, &mut workspace.resistance);
        (vec![model], vec![workspace])
    }

    #[test]
    fn solve_elastic_works() {
        // with a very high resistance the slip rates vanish and a single
        // Newton correction recovers the elastic solution
        let (models, mut workspaces) = single_slip_setup(1e8);
        let elasticity = ElasticityTensor::new(&ParamElasticity::Isotropic {
            young: 200.0,
            poisson: 0.0,
        })
        .unwrap();
        let config = Config::new();
        let mut stats = UpdateStats::new();

        let mut deformation = DeformationState::new();
        let mut f_total = t2_identity();
        f_total.set(0, 1, 0.01);
        deformation.set(&t2_identity(), &f_total);
        deformation.set_substep_fraction(1.0);

        let mut plastic = PlasticState::new();
        plastic.set_step(&t2_identity()).unwrap();
        plastic.reset_attempt();
        let mut stress = StressState::new();
        stress.reset_attempt();

        let mut solver = StressSolver::new();
        solver
            .solve(
                &models,
                &mut workspaces,
                &deformation,
                &mut plastic,
                &mut stress,
                &elasticity,
                1.0,
                &config,
                &mut stats,
            )
            .unwrap();

        // S = 200 E with E01 = E10 = γ/2 and E11 = γ²/2
        assert_eq!(stats.n_stress_iterations, 1);
        approx_eq(stress.pk2.get(0, 1), 200.0 * 0.005, 1e-9);
        approx_eq(stress.pk2.get(1, 0), 200.0 * 0.005, 1e-9);
        approx_eq(stress.pk2.get(1, 1), 200.0 * 0.5e-4, 1e-9);
        // fp_inv stays (numerically) at identity
        approx_eq(plastic.fp_inv.get(0, 1), 0.0, 1e-12);
    }

    #[test]
    fn solve_catches_rate_tolerance() {
        // a large deformation increment at once trips the slip-increment guard
        let (models, mut workspaces) = single_slip_setup(100.0);
        let elasticity = ElasticityTensor::new(&ParamElasticity::Isotropic {
            young: 200.0,
            poisson: 0.0,
        })
        .unwrap();
        let config = Config::new();
        let mut stats = UpdateStats::new();

        let mut deformation = DeformationState::new();
        let mut f_total = t2_identity();
        f_total.set(0, 1, 10.0);
        deformation.set(&t2_identity(), &f_total);
        deformation.set_substep_fraction(1.0);

        let mut plastic = PlasticState::new();
        plastic.set_step(&t2_identity()).unwrap();
        plastic.reset_attempt();
        let mut stress = StressState::new();
        stress.reset_attempt();

        let mut solver = StressSolver::new();
        let res = solver.solve(
            &models,
            &mut workspaces,
            &deformation,
            &mut plastic,
            &mut stress,
            &elasticity,
            1.0,
            &config,
            &mut stats,
        );
        assert_eq!(res.err(), Some(UpdateStatus::RateToleranceExceeded));
    }
}
