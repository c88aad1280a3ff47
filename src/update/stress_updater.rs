use super::{
    DeformationState, LocalState, ModelWorkspace, PlasticState, StateIterator, StressState, Substepper,
    TangentOperator,
};
use crate::base::{Config, TangentModulus, UpdateStats, UpdateStatus};
use crate::material::FlowRule;
use crate::tensor::{t2_det, t2_dot_t2, t2_inverse, t2_new, t2_transpose, t4_new, ElasticityTensor, NDIM};
use crate::StrError;
use russell_lab::{mat_copy, vec_copy, Matrix};

/// Performs the implicit constitutive update at one material integration point
///
/// Given the deformation state at the start and end of a load step, the
/// previous stress and internal (hardening) state, computes a new stress, new
/// plastic deformation, new internal state, and a tangent modulus for the
/// external global solver. The applied increment is subdivided automatically
/// when the nested solves fail to converge.
///
/// Each instance owns its scratch space and must not be shared across
/// concurrent integration points; the flow-rule models themselves are
/// read-only during the update and may be shared.
pub struct StressUpdater {
    /// Configuration (validated at construction)
    config: Config,

    /// Elastic stiffness, already rotated into the crystal frame
    elasticity: ElasticityTensor,

    /// Flow-rule models (one internal-variable family each)
    models: Vec<FlowRule>,

    /// Per-model scratch data
    workspaces: Vec<ModelWorkspace>,

    /// Outer iterator (owning the stress solver)
    iterator: StateIterator,

    /// Tangent modulus calculator
    tangent: TangentOperator,

    /// Deformation gradients of the current call
    deformation: DeformationState,

    /// Inverse plastic deformation and its snapshots
    plastic: PlasticState,

    /// Second Piola-Kirchhoff stress (the Newton unknown)
    stress: StressState,

    // output scratch
    fp_new: Matrix,
    dd_tangent: Matrix,
    aux: Matrix,
    aux_transpose: Matrix,

    /// Holds the convergence status of the last update call
    pub status: UpdateStatus,

    /// Holds the iteration counters of the last update call
    pub stats: UpdateStats,
}

impl StressUpdater {
    /// Allocates a new instance
    ///
    /// The elasticity tensor must already be rotated into the crystal frame
    /// (see [ElasticityTensor::rotated]).
    pub fn new(config: &Config, elasticity: ElasticityTensor, models: Vec<FlowRule>) -> Result<Self, StrError> {
        if let Some(_) = config.validate() {
            return Err("cannot allocate stress updater because config.validate() failed");
        }
        if models.len() < 1 {
            return Err("at least one flow-rule model is required");
        }
        let workspaces = models.iter().map(|model| ModelWorkspace::new(model)).collect();
        Ok(StressUpdater {
            config: *config,
            elasticity,
            models,
            workspaces,
            iterator: StateIterator::new(),
            tangent: TangentOperator::new(),
            deformation: DeformationState::new(),
            plastic: PlasticState::new(),
            stress: StressState::new(),
            fp_new: t2_new(),
            dd_tangent: t4_new(),
            aux: t2_new(),
            aux_transpose: t2_new(),
            status: UpdateStatus::Converged,
            stats: UpdateStats::new(),
        })
    }

    /// Returns a new local state compatible with the models
    pub fn new_local_state(&self) -> LocalState {
        LocalState::new(&self.models)
    }

    /// Performs the constitutive update for one load step
    ///
    /// # Input
    ///
    /// * `state` -- the committed state at the start of the step
    /// * `deformation_gradient` -- the target (end-of-step) deformation gradient
    /// * `deformation_gradient_old` -- the deformation gradient at the start of
    ///   the step (coerced to identity if degenerate)
    /// * `crysrot` -- the lattice rotation (crystal to sample frame)
    /// * `dt` -- the time-step size
    ///
    /// # Output
    ///
    /// On success, writes the new stress, plastic deformation, internal
    /// variables, Cauchy stress, Lagrangian strain, and tangent modulus back to
    /// `state`; `self.status` is [UpdateStatus::Converged] and `self.stats`
    /// holds the iteration counters. On constitutive failure, `state` is left
    /// untouched, `self.status` is [UpdateStatus::SubstepLimitExceeded] (the
    /// only failure that escapes the substep controller), and an error message
    /// is returned.
    pub fn update_stress(
        &mut self,
        state: &mut LocalState,
        deformation_gradient: &Matrix,
        deformation_gradient_old: &Matrix,
        crysrot: &Matrix,
        dt: f64,
    ) -> Result<(), StrError> {
        if dt <= 0.0 {
            return Err("dt must be positive");
        }
        if state.internal_variables.len() != self.models.len() {
            return Err("local state has the wrong number of internal-variable families");
        }
        for (m, model) in self.models.iter().enumerate() {
            if state.internal_variables[m].dim() != model.actual.n_internal_variables() {
                return Err("local state has an internal-variable vector with the wrong dimension");
            }
        }

        self.stats.reset();
        self.deformation.set(deformation_gradient_old, deformation_gradient);
        self.plastic.set_step(&state.plastic_deformation)?;
        self.stress.set_step(&state.pk2_stress);

        // flow directions depend only on the fixed crystal orientation
        for (model, ws) in self.models.iter().zip(self.workspaces.iter_mut()) {
            model.actual.calc_flow_direction(crysrot, &mut ws.flow_direction)?;
        }

        match self.run_substeps(state, dt) {
            Ok(()) => {
                self.status = UpdateStatus::Converged;
                self.commit(state)
            }
            Err(status) => {
                self.status = status;
                Err(status.as_str())
            }
        }
    }

    /// Runs the substep loop, subdividing the increment on failure
    fn run_substeps(&mut self, state: &LocalState, dt: f64) -> Result<(), UpdateStatus> {
        let mut substepper = Substepper::new(self.config.n_max_substep_attempts);
        loop {
            substepper.begin_attempt();
            self.stats.n_substep_attempts = substepper.attempt();
            let num = substepper.n_substeps();
            let substep_dt = dt / (num as f64);

            // restore the committed pre-step state
            self.stress.reset_attempt();
            self.plastic.reset_attempt();
            for (m, ws) in self.workspaces.iter_mut().enumerate() {
                ws.variables.set_committed(&state.internal_variables[m]).unwrap();
            }

            let mut failure = None;
            for istep in 0..num {
                self.deformation
                    .set_substep_fraction(((istep + 1) as f64) / (num as f64));
                for ws in self.workspaces.iter_mut() {
                    ws.variables.reset_trial();
                }
                for (model, ws) in self.models.iter().zip(self.workspaces.iter_mut()) {
                    model.actual.calc_resistance(&ws.variables.trial, &mut ws.resistance);
                }
                self.plastic.reset_substep();

                let res = self.iterator.solve(
                    &self.models,
                    &mut self.workspaces,
                    &self.deformation,
                    &mut self.plastic,
                    &mut self.stress,
                    &self.elasticity,
                    substep_dt,
                    &self.config,
                    &mut self.stats,
                );
                match res {
                    Ok(()) => {
                        // commit this substep
                        for ws in self.workspaces.iter_mut() {
                            ws.variables.commit();
                        }
                        self.plastic.commit_substep();
                    }
                    Err(status) => {
                        // abandon the attempt and subdivide
                        failure = Some(status);
                        break;
                    }
                }
            }

            match failure {
                None => {
                    substepper.succeed();
                    self.stats.n_substeps = num;
                    return Ok(());
                }
                Some(_) => substepper.subdivide()?,
            }
        }
    }

    /// Writes the converged results back to the caller's state
    fn commit(&mut self, state: &mut LocalState) -> Result<(), StrError> {
        // fallible outputs first so that a failure leaves the state untouched
        match self.config.tangent_modulus {
            TangentModulus::Elastic => self.tangent.elastic(&self.elasticity, &mut self.dd_tangent),
            TangentModulus::Consistent => self.tangent.consistent(
                &mut self.dd_tangent,
                &self.elasticity,
                self.iterator.stress_solver.elastic_deformation(),
                &self.plastic.fp_inv,
                &self.stress.pk2,
                self.iterator.stress_solver.jacobian(),
            )?,
        }
        t2_inverse(&mut self.fp_new, &self.plastic.fp_inv)
            .map_err(|_| "converged inverse plastic deformation gradient is singular")?;

        // committed values
        mat_copy(&mut state.plastic_deformation, &self.fp_new).unwrap();
        mat_copy(&mut state.pk2_stress, &self.stress.pk2).unwrap();
        for (m, ws) in self.workspaces.iter().enumerate() {
            vec_copy(&mut state.internal_variables[m], &ws.variables.committed).unwrap();
        }
        mat_copy(&mut state.tangent_modulus, &self.dd_tangent).unwrap();

        // Cauchy stress σ = Fe·S·Feᵀ / det(Fe)
        let fe = self.iterator.stress_solver.elastic_deformation();
        let je = t2_det(fe);
        t2_dot_t2(&mut self.aux, fe, &self.stress.pk2);
        t2_transpose(&mut self.aux_transpose, fe);
        t2_dot_t2(&mut state.cauchy_stress, &self.aux, &self.aux_transpose);
        for i in 0..NDIM {
            for j in 0..NDIM {
                state.cauchy_stress.set(i, j, state.cauchy_stress.get(i, j) / je);
            }
        }

        // total Lagrangian strain E = ½ (Fᵀ·F - I)
        t2_transpose(&mut self.aux_transpose, &self.deformation.f_total);
        t2_dot_t2(&mut self.aux, &self.aux_transpose, &self.deformation.f_total);
        for i in 0..NDIM {
            for j in 0..NDIM {
                let del = if i == j { 1.0 } else { 0.0 };
                state.lagrangian_strain.set(i, j, 0.5 * (self.aux.get(i, j) - del));
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
