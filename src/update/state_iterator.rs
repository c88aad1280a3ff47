use super::{DeformationState, ModelWorkspace, PlasticState, StressSolver, StressState};
use crate::base::{Config, UpdateStats, UpdateStatus};
use crate::material::FlowRule;
use crate::tensor::ElasticityTensor;

/// Implements the outer fixed-point iteration over the internal variables
///
/// Alternates between solving the stress equilibrium (at fixed internal state)
/// and integrating the internal variables with the slip rates evaluated at the
/// converged stress, until the internal variables stop changing.
pub struct StateIterator {
    /// Newton solver for the stress equilibrium equation
    pub stress_solver: StressSolver,
}

impl StateIterator {
    /// Allocates a new instance
    pub fn new() -> Self {
        StateIterator {
            stress_solver: StressSolver::new(),
        }
    }

    /// Solves one substep for both stress and internal variables
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
        for _iteration in 0..config.n_max_state_iterations {
            self.stress_solver.solve(
                models, workspaces, deformation, plastic, stress, elasticity, substep_dt, config, stats,
            )?;

            // integrate the internal variables with the rates at the converged stress
            for ws in workspaces.iter_mut() {
                ws.variables.cache_before_update();
            }
            for (model, ws) in models.iter().zip(workspaces.iter_mut()) {
                model.actual.calc_state_variable_increment(
                    &ws.slip_rate,
                    &ws.variables.trial,
                    substep_dt,
                    &mut ws.increment,
                );
            }
            for ws in workspaces.iter_mut() {
                ws.variables.apply_increment(&ws.increment, config.tol_zero)?;
            }
            for (model, ws) in models.iter().zip(workspaces.iter_mut()) {
                model.actual.calc_resistance(&ws.variables.trial, &mut ws.resistance);
            }

            stats.n_state_iterations += 1;

            // stop when no family changed beyond tolerance
            let converged = workspaces
                .iter()
                .all(|ws| ws.variables.converged(config.tol_rel_state_variable, config.tol_zero));
            if converged {
                return Ok(());
            }
        }
        Err(UpdateStatus::HardnessNotConverged)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::StateIterator;
    use crate::base::{Config, SampleParams, UpdateStats, UpdateStatus};
    use crate::material::{FlowRule, SlipGeometry};
    use crate::base::ParamElasticity;
    use crate::tensor::{t2_identity, ElasticityTensor};
    use crate::update::{DeformationState, ModelWorkspace, PlasticState, StressState};
    use russell_lab::Vector;

    fn single_slip_setup(g0: f64) -> (Vec<FlowRule>, Vec<ModelWorkspace>) {
        let param = SampleParams::param_flow_rule_power_law_no_hardening(g0);
        let geometry = SlipGeometry::new_single([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        let model = FlowRule::new(&param, geometry).unwrap();
        let mut workspace = ModelWorkspace::new(&model);
        model
            .actual
            .calc_flow_direction(&t2_identity(), &mut workspace.flow_direction)
            .unwrap();
        let mut values = Vector::new(1);
        model.actual.initialize_internal_variables(&mut values);
        workspace.variables.set_committed(&values).unwrap();
        workspace.variables.reset_trial();
        model
            .actual
            .calc_resistance(&workspace.variables.trial, &mut workspace.resistance);
        (vec![model], vec![workspace])
    }

    #[test]
    fn solve_without_hardening_converges_in_one_outer_iteration() {
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
        f_total.set(0, 1, 0.5);
        deformation.set(&t2_identity(), &f_total);
        deformation.set_substep_fraction(1.0);

        let mut plastic = PlasticState::new();
        plastic.set_step(&t2_identity()).unwrap();
        plastic.reset_attempt();
        let mut stress = StressState::new();
        stress.reset_attempt();

        let mut iterator = StateIterator::new();
        iterator
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

        // constant resistance means the state variables never change
        assert_eq!(stats.n_state_iterations, 1);
        assert_eq!(workspaces[0].variables.trial[0], 100.0);
        assert!(stress.pk2.get(0, 1) > 0.0);
    }

    #[test]
    fn solve_propagates_stress_failures() {
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
        f_total.set(0, 1, 10.0); // too large for one shot
        deformation.set(&t2_identity(), &f_total);
        deformation.set_substep_fraction(1.0);

        let mut plastic = PlasticState::new();
        plastic.set_step(&t2_identity()).unwrap();
        plastic.reset_attempt();
        let mut stress = StressState::new();
        stress.reset_attempt();

        let mut iterator = StateIterator::new();
        let res = iterator.solve(
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
