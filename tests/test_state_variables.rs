use cpmat::prelude::*;
use cpmat::tensor::t2_identity;
use cpmat::StrError;
use russell_lab::*;

// State-variable evolution and invariants
//
// TEST GOAL
//
// Verifies the hardening evolution of the power-law model through the full
// update, the non-negativity invariant of the dislocation-density model under
// a randomized loading sequence, and the coupling of two flow-rule families
// in one update.

/// Simple linear congruential generator for reproducible load sequences
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    /// Returns a pseudo-random number in [-1, 1]
    fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64) / ((1u64 << 53) as f64) * 2.0 - 1.0
    }
}

#[test]
fn test_power_law_hardening_accumulates() -> Result<(), StrError> {
    let crysrot = t2_identity();
    let elasticity = ElasticityTensor::new(&SampleParams::param_elasticity_copper())?;
    let param = SampleParams::param_flow_rule_power_law();
    let (g0, g_sat) = match param {
        ParamFlowRule::PowerLaw { g0, g_sat, .. } => (g0, g_sat),
        _ => unreachable!(),
    };
    let models = vec![FlowRule::new(&param, SlipGeometry::new_fcc())?];

    let mut config = Config::new();
    config.set_n_max_substep_attempts(6)?;
    let mut updater = StressUpdater::new(&config, elasticity, models)?;
    let mut state = updater.new_local_state();

    // shear the crystal in several steps; plastic flow raises the resistances
    let n_steps = 5;
    let gamma_fin = 0.005;
    for step in 0..n_steps {
        let mut f_old = t2_identity();
        f_old.set(0, 1, gamma_fin * (step as f64) / (n_steps as f64));
        let mut f_new = t2_identity();
        f_new.set(0, 1, gamma_fin * ((step + 1) as f64) / (n_steps as f64));
        updater.update_stress(&mut state, &f_new, &f_old, &crysrot, 1.0)?;
        assert_eq!(updater.status, UpdateStatus::Converged);
    }

    // every resistance stays within [g0, g_sat] and at least one hardened
    let mut hardened = false;
    for alpha in 0..12 {
        let g = state.internal_variables[0][alpha];
        assert!(g >= g0);
        assert!(g <= g_sat);
        if g > g0 + 1e-6 {
            hardened = true;
        }
    }
    assert!(hardened);
    Ok(())
}

#[test]
fn test_dislocation_density_stays_non_negative() -> Result<(), StrError> {
    let crysrot = rotation_from_euler(10.0, 20.0, 30.0);
    let elasticity = ElasticityTensor::new(&SampleParams::param_elasticity_copper())?.rotated(&crysrot);
    let param = SampleParams::param_flow_rule_dislocation_density();
    let models = vec![FlowRule::new(&param, SlipGeometry::new_fcc())?];

    let mut config = Config::new();
    config.set_n_max_substep_attempts(4)?;
    let mut updater = StressUpdater::new(&config, elasticity, models)?;
    let mut state = updater.new_local_state();

    // randomized sequence of small shear/extension increments
    let mut lcg = Lcg::new(20260807);
    let mut f_old = t2_identity();
    for _ in 0..20 {
        let mut f_new = f_old.clone();
        f_new.set(0, 1, f_old.get(0, 1) + 1e-4 * lcg.next());
        f_new.set(1, 2, f_old.get(1, 2) + 1e-4 * lcg.next());
        f_new.set(0, 0, f_old.get(0, 0) + 5e-5 * lcg.next());

        match updater.update_stress(&mut state, &f_new, &f_old, &crysrot, 1.0) {
            Ok(()) => {
                // every committed density must be non-negative
                for alpha in 0..12 {
                    assert!(state.internal_variables[0][alpha] >= 0.0);
                }
                f_old = f_new;
            }
            Err(message) => {
                // the only failure surfaced to the caller is the fatal one,
                // and it commits nothing
                assert_eq!(message, "substep limit exceeded (constitutive failure)");
                assert_eq!(updater.status, UpdateStatus::SubstepLimitExceeded);
                for alpha in 0..12 {
                    assert!(state.internal_variables[0][alpha] >= 0.0);
                }
                break;
            }
        }
    }
    Ok(())
}

#[test]
fn test_two_flow_rule_families() -> Result<(), StrError> {
    // one power-law family and one dislocation-density family act together
    let crysrot = t2_identity();
    let elasticity = ElasticityTensor::new(&SampleParams::param_elasticity_copper())?;
    let models = vec![
        FlowRule::new(&SampleParams::param_flow_rule_power_law(), SlipGeometry::new_fcc())?,
        FlowRule::new(
            &SampleParams::param_flow_rule_dislocation_density(),
            SlipGeometry::new_fcc(),
        )?,
    ];

    let mut config = Config::new();
    config.set_n_max_substep_attempts(4)?;
    let mut updater = StressUpdater::new(&config, elasticity, models)?;
    let mut state = updater.new_local_state();
    assert_eq!(state.internal_variables.len(), 2);

    let f_old = t2_identity();
    let mut f_new = t2_identity();
    f_new.set(0, 1, 0.0005);
    updater.update_stress(&mut state, &f_new, &f_old, &crysrot, 1.0)?;
    assert_eq!(updater.status, UpdateStatus::Converged);

    // both families keep their invariants
    let mut rho_max = 0.0;
    for alpha in 0..12 {
        assert!(state.internal_variables[0][alpha] >= 60.8);
        assert!(state.internal_variables[1][alpha] >= 0.0);
        rho_max = f64::max(rho_max, state.internal_variables[1][alpha]);
    }
    // the dislocation-density family flowed and multiplied
    assert!(rho_max > 1.0);

    // serialization of the full state works (caller-side checkpointing)
    let json = state.to_json()?;
    let read = LocalState::from_json(&json)?;
    vec_approx_eq(&read.internal_variables[1], &state.internal_variables[1], 1e-15);
    Ok(())
}
