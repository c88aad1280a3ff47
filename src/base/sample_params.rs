use super::{ParamElasticity, ParamFlowRule};

/// Holds sample parameters for tests and demos
pub struct SampleParams {}

impl SampleParams {
    /// Returns cubic elasticity parameters for a copper-like crystal (MPa)
    pub fn param_elasticity_copper() -> ParamElasticity {
        ParamElasticity::Cubic {
            c11: 1.684e5,
            c12: 1.214e5,
            c44: 0.754e5,
        }
    }

    /// Returns power-law flow-rule parameters for a copper-like FCC crystal (MPa)
    pub fn param_flow_rule_power_law() -> ParamFlowRule {
        ParamFlowRule::PowerLaw {
            gamma_dot0: 1e-3,
            rate_exponent: 0.1,
            g0: 60.8,
            g_sat: 109.8,
            h0: 541.5,
            hardening_exponent: 2.5,
            latent_ratio: 1.4,
            slip_increment_tol: 2e-2,
        }
    }

    /// Returns power-law flow-rule parameters with constant resistance
    pub fn param_flow_rule_power_law_no_hardening(g0: f64) -> ParamFlowRule {
        ParamFlowRule::PowerLaw {
            gamma_dot0: 1e-3,
            rate_exponent: 0.1,
            g0,
            g_sat: g0,
            h0: 0.0,
            hardening_exponent: 1.0,
            latent_ratio: 1.0,
            slip_increment_tol: 2e-2,
        }
    }

    /// Returns dislocation-density flow-rule parameters (MPa, µm)
    pub fn param_flow_rule_dislocation_density() -> ParamFlowRule {
        ParamFlowRule::DislocationDensity {
            gamma_dot0: 1e-3,
            rate_exponent: 0.05,
            g0: 10.0,
            rho0: 1.0,      // 1/µm²
            k1: 40.0,       // 1/µm
            k2: 10.0,
            c_taylor: 0.3,
            shear_modulus: 0.454e5,
            burgers: 2.56e-4, // µm
            slip_increment_tol: 2e-2,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
