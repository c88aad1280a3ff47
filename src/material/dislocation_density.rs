use super::{FlowRuleTrait, SlipGeometry};
use crate::base::{ParamFlowRule, UpdateStatus};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements the dislocation-density based flow rule
///
/// The internal variable is the per-system dislocation density ρ with the
/// Kocks-Mecking evolution (multiplication minus dynamic recovery)
///
/// ```text
/// ρ̇[α] = (k₁ √ρ[α] - k₂ ρ[α]) |rate[α]|
/// ```
///
/// The slip resistance follows the Taylor relation
///
/// ```text
/// g[α] = g₀ + c μ b √ρ[α]
/// ```
///
/// and the slip rates obey the same power law as the phenomenological model.
pub struct DislocationDensityFlow {
    /// Slip-system geometry
    geometry: SlipGeometry,

    /// Reference slip rate γ̇₀
    gamma_dot0: f64,

    /// Rate sensitivity exponent m
    rate_exponent: f64,

    /// Initial lattice friction g₀
    g0: f64,

    /// Initial dislocation density ρ₀
    rho0: f64,

    /// Multiplication coefficient k₁
    k1: f64,

    /// Dynamic recovery coefficient k₂
    k2: f64,

    /// Taylor hardening coefficient times shear modulus times Burgers vector
    c_mu_b: f64,

    /// Maximum allowable |rate|·Δt in a substep
    slip_increment_tol: f64,
}

impl DislocationDensityFlow {
    /// Allocates a new instance
    pub fn new(param: &ParamFlowRule, geometry: SlipGeometry) -> Result<Self, StrError> {
        let (gamma_dot0, rate_exponent, g0, rho0, k1, k2, c_taylor, shear_modulus, burgers, slip_increment_tol) =
            match *param {
                ParamFlowRule::DislocationDensity {
                    gamma_dot0,
                    rate_exponent,
                    g0,
                    rho0,
                    k1,
                    k2,
                    c_taylor,
                    shear_modulus,
                    burgers,
                    slip_increment_tol,
                } => (
                    gamma_dot0,
                    rate_exponent,
                    g0,
                    rho0,
                    k1,
                    k2,
                    c_taylor,
                    shear_modulus,
                    burgers,
                    slip_increment_tol,
                ),
                _ => return Err("parameters must be ParamFlowRule::DislocationDensity"),
            };
        if gamma_dot0 <= 0.0 {
            return Err("gamma_dot0 must be positive");
        }
        if rate_exponent <= 0.0 {
            return Err("rate_exponent must be positive");
        }
        if g0 <= 0.0 {
            return Err("g0 must be positive");
        }
        if rho0 < 0.0 {
            return Err("rho0 must be ≥ 0");
        }
        if k1 < 0.0 || k2 < 0.0 {
            return Err("k1 and k2 must be ≥ 0");
        }
        if c_taylor <= 0.0 || shear_modulus <= 0.0 || burgers <= 0.0 {
            return Err("Taylor hardening parameters must be positive");
        }
        if slip_increment_tol <= 0.0 {
            return Err("slip_increment_tol must be positive");
        }
        Ok(DislocationDensityFlow {
            geometry,
            gamma_dot0,
            rate_exponent,
            g0,
            rho0,
            k1,
            k2,
            c_mu_b: c_taylor * shear_modulus * burgers,
            slip_increment_tol,
        })
    }
}

impl FlowRuleTrait for DislocationDensityFlow {
    /// Returns the number of slip systems
    fn n_slip_systems(&self) -> usize {
        self.geometry.n_systems()
    }

    /// Returns the number of internal variables (one density per system)
    fn n_internal_variables(&self) -> usize {
        self.geometry.n_systems()
    }

    /// Initializes the internal variables with the initial dislocation density
    fn initialize_internal_variables(&self, values: &mut Vector) {
        values.fill(self.rho0);
    }

    /// Calculates the flow direction (Schmid) tensors in the sample frame
    fn calc_flow_direction(&self, crysrot: &Matrix, flow_direction: &mut [Matrix]) -> Result<(), StrError> {
        self.geometry.calc_flow_direction(crysrot, flow_direction)
    }

    /// Calculates the slip resistances with the Taylor relation
    fn calc_resistance(&self, values: &Vector, resistance: &mut Vector) {
        for alpha in 0..values.dim() {
            resistance[alpha] = self.g0 + self.c_mu_b * f64::sqrt(values[alpha]);
        }
    }

    /// Calculates the slip rates
    fn calc_slip_rate(
        &self,
        tau: &Vector,
        resistance: &Vector,
        substep_dt: f64,
        slip_rate: &mut Vector,
    ) -> Result<(), UpdateStatus> {
        for alpha in 0..tau.dim() {
            let ratio = f64::abs(tau[alpha] / resistance[alpha]);
            slip_rate[alpha] =
                self.gamma_dot0 * f64::powf(ratio, 1.0 / self.rate_exponent) * f64::signum(tau[alpha]);
            if f64::abs(slip_rate[alpha]) * substep_dt > self.slip_increment_tol {
                return Err(UpdateStatus::RateToleranceExceeded);
            }
        }
        Ok(())
    }

    /// Calculates the derivative of the slip rates w.r.t. the resolved shear stress
    fn calc_slip_rate_derivative(&self, tau: &Vector, resistance: &Vector, dslip_dtau: &mut Vector) {
        for alpha in 0..tau.dim() {
            if tau[alpha] == 0.0 {
                dslip_dtau[alpha] = 0.0;
            } else {
                let ratio = f64::abs(tau[alpha] / resistance[alpha]);
                dslip_dtau[alpha] = self.gamma_dot0 / (self.rate_exponent * resistance[alpha])
                    * f64::powf(ratio, 1.0 / self.rate_exponent - 1.0);
            }
        }
    }

    /// Calculates the increment of the dislocation densities over the substep
    fn calc_state_variable_increment(
        &self,
        slip_rate: &Vector,
        values: &Vector,
        substep_dt: f64,
        increment: &mut Vector,
    ) {
        for alpha in 0..values.dim() {
            let rho = values[alpha];
            increment[alpha] =
                (self.k1 * f64::sqrt(rho) - self.k2 * rho) * f64::abs(slip_rate[alpha]) * substep_dt;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
