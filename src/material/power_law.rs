use super::{FlowRuleTrait, SlipGeometry};
use crate::base::{ParamFlowRule, UpdateStatus};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements the phenomenological power-law flow rule with Voce-type hardening
///
/// The slip rate on system α is
///
/// ```text
/// rate[α] = γ̇₀ sign(τ[α]) |τ[α]/g[α]|^(1/m)
/// ```
///
/// and the slip resistance (the internal variable of this model) evolves as
///
/// ```text
/// ġ[α] = Σ_β q[α,β] h₀ |1 - g[β]/g_sat|^a sign(1 - g[β]/g_sat) |rate[β]|
/// ```
///
/// where coplanar systems harden with ratio 1 and all others with the latent
/// ratio q.
pub struct PowerLawFlow {
    /// Slip-system geometry
    geometry: SlipGeometry,

    /// Reference slip rate γ̇₀
    gamma_dot0: f64,

    /// Rate sensitivity exponent m
    rate_exponent: f64,

    /// Initial slip resistance g₀
    g0: f64,

    /// Saturation resistance
    g_sat: f64,

    /// Reference hardening rate h₀
    h0: f64,

    /// Hardening exponent a
    hardening_exponent: f64,

    /// Latent hardening matrix q[α,β] (row-major, n×n)
    qq: Vec<f64>,

    /// Maximum allowable |rate|·Δt in a substep
    slip_increment_tol: f64,
}

impl PowerLawFlow {
    /// Allocates a new instance
    pub fn new(param: &ParamFlowRule, geometry: SlipGeometry) -> Result<Self, StrError> {
        let (gamma_dot0, rate_exponent, g0, g_sat, h0, hardening_exponent, latent_ratio, slip_increment_tol) =
            match *param {
                ParamFlowRule::PowerLaw {
                    gamma_dot0,
                    rate_exponent,
                    g0,
                    g_sat,
                    h0,
                    hardening_exponent,
                    latent_ratio,
                    slip_increment_tol,
                } => (
                    gamma_dot0,
                    rate_exponent,
                    g0,
                    g_sat,
                    h0,
                    hardening_exponent,
                    latent_ratio,
                    slip_increment_tol,
                ),
                _ => return Err("parameters must be ParamFlowRule::PowerLaw"),
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
        if g_sat < g0 {
            return Err("g_sat must be ≥ g0");
        }
        if h0 < 0.0 {
            return Err("h0 must be ≥ 0");
        }
        if slip_increment_tol <= 0.0 {
            return Err("slip_increment_tol must be positive");
        }
        let n = geometry.n_systems();
        let mut qq = vec![latent_ratio; n * n];
        for alpha in 0..n {
            for beta in 0..n {
                if geometry.coplanar(alpha, beta) {
                    qq[alpha * n + beta] = 1.0;
                }
            }
        }
        Ok(PowerLawFlow {
            geometry,
            gamma_dot0,
            rate_exponent,
            g0,
            g_sat,
            h0,
            hardening_exponent,
            qq,
            slip_increment_tol,
        })
    }
}

impl FlowRuleTrait for PowerLawFlow {
    /// Returns the number of slip systems
    fn n_slip_systems(&self) -> usize {
        self.geometry.n_systems()
    }

    /// Returns the number of internal variables (one resistance per system)
    fn n_internal_variables(&self) -> usize {
        self.geometry.n_systems()
    }

    /// Initializes the internal variables with the initial slip resistance
    fn initialize_internal_variables(&self, values: &mut Vector) {
        values.fill(self.g0);
    }

    /// Calculates the flow direction (Schmid) tensors in the sample frame
    fn calc_flow_direction(&self, crysrot: &Matrix, flow_direction: &mut [Matrix]) -> Result<(), StrError> {
        self.geometry.calc_flow_direction(crysrot, flow_direction)
    }

    /// Calculates the slip resistances (identity pass-through for this model)
    fn calc_resistance(&self, values: &Vector, resistance: &mut Vector) {
        for alpha in 0..values.dim() {
            resistance[alpha] = values[alpha];
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

    /// Calculates the increment of the slip resistances over the substep
    fn calc_state_variable_increment(
        &self,
        slip_rate: &Vector,
        values: &Vector,
        substep_dt: f64,
        increment: &mut Vector,
    ) {
        let n = values.dim();
        let mut hb = Vector::new(n);
        for beta in 0..n {
            let distance = 1.0 - values[beta] / self.g_sat;
            hb[beta] = self.h0
                * f64::powf(f64::abs(distance), self.hardening_exponent)
                * f64::signum(distance)
                * f64::abs(slip_rate[beta]);
        }
        for alpha in 0..n {
            let mut rate = 0.0;
            for beta in 0..n {
                rate += self.qq[alpha * n + beta] * hb[beta];
            }
            increment[alpha] = rate * substep_dt;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
