use super::{DislocationDensityFlow, PowerLawFlow, SlipGeometry};
use crate::base::{ParamFlowRule, UpdateStatus};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Specifies the essential functions for flow-rule models
///
/// A flow rule describes a family of discrete plastic mechanisms (slip
/// systems) with fixed geometric directions, a rate law driven by the
/// resolved shear stress, and the evolution of one family of internal
/// (hardening) variables.
pub trait FlowRuleTrait: Send {
    /// Returns the number of slip systems
    fn n_slip_systems(&self) -> usize;

    /// Returns the number of internal variables
    fn n_internal_variables(&self) -> usize;

    /// Initializes the internal variables
    fn initialize_internal_variables(&self, values: &mut Vector);

    /// Calculates the flow direction (Schmid) tensors in the sample frame
    ///
    /// The directions depend only on the fixed crystal orientation; the engine
    /// calls this once per update call.
    fn calc_flow_direction(&self, crysrot: &Matrix, flow_direction: &mut [Matrix]) -> Result<(), StrError>;

    /// Calculates the slip resistances from the internal variables
    fn calc_resistance(&self, values: &Vector, resistance: &mut Vector);

    /// Calculates the slip rates
    ///
    /// Fails with [UpdateStatus::RateToleranceExceeded] when any |rate|·Δt
    /// exceeds the slip-increment tolerance of the model.
    fn calc_slip_rate(
        &self,
        tau: &Vector,
        resistance: &Vector,
        substep_dt: f64,
        slip_rate: &mut Vector,
    ) -> Result<(), UpdateStatus>;

    /// Calculates the derivative of the slip rates w.r.t. the resolved shear stress
    fn calc_slip_rate_derivative(&self, tau: &Vector, resistance: &Vector, dslip_dtau: &mut Vector);

    /// Calculates the increment of the internal variables over the substep
    ///
    /// The increment is integrated by the caller through
    /// [crate::material::InternalVariables::apply_increment], which enforces
    /// the non-negativity invariant.
    fn calc_state_variable_increment(
        &self,
        slip_rate: &Vector,
        values: &Vector,
        substep_dt: f64,
        increment: &mut Vector,
    );
}

/// Holds the actual flow-rule model implementation
pub struct FlowRule {
    /// Holds the actual model implementation
    pub actual: Box<dyn FlowRuleTrait>,
}

impl FlowRule {
    /// Allocates a new instance
    pub fn new(param: &ParamFlowRule, geometry: SlipGeometry) -> Result<Self, StrError> {
        let actual: Box<dyn FlowRuleTrait> = match *param {
            // Phenomenological power-law model with Voce-type hardening
            ParamFlowRule::PowerLaw { .. } => Box::new(PowerLawFlow::new(param, geometry)?),

            // Dislocation-density based model with Kocks-Mecking evolution
            ParamFlowRule::DislocationDensity { .. } => Box::new(DislocationDensityFlow::new(param, geometry)?),
        };
        Ok(FlowRule { actual })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
