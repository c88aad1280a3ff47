use crate::material::{FlowRule, InternalVariables};
use crate::tensor::t2_new;
use russell_lab::{Matrix, Vector};

/// Holds the per-model scratch data of one update call
///
/// One workspace exists per flow-rule model; the engine owns the workspaces
/// exclusively for the duration of a call, so models can be shared read-only
/// across concurrent integration points.
pub struct ModelWorkspace {
    /// Flow direction (Schmid) tensors in the sample frame
    pub flow_direction: Vec<Matrix>,

    /// Resolved shear stress per slip system
    pub tau: Vector,

    /// Slip rate per slip system
    pub slip_rate: Vector,

    /// Derivative of the slip rates w.r.t. the resolved shear stress
    pub dslip_dtau: Vector,

    /// Slip resistance per slip system
    pub resistance: Vector,

    /// Increment of the internal variables over the substep
    pub increment: Vector,

    /// Internal variables of this model's family
    pub variables: InternalVariables,
}

impl ModelWorkspace {
    /// Allocates a new instance matching the model's dimensions
    pub fn new(model: &FlowRule) -> Self {
        let n_systems = model.actual.n_slip_systems();
        let n_variables = model.actual.n_internal_variables();
        ModelWorkspace {
            flow_direction: (0..n_systems).map(|_| t2_new()).collect(),
            tau: Vector::new(n_systems),
            slip_rate: Vector::new(n_systems),
            dslip_dtau: Vector::new(n_systems),
            resistance: Vector::new(n_systems),
            increment: Vector::new(n_variables),
            variables: InternalVariables::new(n_variables),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
