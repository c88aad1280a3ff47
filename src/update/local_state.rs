use crate::material::FlowRule;
use crate::tensor::{t2_identity, t2_new, t4_new};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use serde::{Deserialize, Serialize};

/// Holds the committed state of one material integration point
///
/// This data is owned by the caller. The engine reads the previous (committed)
/// values and writes the new values back only when the whole update succeeds;
/// on failure the state is left untouched.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocalState {
    /// Holds the plastic deformation gradient Fp
    pub plastic_deformation: Matrix,

    /// Holds the second Piola-Kirchhoff stress S
    pub pk2_stress: Matrix,

    /// Holds the internal variables, one vector per flow-rule family
    pub internal_variables: Vec<Vector>,

    /// Holds the Cauchy stress σ (derived output)
    pub cauchy_stress: Matrix,

    /// Holds the total Lagrangian strain (derived output)
    pub lagrangian_strain: Matrix,

    /// Holds the tangent modulus in the flattened representation (derived output, 9×9)
    pub tangent_modulus: Matrix,
}

impl LocalState {
    /// Allocates a new instance with Fp = I, zero stress, and initialized internal variables
    pub fn new(models: &[FlowRule]) -> Self {
        let internal_variables = models
            .iter()
            .map(|model| {
                let mut values = Vector::new(model.actual.n_internal_variables());
                model.actual.initialize_internal_variables(&mut values);
                values
            })
            .collect();
        LocalState {
            plastic_deformation: t2_identity(),
            pk2_stress: t2_new(),
            internal_variables,
            cauchy_stress: t2_new(),
            lagrangian_strain: t2_new(),
            tangent_modulus: t4_new(),
        }
    }

    /// Returns a JSON representation (e.g., for the caller's restart files)
    pub fn to_json(&self) -> Result<String, StrError> {
        serde_json::to_string(self).map_err(|_| "cannot serialize the local state")
    }

    /// Reads an instance from a JSON string
    pub fn from_json(json: &str) -> Result<Self, StrError> {
        serde_json::from_str(json).map_err(|_| "cannot deserialize the local state")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
