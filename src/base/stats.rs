use serde::{Deserialize, Serialize};

/// Holds iteration counters for one constitutive update call
///
/// The counters are diagnostic only; they never affect the update itself.
/// All values are reset at the beginning of every call to
/// [crate::update::StressUpdater::update_stress].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpdateStats {
    /// Total number of Newton iterations performed by the stress solver
    pub n_stress_iterations: usize,

    /// Total number of outer iterations over the internal variables
    pub n_state_iterations: usize,

    /// Number of subdivision attempts (1 means no subdivision was needed)
    pub n_substep_attempts: usize,

    /// Number of substeps in the successful attempt (a power of two)
    pub n_substeps: usize,

    /// Residual norms of the last stress solve (requires Config.save_residual_history)
    pub residual_history: Vec<f64>,
}

impl UpdateStats {
    /// Allocates a new instance with zeroed counters
    pub fn new() -> Self {
        UpdateStats {
            n_stress_iterations: 0,
            n_state_iterations: 0,
            n_substep_attempts: 0,
            n_substeps: 0,
            residual_history: Vec::new(),
        }
    }

    /// Resets all counters for a new update call
    pub fn reset(&mut self) {
        self.n_stress_iterations = 0;
        self.n_state_iterations = 0;
        self.n_substep_attempts = 0;
        self.n_substeps = 0;
        self.residual_history.clear();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
