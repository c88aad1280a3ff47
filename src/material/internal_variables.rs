use crate::base::UpdateStatus;
use crate::StrError;
use russell_lab::{vec_copy, Vector};
use serde::{Deserialize, Serialize};

/// Holds one family of internal (hardening) variables
///
/// Three values are tracked per component:
///
/// * `committed` — value at the start of the current substep
/// * `trial` — value of the current outer iteration
/// * `before_update` — value of the previous outer iteration, cached for the
///   convergence comparison
///
/// Invariant: every component remains ≥ 0. An integration that would drive a
/// component negative is a constitutive failure, except when the committed
/// value is already below the numerical-zero threshold and the increment is
/// negative, in which case the component is clamped to its committed value.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InternalVariables {
    /// Values at the start of the current substep
    pub committed: Vector,

    /// Values of the current outer iteration
    pub trial: Vector,

    /// Values of the previous outer iteration
    pub before_update: Vector,
}

impl InternalVariables {
    /// Allocates a new instance with zeroed values
    pub fn new(n: usize) -> Self {
        InternalVariables {
            committed: Vector::new(n),
            trial: Vector::new(n),
            before_update: Vector::new(n),
        }
    }

    /// Returns the number of components
    pub fn dim(&self) -> usize {
        self.committed.dim()
    }

    /// Sets the committed values (start of the time step or of a new attempt)
    pub fn set_committed(&mut self, values: &Vector) -> Result<(), StrError> {
        if values.dim() != self.committed.dim() {
            return Err("values vector has the wrong dimension");
        }
        vec_copy(&mut self.committed, values).unwrap();
        Ok(())
    }

    /// Resets the trial values to the committed values (substep attempt start)
    pub fn reset_trial(&mut self) {
        vec_copy(&mut self.trial, &self.committed).unwrap();
    }

    /// Caches the trial values for the convergence comparison
    pub fn cache_before_update(&mut self) {
        vec_copy(&mut self.before_update, &self.trial).unwrap();
    }

    /// Commits the trial values (successful substep)
    pub fn commit(&mut self) {
        vec_copy(&mut self.committed, &self.trial).unwrap();
    }

    /// Applies the integrated increment to obtain new trial values
    ///
    /// Enforces the non-negativity invariant with the near-zero clamp rule.
    pub fn apply_increment(&mut self, increment: &Vector, tol_zero: f64) -> Result<(), UpdateStatus> {
        for i in 0..self.committed.dim() {
            if self.committed[i] < tol_zero && increment[i] < 0.0 {
                self.trial[i] = self.committed[i];
            } else {
                self.trial[i] = self.committed[i] + increment[i];
            }
            if self.trial[i] < 0.0 {
                return Err(UpdateStatus::NegativeStateVariable);
            }
        }
        Ok(())
    }

    /// Checks the convergence of every component
    ///
    /// Compares the trial values against the previous outer-iteration values;
    /// the change is scaled by the committed (substep-start) value unless that
    /// value is itself below the numerical-zero threshold.
    pub fn converged(&self, tol_rel: f64, tol_zero: f64) -> bool {
        for i in 0..self.committed.dim() {
            let diff = f64::abs(self.trial[i] - self.before_update[i]);
            if self.committed[i] < tol_zero {
                if diff > tol_zero {
                    return false;
                }
            } else if diff > tol_rel * self.committed[i] {
                return false;
            }
        }
        true
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
