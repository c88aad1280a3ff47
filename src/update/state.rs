use crate::tensor::{t2_det, t2_identity, t2_inverse, t2_new};
use crate::StrError;
use russell_lab::{mat_copy, Matrix};

/// Holds the deformation gradients driving one update call
///
/// The applied increment may be subdivided; `f_current` holds the deformation
/// gradient interpolated at the current substep fraction.
pub struct DeformationState {
    /// Deformation gradient at the start of the step
    pub f_old: Matrix,

    /// Target deformation gradient at the end of the step
    pub f_total: Matrix,

    /// Increment over the full step
    pub delta_f: Matrix,

    /// Interpolated deformation gradient at the current substep fraction
    pub f_current: Matrix,
}

impl DeformationState {
    /// Allocates a new instance with identity tensors
    pub fn new() -> Self {
        DeformationState {
            f_old: t2_identity(),
            f_total: t2_identity(),
            delta_f: t2_new(),
            f_current: t2_identity(),
        }
    }

    /// Sets the previous and target deformation gradients
    ///
    /// A degenerate (zero-determinant) previous deformation gradient is
    /// coerced to the identity tensor (uninitialized caller state).
    pub fn set(&mut self, f_old: &Matrix, f_total: &Matrix) {
        if t2_det(f_old) == 0.0 {
            let eye = t2_identity();
            mat_copy(&mut self.f_old, &eye).unwrap();
        } else {
            mat_copy(&mut self.f_old, f_old).unwrap();
        }
        mat_copy(&mut self.f_total, f_total).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                self.delta_f.set(i, j, self.f_total.get(i, j) - self.f_old.get(i, j));
            }
        }
        mat_copy(&mut self.f_current, &self.f_old).unwrap();
    }

    /// Interpolates the deformation gradient at the given substep fraction
    ///
    /// ```text
    /// f_current = f_old + fraction · delta_f
    /// ```
    pub fn set_substep_fraction(&mut self, fraction: f64) {
        for i in 0..3 {
            for j in 0..3 {
                self.f_current
                    .set(i, j, self.f_old.get(i, j) + fraction * self.delta_f.get(i, j));
            }
        }
    }
}

/// Holds the inverse plastic deformation gradient and its snapshots
///
/// `fp_inv` is mutated by every residual evaluation of the stress solver;
/// `fp_inv_old` is the snapshot at the start of the current substep; and the
/// step-start value is kept for restoring a failed subdivision attempt.
pub struct PlasticState {
    /// Inverse plastic deformation gradient (current)
    pub fp_inv: Matrix,

    /// Snapshot at the start of the current substep
    pub fp_inv_old: Matrix,

    /// Value at the start of the time step (attempt restore point)
    fp_inv_step: Matrix,
}

impl PlasticState {
    /// Allocates a new instance with identity tensors
    pub fn new() -> Self {
        PlasticState {
            fp_inv: t2_identity(),
            fp_inv_old: t2_identity(),
            fp_inv_step: t2_identity(),
        }
    }

    /// Sets the step-start value from the committed plastic deformation gradient
    pub fn set_step(&mut self, fp: &Matrix) -> Result<(), StrError> {
        t2_inverse(&mut self.fp_inv_step, fp).map_err(|_| "plastic deformation gradient is singular")?;
        Ok(())
    }

    /// Restores both values from the step-start snapshot (new attempt)
    pub fn reset_attempt(&mut self) {
        mat_copy(&mut self.fp_inv_old, &self.fp_inv_step).unwrap();
        mat_copy(&mut self.fp_inv, &self.fp_inv_step).unwrap();
    }

    /// Begins a substep from the last committed snapshot
    pub fn reset_substep(&mut self) {
        mat_copy(&mut self.fp_inv, &self.fp_inv_old).unwrap();
    }

    /// Commits a converged substep
    pub fn commit_substep(&mut self) {
        mat_copy(&mut self.fp_inv_old, &self.fp_inv).unwrap();
    }
}

/// Holds the second Piola-Kirchhoff stress (the Newton unknown)
pub struct StressState {
    /// Current stress
    pub pk2: Matrix,

    /// Value at the start of the time step (attempt restore point)
    pub pk2_old: Matrix,
}

impl StressState {
    /// Allocates a new instance with zero tensors
    pub fn new() -> Self {
        StressState {
            pk2: t2_new(),
            pk2_old: t2_new(),
        }
    }

    /// Sets the step-start value from the committed stress
    pub fn set_step(&mut self, pk2: &Matrix) {
        mat_copy(&mut self.pk2_old, pk2).unwrap();
    }

    /// Restores the stress from the step-start value (new attempt)
    pub fn reset_attempt(&mut self) {
        mat_copy(&mut self.pk2, &self.pk2_old).unwrap();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
