//! Implements tensor operations for finite-strain kinematics
//!
//! Second-order tensors are general (non-symmetric) 3×3 matrices and
//! fourth-order tensors are 9×9 matrices with the row-major index-pair
//! mapping `(i,j) → 3i+j`.

mod elasticity;
mod ops;
mod rotation;
pub use crate::tensor::elasticity::*;
pub use crate::tensor::ops::*;
pub use crate::tensor::rotation::*;
