//! Implements the implicit constitutive update (return mapping) engine

mod local_state;
mod state;
mod state_iterator;
mod stress_solver;
mod stress_updater;
mod substepper;
mod tangent;
mod workspace;
pub use crate::update::local_state::*;
pub use crate::update::state::*;
pub use crate::update::state_iterator::*;
pub use crate::update::stress_solver::*;
pub use crate::update::stress_updater::*;
pub use crate::update::substepper::*;
pub use crate::update::tangent::*;
pub use crate::update::workspace::*;
