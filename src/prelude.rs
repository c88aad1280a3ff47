//! Makes available common structures needed to run a constitutive update
//!
//! You may write `use cpmat::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Config, LineSearchMethod, TangentModulus, UpdateStats, UpdateStatus};
pub use crate::base::{ParamElasticity, ParamFlowRule, SampleParams};
pub use crate::material::{FlowRule, FlowRuleTrait, InternalVariables, SlipGeometry};
pub use crate::tensor::{rotation_from_euler, ElasticityTensor};
pub use crate::update::{LocalState, StressUpdater};
