use serde::{Deserialize, Serialize};

/// Defines the strategy used by the line search in the stress solver
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum LineSearchMethod {
    /// Halves the Newton step until the residual norm improves
    CutHalf,

    /// Bisects the bracket of the residual directional derivative along the Newton direction
    Bisection,
}

/// Defines the type of tangent modulus returned to the global solver
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TangentModulus {
    /// Elastic stiffness (cheap and always available; conservative preconditioner)
    Elastic,

    /// Consistent elasto-plastic tangent evaluated at the converged state
    Consistent,
}

/// Defines the outcome of a constitutive update at one integration point
///
/// All variants except [UpdateStatus::SubstepLimitExceeded] are handled internally
/// by the substep controller (subdivide-and-retry); only the fatal variant is ever
/// returned by [crate::update::StressUpdater::update_stress].
#[repr(i32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum UpdateStatus {
    /// The update converged and all results were committed
    Converged = 0,

    /// A slip-rate magnitude times the substep size exceeded the allowed increment
    RateToleranceExceeded = 1,

    /// The stress Newton loop exhausted its iteration budget
    StressNotConverged = 2,

    /// No line-search step length improved the residual above the minimum step
    LineSearchFailed = 3,

    /// The outer state-variable loop exhausted its iteration budget
    HardnessNotConverged = 4,

    /// An internal variable integrated to a negative value outside the near-zero clamp
    NegativeStateVariable = 5,

    /// The substep subdivisions exceeded the configured maximum (fatal)
    SubstepLimitExceeded = 6,
}

impl UpdateStatus {
    /// Returns a static string describing this status
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Converged => "converged",
            UpdateStatus::RateToleranceExceeded => "slip increment exceeds tolerance",
            UpdateStatus::StressNotConverged => "stress iterations did not converge",
            UpdateStatus::LineSearchFailed => "line search failed",
            UpdateStatus::HardnessNotConverged => "state variable iterations did not converge",
            UpdateStatus::NegativeStateVariable => "internal variable became negative",
            UpdateStatus::SubstepLimitExceeded => "substep limit exceeded (constitutive failure)",
        }
    }

    /// Indicates whether this status must be propagated to the caller
    pub fn fatal(&self) -> bool {
        *self == UpdateStatus::SubstepLimitExceeded
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{LineSearchMethod, TangentModulus, UpdateStatus};

    #[test]
    fn derive_works() {
        let method = LineSearchMethod::CutHalf;
        let clone = method.clone();
        assert_eq!(format!("{:?}", clone), "CutHalf");
        assert_eq!(method, LineSearchMethod::CutHalf);
        assert!(method != LineSearchMethod::Bisection);

        let tangent = TangentModulus::Elastic;
        assert_eq!(format!("{:?}", tangent.clone()), "Elastic");

        let status = UpdateStatus::Converged;
        assert_eq!(format!("{:?}", status.clone()), "Converged");
    }

    #[test]
    fn as_str_and_fatal_work() {
        let all = [
            UpdateStatus::Converged,
            UpdateStatus::RateToleranceExceeded,
            UpdateStatus::StressNotConverged,
            UpdateStatus::LineSearchFailed,
            UpdateStatus::HardnessNotConverged,
            UpdateStatus::NegativeStateVariable,
            UpdateStatus::SubstepLimitExceeded,
        ];
        for status in &all {
            assert!(status.as_str().len() > 0);
            assert_eq!(status.fatal(), *status == UpdateStatus::SubstepLimitExceeded);
        }
        assert_eq!(UpdateStatus::SubstepLimitExceeded as i32, 6);
    }
}
