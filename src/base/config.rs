use super::{LineSearchMethod, TangentModulus};
use crate::StrError;

/// Defines the smallest allowed tolerance (Config)
pub const CONFIG_MIN_TOL: f64 = 1e-15;

/// Holds the options to control the constitutive update
///
/// The default values correspond to a plain Newton update without line search,
/// without substepping, and with the elastic tangent modulus.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Relative tolerance for the stress residual
    pub tol_rel_residual: f64,

    /// Absolute tolerance for the stress residual
    pub tol_abs_residual: f64,

    /// Relative tolerance for the change of internal (state) variables
    pub tol_rel_state_variable: f64,

    /// Tolerance below which an internal variable is regarded as zero
    pub tol_zero: f64,

    /// Maximum number of Newton iterations of the stress solver
    pub n_max_stress_iterations: usize,

    /// Maximum number of outer iterations for the internal variables
    pub n_max_state_iterations: usize,

    /// Maximum number of substep subdivision attempts (1 = no subdivision)
    pub n_max_substep_attempts: usize,

    /// Enables the line search in the stress solver
    pub use_line_search: bool,

    /// Strategy used by the line search
    pub line_search_method: LineSearchMethod,

    /// Minimum line-search step length
    pub min_line_search_step: f64,

    /// Tolerance for the bisection line search
    pub tol_line_search: f64,

    /// Maximum number of iterations of the bisection line search
    pub n_max_line_search_iterations: usize,

    /// Type of tangent modulus returned to the global solver
    pub tangent_modulus: TangentModulus,

    /// Verbose mode during stress iterations
    pub verbose_iterations: bool,

    /// Enables the recording of the residual norms of the last stress solve
    pub save_residual_history: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            tol_rel_residual: 1e-6,
            tol_abs_residual: 1e-6,
            tol_rel_state_variable: 1e-2,
            tol_zero: 1e-12,
            n_max_stress_iterations: 100,
            n_max_state_iterations: 100,
            n_max_substep_attempts: 1,
            use_line_search: false,
            line_search_method: LineSearchMethod::CutHalf,
            min_line_search_step: 0.01,
            tol_line_search: 0.5,
            n_max_line_search_iterations: 20,
            tangent_modulus: TangentModulus::Elastic,
            verbose_iterations: false,
            save_residual_history: false,
        }
    }

    /// Sets the relative and absolute tolerances for the stress residual
    pub fn set_residual_tolerances(&mut self, rel: f64, abs: f64) -> Result<&mut Self, StrError> {
        if rel < CONFIG_MIN_TOL {
            return Err("tol_rel_residual is too small");
        }
        if abs < CONFIG_MIN_TOL {
            return Err("tol_abs_residual is too small");
        }
        self.tol_rel_residual = rel;
        self.tol_abs_residual = abs;
        Ok(self)
    }

    /// Sets the relative tolerance for the change of internal variables
    pub fn set_state_variable_tolerance(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONFIG_MIN_TOL {
            return Err("tol_rel_state_variable is too small");
        }
        self.tol_rel_state_variable = value;
        Ok(self)
    }

    /// Sets the maximum number of substep subdivision attempts
    pub fn set_n_max_substep_attempts(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_substep_attempts must be ≥ 1");
        }
        self.n_max_substep_attempts = value;
        Ok(self)
    }

    /// Enables the line search and selects its strategy
    pub fn set_line_search(&mut self, method: LineSearchMethod) -> Result<&mut Self, StrError> {
        self.use_line_search = true;
        self.line_search_method = method;
        Ok(self)
    }

    /// Sets the type of tangent modulus returned to the global solver
    pub fn set_tangent_modulus(&mut self, value: TangentModulus) -> Result<&mut Self, StrError> {
        self.tangent_modulus = value;
        Ok(self)
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.tol_rel_residual < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_rel_residual = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rel_residual, CONFIG_MIN_TOL
            ));
        }
        if self.tol_abs_residual < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_abs_residual = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_abs_residual, CONFIG_MIN_TOL
            ));
        }
        if self.tol_rel_state_variable < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_rel_state_variable = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rel_state_variable, CONFIG_MIN_TOL
            ));
        }
        if self.tol_zero < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_zero = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_zero, CONFIG_MIN_TOL
            ));
        }
        if self.n_max_stress_iterations < 1 {
            return Some("n_max_stress_iterations must be ≥ 1".to_string());
        }
        if self.n_max_state_iterations < 1 {
            return Some("n_max_state_iterations must be ≥ 1".to_string());
        }
        if self.n_max_substep_attempts < 1 {
            return Some("n_max_substep_attempts must be ≥ 1".to_string());
        }
        if self.min_line_search_step <= 0.0 || self.min_line_search_step >= 1.0 {
            return Some(format!(
                "min_line_search_step = {:?} is incorrect; it must be 0 < step < 1",
                self.min_line_search_step
            ));
        }
        if self.tol_line_search <= 0.0 || self.tol_line_search >= 1.0 {
            return Some(format!(
                "tol_line_search = {:?} is incorrect; it must be 0 < tol < 1",
                self.tol_line_search
            ));
        }
        if self.n_max_line_search_iterations < 1 {
            return Some("n_max_line_search_iterations must be ≥ 1".to_string());
        }
        None // all good
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
