use serde::{Deserialize, Serialize};

/// Holds parameters for the elastic stiffness of the crystal lattice
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum ParamElasticity {
    /// Isotropic linear elasticity
    Isotropic {
        /// Young's modulus
        young: f64,

        /// Poisson's coefficient
        poisson: f64,
    },

    /// Cubic-symmetry linear elasticity
    Cubic {
        /// Stiffness component C₁₁
        c11: f64,

        /// Stiffness component C₁₂
        c12: f64,

        /// Stiffness component C₄₄
        c44: f64,
    },
}

/// Holds parameters for flow-rule models
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum ParamFlowRule {
    /// Phenomenological power-law model with Voce-type hardening
    ///
    /// The slip rate on each system is
    ///
    /// ```text
    /// rate = γ̇₀ sign(τ) |τ/g|^(1/m)
    /// ```
    ///
    /// and the resistance evolves as
    ///
    /// ```text
    /// ġ_α = Σ_β q_αβ h₀ |1 - g_β/g_sat|^a sign(1 - g_β/g_sat) |rate_β|
    /// ```
    PowerLaw {
        /// Reference slip rate γ̇₀
        gamma_dot0: f64,

        /// Rate sensitivity exponent m (the rate law uses 1/m)
        rate_exponent: f64,

        /// Initial slip resistance g₀
        g0: f64,

        /// Saturation resistance
        g_sat: f64,

        /// Reference hardening rate h₀
        h0: f64,

        /// Hardening exponent a
        hardening_exponent: f64,

        /// Latent hardening ratio q (self-hardening ratio is 1)
        latent_ratio: f64,

        /// Maximum allowable |rate|·Δt in a substep
        slip_increment_tol: f64,
    },

    /// Dislocation-density based model with Kocks-Mecking evolution
    ///
    /// The internal variable is the per-system dislocation density ρ with
    ///
    /// ```text
    /// ρ̇ = (k₁ √ρ - k₂ ρ) |rate|
    /// ```
    ///
    /// and the resistance follows the Taylor relation
    ///
    /// ```text
    /// g = g₀ + c μ b √ρ
    /// ```
    DislocationDensity {
        /// Reference slip rate γ̇₀
        gamma_dot0: f64,

        /// Rate sensitivity exponent m (the rate law uses 1/m)
        rate_exponent: f64,

        /// Initial lattice friction g₀
        g0: f64,

        /// Initial dislocation density ρ₀
        rho0: f64,

        /// Multiplication coefficient k₁
        k1: f64,

        /// Dynamic recovery coefficient k₂
        k2: f64,

        /// Taylor hardening coefficient c
        c_taylor: f64,

        /// Shear modulus μ
        shear_modulus: f64,

        /// Burgers vector magnitude b
        burgers: f64,

        /// Maximum allowable |rate|·Δt in a substep
        slip_increment_tol: f64,
    },
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
