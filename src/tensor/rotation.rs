use super::t2_new;
use russell_lab::Matrix;

/// Returns the lattice rotation matrix from Bunge Euler angles (z-x-z convention, degrees)
///
/// The returned matrix maps crystal-frame vectors into the sample frame;
/// its columns are the crystal axes expressed in the sample frame.
pub fn rotation_from_euler(phi1: f64, phi: f64, phi2: f64) -> Matrix {
    let (s1, c1) = f64::sin_cos(phi1.to_radians());
    let (sp, cp) = f64::sin_cos(phi.to_radians());
    let (s2, c2) = f64::sin_cos(phi2.to_radians());
    let mut rr = t2_new();
    rr.set(0, 0, c1 * c2 - s1 * s2 * cp);
    rr.set(0, 1, -c1 * s2 - s1 * c2 * cp);
    rr.set(0, 2, s1 * sp);
    rr.set(1, 0, s1 * c2 + c1 * s2 * cp);
    rr.set(1, 1, -s1 * s2 + c1 * c2 * cp);
    rr.set(1, 2, -c1 * sp);
    rr.set(2, 0, s2 * sp);
    rr.set(2, 1, c2 * sp);
    rr.set(2, 2, cp);
    rr
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
