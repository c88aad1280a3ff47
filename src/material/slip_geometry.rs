use crate::tensor::NDIM;
use crate::StrError;
use russell_lab::Matrix;

/// Holds the tolerance for the slip plane-direction orthonormality check
const ORTHONORMAL_TOL: f64 = 1e-8;

/// Holds the slip-system geometry of a crystal in the lattice (crystal) frame
///
/// Plane normals and slip directions are normalized on construction and must
/// be orthonormal pairs.
#[derive(Clone, Debug)]
pub struct SlipGeometry {
    /// Unit slip plane normals
    normals: Vec<[f64; NDIM]>,

    /// Unit slip directions
    directions: Vec<[f64; NDIM]>,
}

/// Normalizes a vector in place and returns false if its magnitude is zero
fn normalize(v: &mut [f64; NDIM]) -> bool {
    let magnitude = f64::sqrt(v[0] * v[0] + v[1] * v[1] + v[2] * v[2]);
    if magnitude == 0.0 {
        return false;
    }
    for i in 0..NDIM {
        v[i] /= magnitude;
    }
    true
}

impl SlipGeometry {
    /// Allocates a new instance from (plane normal, slip direction) rows
    ///
    /// Each row holds the three components of the plane normal followed by the
    /// three components of the slip direction. The vectors need not be unit;
    /// they are normalized here.
    pub fn new(data: &[[f64; 2 * NDIM]]) -> Result<Self, StrError> {
        if data.len() < 1 {
            return Err("at least one slip system is required");
        }
        let mut normals = Vec::with_capacity(data.len());
        let mut directions = Vec::with_capacity(data.len());
        for row in data {
            let mut normal = [row[0], row[1], row[2]];
            let mut direction = [row[3], row[4], row[5]];
            if !normalize(&mut normal) {
                return Err("slip plane normal must be a non-zero vector");
            }
            if !normalize(&mut direction) {
                return Err("slip direction must be a non-zero vector");
            }
            let dot = normal[0] * direction[0] + normal[1] * direction[1] + normal[2] * direction[2];
            if f64::abs(dot) > ORTHONORMAL_TOL {
                return Err("slip direction and plane normal pair is not orthonormal");
            }
            normals.push(normal);
            directions.push(direction);
        }
        Ok(SlipGeometry { normals, directions })
    }

    /// Allocates a single slip system
    pub fn new_single(normal: [f64; NDIM], direction: [f64; NDIM]) -> Result<Self, StrError> {
        SlipGeometry::new(&[[
            normal[0],
            normal[1],
            normal[2],
            direction[0],
            direction[1],
            direction[2],
        ]])
    }

    /// Allocates the 12 octahedral {111}<110> systems of an FCC crystal
    pub fn new_fcc() -> Self {
        SlipGeometry::new(&[
            [1.0, 1.0, 1.0, 1.0, -1.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 0.0, -1.0],
            [1.0, 1.0, 1.0, 0.0, 1.0, -1.0],
            [-1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [-1.0, 1.0, 1.0, 1.0, 0.0, 1.0],
            [-1.0, 1.0, 1.0, 0.0, 1.0, -1.0],
            [1.0, -1.0, 1.0, 1.0, 1.0, 0.0],
            [1.0, -1.0, 1.0, 0.0, 1.0, 1.0],
            [1.0, -1.0, 1.0, 1.0, 0.0, -1.0],
            [1.0, 1.0, -1.0, 1.0, 0.0, 1.0],
            [1.0, 1.0, -1.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, -1.0, 1.0, -1.0, 0.0],
        ])
        .unwrap()
    }

    /// Returns the number of slip systems
    pub fn n_systems(&self) -> usize {
        self.normals.len()
    }

    /// Indicates whether two systems share the same slip plane
    pub fn coplanar(&self, alpha: usize, beta: usize) -> bool {
        let na = &self.normals[alpha];
        let nb = &self.normals[beta];
        let dot = na[0] * nb[0] + na[1] * nb[1] + na[2] * nb[2];
        f64::abs(f64::abs(dot) - 1.0) < ORTHONORMAL_TOL
    }

    /// Calculates the flow direction (Schmid) tensors in the sample frame
    ///
    /// ```text
    /// P[α] = (R·s[α]) ⊗ (R·n[α])
    /// ```
    ///
    /// where R is the lattice rotation. The directions depend only on the
    /// fixed crystal orientation; they are computed once per update call.
    pub fn calc_flow_direction(&self, crysrot: &Matrix, flow_direction: &mut [Matrix]) -> Result<(), StrError> {
        if flow_direction.len() != self.n_systems() {
            return Err("flow_direction slice has the wrong length");
        }
        for alpha in 0..self.n_systems() {
            let mut direction = [0.0; NDIM];
            let mut normal = [0.0; NDIM];
            for j in 0..NDIM {
                for k in 0..NDIM {
                    direction[j] += crysrot.get(j, k) * self.directions[alpha][k];
                    normal[j] += crysrot.get(j, k) * self.normals[alpha][k];
                }
            }
            for j in 0..NDIM {
                for k in 0..NDIM {
                    flow_direction[alpha].set(j, k, direction[j] * normal[k]);
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SlipGeometry;
    use crate::tensor::{t2_identity, t2_new, NDIM};
    use russell_lab::approx_eq;

    #[test]
    fn new_captures_errors() {
        assert_eq!(
            SlipGeometry::new(&[]).err(),
            Some("at least one slip system is required")
        );
        assert_eq!(
            SlipGeometry::new(&[[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]]).err(),
            Some("slip plane normal must be a non-zero vector")
        );
        assert_eq!(
            SlipGeometry::new(&[[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]]).err(),
            Some("slip direction must be a non-zero vector")
        );
        assert_eq!(
            SlipGeometry::new(&[[1.0, 1.0, 1.0, 1.0, 1.0, 0.0]]).err(),
            Some("slip direction and plane normal pair is not orthonormal")
        );
    }

    #[test]
    fn new_fcc_works() {
        let geometry = SlipGeometry::new_fcc();
        assert_eq!(geometry.n_systems(), 12);
        // systems 0..3 share the (111) plane
        assert!(geometry.coplanar(0, 1));
        assert!(geometry.coplanar(0, 2));
        assert!(!geometry.coplanar(0, 3));
    }

    #[test]
    fn calc_flow_direction_works() {
        let geometry = SlipGeometry::new_single([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        let mut flow_direction = vec![t2_new()];
        geometry.calc_flow_direction(&t2_identity(), &mut flow_direction).unwrap();
        // P = e1 ⊗ e2
        for j in 0..NDIM {
            for k in 0..NDIM {
                let expected = if j == 0 && k == 1 { 1.0 } else { 0.0 };
                approx_eq(flow_direction[0].get(j, k), expected, 1e-15);
            }
        }

        let mut wrong = Vec::new();
        assert_eq!(
            geometry.calc_flow_direction(&t2_identity(), &mut wrong).err(),
            Some("flow_direction slice has the wrong length")
        );
    }

    #[test]
    fn schmid_tensors_are_traceless() {
        let geometry = SlipGeometry::new_fcc();
        let mut flow_direction = vec![t2_new(); 12];
        geometry.calc_flow_direction(&t2_identity(), &mut flow_direction).unwrap();
        for alpha in 0..12 {
            let trace = flow_direction[alpha].get(0, 0)
                + flow_direction[alpha].get(1, 1)
                + flow_direction[alpha].get(2, 2);
            approx_eq(trace, 0.0, 1e-14);
        }
    }
}
