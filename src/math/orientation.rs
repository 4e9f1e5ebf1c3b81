use std::fmt;
use std::str::FromStr;

use super::{Rotation3, Vector3};

/// Convention used to combine three configured angles into one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationMode {
    /// First angle around x, second around y, last around z (extrinsic).
    #[default]
    Xyz,
    /// First angle around z, second around the new y, last around the new x.
    Zyx,
    /// Passive Z-X-Z Euler angles (phi, theta, psi).
    Zxz,
}

impl OrientationMode {
    /// Combines the angles `(a, b, c)` into a single rotation.
    #[must_use]
    pub fn rotation(self, angles: &Vector3) -> Rotation3 {
        let (a, b, c) = (angles.x, angles.y, angles.z);
        match self {
            // Rz(c) * Ry(b) * Rx(a)
            Self::Xyz => Rotation3::from_euler_angles(a, b, c),
            // Rz(a) * Ry(b) * Rx(c)
            Self::Zyx => Rotation3::from_euler_angles(c, b, a),
            Self::Zxz => {
                Rotation3::from_axis_angle(&Vector3::z_axis(), -c)
                    * Rotation3::from_axis_angle(&Vector3::x_axis(), -b)
                    * Rotation3::from_axis_angle(&Vector3::z_axis(), -a)
            }
        }
    }

    /// Returns the configuration keyword of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xyz => "xyz",
            Self::Zyx => "zyx",
            Self::Zxz => "zxz",
        }
    }
}

impl FromStr for OrientationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xyz" => Ok(Self::Xyz),
            "zyx" => Ok(Self::Zyx),
            "zxz" => Ok(Self::Zxz),
            _ => Err("orientation_mode should be either 'zyx', 'xyz' or 'zxz'".to_owned()),
        }
    }
}

impl fmt::Display for OrientationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn parse_known_modes() {
        assert_eq!("xyz".parse::<OrientationMode>().unwrap(), OrientationMode::Xyz);
        assert_eq!("zyx".parse::<OrientationMode>().unwrap(), OrientationMode::Zyx);
        assert_eq!("zxz".parse::<OrientationMode>().unwrap(), OrientationMode::Zxz);
        assert!("xzy".parse::<OrientationMode>().is_err());
        assert!("XYZ".parse::<OrientationMode>().is_err());
    }

    #[test]
    fn zero_angles_give_identity() {
        for mode in [OrientationMode::Xyz, OrientationMode::Zyx, OrientationMode::Zxz] {
            let rot = mode.rotation(&Vector3::zeros());
            assert_relative_eq!(rot, Rotation3::identity(), epsilon = 1e-15);
        }
    }

    #[test]
    fn xyz_applies_last_angle_around_z() {
        let rot = OrientationMode::Xyz.rotation(&Vector3::new(0.0, 0.0, FRAC_PI_2));
        let v = rot * Vector3::x();
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn zyx_applies_first_angle_around_z() {
        let rot = OrientationMode::Zyx.rotation(&Vector3::new(FRAC_PI_2, 0.0, 0.0));
        let v = rot * Vector3::x();
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn xyz_order_is_x_then_y_then_z() {
        let angles = Vector3::new(0.3, -0.7, 1.1);
        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), 1.1)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), -0.7)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), 0.3);
        assert_relative_eq!(OrientationMode::Xyz.rotation(&angles), expected, epsilon = 1e-12);
    }

    #[test]
    fn zxz_matches_passive_euler_matrix() {
        let (phi, theta, psi) = (0.4_f64, 0.9_f64, -0.25_f64);
        let rot = OrientationMode::Zxz.rotation(&Vector3::new(phi, theta, psi));
        let m = rot.matrix();

        assert_relative_eq!(
            m[(0, 0)],
            psi.cos() * phi.cos() - psi.sin() * theta.cos() * phi.sin(),
            epsilon = 1e-12
        );
        assert_relative_eq!(m[(0, 2)], psi.sin() * theta.sin(), epsilon = 1e-12);
        assert_relative_eq!(m[(2, 0)], theta.sin() * phi.sin(), epsilon = 1e-12);
        assert_relative_eq!(m[(2, 1)], -theta.sin() * phi.cos(), epsilon = 1e-12);
        assert_relative_eq!(m[(2, 2)], theta.cos(), epsilon = 1e-12);
    }
}
