//! Rotation orders, Euler extraction and Euler filtering.
//!
//! An Euler triple is always stored per axis (`x`, `y`, `z` in degrees);
//! the [`RotationOrder`] says which axis is applied first. For order XYZ
//! the matrix is `Rz * Ry * Rx`, so X rotates the point first.

use glam::{DMat3, DQuat, DVec3};
use std::f64::consts::FRAC_PI_2;

/// `|sin(middle angle)|` above `1 - GIMBAL_TOLERANCE` is treated as a pole.
const GIMBAL_TOLERANCE: f64 = 1e-12;

/// Order in which the three axis rotations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationOrder {
    #[default]
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    Yxz,
    Zyx,
}

impl RotationOrder {
    /// All orders, indexed like a host `rotateOrder` enum.
    pub const ALL: [RotationOrder; 6] = [
        RotationOrder::Xyz,
        RotationOrder::Yzx,
        RotationOrder::Zxy,
        RotationOrder::Xzy,
        RotationOrder::Yxz,
        RotationOrder::Zyx,
    ];

    /// Axis indices in application order (first applied first).
    pub fn axes(self) -> [usize; 3] {
        match self {
            RotationOrder::Xyz => [0, 1, 2],
            RotationOrder::Yzx => [1, 2, 0],
            RotationOrder::Zxy => [2, 0, 1],
            RotationOrder::Xzy => [0, 2, 1],
            RotationOrder::Yxz => [1, 0, 2],
            RotationOrder::Zyx => [2, 1, 0],
        }
    }

    /// Cyclic orders are even permutations of XYZ.
    fn parity(self) -> f64 {
        match self {
            RotationOrder::Xyz | RotationOrder::Yzx | RotationOrder::Zxy => 1.0,
            _ => -1.0,
        }
    }

    /// Host enum index (xyz = 0 ... zyx = 5).
    pub fn index(self) -> i32 {
        Self::ALL.iter().position(|o| *o == self).unwrap_or(0) as i32
    }

    /// Order for a host enum index.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Order named by an op suffix such as `XYZ`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "XYZ" => Some(RotationOrder::Xyz),
            "YZX" => Some(RotationOrder::Yzx),
            "ZXY" => Some(RotationOrder::Zxy),
            "XZY" => Some(RotationOrder::Xzy),
            "YXZ" => Some(RotationOrder::Yxz),
            "ZYX" => Some(RotationOrder::Zyx),
            _ => None,
        }
    }

    /// Suffix form, e.g. `XYZ`.
    pub fn suffix(self) -> &'static str {
        match self {
            RotationOrder::Xyz => "XYZ",
            RotationOrder::Yzx => "YZX",
            RotationOrder::Zxy => "ZXY",
            RotationOrder::Xzy => "XZY",
            RotationOrder::Yxz => "YXZ",
            RotationOrder::Zyx => "ZYX",
        }
    }
}

fn axis_rotation(axis: usize, radians: f64) -> DMat3 {
    match axis {
        0 => DMat3::from_rotation_x(radians),
        1 => DMat3::from_rotation_y(radians),
        _ => DMat3::from_rotation_z(radians),
    }
}

/// Rotation matrix for an Euler triple in degrees.
pub fn euler_to_matrix(euler: DVec3, order: RotationOrder) -> DMat3 {
    let [i, j, k] = order.axes();
    axis_rotation(k, euler[k].to_radians())
        * axis_rotation(j, euler[j].to_radians())
        * axis_rotation(i, euler[i].to_radians())
}

/// Extract an Euler triple (degrees) from a pure rotation matrix.
///
/// At the poles (middle angle = +/-90 deg) the first and last axes are
/// coupled; the last angle is set to zero and the first absorbs the whole
/// remaining rotation, so the result is never NaN.
pub fn matrix_to_euler(m: &DMat3, order: RotationOrder) -> DVec3 {
    let [i, j, k] = order.axes();
    let sign = order.parity();
    let r = |row: usize, col: usize| m.col(col)[row];

    let sin_mid = (-sign * r(k, i)).clamp(-1.0, 1.0);
    let (first, middle, last);
    if sin_mid.abs() < 1.0 - GIMBAL_TOLERANCE {
        middle = sin_mid.asin();
        first = (sign * r(k, j)).atan2(r(k, k));
        last = (sign * r(j, i)).atan2(r(i, i));
    } else {
        middle = FRAC_PI_2.copysign(sin_mid);
        first = (-sign * r(j, k)).atan2(r(j, j));
        last = 0.0;
    }

    let mut euler = DVec3::ZERO;
    euler[i] = first.to_degrees();
    euler[j] = middle.to_degrees();
    euler[k] = last.to_degrees();
    euler
}

/// Euler triple (degrees) for a quaternion.
pub fn quat_to_euler(q: DQuat, order: RotationOrder) -> DVec3 {
    matrix_to_euler(&DMat3::from_quat(q.normalize()), order)
}

/// Euler triple (degrees) for a rotation of `angle_degrees` about `axis`.
///
/// Returns `None` for a zero-length axis.
pub fn axis_angle_to_euler(axis: DVec3, angle_degrees: f64, order: RotationOrder) -> Option<DVec3> {
    let axis = axis.try_normalize()?;
    let m = DMat3::from_axis_angle(axis, angle_degrees.to_radians());
    Some(matrix_to_euler(&m, order))
}

/// Axis and angle (degrees) equivalent to an Euler triple.
pub fn euler_to_axis_angle(euler: DVec3, order: RotationOrder) -> (DVec3, f64) {
    let q = DQuat::from_mat3(&euler_to_matrix(euler, order));
    let (axis, angle) = q.to_axis_angle();
    (axis, angle.to_degrees())
}

/// Shift each angle by whole turns so it lands nearest `reference`.
fn wrap_near(angles: DVec3, reference: DVec3) -> DVec3 {
    let mut out = angles;
    for axis in 0..3 {
        let turns = ((reference[axis] - angles[axis]) / 360.0).round();
        out[axis] = angles[axis] + turns * 360.0;
    }
    out
}

fn angular_distance(a: DVec3, b: DVec3) -> f64 {
    (a - b).abs().element_sum()
}

/// The Euler triple equivalent to `current` that is closest to `previous`.
///
/// Considers whole-turn wrapping and the alternate solution
/// `(first + 180, 180 - middle, last + 180)`.
pub fn filter_euler(previous: DVec3, current: DVec3, order: RotationOrder) -> DVec3 {
    let [i, j, k] = order.axes();
    let naive = wrap_near(current, previous);

    let mut flipped = current;
    flipped[i] += 180.0;
    flipped[j] = 180.0 - flipped[j];
    flipped[k] += 180.0;
    let flipped = wrap_near(flipped, previous);

    if angular_distance(flipped, previous) < angular_distance(naive, previous) {
        flipped
    } else {
        naive
    }
}

/// Stateful filter applied across a sequence of rotation samples.
#[derive(Debug, Clone)]
pub struct EulerFilter {
    order: RotationOrder,
    previous: Option<DVec3>,
}

impl EulerFilter {
    /// Create a filter for one rotation order.
    pub fn new(order: RotationOrder) -> Self {
        Self {
            order,
            previous: None,
        }
    }

    /// Filter the next sample. The first sample passes through unchanged.
    pub fn filter(&mut self, current: DVec3) -> DVec3 {
        let out = match self.previous {
            Some(previous) => filter_euler(previous, current, self.order),
            None => current,
        };
        self.previous = Some(out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_close(a: &DMat3, b: &DMat3) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_xyz_composition_order() {
        // X is applied first: rotating +Y by 90 about X gives +Z, then 90 about Z leaves Z.
        let m = euler_to_matrix(DVec3::new(90.0, 0.0, 90.0), RotationOrder::Xyz);
        let v = m * DVec3::Y;
        assert!((v - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_round_trip_all_orders() {
        let euler = DVec3::new(30.0, -45.0, 60.0);
        for order in RotationOrder::ALL {
            let m = euler_to_matrix(euler, order);
            let back = matrix_to_euler(&m, order);
            assert!((back - euler).length() < 1e-9, "{:?}: {:?}", order, back);
        }
    }

    #[test]
    fn test_gimbal_lock_is_finite() {
        for y in [90.0, -90.0] {
            let euler = DVec3::new(25.0, y, 40.0);
            let m = euler_to_matrix(euler, RotationOrder::Xyz);
            let back = matrix_to_euler(&m, RotationOrder::Xyz);
            assert!(back.is_finite());
            assert_eq!(back.z, 0.0);
            assert!((back.y - y).abs() < 1e-9);
            assert_mat_close(&euler_to_matrix(back, RotationOrder::Xyz), &m);
        }
    }

    #[test]
    fn test_gimbal_lock_other_orders() {
        for order in RotationOrder::ALL {
            let [_, j, _] = order.axes();
            let mut euler = DVec3::new(10.0, 20.0, 30.0);
            euler[j] = 90.0;
            let m = euler_to_matrix(euler, order);
            let back = matrix_to_euler(&m, order);
            assert!(back.is_finite());
            assert_mat_close(&euler_to_matrix(back, order), &m);
        }
    }

    #[test]
    fn test_order_index() {
        for order in RotationOrder::ALL {
            assert_eq!(RotationOrder::from_index(order.index()), Some(order));
            assert_eq!(RotationOrder::from_suffix(order.suffix()), Some(order));
        }
        assert_eq!(RotationOrder::from_index(6), None);
        assert_eq!(RotationOrder::from_index(-1), None);
    }

    #[test]
    fn test_filter_wraps_turns() {
        let out = filter_euler(DVec3::new(350.0, 0.0, 0.0), DVec3::new(-5.0, 0.0, 0.0), RotationOrder::Xyz);
        assert!((out.x - 355.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_prefers_flipped_solution() {
        let order = RotationOrder::Xyz;
        let previous = DVec3::new(170.0, 10.0, 170.0);
        // Same orientation as (190, 10, 190) expressed through the alternate solution.
        let current = DVec3::new(10.0, 170.0, 10.0);
        let out = filter_euler(previous, current, order);
        assert!((out - DVec3::new(190.0, 10.0, 190.0)).length() < 1e-9, "{:?}", out);
        assert_mat_close(&euler_to_matrix(out, order), &euler_to_matrix(current, order));
    }

    #[test]
    fn test_euler_filter_sequence() {
        let mut filter = EulerFilter::new(RotationOrder::Xyz);
        let a = filter.filter(DVec3::new(179.0, 0.0, 0.0));
        let b = filter.filter(DVec3::new(-179.0, 0.0, 0.0));
        assert_eq!(a.x, 179.0);
        assert!((b.x - 181.0).abs() < 1e-9);
    }

    #[test]
    fn test_axis_angle() {
        let euler = axis_angle_to_euler(DVec3::Z, 90.0, RotationOrder::Xyz).unwrap();
        assert!((euler - DVec3::new(0.0, 0.0, 90.0)).length() < 1e-9);
        assert!(axis_angle_to_euler(DVec3::ZERO, 90.0, RotationOrder::Xyz).is_none());

        let (axis, angle) = euler_to_axis_angle(DVec3::new(0.0, 45.0, 0.0), RotationOrder::Xyz);
        assert!((axis - DVec3::Y).length() < 1e-9);
        assert!((angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_quat_to_euler() {
        let q = DQuat::from_rotation_x(30f64.to_radians());
        let euler = quat_to_euler(q, RotationOrder::Zyx);
        assert!((euler - DVec3::new(30.0, 0.0, 0.0)).length() < 1e-9);
    }
}
