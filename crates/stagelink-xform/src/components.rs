//! Matrix <-> transform component conversion.
//!
//! The canonical local matrix, in column-vector form, is
//!
//! ```text
//! T * Rpt * Rp * R * Ra * Rp^-1 * Spt * Sp * Sh * S * Sp^-1
//! ```
//!
//! where `Sh` is the upper-unit-triangular shear built from `(xy, xz, yz)`.

use crate::error::{Result, XformError};
use crate::rotation::{euler_to_matrix, matrix_to_euler, RotationOrder};
use glam::{DMat3, DMat4, DVec3, DVec4};

/// Axes shorter than this are treated as collapsed.
const MIN_SCALE: f64 = 1e-10;

/// Decomposed local transform. Angles are degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponents {
    pub translate: DVec3,
    pub rotate: DVec3,
    pub rotate_order: RotationOrder,
    pub scale: DVec3,
    /// Shear factors `(xy, xz, yz)`.
    pub shear: DVec3,
    /// Pre-rotation applied before `rotate`, always XYZ.
    pub rotate_axis: DVec3,
    pub rotate_pivot: DVec3,
    pub rotate_pivot_translate: DVec3,
    pub scale_pivot: DVec3,
    pub scale_pivot_translate: DVec3,
}

impl Default for TransformComponents {
    fn default() -> Self {
        Self {
            translate: DVec3::ZERO,
            rotate: DVec3::ZERO,
            rotate_order: RotationOrder::Xyz,
            scale: DVec3::ONE,
            shear: DVec3::ZERO,
            rotate_axis: DVec3::ZERO,
            rotate_pivot: DVec3::ZERO,
            rotate_pivot_translate: DVec3::ZERO,
            scale_pivot: DVec3::ZERO,
            scale_pivot_translate: DVec3::ZERO,
        }
    }
}

impl TransformComponents {
    /// Whether any pivot or pivot translation is non-zero.
    pub fn has_pivots(&self) -> bool {
        self.rotate_pivot != DVec3::ZERO
            || self.rotate_pivot_translate != DVec3::ZERO
            || self.scale_pivot != DVec3::ZERO
            || self.scale_pivot_translate != DVec3::ZERO
    }
}

fn shear_matrix(shear: DVec3) -> DMat4 {
    DMat4::from_cols(
        DVec4::X,
        DVec4::new(shear.x, 1.0, 0.0, 0.0),
        DVec4::new(shear.y, shear.z, 1.0, 0.0),
        DVec4::W,
    )
}

/// Compose a local matrix from components.
pub fn matrix_from_components(c: &TransformComponents) -> DMat4 {
    let rotate = DMat4::from_mat3(euler_to_matrix(c.rotate, c.rotate_order));
    let rotate_axis = DMat4::from_mat3(euler_to_matrix(c.rotate_axis, RotationOrder::Xyz));
    let shear = shear_matrix(c.shear);
    let scale = DMat4::from_scale(c.scale);
    let translate = DMat4::from_translation(c.translate);

    if !c.has_pivots() {
        return translate * rotate * rotate_axis * shear * scale;
    }

    translate
        * DMat4::from_translation(c.rotate_pivot_translate)
        * DMat4::from_translation(c.rotate_pivot)
        * rotate
        * rotate_axis
        * DMat4::from_translation(-c.rotate_pivot)
        * DMat4::from_translation(c.scale_pivot_translate)
        * DMat4::from_translation(c.scale_pivot)
        * shear
        * scale
        * DMat4::from_translation(-c.scale_pivot)
}

/// Decompose a local matrix with XYZ rotation order.
pub fn components_from_matrix(m: &DMat4) -> Result<TransformComponents> {
    components_from_matrix_with_order(m, RotationOrder::Xyz)
}

/// Decompose a local matrix into translate, rotate, scale and shear.
///
/// The linear part's axes are orthonormalised in x, y, z order: each
/// axis length gives its scale and the projections onto earlier axes give
/// the shear. A left-handed basis flips the z scale. Pivots and rotate
/// axis are left at zero.
pub fn components_from_matrix_with_order(m: &DMat4, order: RotationOrder) -> Result<TransformComponents> {
    if !m.is_finite() {
        return Err(XformError::NonFinite);
    }

    let l0 = m.x_axis.truncate();
    let l1 = m.y_axis.truncate();
    let l2 = m.z_axis.truncate();

    let sx = l0.length();
    if sx < MIN_SCALE {
        return Err(XformError::DegenerateScale { axis: 0 });
    }
    let r0 = l0 / sx;

    let d01 = l1.dot(r0);
    let l1_ortho = l1 - d01 * r0;
    let sy = l1_ortho.length();
    if sy < MIN_SCALE {
        return Err(XformError::DegenerateScale { axis: 1 });
    }
    let r1 = l1_ortho / sy;

    let d02 = l2.dot(r0);
    let d12 = l2.dot(r1);
    let l2_ortho = l2 - d02 * r0 - d12 * r1;
    let mut sz = l2_ortho.length();
    if sz < MIN_SCALE {
        return Err(XformError::DegenerateScale { axis: 2 });
    }
    let mut r2 = l2_ortho / sz;

    if r0.cross(r1).dot(r2) < 0.0 {
        sz = -sz;
        r2 = -r2;
    }

    let rotation = DMat3::from_cols(r0, r1, r2);

    Ok(TransformComponents {
        translate: m.w_axis.truncate(),
        rotate: matrix_to_euler(&rotation, order),
        rotate_order: order,
        scale: DVec3::new(sx, sy, sz),
        shear: DVec3::new(d01 / sy, d02 / sz, d12 / sz),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: &DMat4, b: &DMat4, tolerance: f64) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert!((x - y).abs() < tolerance, "{:?}\n!=\n{:?}", a, b);
        }
    }

    #[test]
    fn test_identity() {
        let c = components_from_matrix(&DMat4::IDENTITY).unwrap();
        assert_eq!(c, TransformComponents::default());
        assert_eq!(matrix_from_components(&c), DMat4::IDENTITY);
    }

    #[test]
    fn test_translate_rotate_scale() {
        let components = TransformComponents {
            translate: DVec3::new(1.0, 2.0, 3.0),
            rotate: DVec3::new(10.0, 20.0, 30.0),
            scale: DVec3::new(2.0, 3.0, 4.0),
            ..Default::default()
        };
        let m = matrix_from_components(&components);
        let back = components_from_matrix(&m).unwrap();
        assert!((back.translate - components.translate).length() < 1e-9);
        assert!((back.rotate - components.rotate).length() < 1e-9);
        assert!((back.scale - components.scale).length() < 1e-9);
        assert!(back.shear.length() < 1e-9);
    }

    #[test]
    fn test_shear_round_trip() {
        let components = TransformComponents {
            rotate: DVec3::new(0.0, 45.0, 0.0),
            shear: DVec3::new(0.5, -0.25, 0.125),
            scale: DVec3::new(1.0, 2.0, 0.5),
            ..Default::default()
        };
        let m = matrix_from_components(&components);
        let back = components_from_matrix(&m).unwrap();
        assert!((back.shear - components.shear).length() < 1e-9, "{:?}", back.shear);
        assert_close(&matrix_from_components(&back), &m, 1e-9);
    }

    #[test]
    fn test_negative_determinant_flips_z() {
        let m = DMat4::from_scale(DVec3::new(1.0, 1.0, -2.0));
        let c = components_from_matrix(&m).unwrap();
        assert!((c.scale - DVec3::new(1.0, 1.0, -2.0)).length() < 1e-12);
        assert!(c.rotate.length() < 1e-9);

        // A mirror on x is re-expressed as a z flip plus a rotation.
        let mirrored = DMat4::from_scale(DVec3::new(-3.0, 1.0, 1.0));
        let c = components_from_matrix(&mirrored).unwrap();
        assert!(c.scale.z < 0.0);
        assert_close(&matrix_from_components(&c), &mirrored, 1e-9);
    }

    #[test]
    fn test_degenerate_scale() {
        let m = DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0));
        assert_eq!(components_from_matrix(&m), Err(XformError::DegenerateScale { axis: 1 }));
        let mut nan = DMat4::IDENTITY;
        nan.x_axis.x = f64::NAN;
        assert_eq!(components_from_matrix(&nan), Err(XformError::NonFinite));
    }

    #[test]
    fn test_gimbal_rotation_decomposes() {
        let components = TransformComponents {
            rotate: DVec3::new(30.0, 90.0, 15.0),
            ..Default::default()
        };
        let m = matrix_from_components(&components);
        let back = components_from_matrix(&m).unwrap();
        assert!(back.rotate.is_finite());
        assert!((back.rotate.y - 90.0).abs() < 1e-6);
        assert_close(&matrix_from_components(&back), &m, 1e-9);
    }

    #[test]
    fn test_pivots_compose() {
        let components = TransformComponents {
            rotate: DVec3::new(0.0, 0.0, 90.0),
            rotate_pivot: DVec3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let m = matrix_from_components(&components);
        // Rotating the pivot point about itself leaves it in place.
        let p = m.transform_point3(DVec3::new(1.0, 0.0, 0.0));
        assert!((p - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
        let origin = m.transform_point3(DVec3::ZERO);
        assert!((origin - DVec3::new(1.0, -1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_rotate_axis_applies_first() {
        let components = TransformComponents {
            rotate: DVec3::new(0.0, 0.0, 90.0),
            rotate_axis: DVec3::new(90.0, 0.0, 0.0),
            ..Default::default()
        };
        let m = matrix_from_components(&components);
        // Y -> Z by the rotate axis, then Z is unchanged by the Z rotation.
        let v = m.transform_vector3(DVec3::Y);
        assert!((v - DVec3::Z).length() < 1e-12);
    }

    proptest! {
        #[test]
        fn test_matrix_round_trip(
            t in prop::array::uniform3(-100.0f64..100.0),
            r in prop::array::uniform3(-180.0f64..180.0),
            s in prop::array::uniform3(0.1f64..10.0),
            sh in prop::array::uniform3(-1.0f64..1.0),
            flip in any::<bool>(),
        ) {
            let mut scale = DVec3::from(s);
            if flip {
                scale.z = -scale.z;
            }
            let m = matrix_from_components(&TransformComponents {
                translate: DVec3::from(t),
                rotate: DVec3::from(r),
                scale,
                shear: DVec3::from(sh),
                ..Default::default()
            });
            let back = matrix_from_components(&components_from_matrix(&m).unwrap());
            for (x, y) in back.to_cols_array().iter().zip(m.to_cols_array().iter()) {
                prop_assert!((x - y).abs() < 1e-5, "{} vs {}", x, y);
            }
        }
    }
}
