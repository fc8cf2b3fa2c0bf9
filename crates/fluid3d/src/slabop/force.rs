use glam::{Vec3, Vec4};

use super::{Slabop, StencilOperator};
use crate::fields::{FieldId, Fields};
use crate::layout::TiledLayout;

#[derive(Clone, Copy, Debug)]
pub struct ForceParams {
    pub input: FieldId,
    pub output: FieldId,
    /// Splat centre in grid coordinates.
    pub position: Vec3,
    /// Colour for scalar fields, direction for velocity.
    pub value: Vec4,
    /// Radius in cells.
    pub radius: f32,
    pub amount: f32,
    /// Lower clamp on the result, used when erasing density.
    pub floor: Option<f32>,
}

/// Additive Gaussian splat: `field += amount * value * exp(-d^2 / r^2)`.
#[derive(Clone, Debug)]
pub struct Force {
    op: Slabop,
}

impl Force {
    pub fn new(layout: &TiledLayout) -> Self {
        Self {
            op: Slabop::new(layout),
        }
    }
}

impl StencilOperator for Force {
    type Params<'p> = ForceParams;

    fn compute(&self, fields: &mut Fields, params: ForceParams) {
        if params.radius <= 0.0 {
            return;
        }
        let inverse_radius_squared = 1.0 / (params.radius * params.radius);

        fields.render(params.output, |view, target| {
            let input = view.sampler(params.input);

            self.op.dispatch(target, |cell| {
                let distance_squared = (cell.as_vec3() - params.position).length_squared();
                let falloff = (-distance_squared * inverse_radius_squared).exp();
                let splatted = input.fetch_cell(cell) + params.amount * falloff * params.value;
                match params.floor {
                    Some(floor) => splatted.max(Vec4::splat(floor)),
                    None => splatted,
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{UVec2, UVec3};

    fn setup() -> (TiledLayout, Fields, Force) {
        let layout = TiledLayout::compute(UVec2::new(64, 64), Vec3::splat(20.0)).unwrap();
        let fields = Fields::new(&layout).unwrap();
        let force = Force::new(&layout);
        (layout, fields, force)
    }

    fn splat(amount: f32, radius: f32, floor: Option<f32>) -> ForceParams {
        ForceParams {
            input: FieldId::Density,
            output: FieldId::Density,
            position: Vec3::new(7.0, 7.0, 7.0),
            value: Vec4::ONE,
            radius,
            amount,
            floor,
        }
    }

    #[test]
    fn test_gaussian_falloff() {
        let (layout, mut fields, force) = setup();
        force.compute(&mut fields, splat(1.0, 2.0, None));

        let density = fields.read(FieldId::Density);
        let at = |c: UVec3| density.texel(layout.texel_index(c)).x;
        assert_eq!(at(UVec3::splat(7)), 1.0);
        assert!((at(UVec3::new(9, 7, 7)) - (-1.0f32).exp()).abs() < 1e-6);
        assert!(at(UVec3::new(7, 7, 12)) < 2e-3);
    }

    #[test]
    fn test_erase_floors_at_zero() {
        let (layout, mut fields, force) = setup();
        force.compute(&mut fields, splat(1.0, 2.0, None));
        force.compute(&mut fields, splat(-100.0, 2.0, Some(0.0)));

        let density = fields.read(FieldId::Density);
        assert_eq!(density.texel(layout.texel_index(UVec3::splat(7))).x, 0.0);
        assert!(density.data().iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn test_zero_radius_is_noop() {
        let (_, mut fields, force) = setup();
        force.compute(&mut fields, splat(1.0, 0.0, None));
        assert_eq!(fields.total(FieldId::Density).x, 0.0);
    }
}
