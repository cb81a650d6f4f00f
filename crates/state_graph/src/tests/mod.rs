//! Frame-level tests that span the state, graph and cull modules

mod frame_scenarios;

use slotmap::SlotMap;

use crate::foundation::math::{BoundingSphere, Mat4, Point3, Vec3};
use crate::graph::DrawableId;
use crate::cull::DrawableVisit;
use crate::state::{
    ProgramId, RenderStateDescriptor, RenderingHint, StateCategory, StateSet, StateValue, TextureId,
};

/// Scene stand-in that mints drawable handles
pub(crate) struct TestScene {
    drawables: SlotMap<DrawableId, &'static str>,
}

impl TestScene {
    pub fn new() -> Self {
        Self {
            drawables: SlotMap::with_key(),
        }
    }

    pub fn add(&mut self, label: &'static str) -> DrawableId {
        self.drawables.insert(label)
    }

    pub fn label(&self, id: DrawableId) -> &'static str {
        self.drawables[id]
    }
}

pub(crate) fn program(id: u32) -> RenderStateDescriptor {
    StateSet::new()
        .with(StateCategory::Program, StateValue::Program(ProgramId(id)))
        .unwrap()
        .build()
}

pub(crate) fn texture(unit: u8, id: u32) -> RenderStateDescriptor {
    StateSet::new()
        .with(StateCategory::Texture(unit), StateValue::Texture(TextureId(id)))
        .unwrap()
        .build()
}

pub(crate) fn transparent() -> RenderStateDescriptor {
    StateSet::new()
        .with_rendering_hint(RenderingHint::Transparent)
        .build()
}

/// A unit-radius drawable `distance` units in front of the eye
pub(crate) fn visit_at(drawable: DrawableId, distance: f32) -> DrawableVisit {
    DrawableVisit::new(
        drawable,
        Mat4::new_translation(&Vec3::new(0.0, 0.0, -distance)),
        BoundingSphere::new(Point3::origin(), 1.0),
    )
}
