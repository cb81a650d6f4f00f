//! Frame dump demo
//!
//! Builds a small synthetic scene (skybox, opaque props, glass panes and a
//! HUD overlay), runs it through the state-sorted render graph for a few
//! frames while the camera orbits, and logs the resulting draw order.
//!
//! Usage: `frame_dump [config.toml|config.ron] [frames]`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;
use state_graph::foundation::logging;
use state_graph::prelude::*;
use state_graph::state::{BlendFunc, CompareFunc};
use thiserror::Error;

const DEFAULT_FRAMES: u32 = 4;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] state_graph::ConfigError),
    #[error("Render graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("Invalid frame count '{0}'")]
    FrameCount(String),
}

/// What kind of object a drawable is, which decides its state and bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Sky,
    Prop,
    Glass,
    Hud,
}

#[derive(Debug, Clone)]
struct SceneObject {
    label: String,
    kind: Kind,
    position: Vec3,
    radius: f32,
    material: u32,
}

/// Render state shared by objects of the same kind
struct Materials {
    sky: RenderStateDescriptor,
    props: Vec<RenderStateDescriptor>,
    glass: RenderStateDescriptor,
    hud: RenderStateDescriptor,
    lit: RenderStateDescriptor,
}

impl Materials {
    fn new(prop_materials: u32) -> Result<Self, GraphError> {
        let sky = StateSet::new()
            .with(StateCategory::Program, StateValue::Program(ProgramId(0)))?
            .with(StateCategory::DepthWrite, StateValue::DepthWrite(false))?
            .build();

        let props = (0..prop_materials)
            .map(|i| {
                Ok(StateSet::new()
                    .with(StateCategory::Program, StateValue::Program(ProgramId(1 + i % 2)))?
                    .with(StateCategory::Texture(0), StateValue::Texture(TextureId(100 + i)))?
                    .build())
            })
            .collect::<Result<Vec<_>, GraphError>>()?;

        let glass = StateSet::new()
            .with(StateCategory::Program, StateValue::Program(ProgramId(3)))?
            .with(StateCategory::Blend, StateValue::Blend(Some(BlendFunc::ALPHA)))?
            .with(StateCategory::DepthWrite, StateValue::DepthWrite(false))?
            .with_rendering_hint(RenderingHint::Transparent)
            .build();

        let hud = StateSet::new()
            .with(StateCategory::Program, StateValue::Program(ProgramId(4)))?
            .with(StateCategory::DepthTest, StateValue::DepthTest(None))?
            .with_flags(
                StateCategory::Lighting,
                StateValue::Lighting(false),
                StateFlags::OVERRIDE,
            )?
            .build();

        // Scene-wide state pushed at the root of the traversal
        let lit = StateSet::new()
            .with(StateCategory::Lighting, StateValue::Lighting(true))?
            .with(StateCategory::DepthTest, StateValue::DepthTest(Some(CompareFunc::Less)))?
            .build();

        Ok(Self {
            sky,
            props,
            glass,
            hud,
            lit,
        })
    }
}

struct Scene {
    objects: SlotMap<DrawableId, SceneObject>,
    materials: Materials,
}

impl Scene {
    fn generate(rng: &mut StdRng) -> Result<Self, GraphError> {
        let materials = Materials::new(4)?;
        let mut objects = SlotMap::with_key();

        objects.insert(SceneObject {
            label: "sky dome".to_string(),
            kind: Kind::Sky,
            position: Vec3::zeros(),
            radius: 500.0,
            material: 0,
        });

        for i in 0..12 {
            objects.insert(SceneObject {
                label: format!("crate {i}"),
                kind: Kind::Prop,
                position: Vec3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0)),
                radius: rng.gen_range(0.5..2.0),
                material: rng.gen_range(0..4),
            });
        }

        for i in 0..4 {
            objects.insert(SceneObject {
                label: format!("glass pane {i}"),
                kind: Kind::Glass,
                position: Vec3::new(rng.gen_range(-10.0..10.0), 1.0, rng.gen_range(-10.0..10.0)),
                radius: 1.5,
                material: 0,
            });
        }

        for label in ["crosshair", "score"] {
            objects.insert(SceneObject {
                label: label.to_string(),
                kind: Kind::Hud,
                position: Vec3::zeros(),
                radius: 0.1,
                material: 0,
            });
        }

        log::info!("Generated scene with {} drawables", objects.len());
        Ok(Self { objects, materials })
    }

    /// Walk the scene as the cull traversal would and record its events
    fn traverse(&self, view: &Mat4) -> Vec<TraversalEvent> {
        let mut events = vec![
            TraversalEvent::EnterNode,
            TraversalEvent::StateOverride(self.materials.lit.clone()),
        ];

        for (id, object) in &self.objects {
            events.push(TraversalEvent::EnterNode);
            let model = Mat4::new_translation(&object.position);
            let model_view = match object.kind {
                Kind::Sky => {
                    events.push(TraversalEvent::BinRedirect(BinTarget::new(-1, Some("Skybox"))));
                    events.push(TraversalEvent::StateOverride(self.materials.sky.clone()));
                    // Sky follows the camera
                    Mat4::identity()
                }
                Kind::Prop => {
                    let material = &self.materials.props[object.material as usize];
                    events.push(TraversalEvent::StateOverride(material.clone()));
                    view * model
                }
                Kind::Glass => {
                    events.push(TraversalEvent::StateOverride(self.materials.glass.clone()));
                    view * model
                }
                Kind::Hud => {
                    events.push(TraversalEvent::BinRedirect(BinTarget::new(100, Some("UIOverlay"))));
                    events.push(TraversalEvent::StateOverride(self.materials.hud.clone()));
                    Mat4::identity()
                }
            };
            events.push(TraversalEvent::Drawable(DrawableVisit::new(
                id,
                model_view,
                BoundingSphere::new(Point3::origin(), object.radius),
            )));
            events.push(TraversalEvent::LeaveNode);
        }

        events.push(TraversalEvent::LeaveNode);
        events
    }
}

fn camera_view(frame: u32) -> Mat4 {
    let angle = frame as f32 * 0.4;
    let eye = Point3::new(30.0 * angle.cos(), 8.0, 30.0 * angle.sin());
    Mat4::look_at_rh(&eye, &Point3::origin(), &Vec3::y())
}

fn run(config: &RenderGraphConfig, frames: u32) -> Result<(), DemoError> {
    let mut rng = StdRng::seed_from_u64(7);
    let scene = Scene::generate(&mut rng)?;
    let mut accumulator = TraversalAccumulator::new(config);

    for frame in 0..frames {
        let events = scene.traverse(&camera_view(frame));
        if let Err(err) = accumulator.accumulate(events) {
            log::error!("Frame {frame} dropped: {err}");
            continue;
        }

        let stats = accumulator.stats()?;
        let near_far = accumulator.near_far();
        log::info!(
            "Frame {}: {} leaves, {} bins, {} state nodes, {} state changes, near {:?} far {:?}",
            accumulator.frame_number(),
            stats.leaves,
            stats.bins,
            stats.state_nodes,
            stats.state_changes,
            near_far.near(),
            near_far.far()
        );

        for bin in accumulator.bins().bins().filter(|bin| !bin.is_empty()) {
            log::debug!(
                "  bin {:>4} {:<16} {:?}: {} leaves",
                bin.order(),
                bin.name().unwrap_or("-"),
                bin.sort_mode(),
                bin.leaf_count()
            );
        }

        let mut position = 0;
        accumulator.emit_all(|item| {
            let object = &scene.objects[item.drawable];
            log::debug!(
                "  #{position:02} {:<14} depth {:>8.2} state {:?}",
                object.label,
                item.depth,
                item.state.entries().iter().map(|entry| entry.value).collect::<Vec<_>>()
            );
            position += 1;
        })?;
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let frames = args.next();

    let config = match config_path.as_deref() {
        Some(path) => RenderGraphConfig::load_from_file(path)
            .and_then(|config| config.validate().map(|()| config)),
        None => Ok(RenderGraphConfig::default()),
    };

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            logging::init_with_level("info");
            log::error!("{}", DemoError::from(err));
            std::process::exit(1);
        }
    };
    logging::init_with_level(&config.log_level);

    let frames = match frames.map(|arg| arg.parse::<u32>().map_err(|_| DemoError::FrameCount(arg))) {
        Some(Ok(frames)) => frames,
        Some(Err(err)) => {
            log::error!("{err}");
            std::process::exit(1);
        }
        None => DEFAULT_FRAMES,
    };

    log::info!("Running {frames} frames");
    if let Err(err) = run(&config, frames) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
