//! Ordering guarantees of the finished draw sequence

use super::*;
use crate::core::config::RenderGraphConfig;
use crate::cull::{BinTarget, TraversalAccumulator, TraversalEvent};
use crate::graph::{DrawItem, Leaf, RenderBinSet, SortMode};

/// Deterministic generator for the property checks
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }
}

fn collect(set: &mut RenderBinSet) -> Vec<(DrawableId, RenderStateDescriptor, f32)> {
    let mut out = Vec::new();
    set.emit_all(|item: DrawItem<'_>| out.push((item.drawable, item.state.clone(), item.depth)))
        .unwrap();
    out
}

#[test]
fn test_state_order_is_consistent_and_stable() {
    let mut scene = TestScene::new();
    let mut rng = Lcg(7);
    let mut set = RenderBinSet::default();
    let mut inserted = Vec::new();

    for _ in 0..200 {
        let id = scene.add("leaf");
        let descriptor = program(rng.next_u32() % 5);
        set.get_or_create_bin(0, None)
            .insert(std::slice::from_ref(&descriptor), Leaf::new(id, Mat4::identity(), 0.0))
            .unwrap();
        inserted.push(id);
    }

    let emitted = collect(&mut set);
    assert_eq!(emitted.len(), inserted.len());
    for pair in emitted.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.1 <= b.1, "descriptor order violated");
        if a.1 == b.1 {
            let ia = inserted.iter().position(|id| *id == a.0).unwrap();
            let ib = inserted.iter().position(|id| *id == b.0).unwrap();
            assert!(ia < ib, "equal-state leaves reordered");
        }
    }
}

#[test]
fn test_depth_sorted_is_non_increasing_and_stable() {
    let mut scene = TestScene::new();
    let mut rng = Lcg(42);
    let mut set = RenderBinSet::default();
    let mut inserted = Vec::new();

    for _ in 0..200 {
        let id = scene.add("leaf");
        let depth = (rng.next_u32() % 10) as f32;
        let descriptor = program(rng.next_u32() % 3);
        set.get_or_create_bin(10, Some("DepthSortedBin"))
            .insert(&[descriptor], Leaf::new(id, Mat4::identity(), depth))
            .unwrap();
        inserted.push(id);
    }

    let emitted = collect(&mut set);
    for pair in emitted.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.2 >= b.2, "depth order violated");
        if a.2 == b.2 {
            let ia = inserted.iter().position(|id| *id == a.0).unwrap();
            let ib = inserted.iter().position(|id| *id == b.0).unwrap();
            assert!(ia < ib, "equal-depth leaves reordered");
        }
    }
}

#[test]
fn test_clean_then_emit_visits_nothing() {
    let mut scene = TestScene::new();
    let mut set = RenderBinSet::default();
    set.get_or_create_bin(0, None)
        .insert(&[program(1)], Leaf::new(scene.add("a"), Mat4::identity(), 0.0))
        .unwrap();
    set.get_or_create_bin(10, Some("DepthSortedBin"))
        .insert(&[], Leaf::new(scene.add("b"), Mat4::identity(), 1.0))
        .unwrap();

    set.clean();

    let mut visits = 0;
    set.emit_all(|_| visits += 1).unwrap();
    assert_eq!(visits, 0);
}

#[test]
fn test_frame_to_frame_determinism() {
    let mut scene = TestScene::new();
    let ids: Vec<_> = (0..12).map(|_| scene.add("leaf")).collect();
    let events: Vec<TraversalEvent> = ids
        .iter()
        .enumerate()
        .flat_map(|(i, id)| {
            let mut node = vec![TraversalEvent::EnterNode, TraversalEvent::StateOverride(program((i % 3) as u32))];
            if i % 4 == 0 {
                node.push(TraversalEvent::StateOverride(transparent()));
            }
            node.push(TraversalEvent::Drawable(visit_at(*id, 1.0 + (i % 5) as f32)));
            node.push(TraversalEvent::LeaveNode);
            node
        })
        .collect();

    let mut accumulator = TraversalAccumulator::new(&RenderGraphConfig::default());
    let mut frames = Vec::new();
    for _ in 0..2 {
        accumulator.accumulate(events.clone()).unwrap();
        let mut frame = Vec::new();
        accumulator
            .emit_all(|item| frame.push((item.drawable, item.state.clone(), item.depth)))
            .unwrap();
        frames.push(frame);
    }

    assert_eq!(frames[0].len(), ids.len());
    assert_eq!(frames[0], frames[1]);
}

#[test]
fn test_bin_order_precedes_descriptor_order() {
    let mut scene = TestScene::new();
    let l1 = scene.add("L1");
    let l2 = scene.add("L2");
    let l3 = scene.add("L3");
    let (a, b) = (program(1), program(2));
    assert!(a < b);

    let mut accumulator = TraversalAccumulator::new(&RenderGraphConfig::default());
    accumulator
        .accumulate(vec![
            TraversalEvent::EnterNode,
            TraversalEvent::StateOverride(a.clone()),
            TraversalEvent::Drawable(visit_at(l1, 2.0)),
            TraversalEvent::LeaveNode,
            TraversalEvent::EnterNode,
            TraversalEvent::StateOverride(b),
            TraversalEvent::Drawable(visit_at(l2, 2.0)),
            TraversalEvent::LeaveNode,
            TraversalEvent::EnterNode,
            TraversalEvent::BinRedirect(BinTarget::new(-1, Some("Skybox"))),
            TraversalEvent::StateOverride(a),
            TraversalEvent::Drawable(visit_at(l3, 50.0)),
            TraversalEvent::LeaveNode,
        ])
        .unwrap();

    let mut order = Vec::new();
    accumulator.emit_all(|item| order.push(scene.label(item.drawable))).unwrap();
    assert_eq!(order, vec!["L3", "L1", "L2"]);
}

#[test]
fn test_deeper_leaf_emits_first_in_depth_bin() {
    let mut scene = TestScene::new();
    let near = scene.add("near");
    let far = scene.add("far");
    let mut set = RenderBinSet::default();
    let bin = set.get_or_create_bin(10, Some("DepthSortedBin"));
    assert_eq!(bin.sort_mode(), SortMode::BackToFront);

    bin.insert(&[program(1)], Leaf::new(near, Mat4::identity(), 2.0)).unwrap();
    bin.insert(&[program(1)], Leaf::new(far, Mat4::identity(), 5.0)).unwrap();

    let emitted: Vec<_> = collect(&mut set).into_iter().map(|(id, _, _)| id).collect();
    assert_eq!(emitted, vec![far, near]);
}

#[test]
fn test_flag_only_difference_emits_equal_states() {
    use crate::state::StateFlags;

    let mut scene = TestScene::new();
    let a = scene.add("a");
    let b = scene.add("b");
    let forced = StateSet::new()
        .with_flags(StateCategory::Program, StateValue::Program(ProgramId(1)), StateFlags::OVERRIDE)
        .unwrap()
        .build();
    assert_ne!(forced, program(1));

    let mut accumulator = TraversalAccumulator::new(&RenderGraphConfig::default());
    accumulator
        .accumulate(vec![
            TraversalEvent::EnterNode,
            TraversalEvent::StateOverride(forced),
            TraversalEvent::Drawable(visit_at(a, 1.0)),
            TraversalEvent::LeaveNode,
            TraversalEvent::EnterNode,
            TraversalEvent::StateOverride(program(1)),
            TraversalEvent::Drawable(visit_at(b, 1.0)),
            TraversalEvent::LeaveNode,
        ])
        .unwrap();

    let mut states = Vec::new();
    accumulator.emit_all(|item| states.push(item.state.clone())).unwrap();
    assert_eq!(states, vec![program(1), program(1)]);
    assert_eq!(accumulator.stats().unwrap().state_changes, 1);
}
