use canopy_engine::surface::{
    SurfaceAction, SurfaceRegistry, ASSISTANT_PANEL_TAG, VIDEO_SCREEN_TAG,
};
use canopy_engine::world::{ScatterCategory, World, WorldBuilder, WorldConfig};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;

fn build(config: WorldConfig, seed: u64) -> World {
    WorldBuilder::new(config)
        .build(&mut StdRng::seed_from_u64(seed))
        .unwrap()
}

fn positions<'w>(world: &'w World, group: &str) -> impl Iterator<Item = Vec2> + 'w {
    let group = group.to_string();
    world
        .graph
        .root()
        .children
        .iter()
        .filter(move |n| n.name == group)
        .flat_map(|n| n.children.iter())
        .map(|c| Vec2::new(c.transform.position.x, c.transform.position.z))
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(99)]
#[case(12345)]
fn the_stage_area_stays_clear(#[case] seed: u64) {
    let config = WorldConfig::default();
    let world = build(config.clone(), seed);
    for (name, category) in [
        ("trees", config.trees),
        ("bushes", config.bushes),
        ("rocks", config.rocks),
        ("flowers", config.flowers),
    ] {
        let mut count = 0;
        for p in positions(&world, name) {
            assert!(p.length() >= category.clearance, "{name} at {p}");
            assert!(p.x.abs() <= category.half_extent + 1e-4);
            count += 1;
        }
        assert_eq!(count, category.count, "{name}");
    }
    assert_eq!(world.fallback_placements, 0);
}

#[test]
fn impossible_bounds_still_terminate() {
    let mut config = WorldConfig::bare();
    // every candidate lies inside the clearance circle
    config.rocks = ScatterCategory::new(5, 1.0, 10.0);
    let world = build(config, 4);
    assert_eq!(world.fallback_placements, 5);
    for p in positions(&world, "rocks") {
        assert!(p.length() >= 10.0);
    }
}

#[test]
fn surfaces_register_once_and_resolve_to_their_nodes() {
    let world = build(WorldConfig::bare(), 0);
    let mut registry = SurfaceRegistry::new();
    for surface in world.surfaces.iter().cloned() {
        let tag = surface.tag.clone();
        registry.register(&tag, surface).unwrap();
    }

    let listed: Vec<(&str, SurfaceAction)> = registry
        .list_interactive()
        .iter()
        .map(|s| (s.tag.as_str(), s.action))
        .collect();
    assert_eq!(
        listed,
        vec![
            (VIDEO_SCREEN_TAG, SurfaceAction::TogglePlayback),
            (ASSISTANT_PANEL_TAG, SurfaceAction::ToggleAssistant),
        ]
    );
    let screen = registry.resolve_node(&world.graph, VIDEO_SCREEN_TAG).unwrap();
    assert_eq!(screen.tag.as_deref(), Some(VIDEO_SCREEN_TAG));

    let again = world.surfaces[0].clone();
    let err = registry.register(VIDEO_SCREEN_TAG, again).unwrap_err();
    assert_eq!(err.tag, VIDEO_SCREEN_TAG);
    assert_eq!(registry.len(), 2);
}
