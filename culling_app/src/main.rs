//! Static scene culling demo
//!
//! Builds a small city block out of a scene hierarchy, indexes its static
//! geometry in an octree and reports what a camera sweeping around the block
//! can see. Pass a `.toml` or `.ron` config file as the first argument to
//! override the octree and hierarchy settings.

use rand::{rngs::StdRng, Rng, SeedableRng};
use scene_engine::foundation::logging;
use scene_engine::foundation::math::{constants::DEG_TO_RAD, Mat4, Mat4Ext, Vec3};
use scene_engine::prelude::*;

const BLOCK_COUNT: usize = 4;
const BUILDINGS_PER_BLOCK: usize = 24;
const BLOCK_SPACING: f32 = 60.0;
const CAMERA_HEIGHT: f32 = 20.0;
const CAMERA_DISTANCE: f32 = 140.0;
const SEED: u64 = 0xC17E;

/// Spawn the city: one static block root per quadrant with buildings under it
fn build_city(world: &mut World, graph: &SceneGraph, rng: &mut StdRng) -> Result<Entity, SceneError> {
    let city = graph.create_entity(world, "city", None)?;

    for block_index in 0..BLOCK_COUNT {
        let block = graph.create_entity(world, format!("block_{block_index}"), Some(city))?;
        let corner = Vec3::new(
            (if block_index & 1 == 0 { -0.5 } else { 0.5 }) * BLOCK_SPACING,
            0.0,
            (if block_index & 2 == 0 { -0.5 } else { 0.5 }) * BLOCK_SPACING,
        );
        if let Some(transform) = world.transform_mut(block) {
            transform.set_local_position(corner);
            transform.set_local_rotation(Vec3::new(0.0, rng.gen_range(-15.0..15.0), 0.0));
        }

        for building_index in 0..BUILDINGS_PER_BLOCK {
            let building = graph.create_entity(world, format!("building_{block_index}_{building_index}"), Some(block))?;
            let height = rng.gen_range(4.0..30.0);
            if let Some(transform) = world.transform_mut(building) {
                transform.set_local_position(Vec3::new(rng.gen_range(-25.0..25.0), height * 0.5, rng.gen_range(-25.0..25.0)));
            }
            world.insert_bounds(
                building,
                BoundsComponent::new(AABB::from_center_extents(Vec3::zeros(), Vec3::new(2.0, height * 0.5, 2.0))),
            );
            world.set_static(building, true);
        }
    }

    // A vehicle parked under the first block; it moves, so it is never indexed
    let first_block = graph.children(world, city).first().copied();
    let car = graph.create_entity(world, "car", first_block)?;
    world.insert_bounds(car, BoundsComponent::new(AABB::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 0.75, 2.0))));

    Ok(city)
}

fn camera_frustum(angle_degrees: f32) -> Frustum {
    let angle = angle_degrees * DEG_TO_RAD;
    let eye = Vec3::new(angle.sin() * CAMERA_DISTANCE, CAMERA_HEIGHT, angle.cos() * CAMERA_DISTANCE);
    let view = Mat4::look_at(eye, Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
    let projection = Mat4::perspective(45.0 * DEG_TO_RAD, 16.0 / 9.0, 0.1, 400.0);
    Frustum::from_matrix(&(projection * Mat4::vulkan_coordinate_transform() * view))
}

fn load_config() -> Result<SceneEngineConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            SceneEngineConfig::load_from_file(&path)
        }
        None => Ok(SceneEngineConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = load_config()?;
    log::info!("Octree: {:?}, hierarchy: {:?}", config.octree, config.hierarchy);

    let mut rng = StdRng::seed_from_u64(SEED);
    let mut world = World::new();
    let mut graph = SceneGraph::new(config.hierarchy);

    let city = build_city(&mut world, &graph, &mut rng)?;

    // Copy one block across the river
    let blocks = graph.children(&world, city);
    if let Some(&template) = blocks.first() {
        let copy = graph.duplicate(&mut world, template)?;
        if let Some(transform) = world.transform_mut(copy) {
            transform.set_local_position(Vec3::new(0.0, 0.0, -2.0 * BLOCK_SPACING));
        }
    }

    let updated = graph.update(&mut world);
    graph.validate(&world)?;
    log::info!("Scene has {} entities, {} transforms updated", world.len(), updated);

    // Round-trip the scene through a snapshot, as a level load would
    let text = SceneSnapshot::capture(&world).to_ron()?;
    let mut loaded_world = World::new();
    let loaded = graph.load_snapshot(&mut loaded_world, &SceneSnapshot::from_ron(&text)?)?;
    graph.update(&mut loaded_world);
    log::info!(
        "Snapshot: {} bytes, {} entities, repair {:?}",
        text.len(),
        loaded.entities.len(),
        loaded.repair
    );

    let index = StaticSceneIndex::build(&loaded_world, config.octree);
    let stats = index.octree().stats();
    log::info!(
        "Static index: {} objects in {} nodes ({} leaves, depth {}, largest leaf {})",
        index.len(),
        stats.node_count,
        stats.leaf_count,
        stats.deepest_node,
        stats.largest_leaf
    );

    for angle in (0..360).step_by(45) {
        let frustum = camera_frustum(angle as f32);
        let visible = index.visible_entities(&frustum);
        log::info!("Camera at {:>3} degrees sees {:>3} of {} buildings", angle, visible.len(), index.len());
    }

    Ok(())
}
