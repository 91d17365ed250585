use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use cgmath::Point3;
use voxel_streaming::{
    engine_state::{
        rendering::{meshing::build_chunk_meshes, ChunkRenderer, RecordingRenderer},
        voxels::{
            block::{block_type::BlockType, BlockId, BlockUvTable},
            terrain::{FlatTerrain, NoiseTerrain, TerrainSampler},
            world::needed_set,
        },
    },
    ChunkStreamingManager, StreamingConfig,
};

const GROUND: i32 = 8;

fn origin() -> Point3<i32> {
    Point3::new(0, 0, 0)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn observer_in(chunk: Point3<i32>) -> Point3<f32> {
    Point3::new(
        chunk.x as f32 * 16.0 + 8.0,
        chunk.y as f32 * 16.0 + 8.0,
        chunk.z as f32 * 16.0 + 8.0,
    )
}

fn config(view_distance: i32, remesh_budget: usize) -> StreamingConfig {
    StreamingConfig {
        view_distance,
        remesh_budget,
        generation_workers: 2,
        meshing_workers: 2,
        ..StreamingConfig::default()
    }
}

fn manager_with(
    view_distance: i32,
    remesh_budget: usize,
    sampler: Arc<dyn TerrainSampler>,
) -> ChunkStreamingManager<RecordingRenderer> {
    manager_from(config(view_distance, remesh_budget), sampler)
}

fn manager_from(
    config: StreamingConfig,
    sampler: Arc<dyn TerrainSampler>,
) -> ChunkStreamingManager<RecordingRenderer> {
    init_logger();
    ChunkStreamingManager::new(
        config,
        sampler,
        BlockUvTable::for_known_blocks(),
        RecordingRenderer::new(),
    )
    .unwrap()
}

fn flat_manager(view_distance: i32) -> ChunkStreamingManager<RecordingRenderer> {
    manager_with(view_distance, 10, Arc::new(FlatTerrain::new(GROUND)))
}

/// Ticks until nothing is loading, queued or being meshed.
fn settle<R: ChunkRenderer>(manager: &mut ChunkStreamingManager<R>, observer: Point3<f32>) {
    let deadline = Instant::now() + Duration::from_secs(30);
    manager.tick(observer);
    while !manager.is_idle() {
        assert!(Instant::now() < deadline, "streaming did not settle");
        thread::sleep(Duration::from_millis(1));
        manager.tick(observer);
    }
}

fn tokens<R: ChunkRenderer>(manager: &ChunkStreamingManager<R>) -> HashMap<Point3<i32>, u64> {
    manager
        .chunk_positions()
        .into_iter()
        .map(|position| (position, manager.chunk_token(position).unwrap()))
        .collect()
}

#[test]
fn view_distance_one_loads_center_and_face_neighbors() {
    let mut manager = flat_manager(1);
    settle(&mut manager, observer_in(origin()));

    let loaded: HashSet<_> = manager.chunk_positions().into_iter().collect();
    assert_eq!(loaded.len(), 7);
    assert_eq!(loaded, needed_set(origin(), 1));

    // Only the center has all six neighbours; the rim waits for chunks that will
    // never be loaded at this view distance.
    assert!(manager.has_mesh(origin()));
    assert!(manager.renderer().is_attached(origin()));
    let rim = Point3::new(1, 0, 0);
    assert!(!manager.has_mesh(rim));
    assert!(manager.needs_remesh(rim));
}

#[test]
fn region_follows_the_observer() {
    let mut manager = flat_manager(1);
    settle(&mut manager, observer_in(origin()));

    let target = Point3::new(1, 0, 0);
    settle(&mut manager, observer_in(target));

    let loaded: HashSet<_> = manager.chunk_positions().into_iter().collect();
    assert_eq!(loaded, needed_set(target, 1));
    assert!(manager.has_mesh(target));

    // The old center is now on the rim: it kept its chunk and its mesh.
    assert!(manager.renderer().is_attached(origin()));
    for position in [Point3::new(-1, 0, 0), Point3::new(0, 1, 0)] {
        assert!(!manager.is_loaded(position));
        assert!(!manager.renderer().is_attached(position));
    }
    assert_eq!(manager.stats().chunks_unloaded, 5);
}

#[test]
fn reads_see_writes_and_unloaded_reads_are_none() {
    let mut manager = flat_manager(1);
    settle(&mut manager, observer_in(origin()));

    assert_eq!(
        manager.get_block_at(Point3::new(3, GROUND - 1, 3)),
        Some(BlockType::Grass.id())
    );
    assert_eq!(manager.get_block_at(Point3::new(3, GROUND, 3)), Some(BlockType::Air.id()));

    let mut rng = fastrand::Rng::with_seed(17);
    for _ in 0..200 {
        let world = Point3::new(rng.i32(-16..32), rng.i32(0..16), rng.i32(0..16));
        let id = rng.u8(0..BlockType::COUNT as u8) as BlockId;
        manager.set_block_at(world, id);
        assert_eq!(manager.get_block_at(world), Some(id));
    }

    let far = Point3::new(1000, 0, 0);
    assert_eq!(manager.get_block_at(far), None);
    assert!(!manager.set_block_at(far, BlockType::Stone.id()));
    assert_eq!(manager.get_block_at(far), None);
}

#[test]
fn writing_the_same_block_changes_nothing() {
    let mut manager = flat_manager(1);
    settle(&mut manager, observer_in(origin()));
    let before = tokens(&manager);

    assert!(!manager.set_block_at(Point3::new(4, GROUND - 1, 4), BlockType::Grass.id()));
    assert_eq!(tokens(&manager), before);
    assert_eq!(manager.queued_len(), 0);
}

#[test]
fn border_edit_remeshes_only_the_touching_neighbor() {
    let mut manager = flat_manager(2);
    settle(&mut manager, observer_in(origin()));
    let before = tokens(&manager);

    assert!(manager.set_block_at(Point3::new(0, 5, 5), BlockType::Sand.id()));

    let after = tokens(&manager);
    let bumped: HashSet<_> = after
        .iter()
        .filter(|(position, token)| before[*position] != **token)
        .map(|(position, _)| *position)
        .collect();
    assert_eq!(bumped, HashSet::from([origin(), Point3::new(-1, 0, 0)]));
    assert_eq!(after[&Point3::new(-1, -1, 0)], before[&Point3::new(-1, -1, 0)]);
    assert_eq!(after[&Point3::new(0, 1, 0)], before[&Point3::new(0, 1, 0)]);
}

#[test]
fn corner_edit_remeshes_three_face_neighbors() {
    let mut manager = flat_manager(2);
    settle(&mut manager, observer_in(origin()));
    let before = tokens(&manager);

    assert!(manager.set_block_at(Point3::new(15, 15, 15), BlockType::Stone.id()));

    let bumped: HashSet<_> = tokens(&manager)
        .into_iter()
        .filter(|(position, token)| before[position] != *token)
        .map(|(position, _)| position)
        .collect();
    assert_eq!(
        bumped,
        HashSet::from([
            origin(),
            Point3::new(1, 0, 0),
            Point3::new(0, 1, 0),
            Point3::new(0, 0, 1),
        ])
    );
}

#[test]
fn edit_during_a_build_applies_only_the_latest_state() {
    let mut manager = flat_manager(1);
    let observer = observer_in(origin());
    settle(&mut manager, observer);

    let applied = manager.stats().meshes_applied;
    let stale = manager.stats().meshes_discarded_stale;
    let attaches = manager.renderer().attach_count(origin());

    manager.set_block_at(Point3::new(5, GROUND, 5), BlockType::Stone.id());
    manager.tick(observer);
    assert_eq!(manager.in_flight_len(), 1);

    // Second request while the first build is still running.
    manager.set_block_at(Point3::new(6, GROUND, 5), BlockType::Stone.id());
    assert!(manager.needs_remesh(origin()));
    assert!(!manager.is_queued(origin()));

    settle(&mut manager, observer);

    assert_eq!(manager.stats().meshes_applied, applied + 1);
    assert_eq!(manager.stats().meshes_discarded_stale, stale + 1);
    assert_eq!(manager.renderer().attach_count(origin()), attaches + 1);
    assert!(!manager.needs_remesh(origin()));

    let expected = build_chunk_meshes(
        &manager.assemble_halo(origin()).unwrap(),
        origin(),
        &BlockUvTable::for_known_blocks(),
    );
    assert_eq!(manager.renderer().attached(origin()), Some(&expected));
}

#[test]
fn requests_before_the_pump_coalesce() {
    let mut manager = flat_manager(1);
    let observer = observer_in(origin());
    settle(&mut manager, observer);
    let submitted = manager.stats().meshes_submitted;

    assert!(manager.request_remesh(origin()));
    assert!(manager.request_remesh(origin()));
    assert_eq!(manager.queued_len(), 1);

    settle(&mut manager, observer);
    assert_eq!(manager.stats().meshes_submitted, submitted + 1);
}

#[test]
fn build_finishing_after_unload_is_never_attached() {
    let mut manager = flat_manager(1);
    settle(&mut manager, observer_in(origin()));
    let discarded = manager.stats().meshes_discarded_unloaded;
    assert_eq!(manager.renderer().attach_count(origin()), 1);

    manager.set_block_at(Point3::new(5, GROUND, 5), BlockType::Stone.id());
    manager.tick(observer_in(origin()));
    assert_eq!(manager.in_flight_len(), 1);

    let far = Point3::new(10, 0, 0);
    settle(&mut manager, observer_in(far));

    assert!(!manager.is_loaded(origin()));
    assert!(!manager.renderer().is_attached(origin()));
    assert_eq!(manager.renderer().attach_count(origin()), 1);
    assert_eq!(manager.renderer().detach_count(origin()), 1);
    assert_eq!(manager.stats().meshes_discarded_unloaded, discarded + 1);

    // Coming back regenerates the chunk from terrain; the edit is gone.
    settle(&mut manager, observer_in(origin()));
    assert_eq!(manager.get_block_at(Point3::new(5, GROUND, 5)), Some(BlockType::Air.id()));
    assert_eq!(manager.renderer().attach_count(origin()), 2);
    assert!(manager.renderer().is_attached(origin()));
}

#[test]
fn one_pump_never_exceeds_the_budget() {
    let budget = 2;
    let mut manager = manager_with(2, budget, Arc::new(FlatTerrain::new(GROUND)));
    let observer = observer_in(origin());

    let deadline = Instant::now() + Duration::from_secs(30);
    manager.tick(observer);
    while !manager.is_idle() {
        assert!(manager.stats().last_pump_submitted <= budget);
        assert!(Instant::now() < deadline, "streaming did not settle");
        thread::sleep(Duration::from_millis(1));
        manager.tick(observer);
    }

    // Five interior chunks edited at once: two builds start, three wait.
    for chunk in [
        origin(),
        Point3::new(1, 0, 0),
        Point3::new(-1, 0, 0),
        Point3::new(0, 0, 1),
        Point3::new(0, 0, -1),
    ] {
        let cell = Point3::new(chunk.x * 16 + 8, GROUND, chunk.z * 16 + 8);
        assert!(manager.set_block_at(cell, BlockType::Dirt.id()));
    }
    assert_eq!(manager.queued_len(), 5);

    manager.tick(observer);
    assert_eq!(manager.stats().last_pump_submitted, budget);
    assert_eq!(manager.in_flight_len(), budget);
    assert_eq!(manager.queued_len(), 3);

    settle(&mut manager, observer);
    assert!(manager.stats().last_pump_submitted <= budget);
}

fn interior_of(region: &HashSet<Point3<i32>>) -> Vec<Point3<i32>> {
    let offsets = [
        (1, 0, 0),
        (-1, 0, 0),
        (0, 1, 0),
        (0, -1, 0),
        (0, 0, 1),
        (0, 0, -1),
    ];
    region
        .iter()
        .filter(|p| {
            offsets
                .iter()
                .all(|&(dx, dy, dz)| region.contains(&Point3::new(p.x + dx, p.y + dy, p.z + dz)))
        })
        .copied()
        .collect()
}

#[test]
fn leftover_jobs_are_pumped_on_later_ticks() {
    let mut manager = manager_with(2, 1, Arc::new(FlatTerrain::new(GROUND)));
    let observer = observer_in(origin());
    settle(&mut manager, observer);
    let submitted = manager.stats().meshes_submitted;

    let east = Point3::new(1, 0, 0);
    assert!(manager.set_block_at(Point3::new(8, GROUND, 8), BlockType::Sand.id()));
    assert!(manager.set_block_at(Point3::new(24, GROUND, 8), BlockType::Sand.id()));
    assert_eq!(manager.queued_len(), 2);

    manager.tick(observer);
    assert_eq!(manager.stats().last_pump_submitted, 1);
    assert_eq!(manager.queued_len(), 1);
    assert!(manager.is_queued(east));

    // No new request arrives, the remaining job still goes out.
    manager.tick(observer);
    assert_eq!(manager.stats().last_pump_submitted, 1);
    assert_eq!(manager.queued_len(), 0);

    settle(&mut manager, observer);
    assert_eq!(manager.stats().meshes_submitted, submitted + 2);
    assert!(!manager.needs_remesh(origin()));
    assert!(!manager.needs_remesh(east));
}

#[test]
fn budget_of_one_meshes_a_whole_region() {
    let mut manager = manager_with(3, 1, Arc::new(FlatTerrain::new(GROUND)));
    settle(&mut manager, observer_in(origin()));

    let interior = interior_of(&needed_set(origin(), 3));
    assert!(interior.len() > 1);
    for position in interior {
        assert!(manager.has_mesh(position), "chunk {position:?} was never meshed");
    }
    assert_eq!(manager.queued_len(), 0);
    assert!(manager.stats().last_pump_submitted <= 1);
}

#[test]
fn reloaded_chunks_are_identical() {
    let seed = 5;
    let terrain = NoiseTerrain::new(seed);
    let sampler: Arc<dyn TerrainSampler> = Arc::new(terrain.clone());
    let mut manager = manager_from(StreamingConfig { seed, ..config(1, 10) }, sampler);
    let center = Point3::new(0, 1, 0);

    settle(&mut manager, observer_in(center));
    let mut rng = fastrand::Rng::with_seed(8);
    let samples: Vec<Point3<i32>> = (0..300)
        .map(|_| Point3::new(rng.i32(0..16), rng.i32(16..32), rng.i32(0..16)))
        .collect();
    let first: Vec<_> = samples.iter().map(|&p| manager.get_block_at(p)).collect();

    manager.dispose_all();
    assert_eq!(manager.chunk_count(), 0);
    assert_eq!(manager.renderer().attached_len(), 0);

    settle(&mut manager, observer_in(center));
    let second: Vec<_> = samples.iter().map(|&p| manager.get_block_at(p)).collect();

    assert_eq!(first, second);
    for (position, block) in samples.iter().zip(&first) {
        assert_eq!(
            *block,
            Some(terrain.sample(seed, position.x, position.y, position.z))
        );
    }
}

#[test]
fn failed_generation_is_retried() {
    let failed = Arc::new(AtomicBool::new(false));
    let flag = failed.clone();
    let flat = FlatTerrain::new(GROUND);
    let sampler: Arc<dyn TerrainSampler> =
        Arc::new(move |seed: u32, x: i32, y: i32, z: i32| -> BlockId {
            if (x, y, z) == (16, 0, 0) && !flag.swap(true, Ordering::SeqCst) {
                panic!("terrain backend unavailable");
            }
            flat.sample(seed, x, y, z)
        });
    let mut manager = manager_with(1, 10, sampler);

    settle(&mut manager, observer_in(origin()));

    assert!(failed.load(Ordering::SeqCst));
    assert_eq!(manager.stats().loads_failed, 1);
    assert_eq!(manager.chunk_count(), 7);
    assert!(manager.is_loaded(Point3::new(1, 0, 0)));
    assert!(manager.has_mesh(origin()));
}
