//! # World Module
//!
//! This module provides the `ChunkStreamingManager`, which keeps a sphere of
//! chunks loaded around a moving observer, drives their generation and meshing
//! on two worker pools, and exposes the world's block read/write API.
//!
//! ## Architecture
//!
//! The manager runs on one thread and is ticked once per frame. All of its
//! bookkeeping (chunk table, remesh queue, loading and in-flight sets) lives on
//! that thread; workers only ever see owned snapshots and send owned results
//! back, so no locking is involved.
//!
//! ## Staleness
//!
//! Mesh builds can finish long after they were started. Two checks decide
//! whether a finished build is applied:
//!
//! - the chunk under that key is still the very object the build was started
//!   for (not unloaded, not unloaded and reloaded)
//! - the build's generation token is still the chunk's current token
//!
//! Anything else is dropped without ever reaching the renderer.
//!
//! ## Scheduling
//!
//! Remesh requests go through a neighbour-readiness gate (all six face
//! neighbours loaded) into a priority queue keyed by chunk position. Once per
//! tick, a pump starts at most `remesh_budget` of the most urgent jobs; jobs
//! left over are pumped on the following ticks.
//!
//! ## Load Requests
//!
//! Every generation request carries an id. A key is loading while the id of its
//! newest request is recorded, and only the result carrying that id is used, so
//! answers to requests issued before `dispose_all` cannot finish a newer load.

use std::{
    cell::{Ref, RefCell},
    collections::{HashMap, HashSet},
    rc::Weak,
    sync::Arc,
};

use cgmath::{MetricSpace, Point3};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    core::StResource,
    engine_state::{
        config::StreamingConfig,
        error::StreamingError,
        rendering::{
            meshing::{ChunkMeshes, MeshingService},
            ChunkRenderer,
        },
        task_management::task::TaskResult,
    },
};

use super::{
    block::{block_side::BlockSide, BlockId, BlockUvTable},
    chunk::{
        chunk_center, chunk_distance_squared, chunk_position_of, split_world_position, Chunk,
        HaloBuffer, VoxelBuffer, CHUNK_DIMENSION,
    },
    generation::ChunkGenerationService,
    remesh_queue::{RemeshJob, RemeshQueue},
    terrain::TerrainSampler,
};

/// Counters describing what the manager has done so far.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingStats {
    /// Generation requests sent to the generation pool.
    pub loads_requested: u64,
    /// Chunks inserted into the table.
    pub chunks_loaded: u64,
    /// Generation results dropped because the chunk left the view meanwhile.
    pub loads_discarded: u64,
    /// Generation requests that failed on a worker.
    pub loads_failed: u64,
    /// Chunks removed from the table.
    pub chunks_unloaded: u64,
    /// Mesh builds sent to the meshing pool.
    pub meshes_submitted: u64,
    /// Mesh builds handed to a chunk.
    pub meshes_applied: u64,
    /// Mesh builds dropped because a newer request superseded them.
    pub meshes_discarded_stale: u64,
    /// Mesh builds dropped because their chunk was unloaded or replaced.
    pub meshes_discarded_unloaded: u64,
    /// Mesh builds that failed on a worker.
    pub meshes_failed: u64,
    /// Mesh builds started by the most recent pump.
    pub last_pump_submitted: usize,
}

/// A mesh build currently running on the meshing pool.
struct InFlightBuild {
    chunk: Weak<RefCell<Chunk>>,
    token: u64,
}

/// Streams chunks around an observer and keeps their meshes current.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use cgmath::Point3;
/// use voxel_streaming::{
///     engine_state::{
///         rendering::NullRenderer,
///         voxels::{block::BlockUvTable, terrain::FlatTerrain},
///     },
///     ChunkStreamingManager, StreamingConfig,
/// };
///
/// let mut manager = ChunkStreamingManager::new(
///     StreamingConfig::default(),
///     Arc::new(FlatTerrain::new(8)),
///     BlockUvTable::for_known_blocks(),
///     NullRenderer,
/// )
/// .unwrap();
///
/// loop {
///     manager.tick(Point3::new(0.0, 8.0, 0.0));
/// #   break;
/// }
/// ```
pub struct ChunkStreamingManager<R: ChunkRenderer> {
    config: StreamingConfig,
    chunks: HashMap<Point3<i32>, StResource<Chunk>>,
    loading: HashMap<Point3<i32>, u64>,
    next_load_request: u64,
    queue: RemeshQueue<StResource<Chunk>>,
    in_flight: HashMap<Point3<i32>, InFlightBuild>,
    generation: ChunkGenerationService,
    meshing: MeshingService,
    renderer: R,
    observer_position: Point3<f32>,
    observer_chunk: Option<Point3<i32>>,
    region_dirty: bool,
    pump_scheduled: bool,
    stats: StreamingStats,
}

impl<R: ChunkRenderer> ChunkStreamingManager<R> {
    /// Creates a manager and starts both worker pools.
    ///
    /// # Arguments
    /// * `config` - Tunables, validated here
    /// * `sampler` - The terrain function chunks are generated from
    /// * `uvs` - Block to atlas rectangle lookup for the mesher
    /// * `renderer` - Receives every attached and detached mesh
    ///
    /// # Errors
    /// An invalid configuration, or a worker thread that could not be spawned.
    pub fn new(
        config: StreamingConfig,
        sampler: Arc<dyn TerrainSampler>,
        uvs: BlockUvTable,
        renderer: R,
    ) -> Result<Self, StreamingError> {
        config.validate()?;

        let generation = ChunkGenerationService::new(config.generation_workers, sampler)?;
        let meshing = MeshingService::new(config.meshing_workers, Arc::new(uvs))?;

        info!(
            "Chunk streaming started (view distance {}, budget {})",
            config.view_distance, config.remesh_budget
        );

        Ok(ChunkStreamingManager {
            config,
            chunks: HashMap::new(),
            loading: HashMap::new(),
            next_load_request: 0,
            queue: RemeshQueue::new(),
            in_flight: HashMap::new(),
            generation,
            meshing,
            renderer,
            observer_position: Point3::new(0.0, 0.0, 0.0),
            observer_chunk: None,
            region_dirty: true,
            pump_scheduled: false,
            stats: StreamingStats::default(),
        })
    }

    /// Runs one scheduling tick.
    ///
    /// Maintains the loaded region around `observer` (a world position), applies
    /// every finished generation and mesh result, and pumps the remesh queue at
    /// most once. Never blocks on a worker.
    pub fn tick(&mut self, observer: Point3<f32>) {
        self.update_region(observer);

        let mut results = self.generation.drain_completed();
        results.extend(self.meshing.drain_completed());
        for result in results {
            self.handle_result(result);
        }

        self.generation.process_queued_tasks();
        if self.pump_scheduled {
            self.pump();
        }
        self.meshing.process_queued_tasks();
    }

    /// Recomputes the needed set if the observer entered another chunk.
    ///
    /// Loads every needed chunk that is neither present nor already loading, and
    /// unloads every present chunk that is no longer needed.
    pub fn update_region(&mut self, observer: Point3<f32>) {
        self.observer_position = observer;
        let center = chunk_position_of(observer);
        let moved = self.observer_chunk != Some(center);

        if !moved && !self.region_dirty {
            return;
        }

        self.observer_chunk = Some(center);
        self.region_dirty = false;

        let needed = needed_set(center, self.config.view_distance);

        let mut to_load: Vec<Point3<i32>> = needed
            .iter()
            .filter(|position| {
                !self.chunks.contains_key(position) && !self.loading.contains_key(position)
            })
            .copied()
            .collect();
        to_load.sort_by_key(|&position| chunk_distance_squared(position, center));

        let to_unload: Vec<Point3<i32>> = self
            .chunks
            .keys()
            .filter(|position| !needed.contains(position))
            .copied()
            .collect();

        debug!(
            "Observer in chunk {:?}: loading {}, unloading {}",
            center,
            to_load.len(),
            to_unload.len()
        );

        for position in to_unload {
            self.unload(position);
        }
        for position in to_load {
            self.load(position);
        }

        if moved {
            self.reprioritize();
        }
    }

    fn load(&mut self, position: Point3<i32>) {
        self.next_load_request += 1;
        let request = self.next_load_request;
        self.loading.insert(position, request);
        self.stats.loads_requested += 1;
        self.generation.generate(position, self.config.seed, request);
    }

    /// Removes a chunk, its queued job and its geometry.
    ///
    /// A build already running for the chunk is left to finish; its result
    /// no longer matches any live chunk and is dropped on arrival.
    fn unload(&mut self, position: Point3<i32>) -> bool {
        let Some(chunk) = self.chunks.remove(&position) else {
            return false;
        };
        self.queue.remove(position);
        chunk.get_mut().unload(&mut self.renderer);
        self.stats.chunks_unloaded += 1;
        true
    }

    fn is_wanted(&self, position: Point3<i32>) -> bool {
        let radius = self.config.view_distance;
        self.observer_chunk
            .is_some_and(|center| chunk_distance_squared(position, center) <= radius * radius)
    }

    fn handle_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::ChunkGenerated {
                position,
                request,
                result,
            } => self.on_chunk_generated(position, request, result),
            TaskResult::MeshGenerated {
                position,
                token,
                result,
            } => self.on_mesh_generated(position, token, result),
        }
    }

    fn on_chunk_generated(
        &mut self,
        position: Point3<i32>,
        request: u64,
        result: Result<VoxelBuffer, StreamingError>,
    ) {
        if self.loading.get(&position) != Some(&request) {
            debug!(
                "Dropping generation result for chunk {:?}, request {} superseded",
                position, request
            );
            self.stats.loads_discarded += 1;
            return;
        }
        self.loading.remove(&position);

        let voxels = match result {
            Ok(voxels) => voxels,
            Err(error) => {
                warn!("Generating chunk {:?} failed: {}", position, error);
                self.stats.loads_failed += 1;
                self.region_dirty = true;
                return;
            }
        };

        if !self.is_wanted(position) || self.chunks.contains_key(&position) {
            debug!("Dropping voxels for chunk {:?}, no longer wanted", position);
            self.stats.loads_discarded += 1;
            return;
        }

        self.chunks
            .insert(position, StResource::new(Chunk::new(position, voxels)));
        self.stats.chunks_loaded += 1;
        self.kick(position);
    }

    /// Requests meshes for a freshly loaded chunk and for the neighbours it may
    /// have unblocked.
    fn kick(&mut self, position: Point3<i32>) {
        let mut candidates = vec![position];
        for side in BlockSide::all() {
            let neighbor = side.neighbor_of(position);
            if let Some(chunk) = self.chunks.get(&neighbor) {
                let chunk = chunk.get();
                if chunk.needs_remesh() || !chunk.has_mesh() {
                    candidates.push(neighbor);
                }
            }
        }

        for candidate in candidates.into_iter().take(self.config.kick_limit) {
            self.request_remesh(candidate);
        }
    }

    fn on_mesh_generated(
        &mut self,
        position: Point3<i32>,
        token: u64,
        result: Result<ChunkMeshes, StreamingError>,
    ) {
        let record = self.in_flight.remove(&position);
        let current = self.chunks.get(&position).cloned();
        let live = match (&current, &record) {
            (Some(chunk), Some(record)) if chunk.refers_to(&record.chunk) => Some(chunk.clone()),
            _ => None,
        };
        debug_assert!(record.as_ref().map_or(true, |record| record.token == token));

        match result {
            Ok(meshes) => match live {
                None => {
                    debug!("Dropping mesh for chunk {:?}, chunk was unloaded", position);
                    self.stats.meshes_discarded_unloaded += 1;
                }
                Some(chunk) if chunk.get().current_token() != token => {
                    debug!(
                        "Dropping mesh for chunk {:?}, token {} superseded",
                        position, token
                    );
                    self.stats.meshes_discarded_stale += 1;
                }
                Some(chunk) => {
                    chunk.get_mut().apply_mesh(meshes, &mut self.renderer);
                    self.stats.meshes_applied += 1;
                }
            },
            Err(error) => {
                warn!("Meshing chunk {:?} failed: {}", position, error);
                self.stats.meshes_failed += 1;
                // Retried on the next kick unless something newer already waits.
                if let Some(chunk) = live.filter(|chunk| chunk.get().current_token() == token) {
                    chunk.get_mut().set_needs_remesh(true);
                    return;
                }
            }
        }

        let retry = current
            .as_ref()
            .is_some_and(|chunk| chunk.get().needs_remesh());
        if retry {
            self.request_remesh(position);
        }
    }

    /// Invalidates the chunk's pending builds and queues a fresh one.
    ///
    /// Returns `true` if a job is now queued. When the chunk's neighbours are not
    /// all loaded, or a build for it is still running, the chunk is flagged
    /// instead and the request is retried later. Unknown positions are ignored.
    pub fn request_remesh(&mut self, position: Point3<i32>) -> bool {
        let Some(chunk) = self.chunks.get(&position).cloned() else {
            debug!("Remesh of unloaded chunk {:?} ignored", position);
            return false;
        };
        let token = chunk.get_mut().request_remesh();

        if !self.neighbors_ready(position) {
            debug!("Chunk {:?} waits for its neighbours", position);
            chunk.get_mut().set_needs_remesh(true);
            return false;
        }
        if self.in_flight.contains_key(&position) {
            debug!("Chunk {:?} is being meshed, retrying afterwards", position);
            chunk.get_mut().set_needs_remesh(true);
            return false;
        }

        let has_mesh = chunk.get().has_mesh();
        chunk.get_mut().set_needs_remesh(false);
        let priority = self.priority_of(position, has_mesh);
        self.queue.upsert(RemeshJob {
            position,
            handle: chunk,
            token,
            priority,
        });
        self.pump_scheduled = true;
        true
    }

    fn neighbors_ready(&self, position: Point3<i32>) -> bool {
        BlockSide::all()
            .into_iter()
            .all(|side| self.chunks.contains_key(&side.neighbor_of(position)))
    }

    fn priority_of(&self, position: Point3<i32>, has_mesh: bool) -> f32 {
        score(
            position,
            has_mesh,
            self.observer_position,
            self.config.remesh_penalty,
        )
    }

    fn reprioritize(&mut self) {
        let observer = self.observer_position;
        let penalty = self.config.remesh_penalty;
        self.queue.reprioritize(|job| {
            score(job.position, job.handle.get().has_mesh(), observer, penalty)
        });
    }

    /// Starts up to `remesh_budget` queued builds.
    fn pump(&mut self) {
        let batch = self.queue.take_batch(self.config.remesh_budget);
        self.pump_scheduled = !self.queue.is_empty();
        let mut submitted = 0;

        for job in batch {
            match self.chunks.get(&job.position) {
                Some(current) if current.ptr_eq(&job.handle) => {}
                _ => {
                    debug!("Skipping job for replaced chunk {:?}", job.position);
                    continue;
                }
            }
            if !self.neighbors_ready(job.position) || self.in_flight.contains_key(&job.position) {
                job.handle.get_mut().set_needs_remesh(true);
                continue;
            }
            let Some(halo) = self.assemble_halo(job.position) else {
                continue;
            };

            self.in_flight.insert(
                job.position,
                InFlightBuild {
                    chunk: job.handle.downgrade(),
                    token: job.token,
                },
            );
            self.meshing.submit(job.position, job.token, halo);
            submitted += 1;
        }

        self.stats.last_pump_submitted = submitted;
        self.stats.meshes_submitted += submitted as u64;
    }

    /// Builds the halo snapshot for the chunk at `position` from the live table.
    ///
    /// Missing neighbours contribute air. Returns `None` if the chunk itself is
    /// not loaded.
    pub fn assemble_halo(&self, position: Point3<i32>) -> Option<HaloBuffer> {
        let center = self.chunks.get(&position)?.get();
        let guards: [Option<Ref<'_, Chunk>>; 6] = BlockSide::all().map(|side| {
            self.chunks
                .get(&side.neighbor_of(position))
                .map(StResource::get)
        });
        let neighbors = std::array::from_fn(|index| guards[index].as_deref().map(Chunk::voxels));
        Some(HaloBuffer::assemble(center.voxels(), neighbors))
    }

    /// The block at a world position, or `None` if its chunk is not loaded.
    pub fn get_block_at(&self, world: Point3<i32>) -> Option<BlockId> {
        let (chunk, local) = split_world_position(world);
        self.chunks
            .get(&chunk)
            .map(|chunk| chunk.get().voxels().get(local.x, local.y, local.z))
    }

    /// Writes a block and schedules the remeshes it makes necessary.
    ///
    /// The owning chunk is always remeshed. A neighbour is remeshed only across
    /// the faces the block touches, so at most three neighbours for a corner
    /// cell and none for an interior one.
    ///
    /// Returns `true` if a voxel changed; writes into unloaded chunks and writes
    /// of the value already present do nothing.
    pub fn set_block_at(&mut self, world: Point3<i32>, id: BlockId) -> bool {
        let (position, local) = split_world_position(world);
        let Some(chunk) = self.chunks.get(&position).cloned() else {
            debug!("Write to unloaded chunk {:?} ignored", position);
            return false;
        };

        {
            let mut chunk = chunk.get_mut();
            if chunk.voxels().get(local.x, local.y, local.z) == id {
                return false;
            }
            chunk.voxels_mut().set(local.x, local.y, local.z, id);
        }

        self.request_remesh(position);
        for side in boundary_sides(local) {
            self.request_remesh(side.neighbor_of(position));
        }
        true
    }

    /// Unloads every chunk and forgets the observer, releasing all geometry.
    ///
    /// Loads and builds still running are dropped when they finish. The next
    /// tick starts streaming from scratch.
    pub fn dispose_all(&mut self) {
        let positions: Vec<Point3<i32>> = self.chunks.keys().copied().collect();
        for position in positions {
            self.unload(position);
        }
        self.queue.clear();
        self.loading.clear();
        self.observer_chunk = None;
        self.region_dirty = true;
        self.pump_scheduled = false;
        info!("Disposed all chunks");
    }

    /// Positions of all loaded chunks.
    pub fn chunk_positions(&self) -> Vec<Point3<i32>> {
        self.chunks.keys().copied().collect()
    }

    /// Number of loaded chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the chunk at `position` is loaded.
    pub fn is_loaded(&self, position: Point3<i32>) -> bool {
        self.chunks.contains_key(&position)
    }

    /// The current generation token of a loaded chunk.
    pub fn chunk_token(&self, position: Point3<i32>) -> Option<u64> {
        self.chunks
            .get(&position)
            .map(|chunk| chunk.get().current_token())
    }

    /// Whether a loaded chunk has had a mesh applied.
    pub fn has_mesh(&self, position: Point3<i32>) -> bool {
        self.chunks
            .get(&position)
            .is_some_and(|chunk| chunk.get().has_mesh())
    }

    /// Whether a loaded chunk is waiting for a deferred remesh.
    pub fn needs_remesh(&self, position: Point3<i32>) -> bool {
        self.chunks
            .get(&position)
            .is_some_and(|chunk| chunk.get().needs_remesh())
    }

    /// Whether a job for `position` is queued.
    pub fn is_queued(&self, position: Point3<i32>) -> bool {
        self.queue.contains(position)
    }

    /// Number of queued remesh jobs.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of mesh builds running.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of outstanding generation requests.
    pub fn loading_len(&self) -> usize {
        self.loading.len()
    }

    /// Whether nothing is queued, running or pending, so further ticks with the
    /// same observer position change nothing.
    pub fn is_idle(&self) -> bool {
        !self.region_dirty
            && !self.pump_scheduled
            && self.loading.is_empty()
            && self.queue.is_empty()
            && self.in_flight.is_empty()
            && self.generation.pending_count() == 0
            && self.meshing.pending_count() == 0
    }

    /// The chunk the observer was in at the last region update.
    pub fn observer_chunk(&self) -> Option<Point3<i32>> {
        self.observer_chunk
    }

    /// Counters since creation.
    pub fn stats(&self) -> &StreamingStats {
        &self.stats
    }

    /// The configuration in use.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// The renderer receiving geometry.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

/// Squared distance from a chunk's center to the observer, plus `penalty` when
/// the chunk already shows a mesh.
fn score(position: Point3<i32>, has_mesh: bool, observer: Point3<f32>, penalty: f32) -> f32 {
    let distance = chunk_center(position).distance2(observer);
    if has_mesh {
        distance + penalty
    } else {
        distance
    }
}

/// All chunk positions within `view_distance` chunks of `center` (a sphere).
pub fn needed_set(center: Point3<i32>, view_distance: i32) -> HashSet<Point3<i32>> {
    let radius = view_distance.max(0);
    let mut needed = HashSet::new();
    for dz in -radius..=radius {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy + dz * dz <= radius * radius {
                    needed.insert(Point3::new(center.x + dx, center.y + dy, center.z + dz));
                }
            }
        }
    }
    needed
}

/// The faces of its chunk that a local cell lies on.
fn boundary_sides(local: Point3<usize>) -> Vec<BlockSide> {
    let last = CHUNK_DIMENSION as usize - 1;
    let mut sides = Vec::new();
    for (coordinate, low, high) in [
        (local.x, BlockSide::Left, BlockSide::Right),
        (local.y, BlockSide::Bottom, BlockSide::Top),
        (local.z, BlockSide::Back, BlockSide::Front),
    ] {
        if coordinate == 0 {
            sides.push(low);
        } else if coordinate == last {
            sides.push(high);
        }
    }
    sides
}
