//! Priority queue for chunk remesh jobs.

use std::{cmp::Ordering, collections::HashMap};

use cgmath::Point3;

/// One pending remesh request.
///
/// Lower `priority` values are served first.
#[derive(Clone, Debug)]
pub struct RemeshJob<H> {
    /// Chunk to rebuild.
    pub position: Point3<i32>,
    /// Handle on the chunk captured when the job was queued, used to detect an
    /// unload and reload under the same key.
    pub handle: H,
    /// Generation token of the latest request.
    pub token: u64,
    /// Score, lower is more urgent.
    pub priority: f32,
}

/// Remesh jobs keyed by chunk position.
///
/// Each position is queued at most once: queueing it again updates the
/// existing entry's handle, token and priority in place.
#[derive(Debug)]
pub struct RemeshQueue<H> {
    jobs: Vec<RemeshJob<H>>,
    index: HashMap<Point3<i32>, usize>,
}

impl<H> Default for RemeshQueue<H> {
    fn default() -> Self {
        RemeshQueue {
            jobs: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<H> RemeshQueue<H> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job, or updates the queued job for the same position.
    ///
    /// Returns `true` if the position was not queued before.
    pub fn upsert(&mut self, job: RemeshJob<H>) -> bool {
        match self.index.get(&job.position) {
            Some(&slot) => {
                self.jobs[slot] = job;
                false
            }
            None => {
                self.index.insert(job.position, self.jobs.len());
                self.jobs.push(job);
                true
            }
        }
    }

    /// Drops the queued job for `position`, if any.
    pub fn remove(&mut self, position: Point3<i32>) -> Option<RemeshJob<H>> {
        let slot = self.index.remove(&position)?;
        let job = self.jobs.swap_remove(slot);
        if let Some(moved) = self.jobs.get(slot) {
            self.index.insert(moved.position, slot);
        }
        Some(job)
    }

    /// Whether a job for `position` is queued.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.index.contains_key(&position)
    }

    /// The queued job for `position`.
    pub fn get(&self, position: Point3<i32>) -> Option<&RemeshJob<H>> {
        self.index.get(&position).map(|&slot| &self.jobs[slot])
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Recomputes every job's priority.
    pub fn reprioritize(&mut self, mut score: impl FnMut(&RemeshJob<H>) -> f32) {
        for job in &mut self.jobs {
            job.priority = score(job);
        }
    }

    /// Removes and returns up to `budget` of the most urgent jobs.
    ///
    /// The queue is only sorted when it holds more jobs than the budget; a
    /// smaller queue is taken whole.
    pub fn take_batch(&mut self, budget: usize) -> Vec<RemeshJob<H>> {
        if self.jobs.len() > budget {
            self.jobs.sort_by(|a, b| {
                a.priority
                    .partial_cmp(&b.priority)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let count = budget.min(self.jobs.len());
        let batch: Vec<_> = self.jobs.drain(..count).collect();

        self.index.clear();
        for (slot, job) in self.jobs.iter().enumerate() {
            self.index.insert(job.position, slot);
        }

        batch
    }

    /// Drops every queued job.
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(x: i32, priority: f32, token: u64) -> RemeshJob<()> {
        RemeshJob {
            position: Point3::new(x, 0, 0),
            handle: (),
            token,
            priority,
        }
    }

    #[test]
    fn upsert_updates_in_place() {
        let mut queue = RemeshQueue::new();
        assert!(queue.upsert(job(1, 5.0, 1)));
        assert!(!queue.upsert(job(1, 2.0, 2)));

        assert_eq!(queue.len(), 1);
        let queued = queue.get(Point3::new(1, 0, 0)).unwrap();
        assert_eq!(queued.token, 2);
        assert_eq!(queued.priority, 2.0);
    }

    #[test]
    fn remove_keeps_index_consistent() {
        let mut queue = RemeshQueue::new();
        for x in 0..4 {
            queue.upsert(job(x, x as f32, 0));
        }
        assert!(queue.remove(Point3::new(0, 0, 0)).is_some());
        assert!(queue.remove(Point3::new(0, 0, 0)).is_none());

        for x in 1..4 {
            assert_eq!(queue.get(Point3::new(x, 0, 0)).unwrap().position.x, x);
        }
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn batch_respects_budget_and_priority() {
        let mut queue = RemeshQueue::new();
        for (x, priority) in [(0, 9.0), (1, 1.0), (2, 5.0), (3, 0.5), (4, 7.0)] {
            queue.upsert(job(x, priority, 0));
        }

        let batch = queue.take_batch(2);
        let taken: Vec<i32> = batch.iter().map(|j| j.position.x).collect();
        assert_eq!(taken, vec![3, 1]);
        assert_eq!(queue.len(), 3);
        assert!(!queue.contains(Point3::new(3, 0, 0)));
        assert!(queue.contains(Point3::new(2, 0, 0)));

        assert_eq!(queue.take_batch(10).len(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn reprioritize_changes_order() {
        let mut queue = RemeshQueue::new();
        for x in 0..5 {
            queue.upsert(job(x, x as f32, 0));
        }
        queue.reprioritize(|job| -(job.position.x as f32));

        let batch = queue.take_batch(1);
        assert_eq!(batch[0].position.x, 4);
    }
}
