//! # Task Management System
//!
//! This module provides a small worker-pool runtime for executing work off the
//! orchestrating thread. The streaming core runs two independent pools, one for
//! terrain generation and one for meshing, so that a burst of generation work
//! never starves mesh builds.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns a fixed set of worker threads and distributes tasks
//! - `Task`: a unit of work, sent to a worker by value
//! - `TaskResult`: the message a worker sends back
//! - `TaskChannel`: the pair of channels connecting the manager with one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager hands each task to an idle worker using round-robin, or
//!    queues it when every worker is busy
//! 3. Workers process tasks and send back results
//! 4. The owner drains results with `process_completed_tasks()` and schedules
//!    queued tasks with `process_queued_tasks()`, once per tick
//!
//! ## Example Usage
//! ```no_run
//! use voxel_streaming::engine_state::task_management::TaskManager;
//!
//! let mut task_manager = TaskManager::new("mesh", 6).unwrap();
//!
//! // In your main/game loop:
//! for result in task_manager.process_completed_tasks() {
//!     // match on the result
//! #   let _ = result;
//! }
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::{
    collections::VecDeque,
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
};

use log::{info, warn};
use task::{Task, TaskResult};

use super::error::StreamingError;

/// A communication channel between the orchestrating thread and one worker.
///
/// Dropping the channel drops the task sender, which ends the worker's receive
/// loop once its current task is done.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Task>,
    result_receiver: Receiver<TaskResult>,
    num_tasks_in_flight: usize,
    disconnected: bool,
    _worker: JoinHandle<()>,
}

impl TaskChannel {
    fn is_available(&self) -> bool {
        !self.disconnected && self.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT
    }
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating the worker threads
/// - Distributing tasks across idle workers
/// - Queueing tasks while all workers are busy
/// - Collecting results
///
/// It is owned and driven by a single thread; it never blocks.
pub struct TaskManager {
    name: String,
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Task>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// With one task per worker, a queued task is always handed to the first
/// worker that becomes idle rather than waiting behind a long job.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `name` - Prefix for the worker thread names, e.g. `"mesh"` gives
    ///   `mesh-0`, `mesh-1`, ...
    /// * `num_workers` - Number of worker threads to create
    ///
    /// # Errors
    /// [`StreamingError::WorkerSpawn`] if the operating system refuses to start
    /// a thread.
    pub fn new(name: &str, num_workers: usize) -> Result<Self, StreamingError> {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Task>();
            let (result_tx, result_rx) = channel::<TaskResult>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(task_closure)
                .map_err(StreamingError::WorkerSpawn)?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                disconnected: false,
                _worker: worker,
            });
        }

        info!(
            "Started {} {} workers (available parallelism: {:?})",
            num_workers,
            name,
            thread::available_parallelism()
        );

        Ok(TaskManager {
            name: name.to_string(),
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Tasks waiting for an idle worker.
    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Tasks currently running on a worker or finished but not yet drained.
    pub fn in_flight_count(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Tasks published whose results have not been drained yet.
    pub fn pending_count(&self) -> usize {
        self.queued_count() + self.in_flight_count()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was handed to the worker
    /// - `Err(task)` if the worker is gone; the channel is marked disconnected
    fn try_send_task(&mut self, task: Task, channel_idx: usize) -> Result<(), Task> {
        let channel = &mut self.channels[channel_idx];
        match channel.task_sender.send(task) {
            Ok(()) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(error) => {
                warn!("{} worker {} is gone", self.name, channel_idx);
                channel.disconnected = true;
                Err(error.0)
            }
        }
    }

    /// Finds an idle worker, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&index| self.channels[index].is_available())
    }

    fn dispatch(&mut self, mut task: Task) -> Result<(), Task> {
        while let Some(channel_idx) = self.find_available_channel() {
            match self.try_send_task(task, channel_idx) {
                Ok(()) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    return Ok(());
                }
                Err(returned) => task = returned,
            }
        }
        Err(task)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was handed to an idle worker right away
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Task) -> bool {
        if !self.queued_tasks.is_empty() {
            self.queued_tasks.push_back(task);
            return false;
        }
        match self.dispatch(task) {
            Ok(()) => true,
            Err(task) => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to idle workers, oldest first, until either runs out.
    pub fn process_queued_tasks(&mut self) {
        while let Some(task) = self.queued_tasks.pop_front() {
            if let Err(task) = self.dispatch(task) {
                self.queued_tasks.push_front(task);
                break;
            }
        }
    }

    /// Drains every finished result without blocking.
    ///
    /// Results from one worker come back in completion order; results of
    /// different workers are concatenated worker by worker.
    pub fn process_completed_tasks(&mut self) -> Vec<TaskResult> {
        let mut results = Vec::new();
        for (index, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(result) => {
                        channel.num_tasks_in_flight -= 1;
                        results.push(result);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if !channel.disconnected {
                            warn!("{} worker {} disconnected", self.name, index);
                            channel.disconnected = true;
                        }
                        break;
                    }
                }
            }
        }
        results
    }
}
