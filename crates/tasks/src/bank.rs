//! Task bank: stratified partitioning and per-generation rotation.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use natsel_core::{Task, TaskId, TaskType};

use crate::TaskBankError;

// Partition proportions within each task type. The test share is whatever
// remains after train and validation.
const TRAIN_RATIO: f64 = 0.6;
const VALIDATION_RATIO: f64 = 0.2;

// A type needs at least one task per partition to stratify at all.
const MIN_TASKS_PER_TYPE: usize = 3;

/// Owns the immutable task catalogue.
#[derive(Debug, Clone)]
pub struct TaskBank {
    tasks: Vec<Task>,
}

impl TaskBank {
    /// Build a bank, validating the catalogue.
    pub fn new(tasks: Vec<Task>) -> Result<Self, TaskBankError> {
        if tasks.is_empty() {
            return Err(TaskBankError::EmptyCatalogue);
        }
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id.clone()) {
                return Err(TaskBankError::DuplicateTaskId(task.id.clone()));
            }
            if !(0.0..=1.0).contains(&task.difficulty) {
                return Err(TaskBankError::InvalidDifficulty {
                    id: task.id.clone(),
                    value: task.difficulty,
                });
            }
        }
        Ok(Self { tasks })
    }

    /// The full catalogue.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Deterministically split the catalogue into train/validation/test,
    /// stratified by task type so each partition preserves the type mix.
    ///
    /// The same seed always produces the same partition. Fails if any task
    /// type has fewer than three members, which is too few to stratify
    /// into three partitions.
    pub fn split(&self, seed: u64) -> Result<Partition, TaskBankError> {
        for task_type in TaskType::ALL {
            let count = self.tasks.iter().filter(|t| t.task_type == task_type).count();
            if count < MIN_TASKS_PER_TYPE {
                return Err(TaskBankError::UnstratifiableType { task_type, count });
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train = Vec::new();
        let mut validation = Vec::new();
        let mut test = Vec::new();

        for task_type in TaskType::ALL {
            let mut pool: Vec<Task> =
                self.tasks.iter().filter(|t| t.task_type == task_type).cloned().collect();
            pool.shuffle(&mut rng);

            let n_total = pool.len();
            let n_train = (n_total as f64 * TRAIN_RATIO) as usize;
            let n_validation = (n_total as f64 * VALIDATION_RATIO) as usize;

            let mut rest = pool.split_off(n_train);
            train.extend(pool);
            let test_part = rest.split_off(n_validation.min(rest.len()));
            validation.extend(rest);
            test.extend(test_part);
        }

        train.shuffle(&mut rng);
        validation.shuffle(&mut rng);
        test.shuffle(&mut rng);

        debug!(
            train = train.len(),
            validation = validation.len(),
            test = test.len(),
            seed,
            "partitioned task catalogue"
        );
        Ok(Partition { train, validation, test })
    }
}

/// A stratified train/validation/test assignment of the catalogue.
///
/// The partitions are disjoint and their union is the full catalogue.
/// The test set is private: it can only be obtained by consuming the
/// partition via [`Partition::into_test`], so no caller can both keep
/// rotating train batches and peek at held-out tasks.
#[derive(Debug, Clone)]
pub struct Partition {
    train: Vec<Task>,
    validation: Vec<Task>,
    test: Vec<Task>,
}

impl Partition {
    /// Tasks the evolutionary search may see.
    pub fn train(&self) -> &[Task] {
        &self.train
    }

    /// Tasks reserved for convergence diagnostics.
    pub fn validation(&self) -> &[Task] {
        &self.validation
    }

    /// Number of held-out test tasks (the tasks themselves stay sealed).
    pub fn test_len(&self) -> usize {
        self.test.len()
    }

    /// Draw the rotating task subset for one generation.
    ///
    /// The subset comes from the train partition only, is type-diverse
    /// (at least one task of each represented type when the batch allows),
    /// and is a pure function of `(generation, seed)`: each generation sees
    /// a different subset, but re-running a generation reproduces it.
    pub fn rotate(&self, generation: u32, batch_size: usize, seed: u64) -> Vec<Task> {
        let combined = seed.wrapping_mul(1000).wrapping_add(u64::from(generation));
        let mut rng = StdRng::seed_from_u64(combined);

        let mut batch: Vec<Task> = Vec::with_capacity(batch_size);
        let per_type = (batch_size / 3).max(1);

        for task_type in TaskType::ALL {
            let typed: Vec<&Task> =
                self.train.iter().filter(|t| t.task_type == task_type).collect();
            batch.extend(
                typed
                    .choose_multiple(&mut rng, per_type.min(typed.len()))
                    .map(|t| (*t).clone()),
            );
        }

        let chosen: HashSet<TaskId> = batch.iter().map(|t| t.id.clone()).collect();
        if batch.len() < batch_size {
            let remaining: Vec<&Task> =
                self.train.iter().filter(|t| !chosen.contains(&t.id)).collect();
            batch.extend(
                remaining
                    .choose_multiple(&mut rng, batch_size - batch.len())
                    .map(|t| (*t).clone()),
            );
        }

        batch.shuffle(&mut rng);
        batch.truncate(batch_size);
        batch
    }

    /// Consume the partition and release the held-out test set.
    ///
    /// Taking `self` by value is deliberate: after this call there is no
    /// partition left to rotate train batches from, so the test tasks are
    /// structurally read at most once, at the end of a run.
    pub fn into_test(self) -> Vec<Task> {
        self.test
    }
}
