//! Task kinds, their weights and the wait policy between them.
//!
//! These are the declarative half of a virtual user: what it can do and how often.
//! Scheduling itself belongs to whoever consumes the table, goose for a load run
//! (see [`crate::goose_user::scenario`]) or the smoke runner's weighted pick.

use std::fmt;
use std::time::Duration;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// One unit of simulated user behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// POST a random user, then GET it back by id
    CreateAndGetUser,
    /// GET the health check endpoint
    HealthCheck,
}

impl TaskKind {
    /// Every task, in registration order.
    pub const ALL: [TaskKind; 2] = [TaskKind::CreateAndGetUser, TaskKind::HealthCheck];

    /// Name under which the task's statistics are reported.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::CreateAndGetUser => "POST /users + GET /users/{id}",
            TaskKind::HealthCheck => "GET /healthCheck",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative weight of each task.
///
/// A weight of zero disables the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWeights {
    pub create_and_get_user: usize,
    pub health_check: usize,
}

impl Default for TaskWeights {
    fn default() -> Self {
        Self {
            create_and_get_user: 1,
            health_check: 1,
        }
    }
}

impl TaskWeights {
    pub fn weight(&self, kind: TaskKind) -> usize {
        match kind {
            TaskKind::CreateAndGetUser => self.create_and_get_user,
            TaskKind::HealthCheck => self.health_check,
        }
    }

    pub fn total(&self) -> usize {
        TaskKind::ALL.iter().map(|kind| self.weight(*kind)).sum()
    }

    /// Enabled tasks with their weights, in [`TaskKind::ALL`] order.
    pub fn enabled(&self) -> impl Iterator<Item = (TaskKind, usize)> + '_ {
        TaskKind::ALL
            .into_iter()
            .map(|kind| (kind, self.weight(kind)))
            .filter(|(_, weight)| *weight > 0)
    }

    /// Draw one task with probability proportional to its weight.
    ///
    /// Returns `None` when every weight is zero.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TaskKind> {
        let weights: Vec<usize> = TaskKind::ALL.iter().map(|kind| self.weight(*kind)).collect();
        let index = WeightedIndex::new(&weights).ok()?;
        Some(TaskKind::ALL[index.sample(rng)])
    }
}

/// Uniform pause between two consecutive tasks of one virtual user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    min: Duration,
    max: Duration,
}

impl WaitPolicy {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_weights_are_equal() {
        let weights = TaskWeights::default();
        assert_eq!(weights.weight(TaskKind::CreateAndGetUser), 1);
        assert_eq!(weights.weight(TaskKind::HealthCheck), 1);
        assert_eq!(weights.total(), 2);
        assert_eq!(
            weights.enabled().collect::<Vec<_>>(),
            vec![(TaskKind::CreateAndGetUser, 1), (TaskKind::HealthCheck, 1)]
        );
    }

    #[test]
    fn test_zero_weight_disables_task() {
        let weights = TaskWeights {
            create_and_get_user: 0,
            health_check: 4,
        };
        assert_eq!(
            weights.enabled().collect::<Vec<_>>(),
            vec![(TaskKind::HealthCheck, 4)]
        );

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(weights.choose(&mut rng), Some(TaskKind::HealthCheck));
        }
    }

    #[test]
    fn test_choose_with_no_weights() {
        let weights = TaskWeights {
            create_and_get_user: 0,
            health_check: 0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(weights.choose(&mut rng), None);
    }

    #[test]
    fn test_equal_weights_pick_both_tasks_roughly_evenly() {
        let weights = TaskWeights::default();
        let mut rng = StdRng::seed_from_u64(42);
        let creates = (0..1000)
            .filter(|_| weights.choose(&mut rng) == Some(TaskKind::CreateAndGetUser))
            .count();

        // Binomial(1000, 0.5): 400..600 is far outside any plausible deviation
        assert!(
            (400..=600).contains(&creates),
            "Expected ~500 create tasks, got {}",
            creates
        );
    }

    #[test]
    fn test_task_names() {
        assert_eq!(TaskKind::HealthCheck.to_string(), "GET /healthCheck");
        assert_eq!(
            TaskKind::CreateAndGetUser.name(),
            "POST /users + GET /users/{id}"
        );
    }
}
