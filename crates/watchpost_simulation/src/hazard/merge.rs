//! MergeWorker - фоновый merge hazard регионов
//!
//! Task на AsyncComputeTaskPool собирает полный Vec<SimplifiedHazard>;
//! main thread забирает результат только когда task завершён и подменяет
//! snapshot целиком. Новый запрос отменяет старый task: cancel flag
//! (merge loop проверяет его на каждом проходе) + drop handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::tasks::futures_lite::future;
use bevy::tasks::{AsyncComputeTaskPool, Task, TaskPool};

use super::region::{merge_overlapping, SimplifiedHazard};

/// Результат опроса worker'а
#[derive(Debug)]
pub enum MergePoll {
    /// Нет активного merge
    Idle,
    /// Task ещё считает
    Running,
    Finished(Vec<SimplifiedHazard>),
}

#[derive(Default)]
pub struct MergeWorker {
    task: Option<Task<Option<Vec<SimplifiedHazard>>>>,
    cancel: Arc<AtomicBool>,
}

impl MergeWorker {
    /// Запускает merge (активный task отменяется)
    pub fn start(&mut self, seed: Vec<SimplifiedHazard>) {
        self.abort();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);

        let pool = AsyncComputeTaskPool::get_or_init(TaskPool::new);
        self.task = Some(pool.spawn(async move { merge_overlapping(seed, &cancel) }));
    }

    pub fn abort(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.task = None;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_some_and(|task| task.is_finished())
    }

    /// Non-blocking опрос
    pub fn poll(&mut self) -> MergePoll {
        let Some(task) = self.task.as_mut() else {
            return MergePoll::Idle;
        };

        match future::block_on(future::poll_once(task)) {
            None => MergePoll::Running,
            Some(result) => {
                self.task = None;
                result.map_or(MergePoll::Idle, MergePoll::Finished)
            }
        }
    }

    /// Блокирующее ожидание (тесты, teardown)
    pub fn wait(&mut self) -> MergePoll {
        let Some(task) = self.task.take() else {
            return MergePoll::Idle;
        };

        future::block_on(task).map_or(MergePoll::Idle, MergePoll::Finished)
    }
}

impl Drop for MergeWorker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for MergeWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeWorker")
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::HazardPolicy;
    use crate::shared::aabb;
    use bevy::prelude::*;

    fn cube(x: f32) -> SimplifiedHazard {
        SimplifiedHazard {
            bounds: aabb(Vec3::new(x, 0.0, 0.0), Vec3::splat(5.0)),
            policy: HazardPolicy::default(),
        }
    }

    #[test]
    fn test_worker_merges_in_background() {
        let mut worker = MergeWorker::default();
        assert!(matches!(worker.poll(), MergePoll::Idle));

        worker.start(vec![cube(0.0), cube(5.0)]);
        assert!(worker.is_running());

        match worker.wait() {
            MergePoll::Finished(regions) => assert_eq!(regions.len(), 1),
            other => panic!("unexpected poll result: {:?}", other),
        }
        assert!(!worker.is_running());
    }

    #[test]
    fn test_restart_aborts_stale_task() {
        let mut worker = MergeWorker::default();
        worker.start(vec![cube(0.0), cube(5.0)]);
        let stale_cancel = Arc::clone(&worker.cancel);

        worker.start(vec![cube(0.0), cube(50.0)]);
        assert!(stale_cancel.load(Ordering::Relaxed));

        match worker.wait() {
            MergePoll::Finished(regions) => assert_eq!(regions.len(), 2),
            other => panic!("unexpected poll result: {:?}", other),
        }
    }
}
