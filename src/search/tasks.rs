//! Parallel driver over a task queue with cooperative cancellation
//!
//! Alternative to the static-ordered driver with the same contract. The
//! seed space is chunked in natural lexicographic order into a lock-free
//! injector queue; a fixed set of worker tasks drains it. The first worker
//! to complete a ruler captures the result exactly once and broadcasts
//! cancellation through a shared stop flag, which siblings observe between
//! seeds and exit cooperatively.
//!
//! No hint-based reordering and no checkpointing in this variant; its value
//! is the earlier stop, not resumability.

use crate::config::EngineConfig;
use crate::search::dfs::{self, DfsContext, SearchFrame};
use crate::search::parallel::seed_space;
use crate::types::Ruler;
use crossbeam_deque::{Injector, Steal};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Seeds per task, balancing steal overhead against cancellation latency
const TASK_GRAINSIZE: usize = 32;

/// Solve (n, target) with the task-based parallel driver.
pub(crate) fn solve_tasks(n: u32, target: u32, config: &EngineConfig) -> Option<Ruler> {
    if n <= 3 {
        return dfs::solve_single(n, target, config);
    }

    let ctx = DfsContext::new(n, target, config);
    let space = seed_space(n, target)?;

    // single producer: chunk the flattened seed space into tasks
    let injector: Injector<Vec<(u32, u32)>> = Injector::new();
    let mut chunk = Vec::with_capacity(TASK_GRAINSIZE);
    for second in 1..=space.second_max {
        for third in (second + 1)..=space.third_max {
            chunk.push((second, third));
            if chunk.len() == TASK_GRAINSIZE {
                injector.push(std::mem::replace(&mut chunk, Vec::with_capacity(TASK_GRAINSIZE)));
            }
        }
    }
    if !chunk.is_empty() {
        injector.push(chunk);
    }
    if injector.is_empty() {
        return None;
    }

    let cancelled = AtomicBool::new(false);
    let winner: Mutex<Option<Ruler>> = Mutex::new(None);

    let worker = || loop {
        if cancelled.load(Ordering::Acquire) {
            return;
        }
        match injector.steal() {
            Steal::Success(seeds) => {
                for (second, third) in seeds {
                    if cancelled.load(Ordering::Acquire) {
                        return;
                    }
                    let Some(mut frame) = SearchFrame::seeded(second, third) else {
                        continue;
                    };
                    if ctx.search(&mut frame, 3) {
                        let mut slot = winner.lock();
                        if slot.is_none() {
                            *slot = frame.into_ruler(n as usize);
                            // broadcast: siblings poll this between seeds
                            cancelled.store(true, Ordering::Release);
                        }
                        return;
                    }
                }
            }
            Steal::Retry => {}
            Steal::Empty => return,
        }
    };

    let threads = config.search.threads.max(1);
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.scope(|s| {
            for _ in 0..threads {
                s.spawn(|_| worker());
            }
        }),
        Err(e) => {
            log::warn!("worker pool construction failed ({}), searching on the current thread", e);
            worker();
        }
    }

    winner.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_solve_finds_optimum() {
        let mut config = EngineConfig::default();
        config.search.threads = 2;
        let ruler = solve_tasks(5, 11, &config).expect("order 5 optimum");
        assert_eq!(ruler.length(), 11);
        assert_eq!(ruler.order(), 5);
    }

    #[test]
    fn test_task_solve_unsatisfiable() {
        let mut config = EngineConfig::default();
        config.search.threads = 2;
        assert!(solve_tasks(6, 16, &config).is_none());
    }

    #[test]
    fn test_task_solve_delegates_small_orders() {
        let config = EngineConfig::default();
        let ruler = solve_tasks(3, 3, &config).expect("order 3");
        assert_eq!(ruler.positions(), &[0, 1, 3]);
    }
}
