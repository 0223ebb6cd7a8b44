use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Hands out one start permit per virtual user.
///
/// Without ramp-up every permit is available at once; with ramp-up they are
/// released one per `ramp_up / total_permits`, the first immediately. Workers
/// exist from the start but take no work until they hold a permit.
pub struct ConcurrencyController {
    semaphore: Arc<Semaphore>,
    total_permits: usize,
    ramp_up: Duration,
}

impl ConcurrencyController {
    pub fn new(total_permits: usize, ramp_up: Duration) -> Self {
        ConcurrencyController {
            semaphore: Arc::new(Semaphore::new(0)),
            total_permits,
            ramp_up,
        }
    }

    fn step(&self) -> Option<Duration> {
        if self.ramp_up.is_zero() || self.total_permits == 0 {
            return None;
        }
        let step = self.ramp_up / self.total_permits as u32;
        (!step.is_zero()).then_some(step)
    }

    // 分发许可证
    pub async fn distribute_permits(&self, cancel: CancellationToken) {
        let Some(step) = self.step() else {
            // 一次性分发所有许可
            self.semaphore.add_permits(self.total_permits);
            return;
        };

        let mut ticker = interval(step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        for added in 0..self.total_permits {
            tokio::select! {
                _ = cancel.cancelled() => {
                    // waiting workers see a closed semaphore and exit
                    self.semaphore.close();
                    return;
                }
                _ = ticker.tick() => {
                    self.semaphore.add_permits(1);
                    debug!(active = added + 1, total = self.total_permits, "virtual user released");
                }
            }
        }
    }

    // 获取信号量
    pub fn get_semaphore(&self) -> Arc<Semaphore> {
        self.semaphore.clone()
    }
}
