use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::core::check_requests::check_requests;
use crate::core::concurrency_controller::ConcurrencyController;
use crate::core::execute::RequestExecutor;
use crate::core::metrics::Metrics;
use crate::core::resolver::Resolver;
use crate::error::{ConfigError, LoadError};
use crate::models::collection::{Collection, Request};
use crate::models::load_config::{LoadConfig, Termination};
use crate::models::result::LoadTestResult;

/// Replays one fixed request from a fixed pool of virtual users and aggregates the outcome.
///
/// Cancelling [`LoadEngine::cancel_token`] stops feeding work; requests already
/// in flight finish and every worker is joined before the summary is built. A
/// cancelled engine stays cancelled.
pub struct LoadEngine {
    config: LoadConfig,
    termination: Termination,
    executor: RequestExecutor,
    resolver: Arc<Resolver>,
    request: Arc<Request>,
    cancel: CancellationToken,
}

struct Worker {
    id: usize,
    executor: RequestExecutor,
    request: Arc<Request>,
    resolver: Arc<Resolver>,
    queue: Arc<Mutex<mpsc::Receiver<()>>>,
    gate: Arc<Semaphore>,
    metrics: Arc<Metrics>,
    stop: CancellationToken,
}

impl Worker {
    async fn run(self) -> u64 {
        // 等待爬坡许可
        let _permit = tokio::select! {
            _ = self.stop.cancelled() => return 0,
            permit = self.gate.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return 0,
            },
        };
        debug!(worker = self.id, "virtual user started");

        let mut executed = 0u64;
        loop {
            let item = tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                item = async { self.queue.lock().await.recv().await } => item,
            };
            if item.is_none() {
                // closed and drained: nothing left for anyone
                self.stop.cancel();
                break;
            }
            let result = self.executor.execute(&self.request, &self.resolver).await;
            self.metrics.record(&result);
            executed += 1;
        }
        debug!(worker = self.id, executed, "virtual user finished");
        executed
    }
}

impl LoadEngine {
    pub fn new(
        config: LoadConfig,
        executor: RequestExecutor,
        resolver: Resolver,
        request: Request,
    ) -> Result<Self, LoadError> {
        if config.virtual_users == 0 {
            return Err(LoadError::NoVirtualUsers);
        }
        let termination = config.termination().ok_or(LoadError::NoTermination)?;
        check_requests(std::slice::from_ref(&request))?;
        Ok(LoadEngine {
            config,
            termination,
            executor,
            resolver: Arc::new(resolver),
            request: Arc::new(request),
            cancel: CancellationToken::new(),
        })
    }

    /// Builds an engine for the request called `request_name`, with the
    /// resolver primed from `env_name` of `collection`.
    pub fn for_collection(
        config: LoadConfig,
        executor: RequestExecutor,
        collection: &Collection,
        env_name: &str,
        request_name: &str,
    ) -> Result<Self, LoadError> {
        let request = collection
            .request(request_name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownRequest(request_name.to_string()))?;
        let mut resolver = Resolver::new();
        resolver.load_environment(collection, env_name)?;
        Self::new(config, executor, resolver, request)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub async fn run(&self) -> Result<LoadTestResult, LoadError> {
        let request = &self.request;
        let users = self.config.virtual_users;
        info!(
            request = %request.name,
            users,
            termination = ?self.termination,
            ramp_up = ?self.config.ramp_up,
            "load test started"
        );
        let start = Instant::now();
        let metrics = Arc::new(Metrics::new());
        let stop = self.cancel.child_token();

        let (tx, rx) = mpsc::channel::<()>(users * 10);
        let queue = Arc::new(Mutex::new(rx));
        let controller = Arc::new(ConcurrencyController::new(users, self.config.ramp_up));

        let handles: Vec<_> = (0..users)
            .map(|id| {
                let worker = Worker {
                    id,
                    executor: self.executor.clone(),
                    request: request.clone(),
                    resolver: self.resolver.clone(),
                    queue: queue.clone(),
                    gate: controller.get_semaphore(),
                    metrics: metrics.clone(),
                    stop: stop.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        // workers hold the only receivers, so a dead pool fails the feeder
        drop(queue);

        let pacing = {
            let controller = controller.clone();
            let stop = stop.clone();
            tokio::spawn(async move { controller.distribute_permits(stop).await })
        };

        let queued = feed(tx, self.termination, &stop).await;
        debug!(queued, "work queue closed");

        let mut crashed = 0;
        for outcome in join_all(handles).await {
            if let Err(e) = outcome {
                crashed += 1;
                error!(error = %e, "virtual user crashed");
            }
        }
        stop.cancel();
        if let Err(e) = pacing.await {
            error!(error = %e, "ramp-up task crashed");
        }
        if crashed == users && metrics.total_requests() == 0 {
            return Err(LoadError::Pool(format!("all {} virtual users crashed", users)));
        }

        let summary = metrics.summarize(start.elapsed());
        info!(
            request = %request.name,
            total = summary.total_requests,
            success = summary.success_requests,
            failed = summary.failed_requests,
            rps = summary.rps,
            "load test finished"
        );
        Ok(summary)
    }
}

/// Queues work until the termination condition or cancellation; dropping
/// `tx` on return closes the queue.
async fn feed(tx: mpsc::Sender<()>, termination: Termination, stop: &CancellationToken) -> u64 {
    let mut queued = 0u64;
    match termination {
        Termination::Duration(duration) => {
            let deadline = tokio::time::sleep(duration);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = &mut deadline => break,
                    sent = tx.send(()) => {
                        if sent.is_err() {
                            break;
                        }
                        queued += 1;
                    }
                }
            }
        }
        Termination::Iterations(iterations) => {
            for _ in 0..iterations {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    sent = tx.send(()) => {
                        if sent.is_err() {
                            break;
                        }
                        queued += 1;
                    }
                }
            }
        }
    }
    queued
}
