use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_channel::mpsc::{Receiver, Sender};
use futures_channel::oneshot::Sender as OneshotSender;
use futures_channel::{mpsc, oneshot};
use futures_util::{SinkExt, StreamExt};
use tap::TapFallible;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, instrument, Instrument};

use crate::challenge::{un_fqdn, Action};
use crate::solver::{ChallengeRequest, Error, Solve};

type Job = (ChallengeRequest, OneshotSender<Result<(), Error>>);

type OnlineNames = Arc<Mutex<HashMap<String, Sender<Job>>>>;

/// Runs requests for the same FQDN one after another, different names still run concurrently.
///
/// A name's task is released after a CleanUp that leaves its queue empty. A name that only ever
/// sees Present keeps its idle task until the process exits. Replicas can still race at the
/// provider.
pub struct QueueSolver<S> {
    online_names: OnlineNames,
    inner_solver: S,
}

impl<S: Clone> Clone for QueueSolver<S> {
    fn clone(&self) -> Self {
        Self {
            online_names: self.online_names.clone(),
            inner_solver: self.inner_solver.clone(),
        }
    }
}

impl<S> QueueSolver<S>
where
    S: Solve<Error = Error>,
{
    pub fn new(solver: S) -> Self {
        Self {
            online_names: Arc::new(Default::default()),
            inner_solver: solver,
        }
    }
}

impl<S> QueueSolver<S>
where
    S: Solve<Error = Error> + Clone + Send + Sync + 'static,
{
    #[instrument(err, skip(self, request), fields(fqdn = %request.resolved_fqdn))]
    async fn submit(&self, request: ChallengeRequest) -> Result<(), Error> {
        let name = un_fqdn(&request.resolved_fqdn).to_string();

        let (result_sender, result_receiver) = oneshot::channel();

        let mut online_names = self.online_names.lock().await;

        if let Some(mut sender) = online_names.get(&name).cloned() {
            // enqueue under the lock, the handler checks for queued jobs under it before releasing
            // the name; a fresh clone always has a slot so this never reports full
            sender
                .try_send((request, result_sender))
                .tap_err(|err| error!(%name, %err, "send request to handler task failed"))
                .map_err(|_| Error::Aborted)?;

            drop(online_names);
        } else {
            // 3 queued requests per name is plenty, cert-manager retries on its own
            let (mut sender, receiver) = mpsc::channel(3);

            sender
                .send((request, result_sender))
                .await
                .map_err(|_| Error::Aborted)?;

            online_names.insert(name.clone(), sender);
            drop(online_names);

            info!(%name, "start handler task");

            tokio::spawn(
                handle_queue(
                    name.clone(),
                    receiver,
                    self.online_names.clone(),
                    self.inner_solver.clone(),
                )
                .instrument(info_span!("handle queue", %name)),
            );
        }

        result_receiver.await.unwrap_or(Err(Error::Aborted))
    }
}

async fn handle_queue<S: Solve<Error = Error> + Send + Sync>(
    name: String,
    mut receiver: Receiver<Job>,
    online_names: OnlineNames,
    solver: S,
) {
    let mut queued = None;

    loop {
        let (request, result_sender) = match queued.take() {
            Some(job) => job,
            None => match receiver.next().await {
                None => break,
                Some(job) => job,
            },
        };

        let action = request.action;

        let result = solver.solve(request).await;

        if action == Action::CleanUp {
            let mut online_names = online_names.lock().await;

            // a fresh task may already own the name
            let owned = online_names
                .get(&name)
                .map(|sender| sender.is_connected_to(&receiver))
                .unwrap_or(false);

            if owned {
                match receiver.try_next() {
                    Ok(Some(job)) => queued = Some(job),

                    _ => {
                        online_names.remove(&name);

                        info!(%name, "clean up done, release name");
                    }
                }
            }
        }

        let _ = result_sender.send(result);
    }

    info!(%name, "handler task stopped");
}

#[async_trait]
impl<S> Solve for QueueSolver<S>
where
    S: Solve<Error = Error> + Clone + Send + Sync + 'static,
{
    type Error = Error;

    fn name(&self) -> &str {
        self.inner_solver.name()
    }

    async fn present(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        self.submit(ChallengeRequest {
            action: Action::Present,
            ..request
        })
        .await
    }

    async fn clean_up(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        self.submit(ChallengeRequest {
            action: Action::CleanUp,
            ..request
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::time::Duration;

    use tokio::time;

    use super::*;

    #[derive(Clone, Default)]
    struct TestSolver {
        n: Arc<AtomicU8>,
        running: Arc<AtomicU8>,
        max_running: Arc<AtomicU8>,
    }

    impl TestSolver {
        async fn run(&self) -> Result<(), Error> {
            let running = self.running.fetch_add(1, Ordering::AcqRel) + 1;
            self.max_running.fetch_max(running, Ordering::AcqRel);

            time::sleep(Duration::from_millis(50)).await;

            self.running.fetch_sub(1, Ordering::AcqRel);
            self.n.fetch_add(1, Ordering::AcqRel);

            Ok(())
        }
    }

    #[async_trait]
    impl Solve for TestSolver {
        type Error = Error;

        fn name(&self) -> &str {
            "test"
        }

        async fn present(&self, _: ChallengeRequest) -> Result<(), Self::Error> {
            self.run().await
        }

        async fn clean_up(&self, _: ChallengeRequest) -> Result<(), Self::Error> {
            self.run().await
        }
    }

    fn request(action: Action, fqdn: &str) -> ChallengeRequest {
        ChallengeRequest {
            uid: String::new(),
            action,
            challenge_type: "dns-01".to_string(),
            dns_name: String::new(),
            key: "123".to_string(),
            resource_namespace: "default".to_string(),
            resolved_fqdn: fqdn.to_string(),
            resolved_zone: String::new(),
            allow_ambient_credentials: false,
            config: None,
        }
    }

    #[tokio::test]
    async fn test_present() {
        let solver = QueueSolver::new(TestSolver::default());

        let n = solver.inner_solver.n.clone();
        let max_running = solver.inner_solver.max_running.clone();
        let online_names = solver.online_names.clone();

        let task1 = {
            let solver = solver.clone();

            tokio::spawn(async move {
                solver
                    .present(request(Action::Present, "_acme-challenge.example.com."))
                    .await
            })
        };

        let task2 = {
            tokio::spawn(async move {
                solver
                    .present(request(Action::Present, "_acme-challenge.example.com"))
                    .await
            })
        };

        task1.await.unwrap().unwrap();
        task2.await.unwrap().unwrap();

        assert_eq!(n.load(Ordering::Acquire), 2);
        assert_eq!(max_running.load(Ordering::Acquire), 1);
        assert!(online_names
            .lock()
            .await
            .get("_acme-challenge.example.com")
            .is_some());
    }

    #[tokio::test]
    async fn test_different_names_run_together() {
        let solver = QueueSolver::new(TestSolver::default());

        let max_running = solver.inner_solver.max_running.clone();

        let tasks = ["a.example.com", "b.example.com"]
            .into_iter()
            .map(|fqdn| {
                let solver = solver.clone();

                tokio::spawn(async move { solver.present(request(Action::Present, fqdn)).await })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(max_running.load(Ordering::Acquire), 2);
    }

    #[tokio::test]
    async fn test_clean_up_keeps_name_while_queued() {
        let solver = QueueSolver::new(TestSolver::default());

        let n = solver.inner_solver.n.clone();
        let max_running = solver.inner_solver.max_running.clone();

        let tasks = [
            (0, Action::Present),
            (5, Action::CleanUp),
            (10, Action::Present),
            (120, Action::Present),
        ]
        .into_iter()
        .map(|(delay, action)| {
            let solver = solver.clone();

            tokio::spawn(async move {
                time::sleep(Duration::from_millis(delay)).await;

                solver
                    .solve(request(action, "_acme-challenge.example.com"))
                    .await
            })
        })
        .collect::<Vec<_>>();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(n.load(Ordering::Acquire), 4);
        assert_eq!(max_running.load(Ordering::Acquire), 1);
    }

    #[tokio::test]
    async fn test_shared_inner_solver() {
        let inner = Arc::new(TestSolver::default());
        let solver = QueueSolver::new(inner.clone());

        assert_eq!(solver.name(), "test");

        solver
            .present(request(Action::Present, "_acme-challenge.example.com"))
            .await
            .unwrap();

        assert_eq!(inner.n.load(Ordering::Acquire), 1);
    }

    #[tokio::test]
    async fn test_clean_up() {
        let solver = QueueSolver::new(TestSolver::default());

        let n = solver.inner_solver.n.clone();
        let online_names = solver.online_names.clone();

        let task1 = {
            let solver = solver.clone();

            tokio::spawn(async move {
                solver
                    .present(request(Action::Present, "_acme-challenge.example.com"))
                    .await
            })
        };

        let task2 = {
            tokio::spawn(async move {
                // make sure the clean up happened after present
                time::sleep(Duration::from_millis(10)).await;

                solver
                    .clean_up(request(Action::CleanUp, "_acme-challenge.example.com"))
                    .await
            })
        };

        task1.await.unwrap().unwrap();
        task2.await.unwrap().unwrap();

        assert_eq!(n.load(Ordering::Acquire), 2);
        assert!(online_names
            .lock()
            .await
            .get("_acme-challenge.example.com")
            .is_none());
    }
}
