use anyhow::Result;
use kube::Client;
use tracing::info;

use crate::config::Config;
use crate::credential::KubeSecretProvider;
use crate::solver::{DesecSolver, QueueSolver};

pub mod challenge;
mod config;
pub mod credential;
pub mod desec;
pub mod solver;
mod trace;
pub mod webhook;

pub async fn run() -> Result<()> {
    trace::init_tracing()?;

    let config = Config::from_env()?;

    info!(?config, "load config done");

    let client = Client::try_default().await?;

    info!("init k8s client");

    let solver = QueueSolver::new(DesecSolver::new(
        KubeSecretProvider::new(client),
        config.api_url,
        config.timeout,
    ));

    let result = webhook::serve(config.listen_addr, config.group_name, solver).await;

    trace::stop_tracing();

    result
}
