use std::ops::Deref;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use config::{SecretKeySelector, SolverConfig};
pub use desec_solver::DesecSolver;
pub use error::Error;
pub use queue_solver::QueueSolver;

use crate::challenge::Action;

mod config;
mod desec_solver;
mod error;
mod queue_solver;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    pub uid: String,

    pub action: Action,

    #[serde(rename = "type", default)]
    pub challenge_type: String,

    #[serde(default)]
    pub dns_name: String,

    pub key: String,

    /// Namespace the credential secret is looked up in.
    #[serde(default)]
    pub resource_namespace: String,

    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,

    #[serde(default)]
    pub resolved_zone: String,

    #[serde(default)]
    pub allow_ambient_credentials: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[async_trait]
pub trait Solve {
    type Error: std::error::Error + Send;

    fn name(&self) -> &str;

    /// Publish the challenge record. Must tolerate being called again with the same request.
    async fn present(&self, request: ChallengeRequest) -> Result<(), Self::Error>;

    async fn clean_up(&self, request: ChallengeRequest) -> Result<(), Self::Error>;

    async fn solve(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        match request.action {
            Action::Present => self.present(request).await,
            Action::CleanUp => self.clean_up(request).await,
        }
    }
}

#[async_trait]
impl<S, T> Solve for T
where
    T: Deref<Target = S> + Send + Sync,
    S: Solve + Sync + 'static,
{
    type Error = S::Error;

    fn name(&self) -> &str {
        self.deref().name()
    }

    async fn present(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        self.deref().present(request).await
    }

    async fn clean_up(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        self.deref().clean_up(request).await
    }
}
