use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use tap::TapFallible;
use tracing::{error, info, instrument};

use crate::challenge::{Action, ChallengeReconciler};
use crate::credential::CredentialProvider;
use crate::desec::DesecClient;
use crate::solver::{ChallengeRequest, Error, Solve, SolverConfig};

pub const SOLVER_NAME: &str = "desec";

#[derive(Clone)]
pub struct DesecSolver<C> {
    credentials: C,
    api_url: String,
    timeout: Duration,
}

impl<C> Debug for DesecSolver<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesecSolver")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<C> DesecSolver<C>
where
    C: CredentialProvider + Send + Sync,
{
    pub fn new(credentials: C, api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            credentials,
            api_url: api_url.into(),
            timeout,
        }
    }

    async fn reconciler(
        &self,
        request: &ChallengeRequest,
    ) -> Result<ChallengeReconciler<DesecClient>, Error> {
        let config = SolverConfig::decode(request.config.as_ref())
            .tap_err(|err| error!(%err, uid = %request.uid, "decode solver config failed"))?;

        let token = self
            .credentials
            .secret_key(&config.api_token_secret_ref, &request.resource_namespace)
            .await?;

        let client = DesecClient::builder(token)
            .base_url(self.api_url.as_str())
            .timeout(self.timeout)
            .build()?;

        Ok(ChallengeReconciler::new(client))
    }

    async fn handle(&self, action: Action, request: ChallengeRequest) -> Result<(), Error> {
        info!(%action, fqdn = %request.resolved_fqdn, "handle challenge");

        let reconciler = self.reconciler(&request).await?;

        let zone_hint = Some(request.resolved_zone.as_str()).filter(|zone| !zone.is_empty());

        match action {
            Action::Present => {
                reconciler
                    .present(zone_hint, &request.resolved_fqdn, &request.key)
                    .await?
            }

            Action::CleanUp => {
                reconciler
                    .clean_up(zone_hint, &request.resolved_fqdn, &request.key)
                    .await?
            }
        }

        info!(%action, fqdn = %request.resolved_fqdn, "handle challenge done");

        Ok(())
    }
}

#[async_trait]
impl<C> Solve for DesecSolver<C>
where
    C: CredentialProvider + Send + Sync,
{
    type Error = Error;

    fn name(&self) -> &str {
        SOLVER_NAME
    }

    #[instrument(err, skip(self, request), fields(fqdn = %request.resolved_fqdn))]
    async fn present(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        let fqdn = request.resolved_fqdn.clone();

        self.handle(Action::Present, request)
            .await
            .tap_err(|err| error!(%err, %fqdn, "error while presenting record"))
    }

    #[instrument(err, skip(self, request), fields(fqdn = %request.resolved_fqdn))]
    async fn clean_up(&self, request: ChallengeRequest) -> Result<(), Self::Error> {
        let fqdn = request.resolved_fqdn.clone();

        self.handle(Action::CleanUp, request)
            .await
            .tap_err(|err| error!(%err, %fqdn, "error while cleaning up record"))
    }
}
