use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::challenge::rrset::RRSetRepository;
use crate::challenge::zone::{subdomain_label, un_fqdn, ZoneResolver};
use crate::desec::{DnsApi, Domain, Error, Result};

pub const TXT: &str = "TXT";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Present,
    CleanUp,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct ChallengeReconciler<A> {
    api: A,
}

impl<A: DnsApi + Sync> ChallengeReconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// `zone_hint` is only compared against the resolved zone, it never overrides it.
    #[instrument(err, skip(self, key))]
    pub async fn present(&self, zone_hint: Option<&str>, fqdn: &str, key: &str) -> Result<()> {
        self.reconcile(Action::Present, zone_hint, fqdn, key).await
    }

    #[instrument(err, skip(self, key))]
    pub async fn clean_up(&self, zone_hint: Option<&str>, fqdn: &str, key: &str) -> Result<()> {
        self.reconcile(Action::CleanUp, zone_hint, fqdn, key).await
    }

    async fn reconcile(
        &self,
        action: Action,
        zone_hint: Option<&str>,
        fqdn: &str,
        key: &str,
    ) -> Result<()> {
        let fqdn = un_fqdn(fqdn);

        let (domain, subname) = self.locate(zone_hint, fqdn).await?;

        info!(%action, fqdn, zone = %domain.name, subname, "locate record set done");

        let repo = RRSetRepository::new(&self.api);

        match action {
            Action::Present => {
                repo.add_value(&domain.name, subname, TXT, key, domain.minimum_ttl)
                    .await?;
            }

            Action::CleanUp => {
                repo.remove_value(&domain.name, subname, TXT, key).await?;
            }
        }

        info!(%action, fqdn, zone = %domain.name, subname, "reconcile challenge record done");

        Ok(())
    }

    async fn locate<'f>(&self, zone_hint: Option<&str>, fqdn: &'f str) -> Result<(Domain, &'f str)> {
        let domain = ZoneResolver::new(&self.api).resolve(fqdn).await?;

        if let Some(hint) = zone_hint.map(un_fqdn) {
            if !hint.is_empty() && hint != domain.name {
                warn!(fqdn, hint, zone = %domain.name, "resolved zone differs from caller's zone");
            }
        }

        // resolve only returns zones fqdn is inside of
        let subname = subdomain_label(fqdn, &domain.name).ok_or_else(|| Error::ZoneNotFound {
            fqdn: fqdn.to_string(),
        })?;

        Ok((domain, subname))
    }
}
