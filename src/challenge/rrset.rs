use tracing::{info, instrument};

use crate::desec::{DnsApi, RRSet, UpstreamError};

pub struct RRSetRepository<'a, A> {
    api: &'a A,
}

impl<'a, A: DnsApi + Sync> RRSetRepository<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    #[instrument(err, skip(self))]
    pub async fn fetch(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
    ) -> Result<Option<RRSet>, UpstreamError> {
        let rrset = self
            .api
            .list_rrsets(domain, subname, kind)
            .await?
            .into_iter()
            .next();

        Ok(rrset.map(|mut rrset| {
            // the listing is scoped to the zone, some answers leave it out
            if rrset.domain.is_empty() {
                rrset.domain = domain.to_string();
            }

            rrset
        }))
    }

    #[instrument(err, skip(self))]
    pub async fn upsert(&self, rrset: RRSet) -> Result<RRSet, UpstreamError> {
        let written = self
            .api
            .put_rrsets(&rrset.domain, std::slice::from_ref(&rrset))
            .await?;

        // an emptied set is dropped by the provider and echoed as nothing
        Ok(written.into_iter().next().unwrap_or(rrset))
    }

    #[instrument(err, skip(self))]
    pub async fn add_value(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
        value: &str,
        default_ttl: Option<u32>,
    ) -> Result<RRSet, UpstreamError> {
        let rrset = match self.fetch(domain, subname, kind).await? {
            None => {
                info!(domain, subname, kind, "rrset not exist, create it");

                RRSet::new(domain, subname, kind, vec![value.to_string()], default_ttl)
            }

            Some(rrset) if rrset.contains(value) => {
                info!(domain, subname, kind, "value already exists, no need update");

                return Ok(rrset);
            }

            Some(mut rrset) => {
                rrset.records.push(value.to_string());

                rrset
            }
        };

        let rrset = self.upsert(rrset).await?;

        info!(domain, subname, kind, records = ?rrset.records, "add value done");

        Ok(rrset)
    }

    #[instrument(err, skip(self))]
    pub async fn remove_value(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
        value: &str,
    ) -> Result<Option<RRSet>, UpstreamError> {
        let mut rrset = match self.fetch(domain, subname, kind).await? {
            None => {
                info!(domain, subname, kind, "rrset not exist, nothing to remove");

                return Ok(None);
            }

            Some(rrset) => rrset,
        };

        let records = rrset
            .records
            .iter()
            .filter(|record| *record != value)
            .cloned()
            .collect::<Vec<_>>();

        if records.len() == rrset.records.len() {
            info!(domain, subname, kind, "value not exist, no need update");

            return Ok(Some(rrset));
        }

        rrset.records = records;

        let rrset = self.upsert(rrset).await?;

        info!(domain, subname, kind, records = ?rrset.records, "remove value done");

        Ok(Some(rrset))
    }
}
