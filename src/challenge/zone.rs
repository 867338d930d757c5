use tracing::{error, info, instrument};

use crate::desec::{DnsApi, Domain, Error, Result};

pub struct ZoneResolver<'a, A> {
    api: &'a A,
}

impl<'a, A: DnsApi + Sync> ZoneResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    #[instrument(err, skip(self))]
    pub async fn resolve(&self, fqdn: &str) -> Result<Domain> {
        let domains = self.api.list_domains().await?;

        let domain = longest_suffix_match(&domains, fqdn).cloned().ok_or_else(|| {
            error!(fqdn, "no managed zone matches");

            Error::ZoneNotFound {
                fqdn: fqdn.to_string(),
            }
        })?;

        info!(fqdn, zone = %domain.name, minimum_ttl = ?domain.minimum_ttl, "resolve zone done");

        Ok(domain)
    }
}

pub fn longest_suffix_match<'z>(domains: &'z [Domain], fqdn: &str) -> Option<&'z Domain> {
    domains
        .iter()
        .filter(|domain| subdomain_label(fqdn, &domain.name).is_some())
        .max_by_key(|domain| domain.name.len())
}

/// The part of `fqdn` in front of `zone`, `Some("")` for the apex and `None` when `fqdn` is not
/// inside `zone`.
pub fn subdomain_label<'f>(fqdn: &'f str, zone: &str) -> Option<&'f str> {
    if fqdn == zone {
        return Some("");
    }

    fqdn.strip_suffix(zone)?.strip_suffix('.')
}

pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}
