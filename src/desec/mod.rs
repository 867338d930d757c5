use std::ops::Deref;

use async_trait::async_trait;

pub use client::{DesecClient, DesecClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result, UpstreamError};
pub use types::{Domain, RRSet};

mod client;
mod error;
mod types;

/// Writes are whole-set replaces, there is no append or patch primitive.
#[async_trait]
pub trait DnsApi {
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError>;

    async fn list_rrsets(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
    ) -> Result<Vec<RRSet>, UpstreamError>;

    async fn put_rrsets(&self, domain: &str, rrsets: &[RRSet]) -> Result<Vec<RRSet>, UpstreamError>;
}

#[async_trait]
impl<A, T> DnsApi for T
where
    T: Deref<Target = A> + Send + Sync,
    A: DnsApi + Sync,
{
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError> {
        self.deref().list_domains().await
    }

    async fn list_rrsets(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
    ) -> Result<Vec<RRSet>, UpstreamError> {
        self.deref().list_rrsets(domain, subname, kind).await
    }

    async fn put_rrsets(&self, domain: &str, rrsets: &[RRSet]) -> Result<Vec<RRSet>, UpstreamError> {
        self.deref().put_rrsets(domain, rrsets).await
    }
}
