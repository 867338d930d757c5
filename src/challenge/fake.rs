//! In-memory provider used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use http::{Method, StatusCode};

use crate::desec::{DnsApi, Domain, RRSet, UpstreamError};

type Key = (String, String, String);

#[derive(Default)]
pub struct FakeDns {
    domains: Vec<Domain>,
    rrsets: Mutex<HashMap<Key, RRSet>>,
    last_put: Mutex<Option<RRSet>>,
    put_count: AtomicUsize,
    fail_list_domains: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeDns {
    pub fn new<'a>(domains: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        Self {
            domains: domains
                .into_iter()
                .map(|(name, minimum_ttl)| Domain {
                    name: name.to_string(),
                    minimum_ttl: Some(minimum_ttl),
                    created: None,
                    published: None,
                    touched: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn insert(&self, rrset: RRSet) {
        self.rrsets.lock().unwrap().insert(
            (rrset.domain.clone(), rrset.subname.clone(), rrset.kind.clone()),
            rrset,
        );
    }

    pub fn records(&self, domain: &str, subname: &str, kind: &str) -> Option<Vec<String>> {
        self.rrsets
            .lock()
            .unwrap()
            .get(&(domain.to_string(), subname.to_string(), kind.to_string()))
            .map(|rrset| rrset.records.clone())
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::Acquire)
    }

    pub fn last_put(&self) -> Option<RRSet> {
        self.last_put.lock().unwrap().clone()
    }

    pub fn fail_list_domains(&self) {
        self.fail_list_domains.store(true, Ordering::Release);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::Release);
    }
}

fn server_error(method: Method, path: String) -> UpstreamError {
    UpstreamError::Status {
        method,
        path,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        detail: "fake failure".to_string(),
    }
}

#[async_trait]
impl DnsApi for FakeDns {
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError> {
        if self.fail_list_domains.load(Ordering::Acquire) {
            return Err(server_error(Method::GET, "/domains/".to_string()));
        }

        Ok(self.domains.clone())
    }

    async fn list_rrsets(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
    ) -> Result<Vec<RRSet>, UpstreamError> {
        Ok(self
            .rrsets
            .lock()
            .unwrap()
            .get(&(domain.to_string(), subname.to_string(), kind.to_string()))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn put_rrsets(&self, domain: &str, rrsets: &[RRSet]) -> Result<Vec<RRSet>, UpstreamError> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(server_error(
                Method::PUT,
                format!("/domains/{}/rrsets/", domain),
            ));
        }

        self.put_count.fetch_add(1, Ordering::AcqRel);

        let mut stored = self.rrsets.lock().unwrap();
        let mut written = vec![];

        for rrset in rrsets {
            *self.last_put.lock().unwrap() = Some(rrset.clone());

            let key = (domain.to_string(), rrset.subname.clone(), rrset.kind.clone());

            if rrset.records.is_empty() {
                stored.remove(&key);

                continue;
            }

            let mut rrset = rrset.clone();
            rrset.domain = domain.to_string();

            stored.insert(key, rrset.clone());
            written.push(rrset);
        }

        Ok(written)
    }
}
