use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tap::TapFallible;
use tracing::{debug, error, instrument};

use crate::solver::{Error, SecretKeySelector};

#[async_trait]
pub trait CredentialProvider {
    async fn secret_key(
        &self,
        selector: &SecretKeySelector,
        namespace: &str,
    ) -> Result<String, Error>;
}

#[derive(Clone)]
pub struct KubeSecretProvider {
    client: Client,
}

impl KubeSecretProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialProvider for KubeSecretProvider {
    #[instrument(err, skip(self))]
    async fn secret_key(
        &self,
        selector: &SecretKeySelector,
        namespace: &str,
    ) -> Result<String, Error> {
        debug!(key = %selector.key, namespace, name = %selector.name, "retrieving secret key");

        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        let secret = match secret_api.get(&selector.name).await {
            Err(kube::Error::Api(err)) if err.code == 404 => {
                error!(namespace, name = %selector.name, "secret not found");

                return Err(Error::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: selector.name.clone(),
                });
            }

            Err(err) => {
                error!(%err, namespace, name = %selector.name, "get secret failed");

                return Err(err.into());
            }

            Ok(secret) => secret,
        };

        secret_value(secret, selector, namespace)
    }
}

fn secret_value(secret: Secret, selector: &SecretKeySelector, namespace: &str) -> Result<String, Error> {
    let value = secret
        .data
        .and_then(|mut data| data.remove(&selector.key))
        .ok_or_else(|| Error::SecretKeyNotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
            key: selector.key.clone(),
        })
        .tap_err(|err| error!(%err, "read secret key failed"))?;

    String::from_utf8(value.0).map_err(|_| Error::SecretNotUtf8 {
        namespace: namespace.to_string(),
        name: selector.name.clone(),
        key: selector.key.clone(),
    })
}
