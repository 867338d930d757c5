use thiserror::Error;

use crate::desec;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error decoding solver config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("secret `{namespace}/{name}` not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("key `{key}` not found in secret `{namespace}/{name}`")]
    SecretKeyNotFound {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("key `{key}` in secret `{namespace}/{name}` is not valid utf-8")]
    SecretNotUtf8 {
        namespace: String,
        name: String,
        key: String,
    },

    #[error("kube api failed: {0}")]
    Kube(#[from] kube::Error),

    #[error("build desec client failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Desec(#[from] desec::Error),

    #[error("solver task has been aborted")]
    Aborted,
}
