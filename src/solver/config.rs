use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default)]
    pub api_token_secret_ref: SecretKeySelector,
}

impl SolverConfig {
    /// No config at all decodes to the default.
    pub fn decode(raw: Option<&Value>) -> Result<Self, serde_json::Error> {
        match raw {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(raw) => Self::deserialize(raw),
        }
    }
}
