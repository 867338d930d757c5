use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn, Instrument};

use crate::solver::{ChallengeRequest, Solve};

pub const API_VERSION: &str = "webhook.acme.cert-manager.io/v1alpha1";
pub const KIND: &str = "ChallengePayload";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub uid: String,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl ChallengeResponse {
    fn ok(uid: String) -> Self {
        Self {
            uid,
            success: true,
            status: None,
        }
    }

    fn failed(uid: String, message: String) -> Self {
        Self {
            uid,
            success: false,
            status: Some(Status {
                code: Some(StatusCode::INTERNAL_SERVER_ERROR.as_u16().into()),
                message: Some(message),
                reason: Some("InternalError".to_string()),
                status: Some("Failure".to_string()),
                ..Default::default()
            }),
        }
    }
}

struct WebhookState<S> {
    group: String,
    solver: S,
}

pub fn router<S>(group: impl Into<String>, solver: S) -> Router
where
    S: Solve + Send + Sync + 'static,
{
    let state = Arc::new(WebhookState {
        group: group.into(),
        solver,
    });

    Router::new()
        .route("/healthz", get(healthz))
        .route("/apis/:group/v1alpha1/:solver", post(handle_challenge::<S>))
        .layer(Extension(state))
}

pub async fn serve<S>(addr: SocketAddr, group: impl Into<String>, solver: S) -> anyhow::Result<()>
where
    S: Solve + Send + Sync + 'static,
{
    let group = group.into();

    info!(%addr, %group, solver = solver.name(), "webhook start listening");

    axum::Server::try_bind(&addr)?
        .serve(router(group, solver).into_make_service())
        .await?;

    error!("webhook server stopped, that should not happened");

    Err(anyhow::anyhow!("webhook server stopped, that should not happened"))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn handle_challenge<S>(
    Path((group, solver_name)): Path<(String, String)>,
    Extension(state): Extension<Arc<WebhookState<S>>>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<ChallengePayload>, StatusCode>
where
    S: Solve + Send + Sync + 'static,
{
    if group != state.group || solver_name != state.solver.name() {
        warn!(%group, %solver_name, "unknown solver");

        return Err(StatusCode::NOT_FOUND);
    }

    let request = payload.request.ok_or_else(|| {
        warn!("challenge payload doesn't have request");

        StatusCode::BAD_REQUEST
    })?;

    let uid = request.uid.clone();
    let action = request.action;
    let fqdn = request.resolved_fqdn.clone();

    let response = match state
        .solver
        .solve(request)
        .instrument(info_span!("solve challenge", %uid, %action, %fqdn))
        .await
    {
        Ok(()) => {
            info!(%uid, %action, %fqdn, "solve challenge done");

            ChallengeResponse::ok(uid)
        }

        Err(err) => {
            error!(%uid, %action, %fqdn, %err, "solve challenge failed");

            ChallengeResponse::failed(uid, err.to_string())
        }
    };

    Ok(Json(ChallengePayload {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        request: None,
        response: Some(response),
    }))
}
