/// The `/contact` relay: validates submissions and forwards them by mail
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::MailSettings;
use crate::contact::ContactSubmission;
use crate::mail::{MailMessage, MailTransport};

pub const INVALID_DATA: &str = "Datos inválidos";
pub const SEND_FAILED: &str = "No se pudo enviar el correo";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const SENT: &str = "Enviado";

/// JSON body of every relay response
#[derive(Debug, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl Reply {
    fn ok() -> Self {
        Self {
            ok: true,
            message: None,
            error: None,
        }
    }

    fn sent() -> Self {
        Self {
            message: Some(SENT),
            ..Self::ok()
        }
    }

    fn error(error: &'static str) -> Self {
        Self {
            ok: false,
            message: None,
            error: Some(error),
        }
    }
}

#[derive(Clone)]
pub struct RelayState {
    transport: Arc<dyn MailTransport>,
    mail: Arc<MailSettings>,
}

impl RelayState {
    pub fn new(transport: Arc<dyn MailTransport>, mail: MailSettings) -> Self {
        Self {
            transport,
            mail: Arc::new(mail),
        }
    }
}

/// Build the relay router with CORS restricted to `allowed_origins`
pub fn router(state: RelayState, allowed_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/contact",
            post(submit)
                .options(|| async { StatusCode::NO_CONTENT })
                .fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "contact relay listening");
    axum::serve(listener, app).await
}

async fn submit(State(state): State<RelayState>, body: Bytes) -> Response {
    let submission = ContactSubmission::parse(&body);
    if submission.is_spam() {
        debug!("honeypot filled, dropping submission");
        return (StatusCode::OK, Json(Reply::ok())).into_response();
    }

    let contact = match submission.validate() {
        Ok(contact) => contact,
        Err(reason) => {
            debug!(?reason, "rejected contact submission");
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(Reply::error(INVALID_DATA)))
                .into_response();
        }
    };

    let message = MailMessage::for_contact(&state.mail, &contact);
    match state.transport.send(&message).await {
        Ok(()) => {
            info!(reply_to = %contact.email, "contact mail sent");
            (StatusCode::OK, Json(Reply::sent())).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to send contact mail");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Reply::error(SEND_FAILED))).into_response()
        }
    }
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, Json(Reply::error(METHOD_NOT_ALLOWED))).into_response()
}

/// The CORS layer answers OPTIONS itself with an empty 200. Turn that into 204.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
