use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Form, Router,
        extract::{State, rejection::FormRejection},
        http::StatusCode,
        routing::{get, post},
    },
    receptionist_auto_reply::error::FALLBACK_REPLY,
    receptionist_config::ReceptionistConfig,
    receptionist_whatsapp::TwilioWebhookForm,
    tower_http::trace::TraceLayer,
    tracing::{error, info, warn},
};

use crate::state::GatewayState;

pub const NO_MESSAGE_RESPONSE: &str = "No message received";
pub const SENT_RESPONSE: &str = "Message sent";
pub const SEND_FAILED_RESPONSE: &str = "Failed to send message";

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/whatsapp", post(whatsapp_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the webhook server and run until Ctrl-C (or SIGTERM on unix).
pub async fn start_gateway(
    config: &ReceptionistConfig,
    bind: Option<&str>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let bind = bind.unwrap_or(&config.server.bind);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;

    let state = GatewayState::from_config(config)?;
    let app = build_gateway_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        version = env!("CARGO_PKG_VERSION"),
        "gateway listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> &'static str {
    "ok"
}

async fn whatsapp_handler(
    State(state): State<Arc<GatewayState>>,
    form: Result<Form<TwilioWebhookForm>, FormRejection>,
) -> (StatusCode, &'static str) {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            warn!(error = %e, "unreadable webhook payload");
            return (StatusCode::BAD_REQUEST, NO_MESSAGE_RESPONSE);
        },
    };
    let Some(msg) = form.into_inbound() else {
        warn!("webhook without a message body");
        return (StatusCode::BAD_REQUEST, NO_MESSAGE_RESPONSE);
    };

    let reply = state.orchestrator.get_reply(&msg).await;
    let Err(e) = state.outbound.send_text(&msg.sender, &reply).await else {
        info!(sender = %msg.sender, channel = state.outbound.id(), "reply delivered");
        return (StatusCode::OK, SENT_RESPONSE);
    };
    warn!(sender = %msg.sender, error = %e, "reply delivery failed, sending apology");

    match state.outbound.send_text(&msg.sender, FALLBACK_REPLY).await {
        Ok(()) => (StatusCode::OK, SENT_RESPONSE),
        Err(e) => {
            error!(sender = %msg.sender, error = %e, "apology delivery failed");
            (StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED_RESPONSE)
        },
    }
}
