// src/server.rs

//! Webhook server.
//!
//! `GET /webhook` runs the pipeline once; everything else is served from the
//! card output directory.

use std::path::Path;
use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::{Serialize, Serializer};
use tower_http::services::ServeDir;

use crate::error::Result;
use crate::pipeline::{NotificationPipeline, PipelineOutcome};

/// Response body of `GET /webhook`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum WebhookResponse {
    Rendered {
        status: &'static str,
        image: String,
        #[serde(serialize_with = "compact_number")]
        magnitude: f64,
        location: String,
        #[serde(serialize_with = "compact_number")]
        depth: f64,
        date: String,
    },
    Duplicate {
        status: &'static str,
        message: &'static str,
    },
    Failed {
        error: &'static str,
    },
}

impl From<PipelineOutcome> for WebhookResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Rendered { notification, .. } => Self::Rendered {
                status: "ok",
                image: notification.image,
                magnitude: notification.magnitude,
                location: notification.location,
                depth: notification.depth,
                date: notification.date,
            },
            PipelineOutcome::Duplicate { .. } => Self::Duplicate {
                status: "ok",
                message: "No new sismo detected",
            },
        }
    }
}

/// Whole values go out as integers (`5`, not `5.0`).
fn compact_number<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Build the router around a shared pipeline.
pub fn router(pipeline: Arc<NotificationPipeline>, public_dir: &Path) -> Router {
    Router::new()
        .route("/webhook", get(webhook))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(pipeline)
}

/// Bind and serve until the process is stopped.
pub async fn serve(pipeline: Arc<NotificationPipeline>, public_dir: &Path, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("Webhook server running on http://{}", listener.local_addr()?);
    axum::serve(listener, router(pipeline, public_dir)).await?;
    Ok(())
}

async fn webhook(State(pipeline): State<Arc<NotificationPipeline>>) -> impl IntoResponse {
    match pipeline.run().await {
        Ok(outcome) => (StatusCode::OK, Json(WebhookResponse::from(outcome))),
        Err(e) => {
            log::error!("Webhook run failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse::Failed {
                    error: "Failed to create image",
                }),
            )
        }
    }
}
