//! HTTP front end for gcprand.
//!
//! Serves the dot-seeded random string page (`GET /`, `POST /` with a
//! `length` form field) plus JSON status endpoints for the sample history.
//! Every page request scrapes a fresh reading; the measurement cycle blocks
//! on a browser session, so it runs on the blocking pool, serialized through
//! the sampler mutex.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use gcprand_core::{
    DEFAULT_LENGTH, DotSampler, MAX_LENGTH, MIN_LENGTH, MeasureError, Observation, generate,
};

/// Shared server state.
struct AppState {
    sampler: Mutex<DotSampler>,
}

#[derive(Deserialize, Default)]
struct LengthForm {
    length: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    samples: usize,
    color_entropy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last: Option<Observation>,
}

#[derive(Serialize)]
struct HistoryResponse {
    observations: Vec<Observation>,
    total: usize,
}

/// Decode the `length` form field.
///
/// A missing or blank field means the default. Anything that is not an
/// integer in `[MIN_LENGTH, MAX_LENGTH]` falls back to the default and
/// carries a user-facing message; the page still renders a string.
fn parse_length(raw: Option<&str>) -> (usize, Option<&'static str>) {
    const INVALID: &str = "Please enter a valid integer for the string length.";
    const RANGE: &str = "Length must be between 1 and 1000.";

    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (DEFAULT_LENGTH, None);
    };
    match raw.parse::<i64>() {
        Ok(n) if (MIN_LENGTH as i64..=MAX_LENGTH as i64).contains(&n) => (n as usize, None),
        Ok(_) => (DEFAULT_LENGTH, Some(RANGE)),
        Err(_) => (DEFAULT_LENGTH, Some(INVALID)),
    }
}

async fn handle_index(State(state): State<Arc<AppState>>) -> (StatusCode, Html<String>) {
    respond(state, DEFAULT_LENGTH, None).await
}

async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LengthForm>,
) -> (StatusCode, Html<String>) {
    let (length, error_message) = parse_length(form.length.as_deref());
    respond(state, length, error_message).await
}

/// Take one fresh measurement on the blocking pool and render the page.
///
/// Each request scrapes the chart anew; the history only feeds the status
/// endpoints and the entropy summary on the page.
async fn respond(
    state: Arc<AppState>,
    length: usize,
    error_message: Option<&'static str>,
) -> (StatusCode, Html<String>) {
    let outcome = tokio::task::spawn_blocking(move || {
        let mut sampler = state.sampler.blocking_lock();
        let seed = sampler.seed(true)?;
        let last = sampler.store().last().cloned().ok();
        let samples = sampler.store().len();
        let entropy = sampler.store().color_entropy();
        Ok::<_, MeasureError>((seed, last, samples, entropy))
    })
    .await;

    let (seed, last, samples, entropy) = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            return (
                StatusCode::BAD_GATEWAY,
                Html(render_error_page(&err.to_string())),
            );
        }
        Err(join_err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_error_page(&join_err.to_string())),
            );
        }
    };

    // length was validated by parse_length, so this cannot fail
    let random_string = generate(seed, length).unwrap_or_default();
    (
        StatusCode::OK,
        Html(render_page(
            &random_string,
            length,
            error_message,
            last.as_ref(),
            samples,
            entropy,
        )),
    )
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sampler = state.sampler.lock().await;
    let store = sampler.store();
    Json(HealthResponse {
        status: if store.is_empty() {
            "idle".to_string()
        } else {
            "sampling".to_string()
        },
        samples: store.len(),
        color_entropy: store.color_entropy(),
        last: store.last().cloned().ok(),
    })
}

async fn handle_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    let sampler = state.sampler.lock().await;
    let observations = sampler.store().observations().to_vec();
    let total = observations.len();
    Json(HistoryResponse {
        observations,
        total,
    })
}

fn render_page(
    random_string: &str,
    length: usize,
    error_message: Option<&str>,
    last: Option<&Observation>,
    samples: usize,
    entropy: f64,
) -> String {
    let error_html = error_message
        .map(|msg| format!(r#"<p class="error">{msg}</p>"#))
        .unwrap_or_default();
    let dot_html = match last {
        Some(obs) => format!(
            r#"<p class="dot"><span class="swatch" style="background:{}"></span>
            dot index {:.4} ({}) &middot; {samples} sample(s) in history &middot; color entropy {entropy:.3} bits</p>"#,
            obs.color_label.css(),
            obs.normalized_value,
            obs.color_label,
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>gcprand</title>
<style>
body {{ font-family: sans-serif; max-width: 52em; margin: 3em auto; color: #222; }}
.random-string {{ font-family: monospace; word-break: break-all; background: #f4f4f4;
  border: 1px solid #ddd; padding: 1em; }}
.error {{ color: #b71c1c; }}
.swatch {{ display: inline-block; width: 0.8em; height: 0.8em; border-radius: 50%; }}
.dot {{ color: #666; font-size: 0.9em; }}
</style>
</head>
<body>
<h1>gcprand</h1>
<p>A random string of {length} characters, seeded by the GCP Dot:</p>
{error_html}
<div class="random-string">{random_string}</div>
{dot_html}
<form method="post" action="/">
  <label for="length">Length (1&ndash;1000):</label>
  <input type="text" id="length" name="length" value="{length}">
  <button type="submit">Generate</button>
</form>
</body>
</html>
"#
    )
}

fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>gcprand - error</title></head>
<body>
<h1>Measurement failed</h1>
<p>The chart could not be read: {message}</p>
</body>
</html>
"#
    )
}

/// Build the axum router.
fn build_router(sampler: DotSampler) -> Router {
    let state = Arc::new(AppState {
        sampler: Mutex::new(sampler),
    });

    Router::new()
        .route("/", get(handle_index).post(handle_submit))
        .route("/health", get(handle_health))
        .route("/history", get(handle_history))
        .with_state(state)
}

/// Run the HTTP server until the process exits.
pub async fn run_server(sampler: DotSampler, host: &str, port: u16) {
    let app = build_router(sampler);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
