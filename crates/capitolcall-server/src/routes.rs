//! HTTP routes: the voice webhook tree and the health endpoint.

use axum::{
    http::{header, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Json, Response},
    routing::{get, post, MethodRouter},
    Extension, Router,
};
use capitolcall_flow::session::{CallSession, RequestParams};
use capitolcall_flow::{menu::Route, store, StoreError};
use capitolcall_twiml::Twiml;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::middleware::{webhook_middleware, WebhookParams};
use crate::AppState;

/// Every step the voice tree serves, in the order the paths are mounted.
const VOICE_ROUTES: [Route; 20] = [
    Route::Index,
    Route::Members,
    Route::Member,
    Route::MemberBio,
    Route::MemberDonors,
    Route::MemberVotes,
    Route::MemberCommittees,
    Route::CallMember,
    Route::Bills,
    Route::UpcomingBills,
    Route::SearchBills,
    Route::SelectBill,
    Route::Bill,
    Route::BillSubscribe,
    Route::Voting,
    Route::CallElectionOffice,
    Route::About,
    Route::AboutSunlight,
    Route::Signup,
    Route::Feedback,
];

/// Builds the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let voice = VOICE_ROUTES
        .iter()
        .fold(Router::new(), |router, &route| {
            router.route(route.path(), voice_route(route))
        })
        .layer(from_fn(webhook_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(voice)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The provider posts webhooks but follows `Redirect` verbs with GET, so
/// every step answers both methods.
fn voice_route(route: Route) -> MethodRouter {
    let handler = move |Extension(state): Extension<Arc<AppState>>,
                        Extension(WebhookParams(params)): Extension<WebhookParams>| async move {
        drive(state, params, route).await
    };
    post(handler.clone()).get(handler)
}

/// Runs one conversation step: load the call document, hand it to the
/// engine, and persist the document only when the step succeeded.
///
/// Infrastructure failures at any point answer HTTP 500. The provider
/// treats that as a failed webhook and retries from the last saved state;
/// answering with our own markup instead would loop the call on whatever
/// URL that markup redirects to.
async fn drive(state: Arc<AppState>, mut params: RequestParams, route: Route) -> Response {
    let pool = state.pool.clone();
    let load_params = params.clone();
    let loaded = tokio::task::spawn_blocking(move || store::load_or_create(&pool, &load_params))
        .await
        .map_err(|err| StoreError::Task(err.to_string()));

    let call = match loaded {
        Ok(Ok(call)) => call,
        Ok(Err(err)) | Err(err) => {
            tracing::error!(error = %err, path = route.path(), "failed to load call document");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut session = CallSession::new(call);
    let doc = match state.engine.handle(route, &mut session, &mut params).await {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(error = %err, path = route.path(), "call flow step failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let pool = state.pool.clone();
    let call = session.into_call();
    let saved = tokio::task::spawn_blocking(move || store::save(&pool, &call))
        .await
        .map_err(|err| StoreError::Task(err.to_string()));
    match saved {
        Ok(Ok(())) => xml_response(&doc),
        Ok(Err(err)) | Err(err) => {
            tracing::error!(error = %err, path = route.path(), "failed to save call document");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn xml_response(doc: &Twiml) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], doc.render()).into_response()
}
