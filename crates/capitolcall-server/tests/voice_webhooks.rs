//! End-to-end webhook tests driving the router with in-memory state.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use capitolcall_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use capitolcall_flow::{Directory, DirectoryError, Engine};
use capitolcall_server::{signature, AppState, SqliteMailbox};
use capitolcall_twiml::SpeechRenderer;
use capitolcall_types::{
    Bill, Contributor, ElectionOffice, Language, Legislator, UpcomingBill, Vote,
};
use std::sync::Arc;
use tower::ServiceExt;

const AUTH_TOKEN: &str = "0123456789abcdef0123456789abcdef";
const PUBLIC_URL: &str = "https://calls.example.org";

#[derive(Default)]
struct StubDirectory {
    fail: bool,
}

impl StubDirectory {
    fn check(&self) -> Result<(), DirectoryError> {
        if self.fail {
            Err(DirectoryError::Upstream("stub failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Directory for StubDirectory {
    async fn legislators_for_zip(&self, _zip: &str) -> Result<Vec<Legislator>, DirectoryError> {
        self.check()?;
        Ok(vec![Legislator {
            bioguide_id: "B000944".to_string(),
            crp_id: None,
            title: "Senator".to_string(),
            short_title: Some("Sen".to_string()),
            first_name: "Sherrod".to_string(),
            last_name: "Brown".to_string(),
            full_name: "Senator Sherrod Brown".to_string(),
            phone: Some("202-555-0100".to_string()),
            party: Some("D".to_string()),
            state: Some("OH".to_string()),
            district: None,
        }])
    }

    async fn legislator_by_bioguide(
        &self,
        _bioguide_id: &str,
    ) -> Result<Option<Legislator>, DirectoryError> {
        self.check()?;
        Ok(None)
    }

    async fn legislator_bio(
        &self,
        _legislator: &Legislator,
    ) -> Result<Option<String>, DirectoryError> {
        self.check()?;
        Ok(None)
    }

    async fn top_contributors(
        &self,
        _legislator: &Legislator,
    ) -> Result<Vec<Contributor>, DirectoryError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn recent_votes(&self, _bioguide_id: &str) -> Result<Vec<Vote>, DirectoryError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn committees(&self, _legislator: &Legislator) -> Result<Vec<String>, DirectoryError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn upcoming_bills(&self) -> Result<Vec<UpcomingBill>, DirectoryError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn bill_search(&self, _number: u32) -> Result<Vec<Bill>, DirectoryError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn bill_by_id(&self, _bill_id: &str) -> Result<Option<Bill>, DirectoryError> {
        self.check()?;
        Ok(None)
    }

    async fn subscribe_to_bill_updates(
        &self,
        _phone: &str,
        _bill_id: &str,
    ) -> Result<bool, DirectoryError> {
        self.check()?;
        Ok(false)
    }

    async fn election_offices_for_zip(
        &self,
        _zip: &str,
    ) -> Result<Vec<ElectionOffice>, DirectoryError> {
        self.check()?;
        Ok(Vec::new())
    }
}

fn test_pool() -> DbPool {
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            pool_max_size: 1,
            ..Default::default()
        },
    )
    .unwrap();
    run_migrations(&pool.get().unwrap()).unwrap();
    pool
}

fn state_with(
    pool: DbPool,
    directory: StubDirectory,
    validate_signatures: bool,
) -> Arc<AppState> {
    let languages = vec![
        Language {
            code: "en".to_string(),
            label: "English".to_string(),
            prompt: "Press {digit} to continue in English.".to_string(),
        },
        Language {
            code: "es".to_string(),
            label: "Spanish".to_string(),
            prompt: "Presione {digit} para continuar en espanol.".to_string(),
        },
    ];
    let engine = Engine::new(
        Arc::new(directory),
        Arc::new(SqliteMailbox::new(pool.clone())),
        SpeechRenderer::new("en", None),
        languages,
        6,
    );
    Arc::new(AppState {
        pool,
        engine,
        public_url: PUBLIC_URL.to_string(),
        auth_token: AUTH_TOKEN.to_string(),
        validate_signatures,
    })
}

fn test_state(validate_signatures: bool) -> Arc<AppState> {
    state_with(test_pool(), StubDirectory::default(), validate_signatures)
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    let mut body = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        body.append_pair(key, value);
    }
    body.finish()
}

fn webhook(path: &str, pairs: &[(&str, &str)], sig: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(sig) = sig {
        builder = builder.header("X-Twilio-Signature", sig);
    }
    builder.body(Body::from(form_body(pairs))).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = capitolcall_server::app(test_state(false));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn missing_call_sid_is_not_found() {
    let app = capitolcall_server::app(test_state(false));
    let response = app
        .oneshot(webhook("/voice/", &[("Digits", "1")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_signature_is_unauthorized() {
    let app = capitolcall_server::app(test_state(true));
    let response = app
        .oneshot(webhook(
            "/voice/",
            &[("CallSid", "CA1"), ("From", "+12025551234")],
            Some("bm90IGEgcmVhbCBzaWduYXR1cmU="),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_signature_is_unauthorized() {
    let app = capitolcall_server::app(test_state(true));
    let response = app
        .oneshot(webhook("/voice/", &[("CallSid", "CA1")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_signature_is_accepted() {
    let app = capitolcall_server::app(test_state(true));
    let pairs = [
        ("CallSid", "CA1"),
        ("CallStatus", "in-progress"),
        ("From", "+12025551234"),
        ("To", "+18005559876"),
    ];
    let form_params: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let sig = signature::compute(AUTH_TOKEN, &format!("{PUBLIC_URL}/voice/"), &form_params);

    let response = app
        .oneshot(webhook("/voice/", &pairs, Some(&sig)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<Response>"));
}

#[tokio::test]
async fn first_request_offers_languages() {
    let app = capitolcall_server::app(test_state(false));
    let response = app
        .oneshot(webhook(
            "/voice/",
            &[("CallSid", "CA2"), ("From", "+12025551234")],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/xml")
    );
    let body = body_text(response).await;
    assert!(body.contains("<Gather"));
    assert!(body.contains("continue in English"));
    assert!(body.contains("espanol"));
}

#[tokio::test]
async fn chosen_language_persists_across_requests() {
    let state = test_state(false);

    // First request answers the language prompt with an explicit
    // parameter, which the engine stores in the call document.
    let response = capitolcall_server::app(state.clone())
        .oneshot(webhook(
            "/voice/",
            &[
                ("CallSid", "CA3"),
                ("From", "+12025551234"),
                ("language", "en"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("To find your members of Congress, press 1."));

    // Second request carries no language; the stored choice lets the
    // digit fall through to the main menu, which routes to the zip-code
    // prompt.
    let response = capitolcall_server::app(state)
        .oneshot(webhook(
            "/voice/",
            &[
                ("CallSid", "CA3"),
                ("From", "+12025551234"),
                ("Digits", "1"),
            ],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("/voice/members"));
    assert!(!body.contains("continue in English"));
}

#[tokio::test]
async fn query_parameters_reach_the_engine() {
    // A bill step without a bill id is sent to the search prompt.
    let app = capitolcall_server::app(test_state(false));
    let response = app
        .oneshot(webhook(
            "/voice/bill?language=en",
            &[("CallSid", "CA4"), ("From", "+12025551234")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("/voice/bills/search"));
}

#[tokio::test]
async fn store_failure_answers_server_error() {
    // An unmigrated pool has no calls table, so loading the call document
    // fails. The response must be a 500, never markup that redirects the
    // call back into the webhook tree.
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            pool_max_size: 1,
            ..Default::default()
        },
    )
    .unwrap();
    let app = capitolcall_server::app(state_with(pool, StubDirectory::default(), false));

    let response = app
        .oneshot(webhook(
            "/voice/",
            &[("CallSid", "CA6"), ("From", "+12025551234")],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(!body.contains("<Redirect>"));
}

#[tokio::test]
async fn directory_failure_answers_server_error() {
    let app = capitolcall_server::app(state_with(
        test_pool(),
        StubDirectory { fail: true },
        false,
    ));

    let response = app
        .oneshot(webhook(
            "/voice/bills/upcoming?language=en",
            &[("CallSid", "CA7"), ("From", "+12025551234")],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_voice_path_is_not_found() {
    let app = capitolcall_server::app(test_state(false));
    let response = app
        .oneshot(webhook("/voice/nope", &[("CallSid", "CA5")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
