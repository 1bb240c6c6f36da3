use std::time::Duration;

use medchat::api::{
    ApiError, DiagnosisBackend, FinalizeEvent, HttpBackend, ImageUpload, Role, SessionStatus,
    Urgency,
};
use medchat::core::effects::{RetryPolicy, create_session_with_retry};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header_exists, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), Duration::from_secs(5))
}

fn assessment_json() -> serde_json::Value {
    json!({
        "patient_summary": "34-year-old with sore throat",
        "differentials": [{
            "name": "Streptococcal pharyngitis",
            "likelihood": 62,
            "reasoning": "Fever and exudate",
            "urgency": "urgent",
            "recommended_tests": ["Rapid antigen test"]
        }, {
            "name": "Mononucleosis",
            "likelihood": 10,
            "reasoning": "Fatigue",
            "urgency": "eventually"
        }],
        "red_flags": [{
            "severity": "warning",
            "message": "Drooling",
            "why_it_matters": "Possible airway compromise"
        }],
        "action_plan": [{"priority": "immediate", "action": "See a clinician today"}],
        "soap": {"subjective": "Sore throat", "objective": "", "assessment": "", "plan": ""},
        "missing_questions": ["Any rash?"]
    })
}

/// Collects all finalize events until the sender side closes.
async fn collect_events(mut receiver: mpsc::Receiver<FinalizeEvent>) -> Vec<FinalizeEvent> {
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    events
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_create_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sess-123"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let id = backend(&mock_server).create_session().await.unwrap();
    assert_eq!(id, "sess-123");
}

#[tokio::test]
async fn test_create_session_retries_then_gives_up() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "warming up"})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let policy = RetryPolicy {
        attempts: 3,
        base_delay: Duration::from_millis(1),
    };
    let result = create_session_with_retry(&backend(&mock_server), &policy).await;
    assert_eq!(
        result,
        Err(ApiError::Status {
            status: 503,
            message: "warming up".into()
        })
    );
}

#[tokio::test]
async fn test_create_session_recovers_on_second_attempt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s2"})))
        .mount(&mock_server)
        .await;

    let policy = RetryPolicy {
        attempts: 3,
        base_delay: Duration::from_millis(1),
    };
    let id = create_session_with_retry(&backend(&mock_server), &policy)
        .await
        .unwrap();
    assert_eq!(id, "s2");
}

#[tokio::test]
async fn test_get_session_snapshot() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "messages": [
                {"id": 1, "role": "user", "content": "hi", "timestamp": "2025-03-04T14:05:09Z"},
                {"id": "2", "role": "assistant", "content": "Hello", "images": null,
                 "timestamp": "2025-03-04T14:05:12Z"},
                {"id": 3, "role": "system", "content": "Image analyzed", "images": ["/u/a.png"],
                 "timestamp": "2025-03-04T14:06:00Z"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let snapshot = backend(&mock_server).get_session("s1").await.unwrap();
    assert_eq!(snapshot.status, Some(SessionStatus::Completed));
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[0].id, "1");
    assert_eq!(snapshot.messages[1].role, Role::Assistant);
    assert!(snapshot.messages[1].images.is_empty());
    assert_eq!(snapshot.messages[2].role, Role::System);
    assert_eq!(snapshot.messages[2].images, vec!["/u/a.png".to_string()]);
}

// ============================================================================
// Messages and images
// ============================================================================

#[tokio::test]
async fn test_send_message_integer_id_and_final_marker() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s1/messages"))
        .and(body_json(json!({"content": "I have a sore throat"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "content": "How long has it hurt?",
            "timestamp": "2025-03-04T14:05:09Z",
            "message_metadata": {"final_diagnosis": true}
        })))
        .mount(&mock_server)
        .await;

    let reply = backend(&mock_server)
        .send_message("s1", "I have a sore throat")
        .await
        .unwrap();
    assert_eq!(reply.id, "42");
    assert_eq!(reply.content, "How long has it hurt?");
    assert!(reply.signals_final_diagnosis());
}

#[tokio::test]
async fn test_naive_timestamps_are_accepted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "content": "How long?",
            "images": [],
            "timestamp": "2024-02-04T10:15:00.123456",
            "message_metadata": {}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "active",
            "messages": [
                {"id": 4, "role": "user", "content": "My knee hurts", "images": [],
                 "timestamp": "2024-02-04T10:14:58.000001"},
                {"id": 5, "role": "assistant", "content": "How long?", "images": [],
                 "timestamp": "2024-02-04T10:15:00.123456"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let backend = backend(&mock_server);
    let reply = backend.send_message("s1", "My knee hurts").await.unwrap();
    assert_eq!(reply.id, "5");
    assert_eq!(
        reply.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2024-02-04 10:15:00"
    );

    let snapshot = backend.get_session("s1").await.unwrap();
    assert_eq!(snapshot.status, Some(SessionStatus::Active));
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[1].timestamp, reply.timestamp);
}

#[tokio::test]
async fn test_send_message_fastapi_error_detail() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/gone/messages"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Session not found"})),
        )
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server)
        .send_message("gone", "hello")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "Session not found".into()
        }
    );
    assert!(err.user_message().contains("Session not found"));
}

#[tokio::test]
async fn test_send_message_validation_error_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s1/messages"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "content"], "msg": "field required"}]
        })))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).send_message("s1", "").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 422,
            message: "field required".into()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).send_message("s1", "hi").await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500));
    let err = backend.create_session().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn test_slow_response_hits_request_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"messages": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(&mock_server.uri(), Duration::from_millis(200));
    let err = backend.get_session("s1").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn test_session_id_is_escaped_in_path() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/a%20b%2Fc/diagnosis"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"assessment": assessment_json()})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let assessment = backend(&mock_server).get_diagnosis("a b/c").await.unwrap();
    assert_eq!(assessment.differentials.len(), 2);
}

#[tokio::test]
async fn test_upload_image_multipart() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/s1/images"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "/uploads/s1/rash.png",
            "filename": "rash.png",
            "size": 4,
            "content_type": "image/png"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let image = ImageUpload::new("rash.png".into(), vec![0x89, b'P', b'N', b'G']);
    let uploaded = backend(&mock_server).upload_image("s1", image).await.unwrap();
    assert_eq!(uploaded.url, "/uploads/s1/rash.png");
    assert_eq!(uploaded.size, Some(4));

    let requests = mock_server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"rash.png\""));
    assert!(body.contains("image/png"));
}

// ============================================================================
// Diagnosis
// ============================================================================

#[tokio::test]
async fn test_get_diagnosis_keeps_unknown_urgency() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1/diagnosis"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"assessment": assessment_json()})),
        )
        .mount(&mock_server)
        .await;

    let assessment = backend(&mock_server).get_diagnosis("s1").await.unwrap();
    assert_eq!(assessment.differentials.len(), 2);
    assert_eq!(assessment.differentials[0].urgency, Urgency::Urgent);
    assert_eq!(
        assessment.differentials[1].urgency,
        Urgency::Unknown("eventually".into())
    );
    assert_eq!(assessment.red_flags[0].rationale, "Possible airway compromise");
    assert_eq!(assessment.missing_questions, vec!["Any rash?".to_string()]);
    assert!(assessment.limitations.is_none());
}

#[tokio::test]
async fn test_analyze_case() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .and(body_json(json!({"case_text": "Sore throat for three days"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"assessment": assessment_json()})),
        )
        .mount(&mock_server)
        .await;

    let assessment = backend(&mock_server)
        .analyze_case("Sore throat for three days")
        .await
        .unwrap();
    assert_eq!(assessment.patient_summary, "34-year-old with sore throat");
}

#[tokio::test]
async fn test_health() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    assert!(backend(&mock_server).health().await.unwrap());
}

// ============================================================================
// Finalize stream
// ============================================================================

#[tokio::test]
async fn test_finalize_progress_then_complete() {
    let mock_server = MockServer::start().await;
    let sse_response = format!(
        "event: progress\n\
data: {{\"message\":\"Step 1\"}}\n\
\n\
event: progress\n\
data: {{\"message\":\"Step 2\"}}\n\
\n\
event: complete\n\
data: {}\n\
\n",
        json!({"assessment": assessment_json()})
    );
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1/finalize"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_response),
        )
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(32);
    let result = backend(&mock_server).stream_finalize("s1", tx).await;
    assert!(result.is_ok());

    let events = collect_events(rx).await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], FinalizeEvent::Progress("Step 1".into()));
    assert_eq!(events[1], FinalizeEvent::Progress("Step 2".into()));
    match &events[2] {
        FinalizeEvent::Complete(assessment) => {
            assert_eq!(assessment.differentials[0].name, "Streptococcal pharyngitis");
        }
        other => panic!("expected complete, got {other:?}"),
    }
}

#[tokio::test]
async fn test_finalize_error_event() {
    let mock_server = MockServer::start().await;
    let sse_response = "\
event: progress
data: {\"message\":\"Reviewing history\"}

event: error
data: {\"message\":\"Model unavailable\"}

event: progress
data: {\"message\":\"never delivered\"}

";
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1/finalize"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(32);
    backend(&mock_server).stream_finalize("s1", tx).await.unwrap();

    let events = collect_events(rx).await;
    assert_eq!(
        events,
        vec![
            FinalizeEvent::Progress("Reviewing history".into()),
            FinalizeEvent::Error("Model unavailable".into()),
        ]
    );
}

#[tokio::test]
async fn test_finalize_plain_text_error_event() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1/finalize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("event: error\ndata: boom\n\n"))
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(32);
    backend(&mock_server).stream_finalize("s1", tx).await.unwrap();
    assert_eq!(collect_events(rx).await, vec![FinalizeEvent::Error("boom".into())]);
}

#[tokio::test]
async fn test_finalize_stream_ends_without_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1/finalize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("event: progress\ndata: {\"message\":\"Step 1\"}\n\n"),
        )
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(32);
    let result = backend(&mock_server).stream_finalize("s1", tx).await;
    assert!(matches!(result, Err(ApiError::Stream(_))));
    assert_eq!(
        collect_events(rx).await,
        vec![FinalizeEvent::Progress("Step 1".into())]
    );
}

#[tokio::test]
async fn test_finalize_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/s1/finalize"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"detail": "Not enough information"})))
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(32);
    let err = backend(&mock_server).stream_finalize("s1", tx).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 409,
            message: "Not enough information".into()
        }
    );
    assert!(collect_events(rx).await.is_empty());
}
