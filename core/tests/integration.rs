//! End-to-end tests against the replay server.
//!
//! # Design
//! Starts `mock-server` on a random port with the recorded log in
//! `test-vectors/replay_log.json`, then drives a real `Session` over HTTP
//! through `ReqwestTransport`. Covers registration, login, the feature calls,
//! upstream failures, timeouts, and replaying a log collected by the observer.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use mock_server::{RecordedCall, ReplayLog};
use portal_core::normalize::material::MaterialItem;
use portal_core::{api, CallRecord, DeviceInfo, PortalConfig, PortalError, Session, SessionState};

fn recorded_log() -> ReplayLog {
    ReplayLog::from_json(include_str!("../../test-vectors/replay_log.json")).unwrap()
}

async fn spawn_server(log: ReplayLog) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener, log));
    format!("http://{addr}/")
}

async fn logged_in(base_url: &str, timeout_ms: u64) -> Session {
    let mut config = PortalConfig::with_base_url(base_url);
    config.timeout_ms = timeout_ms;
    let mut session = Session::new("ea27a150-39d5-4f6a-ae1e-51f38bfe0039", &config).unwrap();

    session.register(&config.device).await.unwrap();
    assert_eq!(session.state(), SessionState::Registered);

    let person = session.login_with_credentials("s123456", "secret").await.unwrap();
    assert_eq!(person.current_id, "123456");
    assert_eq!(person.degree_name, "INGEGNERIA INFORMATICA");
    assert_eq!(session.state(), SessionState::Authenticated);
    session
}

#[tokio::test]
async fn student_session_lifecycle() {
    let base_url = spawn_server(recorded_log()).await;
    let mut session = logged_in(&base_url, 3000).await;

    // Marks and plan come from two endpoints.
    let info = api::get_courses_info(&session).await.unwrap();
    assert_eq!(info.marks.permanent[0].date, 1_640_041_200_000);
    assert_eq!(info.marks.provisional[0].date, 1_641_337_200_000);
    assert_eq!(info.course_plan.standard.len(), 2);
    assert!(info.course_plan.standard[1].is_dummy());
    assert!(info.course_plan.extra.is_empty());

    // Exam sessions are sorted by date.
    let exams = api::get_exam_sessions(&session).await.unwrap();
    let ids: Vec<&str> = exams.iter().map(|e| e.exam_id.as_str()).collect();
    assert_eq!(ids, vec!["02CHIPL", "01RKCPL"]);
    assert_eq!(exams[0].date, 1_641_369_600_000);
    assert!(exams[0].user_is_signed_up);
    assert_eq!(exams[0].signup_error.as_deref(), Some("Insegnamento non in carico"));
    assert!(!exams[1].user_is_signed_up);
    assert_eq!(exams[1].signup_error, None);

    // Course details and a file download.
    let details = api::get_course_details(&session, &info.course_plan.standard[0]).await.unwrap();
    assert_eq!((details.degree_year, details.year_period), (1, 2));
    assert_eq!(details.professor_surname, "Rossi");
    assert_eq!(details.notices[0].expires_at, None);
    let MaterialItem::Directory(folder) = &details.material[0] else {
        panic!("expected a folder");
    };
    let file_code = folder.children[0].code().to_string();
    let url = api::get_download_url(&session, &file_code).await.unwrap();
    assert!(url.ends_with("slides.pdf"));

    let timetable = api::get_timetable(&session, NaiveDate::from_ymd_opt(2022, 1, 5).unwrap())
        .await
        .unwrap();
    assert_eq!(timetable[0].start, 1_641_369_600_000);
    assert_eq!(timetable[0].room, "R1b");

    let bookings = api::get_bookings(&session).await.unwrap();
    assert_eq!(bookings[0].course_id.as_deref(), Some("01RKCPL"));

    let mail = api::get_unread_mail(&session).await.unwrap();
    assert_eq!((mail.total, mail.unread), (120, 3));

    session.logout().await.unwrap();
    assert_eq!(session.state(), SessionState::Registered);
    assert!(matches!(
        api::get_unread_mail(&session).await,
        Err(PortalError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn negative_outcome_surfaces_as_upstream_error() {
    let base_url = spawn_server(recorded_log()).await;
    let session = logged_in(&base_url, 3000).await;

    let err = api::get_tickets(&session).await.unwrap_err();
    let PortalError::Upstream { endpoint, source } = &err else {
        panic!("expected an upstream error, got {err:?}");
    };
    assert_eq!(endpoint, "ticket.php");
    assert_eq!(source.context, "ticket");
    assert_eq!(source.code, -7);
    assert_eq!(source.message, "Servizio non disponibile");
}

#[tokio::test]
async fn unrecorded_request_is_reported_by_replay_server() {
    let base_url = spawn_server(recorded_log()).await;
    let session = logged_in(&base_url, 3000).await;

    let err = api::get_notifications(&session).await.unwrap_err();
    assert_eq!(err.upstream_code(), Some(-1));
    assert!(err.to_string().contains("testing-server"), "{err}");
}

#[tokio::test]
async fn rejected_credentials_keep_session_unauthenticated() {
    let base_url = spawn_server(recorded_log()).await;
    let mut session = Session::new("dev", &PortalConfig::with_base_url(&base_url)).unwrap();

    let err = session.login_with_credentials("s123456", "wrong").await.unwrap_err();
    assert_eq!(err.upstream_code(), Some(-1));
    assert_eq!(session.state(), SessionState::Unregistered);
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let base_url = spawn_server(recorded_log()).await;
    let session = logged_in(&base_url, 200).await;

    let err = api::ping(&session).await.unwrap_err();
    assert!(err.is_timeout(), "{err:?}");

    // The session stays usable.
    assert_eq!(api::get_unread_mail(&session).await.unwrap().unread, 3);
}

#[tokio::test]
async fn observed_calls_replay() {
    let base_url = spawn_server(recorded_log()).await;
    let records = Arc::new(Mutex::new(Vec::<CallRecord>::new()));
    let sink = records.clone();
    let session = logged_in(&base_url, 3000)
        .await
        .with_observer(move |record| sink.lock().unwrap().push(record.clone()));

    let exams = api::get_exam_sessions(&session).await.unwrap();
    let mail = api::get_unread_mail(&session).await.unwrap();

    // Build a fresh log from what the observer saw, plus the login exchange.
    let mut calls: Vec<RecordedCall> = recorded_log()
        .calls
        .into_iter()
        .filter(|c| c.endpoint == "login.php")
        .collect();
    for record in records.lock().unwrap().iter() {
        calls.push(RecordedCall {
            endpoint: record.endpoint.clone(),
            request: record.request.clone(),
            response: record.response.clone().unwrap(),
            delay_ms: 0,
        });
    }
    assert_eq!(calls.len(), 3);

    let replay_url = spawn_server(ReplayLog::new(calls)).await;
    let replayed = logged_in(&replay_url, 3000).await;
    assert_eq!(api::get_exam_sessions(&replayed).await.unwrap(), exams);
    assert_eq!(api::get_unread_mail(&replayed).await.unwrap(), mail);
}

fn login_entry() -> RecordedCall {
    recorded_log()
        .calls
        .into_iter()
        .find(|c| c.endpoint == "login.php")
        .unwrap()
}

#[tokio::test]
async fn replay_keeps_upstream_context_order() {
    // Contexts deliberately out of alphabetical order.
    let log = ReplayLog::from_json(
        r#"[{"endpoint":"ping.php","request":{},
             "response":{"data":null,"esito":{"zeta":{"stato":-7,"error":"first"},"alpha":{"stato":-1,"error":"second"}}}}]"#,
    )
    .unwrap();
    let mut calls = vec![login_entry()];
    calls.extend(log.calls);

    let base_url = spawn_server(ReplayLog::new(calls.clone())).await;
    let records = Arc::new(Mutex::new(Vec::<CallRecord>::new()));
    let sink = records.clone();
    let session = logged_in(&base_url, 3000)
        .await
        .with_observer(move |record| sink.lock().unwrap().push(record.clone()));

    let err = api::ping(&session).await.unwrap_err();
    assert_eq!(err.upstream_code(), Some(-7));

    let response = records.lock().unwrap()[0].response.clone().unwrap();
    let contexts: Vec<&str> = response["esito"].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(contexts, vec!["zeta", "alpha"]);

    // Replaying what the observer saw classifies the same way.
    calls[1].response = response;
    let replay_url = spawn_server(ReplayLog::new(calls)).await;
    let replayed = logged_in(&replay_url, 3000).await;
    assert_eq!(api::ping(&replayed).await.unwrap_err().upstream_code(), Some(-7));
}

#[tokio::test]
async fn malformed_provisional_marks_name_their_endpoint() {
    let mut calls = vec![login_entry()];
    calls.extend(recorded_log().calls.into_iter().filter(|c| c.endpoint == "studente.php"));
    calls.push(RecordedCall {
        endpoint: "valutazioni.php".into(),
        request: serde_json::json!({}),
        response: serde_json::json!({
            "data": {"valutazioni_provvisorie": [
                {"NOME_INS": "Chimica", "DATA_ESAME": "05-01-2022", "STATO": "Z"}
            ]},
            "esito": {"generale": {"stato": 0}}
        }),
        delay_ms: 0,
    });

    let base_url = spawn_server(ReplayLog::new(calls)).await;
    let session = logged_in(&base_url, 3000).await;

    let err = api::get_courses_info(&session).await.unwrap_err();
    let PortalError::Parse { endpoint, source } = &err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!(endpoint, "valutazioni.php");
    assert_eq!(source.what, "marks");
}

#[test]
fn default_device_metadata() {
    let device = DeviceInfo::default();
    assert_eq!(device.platform, "Open Polito");
    assert_eq!(device.manufacturer, "Apple");
}
