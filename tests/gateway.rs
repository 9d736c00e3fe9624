//! HTTP behavior of `MoodleGateway` against a wiremock server.

use std::time::Duration;

use rustimoodle::gateway::{Gateway, GradeUpdate, MoodleGateway};
use rustimoodle::ClientError;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REST: &str = "/webservice/rest/server.php";

fn gateway() -> MoodleGateway {
    MoodleGateway::new(Duration::from_secs(5)).expect("failed to build gateway")
}

#[tokio::test]
async fn token_exchange_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/token.php"))
        .and(body_string_contains("username=teacher"))
        .and(body_string_contains("service=moodle_mobile_app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .mount(&server)
        .await;

    let token = gateway()
        .authenticate(&server.uri(), "teacher", "secret", "moodle_mobile_app")
        .await
        .unwrap();
    assert_eq!(token, "abc123");
}

#[tokio::test]
async fn token_exchange_invalid_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/token.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Invalid login, please try again",
            "errorcode": "invalidlogin"
        })))
        .mount(&server)
        .await;

    let err = gateway()
        .authenticate(&server.uri(), "teacher", "nope", "moodle_mobile_app")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Authentication(msg) if msg.contains("Invalid login")));
}

#[tokio::test]
async fn assignments_send_indexed_course_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REST))
        .and(body_string_contains("wsfunction=mod_assign_get_assignments"))
        .and(body_string_contains("courseids%5B0%5D=40"))
        .and(body_string_contains("wstoken=tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [{
                "id": 40,
                "fullname": "History",
                "assignments": [
                    {"id": 501, "name": "Essay", "cutoffdate": 1700000000, "duedate": 1699990000}
                ]
            }],
            "warnings": []
        })))
        .mount(&server)
        .await;

    let resp = gateway().assignments(&server.uri(), "tok", &[40]).await.unwrap();
    assert_eq!(resp.courses.len(), 1);
    assert_eq!(resp.courses[0].assignments[0].cutoffdate.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn service_exception_maps_to_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REST))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "exception": "moodle_exception",
            "errorcode": "invalidtoken",
            "message": "Invalid token - token not found"
        })))
        .mount(&server)
        .await;

    let err = gateway().site_info(&server.uri(), "bad").await.unwrap_err();
    match err {
        ClientError::Remote { code, message } => {
            assert_eq!(code, "invalidtoken");
            assert!(message.contains("token not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn save_grade_posts_zero_with_comment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REST))
        .and(body_string_contains("wsfunction=mod_assign_save_grade"))
        .and(body_string_contains("assignmentid=501"))
        .and(body_string_contains("userid=3"))
        .and(body_string_contains("grade=0"))
        .and(body_string_contains("applytoall=1"))
        .and(body_string_contains("No+submission"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    let update = GradeUpdate {
        assignment_id: 501,
        user_id: 3,
        grade: 0.0,
        comment: "No submission",
    };
    gateway()
        .save_grade(&server.uri(), "tok", &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn http_failure_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REST))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = gateway()
        .enrolled_users(&server.uri(), "tok", 40)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
