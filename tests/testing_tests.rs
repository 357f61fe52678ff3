mod common;

use common::{api_client, test_result_json};
use courseware_client::testing::{AnswerSubmission, ResultsQuery, TestSubmission, TestsStore};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn student_test_json() -> serde_json::Value {
    json!({
        "id": 21,
        "course_id": 1,
        "questions": [
            {"id": 1, "question": "2+2?", "options": ["3", "4"]},
            {"id": 2, "question": "3+3?", "options": ["6", "7"]}
        ]
    })
}

#[tokio::test]
async fn test_fetch_test_sets_current() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tests/21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(student_test_json()))
        .mount(&mock_server)
        .await;

    let (api, _) = api_client(&mock_server.uri(), true);
    let store = TestsStore::new(api);

    let test = store.fetch_test(21).await.unwrap();
    assert_eq!(test.questions.len(), 2);
    assert_eq!(store.current_test().map(|t| t.id), Some(21));
}

#[tokio::test]
async fn test_submit_keeps_current_test() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tests/21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(student_test_json()))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/tests/21/submit"))
        .and(body_json(json!({
            "answers": [
                {"question_id": 1, "selected_answer": "4"},
                {"question_id": 2, "selected_answer": "7"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "score": 1,
            "total": 2,
            "passed": false,
            "percentage": 50.0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (api, _) = api_client(&mock_server.uri(), true);
    let store = TestsStore::new(api);
    let test = store.fetch_test(21).await.unwrap();

    let submission = TestSubmission {
        answers: vec![
            AnswerSubmission {
                question_id: 1,
                selected_answer: "4".to_string(),
            },
            AnswerSubmission {
                question_id: 2,
                selected_answer: "7".to_string(),
            },
        ],
    };
    let response = store.submit_test(21, &submission).await.unwrap();

    assert_eq!(response.score, 1);
    assert_eq!(store.submit_response(), Some(response));
    assert_eq!(store.current_test(), Some(test));
}

#[tokio::test]
async fn test_fetch_results_sends_only_set_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("course_id", "3"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            test_result_json(1, 21, 8),
            test_result_json(2, 21, 4)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (api, _) = api_client(&mock_server.uri(), true);
    let store = TestsStore::new(api);

    let results = store
        .fetch_results(&ResultsQuery::new().course_id(3).limit(20))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(store.test_results(), results);

    let requests = mock_server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("skip"));
}

#[tokio::test]
async fn test_latest_result_is_first_in_server_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results/my/course/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            test_result_json(9, 21, 7),
            test_result_json(4, 21, 3)
        ])))
        .mount(&mock_server)
        .await;

    let (api, _) = api_client(&mock_server.uri(), true);
    let store = TestsStore::new(api);

    let results = store.fetch_my_results_by_course(3).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(store.current_result().map(|r| r.id), Some(9));
}

#[tokio::test]
async fn test_no_results_leaves_current_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results/my/course/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (api, _) = api_client(&mock_server.uri(), true);
    let store = TestsStore::new(api);

    assert!(store.fetch_my_results_by_course(3).await.unwrap().is_empty());
    assert_eq!(store.current_result(), None);
}

#[tokio::test]
async fn test_fetch_result_failure_is_recorded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Result not found"})))
        .mount(&mock_server)
        .await;

    let (api, _) = api_client(&mock_server.uri(), true);
    let store = TestsStore::new(api);

    assert!(store.fetch_result(5).await.is_err());
    assert_eq!(
        store.error().as_deref(),
        Some("Request failed with status 404: Result not found")
    );
    assert!(!store.is_loading());
}
