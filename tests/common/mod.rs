#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use courseware_client::config::ClientOptions;
use courseware_client::fetch::ApiClient;
use courseware_client::router::Navigator;
use courseware_client::session::{MemoryTokenStore, Session};
use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";

/// Navigator that only records where it was sent
#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits.lock().unwrap().push(path.to_string());
    }
}

/// API client against `uri`, optionally signed in with [`TOKEN`]
pub fn api_client(uri: &str, signed_in: bool) -> (ApiClient, Arc<RecordingNavigator>) {
    let store = if signed_in {
        MemoryTokenStore::with_token(TOKEN)
    } else {
        MemoryTokenStore::new()
    };
    let session = Session::new(Arc::new(store));
    let navigator = Arc::new(RecordingNavigator::default());
    let api = ApiClient::new(uri, session, navigator.clone(), &ClientOptions::default()).unwrap();
    (api, navigator)
}

pub fn user_json(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@example.com", id),
        "full_name": format!("User {}", id),
        "role": role
    })
}

pub fn course_json(id: i64, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "About the course",
        "original_text": "Course text",
        "file_url": null,
        "created_by": 1,
        "status": status,
        "created_at": "2024-05-01T10:00:00"
    })
}

pub fn case_json(id: i64, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "A case",
        "cleaning_text": null,
        "created_by": 1,
        "status": status,
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00"
    })
}

pub fn case_question_json(id: i64, case_id: i64) -> Value {
    json!({
        "id": id,
        "case_id": case_id,
        "question": format!("Question {}", id),
        "answer": format!("Answer {}", id),
        "created_by": 1,
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00"
    })
}

pub fn test_result_json(id: i64, test_id: i64, score: i64) -> Value {
    json!({
        "id": id,
        "test_id": test_id,
        "student_id": 7,
        "answers": [],
        "score": score,
        "total_questions": 10,
        "submitted_at": "2024-05-02T12:00:00",
        "percentage": score as f64 * 10.0,
        "passed": score >= 6
    })
}
