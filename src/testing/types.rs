//! Types for tests, submissions and results

use serde::{Deserialize, Serialize};

use crate::auth::User;

/// Question as the author sees it, answer key included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Question as a student sees it before submitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
}

/// A multiple-choice test attached to a course, in one of its two projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test<Q> {
    pub id: i64,
    pub course_id: i64,
    /// In display order
    pub questions: Vec<Q>,
    pub created_at: Option<String>,
}

/// Author view of a test
pub type AuthoredTest = Test<Question>;

/// Student view of a test
pub type StudentTest = Test<StudentQuestion>;

/// A test embedded in another record, in whichever projection the server chose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestProjection {
    Authored(AuthoredTest),
    Student(StudentTest),
}

impl TestProjection {
    pub fn id(&self) -> i64 {
        match self {
            Self::Authored(test) => test.id,
            Self::Student(test) => test.id,
        }
    }

    pub fn course_id(&self) -> i64 {
        match self {
            Self::Authored(test) => test.course_id,
            Self::Student(test) => test.course_id,
        }
    }

    pub fn question_count(&self) -> usize {
        match self {
            Self::Authored(test) => test.questions.len(),
            Self::Student(test) => test.questions.len(),
        }
    }

    /// The author view, when that is what the server sent
    pub fn authored(&self) -> Option<&AuthoredTest> {
        match self {
            Self::Authored(test) => Some(test),
            Self::Student(_) => None,
        }
    }
}

/// Question sent back when the author edits a test; new questions have no id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl From<Question> for QuestionInput {
    fn from(question: Question) -> Self {
        Self {
            id: Some(question.id),
            question: question.question,
            options: question.options,
            correct_answer: question.correct_answer,
        }
    }
}

/// One chosen option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub selected_answer: String,
}

/// Body of `POST /tests/{id}/submit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSubmission {
    pub answers: Vec<AnswerSubmission>,
}

/// Score summary returned for a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSubmitResponse {
    pub score: i64,
    pub total: i64,
    pub passed: bool,
    pub percentage: f64,
}

/// One graded answer inside a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAnswer {
    pub question_id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// A stored attempt at a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub test_id: i64,
    pub student_id: i64,
    pub answers: Vec<TestAnswer>,
    pub score: i64,
    pub total_questions: i64,
    pub submitted_at: Option<String>,
    pub percentage: f64,
    pub passed: bool,
    pub student: Option<User>,
    pub test: Option<TestProjection>,
}

/// Filters for `GET /results`; unset fields are left out of the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub course_id: Option<i64>,
}

impl ResultsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn course_id(mut self, course_id: i64) -> Self {
        self.course_id = Some(course_id);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(course_id) = self.course_id {
            params.push(("course_id", course_id.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_projection_follows_answer_key() {
        let authored: TestProjection = serde_json::from_value(json!({
            "id": 1,
            "course_id": 2,
            "questions": [{"id": 1, "question": "2+2?", "options": ["3", "4"], "correct_answer": "4"}]
        }))
        .unwrap();
        assert!(authored.authored().is_some());

        let student: TestProjection = serde_json::from_value(json!({
            "id": 1,
            "course_id": 2,
            "questions": [{"id": 1, "question": "2+2?", "options": ["3", "4"]}]
        }))
        .unwrap();
        assert!(student.authored().is_none());
        assert_eq!(student.question_count(), 1);
        assert_eq!(student.course_id(), 2);
    }

    #[test]
    fn test_results_query_skips_unset_fields() {
        assert!(ResultsQuery::new().to_query().is_empty());
        assert_eq!(
            ResultsQuery::new().limit(20).course_id(5).to_query(),
            vec![("limit", "20".to_string()), ("course_id", "5".to_string())]
        );
    }
}
