//! Types for case studies, their questions and graded answers

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::courses::ContentStatus;

/// Case question with its reference answer, as the author sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseQuestion {
    pub id: i64,
    pub case_id: i64,
    pub question: String,
    pub answer: String,
    pub created_by: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Case question without the reference answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseQuestionForStudent {
    pub id: i64,
    pub case_id: i64,
    pub question: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A case study answered in free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub cleaning_text: Option<String>,
    pub created_by: i64,
    pub status: ContentStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub questions: Option<Vec<CaseQuestion>>,
}

/// Body of `POST /cases`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateCaseRequest {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_text: Option<String>,
}

/// Partial update for `PATCH /cases/{id}`; unset fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
}

impl CasePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn cleaning_text(mut self, text: &str) -> Self {
        self.cleaning_text = Some(text.to_string());
        self
    }

    pub fn status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A PDF the backend turns into a case
#[derive(Debug, Clone)]
pub struct CaseFromPdf {
    pub file_name: String,
    pub data: Bytes,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<ContentStatus>,
}

impl CaseFromPdf {
    pub fn new(file_name: &str, data: impl Into<Bytes>, title: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            data: data.into(),
            title: title.to_string(),
            description: None,
            status: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Body of `POST /case-results/submit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitCaseAnswerRequest {
    pub answer: String,
    /// Id of the case test being answered
    pub test_id: i64,
}

/// A student's answer to a case, with the score once graded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAnswerResult {
    pub id: i64,
    pub test_id: i64,
    pub student_id: i64,
    pub answer: String,
    pub file_url: Option<String>,
    pub score: Option<f64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
