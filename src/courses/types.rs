//! Types for courses and their summaries

use serde::{Deserialize, Serialize};

use crate::testing::TestProjection;

/// Publication state. Moves from draft to published only, on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
        }
    }
}

/// Condensed course text, written by the author or generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub course_id: i64,
    pub content: String,
    pub created_at: Option<String>,
}

/// A course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub original_text: String,
    pub file_url: Option<String>,
    pub created_by: i64,
    pub status: ContentStatus,
    pub created_at: Option<String>,
    pub summary: Option<Summary>,
    pub test: Option<TestProjection>,
}

/// Body of `POST /courses`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// Partial update for `PATCH /courses/{id}`; unset fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
}

impl CoursePatch {
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

    pub fn original_text(mut self, text: &str) -> Self {
        self.original_text = Some(text.to_string());
        self
    }

    pub fn file_url(mut self, url: &str) -> Self {
        self.file_url = Some(url.to_string());
        self
    }

    pub fn status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }
}
