//! Case studies: authoring, questions and graded free-text answers

mod types;

use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::auth::User;
use crate::courses::ContentStatus;
use crate::error::Result;
use crate::fetch::ApiClient;
use crate::store::StoreState;

pub use types::*;

/// Questions generated per case unless a count is given
pub const DEFAULT_QUESTION_COUNT: u32 = 10;

const DEFAULT_SKIP: u32 = 0;
const DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Default)]
struct CasesState {
    cases: Vec<Case>,
    current_case: Option<Case>,
}

impl CasesState {
    fn current_mut(&mut self, case_id: i64) -> Option<&mut Case> {
        self.current_case.as_mut().filter(|c| c.id == case_id)
    }
}

/// Store for case studies and their results
pub struct CasesStore {
    api: ApiClient,
    state: StoreState<CasesState>,
}

impl CasesStore {
    /// Create a new CasesStore
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: StoreState::default(),
        }
    }

    pub fn cases(&self) -> Vec<Case> {
        self.state.read(|s| s.cases.clone())
    }

    pub fn current_case(&self) -> Option<Case> {
        self.state.read(|s| s.current_case.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.error()
    }

    /// Load a page of cases. Defaults to the first 100.
    pub async fn fetch_cases(&self, skip: Option<u32>, limit: Option<u32>) -> Result<Vec<Case>> {
        let query = [
            ("skip", skip.unwrap_or(DEFAULT_SKIP).to_string()),
            ("limit", limit.unwrap_or(DEFAULT_LIMIT).to_string()),
        ];

        self.state
            .track(async {
                let cases: Vec<Case> = self.api.get_query("/cases", &query).await?;
                self.state.write(|s| s.cases = cases.clone());
                Ok(cases)
            })
            .await
    }

    pub async fn fetch_case(&self, id: i64) -> Result<Case> {
        self.state
            .track(async {
                let case: Case = self.api.get(&format!("/cases/{}", id)).await?;
                self.state.write(|s| s.current_case = Some(case.clone()));
                Ok(case)
            })
            .await
    }

    pub async fn create_case(&self, data: &CreateCaseRequest) -> Result<Case> {
        self.state
            .track(async {
                let case: Case = self.api.post("/cases", data).await?;
                self.state.write(|s| s.cases.push(case.clone()));
                Ok(case)
            })
            .await
    }

    /// Upload a PDF and let the backend build a case from its text
    pub async fn create_case_from_pdf(&self, upload: CaseFromPdf) -> Result<Case> {
        self.state
            .track(async {
                let form = pdf_form(upload)?;
                let case: Case = self.api.post_multipart("/cases/from-pdf", form).await?;
                self.state.write(|s| s.cases.push(case.clone()));
                Ok(case)
            })
            .await
    }

    /// Send a partial update; list entry and current case take the server's answer
    pub async fn update_case(&self, id: i64, patch: &CasePatch) -> Result<Case> {
        self.state
            .track(async {
                let case: Case = self.api.patch(&format!("/cases/{}", id), patch).await?;
                self.state.write(|s| {
                    if let Some(entry) = s.cases.iter_mut().find(|c| c.id == id) {
                        *entry = case.clone();
                    }
                    if let Some(current) = s.current_mut(id) {
                        *current = case.clone();
                    }
                });
                Ok(case)
            })
            .await
    }

    pub async fn delete_case(&self, id: i64) -> Result<()> {
        self.state
            .track(async {
                self.api.delete(&format!("/cases/{}", id)).await?;
                self.state.write(|s| {
                    s.cases.retain(|c| c.id != id);
                    if s.current_mut(id).is_some() {
                        s.current_case = None;
                    }
                });
                Ok(())
            })
            .await
    }

    pub async fn publish_case(&self, id: i64) -> Result<Case> {
        self.update_case(id, &CasePatch::new().status(ContentStatus::Published))
            .await
    }

    /// Ask the backend for `count` questions, [`DEFAULT_QUESTION_COUNT`] if unset
    pub async fn generate_questions(
        &self,
        case_id: i64,
        count: Option<u32>,
    ) -> Result<Vec<CaseQuestion>> {
        let query = [("count", count.unwrap_or(DEFAULT_QUESTION_COUNT).to_string())];

        self.state
            .track(async {
                let questions: Vec<CaseQuestion> = self
                    .api
                    .post_query(&format!("/cases/{}/generate-questions", case_id), &query)
                    .await?;
                self.state.write(|s| {
                    if let Some(current) = s.current_mut(case_id) {
                        current.questions = Some(questions.clone());
                    }
                });
                Ok(questions)
            })
            .await
    }

    pub async fn fetch_questions(&self, case_id: i64) -> Result<Vec<CaseQuestion>> {
        self.state
            .track(async {
                let questions: Vec<CaseQuestion> = self
                    .api
                    .get(&format!("/cases/{}/questions", case_id))
                    .await?;
                self.state.write(|s| {
                    if let Some(current) = s.current_mut(case_id) {
                        current.questions = Some(questions.clone());
                    }
                });
                Ok(questions)
            })
            .await
    }

    pub async fn delete_question(&self, case_id: i64, question_id: i64) -> Result<()> {
        self.state
            .track(async {
                self.api
                    .delete(&format!("/cases/{}/questions/{}", case_id, question_id))
                    .await?;
                self.state.write(|s| {
                    if let Some(questions) =
                        s.current_mut(case_id).and_then(|c| c.questions.as_mut())
                    {
                        questions.retain(|q| q.id != question_id);
                    }
                });
                Ok(())
            })
            .await
    }

    /// Questions without reference answers. Nothing is stored.
    pub async fn fetch_questions_for_student(
        &self,
        case_id: i64,
    ) -> Result<Vec<CaseQuestionForStudent>> {
        self.state
            .track(self.api.get(&format!("/cases/{}/questions", case_id)))
            .await
    }

    pub async fn submit_case_answer(
        &self,
        data: &SubmitCaseAnswerRequest,
    ) -> Result<CaseAnswerResult> {
        log::debug!("Submitting answer for case test {}", data.test_id);
        self.state
            .track(self.api.post("/case-results/submit", data))
            .await
    }

    /// The signed-in student's answer for a case test, `None` if there is none yet
    pub async fn fetch_test_result(&self, test_id: i64) -> Result<Option<CaseAnswerResult>> {
        self.state
            .lookup(
                self.api
                    .get(&format!("/case-results/my-result/test/{}", test_id)),
            )
            .await
    }

    /// Every student's answer to a case; empty when the backend has none
    pub async fn fetch_case_results(&self, case_id: i64) -> Result<Vec<CaseAnswerResult>> {
        let results: Option<Vec<CaseAnswerResult>> = self
            .state
            .lookup(self.api.get(&format!("/case-results/case/{}", case_id)))
            .await?;
        Ok(results.unwrap_or_default())
    }

    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<User>> {
        self.state
            .lookup(self.api.get(&format!("/users/{}", user_id)))
            .await
    }

    /// Grade an answer
    pub async fn update_test_score(&self, result_id: i64, score: f64) -> Result<CaseAnswerResult> {
        let body = json!({ "score": score });
        self.state
            .track(
                self.api
                    .patch(&format!("/case-results/{}/score", result_id), &body),
            )
            .await
    }
}

fn pdf_form(upload: CaseFromPdf) -> Result<Form> {
    let file = Part::bytes(upload.data.to_vec())
        .file_name(upload.file_name)
        .mime_str("application/pdf")?;

    let mut form = Form::new().part("file", file).text("title", upload.title);
    if let Some(description) = upload.description {
        form = form.text("description", description);
    }
    if let Some(status) = upload.status {
        form = form.text("status_value", status.as_str());
    }

    Ok(form)
}
