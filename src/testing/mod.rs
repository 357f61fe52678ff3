//! Taking tests and reading their results

mod types;

use crate::error::Result;
use crate::fetch::ApiClient;
use crate::store::StoreState;

pub use types::*;

#[derive(Debug, Default)]
struct TestsState {
    current_test: Option<StudentTest>,
    test_results: Vec<TestResult>,
    current_result: Option<TestResult>,
    submit_response: Option<TestSubmitResponse>,
}

/// Store for the test being taken and for test results
pub struct TestsStore {
    api: ApiClient,
    state: StoreState<TestsState>,
}

impl TestsStore {
    /// Create a new TestsStore
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: StoreState::default(),
        }
    }

    pub fn current_test(&self) -> Option<StudentTest> {
        self.state.read(|s| s.current_test.clone())
    }

    pub fn test_results(&self) -> Vec<TestResult> {
        self.state.read(|s| s.test_results.clone())
    }

    pub fn current_result(&self) -> Option<TestResult> {
        self.state.read(|s| s.current_result.clone())
    }

    /// Score summary of the last submission
    pub fn submit_response(&self) -> Option<TestSubmitResponse> {
        self.state.read(|s| s.submit_response.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.error()
    }

    pub async fn fetch_test(&self, test_id: i64) -> Result<StudentTest> {
        self.state
            .track(async {
                let test: StudentTest = self.api.get(&format!("/tests/{}", test_id)).await?;
                self.state.write(|s| s.current_test = Some(test.clone()));
                Ok(test)
            })
            .await
    }

    /// Submit answers and keep the score summary. The current test is left as is.
    pub async fn submit_test(
        &self,
        test_id: i64,
        submission: &TestSubmission,
    ) -> Result<TestSubmitResponse> {
        self.state
            .track(async {
                let response: TestSubmitResponse = self
                    .api
                    .post(&format!("/tests/{}/submit", test_id), submission)
                    .await?;
                self.state.write(|s| s.submit_response = Some(response.clone()));
                Ok(response)
            })
            .await
    }

    pub async fn fetch_results(&self, query: &ResultsQuery) -> Result<Vec<TestResult>> {
        self.state
            .track(async {
                let results: Vec<TestResult> =
                    self.api.get_query("/results", &query.to_query()).await?;
                self.state.write(|s| s.test_results = results.clone());
                Ok(results)
            })
            .await
    }

    pub async fn fetch_result(&self, result_id: i64) -> Result<TestResult> {
        self.state
            .track(async {
                let result: TestResult = self.api.get(&format!("/results/{}", result_id)).await?;
                self.state.write(|s| s.current_result = Some(result.clone()));
                Ok(result)
            })
            .await
    }

    /// The signed-in student's results for a course.
    ///
    /// The first entry, in the server's order, becomes the current result.
    pub async fn fetch_my_results_by_course(&self, course_id: i64) -> Result<Vec<TestResult>> {
        self.state
            .track(async {
                let results: Vec<TestResult> = self
                    .api
                    .get(&format!("/results/my/course/{}", course_id))
                    .await?;
                if let Some(latest) = results.first() {
                    self.state.write(|s| s.current_result = Some(latest.clone()));
                }
                Ok(results)
            })
            .await
    }
}
