//! Course authoring and course material

mod types;

use courseware_storage::{FileUpload, ObjectStorage};
use serde_json::json;

use crate::error::Result;
use crate::fetch::ApiClient;
use crate::store::StoreState;
use crate::testing::{
    AnswerSubmission, AuthoredTest, QuestionInput, StudentTest, TestProjection,
    TestSubmitResponse,
};

pub use types::*;

/// Folder course attachments are uploaded into
pub const COURSE_FOLDER: &str = "courses";

#[derive(Debug, Default)]
struct CoursesState {
    courses: Vec<Course>,
    current_course: Option<Course>,
}

impl CoursesState {
    /// Run `f` on the current course when it is `course_id`
    fn with_current(&mut self, course_id: i64, f: impl FnOnce(&mut Course)) {
        if let Some(course) = self.current_course.as_mut().filter(|c| c.id == course_id) {
            f(course);
        }
    }

    /// Write the server's copy of a course into the list and current
    fn reconcile(&mut self, id: i64, course: &Course) {
        if let Some(entry) = self.courses.iter_mut().find(|c| c.id == id) {
            *entry = course.clone();
        }
        if self.current_course.as_ref().map(|c| c.id) == Some(id) {
            self.current_course = Some(course.clone());
        }
    }

    fn remove(&mut self, id: i64) {
        self.courses.retain(|c| c.id != id);
        if self.current_course.as_ref().map(|c| c.id) == Some(id) {
            self.current_course = None;
        }
    }
}

/// Store for courses, their summaries and their tests
pub struct CoursesStore {
    api: ApiClient,
    state: StoreState<CoursesState>,
}

impl CoursesStore {
    /// Create a new CoursesStore
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: StoreState::default(),
        }
    }

    /// The loaded course list
    pub fn courses(&self) -> Vec<Course> {
        self.state.read(|s| s.courses.clone())
    }

    /// The course being viewed or edited
    pub fn current_course(&self) -> Option<Course> {
        self.state.read(|s| s.current_course.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Message of the last failed action
    pub fn error(&self) -> Option<String> {
        self.state.error()
    }

    pub async fn fetch_courses(&self) -> Result<Vec<Course>> {
        self.state
            .track(async {
                let courses: Vec<Course> = self.api.get("/courses").await?;
                self.state.write(|s| s.courses = courses.clone());
                Ok(courses)
            })
            .await
    }

    pub async fn fetch_course(&self, id: i64) -> Result<Course> {
        self.state
            .track(async {
                let course: Course = self.api.get(&format!("/courses/{}", id)).await?;
                self.state.write(|s| s.current_course = Some(course.clone()));
                Ok(course)
            })
            .await
    }

    pub async fn create_course(&self, data: &CreateCourseRequest) -> Result<Course> {
        self.state
            .track(async {
                let course: Course = self.api.post("/courses", data).await?;
                self.state.write(|s| s.courses.push(course.clone()));
                Ok(course)
            })
            .await
    }

    /// Upload the source file, then create the course pointing at it.
    ///
    /// If the course cannot be created the uploaded file is deleted again.
    pub async fn create_course_with_file(
        &self,
        storage: &dyn ObjectStorage,
        file: FileUpload,
        mut data: CreateCourseRequest,
    ) -> Result<Course> {
        let file_url = storage.upload(file, Some(COURSE_FOLDER)).await?;
        data.file_url = Some(file_url.clone());

        match self.create_course(&data).await {
            Ok(course) => Ok(course),
            Err(err) => {
                if let Err(cleanup) = storage.delete(&file_url).await {
                    log::warn!("Could not remove orphaned upload {}: {}", file_url, cleanup);
                }
                Err(err)
            }
        }
    }

    /// Send a partial update; list entry and current course take the server's answer
    pub async fn update_course(&self, id: i64, patch: &CoursePatch) -> Result<Course> {
        self.state
            .track(async {
                let course: Course = self.api.patch(&format!("/courses/{}", id), patch).await?;
                self.state.write(|s| s.reconcile(id, &course));
                Ok(course)
            })
            .await
    }

    pub async fn delete_course(&self, id: i64) -> Result<()> {
        self.state
            .track(async {
                self.api.delete(&format!("/courses/{}", id)).await?;
                self.state.write(|s| s.remove(id));
                Ok(())
            })
            .await
    }

    pub async fn publish_course(&self, id: i64) -> Result<Course> {
        self.update_course(id, &CoursePatch::new().status(ContentStatus::Published))
            .await
    }

    pub async fn fetch_summary(&self, course_id: i64) -> Result<Summary> {
        self.state
            .track(async {
                let summary: Summary = self
                    .api
                    .get(&format!("/summaries/course/{}", course_id))
                    .await?;
                self.state
                    .write(|s| s.with_current(course_id, |c| c.summary = Some(summary.clone())));
                Ok(summary)
            })
            .await
    }

    /// Ask the backend to write a summary of the course text
    pub async fn generate_summary(&self, course_id: i64) -> Result<Summary> {
        self.state
            .track(async {
                let body = json!({ "course_id": course_id, "content": "" });
                let summary: Summary = self.api.post("/ai/generate-summary", &body).await?;
                self.state
                    .write(|s| s.with_current(course_id, |c| c.summary = Some(summary.clone())));
                Ok(summary)
            })
            .await
    }

    pub async fn update_summary(&self, summary_id: i64, content: &str) -> Result<Summary> {
        self.state
            .track(async {
                let body = json!({ "content": content });
                let summary: Summary = self
                    .api
                    .patch(&format!("/summaries/{}", summary_id), &body)
                    .await?;
                self.state.write(|s| {
                    if let Some(course) = s.current_course.as_mut() {
                        if course.summary.as_ref().map(|x| x.id) == Some(summary_id) {
                            course.summary = Some(summary.clone());
                        }
                    }
                });
                Ok(summary)
            })
            .await
    }

    /// Author view of the course test, answer key included
    pub async fn fetch_test(&self, course_id: i64) -> Result<AuthoredTest> {
        self.state
            .track(async {
                let test: AuthoredTest = self
                    .api
                    .get(&format!("/tests/course/{}/full", course_id))
                    .await?;
                self.state.write(|s| {
                    s.with_current(course_id, |c| {
                        c.test = Some(TestProjection::Authored(test.clone()))
                    })
                });
                Ok(test)
            })
            .await
    }

    /// Student view of the course test
    pub async fn fetch_test_for_student(&self, course_id: i64) -> Result<StudentTest> {
        self.state
            .track(async {
                let test: StudentTest = self
                    .api
                    .get(&format!("/tests/course/{}", course_id))
                    .await?;
                self.state.write(|s| {
                    s.with_current(course_id, |c| {
                        c.test = Some(TestProjection::Student(test.clone()))
                    })
                });
                Ok(test)
            })
            .await
    }

    /// Ask the backend to write a test for the course
    pub async fn generate_test(&self, course_id: i64) -> Result<AuthoredTest> {
        self.state
            .track(async {
                let body = json!({ "course_id": course_id });
                let test: AuthoredTest = self.api.post("/ai/generate-test", &body).await?;
                self.state.write(|s| {
                    s.with_current(course_id, |c| {
                        c.test = Some(TestProjection::Authored(test.clone()))
                    })
                });
                Ok(test)
            })
            .await
    }

    /// Replace the questions of a test
    pub async fn update_test(
        &self,
        test_id: i64,
        questions: &[QuestionInput],
    ) -> Result<AuthoredTest> {
        self.state
            .track(async {
                let body = json!({ "questions": questions });
                let test: AuthoredTest = self
                    .api
                    .patch(&format!("/tests/{}", test_id), &body)
                    .await?;
                self.state.write(|s| {
                    if let Some(course) = s.current_course.as_mut() {
                        if course.test.as_ref().map(TestProjection::id) == Some(test_id) {
                            course.test = Some(TestProjection::Authored(test.clone()));
                        }
                    }
                });
                Ok(test)
            })
            .await
    }

    /// Submit answers; the store keeps nothing but the loading and error state
    pub async fn submit_test(
        &self,
        test_id: i64,
        answers: &[AnswerSubmission],
    ) -> Result<TestSubmitResponse> {
        self.state
            .track(async {
                let body = json!({ "answers": answers });
                self.api
                    .post(&format!("/tests/{}/submit", test_id), &body)
                    .await
            })
            .await
    }
}
