use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::models::{
    AssignmentsResponse, RemoteCourse, RemoteEnrolledUser, SiteInfo, SubmissionsResponse,
};

/// A single grade write.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeUpdate<'a> {
    pub assignment_id: i64,
    pub user_id: i64,
    pub grade: f64,
    pub comment: &'a str,
}

/// The remote operations the client relies on. Every call is one blocking
/// round trip from the caller's point of view; only the token is carried.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn authenticate(
        &self,
        domain: &str,
        username: &str,
        password: &str,
        service: &str,
    ) -> Result<String>;

    async fn site_info(&self, domain: &str, token: &str) -> Result<SiteInfo>;

    async fn user_courses(&self, domain: &str, token: &str, userid: i64)
        -> Result<Vec<RemoteCourse>>;

    async fn enrolled_users(
        &self,
        domain: &str,
        token: &str,
        course_id: i64,
    ) -> Result<Vec<RemoteEnrolledUser>>;

    async fn assignments(
        &self,
        domain: &str,
        token: &str,
        course_ids: &[i64],
    ) -> Result<AssignmentsResponse>;

    async fn submissions(
        &self,
        domain: &str,
        token: &str,
        assignment_ids: &[i64],
    ) -> Result<SubmissionsResponse>;

    async fn save_grade(&self, domain: &str, token: &str, update: &GradeUpdate<'_>) -> Result<()>;
}

/// Moodle REST web-service gateway.
#[derive(Debug, Clone)]
pub struct MoodleGateway {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
    error: Option<String>,
}

type Params = Vec<(String, String)>;

impl MoodleGateway {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        domain: &str,
        token: &str,
        function: &str,
        params: Params,
    ) -> Result<T> {
        let url = format!("{}/webservice/rest/server.php", domain.trim_end_matches('/'));
        let mut form: Params = vec![
            ("wstoken".into(), token.into()),
            ("wsfunction".into(), function.into()),
            ("moodlewsrestformat".into(), "json".into()),
        ];
        form.extend(params);

        debug!(function, "calling web service");
        let body: Value = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(exception) = body.get("exception") {
            let code = body
                .get("errorcode")
                .and_then(Value::as_str)
                .or_else(|| exception.as_str())
                .unwrap_or("unknown")
                .to_string();
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ClientError::Remote { code, message });
        }
        Ok(serde_json::from_value(body)?)
    }
}

fn indexed(name: &str, values: &[i64]) -> Params {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("{name}[{i}]"), v.to_string()))
        .collect()
}

#[async_trait]
impl Gateway for MoodleGateway {
    async fn authenticate(
        &self,
        domain: &str,
        username: &str,
        password: &str,
        service: &str,
    ) -> Result<String> {
        let url = format!("{}/login/token.php", domain.trim_end_matches('/'));
        let resp: TokenResponse = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password), ("service", service)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match (resp.token, resp.error) {
            (Some(token), _) if !token.is_empty() => Ok(token),
            (_, Some(err)) => Err(ClientError::Authentication(err)),
            _ => Err(ClientError::Authentication("no token in response".into())),
        }
    }

    async fn site_info(&self, domain: &str, token: &str) -> Result<SiteInfo> {
        self.call(domain, token, "core_webservice_get_site_info", Vec::new())
            .await
    }

    async fn user_courses(
        &self,
        domain: &str,
        token: &str,
        userid: i64,
    ) -> Result<Vec<RemoteCourse>> {
        let params = vec![("userid".into(), userid.to_string())];
        self.call(domain, token, "core_enrol_get_users_courses", params)
            .await
    }

    async fn enrolled_users(
        &self,
        domain: &str,
        token: &str,
        course_id: i64,
    ) -> Result<Vec<RemoteEnrolledUser>> {
        let params = vec![("courseid".into(), course_id.to_string())];
        self.call(domain, token, "core_enrol_get_enrolled_users", params)
            .await
    }

    async fn assignments(
        &self,
        domain: &str,
        token: &str,
        course_ids: &[i64],
    ) -> Result<AssignmentsResponse> {
        self.call(
            domain,
            token,
            "mod_assign_get_assignments",
            indexed("courseids", course_ids),
        )
        .await
    }

    async fn submissions(
        &self,
        domain: &str,
        token: &str,
        assignment_ids: &[i64],
    ) -> Result<SubmissionsResponse> {
        self.call(
            domain,
            token,
            "mod_assign_get_submissions",
            indexed("assignmentids", assignment_ids),
        )
        .await
    }

    async fn save_grade(&self, domain: &str, token: &str, update: &GradeUpdate<'_>) -> Result<()> {
        let editor = "plugindata[assignfeedbackcomments_editor]";
        let params: Params = vec![
            ("assignmentid".into(), update.assignment_id.to_string()),
            ("userid".into(), update.user_id.to_string()),
            ("grade".into(), update.grade.to_string()),
            ("attemptnumber".into(), "-1".into()),
            ("addattempt".into(), "0".into()),
            ("workflowstate".into(), String::new()),
            ("applytoall".into(), "1".into()),
            (format!("{editor}[text]"), update.comment.to_string()),
            (format!("{editor}[format]"), "1".into()),
        ];
        // success is an empty (null) payload
        let _: Value = self
            .call(domain, token, "mod_assign_save_grade", params)
            .await?;
        Ok(())
    }
}
