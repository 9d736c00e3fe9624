#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rustimoodle::cache::EntityCache;
use rustimoodle::gateway::{Gateway, GradeUpdate};
use rustimoodle::models::{
    AssignmentSubmissions, AssignmentsResponse, CourseAssignments, RemoteAssignment, RemoteCourse,
    RemoteEnrolledUser, RemoteSubmission, RoleRef, SessionState, SiteInfo, SubmissionsResponse,
};
use rustimoodle::{Client, ClientError, Result};

pub const COURSE: i64 = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedGrade {
    pub assignment_id: i64,
    pub user_id: i64,
    pub grade: f64,
    pub comment: String,
}

/// In-memory service that counts calls and records grade writes.
#[derive(Default)]
pub struct FakeGateway {
    pub courses: Vec<RemoteCourse>,
    pub enrolled: Vec<RemoteEnrolledUser>,
    pub assignments: Vec<RemoteAssignment>,
    pub submissions: HashMap<i64, Vec<RemoteSubmission>>,
    pub fail_grade_for: Option<i64>,
    pub calls: Mutex<HashMap<&'static str, usize>>,
    pub saved: Mutex<Vec<SavedGrade>>,
}

impl FakeGateway {
    fn hit(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn saved(&self) -> Vec<SavedGrade> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn authenticate(
        &self,
        _domain: &str,
        username: &str,
        password: &str,
        _service: &str,
    ) -> Result<String> {
        self.hit("authenticate");
        if username == "teacher" && password == "secret" {
            Ok("token-1".into())
        } else {
            Err(ClientError::Authentication("invalidlogin".into()))
        }
    }

    async fn site_info(&self, _domain: &str, _token: &str) -> Result<SiteInfo> {
        self.hit("site_info");
        Ok(SiteInfo {
            userid: 7,
            username: "teacher".into(),
            email: "teacher@example.org".into(),
            firstname: "Grace".into(),
            lastname: "Hopper".into(),
            fullname: "Grace Hopper".into(),
        })
    }

    async fn user_courses(&self, _d: &str, _t: &str, _userid: i64) -> Result<Vec<RemoteCourse>> {
        self.hit("user_courses");
        Ok(self.courses.clone())
    }

    async fn enrolled_users(
        &self,
        _d: &str,
        _t: &str,
        _course_id: i64,
    ) -> Result<Vec<RemoteEnrolledUser>> {
        self.hit("enrolled_users");
        Ok(self.enrolled.clone())
    }

    async fn assignments(&self, _d: &str, _t: &str, course_ids: &[i64]) -> Result<AssignmentsResponse> {
        self.hit("assignments");
        Ok(AssignmentsResponse {
            courses: course_ids
                .iter()
                .filter(|id| self.courses.iter().any(|c| c.id == **id))
                .map(|id| CourseAssignments {
                    id: *id,
                    assignments: self.assignments.clone(),
                })
                .collect(),
        })
    }

    async fn submissions(
        &self,
        _d: &str,
        _t: &str,
        assignment_ids: &[i64],
    ) -> Result<SubmissionsResponse> {
        self.hit("submissions");
        Ok(SubmissionsResponse {
            assignments: assignment_ids
                .iter()
                .filter_map(|id| {
                    self.submissions.get(id).map(|subs| AssignmentSubmissions {
                        assignmentid: *id,
                        submissions: subs.clone(),
                    })
                })
                .collect(),
        })
    }

    async fn save_grade(&self, _d: &str, _t: &str, update: &GradeUpdate<'_>) -> Result<()> {
        self.hit("save_grade");
        if self.fail_grade_for == Some(update.user_id) {
            return Err(ClientError::Remote {
                code: "nopermissions".into(),
                message: "cannot grade".into(),
            });
        }
        self.saved.lock().unwrap().push(SavedGrade {
            assignment_id: update.assignment_id,
            user_id: update.user_id,
            grade: update.grade,
            comment: update.comment.to_string(),
        });
        Ok(())
    }
}

pub fn course(id: i64, shortname: &str) -> RemoteCourse {
    RemoteCourse {
        id,
        shortname: shortname.into(),
    }
}

pub fn member(id: i64, first: &str, last: &str, roles: &[&str]) -> RemoteEnrolledUser {
    RemoteEnrolledUser {
        id,
        fullname: format!("{first} {last}"),
        firstname: first.into(),
        lastname: last.into(),
        roles: roles
            .iter()
            .map(|r| RoleRef {
                shortname: r.to_string(),
            })
            .collect(),
    }
}

pub fn assignment(id: i64, name: &str, cutoff: DateTime<Utc>) -> RemoteAssignment {
    RemoteAssignment {
        id,
        name: name.into(),
        cutoffdate: cutoff,
    }
}

pub fn submission(userid: i64, status: &str, grading: &str) -> RemoteSubmission {
    RemoteSubmission {
        userid,
        status: status.into(),
        gradingstatus: grading.into(),
    }
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(0, 0).unwrap()
}

/// Authenticated session with `COURSE` selected.
pub fn logged_in() -> SessionState {
    SessionState {
        domain: Some("https://moodle.example.org".into()),
        token: Some("token-1".into()),
        course_id: Some(COURSE),
        comment: Some("No submission received".into()),
        ..Default::default()
    }
}

pub fn client(
    state: SessionState,
    gateway: FakeGateway,
    dir: &std::path::Path,
) -> Client<FakeGateway> {
    Client::new(state, EntityCache::new(dir.join("downloads")), gateway, "moodle_mobile_app")
}
