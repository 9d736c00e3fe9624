//! Session-aware operations: cached listings, course selection and the
//! auto-grading run.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::audit::{AuditSink, GradeRecord};
use crate::cache::{CacheKey, EntityCache};
use crate::error::{ClientError, Result};
use crate::gateway::{Gateway, GradeUpdate};
use crate::grading::{self, MISSING_GRADE};
use crate::models::{
    Assignment, AssignmentSubmissions, CourseAssignments, EnrolledUser, RemoteCourse,
    RemoteEnrolledUser, Roles, SessionState, SiteInfo, Submission, UserInfo,
};

pub struct Client<G> {
    state: SessionState,
    cache: EntityCache,
    gateway: G,
    service: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoGradeOptions {
    /// Accepted on the command line; grade removal is not implemented.
    pub remove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedStudent {
    pub userid: i64,
    pub name: String,
    pub roles: Roles,
    /// `(status, gradingstatus)` when a submission record existed.
    pub submission: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoGradeOutcome {
    Graded(Vec<GradedStudent>),
    RemovalUnimplemented,
}

impl AutoGradeOutcome {
    pub fn graded_ids(&self) -> Vec<i64> {
        match self {
            AutoGradeOutcome::Graded(students) => students.iter().map(|s| s.userid).collect(),
            AutoGradeOutcome::RemovalUnimplemented => Vec::new(),
        }
    }
}

impl<G: Gateway> Client<G> {
    pub fn new(state: SessionState, cache: EntityCache, gateway: G, service: impl Into<String>) -> Self {
        Self {
            state,
            cache,
            gateway,
            service: service.into(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let domain = self.state.require_domain()?.to_string();
        let token = self
            .gateway
            .authenticate(&domain, username, password, &self.service)
            .await?;
        info!(%domain, username, "authenticated");
        self.state.token = Some(token);
        Ok(())
    }

    /// Always asks the service; stores the user and a `site_info.json` snapshot.
    pub async fn site_info(&mut self) -> Result<SiteInfo> {
        let (domain, token) = self.state.credentials()?;
        let site = self.gateway.site_info(domain, token).await?;
        self.cache.store(&CacheKey::SiteInfo, &site).await?;
        self.state.user = Some(UserInfo::from(&site));
        Ok(site)
    }

    pub async fn courses(&mut self) -> Result<Vec<RemoteCourse>> {
        let userid = match self.state.user.as_ref().map(|u| u.userid) {
            Some(userid) => userid,
            None => self.site_info().await?.userid,
        };
        let creds = self.state.credentials();
        let gateway = &self.gateway;
        self.cache
            .fetch_or_load(&CacheKey::Courses { userid }, move || async move {
                let (domain, token) = creds?;
                gateway.user_courses(domain, token, userid).await
            })
            .await
    }

    /// Selects a course after checking it is one of the user's courses.
    pub async fn set_course(&mut self, course_id: i64) -> Result<()> {
        let courses = self.courses().await?;
        if !courses.iter().any(|c| c.id == course_id) {
            return Err(ClientError::InvalidCourse(course_id));
        }
        info!(course_id, "course selected");
        self.state.course_id = Some(course_id);
        Ok(())
    }

    pub async fn enrolled(&self) -> Result<Vec<EnrolledUser>> {
        let course_id = self.state.require_course()?;
        let creds = self.state.credentials();
        let gateway = &self.gateway;
        let users: Vec<RemoteEnrolledUser> = self
            .cache
            .fetch_or_load(&CacheKey::Enrolled { course_id }, move || async move {
                let (domain, token) = creds?;
                gateway.enrolled_users(domain, token, course_id).await
            })
            .await?;
        Ok(users.iter().map(EnrolledUser::from).collect())
    }

    pub async fn assignments(&self) -> Result<Vec<Assignment>> {
        let course_id = self.state.require_course()?;
        let creds = self.state.credentials();
        let gateway = &self.gateway;
        let block: CourseAssignments = self
            .cache
            .fetch_or_load(&CacheKey::Assignments { course_id }, move || async move {
                let (domain, token) = creds?;
                gateway
                    .assignments(domain, token, &[course_id])
                    .await?
                    .courses
                    .into_iter()
                    .find(|c| c.id == course_id)
                    .ok_or(ClientError::InvalidCourse(course_id))
            })
            .await?;
        Ok(block.assignments.iter().map(Assignment::from).collect())
    }

    pub async fn submissions(&self, assignment_id: i64) -> Result<Vec<Submission>> {
        let course_id = self.state.require_course()?;
        if !self.assignments().await?.iter().any(|a| a.id == assignment_id) {
            return Err(ClientError::InvalidAssignment(assignment_id));
        }
        let creds = self.state.credentials();
        let gateway = &self.gateway;
        let key = CacheKey::Submissions {
            course_id,
            assignment_id,
        };
        let block: AssignmentSubmissions = self
            .cache
            .fetch_or_load(&key, move || async move {
                let (domain, token) = creds?;
                // the service leaves out assignments that have no submissions
                let block = gateway
                    .submissions(domain, token, &[assignment_id])
                    .await?
                    .assignments
                    .into_iter()
                    .find(|a| a.assignmentid == assignment_id)
                    .unwrap_or(AssignmentSubmissions {
                        assignmentid: assignment_id,
                        submissions: Vec::new(),
                    });
                Ok::<_, ClientError>(block)
            })
            .await?;
        Ok(block.submissions.iter().map(Submission::from).collect())
    }

    /// Writes a zero grade, with the default comment, for every student of the
    /// selected course whose submission to `assignment_id` is missing.
    ///
    /// Checks, in order: authentication, assignment id, cutoff configured,
    /// cutoff passed. The first failing save-grade aborts the run; students
    /// graded before it stay graded and are already in the audit trail.
    pub async fn auto_grade_missing(
        &self,
        assignment_id: i64,
        options: AutoGradeOptions,
        now: DateTime<Utc>,
        audit: &mut dyn AuditSink,
    ) -> Result<AutoGradeOutcome> {
        if options.remove {
            warn!(assignment_id, "grade removal is not implemented; nothing was changed");
            return Ok(AutoGradeOutcome::RemovalUnimplemented);
        }

        if !self.state.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        let assignment = self
            .assignments()
            .await?
            .into_iter()
            .find(|a| a.id == assignment_id)
            .ok_or(ClientError::InvalidAssignment(assignment_id))?;
        let cutoff = grading::check_eligibility(&assignment, now)?;
        info!(assignment_id, name = %assignment.name, %cutoff, "assignment eligible for auto-grading");

        let (domain, token) = self.state.credentials()?;
        let enrolled = self.enrolled().await?;
        let submissions = self.submissions(assignment_id).await?;
        let missing = grading::missing_students(&enrolled, &submissions);
        let comment = self.state.comment.as_deref().unwrap_or_default();

        audit.run_started(assignment_id)?;
        let mut graded = Vec::with_capacity(missing.len());
        for student in missing {
            let name = student.user.display_name();
            info!(asn_id = assignment_id, usr_id = student.user.userid, user_name = %name, "grading missing submission");
            let update = GradeUpdate {
                assignment_id,
                user_id: student.user.userid,
                grade: MISSING_GRADE,
                comment,
            };
            self.gateway.save_grade(domain, token, &update).await?;
            audit.graded(&GradeRecord {
                assignment_id,
                user_id: student.user.userid,
                user_name: name.clone(),
            })?;
            graded.push(GradedStudent {
                userid: student.user.userid,
                name,
                roles: student.user.roles.clone(),
                submission: student
                    .submission
                    .map(|s| (s.status.clone(), s.grading_status.clone())),
            });
        }
        info!(assignment_id, graded = graded.len(), "auto-grading done");
        Ok(AutoGradeOutcome::Graded(graded))
    }
}
