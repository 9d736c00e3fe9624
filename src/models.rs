use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};

// --- persisted session ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub userid: i64,
    pub username: String,
    pub email: String,
    pub first: String,
    pub last: String,
    pub full: String,
}

impl From<&SiteInfo> for UserInfo {
    fn from(site: &SiteInfo) -> Self {
        Self {
            userid: site.userid,
            username: site.username.clone(),
            email: site.email.clone(),
            first: site.firstname.clone(),
            last: site.lastname.clone(),
            full: site.fullname.clone(),
        }
    }
}

// --- wire types, stored verbatim in the cache directory ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub userid: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub fullname: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteCourse {
    pub id: i64,
    pub shortname: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub shortname: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteEnrolledUser {
    pub id: i64,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignmentsResponse {
    #[serde(default)]
    pub courses: Vec<CourseAssignments>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CourseAssignments {
    pub id: i64,
    #[serde(default)]
    pub assignments: Vec<RemoteAssignment>,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteAssignment {
    pub id: i64,
    pub name: String,
    /// Epoch zero when the assignment has no cutoff configured.
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub cutoffdate: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmissionsResponse {
    #[serde(default)]
    pub assignments: Vec<AssignmentSubmissions>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSubmissions {
    pub assignmentid: i64,
    #[serde(default)]
    pub submissions: Vec<RemoteSubmission>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteSubmission {
    pub userid: i64,
    pub status: String,
    #[serde(default)]
    pub gradingstatus: String,
}

// --- domain entities ---

/// Role short-names of one enrolment, first occurrence order, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles(Vec<String>);

impl Roles {
    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r == role)
    }
}

impl<S: Into<String>> FromIterator<S> for Roles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut roles: Vec<String> = Vec::new();
        for role in iter {
            let role = role.into();
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Roles(roles)
    }
}

impl fmt::Display for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledUser {
    pub userid: i64,
    pub firstname: String,
    pub lastname: String,
    pub fullname: String,
    pub roles: Roles,
}

impl EnrolledUser {
    /// "First Last" with each part capitalized.
    pub fn display_name(&self) -> String {
        format!("{} {}", capitalize(&self.firstname), capitalize(&self.lastname))
    }
}

impl From<&RemoteEnrolledUser> for EnrolledUser {
    fn from(user: &RemoteEnrolledUser) -> Self {
        Self {
            userid: user.id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            fullname: user.fullname.clone(),
            roles: user.roles.iter().map(|r| r.shortname.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    /// `None` when the remote reports epoch zero.
    pub cutoff: Option<DateTime<Utc>>,
}

impl From<&RemoteAssignment> for Assignment {
    fn from(asn: &RemoteAssignment) -> Self {
        let cutoff = (asn.cutoffdate.timestamp() != 0).then_some(asn.cutoffdate);
        Self {
            id: asn.id,
            name: asn.name.clone(),
            cutoff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub userid: i64,
    pub status: String,
    pub grading_status: String,
}

impl From<&RemoteSubmission> for Submission {
    fn from(sub: &RemoteSubmission) -> Self {
        Self {
            userid: sub.userid,
            status: sub.status.clone(),
            grading_status: sub.gradingstatus.clone(),
        }
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn capitalize_words(text: &str) -> String {
    text.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}
