// Decision rules for zero-grading missing submissions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{ClientError, Result};
use crate::models::{Assignment, EnrolledUser, Submission};

pub const STUDENT_ROLE: &str = "student";
pub const STATUS_NEW: &str = "new";
pub const GRADING_GRADED: &str = "graded";

/// Grade written for a missing submission.
pub const MISSING_GRADE: f64 = 0.0;

/// Only assignments whose cutoff has passed can be auto-graded.
pub fn check_eligibility(assignment: &Assignment, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let cutoff = assignment
        .cutoff
        .ok_or(ClientError::NoCutoffDate(assignment.id))?;
    if cutoff > now {
        return Err(ClientError::NotCutOff {
            id: assignment.id,
            cutoff,
        });
    }
    Ok(cutoff)
}

/// A student is missing the assignment when nothing was submitted, or when the
/// submission is still "new" and has not been graded. Other states are left alone.
pub fn is_missing(user: &EnrolledUser, submission: Option<&Submission>) -> bool {
    if !user.roles.contains(STUDENT_ROLE) {
        return false;
    }
    match submission {
        None => true,
        Some(sub) => sub.grading_status != GRADING_GRADED && sub.status == STATUS_NEW,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingStudent<'a> {
    pub user: &'a EnrolledUser,
    pub submission: Option<&'a Submission>,
}

/// Missing students in enrolment order.
pub fn missing_students<'a>(
    enrolled: &'a [EnrolledUser],
    submissions: &'a [Submission],
) -> Vec<MissingStudent<'a>> {
    let by_user: HashMap<i64, &Submission> =
        submissions.iter().map(|s| (s.userid, s)).collect();
    enrolled
        .iter()
        .map(|user| MissingStudent {
            user,
            submission: by_user.get(&user.userid).copied(),
        })
        .filter(|m| is_missing(m.user, m.submission))
        .collect()
}
