//! Match evaluator: majority-of-fields heuristic comparing one application
//! against one job's criteria.
//!
//! Seven criteria are scored independently:
//! 1. notice period within `[min_notice_period, max_notice_period]` (inclusive)
//! 2. experience within `[min_experience, max_experience]` (inclusive)
//! 3-7. non-empty intersection of location, technology, qualification,
//!    shift and job type ids
//!
//! An application is accepted iff `matched * 2 >= total`, i.e. at least 4 of 7.
//! Numeric fields are not guarded against zero: an application with no stated
//! preferences still matches any range that includes zero.

use serde::Serialize;

use crate::models::application::Application;
use crate::models::job::JobCriteria;

/// Number of criteria every application is scored on.
pub const TOTAL_CRITERIA: u32 = 7;

/// Per-application scoring breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub matched: u32,
    pub total: u32,
}

impl MatchScore {
    pub fn is_accepted(&self) -> bool {
        self.matched * 2 >= self.total
    }
}

/// Returns true when the application satisfies at least half of the criteria.
pub fn matches(application: &Application, job: &JobCriteria) -> bool {
    score(application, job).is_accepted()
}

/// Scores an application against a job's criteria.
pub fn score(application: &Application, job: &JobCriteria) -> MatchScore {
    let details = &application.job_application;

    let checks = [
        within(details.notice_period, job.min_notice_period, job.max_notice_period),
        within(details.experience, job.min_experience, job.max_experience),
        intersects(&details.location, &job.location_ids),
        intersects(&details.technology_stack, &job.technology_ids),
        intersects(&details.qualifications, &job.qualification_ids),
        intersects(&details.shifts, &job.shift_ids),
        intersects(&details.jobtype, &job.job_type_ids),
    ];

    MatchScore {
        matched: checks.iter().filter(|c| **c).count() as u32,
        total: TOTAL_CRITERIA,
    }
}

fn within(value: i32, min: i32, max: i32) -> bool {
    value >= min && value <= max
}

// Id lists are short; a nested scan is enough.
fn intersects(stated: &[i64], required: &[i64]) -> bool {
    stated.iter().any(|id| required.contains(id))
}
