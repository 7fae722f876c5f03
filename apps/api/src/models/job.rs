use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A job posting as returned by the listing endpoints, with its reference ids
/// folded in from the link tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: i64,
    pub company_id: i64,
    pub job_name: String,
    pub description: String,
    pub min_notice_period: i32,
    pub max_notice_period: i32,
    pub min_experience: i32,
    pub max_experience: i32,
    #[serde(rename = "location")]
    pub location_ids: Vec<i64>,
    #[serde(rename = "technologyStack")]
    pub technology_ids: Vec<i64>,
    #[serde(rename = "qualifications")]
    pub qualification_ids: Vec<i64>,
    #[serde(rename = "shifts")]
    pub shift_ids: Vec<i64>,
    #[serde(rename = "jobtype")]
    pub job_type_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// Request body for posting a job against a company.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub job_name: String,
    pub description: String,
    pub min_notice_period: i32,
    pub max_notice_period: i32,
    pub min_experience: i32,
    pub max_experience: i32,
    #[serde(default)]
    pub location: Vec<i64>,
    #[serde(default)]
    pub technology_stack: Vec<i64>,
    #[serde(default)]
    pub qualifications: Vec<i64>,
    #[serde(default)]
    pub shifts: Vec<i64>,
    #[serde(default)]
    pub jobtype: Vec<i64>,
}

impl NewJob {
    /// Checks the invariants the matcher relies on: non-blank text and
    /// well-ordered, non-negative ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_name.trim().is_empty() {
            return Err("jobName cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description cannot be empty".to_string());
        }
        if self.min_notice_period < 0 || self.min_experience < 0 {
            return Err("range bounds cannot be negative".to_string());
        }
        if self.min_notice_period > self.max_notice_period {
            return Err("minNoticePeriod cannot exceed maxNoticePeriod".to_string());
        }
        if self.min_experience > self.max_experience {
            return Err("minExperience cannot exceed maxExperience".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobCreated {
    pub id: i64,
}

/// The matching-relevant snapshot of a job posting.
///
/// This is what the read-through cache stores (as JSON) and what the store
/// returns for a job id. Id lists may contain repeats; they are treated as sets.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct JobCriteria {
    pub id: i64,
    pub min_notice_period: i32,
    pub max_notice_period: i32,
    pub min_experience: i32,
    pub max_experience: i32,
    pub location_ids: Vec<i64>,
    pub technology_ids: Vec<i64>,
    pub qualification_ids: Vec<i64>,
    pub shift_ids: Vec<i64>,
    pub job_type_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> NewJob {
        NewJob {
            job_name: "Backend Engineer".to_string(),
            description: "Build the matching service".to_string(),
            min_notice_period: 0,
            max_notice_period: 30,
            min_experience: 2,
            max_experience: 5,
            location: vec![1],
            technology_stack: vec![1, 2],
            qualifications: vec![],
            shifts: vec![],
            jobtype: vec![],
        }
    }

    #[test]
    fn test_valid_job_passes() {
        assert!(new_job().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut job = new_job();
        job.job_name = "   ".to_string();
        assert!(job.validate().unwrap_err().contains("jobName"));
    }

    #[test]
    fn test_inverted_experience_range_rejected() {
        let mut job = new_job();
        job.min_experience = 6;
        assert!(job.validate().unwrap_err().contains("minExperience"));
    }

    #[test]
    fn test_negative_bound_rejected() {
        let mut job = new_job();
        job.min_notice_period = -1;
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_new_job_id_lists_default_to_empty() {
        let job: NewJob = serde_json::from_str(
            r#"{"jobName":"x","description":"y","minNoticePeriod":1,"maxNoticePeriod":2,
                "minExperience":0,"maxExperience":3}"#,
        )
        .unwrap();
        assert!(job.location.is_empty());
        assert!(job.jobtype.is_empty());
    }
}
