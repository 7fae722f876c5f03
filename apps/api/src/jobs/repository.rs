use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::models::job::{JobCreated, JobCriteria, JobPosting, NewJob};

/// Id-list columns folded in from the link tables, shared by the posting and
/// criteria queries.
const REFERENCE_ID_COLUMNS: &str = r#"
    ARRAY(SELECT location_id FROM job_locations WHERE job_id = j.id ORDER BY location_id) AS location_ids,
    ARRAY(SELECT technology_id FROM job_technologies WHERE job_id = j.id ORDER BY technology_id) AS technology_ids,
    ARRAY(SELECT qualification_id FROM job_qualifications WHERE job_id = j.id ORDER BY qualification_id) AS qualification_ids,
    ARRAY(SELECT shift_id FROM job_shifts WHERE job_id = j.id ORDER BY shift_id) AS shift_ids,
    ARRAY(SELECT job_type_id FROM job_job_types WHERE job_id = j.id ORDER BY job_type_id) AS job_type_ids
"#;

fn posting_query(filter: &str) -> String {
    format!(
        r#"
        SELECT j.id, j.company_id, j.job_name, j.description,
               j.min_notice_period, j.max_notice_period, j.min_experience, j.max_experience,
               {REFERENCE_ID_COLUMNS},
               j.created_at
        FROM jobs j
        {filter}
        ORDER BY j.id
        "#
    )
}

/// Source of truth for job criteria during matching.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Returns `Ok(None)` when no job has this id.
    async fn job_criteria(&self, job_id: i64) -> Result<Option<JobCriteria>, sqlx::Error>;
}

/// Postgres-backed `JobStore`.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn job_criteria(&self, job_id: i64) -> Result<Option<JobCriteria>, sqlx::Error> {
        get_job_criteria(&self.pool, job_id).await
    }
}

/// Inserts a job and its reference links in a single transaction.
/// Repeated ids in the request collapse to one link row.
pub async fn create_job(
    pool: &PgPool,
    company_id: i64,
    job: &NewJob,
) -> Result<JobCreated, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO jobs
            (company_id, job_name, description,
             min_notice_period, max_notice_period, min_experience, max_experience)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(company_id)
    .bind(job.job_name.trim())
    .bind(&job.description)
    .bind(job.min_notice_period)
    .bind(job.max_notice_period)
    .bind(job.min_experience)
    .bind(job.max_experience)
    .fetch_one(&mut *tx)
    .await?;

    let links: [(&str, &str, &[i64]); 5] = [
        ("job_locations", "location_id", &job.location),
        ("job_technologies", "technology_id", &job.technology_stack),
        ("job_qualifications", "qualification_id", &job.qualifications),
        ("job_shifts", "shift_id", &job.shifts),
        ("job_job_types", "job_type_id", &job.jobtype),
    ];
    for (table, column, ids) in links {
        if ids.is_empty() {
            continue;
        }
        let sql = format!(
            "INSERT INTO {table} (job_id, {column}) \
             SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(ids)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!("Created job {id} for company {company_id}");
    Ok(JobCreated { id })
}

pub async fn get_job(pool: &PgPool, job_id: i64) -> Result<Option<JobPosting>, sqlx::Error> {
    sqlx::query_as::<_, JobPosting>(&posting_query("WHERE j.id = $1"))
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_jobs_by_company(
    pool: &PgPool,
    company_id: i64,
) -> Result<Vec<JobPosting>, sqlx::Error> {
    sqlx::query_as::<_, JobPosting>(&posting_query("WHERE j.company_id = $1"))
        .bind(company_id)
        .fetch_all(pool)
        .await
}

pub async fn get_all_jobs(pool: &PgPool) -> Result<Vec<JobPosting>, sqlx::Error> {
    sqlx::query_as::<_, JobPosting>(&posting_query(""))
        .fetch_all(pool)
        .await
}

pub async fn get_job_criteria(
    pool: &PgPool,
    job_id: i64,
) -> Result<Option<JobCriteria>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT j.id, j.min_notice_period, j.max_notice_period,
               j.min_experience, j.max_experience,
               {REFERENCE_ID_COLUMNS}
        FROM jobs j
        WHERE j.id = $1
        "#
    );
    sqlx::query_as::<_, JobCriteria>(&sql)
        .bind(job_id)
        .fetch_optional(pool)
        .await
}
