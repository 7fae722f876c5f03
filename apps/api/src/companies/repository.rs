use sqlx::PgPool;
use tracing::info;

use crate::models::company::{Company, NewCompany};

pub async fn create_company(pool: &PgPool, company: &NewCompany) -> Result<Company, sqlx::Error> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (company_name, address, domain)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(company.company_name.trim())
    .bind(&company.address)
    .bind(&company.domain)
    .fetch_one(pool)
    .await?;

    info!("Created company {} ({})", company.id, company.company_name);
    Ok(company)
}

pub async fn get_company(pool: &PgPool, company_id: i64) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_all_companies(pool: &PgPool) -> Result<Vec<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY id")
        .fetch_all(pool)
        .await
}
