use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use diesel::dsl::count;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;

use data_model_jat::db::DbPool;
use data_model_jat::errors::ApiError;
use data_model_jat::models::{ApplicationStatus, InterviewStage, StatsSummary, recent_cutoff};
use data_model_jat::schema::job_applications;

// GET /api/v1/job-applications/stats/summary - Aggregate counts over all job applications
//
// All counts come from one read-only, repeatable-read snapshot; the total is the sum of the
// per-status counts.
pub async fn get_summary(State(pool): State<DbPool>) -> Result<impl IntoResponse, ApiError> {
    let cutoff = recent_cutoff(Utc::now().date_naive());

    let mut conn = pool.get().await?;
    let summary = conn
        .build_transaction()
        .read_only()
        .repeatable_read()
        .run(|conn| {
            async move {
                let status_counts: Vec<(ApplicationStatus, i64)> = job_applications::table
                    .group_by(job_applications::application_status)
                    .select((job_applications::application_status, count(job_applications::id)))
                    .load(conn)
                    .await?;

                let stage_counts: Vec<(InterviewStage, i64)> = job_applications::table
                    .group_by(job_applications::interview_stage)
                    .select((job_applications::interview_stage, count(job_applications::id)))
                    .load(conn)
                    .await?;

                let recent_applications: i64 = job_applications::table
                    .filter(job_applications::date_applied.ge(cutoff))
                    .count()
                    .get_result(conn)
                    .await?;

                Ok::<_, ApiError>(StatsSummary::from_counts(
                    status_counts,
                    stage_counts,
                    recent_applications,
                ))
            }
            .scope_boxed()
        })
        .await?;

    tracing::debug!(total = summary.total_applications, "computed statistics summary");
    Ok((StatusCode::OK, Json(summary)))
}
