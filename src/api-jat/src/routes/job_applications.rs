use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use data_model_jat::db::DbPool;
use data_model_jat::errors::ApiError;
use data_model_jat::models::{
    ApplicationFilter, CreateJobApplication, JobApplication, JobApplicationList, ListParams, SortField, SortOrder,
    UpdateJobApplication, like_substring_pattern, next_updated_at,
};
use data_model_jat::schema::job_applications;
use data_model_jat::validation::Validate;

use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};

type BoxedApplicationQuery = job_applications::BoxedQuery<'static, Pg>;

/// All job applications matching every present field of `filter`.
///
/// Substring filters are case-insensitive (ILIKE) with LIKE wildcards in the input escaped.
pub fn filtered_query(filter: &ApplicationFilter) -> BoxedApplicationQuery {
    let mut query = job_applications::table.into_boxed();
    if let Some(company) = &filter.company {
        query = query.filter(job_applications::company.ilike(like_substring_pattern(company)));
    }
    if let Some(job_title) = &filter.job_title {
        query = query.filter(job_applications::job_title.ilike(like_substring_pattern(job_title)));
    }
    if let Some(status) = filter.application_status {
        query = query.filter(job_applications::application_status.eq(status));
    }
    query
}

/// Orders by `$column` in `$order`, breaking ties by id in the same direction so pages are stable.
macro_rules! order_by {
    ($query:expr, $column:expr, $order:expr) => {
        match $order {
            SortOrder::Asc => $query.order($column.asc()).then_order_by(job_applications::id.asc()),
            SortOrder::Desc => $query.order($column.desc()).then_order_by(job_applications::id.desc()),
        }
    };
}

/// Applies the allow-listed sort. Only columns named by [`SortField`] can reach ORDER BY.
pub fn sorted_query(query: BoxedApplicationQuery, sort_by: SortField, sort_order: SortOrder) -> BoxedApplicationQuery {
    match sort_by {
        SortField::CreatedAt => order_by!(query, job_applications::created_at, sort_order),
        SortField::DateApplied => order_by!(query, job_applications::date_applied, sort_order),
        SortField::Company => order_by!(query, job_applications::company, sort_order),
        SortField::JobTitle => order_by!(query, job_applications::job_title, sort_order),
        SortField::ApplicationStatus => order_by!(query, job_applications::application_status, sort_order),
    }
}

/// Ids are `SERIAL`, so an integer outside `i32` names no job application.
fn row_id(id: i64) -> Result<i32, ApiError> {
    i32::try_from(id).map_err(|_| ApiError::not_found(id))
}

/// Gets one job application, or [`ApiError::NotFound`] naming the id.
pub async fn find_application(conn: &mut AsyncPgConnection, id: i32) -> Result<JobApplication, ApiError> {
    job_applications::table
        .find(id)
        .select(JobApplication::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found(id))
}

/// POST /api/v1/job-applications - Create a job application
pub async fn create_application(
    State(pool): State<DbPool>,
    ApiJson(payload): ApiJson<CreateJobApplication>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let new_application = payload.into_new(Utc::now());

    let mut conn = pool.get().await?;
    let created = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let created: JobApplication = diesel::insert_into(job_applications::table)
                    .values(&new_application)
                    .returning(JobApplication::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(created)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(id = created.id, company = %created.company, "created job application");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/job-applications - List job applications with filtering, sorting and pagination
pub async fn list_applications(
    State(pool): State<DbPool>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    params.validate()?;

    let Some(filter) = params.filter() else {
        tracing::debug!(status = ?params.application_status, "status filter names no known status");
        return Ok((StatusCode::OK, Json(JobApplicationList::empty(&params))));
    };

    let offset = params.offset();
    let limit = params.limit;
    let (sort_by, sort_order) = (params.sort_by, params.sort_order);

    let mut conn = pool.get().await?;
    let (applications, total) = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let total: i64 = filtered_query(&filter).count().get_result(conn).await?;
                let applications: Vec<JobApplication> = sorted_query(filtered_query(&filter), sort_by, sort_order)
                    .offset(offset)
                    .limit(limit)
                    .select(JobApplication::as_select())
                    .load(conn)
                    .await?;
                Ok((applications, total))
            }
            .scope_boxed()
        })
        .await?;

    tracing::debug!(total, returned = applications.len(), offset, limit, "listed job applications");
    Ok((
        StatusCode::OK,
        Json(JobApplicationList {
            applications,
            total,
            page: params.page_number(),
            per_page: limit,
        }),
    ))
}

/// GET /api/v1/job-applications/{id} - Get one job application
pub async fn get_application(
    State(pool): State<DbPool>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let id = row_id(id)?;
    let mut conn = pool.get().await?;
    let application = find_application(&mut conn, id).await?;
    Ok((StatusCode::OK, Json(application)))
}

/// PUT /api/v1/job-applications/{id} - Partially update a job application
///
/// The row is locked while the changes are merged, and `updated_at` never moves backwards.
pub async fn update_application(
    State(pool): State<DbPool>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateJobApplication>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let id = row_id(id)?;

    let mut conn = pool.get().await?;
    let updated = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let current: JobApplication = job_applications::table
                    .find(id)
                    .select(JobApplication::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| ApiError::not_found(id))?;

                let changeset = payload.into_changeset(next_updated_at(current.updated_at, Utc::now()));
                let updated: JobApplication = diesel::update(job_applications::table.find(id))
                    .set(&changeset)
                    .returning(JobApplication::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(updated)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(id, "updated job application");
    Ok((StatusCode::OK, Json(updated)))
}

/// DELETE /api/v1/job-applications/{id} - Delete a job application
///
/// Deleting an id that doesn't exist (including one already deleted) is a NotFound error.
pub async fn delete_application(
    State(pool): State<DbPool>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    let id = row_id(id)?;
    let mut conn = pool.get().await?;
    conn.transaction::<_, ApiError, _>(|conn| {
        async move {
            let deleted = diesel::delete(job_applications::table.find(id)).execute(conn).await?;
            if deleted == 0 {
                return Err(ApiError::not_found(id));
            }
            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!(id, "deleted job application");
    Ok(StatusCode::NO_CONTENT)
}
