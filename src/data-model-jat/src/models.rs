use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::schema::job_applications;
use crate::validation::{FieldErrors, MAX_TEXT_LEN, Validate, de};

/// A value that isn't one of an enumeration's allowed strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}; expected one of: {allowed}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub allowed: String,
}

/// Defines an enumeration stored as its display string in a text column.
/// The same string is used on the wire (JSON) and in the database.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsExpression,
            FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        allowed: [$($text),+].join(", "),
                    }),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let s = std::str::from_utf8(bytes.as_bytes())?;
                Ok(s.parse::<$name>()?)
            }
        }
    };
}

text_enum! {
    /// Where an application stands overall
    ApplicationStatus ("application status") {
        #[default]
        Applied => "Applied",
        InterviewScheduled => "Interview Scheduled",
        InterviewCompleted => "Interview Completed",
        OfferReceived => "Offer Received",
        Rejected => "Rejected",
        Withdrawn => "Withdrawn",
    }
}

text_enum! {
    /// How far the interview process has progressed
    InterviewStage ("interview stage") {
        /// No interview yet
        #[default]
        NoInterview => "None",
        PhoneScreen => "Phone Screen",
        TechnicalInterview => "Technical Interview",
        HrInterview => "HR Interview",
        FinalRound => "Final Round",
        Onsite => "Onsite",
    }
}

// job_applications table model (database representation)
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = job_applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobApplication {
    pub id: i32,
    pub job_title: String,
    pub company: String,
    pub job_description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_url: Option<String>,
    pub date_applied: NaiveDate,
    pub date_job_posted: Option<NaiveDate>,
    pub application_status: ApplicationStatus,
    pub interview_stage: InterviewStage,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert; `id` is generated by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = job_applications)]
pub struct NewJobApplication {
    pub job_title: String,
    pub company: String,
    pub job_description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_url: Option<String>,
    pub date_applied: NaiveDate,
    pub date_job_posted: Option<NaiveDate>,
    pub application_status: ApplicationStatus,
    pub interview_stage: InterviewStage,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column updates for a partial update. `None` leaves a column untouched;
/// `Some(None)` sets a nullable column to NULL. `updated_at` is always written.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = job_applications)]
pub struct JobApplicationChangeset {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub job_description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub salary: Option<Option<String>>,
    pub job_url: Option<Option<String>>,
    pub date_applied: Option<NaiveDate>,
    pub date_job_posted: Option<Option<NaiveDate>>,
    pub application_status: Option<ApplicationStatus>,
    pub interview_stage: Option<InterviewStage>,
    pub notes: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

// API Payload Types

/// Input payload for POST /api/v1/job-applications
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobApplication {
    pub job_title: String,
    pub company: String,
    pub job_description: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "de::optional_salary")]
    pub salary: Option<String>,
    pub job_url: Option<String>,
    #[serde(deserialize_with = "de::date")]
    pub date_applied: NaiveDate,
    #[serde(default, deserialize_with = "de::optional_date")]
    pub date_job_posted: Option<NaiveDate>,
    #[serde(default)]
    pub application_status: ApplicationStatus,
    #[serde(default)]
    pub interview_stage: InterviewStage,
    pub notes: Option<String>,
}

impl Validate for CreateJobApplication {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new()
            .required_text("job_title", &self.job_title, MAX_TEXT_LEN)
            .required_text("company", &self.company, MAX_TEXT_LEN)
            .optional_long_text("job_description", self.job_description.as_deref())
            .optional_text("location", self.location.as_deref(), MAX_TEXT_LEN)
            .optional_text("salary", self.salary.as_deref(), MAX_TEXT_LEN)
            .optional_url("job_url", self.job_url.as_deref())
            .optional_long_text("notes", self.notes.as_deref())
            .finish()
    }
}

impl CreateJobApplication {
    /// Storage shape of this payload, stamped with `now` as both creation and update time.
    pub fn into_new(self, now: DateTime<Utc>) -> NewJobApplication {
        NewJobApplication {
            job_title: self.job_title.trim().to_string(),
            company: self.company.trim().to_string(),
            job_description: self.job_description,
            location: self.location,
            salary: self.salary,
            job_url: self.job_url,
            date_applied: self.date_applied,
            date_job_posted: self.date_job_posted,
            application_status: self.application_status,
            interview_stage: self.interview_stage,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input payload for PUT /api/v1/job-applications/{id}
///
/// Only supplied fields change. For optional columns an explicit `null` clears the value;
/// for required columns `null` is treated the same as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJobApplication {
    pub job_title: Option<String>,
    pub company: Option<String>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub job_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::nullable_salary")]
    pub salary: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub job_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "de::optional_date")]
    pub date_applied: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::nullable_date")]
    pub date_job_posted: Option<Option<NaiveDate>>,
    pub application_status: Option<ApplicationStatus>,
    pub interview_stage: Option<InterviewStage>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub notes: Option<Option<String>>,
}

impl Validate for UpdateJobApplication {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(job_title) = &self.job_title {
            errors.required_text("job_title", job_title, MAX_TEXT_LEN);
        }
        if let Some(company) = &self.company {
            errors.required_text("company", company, MAX_TEXT_LEN);
        }
        errors
            .optional_long_text("job_description", self.job_description.as_ref().and_then(|v| v.as_deref()))
            .optional_text("location", self.location.as_ref().and_then(|v| v.as_deref()), MAX_TEXT_LEN)
            .optional_text("salary", self.salary.as_ref().and_then(|v| v.as_deref()), MAX_TEXT_LEN)
            .optional_url("job_url", self.job_url.as_ref().and_then(|v| v.as_deref()))
            .optional_long_text("notes", self.notes.as_ref().and_then(|v| v.as_deref()))
            .finish()
    }
}

impl UpdateJobApplication {
    pub fn into_changeset(self, updated_at: DateTime<Utc>) -> JobApplicationChangeset {
        JobApplicationChangeset {
            job_title: self.job_title.map(|v| v.trim().to_string()),
            company: self.company.map(|v| v.trim().to_string()),
            job_description: self.job_description,
            location: self.location,
            salary: self.salary,
            job_url: self.job_url,
            date_applied: self.date_applied,
            date_job_posted: self.date_job_posted,
            application_status: self.application_status,
            interview_stage: self.interview_stage,
            notes: self.notes,
            updated_at,
        }
    }
}

/// The next `updated_at` for a row last touched at `previous`. Never moves backwards,
/// even if the clock does.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous.max(now)
}

/// Columns GET /api/v1/job-applications may sort by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    DateApplied,
    Company,
    JobTitle,
    ApplicationStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Query parameters for GET /api/v1/job-applications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// 1-based page number; overrides `skip` when given
    pub page: Option<i64>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub application_status: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        ListParams {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
            page: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            company: None,
            job_title: None,
            application_status: None,
        }
    }
}

impl Validate for ListParams {
    fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        if self.skip < 0 {
            problems.push(format!("skip must be >= 0 (got {})", self.skip));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            problems.push(format!("limit must be between 1 and {} (got {})", MAX_PAGE_SIZE, self.limit));
        }
        if let Some(page) = self.page
            && page < 1
        {
            problems.push(format!("page must be >= 1 (got {})", page));
        }
        for (name, value) in [
            ("company", &self.company),
            ("job_title", &self.job_title),
            ("application_status", &self.application_status),
        ] {
            if value.as_deref().is_some_and(|v| v.contains('\0')) {
                problems.push(format!("{} must not contain NUL characters", name));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(problems.join("; ")))
        }
    }
}

impl ListParams {
    /// Number of rows to skip. Only meaningful after [`Validate::validate`] succeeded.
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) => (page - 1).saturating_mul(self.limit),
            None => self.skip,
        }
    }

    /// 1-based page number of the returned slice.
    pub fn page_number(&self) -> i64 {
        self.offset() / self.limit + 1
    }

    /// The conjunctive filter these parameters describe. Blank values don't filter.
    ///
    /// Returns `None` when the status filter names no known status: such a filter matches nothing.
    pub fn filter(&self) -> Option<ApplicationFilter> {
        let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from);
        let application_status = match non_blank(&self.application_status) {
            Some(status) => Some(status.parse::<ApplicationStatus>().ok()?),
            None => None,
        };
        Some(ApplicationFilter {
            company: non_blank(&self.company),
            job_title: non_blank(&self.job_title),
            application_status,
        })
    }
}

/// Conjunctive list filter: every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    /// Case-insensitive substring of `company`
    pub company: Option<String>,
    /// Case-insensitive substring of `job_title`
    pub job_title: Option<String>,
    /// Exact `application_status`
    pub application_status: Option<ApplicationStatus>,
}

/// Escapes `%`, `_` and `\` so user input only ever matches literally inside a LIKE pattern,
/// then wraps it for substring matching.
pub fn like_substring_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Response payload for GET /api/v1/job-applications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplicationList {
    pub applications: Vec<JobApplication>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl JobApplicationList {
    pub fn empty(params: &ListParams) -> Self {
        JobApplicationList {
            applications: Vec::new(),
            total: 0,
            page: params.page_number(),
            per_page: params.limit,
        }
    }
}

/// Number of days back from today that count as recent for the statistics summary.
pub const RECENT_DAYS: i64 = 30;

/// Earliest `date_applied` that counts as recent on `today` (inclusive).
pub fn recent_cutoff(today: NaiveDate) -> NaiveDate {
    today - chrono::Duration::days(RECENT_DAYS)
}

/// Response payload for GET /api/v1/job-applications/stats/summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_applications: i64,
    pub status_breakdown: BTreeMap<ApplicationStatus, i64>,
    pub interview_stage_breakdown: BTreeMap<InterviewStage, i64>,
    pub recent_applications: i64,
}

impl StatsSummary {
    /// Builds the summary from grouped counts. Every status and stage is present (zero if
    /// unseen) and the total is the sum of the status counts.
    pub fn from_counts(
        status_counts: impl IntoIterator<Item = (ApplicationStatus, i64)>,
        stage_counts: impl IntoIterator<Item = (InterviewStage, i64)>,
        recent_applications: i64,
    ) -> Self {
        let mut status_breakdown: BTreeMap<ApplicationStatus, i64> =
            ApplicationStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for (status, count) in status_counts {
            *status_breakdown.entry(status).or_insert(0) += count;
        }

        let mut interview_stage_breakdown: BTreeMap<InterviewStage, i64> =
            InterviewStage::ALL.iter().map(|s| (*s, 0)).collect();
        for (stage, count) in stage_counts {
            *interview_stage_breakdown.entry(stage).or_insert(0) += count;
        }

        StatsSummary {
            total_applications: status_breakdown.values().sum(),
            status_breakdown,
            interview_stage_breakdown,
            recent_applications,
        }
    }
}

/// Response payload for GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
