// Employer and vacancy sources.
// The pipeline only sees the trait; HhClient talks to the real API.

mod client;

pub use client::HhClient;

use async_trait::async_trait;

use crate::models::employer::EmployerRecord;
use crate::models::vacancy::VacancyRecord;

/// Number of vacancies requested per employer. Only the first page is fetched.
pub const VACANCY_PAGE_SIZE: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The API answered with something other than 200.
    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A source of employers and their vacancies.
/// Each call reports its own outcome; callers decide whether a failure
/// skips the record or aborts the run.
#[async_trait]
pub trait VacancySource: Send + Sync {
    async fn fetch_employer(&self, employer_id: &str) -> Result<EmployerRecord, FetchError>;

    async fn fetch_vacancies(&self, employer_id: &str) -> Result<Vec<VacancyRecord>, FetchError>;
}

/// Fetch employers in input order, skipping any the API refuses to return.
/// Transport errors still abort.
pub async fn fetch_employers(
    source: &dyn VacancySource,
    employer_ids: &[String],
) -> Result<Vec<EmployerRecord>, FetchError> {
    let mut employers = Vec::with_capacity(employer_ids.len());
    for employer_id in employer_ids {
        match source.fetch_employer(employer_id).await {
            Ok(employer) => employers.push(employer),
            Err(FetchError::Status { status, .. }) => {
                tracing::warn!("Skipping employer {employer_id}: API returned {status}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(employers)
}
