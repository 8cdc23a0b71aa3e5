use std::collections::HashSet;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sqlx::PgConnection;

use crate::config::DbSettings;
use crate::db::{self, schema};
use crate::error::AppError;
use crate::hh::{self, FetchError, VacancySource};
use crate::models::employer::{Employer, EmployerRecord, LoadSummary};
use crate::models::vacancy::{Vacancy, VacancyRecord};

/// Everything fetched in one run, in load order.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub employers: Vec<EmployerRecord>,
    /// Vacancies keyed by employer id, one entry per distinct fetched employer.
    pub vacancies: Vec<(String, Vec<VacancyRecord>)>,
}

impl Snapshot {
    pub fn vacancy_count(&self) -> usize {
        self.vacancies.iter().map(|(_, items)| items.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub employers: LoadSummary,
    pub vacancies: u64,
}

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// A spinner that keeps animating while the awaited call is in flight.
fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(SPINNER_TICK);
    spinner
}

/// Fetch employers, then the first page of vacancies for each employer that
/// came back. A refused employer is skipped; a refused vacancy list aborts.
pub async fn collect(
    source: &dyn VacancySource,
    employer_ids: &[String],
) -> Result<Snapshot, FetchError> {
    let spinner = spinner(format!("Fetching {} employers...", employer_ids.len()));
    let employers = hh::fetch_employers(source, employer_ids).await;
    spinner.finish_and_clear();
    let employers = employers?;
    tracing::info!("Fetched {} of {} employers", employers.len(), employer_ids.len());

    let distinct: Vec<String> = {
        let mut seen = HashSet::new();
        employers
            .iter()
            .filter(|e| seen.insert(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect()
    };

    let bar = ProgressBar::new(distinct.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Fetching vacancies");

    let mut vacancies = Vec::with_capacity(distinct.len());
    for employer_id in distinct {
        let items = match source.fetch_vacancies(&employer_id).await {
            Ok(items) => items,
            Err(e) => {
                bar.abandon();
                tracing::error!("Fetching vacancies for employer {employer_id} failed: {e}");
                return Err(e);
            }
        };
        tracing::debug!("Employer {employer_id}: {} vacancies", items.len());
        vacancies.push((employer_id, items));
        bar.inc(1);
    }
    bar.finish_and_clear();

    let snapshot = Snapshot { employers, vacancies };
    tracing::info!("Fetched {} vacancies", snapshot.vacancy_count());
    Ok(snapshot)
}

/// Load a snapshot over one connection: employers first, then vacancies.
pub async fn store(conn: &mut PgConnection, snapshot: &Snapshot) -> Result<LoadReport, AppError> {
    let employers = Employer::load(conn, &snapshot.employers).await?;
    tracing::info!(
        "Loaded employers: {} new, {} already present",
        employers.inserted,
        employers.skipped
    );

    let vacancies = Vacancy::load(conn, &snapshot.vacancies).await?;
    tracing::info!("Loaded {vacancies} vacancies");

    Ok(LoadReport { employers, vacancies })
}

/// Full run: fetch everything, prepare the schema, then load.
/// Fetching happens before the reset so a failed fetch leaves the old data in place.
pub async fn run(
    source: &dyn VacancySource,
    employer_ids: &[String],
    settings: &DbSettings,
    skip_reset: bool,
) -> Result<LoadReport, AppError> {
    let snapshot = collect(source, employer_ids).await?;

    if skip_reset {
        tracing::info!("Keeping existing tables");
    } else {
        schema::reset_database(settings).await?;
    }
    schema::migrate_database(settings).await?;

    let mut conn = db::connect(settings).await?;
    let result = store(&mut conn, &snapshot).await;
    db::release(conn, result).await
}
