// Interactive query menu.
// Prompts block, so they run on the blocking pool; queries run one at a time
// on the session's connection.

use anyhow::Result;
use dialoguer::Input;
use sqlx::PgConnection;

use crate::db::Session;
use crate::error::AppError;
use crate::models::employer::Employer;
use crate::models::report::{CompanyVacancyCount, VacancyListing};
use crate::render;

const MENU: &str = "
1 - Companies and vacancy counts
2 - All vacancies
3 - Average salary
4 - Vacancies with salary above average
5 - Search vacancies by keyword
6 - Vacancies of a company by ID
7 - All employers
0 - Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    CompanyCounts,
    AllVacancies,
    AverageSalary,
    AboveAverage,
    Keyword,
    ByEmployer,
    Employers,
}

impl MenuChoice {
    /// Anything other than a listed number is not a choice.
    pub fn parse(input: &str) -> Option<Self> {
        let choice = match input.trim() {
            "0" => MenuChoice::Exit,
            "1" => MenuChoice::CompanyCounts,
            "2" => MenuChoice::AllVacancies,
            "3" => MenuChoice::AverageSalary,
            "4" => MenuChoice::AboveAverage,
            "5" => MenuChoice::Keyword,
            "6" => MenuChoice::ByEmployer,
            "7" => MenuChoice::Employers,
            _ => return None,
        };
        Some(choice)
    }
}

/// A fully specified query, parameters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    CompanyCounts,
    AllVacancies,
    AverageSalary,
    AboveAverage,
    Keyword(String),
    ByEmployer(String),
    Employers,
}

/// Run a query and render its result.
pub async fn execute(conn: &mut PgConnection, query: &Query) -> Result<String, AppError> {
    let out = match query {
        Query::CompanyCounts => render::company_counts(&CompanyVacancyCount::list(conn).await?),
        Query::AllVacancies => render::vacancies(&VacancyListing::all(conn).await?),
        Query::AverageSalary => render::average_salary(VacancyListing::average_salary(conn).await?),
        Query::AboveAverage => render::vacancies(&VacancyListing::above_average(conn).await?),
        Query::Keyword(keyword) => render::vacancies(&VacancyListing::matching(conn, keyword).await?),
        Query::ByEmployer(id) => render::vacancies(&VacancyListing::by_employer(conn, id).await?),
        Query::Employers => render::employers(&Employer::list(conn).await?),
    };
    Ok(out)
}

async fn prompt_text(prompt: &'static str, allow_empty: bool) -> Result<String> {
    let text = tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(allow_empty)
            .interact_text()
    })
    .await??;
    Ok(text)
}

async fn prompt_employer_id() -> Result<String> {
    let id = tokio::task::spawn_blocking(|| {
        Input::<u64>::new()
            .with_prompt("Company ID")
            .interact_text()
    })
    .await??;
    Ok(id.to_string())
}

async fn query_for(choice: MenuChoice) -> Result<Option<Query>> {
    let query = match choice {
        MenuChoice::Exit => return Ok(None),
        MenuChoice::CompanyCounts => Query::CompanyCounts,
        MenuChoice::AllVacancies => Query::AllVacancies,
        MenuChoice::AverageSalary => Query::AverageSalary,
        MenuChoice::AboveAverage => Query::AboveAverage,
        MenuChoice::Keyword => Query::Keyword(prompt_text("Keyword", false).await?),
        MenuChoice::ByEmployer => Query::ByEmployer(prompt_employer_id().await?),
        MenuChoice::Employers => Query::Employers,
    };
    Ok(Some(query))
}

async fn menu_loop(session: &mut Session) -> Result<()> {
    loop {
        println!("{MENU}");
        let input = prompt_text("Choose an option", true).await?;
        let Some(choice) = MenuChoice::parse(&input) else {
            continue;
        };
        let Some(query) = query_for(choice).await? else {
            println!("Goodbye!");
            return Ok(());
        };

        match execute(session.conn(), &query).await {
            Ok(out) => println!("{out}"),
            Err(e) => {
                tracing::error!("Query {query:?} failed: {e}");
                println!("Query failed: {e}");
            }
        }
    }
}

/// Run the menu until the user exits, then close the session.
pub async fn run(mut session: Session) -> Result<()> {
    let result = menu_loop(&mut session).await;
    let closed = session.close().await;
    result?;
    closed?;
    Ok(())
}
