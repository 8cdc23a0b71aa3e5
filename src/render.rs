// Text tables for the query menu.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::models::employer::Employer;
use crate::models::report::{CompanyVacancyCount, VacancyListing};

const VACANCY_HEADERS: [&str; 5] = ["Company Name", "Job Title", "Salary From", "Salary Up To", "URL"];

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(headers.to_vec());
    table
}

fn salary_cell(bound: Option<Decimal>) -> Cell {
    match bound {
        Some(value) => Cell::new(value.normalize()),
        None => Cell::new(""),
    }
}

pub fn company_counts(rows: &[CompanyVacancyCount]) -> String {
    let mut table = table(&["Company ID", "Company", "Vacancies Count"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(&row.name),
            Cell::new(row.vacancies_count),
        ]);
    }
    table.to_string()
}

pub fn vacancies(rows: &[VacancyListing]) -> String {
    let mut table = table(&VACANCY_HEADERS);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.company_name),
            Cell::new(&row.title),
            salary_cell(row.salary_from),
            salary_cell(row.salary_to),
            Cell::new(&row.url),
        ]);
    }
    table.to_string()
}

pub fn employers(rows: &[Employer]) -> String {
    let mut table = table(&["ID", "Name", "URL"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.id), Cell::new(&row.name), Cell::new(&row.url)]);
    }
    table.to_string()
}

pub fn average_salary(avg: Option<i64>) -> String {
    match avg {
        Some(avg) => format!("Average salary: {avg}"),
        None => "Average salary: no vacancies with a full salary range".to_string(),
    }
}
