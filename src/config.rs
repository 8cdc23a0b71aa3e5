use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::AppError;

/// Employers loaded when no `--employer` is given.
pub const DEFAULT_EMPLOYER_IDS: [&str; 10] = [
    "1740",    // Yandex
    "3529",    // Sber
    "64174",   // 2GIS
    "2180",    // Ozon
    "15478",   // VK
    "3776",    // MTS
    "8620",    // Rambler
    "3529",    // Sber, listed twice on purpose
    "78638",   // Tinkoff
    "1440683", // RUTUBE
];

#[derive(Parser, Debug, Clone)]
#[command(name = "vacancydb", about = "Load hh.ru vacancies into PostgreSQL and query them")]
pub struct Config {
    /// INI file holding the database section
    #[arg(long = "config", env = "VACANCYDB_CONFIG", default_value = "database.ini")]
    pub config_file: PathBuf,

    /// Section of the INI file with connection parameters
    #[arg(long, default_value = "postgresql")]
    pub section: String,

    /// Database connection URL, takes precedence over the INI file
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base URL of the hh.ru API
    #[arg(long, env = "HH_API_URL", default_value = "https://api.hh.ru")]
    pub api_url: String,

    /// User-Agent sent to the API (hh.ru rejects anonymous clients)
    #[arg(long, env = "HH_USER_AGENT", default_value = "vacancydb/0.1 (vacancydb@example.com)")]
    pub user_agent: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub http_connect_timeout_secs: u64,

    /// Database connect timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "5")]
    pub connect_timeout_secs: u64,

    /// Server-side statement timeout in seconds
    #[arg(long, env = "STATEMENT_TIMEOUT_SECS", default_value = "30")]
    pub statement_timeout_secs: u64,

    /// Employer ids to load (repeat or separate with commas)
    #[arg(long = "employer", value_delimiter = ',', default_values = DEFAULT_EMPLOYER_IDS)]
    pub employer_ids: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load data and then open the menu (default when no subcommand given)
    Run,
    /// Fetch employers and vacancies and load them into a fresh schema
    Load {
        /// Keep existing tables and only apply the column migration
        #[arg(long)]
        skip_reset: bool,
    },
    /// Open the interactive query menu over already loaded data
    Menu,
}

impl Config {
    /// Resolve the command, defaulting to Run if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn http_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http_connect_timeout_secs)
    }

    /// Database settings from `--database-url` when set, otherwise from the INI section.
    pub fn db_settings(&self) -> Result<DbSettings, AppError> {
        let connect = match &self.database_url {
            Some(url) => url.parse::<PgConnectOptions>()?,
            None => ConnectionParams::from_ini(&self.config_file, &self.section)?.connect_options(),
        };
        Ok(DbSettings {
            connect,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            statement_timeout: Duration::from_secs(self.statement_timeout_secs),
        })
    }
}

/// Everything needed to open a database connection.
#[derive(Debug, Clone)]
pub struct DbSettings {
    pub connect: PgConnectOptions,
    pub connect_timeout: Duration,
    pub statement_timeout: Duration,
}

/// Connection parameters as written in the INI section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "dbname")]
    pub database: Option<String>,
}

impl ConnectionParams {
    pub fn from_ini(file: &std::path::Path, section: &str) -> Result<Self, AppError> {
        let source = config::Config::builder()
            .add_source(config::File::from(file).format(config::FileFormat::Ini))
            .build()?;

        let missing = || AppError::MissingSection {
            section: section.to_string(),
            file: file.display().to_string(),
        };
        match source.get::<ConnectionParams>(section) {
            Ok(params) => Ok(params),
            Err(config::ConfigError::NotFound(_)) => Err(missing()),
            Err(e) => Err(e.into()),
        }
    }

    /// Unset fields fall back to libpq defaults and `PG*` environment variables.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut opts = PgConnectOptions::new();
        if let Some(host) = &self.host {
            opts = opts.host(host);
        }
        if let Some(port) = self.port {
            opts = opts.port(port);
        }
        if let Some(user) = &self.user {
            opts = opts.username(user);
        }
        if let Some(password) = &self.password {
            opts = opts.password(password);
        }
        if let Some(database) = &self.database {
            opts = opts.database(database);
        }
        opts
    }
}
