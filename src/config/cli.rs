use crate::domain::model::{Gender, VaccinationStatus};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "kidcare")]
#[command(about = "Vaccination schedules and status tracking for children")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "kidcare.toml")]
    pub config: String,

    /// Override the record file from the configuration
    #[arg(long)]
    pub store: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the schedule a child born on DOB would get, without storing it
    Schedule {
        #[arg(long)]
        dob: NaiveDate,
    },
    /// Create and store the vaccination schedule of a child
    Register {
        #[arg(long)]
        child: String,
        #[arg(long)]
        dob: NaiveDate,
        /// Display name; the child id when omitted
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "other", value_parser = parse_gender)]
        gender: Gender,
    },
    /// List the records of a child
    Records {
        #[arg(long)]
        child: String,
        #[arg(long, value_parser = parse_status)]
        status: Option<VaccinationStatus>,
        /// Only doses scheduled in this month (YYYY-MM)
        #[arg(long, value_parser = parse_month)]
        month: Option<(i32, u32)>,
        /// Only doses scheduled on this day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change the status of one record
    Status {
        #[arg(long)]
        record: String,
        #[arg(long, value_parser = parse_status)]
        status: VaccinationStatus,
        /// Id of the acting user, as listed in the configuration
        #[arg(long)]
        user: String,
    },
    /// Mark a record completed with administration details
    Complete {
        #[arg(long)]
        record: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_delimiter = ',')]
        side_effects: Vec<String>,
    },
    /// Complete the earliest scheduled dose of a child
    CompleteNext {
        #[arg(long)]
        child: String,
        #[arg(long)]
        user: String,
    },
    /// Show completed, upcoming and overdue counts; repeat --child for several
    Stats {
        #[arg(long, required = true)]
        child: Vec<String>,
        /// Evaluate as of this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List doses due within the upcoming window
    Upcoming {
        #[arg(long)]
        child: String,
    },
    /// Issue a single-use clinic code for a child
    IssueCode {
        #[arg(long)]
        child: String,
    },
    /// Redeem a clinic code and complete the child's next scheduled dose
    RedeemCode {
        #[arg(long)]
        code: String,
        #[arg(long)]
        user: String,
    },
    /// Write a child's records as CSV
    Export {
        #[arg(long)]
        child: String,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn parse_status(value: &str) -> Result<VaccinationStatus, String> {
    value.parse().map_err(|e: crate::utils::error::ChronicleError| e.to_string())
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    value.parse().map_err(|e: crate::utils::error::ChronicleError| e.to_string())
}

fn parse_month(value: &str) -> Result<(i32, u32), String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got '{}'", value))?;
    Ok((first.year(), first.month()))
}
