//! Command-line interface.
//!
//! Each subcommand maps onto one ledger operation and returns the text printed to the
//! operator. Dispatch lives here rather than in `main.rs` so it can be exercised against
//! an in-memory database.

use crate::{
    config::club::{load_config, load_default_config},
    core::{
        annual::{AnnualPayment, pay_annual, resolve_annual_amount},
        attendance::{attendance_statistics, find_session_type, format_grid, grid},
        category::reclassify_all,
        import::{format_import_summary, import_attendance, import_payments},
        initializer::{format_initialization_summary, initialize_year},
        member::find_by_membership_number,
        payment::{PaymentMethod, format_statistics_summary, year_statistics},
        settings::{
            get_rate_preset_by_name, list_rate_presets, monthly_rates_from_presets,
            seed_from_config,
        },
    },
    errors::{Error, Result},
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Club dues and attendance ledger
#[derive(Debug, Parser)]
#[command(name = "club-ledger", version, about)]
pub struct Cli {
    /// Path to the club configuration file; `./config.toml` when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Name recorded as the creator of new records
    #[arg(long, global = true, env = "LEDGER_ACTOR", default_value = "cli")]
    pub actor: String,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Ledger operations.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed categories, rate presets and the annual amount from the config file
    Setup,
    /// Create the payment slots of a year for every active member
    InitYear {
        /// Year to initialize
        year: i32,
        /// Rate presets to apply, in order; all stored presets when omitted
        #[arg(long = "preset")]
        presets: Vec<String>,
        /// Flat monthly rate, overriding presets
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Record an annual payment covering twelve months
    PayAnnual {
        /// Membership number of the paying member
        membership_number: i64,
        /// Year of the first covered month
        start_year: i32,
        /// First covered month, 1-12
        start_month: u32,
        /// Amount collected; the configured annual amount when omitted
        #[arg(long)]
        amount: Option<f64>,
        /// cash, card or `bank_transfer`
        #[arg(long, default_value = "cash")]
        method: String,
        /// Payment date, YYYY-MM-DD; today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Import payment history from a CSV file
    ImportPayments {
        /// CSV file with month columns such as `JAN_2025`
        file: PathBuf,
    },
    /// Import attendance history from a CSV file
    ImportAttendance {
        /// CSV file with date columns such as `4-Sep`
        file: PathBuf,
        /// Year the date columns belong to
        #[arg(long)]
        year: i32,
    },
    /// Re-run age-based category classification for every member
    Reclassify {
        /// Reference date, YYYY-MM-DD; today when omitted
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Show the attendance grid of a month
    Grid {
        /// Year
        year: i32,
        /// Month, 1-12
        month: u32,
        /// Only sessions of this type
        #[arg(long)]
        session_type: Option<String>,
    },
    /// Show payment statistics of a year
    Stats {
        /// Year
        year: i32,
    },
}

fn open(path: &Path) -> Result<File> {
    File::open(path)
        .inspect_err(|e| tracing::error!(path = %path.display(), "cannot open import file: {e}"))
        .map_err(Error::from)
}

async fn schedule_for(
    db: &DatabaseConnection,
    presets: &[String],
    rate: Option<f64>,
) -> Result<BTreeMap<u32, f64>> {
    if let Some(rate) = rate {
        return Ok((1..=12).map(|month| (month, rate)).collect());
    }

    let selected = if presets.is_empty() {
        list_rate_presets(db).await?
    } else {
        let mut selected = Vec::with_capacity(presets.len());
        for name in presets {
            let preset = get_rate_preset_by_name(db, name)
                .await?
                .ok_or_else(|| Error::not_found("Rate preset", name))?;
            selected.push(preset);
        }
        selected
    };
    Ok(monthly_rates_from_presets(&selected))
}

/// Runs one command and returns the text to show the operator.
pub async fn run(cli: Cli, db: &DatabaseConnection) -> Result<String> {
    let today = Local::now().date_naive();

    match cli.command {
        Command::Setup => {
            let config = match &cli.config {
                Some(path) => load_config(path)?,
                None => load_default_config()?,
            };
            let summary = seed_from_config(db, &config).await?;
            Ok(format!(
                "Seeded {} categories, {} rate presets{}",
                summary.categories_created,
                summary.presets_saved,
                if summary.annual_amount_set {
                    ", annual amount"
                } else {
                    ""
                }
            ))
        }
        Command::InitYear {
            year,
            presets,
            rate,
        } => {
            let schedule = schedule_for(db, &presets, rate).await?;
            let result = initialize_year(db, year, &schedule, &cli.actor).await?;
            Ok(format_initialization_summary(&result))
        }
        Command::PayAnnual {
            membership_number,
            start_year,
            start_month,
            amount,
            method,
            date,
        } => {
            let member = find_by_membership_number(db, membership_number)
                .await?
                .ok_or_else(|| Error::not_found("Member", membership_number))?;
            let request = AnnualPayment {
                member_id: member.id,
                start_year,
                start_month,
                amount: resolve_annual_amount(db, amount).await?,
                method: method.parse::<PaymentMethod>()?,
                payment_date: date.unwrap_or(today),
            };
            let amount = request.amount;
            let records = pay_annual(db, request, &cli.actor).await?;

            let mut out = format!("Annual payment of {amount:.2} for {}\n", member.name);
            for record in &records {
                let _ = writeln!(
                    out,
                    "  {}-{:02}  {:.2}",
                    record.payment_year,
                    record.payment_month,
                    record.paid_amount.unwrap_or_default()
                );
            }
            Ok(out)
        }
        Command::ImportPayments { file } => {
            let summary = import_payments(db, open(&file)?, &cli.actor).await?;
            Ok(format_import_summary(&summary))
        }
        Command::ImportAttendance { file, year } => {
            let summary = import_attendance(db, open(&file)?, year).await?;
            Ok(format_import_summary(&summary))
        }
        Command::Reclassify { as_of } => {
            let summary = reclassify_all(db, as_of.unwrap_or(today)).await?;
            Ok(format!(
                "Checked {} members, updated {}",
                summary.members_checked, summary.members_updated
            ))
        }
        Command::Grid {
            year,
            month,
            session_type,
        } => {
            let type_id = match session_type {
                Some(name) => Some(
                    find_session_type(db, &name)
                        .await?
                        .ok_or_else(|| Error::not_found("Session type", &name))?
                        .id,
                ),
                None => None,
            };
            let grid = grid(db, year, month, type_id).await?;

            let mut out = format_grid(&grid);
            for stat in attendance_statistics(&grid) {
                let _ = writeln!(
                    out,
                    "{:<24} {:>3}/{:<3} {:>5.1}%",
                    stat.name, stat.attended, stat.sessions, stat.percentage
                );
            }
            Ok(out)
        }
        Command::Stats { year } => {
            let stats = year_statistics(db, year).await?;
            Ok(format_statistics_summary(&stats))
        }
    }
}
