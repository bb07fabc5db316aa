use anyhow::Context;
use clap::Parser;
use kidcare_chronicle::domain::model::CompletionDetails;
use kidcare_chronicle::domain::ports::{Clock, IdentityProvider};
use kidcare_chronicle::utils::{logger, validation::Validate};
use kidcare_chronicle::{
    adapters::export, generate_schedule, CheckInDesk, Child, ChronicleConfig, ChronicleError,
    CliArgs, Command, JsonFileRecordStore, LifecycleEngine, RecordFilter, SystemClock,
    TracingNotifier, VaccinationRecord, VaccinationStats,
};
use std::path::Path;
use std::sync::Arc;

type Engine = LifecycleEngine<JsonFileRecordStore, TracingNotifier, SystemClock>;
type Desk = CheckInDesk<JsonFileRecordStore, JsonFileRecordStore, TracingNotifier, SystemClock>;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    if args.json_logs || config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::debug!("Configuration: {:?}", config);

    if let Err(e) = run(args.command, &config).await {
        match e.downcast_ref::<ChronicleError>() {
            Some(chronicle_error) => {
                tracing::error!(
                    "Command failed: {} (category: {:?})",
                    chronicle_error,
                    chronicle_error.category()
                );
                eprintln!("❌ {}", chronicle_error.user_friendly_message());
            }
            None => {
                tracing::error!("Command failed: {:#}", e);
                eprintln!("❌ {:#}", e);
            }
        }
        std::process::exit(1);
    }
}

fn load_config(args: &CliArgs) -> anyhow::Result<ChronicleConfig> {
    let mut config = if Path::new(&args.config).exists() {
        ChronicleConfig::from_file(&args.config)
            .with_context(|| format!("failed to load config file '{}'", args.config))?
    } else {
        ChronicleConfig::default()
    };

    if let Some(store) = &args.store {
        config.store.path = store.clone();
    }

    config.validate().context("configuration validation failed")?;
    Ok(config)
}

fn build_engine(config: &ChronicleConfig) -> anyhow::Result<Engine> {
    let catalog = Arc::new(config.catalog()?);
    let store = JsonFileRecordStore::new(config.store_path());
    Ok(LifecycleEngine::new(store, TracingNotifier, SystemClock, catalog)
        .with_upcoming_window_days(config.upcoming_window_days()))
}

fn build_desk(config: &ChronicleConfig) -> anyhow::Result<Desk> {
    let engine = build_engine(config)?;
    let codes = engine.store().clone();
    Ok(CheckInDesk::new(codes, engine))
}

async fn run(command: Command, config: &ChronicleConfig) -> anyhow::Result<()> {
    let directory = config.directory();

    match command {
        Command::Schedule { dob } => {
            let catalog = config.catalog()?;
            for entry in generate_schedule(dob, catalog.vaccines())? {
                println!(
                    "{}  {:<20} dose {}",
                    entry.scheduled_date.format("%Y-%m-%d"),
                    entry.vaccine_name,
                    entry.dose_number
                );
            }
        }
        Command::Register {
            child,
            dob,
            name,
            gender,
        } => {
            let engine = build_engine(config)?;
            let now = engine.clock().now();
            let name = name.unwrap_or_else(|| child.clone());
            let profile = Child::new(child, name, dob, gender, now);
            let ids = engine.register_profile(&profile).await?;
            println!(
                "✅ Scheduled {} doses for {} (age {})",
                ids.len(),
                profile.name,
                profile.age_description(now.date_naive())
            );
        }
        Command::Records {
            child,
            status,
            month,
            date,
        } => {
            let engine = build_engine(config)?;
            let filter = RecordFilter {
                status,
                month,
                date,
            };
            print_records(&engine.find_records(&child, &filter).await?);
        }
        Command::Status {
            record,
            status,
            user,
        } => {
            let engine = build_engine(config)?;
            let actor = directory.acting_user(&user)?;
            let updated = engine.apply_status_change(&record, status, &actor).await?;
            println!("✅ {} is now {}", updated.id, updated.status);
        }
        Command::Complete {
            record,
            user,
            location,
            batch,
            notes,
            side_effects,
        } => {
            let engine = build_engine(config)?;
            let actor = directory.acting_user(&user)?;
            let details = CompletionDetails {
                location,
                batch_number: batch,
                notes,
                side_effects_reported: side_effects,
            };
            let updated = engine.mark_complete(&record, &actor, details).await?;
            println!(
                "✅ {} dose {} completed by {}",
                updated.vaccine_name, updated.dose_number, actor.display_name
            );
        }
        Command::CompleteNext { child, user } => {
            let engine = build_engine(config)?;
            let actor = directory.acting_user(&user)?;
            match engine.complete_next_scheduled(&child, &actor).await? {
                Some(updated) => println!(
                    "✅ {} dose {} completed",
                    updated.vaccine_name, updated.dose_number
                ),
                None => println!("Nothing left to complete for child {}", child),
            }
        }
        Command::Stats { child, at } => {
            let engine = build_engine(config)?;
            let at = at.unwrap_or_else(|| engine.clock().now());
            let summaries = engine.stats_by_child_at(&child, at).await?;
            for (child_id, summary) in &summaries {
                if summaries.len() > 1 {
                    println!("== {} ==", child_id);
                }
                print_stats(summary);
            }
        }
        Command::Upcoming { child } => {
            let engine = build_engine(config)?;
            print_records(&engine.upcoming(&child).await?);
        }
        Command::IssueCode { child } => {
            let desk = build_desk(config)?;
            let code = desk.issue_code(&child).await?;
            println!("🎫 Clinic code for child {}: {}", child, code.id);
        }
        Command::RedeemCode { code, user } => {
            let desk = build_desk(config)?;
            let actor = directory.acting_user(&user)?;
            let redemption = desk.redeem_code(&code, &actor).await?;
            match redemption.completed {
                Some(updated) => println!(
                    "✅ Checked in child {}: {} dose {} completed",
                    redemption.code.child_id, updated.vaccine_name, updated.dose_number
                ),
                None => println!(
                    "Checked in child {}: nothing left to complete",
                    redemption.code.child_id
                ),
            }
        }
        Command::Export { child, output } => {
            let engine = build_engine(config)?;
            let records = engine.records_for_child(&child).await?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("cannot create '{}'", path))?;
                    export::write_records_csv(&records, file)?;
                    println!("📁 Exported {} records to {}", records.len(), path);
                }
                None => export::write_records_csv(&records, std::io::stdout().lock())?,
            }
        }
    }

    Ok(())
}

fn print_stats(summary: &VaccinationStats) {
    println!("Completed:          {}", summary.completed);
    println!("Upcoming:           {}", summary.upcoming);
    println!("Overdue (by date):  {}", summary.overdue);
    println!("Marked overdue:     {}", summary.persisted_overdue);
    println!("Ongoing:            {}", summary.ongoing);
    println!("Missed:             {}", summary.missed);
    println!("Total:              {}", summary.total);
    println!("Completion:         {:.1}%", summary.completion_percentage());
}

fn print_records(records: &[VaccinationRecord]) {
    if records.is_empty() {
        println!("No vaccination records");
        return;
    }
    for record in records {
        println!(
            "{}  {}  {:<20} dose {}  {}",
            record.id,
            record.scheduled_date.format("%Y-%m-%d"),
            record.vaccine_name,
            record.dose_number,
            record.status
        );
    }
}
