//! CLI entry point.
//!
//! `followup-buddy [dashboard|recommend|calendar [YYYY MM]|seed] [--user <id>] [--json]`

use chrono::{Datelike, Local};

use followup_buddy::dashboard::{calendar_month, dashboard_stats};
use followup_buddy::db::ContactDb;
use followup_buddy::seed::{seed, SeedOptions};
use followup_buddy::{recommend_for, Recommendation, RecommenderConfig};

const DEFAULT_USER: &str = "evangelist";

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut command: Option<String> = None;
    let mut user = DEFAULT_USER.to_string();
    let mut json = false;
    let mut positional: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--user" => user = args.next().ok_or("--user requires a value")?,
            "--json" => json = true,
            _ if command.is_none() => command = Some(arg),
            _ => positional.push(arg),
        }
    }
    let command = command.unwrap_or_else(|| "dashboard".to_string());

    let config = RecommenderConfig::default();
    let today = Local::now().date_naive();

    match command.as_str() {
        "dashboard" => {
            let db = ContactDb::open()?;
            let stats = dashboard_stats(&db, &user)?;
            let rec = recommend_for(&db, Some(&user), today, &config)?;
            if json {
                let out = serde_json::json!({ "stats": stats, "recommendation": rec });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "Contacts: {} ({} completed)",
                    stats.total_contacts, stats.completed_contacts
                );
                println!("Follow-up visits recorded: {}", stats.total_touches);
                print_recommendation(rec);
            }
        }
        "recommend" => {
            // Pure read: prefer a read-only handle. First run has no database
            // file yet, so fall back to a writable open that creates it.
            let db = match ContactDb::open_readonly() {
                Ok(db) => db,
                Err(_) => ContactDb::open()?,
            };
            let rec = recommend_for(&db, Some(&user), today, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rec)?);
            } else {
                print_recommendation(rec);
            }
        }
        "calendar" => {
            let (year, month) = match positional.as_slice() {
                [] => (today.year(), today.month()),
                [y, m] => (y.parse()?, m.parse()?),
                _ => return Err("usage: calendar [YYYY MM]".into()),
            };
            let db = ContactDb::open()?;
            let cal = calendar_month(&db, &user, year, month)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cal)?);
            } else {
                print_calendar(&cal);
            }
        }
        "seed" => {
            let db = ContactDb::open()?;
            let options = SeedOptions::from_env(&user);
            let summary = seed(&db, &options, today, config.followup_target)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Seeded {} contacts and {} touches for {}{}",
                    summary.created_contacts,
                    summary.created_touches,
                    user,
                    if summary.cleared { " (after clearing)" } else { "" }
                );
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_recommendation(rec: Option<Recommendation>) {
    match rec {
        Some(rec) => {
            println!(
                "Next: visit {} ({} touches so far, last on {}) [{}]",
                rec.contact.name,
                rec.contact.touch_count,
                rec.contact.last_touch_date,
                rec.reason.as_str()
            );
        }
        None => println!("Nothing due today — a good day to start a new contact."),
    }
}

fn print_calendar(cal: &followup_buddy::dashboard::CalendarMonth) {
    println!("{} {}", cal.month_name, cal.year);
    println!("Mo Tu We Th Fr Sa Su");
    let mut line = "   ".repeat(cal.placeholders as usize);
    for cell in &cal.days {
        line.push_str(&format!("{:2}{}", cell.day, if cell.has_touch { "*" } else { " " }));
        if (cal.placeholders + cell.day) % 7 == 0 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.trim().is_empty() {
        println!("{}", line.trim_end());
    }
    println!("(* = follow-up visit recorded)");
}

fn print_usage() {
    println!("Usage: followup-buddy [COMMAND] [--user <id>] [--json]");
    println!();
    println!("Commands:");
    println!("  dashboard          Counters plus today's recommendation (default)");
    println!("  recommend          Print only the recommended next visit");
    println!("  calendar [YYYY MM] Month view with visit markers");
    println!("  seed               Seed synthetic data (SEED_* env vars)");
    println!();
    println!("  --json             Emit machine-readable JSON instead of text");
}
