use anyhow::{Context, Result};
use core_inventory::{
    cli::{Cli, Commands},
    config::{resolve_db_path, side_file_path, DEFAULT_BOXLESS_NAME, DEFAULT_REJECTED_NAME},
    expander::clean_inventory,
    schema::ALL_TABLES,
    store::{CoreStore, WellEntry},
    ui::{SilentUi, UiApp},
    writer::{build_database, generate_create_table, generate_indexes},
};
use std::time::Instant;

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // The full-screen display owns the terminal, keep log lines off it
    let tui = matches!(cli.command, Commands::Build { tui: true, .. });
    init_logging(if tui { "off" } else { "info" });

    match cli.command {
        Commands::Clean {
            input,
            output,
            boxless,
            rejected,
        } => {
            let start = Instant::now();
            let boxless = side_file_path(&output, boxless, DEFAULT_BOXLESS_NAME);
            let rejected = side_file_path(&output, rejected, DEFAULT_REJECTED_NAME);
            let report = clean_inventory(&input, &output, &boxless, &rejected, &mut SilentUi::new())?;

            for failure in &report.failures {
                println!("error: {}", failure);
            }
            for file in &report.empty_files {
                println!("warning: file {} has no boxes", file);
            }
            println!(
                "\nWrote {:?}: {} in {:.1}s",
                output,
                report.summary(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Build {
            cleaned,
            db,
            collection,
            tui,
        } => {
            let start = Instant::now();
            let db_path = resolve_db_path(db)?;

            let report = if tui {
                let mut app = UiApp::new().context("Failed to start terminal UI")?;
                match build_database(&cleaned, &db_path, &collection, &mut app) {
                    Ok(report) => {
                        app.finish(&report.summary())?;
                        report
                    }
                    Err(err) => {
                        app.restore()?;
                        return Err(err);
                    }
                }
            } else {
                build_database(&cleaned, &db_path, &collection, &mut SilentUi::new())?
            };

            for failure in &report.failures {
                println!("{}", failure);
            }
            println!(
                "\nCreated {:?}: {} in {:.1}s",
                db_path,
                report.summary(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Search {
            kind,
            value,
            db,
            json,
        } => {
            let db_path = resolve_db_path(db)?;
            let store = CoreStore::open(&db_path)
                .with_context(|| format!("Failed to open store {:?}", db_path))?;
            let hits = store.search(kind, &value)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("No wells match {} {:?}", kind, value);
            } else {
                for entry in &hits {
                    print_entry(entry);
                }
            }
        }

        Commands::Init { db } => {
            let db_path = resolve_db_path(db)?;
            CoreStore::create(&db_path)
                .with_context(|| format!("Failed to create store {:?}", db_path))?;
            println!("Store ready at {:?}", db_path);
        }

        Commands::Schema => {
            for schema in ALL_TABLES {
                println!("{};", generate_create_table(schema));
                for index in generate_indexes(schema) {
                    println!("{};", index);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn print_entry(entry: &WellEntry) {
    let well = &entry.well;
    println!(
        "API {}  {}  {} #{}",
        well.api,
        well.operator.as_deref().unwrap_or("-"),
        well.lease.as_deref().unwrap_or("-"),
        well.well_num.as_deref().unwrap_or("-"),
    );
    for file in &entry.files {
        println!(
            "  File {} ({}, {} boxes)",
            file.file_num,
            file.sample_type.as_deref().unwrap_or("-"),
            file.box_count.unwrap_or(0)
        );
        for core_box in &file.boxes {
            let depth = |d: Option<f64>| d.map(|v| v.to_string()).unwrap_or_else(|| "?".into());
            println!(
                "    Box {:>5}  {} - {}  {}",
                core_box.box_num,
                depth(core_box.top),
                depth(core_box.bottom),
                core_box.formation.as_deref().unwrap_or("")
            );
        }
    }
}
