//! kinecockpit - Clinician cockpit for physical therapy protocol authoring

use anyhow::Result;
use clap::{Parser, Subcommand};

use kinecockpit::library;
use kinecockpit::patients;
use kinecockpit::store::SqliteStore;
use kinecockpit::tui::App;

const DB_PATH: &str = "kinecockpit.db";

#[derive(Parser)]
#[command(name = "kinecockpit")]
#[command(author, version, about = "Cockpit du clinicien - protocoles de réadaptation")]
struct Cli {
    /// Path to the local database file
    #[arg(long, env = "KINECOCKPIT_DB", default_value = DB_PATH)]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the cockpit dashboard
    Tui,

    /// List the exercise catalog with effective parameters
    Exercises {
        /// Filter by name or category
        query: Option<String>,
    },

    /// List the patient roster
    Patients,

    /// Drop the stored catalog and overrides, back to the builtin seed
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = SqliteStore::open(&cli.db)?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(store)?;
            app.run()?;
        }

        Some(Commands::Exercises { query }) => {
            let library = library::load_exercises(&store);
            let edits = library::load_edits(&store);
            let needle = query.map(|q| q.to_lowercase());

            println!("Bibliothèque d'exercices:");
            println!("{:-<72}", "");
            for def in &library {
                if let Some(needle) = &needle
                    && !def.name.to_lowercase().contains(needle)
                        && !def.category.to_lowercase().contains(needle) {
                            continue;
                        }
                let params = library::effective_params(def, &edits);
                let marker = if library::has_override(&def.id, &edits) {
                    " (modifié)"
                } else {
                    ""
                };
                println!(
                    "{} {:30} | {:13} | {}x{} | {}min | {}°-{}° | seuil {}/10{}",
                    def.icon,
                    def.name,
                    def.category,
                    params.sets,
                    params.reps,
                    params.duration,
                    params.rom_min,
                    params.rom_max,
                    params.pain_threshold,
                    marker
                );
            }
        }

        Some(Commands::Patients) => {
            println!("Patients suivis:");
            println!("{:-<72}", "");
            for patient in patients::builtin_patients() {
                println!(
                    "{} | {:18} | {:35} | Jour {:3} | {} {} | Adhésion {}%",
                    patient.id,
                    patient.name,
                    patient.injury_type,
                    patient.post_op_day,
                    patient.status.symbol(),
                    patient.status.label(),
                    patient.adherence_score
                );
            }
        }

        Some(Commands::Reset) => {
            library::reset_library(&store)?;
            println!("Bibliothèque réinitialisée aux exercices par défaut.");
        }
    }

    Ok(())
}
