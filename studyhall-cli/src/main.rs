use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use studyhall_core::config::Config;
use studyhall_core::core_content::payload::ClassroomDraft;
use studyhall_core::core_model::GlobalRole;
use studyhall_core::core_policy::Actor;
use studyhall_core::{
    init_logging, init_metrics, ClassroomService, ContentSqlStore, LocalFileStore, LogMailer,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "studyhall")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a toml configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Create the content database and apply pending migrations
    Init,

    /// Create a classroom and print its join code
    CreateClassroom {
        /// Classroom name
        name: String,

        /// User id of the facilitator running the class
        #[arg(short, long)]
        facilitator: String,

        /// Unit code, e.g. ALG201
        #[arg(short, long)]
        unit_code: Option<String>,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Print the effective configuration as toml-compatible JSON
    ShowConfig,
}

fn build_service(config: &Config) -> Result<ClassroomService> {
    let store = ContentSqlStore::open(&config.storage.db_path)
        .with_context(|| format!("opening {}", config.storage.db_path.display()))?;
    let files = Arc::new(
        LocalFileStore::new(&config.files.root)
            .with_context(|| format!("preparing {}", config.files.root.display()))?,
    );
    Ok(ClassroomService::new(store, files, Arc::new(LogMailer)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    init_logging(&config.log_config())?;
    init_metrics();

    match args.command {
        Command::Init => {
            build_service(&config)?;
            info!(db = %config.storage.db_path.display(), "content database ready");
        }
        Command::CreateClassroom {
            name,
            facilitator,
            unit_code,
            description,
        } => {
            let service = build_service(&config)?;
            let actor = Actor::new(facilitator, GlobalRole::User);
            let (classroom, _) = service.create_classroom(
                &actor,
                ClassroomDraft {
                    name,
                    unit_code,
                    description,
                },
            )?;
            println!("{}  {}", classroom.code, classroom.name);
        }
        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
