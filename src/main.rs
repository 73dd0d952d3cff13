//! api-faker - CLI Entry Point

use anyhow::Result;
use api_faker::config::{self, PathSource, Settings, EXAMPLE_SCHEMA};
use api_faker::schema::Schema;
use api_faker::server::{self, AppState, SchemaSource};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "api-faker",
    about = "Schema-driven mock HTTP responder with randomized JSON bodies",
    version
)]
struct Args {
    /// Path to a YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the schema document
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Address to listen on (e.g. "127.0.0.1:8080")
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Where the path to resolve is read from
    #[arg(long, value_enum)]
    path_source: Option<PathSource>,

    /// Load the schema once at startup instead of on every request
    #[arg(long)]
    no_reload: bool,

    /// Report routes without rules at warn level
    #[arg(long)]
    show_warnings: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print an example schema and exit
    #[arg(long)]
    print_schema: bool,

    /// Print the effective settings and exit
    #[arg(long)]
    print_config: bool,

    /// Validate the schema and exit
    #[arg(long)]
    validate: bool,
}

impl Args {
    /// Settings file (or defaults) with command line overrides applied.
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                info!(path = ?path, "Loading settings");
                Settings::from_file(path)?
            }
            None => Settings::default(),
        };

        if let Some(schema) = &self.schema {
            settings.schema = schema.clone();
        }
        if let Some(listen) = self.listen {
            settings.listen = listen;
        }
        if let Some(path_source) = self.path_source {
            settings.path_source = path_source;
        }
        if self.no_reload {
            settings.reload_schema = false;
        }
        if self.show_warnings {
            settings.show_warnings = true;
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn load_schema(settings: &Settings) -> Result<Schema> {
    if !settings.schema.exists() {
        anyhow::bail!("Schema file not found: {:?}", settings.schema);
    }
    info!(path = ?settings.schema, "Loading schema");
    let document = config::read_document(&settings.schema)?;
    let schema = Schema::from_document(&document)?;

    for (pattern, err) in schema.invalid_patterns() {
        warn!(pattern = %pattern, error = %err, "Invalid route pattern");
    }

    Ok(schema)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_schema {
        println!("{}", EXAMPLE_SCHEMA);
        return Ok(());
    }

    let settings = args.settings()?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&settings)?);
        return Ok(());
    }

    if args.validate {
        let schema = load_schema(&settings)?;
        let invalid = schema.invalid_patterns().len();
        if invalid > 0 {
            anyhow::bail!("Schema has {} invalid route pattern(s)", invalid);
        }
        println!(
            "Schema is valid ({} routes, {} rule paths)",
            schema.routes().len(),
            schema.rules().len()
        );
        return Ok(());
    }

    let source = if settings.reload_schema {
        // Requests answer with an error until the schema is fixed.
        if let Err(err) = load_schema(&settings) {
            warn!(error = %err, "Schema is not usable yet");
        }
        SchemaSource::Reload(settings.schema.clone())
    } else {
        SchemaSource::Preloaded(Arc::new(load_schema(&settings)?))
    };

    server::serve(AppState::new(settings, source)).await
}
