use sqlhelper::{cli, config, connect, ConnectOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("sqlhelper=info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, rest) = match args.split_first() {
        // No config argument: fall back to the per-user config file
        Some((first, _)) if cli::is_verb(first) => match config::default_config_path() {
            Some(path) => (path, &args[..]),
            None => {
                eprintln!("No config directory on this platform\n{}", cli::USAGE);
                return ExitCode::FAILURE;
            }
        },
        Some((first, rest)) => (PathBuf::from(first), rest),
        None => {
            eprintln!("{}", cli::USAGE);
            return ExitCode::FAILURE;
        }
    };

    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_filter());

    let command = match cli::parse_command(rest) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = ConnectOptions::from(&config.database);
    info!("Starting sqlhelper against {}", options.database);

    let db = match connect(&options) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli::run(&db, command) {
        Ok(output) => {
            println!("{}", output);
            match db.close() {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
