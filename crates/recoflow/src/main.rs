mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use recoflow_store::Paths;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sessionize {
            events,
            timeout,
            out,
            db,
            persist,
        } => {
            let db = match db {
                Some(path) => Some(path),
                None if persist => Some(Paths::new()?.sessions_db()),
                None => None,
            };
            commands::sessionize::run(&config, &events, timeout, out.as_deref(), db.as_deref())
        }
        Commands::Features { sessions, out } => {
            commands::features::run(&sessions, out.as_deref())
        }
        Commands::Interactions {
            sessions,
            out,
            vocab,
            bm25,
        } => {
            let vocab = match vocab {
                Some(path) => path,
                None => Paths::new()?.vocabulary_file(),
            };
            commands::interactions::run(&config, &sessions, out.as_deref(), Some(&vocab), bm25)
        }
        Commands::Sequences {
            sessions,
            vocab,
            max_len,
            out,
        } => {
            let vocab = match vocab {
                Some(path) => path,
                None => Paths::new()?.vocabulary_file(),
            };
            commands::sequences::run(&config, &sessions, &vocab, max_len, out.as_deref())
        }
        Commands::Popularity {
            sessions,
            products,
            by_category,
            top_k,
        } => commands::popularity::run(
            &config,
            &sessions,
            products.as_deref(),
            by_category,
            top_k,
        ),
        Commands::Recommend {
            sessions,
            products,
            user,
            top_k,
        } => commands::recommend::run(&config, &sessions, products.as_deref(), &user, top_k),
        Commands::Evaluate {
            sessions,
            products,
            k,
            sample,
            holdout_ratio,
        } => commands::evaluate::run(
            &config,
            &sessions,
            products.as_deref(),
            k,
            sample,
            holdout_ratio,
        ),
        Commands::Version => commands::version::run(),
    }
}
