use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recoflow")]
#[command(version)]
#[command(about = "Session reconstruction and blended recommendations")]
pub struct Cli {
    /// JSON config file; RECOFLOW_* environment overrides apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Group raw events (JSONL) into sessions
    Sessionize {
        /// Raw event JSONL
        #[arg(short, long)]
        events: PathBuf,

        /// Inactivity timeout in seconds
        #[arg(long)]
        timeout: Option<i64>,

        /// Session JSONL output (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also upsert sessions into this SQLite store
        #[arg(long)]
        db: Option<PathBuf>,

        /// Upsert into the data directory's session store when --db is omitted
        #[arg(long)]
        persist: bool,
    },

    /// Per-session feature rows
    Features {
        /// Session JSONL
        #[arg(short, long)]
        sessions: PathBuf,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Weighted interaction records
    Interactions {
        #[arg(short, long)]
        sessions: PathBuf,

        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Vocabulary artifact to extend; defaults to the data directory
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Emit BM25-weighted matrix cells instead of raw records
        #[arg(long)]
        bm25: bool,
    },

    /// Next-item training examples from viewed items
    Sequences {
        #[arg(short, long)]
        sessions: PathBuf,

        /// Vocabulary artifact for item tokens; defaults to the data directory
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Input length; overrides the configured sequence length
        #[arg(long)]
        max_len: Option<usize>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Most popular items by accumulated weight
    Popularity {
        #[arg(short, long)]
        sessions: PathBuf,

        /// Product catalog JSONL carrying categories
        #[arg(short, long)]
        products: Option<PathBuf>,

        /// Rank within each catalog category
        #[arg(long)]
        by_category: bool,

        #[arg(long)]
        top_k: Option<i64>,
    },

    /// Blended recommendations for one user
    Recommend {
        #[arg(short, long)]
        sessions: PathBuf,

        /// Product catalog JSONL for content similarity
        #[arg(short, long)]
        products: Option<PathBuf>,

        #[arg(short, long)]
        user: String,

        #[arg(long)]
        top_k: Option<i64>,
    },

    /// Precision/recall on a chronological holdout
    Evaluate {
        #[arg(short, long)]
        sessions: PathBuf,

        #[arg(short, long)]
        products: Option<PathBuf>,

        #[arg(short, default_value_t = 10)]
        k: usize,

        /// Evaluate at most this many holdout sessions
        #[arg(long)]
        sample: Option<usize>,

        /// Fraction of sessions (latest first) held out for scoring
        #[arg(long, default_value_t = 0.2)]
        holdout_ratio: f64,
    },

    /// Print version information
    Version,
}
