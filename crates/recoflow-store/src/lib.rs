//! Persistence for events, sessions and vocabulary artifacts

mod db;
mod io;
mod paths;
mod vocab;

pub use db::SessionDb;
pub use io::{atomic_write, read_jsonl, write_jsonl};
pub use paths::{Paths, ENV_DATA_DIR};
pub use vocab::{load_vocabulary, save_vocabulary};
