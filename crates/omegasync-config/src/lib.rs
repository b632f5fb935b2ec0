//! # omegasync-config
//!
//! Loads problem and contest declarations from a repository checkout and
//! turns them into validated [`omegasync_core::ResourceConfig`] values.
//!
//! - `problems.json` at the repository root lists every problem and contest
//!   ([`RepositoryIndex`]).
//! - Each problem directory holds `settings.json` plus the files packaged
//!   into its upload archive.
//! - Each contest directory holds `contest.yaml`.

pub mod archive;
mod contest;
mod error;
mod index;
mod problem;
mod scalar;

pub use contest::{CONTEST_FILE, ContestSettings, load_contest};
pub use error::{ConfigError, Result};
pub use index::{INDEX_FILE, IndexEntry, RepositoryIndex};
pub use problem::{ProblemSettings, SETTINGS_FILE, TagSpec, Validator, load_problem};
pub use scalar::Scalar;
