//! Subcommand implementations: `run`, `validate`, `info`.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;
