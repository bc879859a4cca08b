//! Application layer shared by the CLI and any other front end.
//!
//! - [`presets`]: the classic loops as plain records
//! - [`study`]: comparison, tuning and identification studies, with
//!   independent runs executed in parallel
//! - [`study_file`]: YAML study files with validation

pub mod error;
pub mod presets;
pub mod study;
pub mod study_file;

pub use error::{AppError, AppResult};
pub use study::{
    ComparisonStudy, IdentificationOutcome, IdentificationStudy, NamedGains, NamedScenario,
    NamedTarget, RunOutcome, Study, StudyOutcome, TuningOutcome, TuningStudy, run_comparison,
    run_identification, run_study, run_tuning,
};
pub use study_file::{StudyFile, load_yaml, save_yaml, to_json};
