//! Pipeline entry points for calendar operations.
//!
//! - `run_generate`: Fetch pages and write the calendar
//! - `run_validate`: Check a configuration file
//! - `run_check`: Check an existing calendar file

pub mod filter;
pub mod generate;
pub mod validate;

pub use filter::upcoming;
pub use generate::{GenerateOutcome, GenerateStats, generate_calendar, run_generate};
pub use validate::{run_check, run_validate};
