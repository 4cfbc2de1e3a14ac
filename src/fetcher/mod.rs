pub mod runner;
pub mod scanner;

pub use runner::run_scanner;
pub use scanner::{BlockScanner, NewBlockOutcome};
