//! Batch colorization of a folder of clips through an external engine that
//! only reports its result by writing a new file into its scratch tree.

pub mod args;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod filename;
pub mod probe;
pub mod processor;
pub mod report;
pub mod scanner;

pub use config::BatchConfig;
pub use error::{ColorizeError, Result};
pub use processor::Processor;

/// Initialize logging; `RUST_LOG` wins over the verbosity flag
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
