#[macro_use] extern crate clap;

#[macro_use]
pub mod graphics;
pub mod app;
pub mod interface;
pub mod logging;
pub mod scene;

use std::process;

use interface::cli;
use logging::{init_logging, LoggingConfig};

fn main() {
    let options = match cli::parse() {
        Ok(options) => options,
        Err(e) => e.exit()
    };

    init_logging(LoggingConfig {
        env_filter: options.log_filter.clone(),
        ..LoggingConfig::default()
    });

    if let Err(e) = app::run(&options.app) {
        log::error!("{}", e);
        process::exit(e.exit_code());
    }
}
