use std::env;
use std::io::Write;

use crate::prelude::*;
use console::Style;
use log::Log;
use simplelog::{CombinedLogger, SharedLogger};

/// Environment variable holding the log level filter
pub const LOG_LEVEL_ENV: &str = "PTREE_LOG";

pub const PTREE_U8_COLOR_CODE: u8 = 37; // #00afaf

/// Console logger writing every record to stderr, so that stdout only carries rendered output
pub struct LocalLogger {
    log_level: log::LevelFilter,
}

impl LocalLogger {
    pub fn new() -> Self {
        Self {
            log_level: level_from(env::var(LOG_LEVEL_ENV).ok().as_deref()),
        }
    }
}

impl Default for LocalLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn level_from(value: Option<&str>) -> log::LevelFilter {
    value
        .and_then(|log_level| log_level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info)
}

impl Log for LocalLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.log_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{}", format_record(record));
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Style a log record for the console
fn format_record(record: &log::Record) -> String {
    let error_style = Style::new().for_stderr().red();
    let info_style = Style::new().for_stderr().color256(PTREE_U8_COLOR_CODE);
    let warn_style = Style::new().for_stderr().yellow();
    let debug_style = Style::new().for_stderr().blue().dim();
    let trace_style = Style::new().for_stderr().black().dim();

    match record.level() {
        log::Level::Error => error_style.apply_to(record.args()).to_string(),
        log::Level::Warn => warn_style.apply_to(record.args()).to_string(),
        log::Level::Info => info_style.apply_to(record.args()).to_string(),
        log::Level::Debug => debug_style
            .apply_to(format!("[DEBUG::{}] {}", record.target(), record.args()))
            .to_string(),
        log::Level::Trace => trace_style
            .apply_to(format!("[TRACE::{}] {}", record.target(), record.args()))
            .to_string(),
    }
}

impl SharedLogger for LocalLogger {
    fn level(&self) -> log::LevelFilter {
        self.log_level
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

pub fn get_local_logger() -> Box<dyn SharedLogger> {
    Box::new(LocalLogger::new())
}

pub fn init_local_logger() -> Result<()> {
    CombinedLogger::init(vec![get_local_logger()])?;
    Ok(())
}
