//! Colored Console Output

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
    Debug,
}

pub fn log(level: Level, message: &str) {
    let line = match level {
        Level::Success => message.green(),
        Level::Error => message.red(),
        Level::Warning => message.yellow(),
        Level::Info => message.cyan(),
        Level::Debug => message.dimmed(),
    };
    println!("{line}");
}

pub fn success(message: &str) {
    log(Level::Success, message);
}

pub fn error(message: &str) {
    log(Level::Error, message);
}

pub fn warning(message: &str) {
    log(Level::Warning, message);
}

pub fn info(message: &str) {
    log(Level::Info, message);
}

pub fn debug(message: &str) {
    log(Level::Debug, message);
}
