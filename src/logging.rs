/*!

Console logging for the simulator, backed by `log4rs`. Library code only ever talks to the `log`
facade; binaries call [`enable_logging`] once at startup.

*/

use crate::error::SimError;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    Handle,
};
use std::sync::OnceLock;

const LOG_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l})} [{T}] {t} - {m}{n}";

static LOG_HANDLE: OnceLock<Handle> = OnceLock::new();

fn build_config(level: LevelFilter) -> Result<Config, SimError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|error| SimError::config(format!("invalid logging configuration: {error}")))
}

/// Installs the console logger at `level`. Calling it again only changes the level.
pub fn enable_logging(level: LevelFilter) -> Result<(), SimError> {
    if LOG_HANDLE.get().is_some() {
        return set_log_level(level);
    }

    let handle = log4rs::init_config(build_config(level)?)
        .map_err(|error| SimError::config(format!("a logger is already installed: {error}")))?;
    // A concurrent caller may have won the race; its handle is equivalent.
    let _ = LOG_HANDLE.set(handle);
    Ok(())
}

/// Changes the level of an installed logger. Does nothing when logging was never enabled.
pub fn set_log_level(level: LevelFilter) -> Result<(), SimError> {
    if let Some(handle) = LOG_HANDLE.get() {
        handle.set_config(build_config(level)?);
    }
    Ok(())
}

/// Parses a level name such as `info` or `TRACE`.
pub fn parse_level(name: &str) -> Result<LevelFilter, SimError> {
    name.parse::<LevelFilter>()
        .map_err(|_| SimError::config(format!("unknown log level `{name}`")))
}
