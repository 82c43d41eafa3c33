//! Logger initialization: a colorized [`env_logger`] formatter matching the
//! density `setforge`'s crates log at (`warn!`/`error!` on fallback paths,
//! `debug!`/`trace!` on the happy path), plus an uptime clock for the
//! formatter to stamp each line with.

use std::io::Write;
use std::time::Instant;

use log::info;
use once_cell::sync::Lazy;

/// The instant logging was initialized, used to stamp each line with
/// seconds-since-start rather than a wall-clock timestamp.
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

#[must_use]
pub fn uptime() -> u64 {
    INIT_INSTANT.elapsed().as_secs()
}

/// Initializes the logger.
///
/// If `RUST_LOG` is unset, defaults to `off,setforge={filter}` so dependency
/// crates stay quiet unless the caller opts in explicitly.
///
/// # Panics
/// Must only be called once; a second call panics inside `env_logger`.
pub fn init_logger(filter: log::LevelFilter) {
    let now = Lazy::force(&INIT_INSTANT);

    let env = match std::env::var("RUST_LOG") {
        Ok(e) => {
            std::env::set_var("RUST_LOG", &e);
            e
        }
        Err(_) => {
            std::env::set_var("RUST_LOG", format!("off,setforge={filter}"));
            String::new()
        }
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            let mut style = buf.style();
            let level = match record.level() {
                log::Level::Debug => {
                    style.set_color(env_logger::fmt::Color::Blue);
                    "D"
                }
                log::Level::Trace => {
                    style.set_color(env_logger::fmt::Color::Magenta);
                    "T"
                }
                log::Level::Info => {
                    style.set_color(env_logger::fmt::Color::White);
                    "I"
                }
                log::Level::Warn => {
                    style.set_color(env_logger::fmt::Color::Yellow);
                    "W"
                }
                log::Level::Error => {
                    style.set_color(env_logger::fmt::Color::Red);
                    "E"
                }
            };
            writeln!(
                buf,
                "| {} | {: >9.3} | {: >30} @ {: <3} | {}",
                style.set_bold(true).value(level),
                buf.style().set_dimmed(true).value(now.elapsed().as_secs_f32()),
                buf.style().set_dimmed(true).value(record.file_static().unwrap_or("???")),
                buf.style().set_dimmed(true).value(record.line().unwrap_or(0)),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Always)
        .parse_default_env()
        .init();

    if env.is_empty() {
        info!("Log Level (Flag) ... {filter}");
    } else {
        info!("Log Level (RUST_LOG) ... {env}");
    }
}

#[cfg(test)]
mod tests {
    use super::uptime;

    #[test]
    fn uptime_is_monotonic_nonnegative() {
        let a = uptime();
        let b = uptime();
        assert!(b >= a);
    }
}
