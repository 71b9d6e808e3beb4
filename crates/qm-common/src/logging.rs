use std::panic;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Output format for the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging settings read from the environment.
///
/// - `QM_LOG_DIR`: write to `<dir>/<app>.log` with daily rotation instead of stdout
/// - `QM_LOG_FORMAT`: `json` for structured output, anything else for text
/// - `QM_LOG_INCLUDE_BACKTRACE`: also run the default panic hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub include_backtrace: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let format = match std::env::var("QM_LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let include_backtrace = std::env::var("QM_LOG_INCLUDE_BACKTRACE")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            dir: std::env::var_os("QM_LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            format,
            include_backtrace,
        }
    }
}

/// Install a global panic hook that logs panics through `tracing` with file/line
/// context. Safe to call multiple times; the hook is installed once per process.
pub fn install_tracing_panic_hook(app_name: &'static str, include_backtrace: bool) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let thread_name = thread.name().unwrap_or("unknown");

            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload not string".into());

            tracing::error!(
                application = app_name,
                %thread_name,
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic captured"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

fn rotating_file_writer(app_name: &'static str, dir: &Path) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("failed to create QM_LOG_DIR {}: {err}; falling back to stdout", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Initialize the global subscriber and panic hook from `LogConfig::from_env`.
///
/// Uses `RUST_LOG` for filtering if present, `info` otherwise. Calling it twice is harmless.
pub fn init_tracing_subscriber(app_name: &'static str) -> LogConfig {
    let config = LogConfig::from_env();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = config
        .dir
        .as_ref()
        .and_then(|dir| rotating_file_writer(app_name, dir))
        .unwrap_or_else(|| BoxMakeWriter::new(std::io::stdout));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer);

    match config.format {
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
        LogFormat::Text => {
            let _ = builder.try_init();
        }
    }

    install_tracing_panic_hook(app_name, config.include_backtrace);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        use std::sync::Mutex;
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap();

        let prev: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                match value {
                    Some(v) => unsafe { std::env::set_var(key, v) },
                    None => unsafe { std::env::remove_var(key) },
                }
                (key.to_string(), previous)
            })
            .collect();

        f();

        for (key, previous) in prev {
            if let Some(v) = previous {
                unsafe { std::env::set_var(&key, v) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }

    #[test]
    fn defaults_to_text_on_stdout() {
        with_env(
            &[
                ("QM_LOG_DIR", None),
                ("QM_LOG_FORMAT", None),
                ("QM_LOG_INCLUDE_BACKTRACE", None),
            ],
            || {
                let config = LogConfig::from_env();
                assert_eq!(config.dir, None);
                assert_eq!(config.format, LogFormat::Text);
                assert!(!config.include_backtrace);
            },
        );
    }

    #[test]
    fn reads_env_overrides() {
        with_env(
            &[
                ("QM_LOG_DIR", Some("/tmp/qm-logs")),
                ("QM_LOG_FORMAT", Some("JSON")),
                ("QM_LOG_INCLUDE_BACKTRACE", Some("true")),
            ],
            || {
                let config = LogConfig::from_env();
                assert_eq!(config.dir, Some(PathBuf::from("/tmp/qm-logs")));
                assert_eq!(config.format, LogFormat::Json);
                assert!(config.include_backtrace);
            },
        );
    }
}
