use parking_lot::Mutex;
/// Debug logging infrastructure for par-notes
///
/// Controlled by DEBUG_LEVEL environment variable:
/// - 0 or unset: No debugging
/// - 1: Errors only
/// - 2: Info level (sync, import/export)
/// - 3: Debug level (store mutations)
/// - 4: Trace level (every operation, detailed info)
///
/// All output goes to /tmp/par_notes_debug.log on Unix/macOS,
/// or %TEMP%\par_notes_debug.log on Windows, so CLI output on stdout
/// stays clean.
///
/// `init_log_bridge` also routes the `log` facade into the same file.
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Self {
        match std::env::var("DEBUG_LEVEL") {
            Ok(val) => match val.trim().parse::<u8>() {
                Ok(1) => DebugLevel::Error,
                Ok(2) => DebugLevel::Info,
                Ok(3) => DebugLevel::Debug,
                Ok(4) => DebugLevel::Trace,
                _ => DebugLevel::Off,
            },
            Err(_) => DebugLevel::Off,
        }
    }
}

/// Path of the shared debug log file
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/par_notes_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("par_notes_debug.log")
    }
}

/// Global debug logger
struct DebugLogger {
    level: DebugLevel,
    file: Option<std::fs::File>,
}

impl DebugLogger {
    fn new() -> Self {
        let level = DebugLevel::from_env();
        let file = if level != DebugLevel::Off {
            open_log_file()
        } else {
            None
        };
        let mut logger = DebugLogger { level, file };
        if logger.file.is_some() {
            logger.write_raw(&session_header(&format!("level={:?}", level)));
        }
        logger
    }

    fn ensure_file(&mut self) {
        if self.file.is_none() {
            self.file = open_log_file();
            if self.file.is_some() {
                self.write_raw(&session_header("log bridge"));
            }
        }
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    fn log(&mut self, level: DebugLevel, category: &str, msg: &str) {
        if level <= self.level {
            let level_str = match level {
                DebugLevel::Error => "ERROR",
                DebugLevel::Info => "INFO ",
                DebugLevel::Debug => "DEBUG",
                DebugLevel::Trace => "TRACE",
                DebugLevel::Off => return,
            };
            self.write_raw(&format!(
                "[{}] [{}] [{}] {}\n",
                get_timestamp(),
                level_str,
                category,
                msg
            ));
        }
    }
}

fn open_log_file() -> Option<std::fs::File> {
    // Failing to open the log file must never break the CLI.
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(log_path())
        .ok()
}

fn session_header(detail: &str) -> String {
    format!(
        "\n{}\npar-notes debug session started at {} ({})\n{}\n",
        "=".repeat(80),
        get_timestamp(),
        detail,
        "=".repeat(80)
    )
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new()))
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Check if debugging is enabled at given level
pub fn is_enabled(level: DebugLevel) -> bool {
    let logger = get_logger().lock();
    level <= logger.level
}

/// Log a message at specified level
pub fn log(level: DebugLevel, category: &str, msg: &str) {
    let mut logger = get_logger().lock();
    logger.log(level, category, msg);
}

/// Log formatted message
pub fn logf(level: DebugLevel, category: &str, args: fmt::Arguments) {
    if is_enabled(level) {
        log(level, category, &format!("{}", args));
    }
}

/// `log` facade backend writing to the debug file, optionally mirrored to stderr.
struct LogBridge {
    mirror_stderr: bool,
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        {
            let mut logger = get_logger().lock();
            logger.ensure_file();
            logger.write_raw(&line);
        }
        if self.mirror_stderr {
            eprint!("{}", line);
        }
    }

    fn flush(&self) {}
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

/// Install the `log` facade backend.
///
/// Level precedence: `cli_level`, then `RUST_LOG`, then `config_level`.
/// When `RUST_LOG` is set, records are mirrored to stderr as well.
pub fn init_log_bridge(cli_level: Option<log::LevelFilter>, config_level: log::LevelFilter) {
    let env_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.trim().parse::<log::LevelFilter>().ok());
    let level = cli_level.or(env_level).unwrap_or(config_level);

    let bridge = BRIDGE.get_or_init(|| LogBridge {
        mirror_stderr: env_level.is_some(),
    });
    if log::set_logger(bridge).is_ok() {
        log::set_max_level(level);
    }
}

// Convenience macros for logging
#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Debug, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Trace, $category, format_args!($($arg)*))
    };
}
