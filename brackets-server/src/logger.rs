use chrono::Local;
use log::{set_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    set_logger(&Logger)?;
    set_max_level(level);

    Ok(())
}

#[derive(Copy, Clone, Debug)]
pub struct Logger;

impl Logger {
    fn format(record: &Record) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");

        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };

        format!(
            "[{}] [{}:{}] [{}] {}",
            now,
            record.file().unwrap_or("???"),
            record.line().unwrap_or(0),
            level,
            record.args()
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{}", Self::format(record));
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::Logger;

    use log::{Level, Record};

    #[test]
    fn test_logger_format() {
        let record = Record::builder()
            .args(format_args!("Created tournament 1"))
            .level(Level::Warn)
            .file(Some("src/store.rs"))
            .line(Some(42))
            .build();

        let line = Logger::format(&record);

        assert!(line.ends_with("[src/store.rs:42] [WARN] Created tournament 1"));
        assert!(line.starts_with('['));
    }
}
