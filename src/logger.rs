use colored::Colorize;
use log::{LevelFilter, Log, Metadata, Record};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Standard error through the raw `write` system call, which no interposer
/// can see.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStderr;

impl Write for RawStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let ret = unsafe {
            libc::syscall(
                libc::SYS_write,
                libc::STDERR_FILENO,
                buf.as_ptr(),
                buf.len(),
            )
        };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret as usize)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct ShimLogger {
    level: Mutex<LevelFilter>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl ShimLogger {
    pub fn new(level: LevelFilter) -> &'static Self {
        Self::with_output(level, Box::new(RawStderr))
    }

    pub fn with_output(
        level: LevelFilter,
        output: Box<dyn Write + Send>,
    ) -> &'static Self {
        Box::leak(Box::new(Self {
            level: Mutex::new(level),
            output: Mutex::new(output),
        }))
    }

    /// Fails when the host process already installed a logger.
    pub fn init(&'static self) -> Result<&'static Self, log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.level());
        Ok(self)
    }

    pub fn level(&self) -> LevelFilter {
        *self.level.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Log for ShimLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (level_str, color) = match record.level() {
            log::Level::Error => {
                (record.level().to_string(), colored::Color::Red)
            }
            log::Level::Warn => {
                (format!("{} ", record.level()), colored::Color::Yellow)
            }
            log::Level::Info => {
                (format!("{} ", record.level()), colored::Color::White)
            }
            log::Level::Debug => {
                (record.level().to_string(), colored::Color::Blue)
            }
            log::Level::Trace => {
                (record.level().to_string(), colored::Color::BrightBlack)
            }
        };
        let level_str = level_str.color(color);
        let line =
            format!("[{}] {}: {}", level_str, record.target(), record.args())
                .color(color);
        let mut output =
            self.output.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(output, "{}", line);
    }

    fn flush(&self) {
        let _ = self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn emit(logger: &ShimLogger, level: log::Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("bdsim::mount")
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn test_lines_carry_level_and_target() {
        let captured = Captured::default();
        let logger =
            ShimLogger::with_output(LevelFilter::Debug, Box::new(captured.clone()));

        emit(logger, log::Level::Debug, "Mounted /mnt/a with check byte 1");

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("DEBUG"));
        assert!(text.contains("bdsim::mount: Mounted /mnt/a with check byte 1"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_records_above_the_level_are_dropped() {
        let captured = Captured::default();
        let logger =
            ShimLogger::with_output(LevelFilter::Warn, Box::new(captured.clone()));

        emit(logger, log::Level::Trace, "noise");
        assert!(captured.0.lock().unwrap().is_empty());

        *logger.level.lock().unwrap() = LevelFilter::Trace;
        emit(logger, log::Level::Trace, "now visible");
        assert!(!captured.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_raw_stderr_accepts_writes() {
        let mut out = RawStderr;
        assert_eq!(out.write(b"").unwrap(), 0);
        assert!(out.flush().is_ok());
    }
}
