use super::CallRecord;
use crate::config::LogFormat;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Where call records go. Each record is one line.
pub struct CallLog {
    format: LogFormat,
    out: Option<Mutex<Box<dyn Write + Send>>>,
}

impl CallLog {
    pub fn new(format: LogFormat, out: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            out: Some(Mutex::new(out)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            format: LogFormat::Text,
            out: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.out.is_some()
    }

    pub fn emit(&self, record: &CallRecord) {
        let Some(out) = &self.out else {
            return;
        };
        let mut line = match self.format {
            LogFormat::Text => record.to_string(),
            LogFormat::Json => match serde_json::to_string(record) {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Failed to encode {} record: {}", record.call, e);
                    return;
                }
            },
        };
        line.push('\n');

        let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(line.as_bytes()) {
            log::trace!("Dropped {} record: {}", record.call, e);
        }
    }
}
