use super::impls::deserialize_level_filter;
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf};

/// Destination of the call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    Stdout,
    None,
    /// Appended to, created if missing.
    File(PathBuf),
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json")]
    Json,
}

/// Which optional calls are routed instead of reported as not supported.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[serde(rename = "minimal")]
    Minimal,
    #[default]
    #[serde(rename = "extended")]
    Extended,
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct PartialConfig {
    pub root: Option<String>,
    pub log: Option<String>,
    pub log_format: Option<LogFormat>,
    #[serde(deserialize_with = "deserialize_level_filter", default)]
    pub log_level: Option<log::LevelFilter>,
    pub variant: Option<Variant>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub root: PathBuf,
    pub log: LogSink,
    pub log_format: LogFormat,
    pub log_level: log::LevelFilter,
    pub variant: Variant,
    pub sources: HashMap<String, String>,
}
