use super::structs::{LogFormat, LogSink, Variant};

use serde::Deserialize;
use std::{
    fmt::{self, Display},
    path::PathBuf,
    str::FromStr,
};

impl FromStr for LogSink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("Call log destination is empty".to_string()),
            "stderr" => Ok(LogSink::Stderr),
            "stdout" => Ok(LogSink::Stdout),
            "none" => Ok(LogSink::None),
            path => Ok(LogSink::File(PathBuf::from(path))),
        }
    }
}

impl Display for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Stderr => write!(f, "stderr"),
            LogSink::Stdout => write!(f, "stdout"),
            LogSink::None => write!(f, "none"),
            LogSink::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(Variant::Minimal),
            "extended" => Ok(Variant::Extended),
            _ => Err(format!("Invalid variant: {}", s)),
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Minimal => write!(f, "minimal"),
            Variant::Extended => write!(f, "extended"),
        }
    }
}

pub(crate) fn deserialize_level_filter<'de, D>(
    deserializer: D,
) -> Result<Option<log::LevelFilter>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map_or(Ok(None), |s| {
        log::LevelFilter::from_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom)
    })
}
