use super::{Config, LogFormat, LogSink, PartialConfig, Variant};
use anyhow::{Context, Result, anyhow};
use log::trace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_ROOT: &str = "LIBBDSIM_ROOT";
pub const ENV_CONFIG: &str = "LIBBDSIM_CONFIG";
pub const ENV_LOG: &str = "LIBBDSIM_LOG";
pub const ENV_LOG_FORMAT: &str = "LIBBDSIM_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "LIBBDSIM_LOG_LEVEL";
pub const ENV_VARIANT: &str = "LIBBDSIM_VARIANT";

/// Resolves the configuration from the process environment. The config file,
/// if one is named, is read with `read_file`.
pub fn resolve_config<R>(read_file: R) -> Result<Config>
where
    R: FnOnce(&Path) -> Result<String>,
{
    resolve_config_from(|key: &str| std::env::var(key).ok(), read_file)
}

/**
 * Layers defaults, the TOML file named by `LIBBDSIM_CONFIG` and the
 * environment, in increasing precedence. `vars` stands in for the
 * environment.
 */
pub fn resolve_config_from<V, R>(vars: V, read_file: R) -> Result<Config>
where
    V: Fn(&str) -> Option<String>,
    R: FnOnce(&Path) -> Result<String>,
{
    let var = |key: &str| vars(key).filter(|v| !v.is_empty());
    let (mut partial_config, mut sources) =
        load_partial(var(ENV_CONFIG), read_file)?;

    // Override with environment variables if set
    if let Some(root) = var(ENV_ROOT) {
        partial_config.root = Some(root);
        sources.insert("root".into(), "environment".into());
    }
    if let Some(log) = var(ENV_LOG) {
        partial_config.log = Some(log);
        sources.insert("log".into(), "environment".into());
    }
    if let Some(log_format) = var(ENV_LOG_FORMAT) {
        partial_config.log_format =
            Some(LogFormat::from_str(&log_format).map_err(|e| anyhow!(e))?);
        sources.insert("log_format".into(), "environment".into());
    }
    if let Some(log_level) = var(ENV_LOG_LEVEL) {
        if let Ok(log_level) = log::LevelFilter::from_str(&log_level) {
            partial_config.log_level = Some(log_level);
            sources.insert("log_level".into(), "environment".into());
        } else {
            return Err(anyhow!("Invalid log level: {}", log_level));
        }
    }
    if let Some(variant) = var(ENV_VARIANT) {
        partial_config.variant =
            Some(Variant::from_str(&variant).map_err(|e| anyhow!(e))?);
        sources.insert("variant".into(), "environment".into());
    }

    let root = match partial_config.root {
        Some(root) if !root.is_empty() => PathBuf::from(root),
        Some(_) => return Err(anyhow!("Sandbox root is empty")),
        None => return Err(anyhow!("{} is not set", ENV_ROOT)),
    };

    // If nothing else, fill in with some default values
    let log = match partial_config.log {
        Some(log) => LogSink::from_str(&log).map_err(|e| anyhow!(e))?,
        None => {
            sources.insert("log".into(), "default".into());
            LogSink::Stderr
        }
    };
    let log_format = partial_config.log_format.unwrap_or_else(|| {
        sources.insert("log_format".into(), "default".into());
        LogFormat::Text
    });
    let log_level = partial_config.log_level.unwrap_or_else(|| {
        sources.insert("log_level".into(), "default".into());
        log::LevelFilter::Off
    });
    let variant = partial_config.variant.unwrap_or_else(|| {
        sources.insert("variant".into(), "default".into());
        Variant::default()
    });

    for (key, source) in sources.iter() {
        trace!("Config {} from {}", key, source);
    }

    Ok(Config {
        root,
        log,
        log_format,
        log_level,
        variant,
        sources,
    })
}

fn load_partial<R>(
    path: Option<String>,
    read_file: R,
) -> Result<(PartialConfig, HashMap<String, String>)>
where
    R: FnOnce(&Path) -> Result<String>,
{
    let mut sources = HashMap::new();
    let Some(path) = path else {
        trace!("No config file named, using environment and defaults");
        return Ok((PartialConfig::default(), sources));
    };
    let path = PathBuf::from(path);

    let config_str = read_file(&path)
        .context(format!("Failed to read config file {}", path.display()))?;
    let config: PartialConfig = toml::from_str(&config_str)
        .context(format!("Failed to parse config file {}", path.display()))?;

    let origin = path.display().to_string();
    for (key, present) in [
        ("root", config.root.is_some()),
        ("log", config.log.is_some()),
        ("log_format", config.log_format.is_some()),
        ("log_level", config.log_level.is_some()),
        ("variant", config.variant.is_some()),
    ] {
        if present {
            sources.insert(key.into(), origin.clone());
        }
    }
    trace!("Loaded config file: {}", path.display());

    Ok((config, sources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_file(path: &Path) -> Result<String> {
        Err(anyhow!("unexpected read of {}", path.display()))
    }

    #[test]
    fn test_root_is_required() {
        let err = resolve_config_from(env(&[]), no_file).unwrap_err();
        assert!(err.to_string().contains(ENV_ROOT));

        let err =
            resolve_config_from(env(&[(ENV_ROOT, "")]), no_file).unwrap_err();
        assert!(err.to_string().contains(ENV_ROOT));
    }

    #[test]
    fn test_defaults() {
        let config =
            resolve_config_from(env(&[(ENV_ROOT, "/srv/root")]), no_file)
                .unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/root"));
        assert_eq!(config.log, LogSink::Stderr);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.log_level, LevelFilter::Off);
        assert_eq!(config.variant, Variant::Extended);
        assert_eq!(config.sources["root"], "environment");
        assert_eq!(config.sources["variant"], "default");
    }

    #[test]
    fn test_file_values_are_layered_under_environment() {
        let vars = env(&[
            (ENV_CONFIG, "/etc/bdsim.toml"),
            (ENV_ROOT, "/from/env"),
        ]);
        let config = resolve_config_from(vars, |path| {
            assert_eq!(path, Path::new("/etc/bdsim.toml"));
            Ok(r#"
                root = "/from/file"
                log = "/var/log/bdsim.log"
                log_format = "json"
                log_level = "debug"
                variant = "minimal"
            "#
            .to_string())
        })
        .unwrap();

        assert_eq!(config.root, PathBuf::from("/from/env"));
        assert_eq!(config.sources["root"], "environment");
        assert_eq!(config.log, LogSink::File(PathBuf::from("/var/log/bdsim.log")));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.variant, Variant::Minimal);
        assert_eq!(config.sources["variant"], "/etc/bdsim.toml");
    }

    #[test]
    fn test_named_sinks() {
        for (value, sink) in [
            ("stderr", LogSink::Stderr),
            ("stdout", LogSink::Stdout),
            ("none", LogSink::None),
        ] {
            let vars = env(&[(ENV_ROOT, "/r"), (ENV_LOG, value)]);
            assert_eq!(resolve_config_from(vars, no_file).unwrap().log, sink);
        }
    }

    #[test]
    fn test_invalid_values_are_errors() {
        for (key, value) in [
            (ENV_LOG_FORMAT, "xml"),
            (ENV_LOG_LEVEL, "loud"),
            (ENV_VARIANT, "maximal"),
        ] {
            let vars = env(&[(ENV_ROOT, "/r"), (key, value)]);
            assert!(resolve_config_from(vars, no_file).is_err(), "{}", key);
        }
    }

    #[test]
    fn test_unreadable_or_malformed_file() {
        let vars = env(&[(ENV_ROOT, "/r"), (ENV_CONFIG, "/missing.toml")]);
        let err = resolve_config_from(vars, |_| Err(anyhow!("ENOENT")))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));

        let vars = env(&[(ENV_ROOT, "/r"), (ENV_CONFIG, "/bad.toml")]);
        let err = resolve_config_from(vars, |_| Ok("root = [".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
