#![cfg(not(feature = "interpose"))]

mod fixtures;
use anyhow::Result;
use bdsim::config::resolve::{ENV_CONFIG, ENV_LOG, ENV_LOG_FORMAT, ENV_ROOT, resolve_config_from};
use bdsim::resolver::HostLibc;
use bdsim::{InitError, LogSink, ResolveError, Shim, Variant};
use fixtures::*;
use nix::errno::Errno;
use rstest::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

fn read_file(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

fn vars(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    move |key| map.get(key).cloned()
}

#[rstest]
fn test_file_sink_receives_records(shim: TestShim) -> Result<()> {
    let log_path = shim.scratch("calls.jsonl");
    let config = resolve_config_from(
        vars(&[
            (ENV_ROOT, shim.root.display().to_string()),
            (ENV_LOG, log_path.display().to_string()),
            (ENV_LOG_FORMAT, "json".to_string()),
        ]),
        read_file,
    )?;
    assert_eq!(config.log, LogSink::File(log_path.clone()));

    let configured = Shim::from_config(Arc::new(HostLibc), &config)?;
    let fd = unsafe { configured.open(c"/dev/null".as_ptr(), libc::O_RDONLY, 0) };
    unsafe { configured.close(fd) };
    drop(configured);

    let text = std::fs::read_to_string(&log_path)?;
    let calls: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["call"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(calls, vec!["open", "close"]);
    Ok(())
}

#[rstest]
fn test_config_file_layers_under_environment(shim: TestShim) -> Result<()> {
    let config_path = shim.scratch("bdsim.toml");
    std::fs::write(
        &config_path,
        format!(
            "root = \"{}\"\nlog = \"none\"\nvariant = \"minimal\"\n",
            shim.root.display()
        ),
    )?;

    let config = resolve_config_from(
        vars(&[(ENV_CONFIG, config_path.display().to_string())]),
        read_file,
    )?;
    assert_eq!(config.variant, Variant::Minimal);
    assert_eq!(config.log, LogSink::None);

    let config = resolve_config_from(
        vars(&[
            (ENV_CONFIG, config_path.display().to_string()),
            (ENV_LOG, "stderr".to_string()),
        ]),
        read_file,
    )?;
    assert_eq!(config.log, LogSink::Stderr);
    assert_eq!(config.sources.get("log").map(String::as_str), Some("environment"));

    let configured = Shim::from_config(Arc::new(HostLibc), &config)?;
    assert_eq!(configured.variant(), Variant::Minimal);
    Ok(())
}

#[rstest]
fn test_unreachable_root(shim: TestShim) -> Result<()> {
    let config = resolve_config_from(
        vars(&[
            (ENV_ROOT, shim.scratch("no-such-root").display().to_string()),
            (ENV_LOG, "none".to_string()),
        ]),
        read_file,
    )?;

    match Shim::from_config(Arc::new(HostLibc), &config) {
        Err(InitError::Resolve(ResolveError::RootUnreachable { errno, .. })) => {
            assert_eq!(errno, Errno::ENOENT);
        }
        Err(e) => unreachable!("unexpected error: {}", e),
        Ok(_) => unreachable!("root should be unreachable"),
    }
    Ok(())
}

#[rstest]
fn test_missing_root_variable() {
    let err = resolve_config_from(vars(&[]), read_file).unwrap_err();
    assert!(err.to_string().contains(ENV_ROOT));
}
