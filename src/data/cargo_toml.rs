use anyhow::{Context, Result};
use serde_json::Value;

const TOML: &str = include_str!("../../Cargo.toml");

pub fn get_version() -> Result<String> {

    let data: Value = toml::from_str(TOML)?;

    data["package"]["version"].as_str()
        .map(str::to_string)
        .context("Cargo.toml has no package version")
}
