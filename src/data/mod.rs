pub mod cargo_toml;
