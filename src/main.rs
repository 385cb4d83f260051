#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use bevy::{prelude::*, log::LogPlugin};
use anyhow::Result;
use game::{player::Player, map::LevelMap, enemy::GhostPlugin, GameController, util::{get_settings, drop_settings}};
use bevy::window::WindowResolution;

use crate::data::cargo_toml::get_version;

mod game;
mod debug;
mod data;

const CLEAR: Color = Color::rgb(0.05, 0.05, 0.08);
#[cfg(debug_assertions)]
const NAME: &str = "EMF Hunt (debug)";

#[cfg(not(debug_assertions))]
const NAME: &str = "EMF Hunt";

fn main() -> Result<()> {

    drop_settings()?;
    let settings = get_settings()?;
    let version = get_version()?;

    let mut app = App::new();

    let mut window = WindowPlugin::default();

    window.primary_window = Some( Window {
        title: format!("{} v{}", NAME, version),
        resolution: WindowResolution::default(),
        ..Default::default()
    } );

    let default_plugin = DefaultPlugins.build();

    #[cfg(debug_assertions)]
    let default_plugin = default_plugin.set(LogPlugin {
        level: bevy::log::Level::TRACE,
        filter: "debug,wgpu_core=warn,wgpu_hal=warn,naga=info,emf_hunt=debug".into(),
    });

    #[cfg(not(debug_assertions))]
    let default_plugin = default_plugin.set(LogPlugin {
        level: bevy::log::Level::INFO,
        filter: "info,wgpu_core=warn,wgpu_hal=warn".into(),
    });

    let default_plugin = default_plugin.set(window);

    app
        .add_plugins(default_plugin)
        .insert_resource(ClearColor(CLEAR))
        .insert_resource(settings.emf)
        .insert_resource(settings)

        .add_startup_system(game::camera)
        .add_plugin(GameController)
        .add_plugin(LevelMap)
        .add_plugin(Player)
        .add_plugin(GhostPlugin)

        .add_plugin(debug::DebugPlugin)
    .run();

    Ok(())
}
