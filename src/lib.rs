pub mod commands;
pub mod db;
pub mod error;
pub mod logging;
pub mod menu;
pub mod models;
pub mod settings;
pub mod state;
pub mod storage;
pub mod ui;

use std::rc::Rc;

use menu::{Navigator, RunResult};
use settings::Settings;
use state::AppState;
use storage::ConfigStore;

pub fn run(settings: &Settings) -> anyhow::Result<RunResult> {
    let catalog = storage::load_catalog(&settings.catalog_path)?;
    let app = Rc::new(AppState::new(ConfigStore::new(&settings.config_dir))?);
    let tree = commands::build_main_menu(app, &catalog)?;

    ui::run_menu(Navigator::new(tree, settings.exit_delay))
}
