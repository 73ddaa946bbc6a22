use std::path::Path;
use std::rc::Rc;

use crate::error::MenuError;
use crate::menu::{MenuTree, Outcome};
use crate::models::Catalog;
use crate::state::AppState;
use crate::storage::APP_NAME;

pub mod scripts;
pub mod servers;

pub const MAIN_TITLE: &str = "Server Configuration Tool";

/// Builds the whole menu. Only the saved server configs are read here; nothing connects.
pub fn build_main_menu(app: Rc<AppState>, catalog: &Catalog) -> Result<MenuTree, MenuError> {
    let mut tree = MenuTree::new(MAIN_TITLE);
    let root = tree.root();

    scripts::add_scripts_menu(&mut tree, root, &app, &catalog.scripts)?;
    servers::add_servers_menu(&mut tree, root, &app, &catalog.server_entries())?;

    let about = about_text(app.store.dir());
    tree.add_content(root, "About", move || Outcome::Show(about.clone()))?;

    Ok(tree)
}

fn about_text(config_dir: &Path) -> String {
    format!(
        "\n{APP_NAME} v{}\n=============================\n\
         Runs administrative SQL scripts against configured servers.\n\n\
         Configurations are stored in: {}",
        env!("CARGO_PKG_VERSION"),
        config_dir.display()
    )
}
