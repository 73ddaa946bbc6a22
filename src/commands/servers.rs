use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;

use crate::db;
use crate::error::{DbError, MenuError};
use crate::menu::{MenuTree, NodeId, Outcome, TextInput};
use crate::models::{ServerConfig, ServerEntry};
use crate::state::AppState;
use crate::storage::ConfigStore;

pub const SERVERS_TITLE: &str = "Configure Servers";
const NOT_SET: &str = "[Not Set]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerField {
    Host,
    Port,
    Username,
    Password,
    Database,
}

impl ServerField {
    pub const ALL: [ServerField; 5] = [
        ServerField::Host,
        ServerField::Port,
        ServerField::Username,
        ServerField::Password,
        ServerField::Database,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServerField::Host => "Host",
            ServerField::Port => "Port",
            ServerField::Username => "Username",
            ServerField::Password => "Password",
            ServerField::Database => "Database",
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            ServerField::Host => "Enter server hostname or IP address:",
            ServerField::Port => "Enter server port:",
            ServerField::Username => "Enter username:",
            ServerField::Password => "Enter password:",
            ServerField::Database => "Enter database name:",
        }
    }

    fn help(self) -> &'static str {
        match self {
            ServerField::Host => "The hostname or IP address of the database server",
            ServerField::Port => "The port number to connect to (e.g., 5432 for PostgreSQL)",
            ServerField::Username => "Database username for authentication",
            ServerField::Password => "Database password for authentication",
            ServerField::Database => "The name of the database to connect to",
        }
    }

    pub fn get(self, config: &ServerConfig) -> &str {
        match self {
            ServerField::Host => &config.host,
            ServerField::Port => &config.port,
            ServerField::Username => &config.username,
            ServerField::Password => &config.password,
            ServerField::Database => &config.database,
        }
    }

    pub fn set(self, config: &mut ServerConfig, value: String) {
        let slot = match self {
            ServerField::Host => &mut config.host,
            ServerField::Port => &mut config.port,
            ServerField::Username => &mut config.username,
            ServerField::Password => &mut config.password,
            ServerField::Database => &mut config.database,
        };
        *slot = value;
    }
}

fn or_not_set(value: &str) -> &str {
    if value.is_empty() {
        NOT_SET
    } else {
        value
    }
}

pub fn add_servers_menu(
    tree: &mut MenuTree,
    parent: NodeId,
    app: &Rc<AppState>,
    servers: &[ServerEntry],
) -> Result<NodeId, MenuError> {
    let menu = tree.add_submenu(parent, SERVERS_TITLE)?;
    for entry in servers {
        add_server(tree, menu, app, entry)?;
    }
    Ok(menu)
}

fn add_server(
    tree: &mut MenuTree,
    parent: NodeId,
    app: &Rc<AppState>,
    entry: &ServerEntry,
) -> Result<NodeId, MenuError> {
    let name = entry.name.clone();
    let config = app.store.load(&name).unwrap_or_else(|e| {
        tracing::warn!(server = %name, error = %e, "could not load saved config");
        ServerConfig::default()
    });
    let config = Rc::new(RefCell::new(config));
    let node = tree.add_submenu(parent, entry.display_title())?;

    for field in ServerField::ALL {
        let current = Rc::clone(&config);
        let target = Rc::clone(&config);
        let app = Rc::clone(app);
        let name = name.clone();
        tree.add_text_input(
            node,
            format!("Set {}", field.label()),
            TextInput::new(
                field.prompt(),
                move || {
                    let config = current.borrow();
                    format!("{}\nCurrent value: {}", field.help(), or_not_set(field.get(&config)))
                },
                move |input| {
                    Some(update_field(
                        &app.store,
                        &name,
                        &mut target.borrow_mut(),
                        field,
                        input,
                    ))
                },
            ),
        )?;
    }

    {
        let app = Rc::clone(app);
        let config = Rc::clone(&config);
        let name = name.clone();
        tree.add_content(node, "Test Connection", move || {
            Outcome::Show(test_connection(&app, &name, &config.borrow()))
        })?;
    }
    {
        let app = Rc::clone(app);
        let config = Rc::clone(&config);
        let name = name.clone();
        tree.add_content(node, "View Configuration", move || {
            Outcome::Show(view_configuration(&app.store, &name, &config.borrow()))
        })?;
    }
    {
        let app = Rc::clone(app);
        tree.add_content(node, "Delete Saved Configuration", move || {
            Outcome::Show(delete_configuration(
                &app.store,
                &name,
                &mut config.borrow_mut(),
            ))
        })?;
    }

    Ok(node)
}

/// Sets one field, stamps the update time and writes the whole config back.
pub fn update_field(
    store: &ConfigStore,
    server_name: &str,
    config: &mut ServerConfig,
    field: ServerField,
    input: &str,
) -> String {
    field.set(config, input.to_string());
    config.last_updated = Some(Utc::now());

    match store.save(server_name, config) {
        Ok(()) => {
            tracing::info!(server = server_name, field = field.label(), "server config updated");
            match field {
                ServerField::Password => "Password set and saved".to_string(),
                _ => format!("{} set to: {input} and saved", field.label()),
            }
        }
        Err(e) => {
            tracing::warn!(server = server_name, error = %e, "failed to save config");
            format!("Failed to save config: {e}")
        }
    }
}

/// Errors come back as text; unlike script execution, a failed test never ends the run.
pub fn test_connection(app: &AppState, server_name: &str, config: &ServerConfig) -> String {
    if !config.is_complete() {
        return "Error: Please configure all server settings first.".to_string();
    }

    let result = app.block_on(async {
        let driver = db::connect_server(&app.store, app.new_driver(), server_name).await?;
        driver.close().await;
        Ok::<_, DbError>(())
    });

    match result {
        Ok(()) => format!(
            "\nConnection Test Results:\n=======================\n\
             Host: {}\nPort: {}\nUsername: {}\nDatabase: {}\nStatus: Connected",
            config.host, config.port, config.username, config.database
        ),
        Err(e) => {
            tracing::warn!(server = server_name, error = %e, "connection test failed");
            format!("Error: {e}")
        }
    }
}

pub fn view_configuration(store: &ConfigStore, server_name: &str, config: &ServerConfig) -> String {
    let last_updated = config
        .last_updated
        .map(|t| t.to_rfc2822())
        .unwrap_or_else(|| "Never".to_string());
    let config_file = store
        .path_for(server_name)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| e.to_string());

    format!(
        "\nCurrent Configuration:\n=====================\n\
         Host: {}\nPort: {}\nUsername: {}\nPassword: {}\nDatabase: {}\n\
         Last Updated: {last_updated}\nConfig File: {config_file}",
        or_not_set(&config.host),
        or_not_set(&config.port),
        or_not_set(&config.username),
        or_not_set(&config.password),
        or_not_set(&config.database),
    )
}

/// Removes the saved file and resets the in-memory settings.
pub fn delete_configuration(
    store: &ConfigStore,
    server_name: &str,
    config: &mut ServerConfig,
) -> String {
    match store.delete(server_name) {
        Ok(false) => "No saved configuration found.".to_string(),
        Ok(true) => {
            *config = ServerConfig::default();
            tracing::info!(server = server_name, "server config deleted");
            "Configuration successfully deleted.".to_string()
        }
        Err(e) => format!("Error deleting configuration: {e}"),
    }
}
