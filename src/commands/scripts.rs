use std::cell::RefCell;
use std::rc::Rc;

use crate::db;
use crate::db::params::{self, Execution, NamedParams};
use crate::error::{DbError, MenuError};
use crate::menu::{MenuTree, NodeId, Outcome, TextInput};
use crate::models::{ParamValue, Script, Selection};
use crate::state::AppState;

pub const SCRIPTS_TITLE: &str = "Scripts";
pub const EXECUTE_TITLE: &str = "Execute";

/// Named values collected from a script's current inputs, with a display summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    pub summary: String,
    pub named: NamedParams,
}

pub fn add_scripts_menu(
    tree: &mut MenuTree,
    parent: NodeId,
    app: &Rc<AppState>,
    scripts: &[Script],
) -> Result<NodeId, MenuError> {
    let menu = tree.add_submenu(parent, SCRIPTS_TITLE)?;
    for script in scripts {
        add_script(tree, menu, app, script.clone())?;
    }
    Ok(menu)
}

fn add_script(
    tree: &mut MenuTree,
    parent: NodeId,
    app: &Rc<AppState>,
    script: Script,
) -> Result<NodeId, MenuError> {
    let node = tree.add_submenu(parent, script.title.clone())?;
    let param_count = script.params.len();
    let select_count = script.selects.len();
    let script = Rc::new(RefCell::new(script));

    for index in 0..param_count {
        let title = script.borrow().params[index].title.clone();
        let current = Rc::clone(&script);
        let target = Rc::clone(&script);
        tree.add_text_input(
            node,
            format!("Set {title}"),
            TextInput::new(
                "Enter Param:",
                move || {
                    let script = current.borrow();
                    let value = script.params[index].value.as_deref().unwrap_or("[Not Set]");
                    format!("The current value is {value}")
                },
                move |input| {
                    let mut script = target.borrow_mut();
                    let param = &mut script.params[index];
                    param.value = Some(input.to_string());
                    Some(format!("{} set to: {input}", param.title))
                },
            ),
        )?;
    }

    for index in 0..select_count {
        add_select(tree, node, &script, index)?;
    }

    let app = Rc::clone(app);
    tree.add_content(node, EXECUTE_TITLE, move || run_script(&app, &script.borrow()))?;
    Ok(node)
}

/// One leaf per label; picking a leaf records its position and returns to the script.
fn add_select(
    tree: &mut MenuTree,
    parent: NodeId,
    script: &Rc<RefCell<Script>>,
    index: usize,
) -> Result<NodeId, MenuError> {
    let (title, labels) = {
        let script = script.borrow();
        let option = &script.selects[index];
        (option.title.clone(), option.values.clone())
    };
    let node = tree.add_submenu(parent, title)?;
    for (position, label) in labels.into_iter().enumerate() {
        let script = Rc::clone(script);
        tree.add_content(node, label, move || {
            script.borrow_mut().selects[index].selected = Some(Selection::ByIndex(position));
            Outcome::Back
        })?;
    }
    Ok(node)
}

/// Params without a value and selects without a resolvable choice are left out.
pub fn collect_parameters(script: &Script) -> ParameterSet {
    let mut summary = String::from("Executing:");
    let mut named = NamedParams::new();

    for param in script.params.iter().filter(|p| !p.name.is_empty()) {
        if let Some(value) = &param.value {
            named.insert(param.name.clone(), ParamValue::Text(value.clone()));
            summary.push_str(&format!(" [{}:{}]", param.title, value));
        }
    }

    for option in script.selects.iter().filter(|s| !s.name.is_empty()) {
        if let Some(resolved) = option.resolve() {
            named.insert(option.name.clone(), resolved.value);
            summary.push_str(&format!(" [{}:{}]", option.title, resolved.display));
        }
    }

    ParameterSet { summary, named }
}

/// Any failure here ends the run with a non-zero exit.
pub fn run_script(app: &AppState, script: &Script) -> Outcome {
    let parameters = collect_parameters(script);

    match app.block_on(execute_script(app, script, &parameters.named)) {
        Ok(execution) => {
            tracing::info!(
                script = %script.title,
                server = %script.server,
                rows = execution.rows_affected,
                "script executed"
            );
            Outcome::Show(format!(
                "{} Rows Affected: {} Params: {}",
                parameters.summary, execution.rows_affected, execution.trace
            ))
        }
        Err(err) => {
            tracing::error!(
                script = %script.title,
                server = %script.server,
                error = %err,
                "script failed"
            );
            let message = match err {
                DbError::Connection(_)
                | DbError::Config(_)
                | DbError::InvalidConnectionString(_)
                | DbError::NotConnected => format!("Error connecting to DB: {err}"),
                _ => format!(
                    "Error executing DB statement: {err}, Variables: {}",
                    params::trace(&script.statement, &parameters.named)
                ),
            };
            Outcome::Abort(message)
        }
    }
}

async fn execute_script(
    app: &AppState,
    script: &Script,
    named: &NamedParams,
) -> Result<Execution, DbError> {
    // Unbound placeholders fail before a connection is opened.
    params::bind(&script.statement, named)?;

    let driver = db::connect_server(&app.store, app.new_driver(), &script.server).await?;
    let execution = params::execute(driver.as_ref(), &script.statement, named).await;
    driver.close().await;
    execution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Param, SelectOption};

    fn dispute_script() -> Script {
        Script {
            title: "Dispute Status Change".to_string(),
            server: "Warehouse".to_string(),
            statement: "UPDATE T SET Status=@Status WHERE ID=@IssueID".to_string(),
            params: vec![Param {
                title: "Dispute ID".to_string(),
                name: "IssueID".to_string(),
                value: None,
            }],
            selects: vec![SelectOption {
                title: "Status".to_string(),
                name: "Status".to_string(),
                values: vec!["Logged".to_string(), "Investigating".to_string()],
                use_index: false,
                value_map: Vec::new(),
                default_index: None,
                selected: None,
            }],
        }
    }

    #[test]
    fn unset_inputs_are_not_collected() {
        let set = collect_parameters(&dispute_script());
        assert!(set.named.is_empty());
        assert_eq!(set.summary, "Executing:");
    }

    #[test]
    fn set_inputs_bind_in_placeholder_order() {
        let mut script = dispute_script();
        script.params[0].value = Some("42".to_string());
        script.selects[0].selected = Some(Selection::ByIndex(0));

        let set = collect_parameters(&script);
        assert_eq!(set.summary, "Executing: [Dispute ID:42] [Status:Logged]");
        let values = params::bind(&script.statement, &set.named).unwrap();
        assert_eq!(values, vec![ParamValue::from("Logged"), ParamValue::from("42")]);
    }
}
