use std::path::Path;

use do_my_job_lib::db::params::extract_parameter_names;
use do_my_job_lib::models::ParamValue;
use do_my_job_lib::storage::load_catalog;

#[test]
fn demo_catalog_is_consistent() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/catalog.toml");
    let catalog = load_catalog(&path).unwrap();
    assert_eq!(catalog.scripts.len(), 2);

    let servers: Vec<String> = catalog.server_entries().into_iter().map(|s| s.name).collect();
    for script in &catalog.scripts {
        assert!(servers.contains(&script.server), "unknown server {}", script.server);

        // Every placeholder has a param or select feeding it.
        for name in extract_parameter_names(&script.statement) {
            let fed = script.params.iter().any(|p| p.name == name)
                || script.selects.iter().any(|s| s.name == name);
            assert!(fed, "{} has no input for @{name}", script.title);
        }
    }

    let service = &catalog.scripts[1].selects[0];
    assert_eq!(service.resolve().unwrap().value, ParamValue::from("STD"));
}
