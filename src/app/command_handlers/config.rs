use crate::app::command_support::{load_settings, map_config_err, to_json, GlobalOptions};
use crate::config::{save_settings, save_settings_to, Settings};
use std::path::Path;

pub fn cmd_config(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    match args {
        [sub] if sub == "show" => {
            let settings = load_settings(options)?;
            to_json(&settings.projects)
        }
        [sub] if sub == "validate" => {
            let settings = load_settings(options)?;
            Ok(format!(
                "config ok\nprojects={}\nscenarios={}\nallow_parallel={}",
                settings.projects.len(),
                scenario_count(&settings),
                settings.allow_parallel
            ))
        }
        [sub, source] if sub == "set" => cmd_config_set(options, Path::new(source)),
        _ => Err("usage: config <show|validate|set <file>>".to_string()),
    }
}

/// Replaces the active configuration with the contents of `source`. The
/// stored file is only touched once the new settings validate.
fn cmd_config_set(options: &GlobalOptions, source: &Path) -> Result<String, String> {
    let settings = Settings::from_path(source).map_err(map_config_err)?;
    let path = match options.config_path.as_deref() {
        Some(path) => {
            save_settings_to(path, &settings).map_err(map_config_err)?;
            path.to_path_buf()
        }
        None => save_settings(&settings).map_err(map_config_err)?,
    };
    Ok(format!(
        "config saved\npath={}\nprojects={}\nscenarios={}",
        path.display(),
        settings.projects.len(),
        scenario_count(&settings)
    ))
}

fn scenario_count(settings: &Settings) -> usize {
    settings
        .projects
        .values()
        .map(|project| project.scenarios.len())
        .sum()
}
