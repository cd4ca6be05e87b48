use std::path::PathBuf;
use std::sync::Once;

static CREATE_DIR_WARNED: Once = Once::new();

/// Resolve the console home directory.
///
/// Priority:
/// 1) SOAR_CONSOLE_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.soar_console
pub fn soar_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("SOAR_CONSOLE_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".soar_console");
    }
    PathBuf::from(".").join(".soar_console")
}

fn ensure_home_dir(home: &PathBuf) {
    if let Err(err) = std::fs::create_dir_all(home) {
        CREATE_DIR_WARNED.call_once(|| {
            eprintln!(
                "Warning: failed to create console home directory {}: {}. Set SOAR_CONSOLE_HOME.",
                home.display(),
                err
            );
        });
    }
}

/// Default config file: ~/.soar_console/config.toml
pub fn default_config_path() -> PathBuf {
    soar_home().join("config.toml")
}

/// Default logs directory: ~/.soar_console/logs
pub fn default_logs_dir() -> PathBuf {
    let home = soar_home();
    ensure_home_dir(&home);
    home.join("logs")
}
