//! Configuration file discovery, loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "pchd.toml";

/// Walks up from `start` looking for the nearest directory containing `pchd.toml`.
pub fn find_config_dir(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotFound(start.to_path_buf()));
        }
    }
}

/// Loads and validates `<config_dir>/pchd.toml`.
pub fn load_config(config_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = config_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates a `pchd.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.compiler.path.is_empty() {
        return Err(ConfigError::MissingField("compiler.path"));
    }
    if config.compiler.frontend.is_empty() {
        return Err(ConfigError::MissingField("compiler.frontend"));
    }
    if config.project_parts.is_empty() {
        return Err(ConfigError::NoProjectParts);
    }

    let mut seen = HashSet::new();
    for part in &config.project_parts {
        if part.id.is_empty() {
            return Err(ConfigError::MissingField("project_parts.id"));
        }
        if !seen.insert(part.id.as_str()) {
            return Err(ConfigError::DuplicateProjectPart(part.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[compiler]
path = "clang++"

[[project_parts]]
id = "app"
"#;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.compiler.path, "clang++");
        assert_eq!(config.project_parts.len(), 1);
        assert_eq!(config.project_parts[0].id, "app");
    }

    #[test]
    fn default_values() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.compiler.frontend, "scan");
        assert_eq!(config.compiler.working_directory, ".");
        assert_eq!(config.output.directory, ".pchd");
        assert_eq!(config.jobs.threads, 0);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[compiler]
path = "/usr/bin/clang++"
frontend = "process"
working_directory = "build"

[output]
directory = "out/pch"

[jobs]
threads = 4

[[project_parts]]
id = "core"
arguments = ["-I", "include", "-std=c++17"]
headers = ["include/core.h"]
sources = ["src/core.cpp"]

[[project_parts]]
id = "app"
arguments = ["-I", "include", "-DAPP"]
headers = ["include/app.h"]
sources = ["src/main.cpp", "src/app.cpp"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.compiler.frontend, "process");
        assert_eq!(config.output.directory, "out/pch");
        assert_eq!(config.jobs.threads, 4);
        assert_eq!(config.project_parts[0].arguments, vec!["-I", "include", "-std=c++17"]);
        assert_eq!(config.project_parts[1].sources.len(), 2);
    }

    #[test]
    fn empty_compiler_path_errors() {
        let toml = r#"
[compiler]
path = ""

[[project_parts]]
id = "app"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn no_parts_errors() {
        let toml = r#"
[compiler]
path = "clang++"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::NoProjectParts));
    }

    #[test]
    fn duplicate_part_ids_error() {
        let toml = r#"
[compiler]
path = "clang++"

[[project_parts]]
id = "app"

[[project_parts]]
id = "app"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateProjectPart(ref id) if id == "app"));
    }

    #[test]
    fn empty_part_id_errors() {
        let toml = r#"
[compiler]
path = "clang++"

[[project_parts]]
id = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), MINIMAL).unwrap();
        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_dir(&nested).unwrap(), dir.path());
        assert!(load_config(dir.path()).is_ok());
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { ref path, .. } if path == Path::new("/nonexistent/dir/pchd.toml")));
    }
}
