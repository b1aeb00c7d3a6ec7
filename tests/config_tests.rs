use mdwrap_lib::config::{CliOverrides, Config, ConfigError, ConfigSource, SourcedConfig, WrapColumnSource};
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_load_config_file() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let config_path = temp_dir.path().join("test_config.toml");
    let config_content = r#"
[global]
rulers = [72, 100]
include = ["docs/*.md"]
exclude = [".git"]
inline-directives = false
"#;
    fs::write(&config_path, config_content).expect("Failed to write test config file");

    let config_path_str = config_path.to_str().expect("Path should be valid UTF-8");
    let sourced_result = SourcedConfig::load_with_discovery(Some(config_path_str), None, true);
    assert!(
        sourced_result.is_ok(),
        "SourcedConfig loading should succeed. Error: {:?}",
        sourced_result.err()
    );

    let sourced = sourced_result.unwrap();
    assert_eq!(sourced.global.rulers.source, ConfigSource::ProjectConfig);
    assert_eq!(sourced.loaded_files, vec![config_path_str.to_string()]);

    let config: Config = sourced.into();
    assert_eq!(config.global.rulers, vec![72, 100]);
    assert_eq!(config.global.include, vec!["docs/*.md"]);
    assert_eq!(config.global.exclude, vec![".git"]);
    assert!(config.global.respect_gitignore);
    assert!(!config.global.inline_directives);
    assert_eq!(config.wrap_column(), Some(72));
}

#[test]
fn test_load_nonexistent_config() {
    let sourced_result = SourcedConfig::load_with_discovery(Some("nonexistent_config.toml"), None, true);
    assert!(sourced_result.is_err(), "Loading nonexistent config should fail");

    if let Err(err) = sourced_result {
        assert!(
            err.to_string().contains("Failed to read config file"),
            "Error message should indicate file reading failure"
        );
    }
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("broken.toml");
    fs::write(&config_path, "[global\nrulers = [80]\n").unwrap();

    let result = SourcedConfig::load_with_discovery(config_path.to_str(), None, true);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_default_config_has_no_wrap_column() {
    let config = Config::default();
    assert!(config.global.rulers.is_empty());
    assert_eq!(config.global.wrap_column, None);
    assert!(config.global.respect_gitignore);
    assert!(config.global.inline_directives);
    assert_eq!(config.wrap_column(), None);
}

#[test]
fn test_cli_overrides_win() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("mdwrap.toml");
    fs::write(&config_path, "[global]\nwrap-column = 100\nexclude = [\"a.md\"]\n").unwrap();

    let overrides = CliOverrides {
        wrap_column: Some(60),
        respect_gitignore: Some(false),
        ..Default::default()
    };
    let sourced = SourcedConfig::load_with_discovery(config_path.to_str(), Some(&overrides), true).unwrap();

    assert_eq!(sourced.global.wrap_column.value, Some(60));
    assert_eq!(sourced.global.wrap_column.source, ConfigSource::Cli);
    // History keeps the overridden file value
    assert!(sourced.global.wrap_column.overrides.iter().any(|o| o.value == Some(100)));
    assert_eq!(sourced.global.exclude.source, ConfigSource::ProjectConfig);
    assert!(!sourced.global.respect_gitignore.value);
    assert_eq!(sourced.wrap_column(), Some(60));
}

#[test]
fn test_cli_zero_wrap_column_is_rejected() {
    let overrides = CliOverrides {
        wrap_column: Some(0),
        ..Default::default()
    };
    let result = SourcedConfig::load_with_discovery(None, Some(&overrides), true);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_user_config_is_base_layer() {
    let temp_dir = tempdir().unwrap();
    let user_dir = temp_dir.path().join("user");
    fs::create_dir_all(user_dir.join("mdwrap")).unwrap();
    fs::write(
        user_dir.join("mdwrap").join("mdwrap.toml"),
        "[global]\nrulers = [90]\nexclude = [\"notes/\"]\n",
    )
    .unwrap();

    let project_config = temp_dir.path().join(".mdwrap.toml");
    fs::write(&project_config, "[global]\nexclude = [\"vendor\"]\n").unwrap();

    let sourced =
        SourcedConfig::load_with_discovery_impl(project_config.to_str(), None, false, Some(&user_dir)).unwrap();

    assert_eq!(sourced.loaded_files.len(), 2);
    assert_eq!(sourced.global.rulers.value, vec![90]);
    assert_eq!(sourced.global.rulers.source, ConfigSource::UserConfig);
    assert_eq!(sourced.global.exclude.value, vec!["vendor"]);
    assert_eq!(sourced.global.exclude.source, ConfigSource::ProjectConfig);
}

#[test]
#[serial]
fn test_discovery_walks_up_to_git_root() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir(root.join(".git")).unwrap();
    fs::write(root.join(".mdwrap.toml"), "[global]\nrulers = [66]\n").unwrap();
    let nested = root.join("docs").join("guide");
    fs::create_dir_all(&nested).unwrap();

    let original_dir = std::env::current_dir().unwrap();
    std::env::set_current_dir(&nested).unwrap();
    let empty_user_dir = root.join("no-user-config");
    let result = SourcedConfig::load_with_discovery_impl(None, None, false, Some(&empty_user_dir));
    std::env::set_current_dir(original_dir).unwrap();

    let sourced = result.unwrap();
    assert_eq!(sourced.wrap_column(), Some(66));
    let project_root = sourced.project_root.expect("project root should be set");
    assert_eq!(project_root.canonicalize().unwrap(), root.canonicalize().unwrap());
}

#[test]
#[serial]
fn test_discovery_stops_at_git_boundary() {
    let temp_dir = tempdir().unwrap();
    let outer = temp_dir.path();
    fs::write(outer.join("mdwrap.toml"), "[global]\nrulers = [50]\n").unwrap();
    let repo = outer.join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();

    let original_dir = std::env::current_dir().unwrap();
    std::env::set_current_dir(&repo).unwrap();
    let empty_user_dir = outer.join("no-user-config");
    let result = SourcedConfig::load_with_discovery_impl(None, None, false, Some(&empty_user_dir));
    std::env::set_current_dir(original_dir).unwrap();

    let sourced = result.unwrap();
    assert!(sourced.loaded_files.is_empty());
    assert_eq!(sourced.wrap_column(), None);
}

#[test]
fn test_create_default_config() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join(".mdwrap.toml");
    let path_str = path.to_str().unwrap();

    mdwrap_lib::config::create_default_config(path_str).unwrap();
    let sourced = SourcedConfig::load_with_discovery(Some(path_str), None, true).unwrap();
    assert_eq!(sourced.wrap_column(), Some(80));
    assert!(mdwrap_lib::config::validate_config_sourced(&sourced).is_empty());

    let again = mdwrap_lib::config::create_default_config(path_str);
    assert!(matches!(again, Err(ConfigError::FileExists { .. })));
}
