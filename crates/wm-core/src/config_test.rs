use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
name: shop
primary_location: "@app/migrations"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.name, "shop");
    assert_eq!(config.primary_location, "@app/migrations");
    assert!(config.extra_locations.is_empty());
    assert!(!config.disable_multi_location_lookup);
    assert_eq!(config.migration_table, "migration");
    assert_eq!(config.file_extension, "sql");
    assert_eq!(config.lookup_policy(), LookupPolicy::MultiLocation);
    assert_eq!(config.database_path_absolute(Path::new("/p")), None);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: shop
primary_location: "@app/migrations"
extra_locations:
  - "@vendor/acme/blog/migrations"
  - "@vendor/acme/user/migrations"
disable_multi_location_lookup: true
migration_table: schema_history
file_extension: php
aliases:
  "@vendor": vendor
database:
  path: target/dev.duckdb
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.extra_locations.len(), 2);
    assert_eq!(config.lookup_policy(), LookupPolicy::PrimaryOnly);
    assert_eq!(config.migration_table, "schema_history");
    assert_eq!(config.file_extension, "php");

    let root = Path::new("/srv/shop");
    let resolver = config.alias_resolver(root);
    assert_eq!(
        resolver.resolve(&config.extra_locations[0]).unwrap(),
        root.join("vendor/acme/blog/migrations")
    );
    assert_eq!(
        config.database_path_absolute(root),
        Some(root.join("target/dev.duckdb"))
    );

    let set = config.location_set();
    assert_eq!(set.iter().count(), 3);
    assert_eq!(set.primary(), &config.primary_location);
}

#[test]
fn test_primary_location_is_required() {
    let result: Result<Config, _> = serde_yaml::from_str("name: shop");
    assert!(result.is_err());
}

#[test]
fn test_unknown_fields_rejected() {
    let yaml = r#"
name: shop
primary_location: "@app/migrations"
migration_lookup: []
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_validate_rejects_bad_table_name() {
    let yaml = r#"
name: shop
primary_location: "@app/migrations"
migration_table: "drop table x; --"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_validate_rejects_dotted_extension() {
    let yaml = r#"
name: shop
primary_location: "@app/migrations"
file_extension: ".sql"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_malformed_alias() {
    let yaml = r#"
name: shop
primary_location: "@app/migrations"
aliases:
  vendor: vendor
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_name() {
    let yaml = r#"
name: ""
primary_location: "@app/migrations"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("waymark.yaml"),
        "name: shop\nprimary_location: migrations\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.primary_location, "migrations");
}

#[test]
fn test_load_from_dir_missing_config() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        Config::load_from_dir(dir.path()),
        Err(CoreError::ConfigNotFound { .. })
    ));
}

#[test]
fn test_load_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("waymark.yml");
    std::fs::write(&path, "name: [unclosed").unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(CoreError::ConfigParseError { .. })
    ));
}
