use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    EditParseError(#[from] toml_edit::TomlError),
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Read config.toml, falling back to defaults if it does not exist.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    match read_config_text(data_dir)? {
        Some(text) => Ok(toml::from_str(&text)?),
        None => Ok(Config::default()),
    }
}

/// Read config.toml as an editable document (empty if missing), preserving
/// comments and layout for write-back.
pub fn read_config_doc(data_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let text = read_config_text(data_dir)?.unwrap_or_default();
    Ok(text.parse()?)
}

/// Write the config document back to disk.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(data_dir);
    fs::create_dir_all(data_dir)
        .and_then(|()| fs::write(&path, doc.to_string()))
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

fn read_config_text(data_dir: &Path) -> Result<Option<String>, ConfigError> {
    let path = config_path(data_dir);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::ReadError { path, source: e }),
    }
}

/// Append a category to `[tasks] categories`. Returns false if it is
/// already listed.
pub fn add_category(doc: &mut toml_edit::DocumentMut, name: &str) -> bool {
    if !doc.contains_key("tasks") {
        doc["tasks"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    if doc["tasks"].get("categories").is_none() {
        // start from the built-in list so adding one does not hide the rest
        let mut defaults = toml_edit::Array::new();
        for c in Config::default().tasks.categories {
            defaults.push(c);
        }
        doc["tasks"]["categories"] = toml_edit::value(defaults);
    }
    let Some(list) = doc["tasks"]["categories"].as_array_mut() else {
        return false;
    };
    if list.iter().any(|v| v.as_str() == Some(name)) {
        return false;
    }
    list.push(name);
    true
}

/// Set `[tasks] default_category`
pub fn set_default_category(doc: &mut toml_edit::DocumentMut, name: &str) {
    if !doc.contains_key("tasks") {
        doc["tasks"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["tasks"]["default_category"] = toml_edit::value(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"# my lists
[tasks]
default_category = "Work"
categories = ["Work", "Errands"]
"#
    }

    #[test]
    fn test_missing_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config(tmp.path()).unwrap();
        assert_eq!(config.tasks.default_category, "General");
    }

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(config_path(tmp.path()), sample_config()).unwrap();

        let doc = read_config_doc(tmp.path()).unwrap();
        write_config(tmp.path(), &doc).unwrap();

        let written = fs::read_to_string(config_path(tmp.path())).unwrap();
        assert_eq!(written, sample_config());
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(config_path(tmp.path()), "[tasks\n").unwrap();
        assert!(matches!(read_config(tmp.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_add_category_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert!(add_category(&mut doc, "Garden"));
        assert!(!add_category(&mut doc, "Work"));

        let result = doc.to_string();
        assert!(result.starts_with("# my lists"));
        let config: Config = toml::from_str(&result).unwrap();
        assert_eq!(config.tasks.categories, vec!["Work", "Errands", "Garden"]);
    }

    #[test]
    fn test_add_category_to_empty_doc_keeps_defaults() {
        let mut doc = toml_edit::DocumentMut::new();
        assert!(add_category(&mut doc, "Garden"));
        let config: Config = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(
            config.tasks.categories,
            vec!["General", "Work", "Personal", "Home", "Garden"]
        );
    }

    #[test]
    fn test_set_default_category() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_default_category(&mut doc, "Errands");
        let config: Config = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.tasks.default_category, "Errands");
    }
}
