//! Locating and reading the editor config file.

use directories::ProjectDirs;
use isegrid_core::EditorConfig;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Load the editor config.
///
/// An explicit `config_file` wins over the user config dir. Problems never
/// abort startup: they are returned as warnings and the defaults are used.
pub fn load_config(config_file: Option<&Path>) -> (EditorConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (EditorConfig::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (EditorConfig::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(config) => Some(config),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read {}: {}", path.display(), err));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

pub fn parse_config(content: &str) -> Result<EditorConfig, toml::de::Error> {
    toml::from_str(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "isegrid")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isegrid_core::{CommitDirection, ReactivatePolicy};
    use isegrid_model::Shape;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
commit_direction = "right"
reactivate_policy = "cancel"
max_suggestions = 5
background_suggestions = true
keywords = ["NULL"]

[[functions]]
name = "FOOSUM"
signature = "FOOSUM(range)"

[[schemas]]
sheet = "Sheet1"
column = "B"
shape = { shape = "scalar", kinds = ["number"] }
"#,
        )
        .unwrap();
        assert_eq!(config.commit_direction, CommitDirection::Right);
        assert_eq!(config.reactivate_policy, ReactivatePolicy::Cancel);
        assert_eq!(config.max_suggestions, 5);
        assert!(config.background_suggestions);
        assert_eq!(config.functions[0].name, "FOOSUM");
        assert_eq!(config.keywords, vec!["NULL".to_string()]);
        assert!(matches!(config.schemas[0].shape, Shape::Scalar { .. }));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        assert!(parse_config("commit_directon = \"up\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, EditorConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn test_bad_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_suggestions = \"many\"").unwrap();
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, EditorConfig::default());
        assert!(warnings[0].starts_with("Failed to parse"));
    }

    #[test]
    fn test_oversized_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let padding = "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1);
        std::fs::write(&path, padding).unwrap();
        let (_, warnings) = load_config(Some(&path));
        assert!(warnings[0].contains("too large"));
    }
}
