use std::path::Path;

use serde::Deserialize;

use crate::error::{ExtractError, Result};
use crate::genre::GenreConfig;

/// Optional TOML configuration. Every key has a default, so an empty file is valid.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub genre: GenreConfig,
    pub album: AlbumConfig,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct AlbumConfig {
    /// Extra literal strings removed from every album title
    pub extras: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genre::GenreMode;
    use std::io::Write;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
[genre]
mode = "psychedelic"
always_include = ["^hard", "core$"]
capitalize = true
maximum = 3

[album]
extras = ["Free Download"]
"#;
        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.genre.mode, GenreMode::Psychedelic);
        assert_eq!(cfg.genre.always_include, vec!["^hard", "core$"]);
        assert!(cfg.genre.capitalize);
        assert_eq!(cfg.genre.maximum, 3);
        assert_eq!(cfg.album.extras, vec!["Free Download"]);

        Ok(())
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let cfg: Config = toml::from_str("")?;

        assert_eq!(cfg.genre.mode, GenreMode::Progressive);
        assert!(cfg.genre.always_include.is_empty());
        assert!(!cfg.genre.capitalize);
        assert_eq!(cfg.genre.maximum, 0);
        assert!(cfg.album.extras.is_empty());

        Ok(())
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[genre]\nmode = \"baroque\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[genre]\nmode = \"classical\"")?;

        let cfg = Config::load(file.path())?;
        assert_eq!(cfg.genre.mode, GenreMode::Classical);

        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/bandcamp-extract.toml")).unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
    }
}
