//! INI file configuration adapter.
//!
//! Sections: `[data]`, `[analysis]`, `[backtest]`, `[report]`. Key lookup is
//! case-insensitive (configparser lowercases keys and sections).

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Override a single value, e.g. from a command-line flag.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.config.set(section, key, Some(value.to_string()));
    }

    /// Blank values count as missing, like `get_non_empty`.
    fn is_blank(&self, section: &str, key: &str) -> bool {
        self.get_non_empty(section, key).is_none()
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn try_get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        if self.is_blank(section, key) {
            return Ok(None);
        }
        self.config.getint(section, key)
    }

    fn try_get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        if self.is_blank(section, key) {
            return Ok(None);
        }
        self.config.getfloat(section, key)
    }
}
