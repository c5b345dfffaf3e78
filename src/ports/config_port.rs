//! Configuration access port trait.
//!
//! The `try_` getters distinguish a missing key (`Ok(None)`) from one that is
//! present but does not parse (`Err`). Getters with a default fall back to it
//! in both cases; `domain::config_validation` uses the `try_` forms so that a
//! malformed value is rejected before it can be defaulted.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn try_get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn try_get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.try_get_int(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.try_get_double(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    /// Trimmed value, `None` when missing or blank.
    fn get_non_empty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
