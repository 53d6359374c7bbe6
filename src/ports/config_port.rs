//! Read access to INI settings.

pub trait ConfigPort {
    /// Non-blank value of `[section] key`.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// A count such as a ranking length or batch size. Missing,
    /// unparsable and non-positive values give `default`.
    fn get_count(&self, section: &str, key: &str, default: usize) -> usize {
        let fallback = i64::try_from(default).unwrap_or(i64::MAX);
        usize::try_from(self.get_int(section, key, fallback))
            .ok()
            .filter(|n| *n >= 1)
            .unwrap_or(default)
    }
}
