//! Configuration utility functions
//!
//! Helpers for reading typed override values. Every helper takes a lookup
//! function so callers can read from the process environment or from a map.

use std::path::PathBuf;

/// Reads a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get a string value from the lookup or use the default
pub fn get_string<L>(lookup: &L, key: &str, default: String) -> String
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or(default)
}

/// Get a path value from the lookup or use the default
pub fn get_path<L>(lookup: &L, key: &str, default: PathBuf) -> PathBuf
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key).map(PathBuf::from).unwrap_or(default)
}

/// Get a boolean value from the lookup or use the default
pub fn get_bool<L>(lookup: &L, key: &str, default: bool) -> bool
where
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val.eq_ignore_ascii_case("true") || val == "1",
        None => default,
    }
}

/// Get a u8 value from the lookup or use the default
pub fn get_u8<L>(lookup: &L, key: &str, default: u8) -> u8
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|val| val.parse().ok()).unwrap_or(default)
}

/// Get a usize value from the lookup or use the default
pub fn get_usize<L>(lookup: &L, key: &str, default: usize) -> usize
where
    L: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|val| val.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_get_bool_accepts_true_and_one() {
        let lookup = lookup_from(&[("A", "TRUE"), ("B", "1"), ("C", "no")]);
        assert!(get_bool(&lookup, "A", false));
        assert!(get_bool(&lookup, "B", false));
        assert!(!get_bool(&lookup, "C", true));
        assert!(get_bool(&lookup, "MISSING", true));
    }

    #[test]
    fn test_numeric_parse_falls_back_on_garbage() {
        let lookup = lookup_from(&[("THREADS", "four"), ("CRF", "23")]);
        assert_eq!(get_usize(&lookup, "THREADS", 2), 2);
        assert_eq!(get_u8(&lookup, "CRF", 18), 23);
    }
}
