use std::str::FromStr;

/// Collects one message per violated field so a write can be rejected as a
/// whole instead of failing on the first problem.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: String) {
        self.0.push(message);
    }

    /// Trims a required string field; blank counts as missing.
    pub fn required(&mut self, path: &str, value: Option<String>) -> Option<String> {
        let value = trimmed(value);
        if value.is_none() {
            self.push(format!("Path `{path}` is required."));
        }
        value
    }

    /// Parses an optional enumeration field. Absent or blank yields `None`
    /// without an error.
    pub fn enumeration<E: FromStr>(&mut self, path: &str, value: Option<String>) -> Option<E> {
        let raw = trimmed(value)?;
        match raw.parse::<E>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.push(format!("`{raw}` is not a valid enum value for path `{path}`."));
                None
            }
        }
    }

    pub fn required_enumeration<E: FromStr>(
        &mut self,
        path: &str,
        value: Option<String>,
    ) -> Option<E> {
        if trimmed(value.clone()).is_none() {
            self.push(format!("Path `{path}` is required."));
            return None;
        }
        self.enumeration(path, value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Vec<String>> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.0)
        }
    }
}

pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

pub fn upper_trimmed(value: Option<String>) -> Option<String> {
    trimmed(value).map(|raw| raw.to_uppercase())
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
