//! Parsing of proj4-style parameter strings.
//!
//! Only the tokenization and numeric lookup live here; each projection decides
//! which parameters it understands. Tokens are `+key=value` or `+flag`; the
//! leading `+` is optional because some archive files write `y_0=0`.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ProjectionError, ProjectionResult};

/// Parsed proj4 parameters, keyed by name without the leading `+`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Proj4Params {
    params: BTreeMap<String, Option<String>>,
}

impl Proj4Params {
    /// Tokenize a proj4 string.
    ///
    /// Trailing NUL padding from fixed-length string attributes is ignored.
    pub fn parse(definition: &str) -> ProjectionResult<Self> {
        let definition = definition.trim_end_matches('\0').trim();
        if definition.is_empty() {
            return Err(ProjectionError::InvalidDefinition(
                "empty definition".to_string(),
            ));
        }

        let mut params = BTreeMap::new();
        for token in definition.split_whitespace() {
            let token = token.trim_start_matches('+');
            if token.is_empty() {
                continue;
            }

            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key, Some(value.to_string())),
                None => (token, None),
            };

            if key.is_empty() {
                return Err(ProjectionError::InvalidDefinition(format!(
                    "token '{}' has no name",
                    token
                )));
            }
            params.insert(key.to_string(), value);
        }

        Ok(Self { params })
    }

    /// Raw value of a parameter, if present with a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }

    /// Whether a parameter or flag is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Numeric value of a parameter.
    ///
    /// Returns `Ok(None)` when absent and an error when present but not a number.
    pub fn get_f64(&self, key: &str) -> ProjectionResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
                ProjectionError::InvalidDefinition(format!("{}={} is not a number", key, raw))
            }),
        }
    }

    /// Name of the projection (`proj=...`).
    pub fn projection_name(&self) -> Option<&str> {
        self.get("proj")
    }
}

impl fmt::Display for Proj4Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        // `proj` leads, as proj4 readers expect.
        if let Some(name) = self.projection_name() {
            write!(f, "+proj={}", name)?;
            first = false;
        }
        for (key, value) in self.params.iter().filter(|(k, _)| k.as_str() != "proj") {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match value {
                Some(v) => write!(f, "+{}={}", key, v)?,
                None => write!(f, "+{}", key)?,
            }
        }
        Ok(())
    }
}
