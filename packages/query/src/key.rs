use std::collections::BTreeMap;
use std::fmt;

/// Cache key: an operation scope plus its parameter set.
///
/// Parameters are kept sorted so insertion order never produces distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    scope: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Add the parameter only when a value is present
    pub fn with_optional_param<V: ToString>(
        self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with_param(name, value),
            None => self,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn in_scope(&self, scope: &str) -> bool {
        self.scope == scope
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope)?;
        if self.params.is_empty() {
            return Ok(());
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{{{}}}", params.join(","))
    }
}
