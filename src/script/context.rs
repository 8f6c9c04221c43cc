//! Per-case execution environment

use std::collections::HashMap;

use crate::driver::Driver;

/// State shared by every command of one test case run
pub struct Context<'d> {
    driver: &'d mut dyn Driver,
    base_url: String,
    variables: HashMap<String, String>,
    last_value: Option<String>,
}

impl<'d> Context<'d> {
    pub fn new(driver: &'d mut dyn Driver, base_url: impl Into<String>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            variables: HashMap::new(),
            last_value: None,
        }
    }

    pub fn driver(&mut self) -> &mut (dyn Driver + 'd) {
        &mut *self.driver
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `url` against the base URL; absolute URLs pass through
    pub fn resolve_url(&self, url: &str) -> String {
        if url.contains("://") || self.base_url.is_empty() {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Value produced by the most recent driver command
    pub fn last_value(&self) -> Option<&str> {
        self.last_value.as_deref()
    }

    pub fn set_last_value(&mut self, value: Option<String>) {
        self.last_value = value;
    }

    /// Replace `${name}` with the variable's value. Unknown names are kept.
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.var(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&rest[start..start + end + 3]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
