use std::collections::BTreeMap;

use ivrbook_core::telephony::UNKNOWN_CALLER;

/// `agi_*` variables sent by the PBX before the first command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgiEnvironment {
    variables: BTreeMap<String, String>,
}

impl AgiEnvironment {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Parses one `agi_key: value` header line. Lines without a colon are
    /// ignored.
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some((key, value)) = line.split_once(':') {
            self.insert(key.trim(), value.trim());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn caller_id(&self) -> &str {
        match self.get("agi_callerid") {
            Some(value) if !value.is_empty() && !value.eq_ignore_ascii_case("unknown") => value,
            _ => UNKNOWN_CALLER,
        }
    }

    pub fn channel(&self) -> Option<&str> {
        self.get("agi_channel")
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.get("agi_uniqueid")
    }
}
