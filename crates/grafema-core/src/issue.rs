use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal diagnostic recorded during any phase. Issues never abort a
/// run by themselves; they accumulate on the `Manifest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub file: Option<String>,
    pub service: Option<String>,
}

impl Issue {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Warning,
            message: message.into(),
            file: None,
            service: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Error,
            message: message.into(),
            file: None,
            service: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

// Well-known issue codes used by the validation plugins.
pub mod codes {
    pub const BROKEN_IMPORT: &str = "ERR_BROKEN_IMPORT";
    pub const UNRESOLVED_CALL: &str = "ERR_UNRESOLVED_CALL";
    pub const UNREACHABLE_NODE: &str = "ERR_UNREACHABLE_NODE";
    pub const SHADOWED_BINDING: &str = "WARN_SHADOWED_BINDING";
    pub const EVAL_USE: &str = "ERR_EVAL_USE";
    pub const SQL_INJECTION_RISK: &str = "WARN_SQL_INJECTION_RISK";
    pub const DEAD_CODE: &str = "WARN_DEAD_CODE";
    pub const MODULE_CAP_REACHED: &str = "WARN_MODULE_CAP_REACHED";
    pub const DEPTH_CAP_REACHED: &str = "WARN_DEPTH_CAP_REACHED";
    pub const PARSE_FAILED: &str = "ERR_PARSE_FAILED";
    pub const FILE_ACCESS_FAILED: &str = "ERR_FILE_ACCESS_FAILED";
    pub const ANALYSIS_FAILED: &str = "ERR_ANALYSIS_FAILED";
    pub const PLUGIN_FAILED: &str = "ERR_PLUGIN_FAILED";
    pub const DANGLING_DATA_FLOW_EDGE: &str = "ERR_DANGLING_DATA_FLOW_EDGE";
}
