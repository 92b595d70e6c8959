use crate::issue::Issue;
use crate::types::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Library,
    Application,
    Service,
    Unknown,
}

/// One service discovered by the Discovery phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub root: String,
    pub entrypoint: String,
    pub service_type: ServiceType,
    pub language: Language,
    #[serde(default)]
    pub test_files: Vec<String>,
}

/// The output of a full (or partial) orchestrator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub services: Vec<ServiceDescriptor>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub cancelled: bool,
}

impl Manifest {
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i.severity, crate::issue::Severity::Error))
    }

    pub fn push_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}
