use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Budget text shown before the first successful status poll.
pub const UNKNOWN_BUDGET: &str = "N/A";

#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    pub log_limit: usize,
    pub outputs_dir: PathBuf,
    pub user_agent: String,
    pub initial_agent: AgentKind,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            poll_interval: Duration::from_secs(5),
            log_limit: 200,
            outputs_dir: PathBuf::from("outputs"),
            user_agent: format!("agent-desk/{}", env!("CARGO_PKG_VERSION")),
            initial_agent: AgentKind::JobMachine,
        }
    }
}

/// Backend capabilities the operator can target with a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    #[default]
    JobMachine,
    Consultant,
    Analyst,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [
        AgentKind::JobMachine,
        AgentKind::Consultant,
        AgentKind::Analyst,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgentKind::JobMachine => "Job Machine",
            AgentKind::Consultant => "Consultant",
            AgentKind::Analyst => "Analyst",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub online: bool,
    pub budget_remaining: String,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self {
            online: false,
            budget_remaining: UNKNOWN_BUDGET.into(),
        }
    }
}

impl ServiceStatus {
    /// Degrade after a failed poll: offline, but keep the last known budget.
    pub fn mark_offline(&mut self) {
        self.online = false;
    }
}

impl From<StatusResponse> for ServiceStatus {
    fn from(r: StatusResponse) -> Self {
        Self {
            online: r.backend_online,
            budget_remaining: r.budget_remaining,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub agent: AgentKind,
    pub input: String,
}

/// Last completed run, kept distinct from its rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Ok(String),
    Err(String),
}

impl RunOutcome {
    pub fn text(&self) -> &str {
        match self {
            RunOutcome::Ok(s) | RunOutcome::Err(s) => s,
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self, RunOutcome::Err(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBundle {
    #[serde(default)]
    pub verify_events: Vec<String>,
    #[serde(default)]
    pub spending_log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// ISO-8601 as sent by the backend; see [`FileEntry::modified_at`].
    pub modified: String,
}

impl FileEntry {
    /// Parse `modified`, accepting RFC 3339 or an offset-less ISO-8601 stamp (read as UTC).
    pub fn modified_at(&self) -> Option<OffsetDateTime> {
        let raw = self.modified.trim();
        if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Some(t);
        }
        PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT)
            .ok()
            .map(|t| t.assume_utc())
    }
}

pub type FileList = Vec<FileEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Run,
    Logs,
    Files,
    Help,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Run, Tab::Logs, Tab::Files, Tab::Help];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Run => "Run",
            Tab::Logs => "Logs",
            Tab::Files => "Files",
            Tab::Help => "Help",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Remote resource backing a tab that loads on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Logs,
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub selected_agent: AgentKind,
    pub selected_tab: Tab,
}

impl NavigationState {
    pub fn new(agent: AgentKind) -> Self {
        Self {
            selected_agent: agent,
            selected_tab: Tab::Run,
        }
    }

    /// Switch tabs. Returns the resource to fetch when this is a transition *into* Logs or Files.
    pub fn select_tab(&mut self, tab: Tab) -> Option<FetchTarget> {
        let previous = std::mem::replace(&mut self.selected_tab, tab);
        if previous == tab {
            return None;
        }
        match tab {
            Tab::Logs => Some(FetchTarget::Logs),
            Tab::Files => Some(FetchTarget::Files),
            _ => None,
        }
    }
}

// Wire shapes for the backend's JSON contract.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "backendOnline")]
    pub backend_online: bool,
    #[serde(rename = "budgetRemaining")]
    pub budget_remaining: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_offline_with_known_budget_text() {
        let s = ServiceStatus::default();
        assert!(!s.online);
        assert_eq!(s.budget_remaining, UNKNOWN_BUDGET);
    }

    #[test]
    fn agent_wire_names_are_snake_case() {
        let req = RunRequest {
            agent: AgentKind::JobMachine,
            input: "hello".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, serde_json::json!({"agent": "job_machine", "input": "hello"}));
    }

    #[test]
    fn agent_cycle_wraps_both_ways() {
        assert_eq!(AgentKind::Analyst.next(), AgentKind::JobMachine);
        assert_eq!(AgentKind::JobMachine.prev(), AgentKind::Analyst);
    }

    #[test]
    fn entering_a_data_tab_requests_one_fetch() {
        let mut nav = NavigationState::new(AgentKind::Consultant);
        assert_eq!(nav.select_tab(Tab::Files), Some(FetchTarget::Files));
        // Re-selecting the active tab is not a transition.
        assert_eq!(nav.select_tab(Tab::Files), None);
        assert_eq!(nav.select_tab(Tab::Help), None);
        assert_eq!(nav.select_tab(Tab::Logs), Some(FetchTarget::Logs));
        assert_eq!(nav.select_tab(Tab::Run), None);
    }

    #[test]
    fn status_response_uses_camel_case_keys() {
        let r: StatusResponse =
            serde_json::from_str(r#"{"backendOnline":true,"budgetRemaining":"$4.20"}"#).unwrap();
        let s = ServiceStatus::from(r);
        assert!(s.online);
        assert_eq!(s.budget_remaining, "$4.20");
    }

    #[test]
    fn analyst_response_with_artifact_link_still_decodes() {
        let r: RunResponse = serde_json::from_str(
            r#"{"output":"Analyst output:\n- ok","xlsx_link":"/artifacts/analyst_1.xlsx"}"#,
        )
        .unwrap();
        assert_eq!(r.output, "Analyst output:\n- ok");
    }

    #[test]
    fn file_timestamps_parse_with_or_without_offset() {
        let with_z = FileEntry {
            name: "a.xlsx".into(),
            size: 1,
            modified: "2024-05-01T10:20:30Z".into(),
        };
        let naive = FileEntry {
            modified: "2024-05-01T10:20:30.123456".into(),
            ..with_z.clone()
        };
        let junk = FileEntry {
            modified: "yesterday".into(),
            ..with_z.clone()
        };
        assert_eq!(with_z.modified_at().unwrap().hour(), 10);
        assert_eq!(naive.modified_at().unwrap().minute(), 20);
        assert!(junk.modified_at().is_none());
    }
}
