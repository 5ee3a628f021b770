//! Application state shared by the UI loop.
//!
//! `App` turns operator actions into backend calls. Each call runs on its own task and
//! reports back through an [`AppEvent`], which the UI loop feeds to [`App::handle_event`].
//! All state mutation happens on the UI loop; spawned tasks only perform I/O.

use crate::bridge::DesktopBridge;
use crate::model::{
    ClientConfig, FetchTarget, FileList, LogBundle, NavigationState, RunOutcome, ServiceStatus,
    Tab,
};
use crate::orchestrator::{FetchTicket, Landing, RunController, SubmitRejected, TabFetcher};
use crate::remote::{Backend, RemoteError};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;

/// Completions reported by background tasks.
#[derive(Debug)]
pub(crate) enum AppEvent {
    LogsLoaded {
        ticket: FetchTicket,
        result: Result<LogBundle, RemoteError>,
    },
    FilesLoaded {
        ticket: FetchTicket,
        result: Result<FileList, RemoteError>,
    },
    RunFinished(Result<String, RemoteError>),
}

pub(crate) struct App {
    pub config: Arc<ClientConfig>,
    backend: Arc<dyn Backend>,
    bridge: Arc<dyn DesktopBridge>,
    events: UnboundedSender<AppEvent>,
    status: watch::Receiver<ServiceStatus>,

    pub nav: NavigationState,
    pub input: String,
    pub logs: TabFetcher<LogBundle>,
    pub files: TabFetcher<FileList>,
    pub run: RunController,
    /// One-line feedback for operator actions. Fetch failures are not reported here.
    pub info: String,
    pub log_scroll: usize,
    pub file_selected: usize,
}

impl App {
    pub fn new(
        config: Arc<ClientConfig>,
        backend: Arc<dyn Backend>,
        bridge: Arc<dyn DesktopBridge>,
        status: watch::Receiver<ServiceStatus>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let nav = NavigationState::new(config.initial_agent);
        Self {
            config,
            backend,
            bridge,
            events,
            status,
            nav,
            input: String::new(),
            logs: TabFetcher::default(),
            files: TabFetcher::default(),
            run: RunController::default(),
            info: String::new(),
            log_scroll: 0,
            file_selected: 0,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.status.borrow().clone()
    }

    pub fn tab(&self) -> Tab {
        self.nav.selected_tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if let Some(target) = self.nav.select_tab(tab) {
            self.log_scroll = 0;
            self.fetch(target);
        }
    }

    pub fn next_tab(&mut self) {
        self.select_tab(self.tab().next());
    }

    pub fn prev_tab(&mut self) {
        self.select_tab(self.tab().prev());
    }

    /// Manual re-fetch of the active data tab.
    pub fn refresh_active(&mut self) {
        match self.tab() {
            Tab::Logs => self.fetch(FetchTarget::Logs),
            Tab::Files => self.fetch(FetchTarget::Files),
            _ => {}
        }
    }

    fn fetch(&mut self, target: FetchTarget) {
        let backend = self.backend.clone();
        let tx = self.events.clone();
        match target {
            FetchTarget::Logs => {
                let ticket = self.logs.begin();
                let limit = self.config.log_limit;
                tracing::debug!(seq = ticket.seq(), "fetching logs");
                tokio::spawn(async move {
                    let result = backend.logs(limit).await;
                    let _ = tx.send(AppEvent::LogsLoaded { ticket, result });
                });
            }
            FetchTarget::Files => {
                let ticket = self.files.begin();
                tracing::debug!(seq = ticket.seq(), "fetching files");
                tokio::spawn(async move {
                    let result = backend.files().await;
                    let _ = tx.send(AppEvent::FilesLoaded { ticket, result });
                });
            }
        }
    }

    pub fn next_agent(&mut self) {
        self.nav.selected_agent = self.nav.selected_agent.next();
    }

    pub fn prev_agent(&mut self) {
        self.nav.selected_agent = self.nav.selected_agent.prev();
    }

    pub fn can_submit(&self) -> bool {
        self.run.can_submit(&self.input)
    }

    pub fn submit_run(&mut self) {
        let req = match self.run.submit(self.nav.selected_agent, &self.input) {
            Ok(req) => req,
            Err(SubmitRejected::EmptyInput) => {
                self.info = "Enter some input before running.".into();
                return;
            }
            Err(SubmitRejected::AlreadyRunning) => {
                tracing::debug!("run submit ignored: already running");
                return;
            }
        };
        tracing::info!(agent = ?req.agent, input_len = req.input.len(), "run started");
        self.info.clear();
        let backend = self.backend.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = backend.run(&req).await;
            let _ = tx.send(AppEvent::RunFinished(result));
        });
    }

    pub fn last_output(&self) -> Option<&RunOutcome> {
        self.run.outcome()
    }

    /// Files view only.
    pub fn open_outputs_folder(&mut self) {
        if self.tab() != Tab::Files {
            return;
        }
        match self.bridge.open_outputs_folder() {
            Ok(dir) => {
                tracing::info!(dir = %dir.display(), "opened outputs folder");
                self.info = format!("Opened {}", dir.display());
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "open outputs folder failed");
                self.info = format!("Could not open outputs folder: {e:#}");
            }
        }
    }

    pub fn scroll_down(&mut self) {
        match self.tab() {
            Tab::Logs => {
                if self.log_scroll < self.max_log_scroll() {
                    self.log_scroll += 1;
                }
            }
            Tab::Files => {
                let len = self.files.snapshot().map(|f| f.len()).unwrap_or(0);
                if self.file_selected + 1 < len {
                    self.file_selected += 1;
                }
            }
            _ => {}
        }
    }

    /// Last offset that still shows a line in the longer log pane.
    fn max_log_scroll(&self) -> usize {
        self.logs
            .snapshot()
            .map(|b| b.verify_events.len().max(b.spending_log.len()))
            .unwrap_or(0)
            .saturating_sub(1)
    }

    pub fn scroll_up(&mut self) {
        match self.tab() {
            Tab::Logs => self.log_scroll = self.log_scroll.saturating_sub(1),
            Tab::Files => self.file_selected = self.file_selected.saturating_sub(1),
            _ => {}
        }
    }

    pub fn handle_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::LogsLoaded { ticket, result } => {
                let err = result.as_ref().err().map(|e| e.to_string());
                match self.logs.land(ticket, result) {
                    Landing::Applied => {
                        self.log_scroll = self.log_scroll.min(self.max_log_scroll());
                    }
                    Landing::Stale => tracing::debug!(seq = ticket.seq(), "stale logs dropped"),
                    Landing::Failed => {
                        tracing::warn!(error = err.as_deref().unwrap_or(""), "logs fetch failed")
                    }
                }
            }
            AppEvent::FilesLoaded { ticket, result } => {
                let err = result.as_ref().err().map(|e| e.to_string());
                match self.files.land(ticket, result) {
                    Landing::Applied => {
                        let len = self.files.snapshot().map(|f| f.len()).unwrap_or(0);
                        self.file_selected = self.file_selected.min(len.saturating_sub(1));
                    }
                    Landing::Stale => tracing::debug!(seq = ticket.seq(), "stale files dropped"),
                    Landing::Failed => {
                        tracing::warn!(error = err.as_deref().unwrap_or(""), "files fetch failed")
                    }
                }
            }
            AppEvent::RunFinished(result) => {
                let ok = result.is_ok();
                if self.run.finish(result) {
                    tracing::info!(ok, "run finished");
                }
            }
        }
    }
}
