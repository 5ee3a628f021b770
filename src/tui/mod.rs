mod clipboard;
mod draw;
mod help;

use crate::app::{App, AppEvent};
use crate::bridge::{DesktopBridge, NativeBridge};
use crate::model::{ClientConfig, ServiceStatus, Tab};
use crate::orchestrator::spawn_status_poller;
use crate::remote::{Backend, RemoteClient};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run(cfg: ClientConfig) -> Result<()> {
    let cfg = Arc::new(cfg);
    let backend: Arc<dyn Backend> = Arc::new(RemoteClient::new(&cfg)?);
    let bridge: Arc<dyn DesktopBridge> = Arc::new(NativeBridge::new(cfg.outputs_dir.clone()));

    // Scoped to this function: dropping the handle on any exit path stops polling.
    let poller = spawn_status_poller(backend.clone(), cfg.poll_interval);
    let mut status_rx = poller.subscribe();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut app = App::new(cfg, backend, bridge, poller.subscribe(), event_tx);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let res = match Terminal::new(CrosstermBackend::new(stdout)).context("create terminal") {
        Ok(mut terminal) => {
            terminal.clear().ok();
            let res = event_loop(&mut terminal, &mut app, &mut event_rx, &mut status_rx).await;
            terminal.show_cursor().ok();
            res
        }
        Err(e) => Err(e),
    };

    tracing::debug!(online = poller.current().online, "shutting down");
    drop(poller);
    disable_raw_mode().ok();
    execute!(io::stdout(), LeaveAlternateScreen).ok();
    res
}

/// Single cooperative loop: terminal input, task completions and status changes all
/// resume here, and every state mutation happens on this task.
async fn event_loop(
    terminal: &mut Term,
    app: &mut App,
    event_rx: &mut UnboundedReceiver<AppEvent>,
    status_rx: &mut watch::Receiver<ServiceStatus>,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut status_open = true;

    loop {
        terminal
            .draw(|f| draw::draw(f.area(), f, app))
            .context("draw frame")?;

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(k))) => {
                    if k.kind == KeyEventKind::Press && handle_key(app, k) {
                        return Ok(());
                    }
                }
                // Resize and other events only need a redraw.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("read terminal input"),
                None => return Ok(()),
            },
            Some(ev) = event_rx.recv() => app.handle_event(ev),
            changed = status_rx.changed(), if status_open => {
                if changed.is_err() {
                    tracing::warn!("status poller stopped");
                    status_open = false;
                }
            }
        }
    }
}

/// Apply one key press. Returns true when the operator asked to quit.
fn handle_key(app: &mut App, k: KeyEvent) -> bool {
    match (k.modifiers, k.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return true,
        (_, KeyCode::Tab) => {
            app.next_tab();
            return false;
        }
        (_, KeyCode::BackTab) => {
            app.prev_tab();
            return false;
        }
        (_, KeyCode::F(n)) if (1..=4).contains(&n) => {
            app.select_tab(Tab::ALL[n as usize - 1]);
            return false;
        }
        _ => {}
    }

    if app.tab() == Tab::Run {
        handle_run_key(app, k);
        return false;
    }

    match k.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => app.select_tab(Tab::Help),
        KeyCode::Char('r') => app.refresh_active(),
        KeyCode::Char('o') => app.open_outputs_folder(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        _ => {}
    }
    false
}

fn handle_run_key(app: &mut App, k: KeyEvent) {
    match (k.modifiers, k.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
            app.info = match app.last_output() {
                Some(out) => match clipboard::copy_to_clipboard(out.text()) {
                    Ok(()) => "✓ Copied output to clipboard".into(),
                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                },
                None => "No output to copy yet.".into(),
            };
        }
        (_, KeyCode::Enter) => app.submit_run(),
        (_, KeyCode::Left) => app.prev_agent(),
        (_, KeyCode::Right) => app.next_agent(),
        (_, KeyCode::Backspace) => {
            app.input.pop();
        }
        (_, KeyCode::Esc) => app.input.clear(),
        (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.input.push(c);
        }
        _ => {}
    }
}
