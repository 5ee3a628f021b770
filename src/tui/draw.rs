use super::help::draw_help;
use crate::app::App;
use crate::model::{AgentKind, FileEntry, ServiceStatus, Tab};
use crate::orchestrator::RunState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};
use time::macros::format_description;
use time::UtcOffset;

pub(crate) fn draw(area: Rect, f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // status
                Constraint::Length(3), // tabs
                Constraint::Min(0),
                Constraint::Length(1), // info
            ]
            .as_ref(),
        )
        .split(area);

    draw_status(chunks[0], f, &app.status(), &app.config.base_url);

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| Line::from(t.title())).collect::<Vec<_>>())
        .select(app.tab().index())
        .block(Block::default().borders(Borders::ALL).title("agent-desk"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[1]);

    match app.tab() {
        Tab::Run => draw_run(chunks[2], f, app),
        Tab::Logs => draw_logs(chunks[2], f, app),
        Tab::Files => draw_files(chunks[2], f, app),
        Tab::Help => draw_help(chunks[2], f),
    }

    if !app.info.is_empty() {
        let info = Paragraph::new(Line::from(vec![
            Span::styled("Info: ", Style::default().fg(Color::Gray)),
            Span::raw(app.info.as_str()),
        ]));
        f.render_widget(info, chunks[3]);
    }
}

/// Header text for the service status panel.
pub(crate) fn status_lines(status: &ServiceStatus) -> [String; 2] {
    [
        format!(
            "Backend: {}",
            if status.online { "online" } else { "offline" }
        ),
        format!("Budget remaining: {}", status.budget_remaining),
    ]
}

fn draw_status(area: Rect, f: &mut Frame, status: &ServiceStatus, base_url: &str) {
    let [backend, budget] = status_lines(status);
    let color = if status.online {
        Color::Green
    } else {
        Color::Red
    };
    let p = Paragraph::new(Line::from(vec![
        Span::styled(backend, Style::default().fg(color)),
        Span::raw("   "),
        Span::raw(budget),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Service ({base_url})")),
    );
    f.render_widget(p, area);
}

/// The run trigger; greyed out while a run is in flight or the input is blank.
pub(crate) fn run_trigger(app: &App) -> Span<'static> {
    if let RunState::Running(req) = app.run.state() {
        Span::styled(
            format!("[ Running {}… ]", req.agent.label()),
            Style::default().fg(Color::DarkGray),
        )
    } else if app.can_submit() {
        Span::styled(
            "[ Run ]",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("[ Run ]", Style::default().fg(Color::DarkGray))
    }
}

fn agent_selector(selected: AgentKind) -> Line<'static> {
    let mut spans = vec![Span::raw("Agent: ")];
    for (i, agent) in AgentKind::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if *agent == selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", agent.label()), style));
    }
    spans.push(Span::styled("  (←/→)", Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

fn draw_run(area: Rect, f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    f.render_widget(Paragraph::new(agent_selector(app.nav.selected_agent)), rows[0]);

    let input = Paragraph::new(Line::from(vec![
        Span::raw(app.input.as_str()),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Input"));
    f.render_widget(input, rows[1]);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            run_trigger(app),
            Span::styled("  enter to run", Style::default().fg(Color::DarkGray)),
        ])),
        rows[2],
    );

    let (text, style) = if app.run.is_running() {
        ("Running…".to_string(), Style::default().fg(Color::DarkGray))
    } else {
        match app.last_output() {
            Some(out) if out.is_err() => (out.text().to_string(), Style::default().fg(Color::Red)),
            Some(out) => (out.text().to_string(), Style::default()),
            None => (
                "No output yet.".to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        }
    };
    let output = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Output"));
    f.render_widget(output, rows[3]);
}

fn draw_logs(area: Rect, f: &mut Frame, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let placeholder = if app.logs.is_pending() {
        "Loading…"
    } else {
        "No data."
    };
    let scroll = app.log_scroll.min(u16::MAX as usize) as u16;
    let bundle = app.logs.snapshot();
    f.render_widget(
        log_pane(
            "Verify events",
            bundle.map(|b| b.verify_events.as_slice()),
            placeholder,
            scroll,
        ),
        cols[0],
    );
    f.render_widget(
        log_pane(
            "Spending log",
            bundle.map(|b| b.spending_log.as_slice()),
            placeholder,
            scroll,
        ),
        cols[1],
    );
}

fn log_pane<'a>(
    title: &str,
    lines: Option<&'a [String]>,
    placeholder: &'static str,
    scroll: u16,
) -> Paragraph<'a> {
    let (body, count): (Vec<Line<'a>>, usize) = match lines {
        Some(v) if !v.is_empty() => (v.iter().map(|l| Line::from(l.as_str())).collect(), v.len()),
        Some(_) => (vec![Line::from("(empty)")], 0),
        None => (vec![Line::from(placeholder)], 0),
    };
    Paragraph::new(body).scroll((scroll, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} ({count})")),
    )
}

fn draw_files(area: Rect, f: &mut Frame, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(Line::from(vec![
        Span::raw(format!("Outputs ({}) - ", app.config.outputs_dir.display())),
        Span::styled("o", Style::default().fg(Color::Magenta)),
        Span::raw(": open folder, "),
        Span::styled("r", Style::default().fg(Color::Magenta)),
        Span::raw(": refresh"),
    ]));

    let Some(files) = app.files.snapshot() else {
        let msg = if app.files.is_pending() {
            "Loading…"
        } else {
            "No data."
        };
        f.render_widget(Paragraph::new(msg).block(block), area);
        return;
    };

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let rows: Vec<Row> = files
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.name.clone()),
                Cell::from(format_size(e.size)),
                Cell::from(format_modified(e, offset)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(17),
        ],
    )
    .header(
        Row::new(vec!["Name", "Size", "Modified"]).style(Style::default().fg(Color::Gray)),
    )
    .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
    .block(block);

    let mut state = TableState::default().with_selected(if files.is_empty() {
        None
    } else {
        Some(app.file_selected)
    });
    f.render_stateful_widget(table, area, &mut state);
}

pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut v = bytes as f64 / 1024.0;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    format!("{v:.1} {}", UNITS[unit])
}

/// Local `YYYY-MM-DD HH:MM`, or the raw backend string if it does not parse.
pub(crate) fn format_modified(entry: &FileEntry, offset: UtcOffset) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]");
    entry
        .modified_at()
        .and_then(|t| t.to_offset(offset).format(&fmt).ok())
        .unwrap_or_else(|| entry.modified.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::harness;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f.area(), f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn status_lines_follow_poller_state() {
        let mut s = ServiceStatus {
            online: true,
            budget_remaining: "$4.20".into(),
        };
        assert_eq!(
            status_lines(&s),
            ["Backend: online".to_string(), "Budget remaining: $4.20".to_string()]
        );
        s.mark_offline();
        assert_eq!(
            status_lines(&s),
            ["Backend: offline".to_string(), "Budget remaining: $4.20".to_string()]
        );
    }

    #[tokio::test]
    async fn header_shows_status_and_budget() {
        let h = harness();
        h.status_tx.send_replace(ServiceStatus {
            online: true,
            budget_remaining: "$4.20".into(),
        });
        let screen = render(&h.app);
        assert!(screen.contains("Backend: online"));
        assert!(screen.contains("Budget remaining: $4.20"));

        h.status_tx.send_modify(ServiceStatus::mark_offline);
        let screen = render(&h.app);
        assert!(screen.contains("Backend: offline"));
        assert!(screen.contains("Budget remaining: $4.20"));
    }

    #[tokio::test]
    async fn run_trigger_is_disabled_for_blank_input() {
        let mut h = harness();
        h.app.input = "  ".into();
        assert_eq!(run_trigger(&h.app).style.fg, Some(Color::DarkGray));
        h.app.input = "draft a plan".into();
        assert_eq!(run_trigger(&h.app).style.fg, Some(Color::Yellow));
    }

    #[tokio::test]
    async fn output_is_rendered_verbatim() {
        let mut h = harness();
        h.app.input = "x".into();
        h.app.submit_run();
        h.app
            .handle_event(crate::app::AppEvent::RunFinished(Ok("X marks the spot".into())));
        let screen = render(&h.app);
        assert!(screen.contains("X marks the spot"));
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_raw_text() {
        let e = FileEntry {
            name: "a".into(),
            size: 0,
            modified: "sometime".into(),
        };
        assert_eq!(format_modified(&e, UtcOffset::UTC), "sometime");
        let e = FileEntry {
            modified: "2024-05-01T10:20:30Z".into(),
            ..e
        };
        assert_eq!(format_modified(&e, UtcOffset::UTC), "2024-05-01 10:20");
    }
}
