use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{what}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Ctrl-C", 6, "Quit"),
        key_line("q", 11, "Quit (outside the Run tab)"),
        key_line("tab", 9, "Next tab"),
        key_line("shift-tab", 3, "Previous tab"),
        key_line("F1-F4", 7, "Jump to Run / Logs / Files / Help"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Run tab:"),
        key_line("←/→", 9, "Select agent"),
        key_line("enter", 7, "Run with the current input"),
        key_line("backspace", 3, "Delete last character"),
        key_line("esc", 9, "Clear input"),
        key_line("Ctrl-Y", 6, "Copy last output to clipboard"),
        Line::from(""),
        Line::from("Logs / Files tabs:"),
        key_line("↑/↓", 9, "Scroll / select"),
        key_line("j/k", 9, "Scroll / select"),
        key_line("r", 11, "Refresh"),
        key_line("o", 11, "Open outputs folder (Files)"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Note: ", Style::default().fg(Color::Gray)),
            Span::raw("Logs and Files load when you switch to them; status refreshes in the background."),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
