use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Tone};

const INPUT_LABEL: &str = "Player id or name: ";

/// Render the full TUI frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Length(3), // input
            Constraint::Length(1), // status
            Constraint::Length(1), // settings
            Constraint::Min(0),
            Constraint::Length(1), // help bar
        ])
        .split(frame.area());

    // ── Title bar ───────────────────────────────────────────────
    let title = Paragraph::new(Line::from(Span::styled(
        " osu! unban checker",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(Color::Cyan));
    frame.render_widget(title, chunks[0]);

    // ── Input ───────────────────────────────────────────────────
    // Keep the end of the input and one free column for the cursor in view
    let label_width = INPUT_LABEL.width();
    let inner_width = usize::from(chunks[1].width.saturating_sub(2));
    let room = inner_width.saturating_sub(label_width + 1);
    let (shown, shown_width) = visible_tail(&app.input, room);

    let input = Paragraph::new(Line::from(vec![
        Span::styled(INPUT_LABEL, Style::default().fg(Color::DarkGray)),
        Span::raw(shown),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(input, chunks[1]);

    let offset = u16::try_from(label_width + shown_width).unwrap_or(u16::MAX);
    let cursor_x = chunks[1].x.saturating_add(1).saturating_add(offset);
    let max_x = chunks[1].right().saturating_sub(2);
    frame.set_cursor_position((cursor_x.min(max_x), chunks[1].y.saturating_add(1)));

    // ── Status ──────────────────────────────────────────────────
    let status = Paragraph::new(Line::from(Span::styled(
        format!(" {}", app.status),
        tone_style(app.tone),
    )));
    frame.render_widget(status, chunks[2]);

    // ── Settings ────────────────────────────────────────────────
    let checkbox = if app.popup_on_unban { "[x]" } else { "[ ]" };
    let ago = match app.last_report.map(|at| at.elapsed().as_secs()) {
        None => String::new(),
        Some(0) => String::from("  · updated just now"),
        Some(secs) if secs < 60 => format!("  · updated {secs}s ago"),
        Some(secs) => format!("  · updated {}m ago", secs / 60),
    };
    let settings = Paragraph::new(Line::from(vec![
        Span::raw(format!(" {checkbox} Show pop-up on unban")),
        Span::styled(ago, Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(settings, chunks[3]);

    // ── Help bar ────────────────────────────────────────────────
    let help = " Enter: check now | Tab: toggle pop-up | Ctrl-U: clear | Esc: quit ";
    let help_bar = Paragraph::new(Line::from(Span::styled(
        help,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help_bar, chunks[5]);

    if app.popup_visible {
        draw_popup(frame);
    }
}

fn draw_popup(frame: &mut Frame) {
    let area = centered(frame.area(), 28, 5);
    let popup = Paragraph::new(vec![
        Line::from(Span::styled(
            "Unbanned!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(Span::styled(
            "any key to close",
            Style::default().fg(Color::DarkGray),
        ))
        .centered(),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

/// Longest suffix of `input` that fits in `width` terminal columns, with its
/// display width.
fn visible_tail(input: &str, width: usize) -> (&str, usize) {
    let mut used = 0;
    let mut start = input.len();
    for (idx, c) in input.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    (&input[start..], used)
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Pending => Style::default().fg(Color::Gray),
        Tone::Banned => Style::default().fg(Color::Red),
        Tone::Unbanned => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Tone::Warning => Style::default().fg(Color::Yellow),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::{StatusReport, StatusUpdate};
    use ratatui::{backend::TestBackend, layout::Position, Terminal};

    fn draw_into(app: &App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(app: &App) -> String {
        screen(&draw_into(app))
    }

    #[test]
    fn shows_input_and_initial_status() {
        let screen = render(&App::new("948713", true));
        assert!(screen.contains("Player id or name: 948713"));
        assert!(screen.contains("Waiting for first refresh..."));
        assert!(screen.contains("[x] Show pop-up on unban"));
    }

    #[test]
    fn popup_overlays_on_unban() {
        let mut app = App::new("x", true);
        app.apply(StatusUpdate {
            generation: 1,
            report: StatusReport::Unbanned {
                player: "x".into(),
                username: "x".into(),
            },
        });
        assert!(render(&app).contains("Unbanned!"));
    }

    #[test]
    fn very_long_input_keeps_cursor_inside_the_box() {
        let mut app = App::new("", true);
        app.insert_str(&"a".repeat(65_516));
        app.push_char('z');

        let mut terminal = draw_into(&app);
        let rows = screen(&terminal);
        let input_row = rows.lines().nth(2).unwrap();
        assert!(input_row.contains("Player id or name: aaaa"));
        // Tail of the input, then the free cursor column, then the border
        assert!(input_row.contains("az │"));

        // 60 columns wide box: last inner column is 58
        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(58, 2));
    }

    #[test]
    fn cursor_follows_display_width_of_wide_chars() {
        let mut terminal = draw_into(&App::new("日本", true));
        // border + label (19) + two double-width chars
        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(24, 2));
    }

    #[test]
    fn tail_is_cut_on_char_boundaries() {
        assert_eq!(visible_tail("peppy", 10), ("peppy", 5));
        assert_eq!(visible_tail("peppy", 3), ("ppy", 3));
        assert_eq!(visible_tail("日本語", 5), ("本語", 4));
        assert_eq!(visible_tail("abc", 0), ("", 0));
    }
}
