use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, Widget, Wrap},
};
use tacho::{
    clock::Clock,
    export::{ROTATIONS_HEADER, TIME_HEADER},
    session::SessionStatus,
    Entry,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

const INSTRUCTIONS: [&str; 5] = [
    "1. Attach tape or another clear marking onto a part of the outside of the spinning object.",
    "2. Spin the object. You can make it speed up or slow down.",
    "3. Press the mark key every time the marking reaches a specific location in its rotation.",
    "4. Recording begins at the first mark after start and ends when you stop.",
    "5. On quit the table is printed so you can paste it into a spreadsheet or Desmos.",
];

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(INSTRUCTIONS.len() as u16 + 1),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "Tachometer",
            bold_style.fg(Color::Cyan),
        ))
        .alignment(Alignment::Left)
        .render(chunks[0], buf);

        let instructions: Vec<Line> = INSTRUCTIONS
            .iter()
            .map(|text| Line::from(Span::styled(*text, dim_style)))
            .collect();
        Paragraph::new(instructions)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        let command = if self.tacho.is_running() {
            ("x", "stop")
        } else {
            ("s", "start")
        };
        Paragraph::new(Line::from(vec![
            Span::styled(command.0, bold_style),
            Span::raw(format!(" {}   ", command.1)),
            Span::styled(self.settings.mark_key.to_string().to_lowercase(), bold_style),
            Span::raw(" mark   "),
            Span::styled("q", bold_style),
            Span::raw(" quit"),
        ]))
        .render(chunks[2], buf);

        status_line(self).render(chunks[3], buf);

        // Hidden until the first mark of a session, as a fresh start clears it
        if !self.tacho.entries().is_empty() {
            entries_table(self.tacho.entries(), chunks[4].height).render(chunks[4], buf);
        }
    }
}

fn status_line<C: Clock>(app: &App<C>) -> Paragraph<'static> {
    let line = match app.tacho.status() {
        SessionStatus::Running => {
            let mut spans = vec![
                Span::styled(
                    "RUNNING ",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{:.*} s", app.settings.decimals, app.tacho.elapsed()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ];
            if let Some(started) = app.started_at {
                spans.push(Span::styled(
                    format!("   started {}", started.format("%H:%M:%S")),
                    Style::default().add_modifier(Modifier::DIM),
                ));
            }
            if app.tacho.entries().is_empty() {
                spans.push(Span::styled(
                    "   waiting for first mark",
                    Style::default().fg(Color::Yellow),
                ));
            }
            Line::from(spans)
        }
        // elapsed() is stale once idle, so it is never shown here
        SessionStatus::Idle => Line::from(Span::styled(
            "IDLE",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )),
    };
    Paragraph::new(line)
}

fn entries_table(entries: &[Entry], height: u16) -> Table<'static> {
    // borders and header
    let visible = height.saturating_sub(3) as usize;
    let skip = entries.len().saturating_sub(visible);

    let header = Row::new(vec![TIME_HEADER, ROTATIONS_HEADER]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = entries
        .iter()
        .skip(skip)
        .map(|entry| {
            Row::new(vec![
                entry.elapsed_secs.to_string(),
                entry.index.to_string(),
            ])
        })
        .collect();

    let title = if skip > 0 {
        format!("Data ({} rows, newest shown)", entries.len())
    } else {
        "Data".to_string()
    };

    Table::new(rows, [Constraint::Length(14), Constraint::Length(10)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
}
