//! Load dashboard: phase line, well gauge, committed-row breakdown, failed files

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;
use std::time::Instant;

use super::{Phase, Tally};

const NOTE_LINES: usize = 3;

pub struct Dashboard {
    phase: Phase,
    source: String,
    done: usize,
    total: usize,
    tally: Tally,
    failed: Vec<String>,
    notes: Vec<String>,
    started: Instant,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            phase: Phase::Reading,
            source: String::new(),
            done: 0,
            total: 0,
            tally: Tally::default(),
            failed: Vec::new(),
            notes: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_source(&mut self, source: String) {
        self.source = source;
    }

    pub fn well_loaded(&mut self, done: usize, total: usize, tally: Tally) {
        self.done = done;
        self.total = total;
        self.tally = tally;
    }

    pub fn file_failed(&mut self, message: &str) {
        self.failed.push(message.to_string());
    }

    pub fn note(&mut self, message: &str) {
        self.notes.push(message.to_string());
    }

    pub fn render(&self, frame: &mut Frame) {
        let [title, gauge, body, notes] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(NOTE_LINES as u16 + 2),
        ])
        .areas(frame.area());

        self.render_title(frame, title);
        self.render_gauge(frame, gauge);

        let [tally, failed] =
            Layout::horizontal([Constraint::Length(30), Constraint::Min(20)]).areas(body);
        self.render_tally(frame, tally);
        self.render_failed(frame, failed);
        self.render_notes(frame, notes);
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let phase_style = match self.phase {
            Phase::Complete => Style::default().fg(Color::Green),
            _ => Style::default().fg(Color::Cyan),
        }
        .add_modifier(Modifier::BOLD);

        let line = Line::from(vec![
            Span::styled(format!(" {} ", self.phase), phase_style),
            Span::styled(
                format!("{:.1}s  ", self.started.elapsed().as_secs_f64()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw(self.source.as_str()),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Core Inventory ");
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_gauge(&self, frame: &mut Frame, area: Rect) {
        let ratio = if self.total == 0 {
            0.0
        } else {
            (self.done as f64 / self.total as f64).min(1.0)
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Wells "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(ratio)
            .label(format!("{}/{}", self.done, self.total));
        frame.render_widget(gauge, area);
    }

    fn render_tally(&self, frame: &mut Frame, area: Rect) {
        let rows = [
            ("Wells", self.tally.wells),
            ("Files", self.tally.files),
            ("Boxes", self.tally.boxes),
        ]
        .into_iter()
        .map(|(name, count)| {
            Row::new(vec![
                Cell::from(name),
                Cell::from(count.to_string()).style(Style::default().fg(Color::Green)),
            ])
        });

        let table = Table::new(rows, [Constraint::Length(8), Constraint::Min(8)])
            .header(Row::new(vec!["Table", "Loaded"]).style(Style::default().fg(Color::Yellow)))
            .block(Block::default().borders(Borders::ALL).title(" Committed "));
        frame.render_widget(table, area);
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.failed.len().saturating_sub(visible);
        let items: Vec<ListItem> = self.failed[skip..]
            .iter()
            .map(|line| ListItem::new(line.as_str()).style(Style::default().fg(Color::Red)))
            .collect();

        let title = format!(" Failed files ({}) ", self.failed.len());
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn render_notes(&self, frame: &mut Frame, area: Rect) {
        let skip = self.notes.len().saturating_sub(NOTE_LINES);
        let lines: Vec<Line> = self.notes[skip..]
            .iter()
            .map(|note| Line::from(note.as_str()))
            .collect();
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }
}
