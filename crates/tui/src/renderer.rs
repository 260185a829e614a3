use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use scrolly_core::{AnimationMode, Phase};

use crate::page::{Page, SectionView, VIEWPORT_HEIGHT};

const SCROLL_STEP: f64 = 40.0;
/// Poll interval while something animates (~60 fps).
const FRAME: Duration = Duration::from_millis(16);
const IDLE: Duration = Duration::from_millis(100);

/// Grey level for an opacity in [0, 1], so fading items fade on screen.
fn shade(opacity: f64) -> Color {
    let level = (40.0 + 215.0 * opacity.clamp(0.0, 1.0)) as u8;
    Color::Rgb(level, level, level)
}

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Pending => Color::DarkGray,
        Phase::Enter => Color::Cyan,
        Phase::Hold => Color::Green,
        Phase::Exit => Color::Yellow,
        Phase::Done => Color::DarkGray,
    }
}

fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn run(page: &mut Page) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut last = Instant::now();
    loop {
        let now = Instant::now();
        page.tick(now.duration_since(last).as_secs_f64());
        last = now;

        terminal.draw(|frame| draw(frame, page))?;

        let wait = if page.is_animating() { FRAME } else { IDLE };
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Down | KeyCode::Char('j') => page.scroll_by(SCROLL_STEP),
                    KeyCode::Up | KeyCode::Char('k') => page.scroll_by(-SCROLL_STEP),
                    KeyCode::PageDown | KeyCode::Char(' ') => page.scroll_by(VIEWPORT_HEIGHT),
                    KeyCode::PageUp => page.scroll_by(-VIEWPORT_HEIGHT),
                    KeyCode::Home => page.scroll_to(0.0),
                    KeyCode::End => page.scroll_to(page.max_offset()),
                    KeyCode::Char('m') => page.toggle_mobile(),
                    _ => {}
                },
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => page.scroll_by(SCROLL_STEP),
                    MouseEventKind::ScrollUp => page.scroll_by(-SCROLL_STEP),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}

fn draw(frame: &mut Frame, page: &Page) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let mode = match page.mode() {
        AnimationMode::Pinned => "pinned",
        AnimationMode::Stacked => "stacked",
    };
    let header = Paragraph::new(format!(
        " scrolly preview | scroll {:>6.0} / {:.0} | {} | {}",
        page.offset(),
        page.max_offset(),
        if page.is_mobile() { "mobile 400px" } else { "desktop 1280px" },
        mode,
    ))
    .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, rows[0]);

    let footer = Paragraph::new(" ↑↓/jk scroll | PgUp/PgDn page | Home/End | m toggle mobile | q quit ")
        .style(Style::default().fg(Color::Gray).bg(Color::Black));
    frame.render_widget(footer, rows[2]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(rows[1]);
    draw_minimap(frame, columns[0], page);

    let mut constraints = vec![Constraint::Length(4)];
    constraints.extend(
        page.sections()
            .iter()
            .map(|s| Constraint::Length(s.items.len() as u16 + 3)),
    );
    constraints.push(Constraint::Min(6));
    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(columns[1]);

    draw_stats(frame, panels[0], page);
    for (section, area) in page.sections().iter().zip(panels.iter().skip(1)) {
        draw_section(frame, *area, page, section);
    }
    if let Some(area) = panels.last() {
        draw_model(frame, *area, page);
    }
}

/// The whole document squeezed into a column, with the viewport marked.
fn draw_minimap(frame: &mut Frame, area: Rect, page: &Page) {
    let block = Block::default().borders(Borders::ALL).title(" page ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let layout = page.layout();
    let scale = layout.height / f64::from(inner.height);
    let row_of = |y: f64| ((y / scale) as u16).min(inner.height.saturating_sub(1));
    let view_top = row_of(page.offset());
    let view_bottom = row_of(page.offset() + VIEWPORT_HEIGHT);

    let mut labels: Vec<(u16, String)> = vec![(row_of(layout.stats.y), "stats".to_string())];
    for (section, measured) in page.sections().iter().zip(&layout.sections) {
        let pin = if section.is_pinned() { " ⊙" } else { "" };
        labels.push((row_of(measured.section.y), format!("{}{pin}", section.content.id)));
    }
    labels.push((row_of(layout.model.y), "model".to_string()));

    let lines: Vec<Line> = (0..inner.height)
        .map(|row| {
            let in_view = row >= view_top && row <= view_bottom;
            let gutter = Span::styled(
                if in_view { "▐ " } else { "  " },
                Style::default().fg(Color::LightBlue),
            );
            let label = labels
                .iter()
                .find(|(r, _)| *r == row)
                .map_or(String::new(), |(_, l)| l.clone());
            Line::from(vec![gutter, Span::raw(label)])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_stats(frame: &mut Frame, area: Rect, page: &Page) {
    let spans: Vec<Span> = page
        .stats()
        .into_iter()
        .flat_map(|stat| {
            [
                Span::styled(
                    format!("{}{}", stat.shown, stat.suffix),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}   ", stat.label), Style::default().fg(Color::Gray)),
            ]
        })
        .collect();
    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" stats "));
    frame.render_widget(paragraph, area);
}

fn draw_section(frame: &mut Frame, area: Rect, page: &Page, section: &SectionView) {
    let progress = page.progress(section.id);
    let mut title = format!(" {} ", section.content.heading);
    if let Some(p) = progress {
        title.push_str(&format!("{} {:>3.0}% ", bar(p, 10), p * 100.0));
    }
    if section.is_pinned() {
        title.push_str("[pinned] ");
    } else if section.spacer.is_some() {
        title.push_str("[spaced] ");
    }

    let frames = page.frames(section.id);
    let lines: Vec<Line> = section
        .content
        .entries
        .iter()
        .zip(&section.items)
        .enumerate()
        .map(|(index, (entry, item))| {
            let active = section.active == Some(index);
            let phase = frames
                .iter()
                .find(|f| f.index == index)
                .map_or(Phase::Pending, |f| f.phase);
            let opacity = item.opacity();
            let mut title_style = Style::default().fg(shade(opacity));
            if active {
                title_style = title_style.add_modifier(Modifier::BOLD);
            }
            let mut spans = vec![
                Span::styled(if active { "▶ " } else { "  " }, Style::default().fg(Color::Green)),
                Span::styled(format!("{:<34}", entry.title), title_style),
                Span::styled(format!("{:<8}", phase.label()), Style::default().fg(phase_color(phase))),
                Span::raw(format!("{} {opacity:.2}", bar(opacity, 8))),
            ];
            if let Some(meta) = entry.meta.as_deref().or(entry.duration.as_deref()) {
                spans.push(Span::styled(format!("  {meta}"), Style::default().fg(Color::DarkGray)));
            }
            Line::from(spans)
        })
        .collect();

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

/// Hotspot markers placed where they project onto the model's canvas.
fn draw_model(frame: &mut Frame, area: Rect, page: &Page) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" model  zoom {:.2}x ", page.model_zoom()));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let canvas = page.layout().model;
    let buf = frame.buffer_mut();
    for marker in page.markers() {
        let col = (marker.position.x / canvas.w * f64::from(inner.width)) as u16;
        let row = (marker.position.y / canvas.h * f64::from(inner.height)) as u16;
        if col >= inner.width || row >= inner.height {
            continue;
        }
        let text = format!("◆ {}", marker.label);
        let y = inner.y + row;
        for (i, ch) in text.chars().enumerate() {
            let x = inner.x + col + i as u16;
            if x >= inner.x + inner.width {
                break;
            }
            buf[(x, y)].set_char(ch).set_fg(Color::LightYellow);
        }
        if let Some(description) = page.hotspot_label(marker.id)
            && row + 1 < inner.height
        {
            for (i, ch) in description.chars().enumerate() {
                let x = inner.x + col + 2 + i as u16;
                if x >= inner.x + inner.width {
                    break;
                }
                buf[(x, y + 1)].set_char(ch).set_fg(Color::DarkGray);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.0, 4), "░░░░");
        assert_eq!(bar(0.5, 4), "██░░");
        assert_eq!(bar(2.0, 4), "████");
    }

    #[test]
    fn shade_tracks_opacity() {
        assert_eq!(shade(0.0), Color::Rgb(40, 40, 40));
        assert_eq!(shade(1.0), Color::Rgb(255, 255, 255));
    }
}
