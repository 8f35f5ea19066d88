pub mod screens;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Content
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);

    match app.screen {
        Screen::ProfileSelect => screens::render_profile_select(frame, chunks[1], app),
        Screen::MainMenu => screens::render_main_menu(frame, chunks[1], app),
        Screen::TimeSelect => screens::render_time_select(frame, chunks[1], app),
        Screen::Intro(kind) => screens::render_intro(frame, chunks[1], app, kind),
        Screen::Playing(_) => {
            if let Some(game) = app.active.as_mut() {
                game.render(frame, chunks[1]);
            }
        }
        Screen::GameOver(kind) => screens::render_game_over(frame, chunks[1], app, kind),
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" 🕹 MiniCade ")
        .title_style(
            Style::default()
                .fg(Color::Rgb(200, 120, 255))
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans: Vec<Span> = Vec::new();
    if app.profile.is_some() {
        spans.push(Span::styled(
            format!(" 👤 {} ", app.profile_name()),
            Style::default()
                .fg(Color::Rgb(80, 200, 255))
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled(
            " pick a player ",
            Style::default().fg(Color::Rgb(120, 120, 140)),
        ));
    }

    if let Some(clock) = app.session.display() {
        let style = if app.session.low() {
            Style::default()
                .fg(Color::Rgb(255, 80, 80))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Rgb(255, 220, 80))
        };
        spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(format!("⏱ {clock} "), style));
    }

    if matches!(app.screen, Screen::Playing(_)) {
        spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            format!("Score: {} ", app.last_score),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}
