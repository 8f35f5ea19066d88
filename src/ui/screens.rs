use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, GameKind, PROFILES, SESSION_CHOICES};

const ACCENT: Color = Color::Rgb(255, 220, 80);
const DIM: Color = Color::Rgb(120, 120, 140);

/// Center a fixed-size box inside `area`, clamped to fit.
fn centered(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn option_tile(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>, selected: bool) {
    let (border_color, border_type) = if selected {
        (ACCENT, BorderType::Double)
    } else {
        (Color::Rgb(70, 70, 90), BorderType::Rounded)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

pub fn render_profile_select(frame: &mut Frame, area: Rect, app: &App) {
    let outer = centered(area, 64, 12);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Length(2),
        ])
        .split(outer);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Who's playing?",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center),
        rows[0],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[1]);
    for (i, name) in PROFILES.iter().enumerate() {
        let selected = i == app.selected_profile;
        let lines = vec![
            Line::from(Span::styled(
                format!("[{}]", i + 1),
                Style::default().fg(ACCENT),
            )),
            Line::from(Span::styled(
                *name,
                Style::default()
                    .fg(if selected { Color::White } else { Color::Rgb(80, 200, 255) })
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        option_tile(frame, cols[i], lines, selected);
    }

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "←/→ choose │ Enter confirm │ Q quit",
            Style::default().fg(DIM),
        )))
        .alignment(Alignment::Center),
        rows[2],
    );
}

pub fn render_main_menu(frame: &mut Frame, area: Rect, app: &App) {
    let outer = centered(area, 72, 13);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(7),
            Constraint::Length(2),
        ])
        .split(outer);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Game Lobby",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center),
        rows[0],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);
    for (i, kind) in GameKind::all().iter().enumerate() {
        let selected = i == app.selected_game;
        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), Style::default().fg(ACCENT)),
                Span::styled(
                    kind.title(),
                    Style::default()
                        .fg(if selected { Color::White } else { Color::Rgb(80, 220, 80) })
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        for blurb_line in kind.blurb().split('\n') {
            lines.push(Line::from(Span::styled(
                blurb_line.to_string(),
                Style::default().fg(DIM),
            )));
        }
        if selected {
            lines.push(Line::from(Span::styled(
                "▶ Enter to play",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )));
        }
        option_tile(frame, cols[i], lines, selected);
    }

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "←/→ choose │ Enter play │ U switch player │ Q quit",
            Style::default().fg(DIM),
        )))
        .alignment(Alignment::Center),
        rows[2],
    );
}

pub fn render_time_select(frame: &mut Frame, area: Rect, app: &App) {
    let outer = centered(area, 58, 11);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(outer);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "How long do you want to play?",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center),
        rows[0],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);
    for (i, (_, label)) in SESSION_CHOICES.iter().enumerate() {
        let selected = i == app.selected_time;
        let lines = vec![Line::from(Span::styled(
            *label,
            Style::default()
                .fg(if selected { Color::White } else { Color::Rgb(80, 200, 255) })
                .add_modifier(Modifier::BOLD),
        ))];
        option_tile(frame, cols[i], lines, selected);
    }

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "←/→ choose │ Enter confirm │ Esc back",
            Style::default().fg(DIM),
        )))
        .alignment(Alignment::Center),
        rows[2],
    );
}

pub fn render_intro(frame: &mut Frame, area: Rect, app: &App, kind: GameKind) {
    let outer = centered(area, 64, 14);
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            kind.title(),
            Style::default()
                .fg(Color::Rgb(80, 220, 80))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    match kind {
        GameKind::CarRace => {
            lines.push(Line::from(Span::styled(
                "← → to change lanes and dodge the oncoming cars.",
                Style::default().fg(DIM),
            )));
            lines.push(Line::from(Span::styled(
                "Every car you pass is worth a point.",
                Style::default().fg(DIM),
            )));
            lines.push(Line::from(""));
            let three = app.lane_choice == 0;
            lines.push(Line::from(vec![
                Span::styled("Lanes:  ", Style::default().fg(DIM)),
                Span::styled(
                    " 3 lanes ",
                    if three {
                        Style::default().fg(Color::Black).bg(ACCENT)
                    } else {
                        Style::default().fg(DIM)
                    },
                ),
                Span::raw("  "),
                Span::styled(
                    " 5 lanes ",
                    if three {
                        Style::default().fg(DIM)
                    } else {
                        Style::default().fg(Color::Black).bg(ACCENT)
                    },
                ),
            ]));
        }
        GameKind::FrogHop => {
            lines.push(Line::from(Span::styled(
                "SPACE to hop between platforms as the world scrolls.",
                Style::default().fg(DIM),
            )));
            lines.push(Line::from(vec![
                Span::styled("Brown ", Style::default().fg(Color::Rgb(160, 128, 80))),
                Span::styled("safe · ", Style::default().fg(DIM)),
                Span::styled("red ", Style::default().fg(Color::Rgb(224, 104, 56))),
                Span::styled("hurts (-1 ♥) · ", Style::default().fg(DIM)),
                Span::styled("green ", Style::default().fg(Color::Rgb(80, 216, 104))),
                Span::styled("heals (+1 ♥) · ", Style::default().fg(DIM)),
                Span::styled("blue ", Style::default().fg(Color::Rgb(96, 184, 232))),
                Span::styled("moves", Style::default().fg(DIM)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Gems: ", Style::default().fg(DIM)),
                Span::styled("◆ +500  ", Style::default().fg(Color::Rgb(40, 100, 220))),
                Span::styled("◆ +1000", Style::default().fg(Color::Rgb(220, 40, 40))),
            ]));
        }
        GameKind::Snake => {
            lines.push(Line::from(Span::styled(
                "Arrows or WASD to steer. Food is +10 and makes you longer.",
                Style::default().fg(DIM),
            )));
            lines.push(Line::from(Span::styled(
                "Every 50 points the game speeds up. Walls and tails bite.",
                Style::default().fg(DIM),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "▶ Press Enter to start!",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        "Esc back",
        Style::default().fg(DIM),
    )));

    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        outer,
    );
}

pub fn render_game_over(frame: &mut Frame, area: Rect, app: &App, kind: GameKind) {
    let outer = centered(area, 66, 18);
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(outer);

    // Left: final score and replay options.
    let mut left: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            "GAME OVER",
            Style::default()
                .fg(Color::Rgb(255, 90, 90))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}", app.last_score),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("final score", Style::default().fg(DIM))),
        Line::from(""),
    ];
    if app.session.expired() {
        left.push(Line::from(Span::styled(
            "⏱ Time's up! Back to the menu for a new session.",
            Style::default().fg(Color::Rgb(255, 80, 80)),
        )));
        left.push(Line::from(Span::styled(
            "Esc menu",
            Style::default().fg(DIM),
        )));
    } else {
        left.push(Line::from(Span::styled(
            "▶ Enter play again",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        left.push(Line::from(Span::styled(
            "Esc menu",
            Style::default().fg(DIM),
        )));
    }
    frame.render_widget(
        Paragraph::new(left).alignment(Alignment::Center),
        halves[0],
    );

    // Right: top-10 board for this game.
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(70, 70, 90)))
        .title(" Top 10 ")
        .title_style(Style::default().fg(Color::Rgb(80, 200, 255)));
    let inner = block.inner(halves[1]);
    frame.render_widget(block, halves[1]);

    let top = app.scores.top(kind.key());
    let mut rows: Vec<Line> = Vec::new();
    if top.is_empty() {
        rows.push(Line::from(Span::styled(
            "no records yet",
            Style::default().fg(DIM),
        )));
    }
    let mut highlighted = false;
    for (i, entry) in top.iter().enumerate() {
        let mine = !highlighted
            && entry.score == app.last_score
            && entry.user == app.profile_name();
        if mine {
            highlighted = true;
        }
        let style = if mine {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Rgb(180, 180, 200))
        };
        rows.push(Line::from(vec![
            Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(DIM)),
            Span::styled(format!("{:<8}", entry.user), style),
            Span::styled(format!("{:>8}", entry.score), style),
        ]));
    }
    frame.render_widget(Paragraph::new(rows), inner);
}
