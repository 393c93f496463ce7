use crate::api::Transport;
use crate::app::{ActiveInput, App, InputMode};
use crate::view::{self, TaskCard};
use ansi_parser::{AnsiParser, Output};
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

pub fn ansi_to_text(ansi_str: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for ansi_line in ansi_str.lines() {
        let mut spans = Vec::new();
        let parsed = ansi_line.ansi_parse();
        for item in parsed {
            match item {
                Output::TextBlock(text) => {
                    spans.push(Span::raw(text.to_string()));
                }
                Output::Escape(_escape) => {}
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Renders the card through its HTML form, the same markup a browser would get.
pub fn card_to_lines(card: &TaskCard, width: usize) -> Vec<Line<'static>> {
    let html = card.to_node().to_html();
    let text = html2text::from_read(html.as_bytes(), width.max(1));
    ansi_to_text(&text)
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend<T>(app: &App<T>) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = if app.alert.is_some() {
        vec![key_hint(" any key ", ": Dismiss ")]
    } else if app.pending_delete.is_some() {
        vec![key_hint(" y ", ": Delete "), key_hint(" n ", ": Keep ")]
    } else {
        match app.input_mode {
            InputMode::Normal => vec![
                key_hint(" q ", ": Quit "),
                key_hint(" j ", ": Down "),
                key_hint(" k ", ": Up "),
                key_hint(" Space ", ": Toggle "),
                key_hint(" a ", ": Add "),
                key_hint(" e ", ": Edit "),
                key_hint(" d ", ": Delete "),
                key_hint(" 1/2/3 ", ": All/Completed/Pending "),
                key_hint(" r ", ": Reload "),
                key_hint(" Enter ", ": View Details "),
            ],
            InputMode::Editing => vec![
                key_hint(" i ", ": Insert "),
                key_hint(" Tab ", ": Switch Field "),
                key_hint(" Enter ", ": Submit "),
                key_hint(" Esc ", ": Cancel "),
            ],
            InputMode::Insert => vec![key_hint(" Esc ", ": Stop Typing ")],
        }
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn stats_line<T>(app: &App<T>) -> Line<'static> {
    let Some(stats) = &app.stats else {
        return Line::from(Span::styled(
            "Stats unavailable",
            Style::default().fg(Color::DarkGray),
        ));
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut spans = vec![
        Span::raw(" Total: "),
        Span::styled(stats.total.to_string(), bold),
        Span::raw("  Completed: "),
        Span::styled(stats.completed.to_string(), bold.fg(Color::Green)),
        Span::raw("  Pending: "),
        Span::styled(stats.pending.to_string(), bold.fg(Color::Yellow)),
    ];
    if let Some(status) = &stats.status {
        spans.push(Span::styled(
            format!("  [{}]", status),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_task_list<T: Transport>(f: &mut Frame, app: &mut App<T>, area: Rect) {
    let list_title = format!("Tasks ({})", app.filter.label());
    let cards = view::visible_cards(&app.tasks, app.filter);

    let tasks_widget = if !cards.is_empty() {
        let items: Vec<ListItem> = cards
            .iter()
            .map(|card| {
                let checkbox = if card.completed {
                    Span::styled("[x] ", Style::default().fg(Color::Green))
                } else {
                    Span::raw("[ ] ")
                };
                let title = if card.completed {
                    Span::styled(
                        card.title.clone(),
                        Style::default().add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    Span::raw(card.title.clone())
                };
                ListItem::new(Line::from(vec![
                    checkbox,
                    title,
                    Span::styled(
                        format!("  {}", card.date),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        List::new(items)
            .block(Block::default().borders(Borders::ALL).title(list_title))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ")
    } else {
        List::new(vec![ListItem::new(view::empty_message(app.filter))])
            .block(Block::default().borders(Borders::ALL).title(list_title))
    };

    f.render_stateful_widget(tasks_widget, area, &mut app.state);
}

fn draw_detail<T>(f: &mut Frame, app: &App<T>, area: Rect) {
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");

    let paragraph = match &app.task_detail {
        Some(task) => {
            let width = area.width.saturating_sub(2) as usize;
            let mut lines = vec![Line::from(vec![
                Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
                if task.completed {
                    Span::styled("Completed", Style::default().fg(Color::Green))
                } else {
                    Span::styled("Pending", Style::default().fg(Color::Yellow))
                },
            ])];
            lines.extend(card_to_lines(&TaskCard::from_task(task), width));
            Paragraph::new(lines)
        }
        None => Paragraph::new("Press Enter to view task details"),
    };

    f.render_widget(paragraph.block(detail_block).wrap(Wrap { trim: true }), area);
}

fn draw_form<T>(f: &mut Frame, app: &App<T>, area: Rect) {
    let popup_width = percent_of(area.width, 60).max(20);
    let inner_width = popup_width.saturating_sub(2);

    let field_height = |text: &str| -> u16 {
        let lines = calculate_wrapped_lines(text, inner_width).max(1);
        lines as u16 + 2
    };
    let title_height = field_height(&app.form.title);
    let description_height = field_height(&app.form.description);
    let popup_height = (title_height + description_height + 2).min(area.height);

    let popup_area = centered_rect_absolute(popup_width, popup_height, area);
    let heading = if app.form.editing.is_some() {
        "Edit Task (Press Enter to Submit)"
    } else {
        "Enter New Task (Press Enter to Submit)"
    };
    let popup_block = Block::default()
        .title(heading)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    f.render_widget(Clear, popup_area);
    let inner = popup_block.inner(popup_area);
    f.render_widget(popup_block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(title_height), Constraint::Min(0)].as_ref())
        .split(inner);

    let field_style = |field: ActiveInput| {
        if app.active_input == field {
            let color = if app.input_mode == InputMode::Insert {
                Color::Yellow
            } else {
                Color::Green
            };
            Style::default().fg(color)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let title_input = Paragraph::new(app.form.title.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Title")
                .border_style(field_style(ActiveInput::Title)),
        )
        .wrap(Wrap { trim: false });
    let description_input = Paragraph::new(app.form.description.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Description (optional)")
                .border_style(field_style(ActiveInput::Description)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(title_input, chunks[0]);
    f.render_widget(description_input, chunks[1]);
}

fn draw_message(f: &mut Frame, title: &str, message: &str, color: Color, area: Rect) {
    let width = percent_of(area.width, 50).max(30);
    let height = (calculate_wrapped_lines(message, width.saturating_sub(2)).max(1) as u16 + 2)
        .min(area.height);
    let popup_area = centered_rect_absolute(width, height, area);

    let popup = Paragraph::new(message.to_string())
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn draw<T: Transport>(f: &mut Frame, app: &mut App<T>) {
    let size = f.area();

    // Counters on top, body in the middle, legend at the bottom
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    let stats_chunk = chunks[0];
    let body_chunk = chunks[1];
    let footer_chunk = chunks[2];

    f.render_widget(Paragraph::new(stats_line(app)), stats_chunk);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(body_chunk);

    draw_task_list(f, app, panels[0]);
    draw_detail(f, app, panels[1]);

    if app.input_mode != InputMode::Normal {
        draw_form(f, app, body_chunk);
    }

    if let Some(id) = &app.pending_delete {
        let title = app
            .tasks
            .iter()
            .find(|task| &task.id == id)
            .map(|task| task.title.as_str())
            .unwrap_or("this task");
        draw_message(
            f,
            "Confirm Delete",
            &format!("Delete \"{}\"? (y/n)", title),
            Color::Red,
            body_chunk,
        );
    }

    if let Some(alert) = &app.alert {
        draw_message(f, "Error", alert, Color::Red, body_chunk);
    }

    let legend = Paragraph::new(get_legend(app))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, footer_chunk);
}

pub async fn run_app<B: Backend, T: Transport>(
    terminal: &mut Terminal<B>,
    mut app: App<T>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = app.handle_input(key).await;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

fn percent_of(length: u16, percent: u16) -> u16 {
    (u32::from(length) * u32::from(percent) / 100) as u16
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    if max_width == 0 {
        return 0;
    }
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count() as u16;
        line_count += ((line_width + max_width - 1) / max_width) as usize;
    }
    line_count
}
