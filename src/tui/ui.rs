use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use crate::error::ErrorView;
use crate::models::MediaType;
use crate::theme::ThemeColors;

pub fn draw(frame: &mut Frame, app: &App) {
    let colors = app.theme.colors();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with screen tabs
            Constraint::Min(0),    // Active screen
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(frame, app, &colors, chunks[0]);

    if app.error_screen_active() {
        render_error_screen(frame, app, &colors, chunks[1]);
    } else {
        match app.screen {
            Screen::List => render_grid(frame, app, &colors, chunks[1]),
            Screen::Detail => render_detail(frame, app, &colors, chunks[1]),
            Screen::Favorites => render_favorites(frame, app, &colors, chunks[1]),
            Screen::Settings => render_settings(frame, app, &colors, chunks[1]),
        }
    }

    render_status(frame, app, &colors, chunks[2]);

    // Popups last so they sit on top
    if app.date_input_active {
        render_date_input(frame, app, &colors);
    }
    if app.show_help {
        render_help(frame, &colors);
    }
}

fn render_header(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Skygaze — Astronomy Picture of the Day ")
        .borders(Borders::ALL)
        .border_style(colors.block_focus());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let tab = |label: &str, screen: Screen| {
        if app.screen == screen {
            Span::styled(
                label.to_string(),
                colors.text_accent().add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label.to_string(), colors.text_dim())
        }
    };

    let stats = format!(
        "  {} loaded | {} favorites",
        app.items.len(),
        app.favorites.len()
    );

    let line = Line::from(vec![
        tab(" 1:Pictures ", Screen::List),
        tab(" 2:Favorites ", Screen::Favorites),
        tab(" 3:Settings ", Screen::Settings),
        Span::styled(stats, colors.text()),
    ]);

    frame.render_widget(Paragraph::new(line), inner);
}

fn render_grid(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Pictures ")
        .borders(Borders::ALL)
        .border_style(colors.block());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.items.is_empty() {
        let text = if app.is_loading {
            "Loading pictures..."
        } else {
            "No pictures yet. Press r to refresh."
        };
        frame.render_widget(Paragraph::new(text).style(colors.text_dim()), inner);
        return;
    }

    // Two cells per row, like the grid on a phone screen
    let cell_width = (inner.width as usize / 2).saturating_sub(1).max(8);

    let rows: Vec<ListItem> = app
        .items
        .chunks(2)
        .enumerate()
        .map(|(row, pair)| {
            let mut spans = Vec::new();
            for (col, apod) in pair.iter().enumerate() {
                let index = row * 2 + col;
                let marker = if app.favorite_dates.contains(&apod.date) {
                    "★ "
                } else if apod.media_type == MediaType::Video {
                    "▶ "
                } else {
                    "  "
                };
                let label = truncate(
                    &format!("{marker}{} {}", apod.date, apod.title),
                    cell_width,
                );
                let style = if index == app.selected_index {
                    colors.selected()
                } else {
                    colors.text()
                };
                spans.push(Span::styled(format!("{label:<cell_width$}"), style));
                if col == 0 {
                    spans.push(Span::raw(" "));
                }
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(rows);
    let mut state = ListState::default();
    state.select(Some(app.selected_index / 2));
    frame.render_stateful_widget(list, inner, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Picture ")
        .borders(Borders::ALL)
        .border_style(colors.block_focus());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(apod) = &app.detail else {
        frame.render_widget(
            Paragraph::new("No picture selected").style(colors.text_dim()),
            inner,
        );
        return;
    };

    let favorite = if app.detail_is_favorite {
        "★ favorite"
    } else {
        "  f to favorite"
    };
    let meta = format!("{} | {} | {}", apod.date, apod.media_type.as_str(), favorite);

    let wrap_width = (inner.width as usize).saturating_sub(2).max(20);
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            apod.title.clone(),
            colors.text_accent().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(meta, colors.text_dim())),
        Line::default(),
    ];
    for wrapped in textwrap::wrap(&apod.explanation, wrap_width) {
        lines.push(Line::from(Span::styled(wrapped.to_string(), colors.text())));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("url: {}", apod.url),
        colors.text_dim(),
    )));
    if let Some(hdurl) = &apod.hdurl {
        lines.push(Line::from(Span::styled(
            format!("hd:  {hdurl}"),
            colors.text_dim(),
        )));
    }

    let paragraph = Paragraph::new(lines).scroll((app.detail_scroll, 0));
    frame.render_widget(paragraph, inner);
}

fn render_favorites(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Favorites ")
        .borders(Borders::ALL)
        .border_style(colors.block());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.favorites.is_empty() {
        frame.render_widget(
            Paragraph::new("Nothing favorited yet. Press f on a picture.")
                .style(colors.text_dim()),
            inner,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .favorites
        .iter()
        .map(|favorite| {
            let line = Line::from(vec![
                Span::styled("★ ", ratatui::style::Style::default().fg(colors.favorite)),
                Span::styled(
                    format!("{} {}", favorite.apod.date, favorite.apod.title),
                    colors.text(),
                ),
                Span::styled(
                    format!("  (added {})", favorite.added_at.format("%Y-%m-%d")),
                    colors.text_dim(),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).highlight_style(colors.selected()).highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.favorites_index));
    frame.render_stateful_widget(list, inner, &mut state);
}

fn render_settings(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(colors.block());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (cached, favorites) = app.stats;
    let mut lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled("  Theme: ", colors.text()),
            Span::styled(app.theme.label(), colors.text_accent()),
            Span::styled("   (t to change)", colors.text_dim()),
        ]),
        Line::default(),
        Line::from(Span::styled(
            format!("  Cached pictures:  {cached}"),
            colors.text(),
        )),
        Line::from(Span::styled(
            format!("  Favorites:        {favorites}"),
            colors.text(),
        )),
        Line::default(),
        Line::from(Span::styled(
            "  c — clear cache and favorites",
            colors.text_dim(),
        )),
    ];

    if let Some(status) = &app.settings_status {
        let style = if status.is_error {
            colors.text_error()
        } else {
            colors.text_success()
        };
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(format!("  {}", status.text), style)));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_error_screen(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    let Some(error) = &app.error else {
        return;
    };

    let (title, message) = match error {
        ErrorView::Network => (
            "No internet connection".to_string(),
            "Check your network connection and try again".to_string(),
        ),
        ErrorView::Http(404) => (
            "Page not found".to_string(),
            "The requested data was not found on the server".to_string(),
        ),
        ErrorView::Http(500) => (
            "Server error".to_string(),
            "Internal server error. Try again later".to_string(),
        ),
        ErrorView::Http(503) => (
            "Service unavailable".to_string(),
            "The service is temporarily unavailable".to_string(),
        ),
        ErrorView::Http(code) => (
            "Loading error".to_string(),
            format!("An error occurred while loading data (code: {code})"),
        ),
        ErrorView::General(message) => ("Something went wrong".to_string(), message.clone()),
    };

    let retry = if app.is_retrying {
        "Retrying..."
    } else {
        "Press r to retry"
    };

    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "⚠",
            colors.text_error().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            title,
            colors.text_error().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(message, colors.text())),
        Line::default(),
        Line::from(Span::styled(retry, colors.text_dim())),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(colors.text_error());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, colors: &ThemeColors, area: Rect) {
    if let Some(error) = &app.error {
        if !app.error_screen_active() {
            let text = match error {
                ErrorView::Network => "Load failed: no internet connection — r to retry".to_string(),
                ErrorView::Http(code) => format!("Load failed: HTTP {code} — r to retry"),
                ErrorView::General(message) => format!("Load failed: {message} — r to retry"),
            };
            frame.render_widget(Paragraph::new(text).style(colors.text_error()), area);
            return;
        }
    }

    let status = if app.is_loading {
        "Loading...".to_string()
    } else if app.detail_loading {
        "Looking up date...".to_string()
    } else {
        match app.screen {
            Screen::List => {
                "j/k:nav  Enter:open  f:favorite  r:refresh  g:go to date  ?:help  q:quit"
                    .to_string()
            }
            Screen::Detail => {
                "j/k:scroll  f:favorite  o:open url  O:open hd  Esc:back  q:quit".to_string()
            }
            Screen::Favorites => "j/k:nav  Enter:open  f:unfavorite  Esc:back  q:quit".to_string(),
            Screen::Settings => "t:theme  c:clear cache  Esc:back  q:quit".to_string(),
        }
    };

    frame.render_widget(Paragraph::new(status).style(colors.text_dim()), area);
}

fn render_date_input(frame: &mut Frame, app: &App, colors: &ThemeColors) {
    let area = centered_rect(50, 20, frame.area());

    let block = Block::default()
        .title(" Go to date (YYYY-MM-DD) ")
        .borders(Borders::ALL)
        .border_style(colors.block_focus());

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(Span::styled(
        format!("> {}_", app.date_input),
        colors.text(),
    ))];
    if let Some(message) = &app.date_input_error {
        lines.push(Line::from(Span::styled(message.clone(), colors.text_error())));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help(frame: &mut Frame, colors: &ThemeColors) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    Jump to top / bottom",
        "   Enter    Open picture",
        "   Esc      Back",
        "   1/2/3    Pictures / Favorites / Settings",
        "",
        " Actions:",
        "   r        Refresh from the first page",
        "   f        Toggle favorite",
        "   o        Open picture URL in browser",
        "   O        Open HD URL in browser",
        "   g        Go to a specific date",
        "   t        Change theme (settings)",
        "   c        Clear cache (settings)",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(colors.block_focus());

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(colors.text());

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
