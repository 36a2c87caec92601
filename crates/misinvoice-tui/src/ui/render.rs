use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use misinvoice_core::access::{Icon, ViewState};

use crate::app::{App, AppState, Focus};
use crate::utils::{format_minutes, truncate_string};

use super::pages;
use super::styles;

/// Width of the signed-in side drawer
const DRAWER_WIDTH: u16 = 30;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Drawer + page
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_body(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  MIS & Invoicing System";
    let hints = if app.session().is_authenticated() {
        "[p] Reset Password  [l] Logout  [?] Help"
    } else {
        "[F2] Login  [F3] Register  [F1] Help"
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + hints.len() + 2),
        )),
        Span::styled(hints, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect) {
    // The drawer exists only for a session with a role; without one the
    // filtered entry list would be empty anyway.
    if app.role().is_none() {
        render_page(frame, app, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(DRAWER_WIDTH), Constraint::Min(20)])
        .split(area);

    render_drawer(frame, app, chunks[0]);
    render_page(frame, app, chunks[1]);
}

fn render_page(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(ref form) = app.form {
        pages::render_form(frame, form, area);
        return;
    }

    match app.view_state() {
        Some(ViewState::Loading) | None => pages::render_loading(frame, area),
        Some(ViewState::AccessDenied) => pages::render_access_denied(frame, area),
        Some(ViewState::Content) => pages::render_content(frame, app, area),
    }
}

pub fn icon_glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::Dashboard => "⌂",
        Icon::People => "☺",
        Icon::Money => "$",
        Icon::Schedule => "◷",
        Icon::Report => "▤",
        Icon::Store => "▦",
        Icon::Label => "◆",
        Icon::Group => "◎",
        Icon::Map => "◫",
        Icon::Calculate => "∑",
        Icon::Receipt => "≡",
    }
}

fn render_drawer(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Drawer;
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(styles::border_style(focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(inner);

    // Avatar and role
    let mut header = Vec::new();
    if let Some(role) = app.role() {
        header.push(Line::from(""));
        header.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!(" {} ", role.initial()), styles::avatar_style()),
            Span::raw("  "),
            Span::styled(role.display_name(), styles::title_style()),
        ]));
        if let Some(ref subject) = app.session().subject {
            header.push(Line::from(Span::styled(
                format!("  {}", truncate_string(subject, DRAWER_WIDTH as usize - 4)),
                styles::muted_style(),
            )));
        }
    }
    let divider = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(header).block(divider), chunks[0]);

    let items: Vec<ListItem> = app
        .nav_entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let key = match i {
                0..=8 => format!("[{}]", i + 1),
                _ => "   ".to_string(),
            };
            let style = if entry.route == app.current_route {
                styles::selected_style()
            } else if focused && i == app.drawer_selection {
                styles::highlight_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", key), styles::muted_style()),
                Span::styled(format!("{} {}", icon_glyph(entry.icon), entry.label), style),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items), chunks[1]);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if session.is_authenticated() {
        format!(" Signed in {} ", format_minutes(session.minutes_active()))
    } else {
        " Not signed in ".to_string()
    };

    let shortcuts = if session.is_authenticated() {
        "Tab focus | [r]efresh | [q]uit"
    } else {
        "Esc back | Ctrl+C quit"
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let mut help_text = vec![
        Line::from(Span::styled("  MIS & Invoicing System", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
    ];

    if app.session().is_authenticated() {
        help_text.extend([
            Line::from(Span::styled(" Navigation", styles::highlight_style())),
            help_line("1-9", "Open drawer entry"),
            help_line("Tab", "Switch focus (drawer / page)"),
            help_line("↑/↓ j/k", "Move selection"),
            help_line("Enter", "Open selected entry"),
            Line::from(""),
            Line::from(Span::styled(" Actions", styles::highlight_style())),
            help_line("r", "Refresh listing"),
            help_line("p", "Reset password"),
            help_line("l", "Logout"),
            help_line("q", "Quit"),
        ]);
    } else {
        help_text.extend([
            Line::from(Span::styled(" Forms", styles::highlight_style())),
            help_line("Tab/↓", "Next field"),
            help_line("S-Tab/↑", "Previous field"),
            help_line("←/→", "Change role (register)"),
            help_line("Enter", "Next field / submit"),
            Line::from(""),
            Line::from(Span::styled(" Pages", styles::highlight_style())),
            help_line("F2", "Login"),
            help_line("F3", "Register"),
            help_line("F4", "Forgot password"),
            help_line("F5", "Reset password"),
            help_line("F6", "Verify email"),
            help_line("F7", "Resend verification"),
        ]);
    }

    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::styled("       Press ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(42, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
