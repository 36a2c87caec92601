//! Page bodies: public forms, protected-view states, and page content.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use misinvoice_core::access::{ACCESS_DENIED_MESSAGE, ACCESS_DENIED_TITLE};
use misinvoice_core::routes::Route;
use misinvoice_core::Role;

use crate::app::{App, Focus};
use crate::forms::{Form, FormFocus};
use crate::utils::{mask, truncate_string};

use super::render::centered_rect_fixed;
use super::styles;

/// Visible width of a form input
const FIELD_WIDTH: usize = 28;

/// A dashboard card: title, one-line summary, and who sees it.
struct Card {
    title: &'static str,
    text: &'static str,
    admin_only: bool,
}

static CARDS: [Card; 4] = [
    Card { title: "Employee Management", text: "Manage employees and their roles.", admin_only: true },
    Card { title: "Payroll", text: "View and manage payroll details.", admin_only: true },
    Card { title: "Time & Attendance", text: "Track employee attendance.", admin_only: false },
    Card { title: "Reports", text: "Generate and view reports.", admin_only: false },
];

fn cards_for(role: Role) -> Vec<&'static Card> {
    CARDS
        .iter()
        .filter(|c| !c.admin_only || role == Role::Administrator)
        .collect()
}

/// Body text of the pages that only describe their area.
pub fn description(route: Route) -> Option<&'static str> {
    let text = match route {
        Route::EmployeeManagement => {
            "This is the Employee Management page. Here you can manage employees and their roles."
        }
        Route::Payroll => "This is the Payroll page. Here you can view and manage payroll details.",
        Route::TimeAttendance => {
            "This is the Time & Attendance page. Here you can track employee attendance."
        }
        Route::Reports => "This is the Reports page. Here you can generate and view reports.",
        _ => return None,
    };
    Some(text)
}

pub fn render_loading(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(20, 1, area);
    frame.render_widget(
        Paragraph::new(Span::styled("Loading...", styles::muted_style())).alignment(Alignment::Center),
        area,
    );
}

pub fn render_access_denied(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(60, 6, area);
    let lines = vec![
        Line::from(Span::styled(ACCESS_DENIED_TITLE, styles::denied_title_style())),
        Line::from(""),
        Line::from(ACCESS_DENIED_MESSAGE),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style());
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

pub fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    let area = Rect {
        x: area.x + 2,
        width: area.width.saturating_sub(4),
        ..area
    };

    if app.current_route == Route::Dashboard {
        render_dashboard(frame, app, area);
    } else if let Some(text) = description(app.current_route) {
        render_description(frame, app.current_route.title(), text, area);
    } else {
        render_listing(frame, app, area);
    }
}

fn render_heading(frame: &mut Frame, heading: String, area: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Span::styled(heading, styles::title_style())),
        chunks[0],
    );
    chunks[1]
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let Some(role) = app.role() else {
        return;
    };
    let body = render_heading(frame, format!("Welcome, {}!", role.display_name()), area);

    let cards = cards_for(role);
    let row = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(body)[0];
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, cards.len() as u32); cards.len()])
        .split(row);

    for (i, (card, cell)) in cards.iter().zip(columns.iter()).enumerate() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::card_border(i))
            .title(Span::styled(card.title, styles::title_style()));
        frame.render_widget(
            Paragraph::new(card.text).block(block).wrap(Wrap { trim: true }),
            *cell,
        );
    }
}

fn render_description(frame: &mut Frame, title: &str, text: &'static str, area: Rect) {
    let body = render_heading(frame, title.to_string(), area);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), body);
}

fn render_listing(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.current_route.title();
    let Some(table) = app.current_table() else {
        let body = render_heading(frame, title.to_string(), area);
        let text = if app.loading.is_some() {
            "Loading..."
        } else {
            "No data loaded. Press r to refresh."
        };
        frame.render_widget(Paragraph::new(Span::styled(text, styles::muted_style())), body);
        return;
    };

    let body = render_heading(frame, format!("{} ({})", title, table.len()), area);
    if table.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No records.", styles::muted_style())),
            body,
        );
        return;
    }

    let header = Row::new(table.headers.iter().map(|h| Cell::from(*h)))
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.as_str()))).style(styles::list_item_style()))
        .collect();

    let mut widths = vec![Constraint::Length(8)];
    widths.extend(std::iter::repeat(Constraint::Fill(1)).take(table.headers.len().saturating_sub(1)));

    let focused = app.focus == Focus::Content;
    let widget = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(styles::selected_style())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        );

    let mut state = TableState::default().with_selected(Some(app.table_selection));
    frame.render_stateful_widget(widget, body, &mut state);
}

pub fn render_form(frame: &mut Frame, form: &Form, area: Rect) {
    let height = 10
        + form.fields.len() as u16
        + u16::from(form.role.is_some())
        + u16::from(form.error.is_some() || form.notice.is_some()) * 2;
    let area = centered_rect_fixed(50, height, area);

    let mut lines = vec![
        Line::from(Span::styled(format!("  {}", form.title()), styles::title_style())),
        Line::from(""),
    ];

    for (kind, value) in &form.fields {
        let focused = form.focused_field() == Some(*kind);
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let shown = if kind.is_secret() { mask(value) } else { value.clone() };
        // Keep the tail visible while typing long tokens.
        let skip = shown.chars().count().saturating_sub(FIELD_WIDTH);
        let shown: String = shown.chars().skip(skip).collect();
        let cursor = if focused { "▌" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>13}: [", kind.label()), styles::muted_style()),
            Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    if let Some(role) = form.role {
        let focused = form.focus == FormFocus::Role;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>13}: ", "Role"), styles::muted_style()),
            Span::styled(format!("< {} >", role.display_name()), style),
        ]));
    }

    lines.push(Line::from(""));
    let label = form.submit_label();
    let button = if form.focus == FormFocus::Button {
        Span::styled(format!(" ▶ {} ◀ ", label), styles::selected_style())
    } else {
        Span::styled(format!("   {}   ", label), styles::list_item_style())
    };
    lines.push(Line::from(vec![Span::raw("  ["), button, Span::raw("]")]).alignment(Alignment::Center));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", truncate_string(error, 46)), styles::error_style())));
    } else if let Some(ref notice) = form.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", notice), styles::success_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(form_hint(form.route), styles::muted_style())));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

/// Links to the neighbouring public pages.
fn form_hint(route: Route) -> &'static str {
    match route {
        Route::Login => " [F3] Register  [F4] Forgot password  [F7] Resend",
        Route::Register => " [F2] Back to login  [F6] Verify email",
        Route::ForgotPassword => " [F2] Back to login  [F5] Have a reset token?",
        _ => " [F2] Back to login",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(role: Role) -> Vec<&'static str> {
        cards_for(role).iter().map(|c| c.title).collect()
    }

    #[test]
    fn test_admin_cards() {
        assert_eq!(
            titles(Role::Administrator),
            vec!["Employee Management", "Payroll", "Time & Attendance", "Reports"]
        );
    }

    #[test]
    fn test_sales_person_cards() {
        assert_eq!(titles(Role::SalesPerson), vec!["Time & Attendance", "Reports"]);
    }

    #[test]
    fn test_descriptions_cover_non_listing_pages() {
        for route in [Route::EmployeeManagement, Route::Payroll, Route::TimeAttendance, Route::Reports] {
            assert!(description(route).is_some(), "{:?}", route);
        }
        assert!(description(Route::Chains).is_none());
        assert!(description(Route::Dashboard).is_none());
    }
}
