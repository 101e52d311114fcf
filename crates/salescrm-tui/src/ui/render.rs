use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use salescrm_core::router::ViewKind;

use crate::app::{App, AppState, LoginFocus, Tab};
use crate::form::Form;

use super::styles;
use super::tabs::{admin, agent, super_admin};

const APP_TITLE: &str = "  Sales CRM";

pub fn render(frame: &mut Frame, app: &App) {
    match app.view {
        ViewKind::Loading => render_loading(frame),
        ViewKind::Login => render_login(frame, app),
        ViewKind::UnknownRole => render_unknown_role(frame, app),
        ViewKind::SuperAdmin | ViewKind::Admin | ViewKind::Agent => render_dashboard(frame, app),
    }

    // Render overlays
    match app.state {
        AppState::EditingForm => {
            if let Some(ref form) = app.form {
                render_form_overlay(frame, form);
            }
        }
        AppState::Confirming => {
            if let Some(ref confirm) = app.confirm {
                render_confirm_overlay(frame, &confirm.prompt);
            }
        }
        AppState::ShowingNotice => {
            if let Some(ref notice) = app.notice {
                render_notice_overlay(frame, &notice.message, notice.is_error);
            }
        }
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let user = match app.session.identity() {
        Some(identity) => format!("{} ({})", identity.display_name(), identity.role.display_name()),
        None => String::new(),
    };

    let title_line = Line::from(vec![
        Span::styled(APP_TITLE, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(APP_TITLE.len() + user.chars().count() + 2),
        )),
        Span::styled(user, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::for_view(app.view).iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let style = if *tab == app.current_tab {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(tab.title(), style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.view {
        ViewKind::SuperAdmin => super_admin::render(frame, app, area),
        ViewKind::Admin => admin::render(frame, app, area),
        ViewKind::Agent => agent::render(frame, app, area),
        _ => {}
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[←/→] tabs | [r]efresh | [L]ogout | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.pending_writes > 0 {
        " Saving... ".to_string()
    } else {
        String::new()
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_loading(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 5, frame.area());
    let lines = vec![
        Line::from(Span::styled(APP_TITLE, styles::title_style())),
        Line::from(Span::styled("  Checking session...", styles::muted_style())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_login(frame: &mut Frame, app: &App) {
    // Fixed size dialog - compact
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("        Sales Incentive CRM", styles::title_style())),
        Line::from(""),
    ];

    let field = |label: &'static str, value: String, focused: bool| {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw("      "),
            Span::styled(label, styles::muted_style()),
            Span::styled(format!("{:<16}{}", value, cursor), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    let username: String = app.login_username.chars().take(16).collect();
    lines.push(field("Username: [", username, app.login_focus == LoginFocus::Username));
    let masked = "*".repeat(app.login_password.chars().count().min(16));
    lines.push(field("Password: [", masked, app.login_focus == LoginFocus::Password));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_unknown_role(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 8, frame.area());
    let role = app
        .session
        .identity()
        .map(|i| i.role.as_str().to_string())
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(" Unknown role", styles::error_style())),
        Line::from(""),
        Line::from(format!(" No dashboard is available for role \"{}\".", role)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" L", styles::help_key_style()),
            Span::styled(" log out   ", styles::help_desc_style()),
            Span::styled("q", styles::help_key_style()),
            Span::styled(" quit", styles::help_desc_style()),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, form: &Form) {
    let height = form.fields.len() as u16 * 2 + if form.error.is_some() { 7 } else { 5 };
    let area = centered_rect_fixed(60, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let value = if field.secret {
            "*".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        let cursor = if focused { "▌" } else { "" };
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:>16}: ", field.label), styles::muted_style()),
            Span::styled(format!("{}{}", value, cursor), style),
        ]));
        lines.push(Line::from(""));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::styled(" Tab", styles::help_key_style()),
        Span::styled(" next field  ", styles::help_desc_style()),
        Span::styled("Enter", styles::help_key_style()),
        Span::styled(" save  ", styles::help_desc_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" cancel", styles::help_desc_style()),
    ]));

    let block = Block::default()
        .title(format!(" {} ", form.title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, prompt: &str) {
    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(format!(" {}", prompt)),
        Line::from(""),
        Line::from(vec![
            Span::raw("            "),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled("es    ", styles::help_desc_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled("o", styles::help_desc_style()),
        ]),
    ];
    let block = Block::default()
        .title(" Confirm ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_notice_overlay(frame: &mut Frame, message: &str, is_error: bool) {
    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let (title, style) = if is_error {
        (" Error ", styles::error_style())
    } else {
        (" Success ", styles::success_style())
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", message), style)),
        Line::from(""),
        Line::from(Span::styled("       Press Enter to continue", styles::muted_style())),
    ];
    let block = Block::default()
        .title(title)
        .title_style(style)
        .borders(Borders::ALL)
        .border_style(style);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from("           Quit Sales CRM?"),
        Line::from(""),
        Line::from(vec![
            Span::raw("             "),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled("es    ", styles::help_desc_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled("o", styles::help_desc_style()),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
