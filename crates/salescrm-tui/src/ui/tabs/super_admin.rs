use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Cell, Row},
    Frame,
};

use salescrm_core::models::{Prize, SaleRequest, UserAccount};
use salescrm_core::utils::{format_date, format_optional, truncate_string};

use crate::app::{App, Tab};
use crate::ui::styles;

use super::render_list_table;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Admins => render_admins(frame, app, area),
        Tab::Agents => render_agents(frame, app, area),
        Tab::Users => render_users(frame, app, area),
        Tab::Catalog => render_catalog(frame, app, area),
        Tab::CoinRequests => render_coin_requests(frame, app, area),
        _ => {}
    }
}

fn account_header() -> Row<'static> {
    Row::new(vec!["Name", "Username", "Created", "Status"])
}

fn account_row(account: &UserAccount) -> Row<'static> {
    let status = if account.is_active {
        Span::styled("Active", styles::success_style())
    } else {
        Span::styled("Inactive", styles::muted_style())
    };
    Row::new(vec![
        Cell::from(truncate_string(account.display_name(), 30)),
        Cell::from(account.username.clone()),
        Cell::from(format_date(account.created_at.as_ref())),
        Cell::from(status),
    ])
}

const ACCOUNT_WIDTHS: [Constraint; 4] = [
    Constraint::Percentage(35),
    Constraint::Percentage(30),
    Constraint::Length(14),
    Constraint::Length(10),
];

fn render_admins(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.admins,
        "Admins",
        "[n]ew [p]assword [d]elete",
        account_header(),
        &ACCOUNT_WIDTHS,
        account_row,
    );
}

fn render_agents(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.agents,
        "Agents",
        "[n]ew",
        account_header(),
        &ACCOUNT_WIDTHS,
        account_row,
    );
}

fn render_users(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.users,
        "All Users",
        "[e]dit credentials",
        Row::new(vec!["Name", "Username", "Role", "Password"]),
        &[
            Constraint::Percentage(35),
            Constraint::Percentage(30),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
        |user| {
            let password = match user.has_password {
                Some(false) => Span::styled("Not set", styles::error_style()),
                _ => Span::styled("Set", styles::muted_style()),
            };
            Row::new(vec![
                Cell::from(truncate_string(user.display_name(), 30)),
                Cell::from(user.username.clone()),
                Cell::from(user.role.display_name().to_string()),
                Cell::from(password),
            ])
        },
    );
}

fn render_catalog(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.catalog,
        "Prizes",
        "[n]ew [e]dit [d]elete",
        Row::new(vec!["Name", "Description", "Cost", "Stock", "Active"]),
        &[
            Constraint::Percentage(25),
            Constraint::Fill(1),
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(7),
        ],
        catalog_row,
    );
}

fn catalog_row(prize: &Prize) -> Row<'static> {
    let stock_style = if prize.is_out_of_stock() {
        styles::error_style()
    } else {
        styles::list_item_style()
    };
    Row::new(vec![
        Cell::from(truncate_string(&prize.name, 30)),
        Cell::from(format_optional(Some(&prize.description), "-")),
        Cell::from(format!("{:>6}", prize.coin_cost)),
        Cell::from(Span::styled(prize.stock_display(), stock_style)),
        Cell::from(if prize.is_active { "Yes" } else { "No" }),
    ])
}

fn render_coin_requests(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.coin_requests,
        "Coin Requests",
        "[a]pprove",
        Row::new(vec!["Agent", "Sale", "Coins", "Deposits", "Submitted"]),
        &REQUEST_WIDTHS,
        request_row,
    );
}

pub(crate) const REQUEST_WIDTHS: [Constraint; 5] = [
    Constraint::Fill(1),
    Constraint::Length(8),
    Constraint::Length(7),
    Constraint::Length(9),
    Constraint::Length(20),
];

pub(crate) fn request_row(request: &SaleRequest) -> Row<'static> {
    Row::new(vec![
        Cell::from(truncate_string(request.agent_label(), 30)),
        Cell::from(format!("${}", request.sale_amount)),
        Cell::from(format!("{:>5}", request.coins_requested)),
        Cell::from(format!("{:>7}", request.deposits_requested)),
        Cell::from(salescrm_core::utils::format_datetime(request.created_at.as_ref())),
    ])
}
