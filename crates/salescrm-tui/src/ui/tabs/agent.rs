use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row},
    Frame,
};

use salescrm_core::rules::{
    format_amount, progress_band, progress_ratio, redeem_eligibility, SaleAmount,
};
use salescrm_core::utils::{format_datetime, format_money, truncate_string};

use crate::app::{App, Tab};
use crate::ui::styles;

use super::render_list_table;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => render_dashboard(frame, app, area),
        Tab::Leaderboard => render_leaderboard(frame, app, area),
        Tab::Shop => render_shop(frame, app, area),
        Tab::RewardBag => render_reward_bag(frame, app, area),
        _ => {}
    }
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats
            Constraint::Length(3), // Target progress
            Constraint::Min(6),    // Sale request
        ])
        .split(area);

    let block = |title: &'static str| {
        Block::default()
            .title(title)
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true))
    };

    let dashboard = match &app.dashboard {
        Some(dashboard) => dashboard,
        None => {
            let paragraph = Paragraph::new(" Loading...")
                .style(styles::muted_style())
                .block(block(" My Stats "));
            frame.render_widget(paragraph, area);
            return;
        }
    };
    let info = &dashboard.agent_info;

    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {:<18}", label), styles::muted_style()),
            Span::styled(value, styles::list_item_style()),
        ])
    };
    let lines = vec![
        Line::from(Span::styled(format!("  {}", info.name), styles::title_style())),
        Line::from(""),
        stat("Coins", format_amount(info.coins)),
        stat("Deposits", format_amount(info.deposits)),
        stat("Total sales", format_money(info.total_sales)),
        stat("Pending requests", dashboard.pending_requests.to_string()),
    ];
    frame.render_widget(Paragraph::new(lines).block(block(" My Stats ")), chunks[0]);

    let band = progress_band(info.achievement_percentage);
    let label = format!(
        "{} / {} deposits ({:.2}%)",
        format_amount(info.deposits),
        format_amount(info.target_monthly),
        info.achievement_percentage
    );
    let gauge = Gauge::default()
        .block(block(" Monthly Target "))
        .gauge_style(styles::progress_style(band))
        .ratio(progress_ratio(info.achievement_percentage))
        .label(label);
    frame.render_widget(gauge, chunks[1]);

    let mut lines = vec![Line::from("")];
    for (i, amount) in SaleAmount::ALL.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), styles::help_key_style()),
            Span::styled(amount.label(), styles::help_desc_style()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Submitted sales wait for admin approval before coins are credited.",
        styles::muted_style(),
    )));
    frame.render_widget(
        Paragraph::new(lines).block(block(" Submit Sale Request ")),
        chunks[2],
    );
}

fn render_leaderboard(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.leaderboard,
        "Leaderboard",
        "ranked by deposits",
        Row::new(vec!["#", "Name", "Deposits", "Coins Redeemed", "Total Sales"]),
        &[
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(15),
            Constraint::Length(14),
        ],
        |entry| {
            let style = if entry.is_current_user {
                styles::highlight_style()
            } else {
                styles::list_item_style()
            };
            let name = if entry.is_current_user {
                format!("{} (you)", entry.name)
            } else {
                entry.name.clone()
            };
            Row::new(vec![
                Cell::from(format!("{:>2}", entry.rank)),
                Cell::from(truncate_string(&name, 40)),
                Cell::from(format_amount(entry.deposits)),
                Cell::from(format_amount(entry.coins_redeemed)),
                Cell::from(format_money(entry.total_sales)),
            ])
            .style(style)
        },
    );
}

fn render_shop(frame: &mut Frame, app: &App, area: Rect) {
    let balance = app.coin_balance();
    let title = format!("Prize Shop - balance {} coins", format_amount(balance));
    render_list_table(
        frame,
        area,
        &app.shop,
        &title,
        "[Enter] redeem",
        Row::new(vec!["Prize", "Description", "Cost", "Stock", ""]),
        &[
            Constraint::Percentage(25),
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(18),
            Constraint::Length(20),
        ],
        move |prize| {
            let eligibility = redeem_eligibility(balance, prize);
            Row::new(vec![
                Cell::from(truncate_string(&prize.name, 30)),
                Cell::from(prize.description.clone()),
                Cell::from(format_amount(prize.coin_cost)),
                Cell::from(prize.stock_display()),
                Cell::from(Span::styled(
                    eligibility.label(),
                    styles::action_style(eligibility.is_enabled()),
                )),
            ])
        },
    );
}

fn render_reward_bag(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.reward_bag,
        "Reward Bag",
        "[u]se reward",
        Row::new(vec!["Prize", "Status", "Redeemed", "Used"]),
        &[
            Constraint::Fill(1),
            Constraint::Length(24),
            Constraint::Length(20),
            Constraint::Length(20),
        ],
        |item| {
            Row::new(vec![
                Cell::from(truncate_string(&item.prize_name, 40)),
                Cell::from(Span::styled(
                    item.status.label().to_string(),
                    styles::action_style(item.status.can_request_use()),
                )),
                Cell::from(format_datetime(item.redeemed_at.as_ref())),
                Cell::from(format_datetime(item.used_at.as_ref())),
            ])
        },
    );
}
