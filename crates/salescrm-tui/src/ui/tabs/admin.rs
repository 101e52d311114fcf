use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row},
    Frame,
};

use salescrm_core::rules::{achievement_percentage, format_amount};
use salescrm_core::utils::{format_datetime, truncate_string};

use crate::app::{App, Tab};

use super::render_list_table;
use super::super_admin::{request_row, REQUEST_WIDTHS};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Agents => render_agents(frame, app, area),
        Tab::SaleRequests => render_sale_requests(frame, app, area),
        Tab::RewardRequests => render_reward_requests(frame, app, area),
        _ => {}
    }
}

fn render_agents(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.agents,
        "Agents",
        "[n]ew [t]arget",
        Row::new(vec!["Name", "Username", "Coins", "Deposits", "Target", "Progress"]),
        &[
            Constraint::Percentage(30),
            Constraint::Percentage(20),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(9),
        ],
        |agent| {
            let deposits = agent.deposits.unwrap_or(0.0);
            let target = agent.target_monthly.unwrap_or(0.0);
            Row::new(vec![
                Cell::from(truncate_string(agent.display_name(), 30)),
                Cell::from(agent.username.clone()),
                Cell::from(format_amount(agent.coins.unwrap_or(0.0))),
                Cell::from(format_amount(deposits)),
                Cell::from(format_amount(target)),
                Cell::from(format!("{:.1}%", achievement_percentage(deposits, target))),
            ])
        },
    );
}

fn render_sale_requests(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.sale_requests,
        "Sale Requests",
        "[a]pprove",
        Row::new(vec!["Agent", "Sale", "Coins", "Deposits", "Submitted"]),
        &REQUEST_WIDTHS,
        request_row,
    );
}

fn render_reward_requests(frame: &mut Frame, app: &App, area: Rect) {
    render_list_table(
        frame,
        area,
        &app.reward_requests,
        "Reward Requests",
        "[a]pprove",
        Row::new(vec!["Agent", "Prize", "Redeemed"]),
        &[
            Constraint::Percentage(35),
            Constraint::Fill(1),
            Constraint::Length(20),
        ],
        |item| {
            Row::new(vec![
                Cell::from(truncate_string(
                    item.agent_name.as_deref().unwrap_or(&item.agent_id),
                    30,
                )),
                Cell::from(item.prize_name.clone()),
                Cell::from(format_datetime(item.redeemed_at.as_ref())),
            ])
        },
    );
}
