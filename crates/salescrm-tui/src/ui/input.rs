//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use salescrm_core::router::ViewKind;
use salescrm_core::rules::SaleAmount;

use crate::app::{can_add_password_char, can_add_username_char, Action, App, AppState, LoginFocus, Tab};
use crate::form::{Form, FormKind};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ShowingNotice => {
            app.dismiss_notice();
            return Ok(false);
        }
        AppState::Confirming => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.resolve_confirm(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.resolve_confirm(false),
                _ => {}
            }
            return Ok(false);
        }
        AppState::EditingForm => {
            handle_form_input(app, key);
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    match app.view {
        ViewKind::Loading => Ok(false),
        ViewKind::Login => handle_login_input(app, key).await,
        ViewKind::UnknownRole => {
            match key.code {
                KeyCode::Char('L') => app.logout(),
                KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
                _ => {}
            }
            Ok(false)
        }
        ViewKind::SuperAdmin | ViewKind::Admin | ViewKind::Agent => {
            handle_dashboard_input(app, key);
            Ok(false)
        }
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    let form = match app.form.as_mut() {
        Some(form) => form,
        None => {
            app.state = AppState::Normal;
            return;
        }
    };

    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Enter => {
            if form.is_last_field() {
                app.submit_form();
            } else {
                form.focus_next();
            }
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            // Enter in the password field submits directly
            LoginFocus::Password | LoginFocus::Button => app.attempt_login().await,
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return;
        }
        KeyCode::Char('L') => {
            app.logout();
            return;
        }
        KeyCode::Char('r') => {
            app.status_message = None;
            app.refresh_view();
            return;
        }
        KeyCode::Tab | KeyCode::Right => {
            app.current_tab = app.current_tab.cycle(app.view, true);
            app.status_message = None;
            return;
        }
        KeyCode::BackTab | KeyCode::Left => {
            app.current_tab = app.current_tab.cycle(app.view, false);
            app.status_message = None;
            return;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            select(app, true);
            return;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            select(app, false);
            return;
        }
        _ => {}
    }

    // Tab-specific input
    match app.current_tab {
        Tab::Admins => handle_admins_input(app, key),
        Tab::Agents => handle_agents_input(app, key),
        Tab::Users => {
            if key.code == KeyCode::Char('e') {
                if let Some(form) = app.users.selected().map(Form::edit_credentials) {
                    app.open_form(form);
                }
            }
        }
        Tab::Catalog => handle_catalog_input(app, key),
        Tab::CoinRequests => {
            if key.code == KeyCode::Char('a') {
                if let Some(request) = app.coin_requests.selected() {
                    let action = Action::ApproveCoinRequest {
                        request_id: request.id.clone(),
                    };
                    app.perform(action);
                }
            }
        }
        Tab::SaleRequests => {
            if key.code == KeyCode::Char('a') {
                if let Some(request) = app.sale_requests.selected() {
                    let action = Action::ApproveSaleRequest {
                        request_id: request.id.clone(),
                    };
                    app.perform(action);
                }
            }
        }
        Tab::RewardRequests => {
            if key.code == KeyCode::Char('a') {
                if let Some(reward) = app.reward_requests.selected() {
                    let action = Action::ApproveRewardRequest {
                        reward_id: reward.id.clone(),
                    };
                    app.perform(action);
                }
            }
        }
        Tab::Dashboard => {
            let amount = match key.code {
                KeyCode::Char('1') => SaleAmount::ALL.first(),
                KeyCode::Char('2') => SaleAmount::ALL.get(1),
                KeyCode::Char('3') => SaleAmount::ALL.get(2),
                _ => None,
            };
            if let Some(amount) = amount {
                app.perform(Action::SubmitSale(*amount));
            }
        }
        Tab::Leaderboard => {}
        Tab::Shop => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('b')) {
                app.request_redeem();
            }
        }
        Tab::RewardBag => {
            if key.code == KeyCode::Char('u') {
                app.request_reward_use();
            }
        }
    }
}

fn select(app: &mut App, down: bool) {
    macro_rules! step {
        ($list:expr) => {
            if down {
                $list.select_next()
            } else {
                $list.select_prev()
            }
        };
    }

    match app.current_tab {
        Tab::Admins => step!(app.admins),
        Tab::Agents => step!(app.agents),
        Tab::Users => step!(app.users),
        Tab::Catalog => step!(app.catalog),
        Tab::CoinRequests => step!(app.coin_requests),
        Tab::SaleRequests => step!(app.sale_requests),
        Tab::RewardRequests => step!(app.reward_requests),
        Tab::Leaderboard => step!(app.leaderboard),
        Tab::Shop => step!(app.shop),
        Tab::RewardBag => step!(app.reward_bag),
        Tab::Dashboard => {}
    }
}

fn handle_admins_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.open_form(Form::new_account(FormKind::CreateAdmin)),
        KeyCode::Char('p') => {
            if let Some(form) = app.admins.selected().map(Form::change_admin_password) {
                app.open_form(form);
            }
        }
        KeyCode::Char('d') => {
            if let Some(admin) = app.admins.selected() {
                let prompt = format!("Delete admin {}?", admin.display_name());
                let action = Action::DeleteAdmin {
                    admin_id: admin.id.clone(),
                };
                app.ask_confirm(prompt, action);
            }
        }
        _ => {}
    }
}

fn handle_agents_input(app: &mut App, key: KeyEvent) {
    match (app.view, key.code) {
        (ViewKind::SuperAdmin, KeyCode::Char('n')) => {
            app.open_form(Form::new_account(FormKind::CreateAgentAsSuperAdmin))
        }
        (ViewKind::Admin, KeyCode::Char('n')) => app.open_form(Form::new_account(FormKind::CreateAgent)),
        (ViewKind::Admin, KeyCode::Char('t')) => {
            if let Some(form) = app.agents.selected().map(Form::set_target) {
                app.open_form(form);
            }
        }
        _ => {}
    }
}

fn handle_catalog_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.open_form(Form::new_prize()),
        KeyCode::Char('e') => {
            if let Some(form) = app.catalog.selected().map(Form::edit_prize) {
                app.open_form(form);
            }
        }
        KeyCode::Char('d') => {
            if let Some(prize) = app.catalog.selected() {
                let prompt = format!("Delete prize {}?", prize.name);
                let action = Action::DeletePrize {
                    prize_id: prize.id.clone(),
                };
                app.ask_confirm(prompt, action);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use salescrm_core::api::ApiClient;
    use salescrm_core::auth::{MemoryTokenStore, SessionStore, TokenStore};
    use salescrm_core::config::Config;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn login_app() -> App {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let store: Box<dyn TokenStore> = Box::new(MemoryTokenStore::new());
        let mut app = App::with_session(Config::default(), SessionStore::new(api, store));
        app.initialize().await;
        app
    }

    #[tokio::test]
    async fn test_login_typing_and_focus() {
        let mut app = login_app().await;
        app.login_username.clear();
        app.login_password.clear();
        app.login_focus = LoginFocus::Username;

        for c in "agent1".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        for c in "pw".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_input(&mut app, key(KeyCode::Backspace)).await.unwrap();

        assert_eq!(app.login_username, "agent1");
        assert_eq!(app.login_password, "p");
        assert_eq!(app.login_focus, LoginFocus::Password);

        handle_input(&mut app, key(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.login_focus, LoginFocus::Username);
    }

    #[tokio::test]
    async fn test_escape_on_login_quits() {
        let mut app = login_app().await;
        assert!(handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let mut app = login_app().await;
        app.state = AppState::ConfirmingQuit;
        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))).await.unwrap());
        assert_eq!(app.state, AppState::Normal);

        app.state = AppState::ConfirmingQuit;
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).await.unwrap());
    }

    #[tokio::test]
    async fn test_any_key_dismisses_notice() {
        let mut app = login_app().await;
        app.show_notice("Insufficient balance", true);
        handle_input(&mut app, key(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn test_form_editing_and_cancel() {
        let mut app = login_app().await;
        app.open_form(Form::new_account(FormKind::CreateAdmin));

        handle_input(&mut app, key(KeyCode::Char('a'))).await.unwrap();
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.form.as_ref().map(|f| f.focus), Some(1));
        assert_eq!(app.form.as_ref().map(|f| f.fields[0].value.as_str()), Some("a"));

        handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(app.form.is_none());
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_invalid_form_stays_open_with_error() {
        let mut app = login_app().await;
        app.open_form(Form::new_account(FormKind::CreateAgent));
        app.form.as_mut().unwrap().focus = 2;

        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.state, AppState::EditingForm);
        assert_eq!(
            app.form.as_ref().and_then(|f| f.error.clone()),
            Some("Username is required".to_string())
        );
    }

    #[tokio::test]
    async fn test_declined_confirm_does_nothing() {
        let mut app = login_app().await;
        app.ask_confirm(
            "Delete prize Mug?",
            Action::DeletePrize {
                prize_id: "p1".into(),
            },
        );
        handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(app.confirm.is_none());
        assert_eq!(app.pending_writes, 0);
    }
}
