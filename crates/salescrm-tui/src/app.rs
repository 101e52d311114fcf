//! Application state management for the sales CRM terminal client.
//!
//! `App` owns the session, the panels of whichever dashboard is mounted, the
//! modal overlays, and the channel that background fetch and write tasks
//! report back on.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use salescrm_core::api::{ApiClient, RequestContext};
use salescrm_core::auth::{SessionStore, TokenStore};
use salescrm_core::config::{self, Config};
use salescrm_core::models::{
    ActionResponse, AgentDashboard, CredentialsUpdate, Identity, LeaderboardEntry, Prize,
    PrizeDraft, RewardBagItem, SaleRequest, UserAccount,
};
use salescrm_core::panel::{run_mutation, MutationOutcome, ResourceList};
use salescrm_core::router::{select_view, ViewKind};
use salescrm_core::rules::{redeem_eligibility, SaleAmount};

use crate::form::Form;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

pub type Session = SessionStore<ApiClient, Box<dyn TokenStore>>;

// ============================================================================
// UI State Types
// ============================================================================

/// One tab of a dashboard. Each tab owns exactly one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Admins,
    Agents,
    Users,
    Catalog,
    CoinRequests,
    SaleRequests,
    RewardRequests,
    Dashboard,
    Leaderboard,
    Shop,
    RewardBag,
}

impl Tab {
    pub fn for_view(view: ViewKind) -> &'static [Tab] {
        match view {
            ViewKind::SuperAdmin => &[
                Tab::Admins,
                Tab::Agents,
                Tab::Users,
                Tab::Catalog,
                Tab::CoinRequests,
            ],
            ViewKind::Admin => &[Tab::Agents, Tab::SaleRequests, Tab::RewardRequests],
            ViewKind::Agent => &[Tab::Dashboard, Tab::Leaderboard, Tab::Shop, Tab::RewardBag],
            ViewKind::Loading | ViewKind::Login | ViewKind::UnknownRole => &[],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Admins => "Admins",
            Tab::Agents => "Agents",
            Tab::Users => "User Credentials",
            Tab::Catalog => "Shop Management",
            Tab::CoinRequests => "Coin Requests",
            Tab::SaleRequests => "Sale Requests",
            Tab::RewardRequests => "Reward Requests",
            Tab::Dashboard => "Dashboard",
            Tab::Leaderboard => "Leaderboard",
            Tab::Shop => "Prize Shop",
            Tab::RewardBag => "Reward Bag",
        }
    }

    /// Next (or previous) tab within `view`, wrapping around.
    pub fn cycle(self, view: ViewKind, forward: bool) -> Tab {
        let tabs = Tab::for_view(view);
        match tabs.iter().position(|t| *t == self) {
            Some(i) if forward => tabs[(i + 1) % tabs.len()],
            Some(i) => tabs[(i + tabs.len() - 1) % tabs.len()],
            None => tabs.first().copied().unwrap_or(self),
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    EditingForm,
    Confirming,
    ShowingNotice,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Blocking message shown after a write completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

/// A write waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirm {
    pub prompt: String,
    pub action: Action,
}

// ============================================================================
// Writes
// ============================================================================

/// Every write a dashboard can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateAdmin {
        username: String,
        password: String,
        name: String,
    },
    DeleteAdmin {
        admin_id: String,
    },
    ChangeAdminPassword {
        admin_id: String,
        new_password: String,
    },
    CreateAgentAsSuperAdmin {
        username: String,
        password: String,
        name: String,
    },
    UpdateCredentials {
        user_id: String,
        update: CredentialsUpdate,
    },
    CreatePrize(PrizeDraft),
    UpdatePrize {
        prize_id: String,
        draft: PrizeDraft,
    },
    DeletePrize {
        prize_id: String,
    },
    ApproveCoinRequest {
        request_id: String,
    },
    CreateAgent {
        username: String,
        password: String,
        name: String,
    },
    SetTarget {
        agent_id: String,
        target_monthly: f64,
    },
    ApproveSaleRequest {
        request_id: String,
    },
    ApproveRewardRequest {
        reward_id: String,
    },
    SubmitSale(SaleAmount),
    Redeem {
        prize_id: String,
    },
    RequestRewardUse {
        reward_id: String,
    },
}

impl Action {
    /// Panel re-read after the write succeeds.
    pub fn panel(&self) -> Tab {
        match self {
            Action::CreateAdmin { .. }
            | Action::DeleteAdmin { .. }
            | Action::ChangeAdminPassword { .. } => Tab::Admins,
            Action::CreateAgentAsSuperAdmin { .. }
            | Action::CreateAgent { .. }
            | Action::SetTarget { .. } => Tab::Agents,
            Action::UpdateCredentials { .. } => Tab::Users,
            Action::CreatePrize(_) | Action::UpdatePrize { .. } | Action::DeletePrize { .. } => {
                Tab::Catalog
            }
            Action::ApproveCoinRequest { .. } => Tab::CoinRequests,
            Action::ApproveSaleRequest { .. } => Tab::SaleRequests,
            Action::ApproveRewardRequest { .. } => Tab::RewardRequests,
            Action::SubmitSale(_) => Tab::Dashboard,
            Action::Redeem { .. } => Tab::Shop,
            Action::RequestRewardUse { .. } => Tab::RewardBag,
        }
    }

    /// Other panels whose data the write changes.
    pub fn also_refreshes(&self) -> &'static [Tab] {
        match self {
            Action::CreateAdmin { .. } | Action::DeleteAdmin { .. } => &[Tab::Users],
            Action::CreateAgentAsSuperAdmin { .. } => &[Tab::Users],
            Action::UpdateCredentials { .. } => &[Tab::Admins, Tab::Agents],
            Action::ApproveSaleRequest { .. } | Action::ApproveCoinRequest { .. } => &[Tab::Agents],
            Action::Redeem { .. } => &[Tab::Dashboard, Tab::RewardBag],
            _ => &[],
        }
    }

    /// Message shown when the server gives no detail.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Action::CreateAdmin { .. } => "Error creating admin",
            Action::DeleteAdmin { .. } => "Error deleting admin",
            Action::ChangeAdminPassword { .. } => "Error changing password",
            Action::CreateAgentAsSuperAdmin { .. } | Action::CreateAgent { .. } => {
                "Error creating agent"
            }
            Action::UpdateCredentials { .. } => "Error updating credentials",
            Action::CreatePrize(_) => "Error creating prize",
            Action::UpdatePrize { .. } => "Error updating prize",
            Action::DeletePrize { .. } => "Error deleting prize",
            Action::ApproveCoinRequest { .. } => "Error approving coin request",
            Action::SetTarget { .. } => "Error setting target",
            Action::ApproveSaleRequest { .. } => "Error approving sale request",
            Action::ApproveRewardRequest { .. } => "Error approving reward request",
            Action::SubmitSale(_) => "Error submitting sale request",
            Action::Redeem { .. } => "Error redeeming prize",
            Action::RequestRewardUse { .. } => "Error requesting reward use",
        }
    }

    async fn execute(&self, api: &ApiClient, ctx: &RequestContext) -> Result<ActionResponse> {
        match self {
            Action::CreateAdmin { username, password, name } => {
                api.create_admin(ctx, username, password, name).await
            }
            Action::DeleteAdmin { admin_id } => api.delete_admin(ctx, admin_id).await,
            Action::ChangeAdminPassword { admin_id, new_password } => {
                api.change_admin_password(ctx, admin_id, new_password).await
            }
            Action::CreateAgentAsSuperAdmin { username, password, name } => {
                api.create_agent_as_super_admin(ctx, username, password, name).await
            }
            Action::UpdateCredentials { user_id, update } => {
                api.update_user_credentials(ctx, user_id, update).await
            }
            Action::CreatePrize(draft) => api.create_prize(ctx, draft).await,
            Action::UpdatePrize { prize_id, draft } => api.update_prize(ctx, prize_id, draft).await,
            Action::DeletePrize { prize_id } => api.delete_prize(ctx, prize_id).await,
            Action::ApproveCoinRequest { request_id } => {
                api.approve_coin_request(ctx, request_id).await
            }
            Action::CreateAgent { username, password, name } => {
                api.create_agent(ctx, username, password, name).await
            }
            Action::SetTarget { agent_id, target_monthly } => {
                api.update_agent_target(ctx, agent_id, *target_monthly).await
            }
            Action::ApproveSaleRequest { request_id } => {
                api.approve_sale_request(ctx, request_id).await
            }
            Action::ApproveRewardRequest { reward_id } => {
                api.approve_reward_request(ctx, reward_id).await
            }
            Action::SubmitSale(amount) => api.submit_sale_request(ctx, *amount).await,
            Action::Redeem { prize_id } => api.redeem_prize(ctx, prize_id).await,
            Action::RequestRewardUse { reward_id } => api.request_reward_use(ctx, reward_id).await,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Data read for one panel.
#[derive(Debug)]
pub enum PanelData {
    Accounts(Vec<UserAccount>),
    Prizes(Vec<Prize>),
    Requests(Vec<SaleRequest>),
    Rewards(Vec<RewardBagItem>),
    Leaderboard(Vec<LeaderboardEntry>),
    Dashboard(AgentDashboard),
}

macro_rules! panel_data_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        fn $fn_name(self) -> Result<$ty> {
            match self {
                PanelData::$variant(data) => Ok(data),
                other => Err(anyhow!("Unexpected {} payload", other.kind())),
            }
        }
    };
}

impl PanelData {
    fn kind(&self) -> &'static str {
        match self {
            PanelData::Accounts(_) => "accounts",
            PanelData::Prizes(_) => "prizes",
            PanelData::Requests(_) => "requests",
            PanelData::Rewards(_) => "rewards",
            PanelData::Leaderboard(_) => "leaderboard",
            PanelData::Dashboard(_) => "dashboard",
        }
    }

    panel_data_accessor!(into_accounts, Accounts, Vec<UserAccount>);
    panel_data_accessor!(into_prizes, Prizes, Vec<Prize>);
    panel_data_accessor!(into_requests, Requests, Vec<SaleRequest>);
    panel_data_accessor!(into_rewards, Rewards, Vec<RewardBagItem>);
    panel_data_accessor!(into_leaderboard, Leaderboard, Vec<LeaderboardEntry>);
    panel_data_accessor!(into_dashboard, Dashboard, AgentDashboard);
}

/// Issue the read that backs `tab` on `view`.
async fn read_panel(api: &ApiClient, ctx: &RequestContext, view: ViewKind, tab: Tab) -> Result<PanelData> {
    Ok(match tab {
        Tab::Admins => PanelData::Accounts(api.fetch_admins(ctx).await?),
        Tab::Agents if view == ViewKind::SuperAdmin => PanelData::Accounts(api.fetch_all_agents(ctx).await?),
        Tab::Agents => PanelData::Accounts(api.fetch_agents(ctx).await?),
        Tab::Users => PanelData::Accounts(api.fetch_all_users(ctx).await?),
        Tab::Catalog => PanelData::Prizes(api.fetch_prize_catalog(ctx).await?),
        Tab::CoinRequests => PanelData::Requests(api.fetch_coin_requests(ctx).await?),
        Tab::SaleRequests => PanelData::Requests(api.fetch_sale_requests(ctx).await?),
        Tab::RewardRequests => PanelData::Rewards(api.fetch_reward_requests(ctx).await?),
        Tab::Dashboard => PanelData::Dashboard(api.fetch_agent_dashboard(ctx).await?),
        Tab::Leaderboard => PanelData::Leaderboard(api.fetch_leaderboard(ctx).await?),
        Tab::Shop => PanelData::Prizes(api.fetch_shop_prizes(ctx).await?),
        Tab::RewardBag => PanelData::Rewards(api.fetch_reward_bag(ctx).await?),
    })
}

#[derive(Debug)]
enum TaskResult {
    Read {
        tab: Tab,
        result: Result<PanelData>,
    },
    Identity(Result<Identity>),
    Write {
        action: Action,
        outcome: MutationOutcome<PanelData>,
    },
}

/// A task result tagged with the mount generation that spawned it.
#[derive(Debug)]
struct TaskMessage {
    generation: u64,
    result: TaskResult,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,

    // UI State
    pub state: AppState,
    pub view: ViewKind,
    pub current_tab: Tab,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Super admin panels
    pub admins: ResourceList<UserAccount>,
    pub users: ResourceList<UserAccount>,
    pub catalog: ResourceList<Prize>,
    pub coin_requests: ResourceList<SaleRequest>,

    // Shared between super admin and admin
    pub agents: ResourceList<UserAccount>,

    // Admin panels
    pub sale_requests: ResourceList<SaleRequest>,
    pub reward_requests: ResourceList<RewardBagItem>,

    // Agent panels
    pub dashboard: Option<AgentDashboard>,
    pub leaderboard: ResourceList<LeaderboardEntry>,
    pub shop: ResourceList<Prize>,
    pub reward_bag: ResourceList<RewardBagItem>,

    // Overlays
    pub form: Option<Form>,
    pub confirm: Option<Confirm>,
    pub notice: Option<Notice>,

    // Status message
    pub status_message: Option<String>,
    pub pending_writes: usize,

    // Background tasks of the mounted view
    generation: u64,
    tasks: Vec<AbortHandle>,
    task_rx: mpsc::Receiver<TaskMessage>,
    task_tx: mpsc::Sender<TaskMessage>,
}

impl App {
    /// Create a new application instance from the loaded config
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.backend_url())?;
        debug!(base_url = %api.base_url(), "API client configured");
        let store = config.token_store()?;
        Ok(Self::with_session(config, SessionStore::new(api, store)))
    }

    pub fn with_session(config: Config, session: Session) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_username = config.default_username().unwrap_or_default();
        let login_password = config::env_password().unwrap_or_default();

        Self {
            config,
            session,

            state: AppState::Normal,
            view: ViewKind::Loading,
            current_tab: Tab::Dashboard,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            admins: ResourceList::new("admins"),
            users: ResourceList::new("users"),
            catalog: ResourceList::new("prize catalog"),
            coin_requests: ResourceList::new("coin requests"),
            agents: ResourceList::new("agents"),
            sale_requests: ResourceList::new("sale requests"),
            reward_requests: ResourceList::new("reward requests"),
            dashboard: None,
            leaderboard: ResourceList::new("leaderboard"),
            shop: ResourceList::new("prize shop"),
            reward_bag: ResourceList::new("reward bag"),

            form: None,
            confirm: None,
            notice: None,

            status_message: None,
            pending_writes: 0,

            generation: 0,
            tasks: Vec::new(),
            task_rx: rx,
            task_tx: tx,
        }
    }

    /// Resolve any persisted session, then mount the resulting view.
    pub async fn initialize(&mut self) {
        self.session.initialize().await;
        self.sync_view();
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        self.login_error = None;

        match self.session.login(&username, &password).await {
            Ok(identity) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.login_password.clear();
                info!(role = %identity.role, "Logged in from login form");
                self.sync_view();
            }
            Err(e) => {
                error!(error = %e.cause, "Login failed");
                self.login_error = Some(e.message);
            }
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.login_password.clear();
        self.sync_view();
    }

    /// Reset the login form focus
    pub fn start_login(&mut self) {
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    // =========================================================================
    // View Mounting
    // =========================================================================

    /// Remount if the session now routes to a different view.
    pub fn sync_view(&mut self) {
        let view = select_view(self.session.identity(), self.session.is_loading());
        if view == self.view {
            return;
        }
        debug!(from = ?self.view, to = ?view, "Switching view");
        self.unmount();
        self.view = view;
        self.mount();
    }

    fn mount(&mut self) {
        self.state = AppState::Normal;
        if let Some(first) = Tab::for_view(self.view).first() {
            self.current_tab = *first;
        }
        if self.view == ViewKind::Login {
            self.start_login();
        }
        self.refresh_view();
    }

    /// Cancel in-flight work and drop every panel's data.
    fn unmount(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
        self.generation += 1;
        self.pending_writes = 0;

        self.admins.reset();
        self.users.reset();
        self.catalog.reset();
        self.coin_requests.reset();
        self.agents.reset();
        self.sale_requests.reset();
        self.reward_requests.reset();
        self.dashboard = None;
        self.leaderboard.reset();
        self.shop.reset();
        self.reward_bag.reset();

        self.form = None;
        self.confirm = None;
        self.notice = None;
        self.status_message = None;
    }

    /// Re-read every panel of the mounted view.
    pub fn refresh_view(&mut self) {
        for tab in Tab::for_view(self.view) {
            self.spawn_read(*tab);
        }
    }

    fn spawn_read(&mut self, tab: Tab) {
        let ctx = match self.session.context() {
            Some(ctx) => ctx.clone(),
            None => return,
        };
        let api = self.session.backend().clone();
        let tx = self.task_tx.clone();
        let generation = self.generation;
        let view = self.view;

        let handle = tokio::spawn(async move {
            let result = read_panel(&api, &ctx, view, tab).await;
            send_message(&tx, TaskMessage {
                generation,
                result: TaskResult::Read { tab, result },
            })
            .await;
        });
        self.tasks.push(handle.abort_handle());
    }

    /// Re-read `/auth/me` in the background so the coin balance follows
    /// writes that change it.
    fn spawn_identity_refresh(&mut self) {
        let ctx = match self.session.context() {
            Some(ctx) => ctx.clone(),
            None => return,
        };
        let api = self.session.backend().clone();
        let tx = self.task_tx.clone();
        let generation = self.generation;

        let handle = tokio::spawn(async move {
            let result = api.fetch_me(&ctx).await;
            send_message(&tx, TaskMessage {
                generation,
                result: TaskResult::Identity(result),
            })
            .await;
        });
        self.tasks.push(handle.abort_handle());
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Spawn a write followed, on success, by a re-read of its panel.
    pub fn perform(&mut self, action: Action) {
        let ctx = match self.session.context() {
            Some(ctx) => ctx.clone(),
            None => return,
        };
        let api = self.session.backend().clone();
        let tx = self.task_tx.clone();
        let generation = self.generation;
        let view = self.view;
        let tab = action.panel();

        info!(panel = tab.title(), "Submitting write");
        self.pending_writes += 1;

        let handle = tokio::spawn(async move {
            let outcome = run_mutation(
                tab.title(),
                || action.execute(&api, &ctx),
                || read_panel(&api, &ctx, view, tab),
                action.fallback_message(),
            )
            .await;
            send_message(&tx, TaskMessage {
                generation,
                result: TaskResult::Write { action, outcome },
            })
            .await;
        });
        self.tasks.push(handle.abort_handle());
    }

    pub fn open_form(&mut self, form: Form) {
        self.form = Some(form);
        self.state = AppState::EditingForm;
    }

    /// Validate the open form and submit it. Validation errors stay on the form.
    pub fn submit_form(&mut self) {
        let action = match self.form.as_mut() {
            Some(form) => match form.to_action() {
                Ok(action) => action,
                Err(message) => {
                    form.error = Some(message);
                    return;
                }
            },
            None => return,
        };
        self.form = None;
        self.state = AppState::Normal;
        self.perform(action);
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    pub fn ask_confirm(&mut self, prompt: impl Into<String>, action: Action) {
        self.confirm = Some(Confirm {
            prompt: prompt.into(),
            action,
        });
        self.state = AppState::Confirming;
    }

    pub fn resolve_confirm(&mut self, accepted: bool) {
        self.state = AppState::Normal;
        if let Some(confirm) = self.confirm.take() {
            if accepted {
                self.perform(confirm.action);
            }
        }
    }

    pub fn show_notice(&mut self, message: impl Into<String>, is_error: bool) {
        self.notice = Some(Notice {
            message: message.into(),
            is_error,
        });
        self.state = AppState::ShowingNotice;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Agent Helpers
    // =========================================================================

    /// Balance used to gate redemption: the dashboard's figure once loaded,
    /// otherwise the identity's.
    pub fn coin_balance(&self) -> f64 {
        match &self.dashboard {
            Some(dashboard) => dashboard.agent_info.coins,
            None => self
                .session
                .identity()
                .map(|i| i.coin_balance())
                .unwrap_or(0.0),
        }
    }

    /// Redeem the selected prize if the balance and stock allow it.
    pub fn request_redeem(&mut self) {
        let prize = match self.shop.selected() {
            Some(prize) => prize,
            None => return,
        };
        let eligibility = redeem_eligibility(self.coin_balance(), prize);
        if !eligibility.is_enabled() {
            self.status_message = Some(eligibility.label().to_string());
            return;
        }
        let prompt = format!("Redeem {} for {} coins?", prize.name, prize.coin_cost);
        let action = Action::Redeem {
            prize_id: prize.id.clone(),
        };
        self.ask_confirm(prompt, action);
    }

    pub fn request_reward_use(&mut self) {
        let item = match self.reward_bag.selected() {
            Some(item) => item,
            None => return,
        };
        if !item.status.can_request_use() {
            self.status_message = Some(item.status.label().to_string());
            return;
        }
        let action = Action::RequestRewardUse {
            reward_id: item.id.clone(),
        };
        self.perform(action);
    }

    // =========================================================================
    // Background Results
    // =========================================================================

    /// Drain finished task results and apply those from the current mount.
    pub async fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(message) = self.task_rx.try_recv() {
            results.push(message);
        }

        for message in results {
            if message.generation != self.generation {
                debug!(generation = message.generation, "Discarding result from unmounted view");
                continue;
            }
            self.process_task_result(message.result);
        }

        self.tasks.retain(|handle| !handle.is_finished());
        self.sync_view();
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Read { tab, result } => self.apply_read(tab, result),
            TaskResult::Identity(result) => {
                if let Err(e) = self.session.apply_identity(result) {
                    warn!(error = %e, "Failed to refresh identity");
                }
            }
            TaskResult::Write { action, outcome } => {
                self.pending_writes = self.pending_writes.saturating_sub(1);
                match outcome {
                    MutationOutcome::Succeeded { message, refreshed } => {
                        self.apply_read(action.panel(), refreshed);
                        for tab in action.also_refreshes() {
                            self.spawn_read(*tab);
                        }
                        if matches!(action, Action::Redeem { .. }) {
                            self.spawn_identity_refresh();
                        }
                        let message = if message.is_empty() {
                            "Done".to_string()
                        } else {
                            message
                        };
                        self.show_notice(message, false);
                    }
                    MutationOutcome::Failed { message } => self.show_notice(message, true),
                }
            }
        }
    }

    fn apply_read(&mut self, tab: Tab, result: Result<PanelData>) {
        match tab {
            Tab::Admins => self.admins.apply_read(result.and_then(PanelData::into_accounts)),
            Tab::Agents => self.agents.apply_read(result.and_then(PanelData::into_accounts)),
            Tab::Users => self.users.apply_read(result.and_then(PanelData::into_accounts)),
            Tab::Catalog => self.catalog.apply_read(result.and_then(PanelData::into_prizes)),
            Tab::CoinRequests => self
                .coin_requests
                .apply_read(result.and_then(PanelData::into_requests)),
            Tab::SaleRequests => self
                .sale_requests
                .apply_read(result.and_then(PanelData::into_requests)),
            Tab::RewardRequests => self
                .reward_requests
                .apply_read(result.and_then(PanelData::into_rewards)),
            Tab::Leaderboard => self
                .leaderboard
                .apply_read(result.and_then(PanelData::into_leaderboard)),
            Tab::Shop => self.shop.apply_read(result.and_then(PanelData::into_prizes)),
            Tab::RewardBag => self.reward_bag.apply_read(result.and_then(PanelData::into_rewards)),
            Tab::Dashboard => match result.and_then(PanelData::into_dashboard) {
                Ok(dashboard) => {
                    debug!("Dashboard fetched");
                    self.dashboard = Some(dashboard);
                }
                Err(e) => warn!(error = %e, "Dashboard fetch failed, keeping previous"),
            },
        }
    }
}

/// Helper to send task results, logging any channel errors
async fn send_message(tx: &mpsc::Sender<TaskMessage>, message: TaskMessage) {
    if let Err(e) = tx.send(message).await {
        debug!(error = %e, "Task result dropped - channel closed");
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Check if a character is valid for text input (not a control character)
pub fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use salescrm_core::api::{ApiError, StatusCode};
    use salescrm_core::auth::MemoryTokenStore;

    fn test_app() -> App {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let store: Box<dyn TokenStore> = Box::new(MemoryTokenStore::new());
        App::with_session(Config::default(), SessionStore::new(api, store))
    }

    fn request(id: &str) -> SaleRequest {
        serde_json::from_str(&format!(
            r#"{{"id":"{}","agent_id":"a1","sale_amount":"250","coins_requested":1,"deposits_requested":1.5}}"#,
            id
        ))
        .unwrap()
    }

    async fn deliver(app: &mut App, generation: u64, result: TaskResult) {
        app.task_tx
            .send(TaskMessage { generation, result })
            .await
            .unwrap();
        app.check_background_tasks().await;
    }

    #[test]
    fn test_tabs_per_view() {
        assert_eq!(Tab::for_view(ViewKind::SuperAdmin).len(), 5);
        assert_eq!(
            Tab::for_view(ViewKind::Admin),
            &[Tab::Agents, Tab::SaleRequests, Tab::RewardRequests]
        );
        assert!(Tab::for_view(ViewKind::Login).is_empty());
        assert!(Tab::for_view(ViewKind::UnknownRole).is_empty());
    }

    #[test]
    fn test_tab_cycle_wraps() {
        assert_eq!(Tab::Dashboard.cycle(ViewKind::Agent, true), Tab::Leaderboard);
        assert_eq!(Tab::RewardBag.cycle(ViewKind::Agent, true), Tab::Dashboard);
        assert_eq!(Tab::Dashboard.cycle(ViewKind::Agent, false), Tab::RewardBag);
        // A tab from another view snaps to the first tab
        assert_eq!(Tab::Admins.cycle(ViewKind::Admin, true), Tab::Agents);
    }

    #[test]
    fn test_action_panels_and_fallbacks() {
        let approve = Action::ApproveCoinRequest {
            request_id: "42".into(),
        };
        assert_eq!(approve.panel(), Tab::CoinRequests);
        assert_eq!(approve.fallback_message(), "Error approving coin request");

        let approve_sale = Action::ApproveSaleRequest {
            request_id: "7".into(),
        };
        assert_eq!(approve_sale.also_refreshes(), &[Tab::Agents]);

        let redeem = Action::Redeem {
            prize_id: "p1".into(),
        };
        assert_eq!(redeem.panel(), Tab::Shop);
        assert_eq!(redeem.also_refreshes(), &[Tab::Dashboard, Tab::RewardBag]);
    }

    #[test]
    fn test_account_writes_refresh_every_listing_of_the_account() {
        let create_admin = Action::CreateAdmin {
            username: "admin2".into(),
            password: "pw".into(),
            name: "Admin Two".into(),
        };
        assert_eq!(create_admin.panel(), Tab::Admins);
        assert_eq!(create_admin.also_refreshes(), &[Tab::Users]);

        let delete_admin = Action::DeleteAdmin {
            admin_id: "ad1".into(),
        };
        assert_eq!(delete_admin.also_refreshes(), &[Tab::Users]);

        let create_agent = Action::CreateAgentAsSuperAdmin {
            username: "agent9".into(),
            password: "pw".into(),
            name: "Agent Nine".into(),
        };
        assert_eq!(create_agent.panel(), Tab::Agents);
        assert_eq!(create_agent.also_refreshes(), &[Tab::Users]);

        let update = Action::UpdateCredentials {
            user_id: "a1".into(),
            update: CredentialsUpdate {
                username: "agent1".into(),
                password: String::new(),
                name: "Agent One".into(),
            },
        };
        assert_eq!(update.panel(), Tab::Users);
        assert_eq!(update.also_refreshes(), &[Tab::Admins, Tab::Agents]);
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, '.'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, '@'));
        assert!(can_add_password_char(127, 'x'));
        assert!(!can_add_password_char(128, 'x'));
        assert!(!can_add_password_char(0, '\t'));
    }

    #[tokio::test]
    async fn test_initialize_without_token_mounts_login() {
        let mut app = test_app();
        assert_eq!(app.view, ViewKind::Loading);

        app.initialize().await;

        assert_eq!(app.view, ViewKind::Login);
        assert_eq!(app.login_focus, LoginFocus::Username);
    }

    #[tokio::test]
    async fn test_empty_login_is_rejected_locally() {
        let mut app = test_app();
        app.initialize().await;
        app.attempt_login().await;
        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
        assert_eq!(app.view, ViewKind::Login);
    }

    #[tokio::test]
    async fn test_stale_results_are_discarded() {
        let mut app = test_app();
        let stale = app.generation;
        app.unmount();

        let result = TaskResult::Read {
            tab: Tab::CoinRequests,
            result: Ok(PanelData::Requests(vec![request("1")])),
        };
        deliver(&mut app, stale, result).await;
        assert!(app.coin_requests.is_empty());
        assert!(!app.coin_requests.is_loaded());

        let current = app.generation;
        let result = TaskResult::Read {
            tab: Tab::CoinRequests,
            result: Ok(PanelData::Requests(vec![request("1")])),
        };
        deliver(&mut app, current, result).await;
        assert_eq!(app.coin_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_unmount_aborts_in_flight_tasks() {
        let mut app = test_app();
        let handle = tokio::spawn(futures::future::pending::<()>());
        app.tasks.push(handle.abort_handle());

        app.unmount();

        assert!(app.tasks.is_empty());
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_approval_shows_detail_and_keeps_list() {
        let mut app = test_app();
        let generation = app.generation;
        deliver(
            &mut app,
            generation,
            TaskResult::Read {
                tab: Tab::CoinRequests,
                result: Ok(PanelData::Requests(vec![request("41"), request("42")])),
            },
        )
        .await;

        let action = Action::ApproveCoinRequest {
            request_id: "42".into(),
        };
        let err: anyhow::Error =
            ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail":"Insufficient balance"}"#).into();
        let outcome = MutationOutcome::Failed {
            message: salescrm_core::api::user_message(&err, action.fallback_message()),
        };
        deliver(&mut app, generation, TaskResult::Write { action, outcome }).await;

        assert_eq!(app.state, AppState::ShowingNotice);
        assert_eq!(
            app.notice,
            Some(Notice {
                message: "Insufficient balance".into(),
                is_error: true,
            })
        );
        assert_eq!(app.coin_requests.len(), 2);
    }

    #[tokio::test]
    async fn test_successful_write_applies_refreshed_list() {
        let mut app = test_app();
        let generation = app.generation;
        let action = Action::ApproveCoinRequest {
            request_id: "42".into(),
        };
        let outcome = MutationOutcome::Succeeded {
            message: "Coin request approved".into(),
            refreshed: Ok(PanelData::Requests(vec![request("41")])),
        };
        deliver(&mut app, generation, TaskResult::Write { action, outcome }).await;

        assert_eq!(app.coin_requests.len(), 1);
        assert_eq!(app.notice.as_ref().map(|n| n.is_error), Some(false));
    }

    #[tokio::test]
    async fn test_identity_result_while_anonymous_is_ignored() {
        let mut app = test_app();
        app.initialize().await;
        let generation = app.generation;

        let identity: Identity = serde_json::from_str(
            r#"{"id":"a1","username":"agent1","role":"agent","coins":4}"#,
        )
        .unwrap();
        deliver(&mut app, generation, TaskResult::Identity(Ok(identity))).await;

        assert!(app.session.identity().is_none());
        assert_eq!(app.view, ViewKind::Login);
    }

    #[tokio::test]
    async fn test_mismatched_payload_keeps_list() {
        let mut app = test_app();
        let generation = app.generation;
        deliver(
            &mut app,
            generation,
            TaskResult::Read {
                tab: Tab::Shop,
                result: Ok(PanelData::Requests(vec![request("1")])),
            },
        )
        .await;
        assert!(!app.shop.is_loaded());
    }
}
