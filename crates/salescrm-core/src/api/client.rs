//! API client for communicating with the CRM REST backend.
//!
//! This module provides the `ApiClient` struct for making API requests on
//! behalf of super-admins, admins and agents. The client holds no
//! credentials: authenticated calls take a `RequestContext`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::auth::AuthBackend;
use crate::models::{
    ActionResponse, AgentDashboard, CredentialsUpdate, Identity, LeaderboardEntry, LoginResponse,
    NewUser, Prize, PrizeDraft, RewardBagItem, Role, SaleRequest, UserAccount,
};
use crate::rules::SaleAmount;

use super::{ApiError, RequestContext};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix of every backend route.
const API_PREFIX: &str = "/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the CRM backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the backend at `backend_url`
    /// (e.g. `http://localhost:8001`).
    pub fn new(backend_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}{}", backend_url.trim_end_matches('/'), API_PREFIX),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, ctx: Option<&RequestContext>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match ctx {
            Some(ctx) => builder.bearer_auth(ctx.token().as_str()),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send request to {}", path))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    async fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, path: &str) -> Result<T> {
        let builder = self.request(Method::GET, path, Some(ctx));
        self.send(builder, path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self.request(Method::POST, path, Some(ctx)).json(body);
        self.send(builder, path).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self.request(Method::PUT, path, Some(ctx)).json(body);
        self.send(builder, path).await
    }

    /// PUT with no request body, used by the approve endpoints.
    async fn put_empty<T: DeserializeOwned>(&self, ctx: &RequestContext, path: &str) -> Result<T> {
        let builder = self.request(Method::PUT, path, Some(ctx));
        self.send(builder, path).await
    }

    async fn delete<T: DeserializeOwned>(&self, ctx: &RequestContext, path: &str) -> Result<T> {
        let builder = self.request(Method::DELETE, path, Some(ctx));
        self.send(builder, path).await
    }

    // ===== Authentication =====

    /// Exchange credentials for a token and the account's identity
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let path = "/auth/login";
        let builder = self
            .request(Method::POST, path, None)
            .json(&json!({ "username": username, "password": password }));
        let response: LoginResponse = self.send(builder, path).await?;
        debug!(username, role = %response.user.role, "Authenticated");
        Ok(response)
    }

    /// Resolve the identity behind a token
    pub async fn fetch_me(&self, ctx: &RequestContext) -> Result<Identity> {
        self.get(ctx, "/auth/me").await
    }

    // ===== Super Admin =====

    /// Admin accounts, in the credentials view shape (`has_password`)
    pub async fn fetch_admins(&self, ctx: &RequestContext) -> Result<Vec<UserAccount>> {
        self.get(ctx, "/super-admin/users/admins").await
    }

    /// Agent accounts as seen by the super admin
    pub async fn fetch_all_agents(&self, ctx: &RequestContext) -> Result<Vec<UserAccount>> {
        self.get(ctx, "/super-admin/users/agents").await
    }

    /// Every admin and agent account
    pub async fn fetch_all_users(&self, ctx: &RequestContext) -> Result<Vec<UserAccount>> {
        self.get(ctx, "/super-admin/all-users").await
    }

    pub async fn create_admin(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<ActionResponse> {
        let body = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role: Role::Admin,
        };
        self.post(ctx, "/super-admin/admins", &body).await
    }

    pub async fn delete_admin(&self, ctx: &RequestContext, admin_id: &str) -> Result<ActionResponse> {
        self.delete(ctx, &format!("/super-admin/admins/{}", admin_id)).await
    }

    pub async fn change_admin_password(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        new_password: &str,
    ) -> Result<ActionResponse> {
        self.put(
            ctx,
            &format!("/super-admin/admins/{}/password", admin_id),
            &json!({ "new_password": new_password }),
        )
        .await
    }

    /// Create an agent from the super admin dashboard
    pub async fn create_agent_as_super_admin(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<ActionResponse> {
        let body = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role: Role::Agent,
        };
        self.post(ctx, "/super-admin/agents", &body).await
    }

    pub async fn update_user_credentials(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        update: &CredentialsUpdate,
    ) -> Result<ActionResponse> {
        self.put(ctx, &format!("/super-admin/users/{}/credentials", user_id), update)
            .await
    }

    /// Full prize catalog including inactive prizes
    pub async fn fetch_prize_catalog(&self, ctx: &RequestContext) -> Result<Vec<Prize>> {
        self.get(ctx, "/super-admin/prizes").await
    }

    pub async fn create_prize(&self, ctx: &RequestContext, draft: &PrizeDraft) -> Result<ActionResponse> {
        self.post(ctx, "/super-admin/prizes", draft).await
    }

    pub async fn update_prize(
        &self,
        ctx: &RequestContext,
        prize_id: &str,
        draft: &PrizeDraft,
    ) -> Result<ActionResponse> {
        self.put(ctx, &format!("/super-admin/prizes/{}", prize_id), draft)
            .await
    }

    pub async fn delete_prize(&self, ctx: &RequestContext, prize_id: &str) -> Result<ActionResponse> {
        self.delete(ctx, &format!("/super-admin/prizes/{}", prize_id)).await
    }

    // ===== Admin =====

    /// Agents visible to the caller (admins see their own and legacy agents)
    pub async fn fetch_agents(&self, ctx: &RequestContext) -> Result<Vec<UserAccount>> {
        self.get(ctx, "/admin/agents").await
    }

    pub async fn create_agent(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<ActionResponse> {
        let body = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role: Role::Agent,
        };
        self.post(ctx, "/admin/agents", &body).await
    }

    pub async fn update_agent_target(
        &self,
        ctx: &RequestContext,
        agent_id: &str,
        target_monthly: f64,
    ) -> Result<ActionResponse> {
        self.put(
            ctx,
            &format!("/admin/agents/{}/target", agent_id),
            &json!({ "target_monthly": target_monthly }),
        )
        .await
    }

    pub async fn fetch_sale_requests(&self, ctx: &RequestContext) -> Result<Vec<SaleRequest>> {
        self.get(ctx, "/admin/sale-requests").await
    }

    pub async fn approve_sale_request(&self, ctx: &RequestContext, request_id: &str) -> Result<ActionResponse> {
        self.put_empty(ctx, &format!("/admin/sale-requests/{}/approve", request_id))
            .await
    }

    pub async fn fetch_coin_requests(&self, ctx: &RequestContext) -> Result<Vec<SaleRequest>> {
        self.get(ctx, "/admin/coin-requests").await
    }

    pub async fn approve_coin_request(&self, ctx: &RequestContext, request_id: &str) -> Result<ActionResponse> {
        self.put_empty(ctx, &format!("/admin/coin-requests/{}/approve", request_id))
            .await
    }

    /// Rewards agents have asked to use
    pub async fn fetch_reward_requests(&self, ctx: &RequestContext) -> Result<Vec<RewardBagItem>> {
        self.get(ctx, "/admin/reward-requests").await
    }

    pub async fn approve_reward_request(&self, ctx: &RequestContext, reward_id: &str) -> Result<ActionResponse> {
        self.put_empty(ctx, &format!("/admin/reward-requests/{}/approve", reward_id))
            .await
    }

    // ===== Agent =====

    pub async fn fetch_agent_dashboard(&self, ctx: &RequestContext) -> Result<AgentDashboard> {
        self.get(ctx, "/agent/dashboard").await
    }

    pub async fn fetch_leaderboard(&self, ctx: &RequestContext) -> Result<Vec<LeaderboardEntry>> {
        self.get(ctx, "/agent/leaderboard").await
    }

    pub async fn fetch_reward_bag(&self, ctx: &RequestContext) -> Result<Vec<RewardBagItem>> {
        self.get(ctx, "/agent/reward-bag").await
    }

    pub async fn submit_sale_request(&self, ctx: &RequestContext, amount: SaleAmount) -> Result<ActionResponse> {
        self.post(ctx, "/agent/sale-request", &json!({ "sale_amount": amount.wire_value() }))
            .await
    }

    pub async fn request_reward_use(&self, ctx: &RequestContext, reward_id: &str) -> Result<ActionResponse> {
        let path = format!("/agent/reward-bag/{}/request-use", reward_id);
        let builder = self.request(Method::POST, &path, Some(ctx));
        self.send(builder, &path).await
    }

    // ===== Shop =====

    /// Active prizes available for redemption
    pub async fn fetch_shop_prizes(&self, ctx: &RequestContext) -> Result<Vec<Prize>> {
        self.get(ctx, "/shop/prizes").await
    }

    pub async fn redeem_prize(&self, ctx: &RequestContext, prize_id: &str) -> Result<ActionResponse> {
        self.post(ctx, "/shop/redeem", &json!({ "prize_id": prize_id })).await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        ApiClient::login(self, username, password).await
    }

    async fn fetch_me(&self, ctx: &RequestContext) -> Result<Identity> {
        ApiClient::fetch_me(self, ctx).await
    }
}
