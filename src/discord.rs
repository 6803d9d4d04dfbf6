//! Discord REST client for role synchronization.
//!
//! Role calls are idempotent (PUT/DELETE on a member-role pair), so failures
//! and timeouts are reported as retryable upstream errors. Entitlement is
//! always recomputed from the store, never cached across a failed sync.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::roles::{PlanRole, RoleChangeSet};

const API_BASE: &str = "https://discord.com/api/v10";

/// Request timeout around each external call; timeouts are retryable.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub guild_id: String,
    pub monthly_role_id: String,
    pub lifetime_role_id: String,
}

#[derive(Debug, Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: API_BASE.to_string(),
            config,
        })
    }

    /// Point the client at a different API base (test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn role_id(&self, role: PlanRole) -> &str {
        match role {
            PlanRole::Monthly => &self.config.monthly_role_id,
            PlanRole::Lifetime => &self.config.lifetime_role_id,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.config.bot_token)
    }

    /// Whether the Discord account is a member of the target server.
    pub async fn is_guild_member(&self, discord_user_id: &str) -> Result<bool> {
        let url = format!(
            "{}/guilds/{}/members/{}",
            self.base_url, self.config.guild_id, discord_user_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Discord API error: {}", e)))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Upstream(format!(
                    "Discord member lookup failed ({}): {}",
                    status, body
                )))
            }
        }
    }

    async fn set_role(&self, discord_user_id: &str, role: PlanRole, grant: bool) -> Result<()> {
        let url = format!(
            "{}/guilds/{}/members/{}/roles/{}",
            self.base_url,
            self.config.guild_id,
            discord_user_id,
            self.role_id(role)
        );

        let request = if grant {
            self.client.put(&url)
        } else {
            self.client.delete(&url)
        };

        let response = request
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Discord API error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Discord role update failed ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    pub async fn add_role(&self, discord_user_id: &str, role: PlanRole) -> Result<()> {
        self.set_role(discord_user_id, role, true).await
    }

    pub async fn remove_role(&self, discord_user_id: &str, role: PlanRole) -> Result<()> {
        self.set_role(discord_user_id, role, false).await
    }

    /// Apply a projected change set. Revokes run before the grant so the two
    /// paid roles are never briefly held together (Discord has no atomic
    /// multi-role swap).
    pub async fn apply(&self, discord_user_id: &str, changes: &RoleChangeSet) -> Result<()> {
        for role in &changes.revoke {
            self.remove_role(discord_user_id, *role).await?;
        }
        if let Some(role) = changes.grant {
            self.add_role(discord_user_id, role).await?;
        }
        Ok(())
    }
}
