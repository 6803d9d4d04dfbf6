use std::env;

use crate::discord::DiscordConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub admin_token: String,
    pub key_prefix: String,
    pub discord: Option<DiscordConfig>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("DASHY_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let admin_token = match env::var("ADMIN_API_TOKEN") {
            Ok(token) if !token.is_empty() => token,
            _ if dev_mode => {
                tracing::warn!("ADMIN_API_TOKEN not set, using dev default (dev mode only)");
                "dev-admin-token".to_string()
            }
            _ => panic!("ADMIN_API_TOKEN must be set outside dev mode"),
        };

        let discord = Self::discord_from_env();
        if discord.is_none() {
            tracing::info!("Discord role sync not configured (DISCORD_* vars missing)");
        }

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "dashy.db".to_string()),
            admin_token,
            key_prefix: env::var("LICENSE_KEY_PREFIX").unwrap_or_else(|_| "DASHY".to_string()),
            discord,
            dev_mode,
        }
    }

    /// Role sync is optional; it requires all four Discord settings.
    fn discord_from_env() -> Option<DiscordConfig> {
        Some(DiscordConfig {
            bot_token: env::var("DISCORD_BOT_TOKEN").ok()?,
            guild_id: env::var("DISCORD_GUILD_ID").ok()?,
            monthly_role_id: env::var("DISCORD_MONTHLY_ROLE_ID").ok()?,
            lifetime_role_id: env::var("DISCORD_LIFETIME_ROLE_ID").ok()?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
