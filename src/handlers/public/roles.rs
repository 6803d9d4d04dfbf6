use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::roles::project_roles;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRolesBody {
    pub owner_id: String,
    pub discord_user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRolesResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// POST /roles/sync - Reflect the computed entitlement onto Discord roles.
///
/// Entitlement is recomputed from the store on every sync. Membership is a
/// precondition: a non-member short-circuits before any role change rather
/// than partially applying grants. Discord API failures surface as retryable
/// upstream errors and never alter entitlement state.
pub async fn sync_roles(
    State(state): State<AppState>,
    Json(body): Json<SyncRolesBody>,
) -> Result<Json<SyncRolesResponse>> {
    let owner_id = body.owner_id.trim();
    let discord_user_id = body.discord_user_id.trim();
    if owner_id.is_empty() || discord_user_id.is_empty() {
        return Err(AppError::BadRequest(
            "ownerId and discordUserId are required".into(),
        ));
    }

    let discord = state
        .discord
        .clone()
        .ok_or_else(|| AppError::Unavailable("Discord role sync is not configured".into()))?;

    // Scope the connection so it is not held across the external calls.
    let entitlement = {
        let conn = state.db.get()?;
        queries::entitlement_for_owner(&conn, owner_id, Utc::now().timestamp())?
    };

    if !discord.is_guild_member(discord_user_id).await? {
        return Ok(Json(SyncRolesResponse {
            status: "not_a_member",
            role: None,
            message: Some("Join the Discord server first, then retry"),
        }));
    }

    let changes = project_roles(&entitlement);
    discord.apply(discord_user_id, &changes).await?;

    match changes.grant {
        Some(role) => {
            tracing::info!(owner_id, role = role.label(), "Discord role synced");
            Ok(Json(SyncRolesResponse {
                status: "synced",
                role: Some(role.label()),
                message: None,
            }))
        }
        None => Ok(Json(SyncRolesResponse {
            status: "not_entitled",
            role: None,
            message: None,
        })),
    }
}
