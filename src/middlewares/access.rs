//! Role checks for order operations.
//!
//! The actor comes from a verified access token (see [`super::AuthMiddleware`]); a request
//! without a token has no actor and is treated as a guest.

use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Chef,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Chef => write!(f, "chef"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn get_actor_from_request(req: &HttpRequest) -> Option<Actor> {
    req.extensions().get::<Actor>().cloned()
}

/// Fails with `AuthError` when there is no actor and `Forbidden` when the role is not allowed.
pub fn require_roles<'a>(actor: Option<&'a Actor>, allowed: &[Role]) -> AppResult<&'a Actor> {
    let actor = actor.ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;
    if !allowed.contains(&actor.role) {
        return Err(AppError::Forbidden(format!(
            "Role {} is not allowed to access this resource",
            actor.role
        )));
    }
    Ok(actor)
}

/// The user reference an order is attributed to: any authenticated non-admin actor.
/// Admin sessions and guests place guest orders.
pub fn customer_identity(actor: Option<&Actor>) -> Option<&str> {
    actor
        .filter(|a| !a.is_admin() && !a.id.is_empty())
        .map(|a| a.id.as_str())
}

/// Identity recorded on payment verification; `"admin"` when the token carried no subject.
pub fn verifier_identity(actor: &Actor) -> String {
    if actor.id.trim().is_empty() {
        "admin".to_string()
    } else {
        actor.id.clone()
    }
}
