use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub selected_model: String,
    pub created_at: DateTime<Utc>,
}

/// The shape handed back to clients: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub selected_model: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            selected_model: user.selected_model,
            created_at: user.created_at,
        }
    }
}
