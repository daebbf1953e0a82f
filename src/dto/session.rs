use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub signed_in: bool,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

impl From<Option<AuthUser>> for SessionView {
    fn from(user: Option<AuthUser>) -> Self {
        match user {
            Some(user) => Self {
                signed_in: true,
                user_id: Some(user.user_id),
                email: user.email,
            },
            None => Self {
                signed_in: false,
                user_id: None,
                email: None,
            },
        }
    }
}
