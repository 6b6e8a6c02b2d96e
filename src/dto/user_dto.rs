use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::user::{Role, UserProfile};
use crate::util::jwt::TokenPair;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[validate(url)]
    pub avatar: Option<String>,
}

/// Admin edit of another account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub role: Option<Role>,
    #[validate(url)]
    pub avatar: Option<String>,
}

/// Self-service edit; the role cannot be changed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    #[validate(url)]
    pub avatar: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUserRequest {
    fn from(req: UpdateProfileRequest) -> Self {
        UpdateUserRequest {
            name: req.name,
            email: req.email,
            password: req.password,
            avatar: req.avatar,
            ..Default::default()
        }
    }
}
