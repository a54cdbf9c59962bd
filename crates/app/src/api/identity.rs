use axum::http::HeaderMap;

use course_core::api::{USER_ID_HEADER, USER_ROLE_HEADER};
use course_core::model::UserId;

use crate::api::error::ApiError;

/// Role granted by the auth proxy. Anything other than an explicit admin
/// marker is treated as a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub role: Role,
}

/// Read the authenticated user from the trusted identity headers.
///
/// The server sits behind a proxy that authenticates the learner and
/// forwards `x-user-id` and `x-user-role`; requests without them never come
/// from the proxy and are refused.
///
/// # Errors
///
/// Returns `ApiError::Forbidden` when the id header is missing and
/// `ApiError::Validation` when it is not a UUID.
pub fn current_user(headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Forbidden(format!("missing {USER_ID_HEADER} header")))?;

    let user_id = raw
        .parse::<UserId>()
        .map_err(|_| ApiError::Validation(format!("{USER_ID_HEADER} must be a UUID")))?;

    let role = match headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some("admin") => Role::Admin,
        _ => Role::Student,
    };

    Ok(CurrentUser { user_id, role })
}

/// As `current_user`, but refuses non-admin callers.
///
/// # Errors
///
/// Returns `ApiError::Forbidden` for missing identity or a student role.
pub fn require_admin(headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let user = current_user(headers)?;
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "this endpoint requires the admin role".to_string(),
        ));
    }
    Ok(user)
}
