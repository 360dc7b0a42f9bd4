//! Authorization gate.
//!
//! Every inventory operation passes through [`AccessGate::authorize`] before
//! it reads or writes a record. The decision itself is the pure
//! [`evaluate`]; the gate only gathers its inputs from the user directory.

use common::StoreId;
use inventory_store::{User, UserDirectory};
use thiserror::Error;

use crate::error::{ErrorCode, InventoryError};

/// Identity of whoever invoked an operation, as established by the
/// authentication layer in front of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Caller {
    /// No authenticated identity.
    Anonymous,
    /// An authenticated username.
    User(String),
}

impl Caller {
    /// Creates an authenticated caller.
    pub fn user(username: impl Into<String>) -> Self {
        Caller::User(username.into())
    }

    /// Builds a caller from an optional identity; an empty name is anonymous.
    /// Names are passed through unchanged.
    pub fn from_identity(identity: Option<&str>) -> Self {
        match identity {
            Some(name) if !name.is_empty() => Caller::User(name.to_string()),
            _ => Caller::Anonymous,
        }
    }

    /// Returns the username, if authenticated.
    pub fn username(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::User(name) => Some(name),
        }
    }
}

/// What an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Only administrators may proceed.
    AdminOnly,
    /// Access to the given store. `None` when the request did not name one.
    Store(Option<StoreId>),
}

/// Reasons the gate refuses a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User account is disabled: {0}")]
    UserInactive(String),

    #[error("Administrator role required")]
    AdminRequired,

    #[error("User {username} has no access to store {store_id}")]
    StoreAccessDenied { username: String, store_id: StoreId },

    #[error("Store id is required")]
    InvalidRequest,
}

impl AccessDenied {
    /// Returns the stable code for this denial.
    pub fn code(&self) -> ErrorCode {
        match self {
            AccessDenied::NotAuthenticated => ErrorCode::NotAuthenticated,
            AccessDenied::UserNotFound(_) => ErrorCode::UserNotFound,
            AccessDenied::UserInactive(_) => ErrorCode::UserInactive,
            AccessDenied::AdminRequired => ErrorCode::AdminRequired,
            AccessDenied::StoreAccessDenied { .. } => ErrorCode::StoreAccessDenied,
            AccessDenied::InvalidRequest => ErrorCode::InvalidRequest,
        }
    }
}

/// Decides whether `caller` may proceed.
///
/// `user` is the directory entry for the caller's username and `granted`
/// whether that user holds an explicit grant for the required store. Grants
/// are ignored for administrators.
pub fn evaluate(
    caller: &Caller,
    user: Option<&User>,
    requirement: AccessRequirement,
    granted: bool,
) -> Result<(), AccessDenied> {
    let Some(username) = caller.username() else {
        return Err(AccessDenied::NotAuthenticated);
    };
    let Some(user) = user else {
        return Err(AccessDenied::UserNotFound(username.to_string()));
    };
    if !user.active {
        return Err(AccessDenied::UserInactive(user.username.clone()));
    }

    match requirement {
        AccessRequirement::AdminOnly if user.is_admin() => Ok(()),
        AccessRequirement::AdminOnly => Err(AccessDenied::AdminRequired),
        AccessRequirement::Store(None) => Err(AccessDenied::InvalidRequest),
        AccessRequirement::Store(Some(_)) if user.is_admin() => Ok(()),
        AccessRequirement::Store(Some(_)) if granted => Ok(()),
        AccessRequirement::Store(Some(store_id)) => Err(AccessDenied::StoreAccessDenied {
            username: user.username.clone(),
            store_id,
        }),
    }
}

/// Resolves callers against a [`UserDirectory`] and enforces access rules.
#[derive(Debug, Clone)]
pub struct AccessGate<U> {
    users: U,
}

impl<U: UserDirectory> AccessGate<U> {
    /// Creates a gate over the given user directory.
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Checks the caller against the requirement.
    ///
    /// Directory failures surface as [`InventoryError::StorageUnavailable`].
    #[tracing::instrument(skip(self))]
    pub async fn authorize(
        &self,
        caller: &Caller,
        requirement: AccessRequirement,
    ) -> Result<(), InventoryError> {
        let user = match caller.username() {
            Some(username) => self
                .users
                .find_by_username(username)
                .await
                .map_err(InventoryError::StorageUnavailable)?,
            None => None,
        };

        let granted = match (&user, requirement) {
            (Some(user), AccessRequirement::Store(Some(store_id)))
                if user.active && !user.is_admin() =>
            {
                self.users
                    .has_store_permission(&user.username, store_id)
                    .await
                    .map_err(InventoryError::StorageUnavailable)?
            }
            _ => false,
        };

        evaluate(caller, user.as_ref(), requirement, granted).map_err(|denied| {
            metrics::counter!("inventory_access_denied_total").increment(1);
            tracing::warn!(reason = %denied, "inventory access denied");
            InventoryError::from(denied)
        })
    }
}
