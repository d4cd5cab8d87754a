//! User directory: self-service profile edits and admin management.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{User, UserPatch};
use crate::store::Store;
use crate::{EcommerceError, Result};

/// Body of `PATCH /users/me`. Password fields are accepted only so they can be refused.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[serde(flatten)]
    pub patch: UserPatch,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn update_me(&self, user: &User, req: UpdateMeRequest) -> Result<User> {
        if req.password.is_some() || req.password_confirm.is_some() {
            return Err(EcommerceError::bad_request(
                "This route is not for password updates. Please use /updateMyPassword.",
            ));
        }
        let patch = req.patch;
        self.store
            .update_user(user.id, Box::new(move |user: &mut User| -> Result<()> {
                user.apply_patch(patch, false, Utc::now());
                Ok(())
            }))
            .await
    }

    pub async fn deactivate(&self, user: &User) -> Result<()> {
        self.store
            .update_user(user.id, Box::new(|user: &mut User| -> Result<()> {
                user.deactivate(Utc::now());
                Ok(())
            }))
            .await?;
        info!(user_id = %user.id, "Account deactivated");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.store.find_user(id).await?.ok_or_else(|| EcommerceError::not_found("No user found with that ID"))
    }

    /// Admin edit; may change the role.
    pub async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User> {
        self.store
            .update_user(id, Box::new(move |user: &mut User| -> Result<()> {
                user.apply_patch(patch, true, Utc::now());
                Ok(())
            }))
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_user(id).await? {
            return Err(EcommerceError::not_found("No user found with that ID"));
        }
        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
