//! Authentication: password hashing, JWT issuance and validation, reset and
//! verification tokens.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::domain::aggregates::{hash_token, one_time_token, NewUser, Role, User};
use crate::domain::events::{DomainEvent, UserEvent};
use crate::domain::value_objects::Email;
use crate::publisher::EventPublisher;
use crate::store::Store;
use crate::{EcommerceError, Result};

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// A user together with a freshly signed token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Please tell us your name"))]
    pub full_name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide your phone number"))]
    pub phone_number: String,
    pub address: Option<String>,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords are not the same"))]
    pub password_confirm: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords are not the same"))]
    pub password_confirm: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Please provide your current password"))]
    pub password_current: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords are not the same"))]
    pub password_confirm: String,
}

/// Fails with `Forbidden` unless the user holds one of `roles`.
pub fn restrict_to(user: &User, roles: &[Role]) -> Result<()> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(EcommerceError::forbidden("You do not have permission to perform this action"))
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| EcommerceError::internal(e.to_string()))?
        .map_err(|e| EcommerceError::internal(format!("password hashing failed: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| EcommerceError::internal(e.to_string()))?;
    Ok(verified.unwrap_or(false))
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    publisher: Arc<dyn EventPublisher>,
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn EventPublisher>, config: Arc<Config>) -> Self {
        Self { store, publisher, config }
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            iat: now.timestamp(),
            exp: (now + Duration::days(self.config.jwt_expires_in_days)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()))
            .map_err(|e| EcommerceError::internal(format!("token signing failed: {e}")))
    }

    /// Resolves a bearer token to its (still active) user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => EcommerceError::unauthorized("Your token has expired! Please log in again."),
            _ => EcommerceError::unauthorized("Invalid token. Please log in again!"),
        })?;
        let claims = data.claims;

        let user = self
            .store
            .find_user(claims.id)
            .await?
            .ok_or_else(|| EcommerceError::unauthorized("The user belonging to this token no longer exists."))?;

        if user.changed_password_after(claims.iat) {
            return Err(EcommerceError::unauthorized("User recently changed password! Please log in again."));
        }
        Ok(user)
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<Session> {
        req.validate()?;
        let email = Email::parse(&req.email)?;
        let password_hash = hash_password(req.password, self.config.bcrypt_cost).await?;

        let now = Utc::now();
        let mut user = User::register(
            NewUser {
                full_name: req.full_name.trim().to_string(),
                email,
                phone_number: req.phone_number.trim().to_string(),
                address: req.address.filter(|a| !a.trim().is_empty()),
                password_hash,
            },
            now,
        );
        let verification_token = user.create_email_verification_token(now);
        self.store.insert_user(&user).await?;
        info!(user_id = %user.id, "User signed up");

        let event = DomainEvent::User(UserEvent::Registered {
            user_id: user.id,
            email: user.email.to_string(),
            verification_url: self.link("verify-email", &verification_token),
        });
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(user_id = %user.id, error = %e, "Verification link not delivered");
        }

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        let (email, password) = match (req.email, req.password) {
            (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
            _ => return Err(EcommerceError::bad_request("Please provide email and password!")),
        };
        let incorrect = || EcommerceError::unauthorized("Incorrect email or password");

        let email = Email::parse(&email).map_err(|_| incorrect())?;
        let user = self.store.find_user_by_email(&email).await?.ok_or_else(incorrect)?;
        if !verify_password(password, user.password_hash.clone()).await? {
            return Err(incorrect());
        }

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    /// Stores a hashed reset token and hands the plain one to the publisher.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let not_found = || EcommerceError::not_found("There is no user with that email address.");
        let email = Email::parse(email).map_err(|_| not_found())?;
        let user = self.store.find_user_by_email(&email).await?.ok_or_else(not_found)?;

        let (token, token_hash) = one_time_token();
        let now = Utc::now();
        let user = self
            .store
            .update_user(user.id, Box::new(move |user: &mut User| -> Result<()> {
                user.set_password_reset_token(token_hash, now);
                Ok(())
            }))
            .await?;

        let event = DomainEvent::User(UserEvent::PasswordResetRequested {
            user_id: user.id,
            email: user.email.to_string(),
            reset_url: self.link("reset-password", &token),
        });
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(user_id = %user.id, error = %e, "Reset link not delivered, clearing token");
            self.store
                .update_user(user.id, Box::new(|user: &mut User| -> Result<()> {
                    user.clear_password_reset_token();
                    Ok(())
                }))
                .await?;
            return Err(EcommerceError::internal("There was an error sending the email. Try again later!"));
        }
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, req: ResetPasswordRequest) -> Result<Session> {
        let invalid = || EcommerceError::bad_request("Token is invalid or has expired");
        let now = Utc::now();
        let token_hash = hash_token(token);
        let found = self.store.find_user_by_reset_token(&token_hash, now).await?.ok_or_else(invalid)?;
        req.validate()?;

        let hash = hash_password(req.password, self.config.bcrypt_cost).await?;
        // Re-checked under the row lock so a token is spent at most once.
        let user = self
            .store
            .update_user(found.id, Box::new(move |user: &mut User| -> Result<()> {
                if !user.has_reset_token(&token_hash, now) {
                    return Err(invalid());
                }
                user.set_password(hash, now);
                Ok(())
            }))
            .await?;
        info!(user_id = %user.id, "Password reset");

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    pub async fn update_password(&self, user: &User, req: UpdatePasswordRequest) -> Result<Session> {
        req.validate()?;
        let wrong = || EcommerceError::unauthorized("Your current password is wrong.");
        let current = self.store.find_user(user.id).await?.ok_or_else(wrong)?;
        if !verify_password(req.password_current, current.password_hash.clone()).await? {
            return Err(wrong());
        }

        let hash = hash_password(req.password, self.config.bcrypt_cost).await?;
        let verified_hash = current.password_hash;
        let user = self
            .store
            .update_user(user.id, Box::new(move |user: &mut User| -> Result<()> {
                if user.password_hash != verified_hash {
                    return Err(wrong());
                }
                user.set_password(hash, Utc::now());
                Ok(())
            }))
            .await?;

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    pub async fn verify_email(&self, token: &str) -> Result<User> {
        let invalid = || EcommerceError::bad_request("Token is invalid or has expired");
        let now = Utc::now();
        let token_hash = hash_token(token);
        let found = self.store.find_user_by_verification_token(&token_hash, now).await?.ok_or_else(invalid)?;
        self.store
            .update_user(found.id, Box::new(move |user: &mut User| -> Result<()> {
                if !user.has_verification_token(&token_hash, now) {
                    return Err(invalid());
                }
                user.mark_email_verified(now);
                Ok(())
            }))
            .await
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}/{path}/{token}", self.config.frontend_url.trim_end_matches('/'))
    }
}
