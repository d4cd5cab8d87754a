//! User Aggregate

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::value_objects::Email;

/// Lifetime of a password-reset token.
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 10;
/// Lifetime of an email-verification token.
pub const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { #[default] User, Admin }

impl Role {
    pub fn as_str(&self) -> &'static str { match self { Role::User => "user", Role::Admin => "admin" } }
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s { "user" => Ok(Role::User), "admin" => Ok(Role::Admin), other => Err(format!("unknown role `{other}`")) }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailVerification { #[default] Pending, Verified }

impl EmailVerification {
    pub fn as_str(&self) -> &'static str { match self { Self::Pending => "pending", Self::Verified => "verified" } }
}

impl FromStr for EmailVerification {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s { "pending" => Ok(Self::Pending), "verified" => Ok(Self::Verified), other => Err(format!("unknown verification state `{other}`")) }
    }
}

/// An account. Secrets and token hashes never leave the process in JSON.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: Email,
    pub phone_number: String,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub email_verified: EmailVerification,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub password_reset_token: Option<String>,
    #[serde(skip)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub email_verification_token: Option<String>,
    #[serde(skip)]
    pub email_verification_expires_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input after validation; the password is already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub full_name: String,
    pub email: Email,
    pub phone_number: String,
    pub address: Option<String>,
    pub password_hash: String,
}

/// Profile fields a user (or an admin) may change. `role` is ignored unless the caller is an admin.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
}

impl User {
    pub fn register(new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(), full_name: new.full_name, email: new.email, phone_number: new.phone_number,
            address: new.address, avatar: None, role: Role::User, email_verified: EmailVerification::Pending,
            password_hash: new.password_hash, password_changed_at: None, password_reset_token: None,
            password_reset_expires_at: None, email_verification_token: None, email_verification_expires_at: None,
            active: true, created_at: now, updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// True when the password changed after a token issued at `issued_at` (unix seconds).
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        match self.password_changed_at {
            Some(changed) => issued_at < changed.timestamp(),
            None => false,
        }
    }

    /// Replaces the password hash and invalidates every token issued before now.
    pub fn set_password(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        // Backdated so a token signed in the same second stays valid.
        self.password_changed_at = Some(now - Duration::seconds(1));
        self.password_reset_token = None;
        self.password_reset_expires_at = None;
        self.touch(now);
    }

    /// Stores the hash of a reset token; the plain token goes out for delivery.
    pub fn set_password_reset_token(&mut self, token_hash: String, now: DateTime<Utc>) {
        self.password_reset_token = Some(token_hash);
        self.password_reset_expires_at = Some(now + Duration::minutes(PASSWORD_RESET_TTL_MINUTES));
    }

    pub fn has_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> bool {
        self.password_reset_token.as_deref() == Some(token_hash) && self.password_reset_expires_at.is_some_and(|exp| exp > now)
    }

    pub fn clear_password_reset_token(&mut self) {
        self.password_reset_token = None;
        self.password_reset_expires_at = None;
    }

    pub fn create_email_verification_token(&mut self, now: DateTime<Utc>) -> String {
        let (token, token_hash) = one_time_token();
        self.email_verification_token = Some(token_hash);
        self.email_verification_expires_at = Some(now + Duration::hours(EMAIL_VERIFICATION_TTL_HOURS));
        token
    }

    pub fn has_verification_token(&self, token_hash: &str, now: DateTime<Utc>) -> bool {
        self.email_verification_token.as_deref() == Some(token_hash)
            && self.email_verification_expires_at.is_some_and(|exp| exp > now)
    }

    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) {
        self.email_verified = EmailVerification::Verified;
        self.email_verification_token = None;
        self.email_verification_expires_at = None;
        self.touch(now);
    }

    pub fn apply_patch(&mut self, patch: UserPatch, allow_role_change: bool, now: DateTime<Utc>) {
        if let Some(v) = patch.full_name { self.full_name = v; }
        if let Some(v) = patch.email { self.email = v; }
        if let Some(v) = patch.address { self.address = Some(v); }
        if let Some(v) = patch.phone_number { self.phone_number = v; }
        if let Some(v) = patch.avatar { self.avatar = Some(v); }
        if allow_role_change { if let Some(v) = patch.role { self.role = v; } }
        self.touch(now);
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) { self.active = false; self.touch(now); }

    fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = now; }
}

/// SHA-256 hex digest used to store one-time tokens.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A random token and its stored hash, as `(plain, hash)`.
pub fn one_time_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let token_hash = hash_token(&token);
    (token, token_hash)
}
