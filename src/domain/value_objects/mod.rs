//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// URL-safe product handle derived from the product name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Lowercases, keeps ASCII alphanumerics and joins every other run of characters with `-`.
    pub fn from_name(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut pending_dash = false;
        for ch in name.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() { out.push('-'); }
                pending_dash = false;
                out.push(ch.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        Self(out)
    }
    pub fn from_stored(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Normalized (trimmed, lowercased) email address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(value: &str) -> Result<Self, EmailError> {
        let value = value.trim().to_lowercase();
        if value.is_empty() { return Err(EmailError::Empty); }
        if !validator::validate_email(&value) { return Err(EmailError::Invalid); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Email {
    type Error = EmailError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<Email> for String {
    fn from(email: Email) -> Self { email.0 }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum EmailError { Empty, Invalid }
impl std::error::Error for EmailError {}
impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "Please provide your email"), Self::Invalid => write!(f, "Please enter a valid email") }
    }
}

/// Line-item quantity, never below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }
    pub fn one() -> Self { Self(1) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Zero }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Quantity must be at least 1") }
}

/// Review score between 1 and 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if !(1..=5).contains(&value) { return Err(RatingError::OutOfRange(value)); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;
    fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> Self { r.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum RatingError { OutOfRange(u8) }
impl std::error::Error for RatingError {}
impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::OutOfRange(v) => write!(f, "Rating must be between 1 and 5, got {v}") }
    }
}

/// Garment or shoe size a line item may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "S")] S,
    #[serde(rename = "M")] M,
    #[serde(rename = "L")] L,
    #[serde(rename = "XL")] Xl,
    #[serde(rename = "30")] W30,
    #[serde(rename = "32")] W32,
    #[serde(rename = "34")] W34,
    #[serde(rename = "36")] W36,
    #[serde(rename = "38")] W38,
    #[serde(rename = "40")] W40,
    #[serde(rename = "42")] W42,
    #[serde(rename = "44")] W44,
    #[serde(rename = "45")] W45,
    Small,
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Size; 16] = [
        Size::S, Size::M, Size::L, Size::Xl, Size::W30, Size::W32, Size::W34, Size::W36,
        Size::W38, Size::W40, Size::W42, Size::W44, Size::W45, Size::Small, Size::Medium, Size::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::S => "S", Size::M => "M", Size::L => "L", Size::Xl => "XL",
            Size::W30 => "30", Size::W32 => "32", Size::W34 => "34", Size::W36 => "36",
            Size::W38 => "38", Size::W40 => "40", Size::W42 => "42", Size::W44 => "44", Size::W45 => "45",
            Size::Small => "Small", Size::Medium => "Medium", Size::Large => "Large",
        }
    }
}

impl FromStr for Size {
    type Err = SizeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Size::ALL.into_iter().find(|size| size.as_str() == s).ok_or_else(|| SizeError::Invalid(s.to_string()))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SizeError { Invalid(String) }
impl std::error::Error for SizeError {}
impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Invalid(v) => write!(f, "Invalid size: {v}") }
    }
}
