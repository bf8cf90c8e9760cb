//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

/// Prices are stored as NUMERIC(12,2).
pub const MAX_PRICE_SCALE: u32 = 2;
pub const MAX_PRICE_EXCLUSIVE: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Non-negative price value object, at most two decimal places and below 10^10
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative); }
        let amount = amount.normalize();
        if amount.scale() > MAX_PRICE_SCALE { return Err(PriceError::TooPrecise); }
        if amount >= MAX_PRICE_EXCLUSIVE { return Err(PriceError::TooLarge); }
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
    /// `None` when the product does not fit in a `Decimal`.
    pub fn multiply(&self, qty: u32) -> Option<Decimal> { self.0.checked_mul(Decimal::from(qty)) }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self { price.0 }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must not be negative")]
    Negative,
    #[error("price must have at most two decimal places")]
    TooPrecise,
    #[error("price must be below 10000000000")]
    TooLarge,
}

/// Stock counter value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> { self.0.checked_sub(other).map(Self) }
}

/// Shipping address. Country, city and street are mandatory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1, message = "Country is required"))]
    #[serde(default)]
    pub country: String,
    #[validate(length(min = 1, message = "City is required"))]
    #[serde(default)]
    pub city: String,
    #[validate(length(min = 1, message = "Street is required"))]
    #[serde(default)]
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ShippingAddress {
    pub fn new(country: impl Into<String>, city: impl Into<String>, street: impl Into<String>) -> Self {
        Self { country: country.into(), city: city.into(), street: street.into(), details: None }
    }

    /// The first mandatory field that is blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [("country", &self.country), ("city", &self.city), ("street", &self.street)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }

    pub fn is_complete(&self) -> bool { self.missing_field().is_none() }
}

/// Normalized (trimmed, lowercased) email address
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(value: &str) -> Result<Self, EmailError> {
        let value = value.trim().to_lowercase();
        if value.is_empty() { return Err(EmailError::Empty); }
        if !validator::validate_email(value.as_str()) { return Err(EmailError::Invalid(value)); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("email is empty")]
    Empty,
    #[error("invalid email: {0}")]
    Invalid(String),
}

/// Account role; the only authorization signal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::User => "user", Self::Admin => "admin" }
    }
    pub fn parse(value: &str) -> Option<Self> {
        match value { "user" => Some(Self::User), "admin" => Some(Self::Admin), _ => None }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
        assert_eq!(Price::new(Decimal::new(1999, 2)).unwrap().multiply(3), Some(Decimal::new(5997, 2)));
    }

    #[test]
    fn test_price_fits_numeric_column() {
        assert_eq!(MAX_PRICE_EXCLUSIVE, Decimal::from(10_000_000_000i64));
        assert_eq!(Price::new(Decimal::from_i128_with_scale(10i128.pow(20), 0)), Err(PriceError::TooLarge));
        assert_eq!(Price::new(Decimal::from(10_000_000_000i64)), Err(PriceError::TooLarge));
        assert_eq!(Price::new(Decimal::new(1999, 3)), Err(PriceError::TooPrecise));
        assert_eq!(Price::new(Decimal::new(19990, 3)).unwrap().amount(), Decimal::new(1999, 2));
        let max = Price::new(Decimal::new(999_999_999_999, 2)).unwrap();
        assert_eq!(max.multiply(u32::MAX), Some(Decimal::new(999_999_999_999, 2) * Decimal::from(u32::MAX)));
    }

    #[test]
    fn test_quantity() {
        let q = Quantity::new(5);
        assert_eq!(q.subtract(5).unwrap().value(), 0);
        assert!(q.subtract(6).is_none());
        assert_eq!(Quantity::new(u32::MAX).add(1).value(), u32::MAX);
    }

    #[test]
    fn test_address_missing_field() {
        let mut address = ShippingAddress::new("Lebanon", "Beirut", "Hamra");
        assert!(address.is_complete());
        address.city = "  ".into();
        assert_eq!(address.missing_field(), Some("city"));
    }

    #[test]
    fn test_email_normalized() {
        assert_eq!(Email::parse("  Shop@Example.COM ").unwrap().as_str(), "shop@example.com");
        assert!(Email::parse("not-an-email").is_err());
    }
}
