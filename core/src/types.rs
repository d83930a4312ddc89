//! Domain DTOs for the store API.
//!
//! # Design
//! Field names follow the remote JSON (camelCase where it differs from Rust
//! naming). Unknown fields in responses are ignored, so extra profile data
//! the server returns (password hashes, geolocation) never reaches the
//! session snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserName {
    pub firstname: String,
    pub lastname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub number: i64,
    pub zipcode: String,
}

/// Profile of the signed-in user. Replaced wholesale on login/register.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub name: UserName,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterCredentials {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: UserName,
    pub phone: String,
}

/// Body of a successful `POST /auth/login` or `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

/// A catalog entry, either fetched from the API or created on-device.
///
/// Local products carry `is_local = Some(true)` and a negative id; remote
/// products carry a positive id and no `isLocal` field at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    /// Remote URL, or a `data:` URI for images picked on-device.
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_local: Option<bool>,
}

impl Product {
    pub fn is_local(&self) -> bool {
        self.is_local.unwrap_or(false)
    }

    /// Case-insensitive exact match on the category name.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.to_lowercase() == category.to_lowercase()
    }
}

/// Form payload for a product created on-device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateProductDto {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
}

impl CreateProductDto {
    pub(crate) fn into_local_product(self, id: i64) -> Product {
        Product {
            id,
            title: self.title,
            price: self.price,
            description: self.description,
            category: self.category,
            image: self.image,
            rating: Rating::default(),
            is_local: Some(true),
        }
    }
}
