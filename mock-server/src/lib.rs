//! In-process stand-in for the demo store API.
//!
//! Implements the endpoints the storefront client consumes, with a seeded
//! catalog and one seeded user. Tokens issued by login or registration are
//! remembered and required by `GET /users/{id}`.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const SEED_USERNAME: &str = "johnd";
pub const SEED_PASSWORD: &str = "m38rmF$";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Name {
    pub firstname: String,
    pub lastname: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub number: i64,
    pub zipcode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password: String,
    pub name: Name,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: Name,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Registered {
    pub id: i64,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug)]
pub struct Store {
    pub products: Vec<Product>,
    pub users: Vec<User>,
    pub tokens: HashSet<String>,
}

pub type Db = Arc<RwLock<Store>>;

fn product(id: i64, title: &str, price: f64, category: &str, rate: f64, count: u64) -> Product {
    Product {
        id,
        title: title.to_string(),
        price,
        description: format!("{title} from the demo catalog."),
        category: category.to_string(),
        image: format!("https://fakestoreapi.com/img/{id}.jpg"),
        rating: Rating { rate, count },
    }
}

impl Store {
    pub fn seeded() -> Self {
        Self {
            products: vec![
                product(1, "Fjallraven Foldsack No. 1 Backpack", 109.95, "men's clothing", 3.9, 120),
                product(2, "Mens Casual Premium Slim Fit T-Shirts", 22.3, "men's clothing", 4.1, 259),
                product(5, "John Hardy Women's Legends Naga Bracelet", 695.0, "jewelery", 4.6, 400),
                product(6, "Solid Gold Petite Micropave", 168.0, "jewelery", 3.9, 70),
                product(9, "WD 2TB Elements Portable External Hard Drive", 64.0, "electronics", 3.3, 203),
                product(10, "SanDisk SSD PLUS 1TB Internal SSD", 109.0, "electronics", 2.9, 470),
                product(15, "BIYLACLESEN Women's 3-in-1 Snowboard Jacket", 56.99, "women's clothing", 2.6, 235),
            ],
            users: vec![User {
                id: 1,
                email: "john@gmail.com".to_string(),
                username: SEED_USERNAME.to_string(),
                password: SEED_PASSWORD.to_string(),
                name: Name {
                    firstname: "john".to_string(),
                    lastname: "doe".to_string(),
                },
                phone: "1-570-236-7033".to_string(),
                address: Some(Address {
                    city: "kilcoole".to_string(),
                    street: "new road".to_string(),
                    number: 7682,
                    zipcode: "12926-3874".to_string(),
                }),
            }],
            tokens: HashSet::new(),
        }
    }

    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for p in &self.products {
            if !categories.contains(&p.category) {
                categories.push(p.category.clone());
            }
        }
        categories
    }

    fn issue_token(&mut self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone());
        token
    }
}

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/auth/login", post(login))
        .route("/users", post(register))
        .route("/users/{id}", get(get_user))
        .route("/products", get(list_products))
        .route("/products/categories", get(list_categories))
        .route("/products/category/{category}", get(products_in_category))
        .route("/products/{id}", get(get_product))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock store API listening");
    }
    axum::serve(listener, app()).await
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Response {
    let mut store = db.write().await;
    let known = store
        .users
        .iter()
        .any(|u| u.username == input.username && u.password == input.password);
    if !known {
        debug!(username = %input.username, "rejected login");
        return (StatusCode::UNAUTHORIZED, "username or password is incorrect").into_response();
    }
    let token = store.issue_token();
    Json(TokenBody { token }).into_response()
}

async fn register(State(db): State<Db>, Json(input): Json<NewUser>) -> (StatusCode, Json<Registered>) {
    let mut store = db.write().await;
    let id = store.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
    store.users.push(User {
        id,
        email: input.email,
        username: input.username,
        password: input.password,
        name: input.name,
        phone: input.phone,
        address: None,
    });
    let token = store.issue_token();
    (StatusCode::CREATED, Json(Registered { id, token }))
}

async fn get_user(State(db): State<Db>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    let store = db.read().await;
    match bearer(&headers) {
        Some(token) if store.tokens.contains(token) => {}
        _ => return (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
    }
    match store.users.iter().find(|u| u.id == id) {
        Some(user) => Json(user.clone()).into_response(),
        None => not_found("user not found"),
    }
}

async fn list_products(State(db): State<Db>) -> Json<Vec<Product>> {
    Json(db.read().await.products.clone())
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<String>> {
    Json(db.read().await.categories())
}

async fn products_in_category(
    State(db): State<Db>,
    Path(category): Path<String>,
) -> Json<Vec<Product>> {
    let store = db.read().await;
    Json(
        store
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect(),
    )
}

async fn get_product(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let store = db.read().await;
    match store.products.iter().find(|p| p.id == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => not_found("product not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_categories_are_distinct_in_catalog_order() {
        let store = Store::seeded();
        assert_eq!(
            store.categories(),
            vec!["men's clothing", "jewelery", "electronics", "women's clothing"]
        );
    }

    #[test]
    fn issued_tokens_are_remembered() {
        let mut store = Store::seeded();
        let a = store.issue_token();
        let b = store.issue_token();
        assert_ne!(a, b);
        assert!(store.tokens.contains(&a));
        assert!(store.tokens.contains(&b));
    }

    #[test]
    fn user_serializes_without_missing_address() {
        let mut user = Store::seeded().users.remove(0);
        user.address = None;
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("address").is_none());
        assert_eq!(json["name"]["firstname"], "john");
    }

    #[test]
    fn bearer_requires_scheme_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer(&headers), Some("abc"));
    }
}
