mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{FailingPublisher, TestApp};
use storefront::domain::events::{DomainEvent, UserEvent};
use storefront::config::Environment;
use storefront::store::UserStore;
use storefront::Config;

#[tokio::test]
async fn health_reports_service_name() {
    let app = TestApp::new();
    let res = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "status": "healthy", "service": "storefront" }));
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new();
    for (method, uri) in [
        (Method::GET, "/api/v1/users/me"),
        (Method::GET, "/api/v1/cart"),
        (Method::POST, "/api/v1/cart/merge"),
        (Method::GET, "/api/v1/order/my-orders"),
        (Method::POST, "/api/v1/order"),
    ] {
        let res = app.call(method, uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(res.body["status"], "fail");
    }

    let res = app.call(Method::GET, "/api/v1/cart", Some("forged.token.value"), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_forbid_regular_users() {
    let app = TestApp::new();
    let (token, _) = app.signup("regular@example.com").await;

    let res = app
        .call(Method::POST, "/api/v1/products", Some(&token), Some(json!({
            "name": "Nope", "description": "d", "price": 1, "category": "c", "imageUrl": "i",
        })))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.call(Method::GET, "/api/v1/order", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.call(Method::GET, "/api/v1/users", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signup_sets_cookie_that_authenticates() {
    let app = TestApp::new();
    let res = app
        .call(
            Method::POST,
            "/api/v1/users/signup",
            None,
            Some(json!({
                "fullName": "Cookie Monster",
                "email": "cookie@example.com",
                "phoneNumber": "0803",
                "password": "password123",
                "passwordConfirm": "password123",
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["user"]["role"], "user");
    assert!(res.body["data"]["user"].get("passwordHash").is_none());

    let set_cookie = res.set_cookie.expect("jwt cookie");
    assert!(set_cookie.starts_with("jwt="));
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let me = app.send(request).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["user"]["email"], "cookie@example.com");
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new();
    let res = app.call(Method::GET, "/api/v1/users/logout", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    let set_cookie = res.set_cookie.expect("logout cookie");
    assert!(set_cookie.starts_with("jwt=loggedout"));

    let request = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, "jwt=loggedout")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.signup("login@example.com").await;

    let res = app
        .call(Method::POST, "/api/v1/users/login", None, Some(json!({ "email": "login@example.com", "password": "wrongpass" })))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Incorrect email or password");

    let res = app.call(Method::POST, "/api/v1/users/login", None, Some(json!({ "email": "login@example.com" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call(Method::POST, "/api/v1/users/login", None, Some(json!({ "email": "login@example.com", "password": "password123" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["token"].is_string());
}

#[tokio::test]
async fn update_me_rejects_password_changes() {
    let app = TestApp::new();
    let (token, _) = app.signup("me@example.com").await;

    let res = app
        .call(Method::PATCH, "/api/v1/users/updateMe", Some(&token), Some(json!({ "password": "newpassword" })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call(Method::PATCH, "/api/v1/users/me", Some(&token), Some(json!({ "fullName": "Renamed", "role": "admin" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["user"]["fullName"], "Renamed");
    assert_eq!(res.body["data"]["user"]["role"], "user");
}

#[tokio::test]
async fn deactivated_account_token_stops_working() {
    let app = TestApp::new();
    let (token, _) = app.signup("leaving@example.com").await;

    let res = app.call(Method::DELETE, "/api/v1/users/deleteMe", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.call(Method::GET, "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forgot_and_reset_password() {
    let app = TestApp::new();
    app.signup("forgetful@example.com").await;

    let res = app
        .call(Method::POST, "/api/v1/users/forgotPassword", None, Some(json!({ "email": "forgetful@example.com" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let reset_url = app
        .events
        .events()
        .into_iter()
        .find_map(|e| match e {
            DomainEvent::User(UserEvent::PasswordResetRequested { reset_url, .. }) => Some(reset_url),
            _ => None,
        })
        .expect("reset event");
    let token = reset_url.rsplit('/').next().unwrap().to_string();

    let res = app
        .call(
            Method::PATCH,
            &format!("/api/v1/users/resetPassword/{token}"),
            None,
            Some(json!({ "password": "brandnew99", "passwordConfirm": "brandnew99" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    // Single use.
    let res = app
        .call(
            Method::PATCH,
            &format!("/api/v1/users/resetPassword/{token}"),
            None,
            Some(json!({ "password": "another999", "passwordConfirm": "another999" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call(Method::POST, "/api/v1/users/login", None, Some(json!({ "email": "forgetful@example.com", "password": "brandnew99" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn failed_reset_delivery_clears_the_token() {
    let app = TestApp::with_publisher(Arc::new(FailingPublisher));
    let (_, id) = app.signup("unlucky@example.com").await;

    let res = app
        .call(Method::POST, "/api/v1/users/forgotPassword", None, Some(json!({ "email": "unlucky@example.com" })))
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["status"], "error");

    let user = app.store.find_user(Uuid::parse_str(&id).unwrap()).await.unwrap().unwrap();
    assert!(user.password_reset_token.is_none());
    assert!(user.password_reset_expires_at.is_none());
}

#[tokio::test]
async fn internal_error_detail_depends_on_each_routers_environment() {
    let dev = TestApp::with_publisher(Arc::new(FailingPublisher));
    let mut config = Config::for_tests();
    config.environment = Environment::Production;
    let prod = TestApp::with_config(Arc::new(FailingPublisher), config);

    for (app, exposed) in [(&prod, false), (&dev, true)] {
        app.signup("unlucky@example.com").await;
        let res = app
            .call(Method::POST, "/api/v1/users/forgotPassword", None, Some(json!({ "email": "unlucky@example.com" })))
            .await;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body["message"], "Something went very wrong!");
        assert_eq!(res.body.get("error").is_some(), exposed);
    }
}

#[tokio::test]
async fn product_lookup_by_slug_and_listing() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    app.product(&admin, "Linen Shirt", 45.0, 0.0, 10).await;
    app.product(&admin, "Wool Coat", 180.0, 150.0, 3).await;
    app.product(&admin, "Silk Scarf", 25.0, 0.0, 8).await;

    let res = app.call(Method::GET, "/api/v1/products/wool-coat", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["product"]["name"], "Wool Coat");
    assert!(res.body["data"]["product"]["reviews"].as_array().unwrap().is_empty());

    let res = app.call(Method::GET, "/api/v1/products?sort=-price&priceLte=100", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["results"], 2);
    let names: Vec<&str> = res.body["data"]["products"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Linen Shirt", "Silk Scarf"]);

    let res = app.call(Method::GET, "/api/v1/products?sort=password", None, None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call(Method::POST, "/api/v1/products", Some(&admin), Some(json!({
            "name": "Bad Discount", "description": "d", "price": 10, "priceDiscount": 12,
            "category": "c", "imageUrl": "i",
        })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_prices_and_stock_are_bounded() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let body = |price: f64, discount: f64, stock: u64| {
        json!({
            "name": "Silk Scarf", "description": "Soft", "price": price, "priceDiscount": discount,
            "category": "accessories", "stockNo": stock, "imageUrl": "scarf.png",
        })
    };

    let res = app.call(Method::POST, "/api/v1/products", Some(&admin), Some(body(10.004, 10.001, 1))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.call(Method::POST, "/api/v1/products", Some(&admin), Some(body(9.999, 0.0, 1))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.call(Method::POST, "/api/v1/products", Some(&admin), Some(body(20.0, 0.0, 3_000_000_000))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.call(Method::POST, "/api/v1/products", Some(&admin), Some(body(19.99, 14.5, 2))).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
}

#[tokio::test]
async fn reviews_drive_product_ratings() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let product = app.product(&admin, "Canvas Sneaker", 60.0, 0.0, 10).await;
    let (alice, _) = app.signup("alice@example.com").await;
    let (bola, _) = app.signup("bola@example.com").await;

    let uri = format!("/api/v1/products/{product}/reviews");
    let res = app.call(Method::POST, &uri, Some(&alice), Some(json!({ "review": "Great", "rating": 5 }))).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = app.call(Method::POST, &uri, Some(&bola), Some(json!({ "review": "Okay", "rating": 2 }))).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let bola_review = res.body["data"]["review"]["id"].as_str().unwrap().to_string();

    let res = app.call(Method::POST, &uri, Some(&alice), Some(json!({ "review": "Again", "rating": 4 }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.call(Method::POST, &uri, Some(&bola), Some(json!({ "review": "Out of range", "rating": 9 }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let detail = app.call(Method::GET, &format!("/api/v1/products/{product}"), None, None).await;
    assert_eq!(detail.body["data"]["product"]["ratingsAverage"], 3.5);
    assert_eq!(detail.body["data"]["product"]["ratingsQuantity"], 2);
    assert_eq!(detail.body["data"]["product"]["reviews"].as_array().unwrap().len(), 2);

    let res = app.call(Method::DELETE, &format!("/api/v1/reviews/{bola_review}"), Some(&alice), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.call(Method::DELETE, &format!("/api/v1/reviews/{bola_review}"), Some(&bola), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let detail = app.call(Method::GET, &format!("/api/v1/products/{product}"), None, None).await;
    assert_eq!(detail.body["data"]["product"]["ratingsAverage"], 5.0);
    assert_eq!(detail.body["data"]["product"]["ratingsQuantity"], 1);
}

#[tokio::test]
async fn cart_accumulates_and_removal_is_idempotent() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let product = app.product(&admin, "Denim Jeans", 70.0, 0.0, 20).await;
    let (token, _) = app.signup("cart@example.com").await;

    let res = app.call(Method::GET, "/api/v1/cart", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["data"]["cart"]["items"].as_array().unwrap().is_empty());

    app.add_to_cart(&token, &product, 2).await;
    let res = app.add_to_cart(&token, &product, 3).await;
    assert_eq!(res.status, StatusCode::OK);
    let items = res.body["data"]["cart"]["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["product"]["name"], "Denim Jeans");
    let item_id = items[0]["id"].as_str().unwrap().to_string();

    let res = app.call(Method::DELETE, &format!("/api/v1/cart/{}", Uuid::now_v7()), Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["cart"]["items"].as_array().unwrap().len(), 1);

    let res = app
        .call(Method::PATCH, &format!("/api/v1/cart/update-size/{item_id}"), Some(&token), Some(json!({ "size": "32" })))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["cart"]["items"][0]["size"], "32");

    let res = app
        .call(Method::PATCH, &format!("/api/v1/cart/update-size/{item_id}"), Some(&token), Some(json!({ "size": "XXL" })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.call(Method::PATCH, &format!("/api/v1/cart/{item_id}"), Some(&token), Some(json!({ "quantity": 0 }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.call(Method::DELETE, &format!("/api/v1/cart/{item_id}"), Some(&token), None).await;
    assert!(res.body["data"]["cart"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn guest_cart_merges_into_user_cart() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let tee = app.product(&admin, "Graphic Tee", 20.0, 0.0, 20).await;
    let cap = app.product(&admin, "Snapback Cap", 15.0, 0.0, 20).await;
    let (token, _) = app.signup("guest@example.com").await;
    app.add_to_cart(&token, &tee, 1).await;

    let res = app
        .call(
            Method::POST,
            "/api/v1/cart/merge",
            Some(&token),
            Some(json!({ "items": [
                { "productId": tee, "quantity": 2 },
                { "productId": cap, "quantity": 1, "size": "M" },
            ]})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let items = res.body["data"]["cart"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[1]["size"], "M");
}

#[tokio::test]
async fn checkout_turns_cart_into_order() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let jacket = app.product(&admin, "Bomber Jacket", 120.0, 100.0, 5).await;
    let socks = app.product(&admin, "Ankle Socks", 5.0, 0.0, 50).await;
    let (token, user_id) = app.signup("buyer@example.com").await;

    let res = app.call(Method::POST, "/api/v1/order", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.call(Method::GET, "/api/v1/order/my-orders", Some(&token), None).await.body["data"]["orders"]
        .as_array()
        .unwrap()
        .is_empty());

    app.add_to_cart(&token, &jacket, 2).await;
    app.add_to_cart(&token, &socks, 4).await;

    let res = app
        .call(Method::POST, "/api/v1/order", Some(&token), Some(json!({ "paymentMethod": "Card" })))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let order = &res.body["data"]["order"];
    assert_eq!(order["totalPrice"].as_f64(), Some(220.0));
    assert_eq!(order["orderStatus"], "pending");
    assert_eq!(order["paymentMethod"], "Card");
    assert_eq!(order["shippingAddress"], "3 Herbert Macaulay Way, Yaba");
    assert_eq!(order["user"], user_id.as_str());
    assert_eq!(order["orderItems"].as_array().unwrap().len(), 2);

    let cart = app.call(Method::GET, "/api/v1/cart", Some(&token), None).await;
    assert!(cart.body["data"]["cart"]["items"].as_array().unwrap().is_empty());
    assert!(app.events.subjects().contains(&"order.placed"));

    // Snapshot is unaffected by later price changes.
    let order_id = order["id"].as_str().unwrap().to_string();
    app.call(Method::PATCH, &format!("/api/v1/products/{jacket}"), Some(&admin), Some(json!({ "price": 999, "priceDiscount": 0 })))
        .await;
    let res = app.call(Method::GET, &format!("/api/v1/order/{order_id}"), Some(&token), None).await;
    assert_eq!(res.body["data"]["order"]["totalPrice"].as_f64(), Some(220.0));
}

#[tokio::test]
async fn checkout_rechecks_stock() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let scarce = app.product(&admin, "Limited Hoodie", 90.0, 0.0, 3).await;
    let (token, _) = app.signup("late@example.com").await;
    app.add_to_cart(&token, &scarce, 3).await;

    app.call(Method::PATCH, &format!("/api/v1/products/{scarce}"), Some(&admin), Some(json!({ "stockNo": 1 }))).await;
    let res = app.call(Method::POST, "/api/v1/order", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let cart = app.call(Method::GET, "/api/v1/cart", Some(&token), None).await;
    assert_eq!(cart.body["data"]["cart"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_with_malformed_details_keeps_the_cart() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let shirt = app.product(&admin, "Linen Shirt", 45.0, 0.0, 5).await;
    let (token, _) = app.signup("careful@example.com").await;
    app.add_to_cart(&token, &shirt, 1).await;

    let res = app
        .call(Method::POST, "/api/v1/order", Some(&token), Some(json!({ "shippingAddress": 42, "paymentMethod": ["card"] })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], "fail");

    let cart = app.call(Method::GET, "/api/v1/cart", Some(&token), None).await;
    assert_eq!(cart.body["data"]["cart"]["items"].as_array().unwrap().len(), 1);
    let orders = app.call(Method::GET, "/api/v1/order/my-orders", Some(&token), None).await;
    assert_eq!(orders.body["results"], 0);
}

async fn place_order(app: &TestApp, token: &str, product: &str) -> String {
    app.add_to_cart(token, product, 1).await;
    let res = app.call(Method::POST, "/api/v1/order", Some(token), None).await;
    res.body["data"]["order"]["id"].as_str().unwrap().to_string()
}

async fn set_status(app: &TestApp, admin: &str, id: &str, status: &str) -> common::Response {
    app.call(Method::PATCH, &format!("/api/v1/order/{id}"), Some(admin), Some(json!({ "orderStatus": status }))).await
}

#[tokio::test]
async fn order_lifecycle_and_cancellation_rules() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let product = app.product(&admin, "Leather Belt", 30.0, 0.0, 10).await;
    let (token, _) = app.signup("owner@example.com").await;
    let (stranger, _) = app.signup("stranger@example.com").await;

    let pending = place_order(&app, &token, &product).await;
    assert_eq!(app.call(Method::GET, &format!("/api/v1/order/{pending}"), Some(&stranger), None).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.call(Method::PATCH, &format!("/api/v1/order/{pending}/cancel"), Some(&stranger), None).await.status, StatusCode::FORBIDDEN);

    let res = app.call(Method::PATCH, &format!("/api/v1/order/{pending}/cancel"), Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["order"]["orderStatus"], "cancelled");
    assert!(res.body["data"]["order"]["cancelledAt"].is_string());

    let shipped = place_order(&app, &token, &product).await;
    assert_eq!(set_status(&app, &admin, &shipped, "delivered").await.status, StatusCode::BAD_REQUEST);
    assert_eq!(set_status(&app, &admin, &shipped, "processing").await.status, StatusCode::OK);
    assert_eq!(set_status(&app, &admin, &shipped, "shipped").await.status, StatusCode::OK);
    let res = app.call(Method::PATCH, &format!("/api/v1/order/{shipped}/cancel"), Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = set_status(&app, &admin, &shipped, "delivered").await;
    assert!(res.body["data"]["order"]["deliveredAt"].is_string());
    let res = app.call(Method::PATCH, &format!("/api/v1/order/{shipped}/cancel"), Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let all = app.call(Method::GET, "/api/v1/order", Some(&admin), None).await;
    assert_eq!(all.body["results"], 2);

    let res = app.call(Method::DELETE, &format!("/api/v1/order/{pending}"), Some(&admin), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.call(Method::GET, &format!("/api/v1/order/{pending}"), Some(&token), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_and_ids_are_bad_requests() {
    let app = TestApp::new();
    let (token, _) = app.signup("sloppy@example.com").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/cart")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], "fail");

    let res = app.call(Method::GET, "/api/v1/order/not-a-uuid", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
