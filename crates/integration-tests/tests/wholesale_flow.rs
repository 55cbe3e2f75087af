//! The wholesale journey across both binaries: register, wait for
//! approval, order, and see the order confirmed by staff.
//!
//! Requires the storefront, the admin and the database (see the crate docs).

use delicias_core::{Cart, calculate_totals, format_clp};
use delicias_integration_tests::{
    TestBuyer, admin_login, admin_url, client, location, pool, storefront_url,
};
use delicias_storefront::services::AuthService;
use reqwest::{Client, StatusCode};
use sqlx::PgPool;

const SKU: &str = "ALF-MAI-12";
const UNITS: u32 = 12;

async fn get_text(client: &Client, url: String) -> String {
    let resp = client.get(url).send().await.expect("Failed to get page");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.expect("Failed to read response")
}

async fn token_count(pool: &PgPool, email: &str, purpose: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT count(*) FROM tienda.email_token t \
         JOIN tienda.profile p ON p.id = t.profile_id \
         WHERE lower(p.email) = lower($1) AND t.purpose::text = $2",
    )
    .bind(email)
    .bind(purpose)
    .fetch_one(pool)
    .await
    .expect("Failed to count tokens")
}

/// Approve a profile from the back office, returning the redirect target.
async fn approve_profile(admin: &Client, profile_id: i32) -> String {
    let resp = admin
        .post(format!("{}/usuarios/{profile_id}/aprobar", admin_url()))
        .send()
        .await
        .expect("Failed to approve profile");
    location(&resp)
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_registration_then_approval_then_order() {
    let pool = pool().await;
    let buyer = TestBuyer::new();
    let shop = client();
    let admin = client();

    // Register
    let resp = buyer.register(&shop).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains(&buyer.email));

    // Unverified buyers can log in but land on the waiting page
    assert_eq!(buyer.login(&shop).await, "/mayorista");
    let resp = shop
        .get(format!("{}/mayorista", storefront_url()))
        .send()
        .await
        .expect("Failed to get portal");
    assert_eq!(location(&resp), "/mayorista/pendiente");
    let body = get_text(&shop, format!("{}/mayorista/pendiente", storefront_url())).await;
    assert!(body.contains("Confirma tu correo"));

    // Verified and approved
    let profile_id = buyer.mark_verified(&pool).await;
    admin_login(&admin).await;
    let target = approve_profile(&admin, profile_id).await;
    assert!(
        target == "/usuarios?aviso=aprobado" || target == "/usuarios?error=correo",
        "unexpected redirect {target}"
    );

    // Approval is read on every request, so the same session now gets in
    let body = get_text(&shop, format!("{}/mayorista", storefront_url())).await;
    assert!(body.contains(&buyer.business_name));

    // Cart and checkout
    let resp = shop
        .post(format!("{}/mayorista/carrito/agregar", storefront_url()))
        .form(&[("sku", SKU), ("quantity", &UNITS.to_string())])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(location(&resp), "/mayorista#carrito");

    let resp = shop
        .post(format!("{}/mayorista/checkout", storefront_url()))
        .form(&[("notes", "Entregar antes de las 10:00")])
        .send()
        .await
        .expect("Failed to place order");
    let detail = location(&resp);
    assert!(detail.starts_with("/mayorista/pedidos/"));
    assert!(detail.ends_with("?nuevo=1"));

    let mut cart = Cart::new();
    cart.add(SKU, UNITS).expect("valid line");
    let expected = calculate_totals(&cart).expect("priced cart");

    let body = get_text(&shop, format!("{}{detail}", storefront_url())).await;
    assert!(body.contains("Pendiente"));
    assert!(body.contains(&format_clp(expected.subtotal)));
    assert!(body.contains(&format_clp(expected.total)));
    assert!(body.contains("Entregar antes de las 10:00"));

    // Staff confirm the order; skipping straight to delivered is refused
    let order_id = detail
        .trim_start_matches("/mayorista/pedidos/")
        .trim_end_matches("?nuevo=1")
        .to_string();
    let resp = admin
        .post(format!("{}/pedidos/{order_id}/estado", admin_url()))
        .form(&[("estado", "delivered")])
        .send()
        .await
        .expect("Failed to post status");
    assert_eq!(
        location(&resp),
        format!("/pedidos/{order_id}?error=transicion")
    );

    let resp = admin
        .post(format!("{}/pedidos/{order_id}/estado", admin_url()))
        .form(&[("estado", "confirmed")])
        .send()
        .await
        .expect("Failed to confirm order");
    let target = location(&resp);
    assert!(
        target.ends_with("aviso=estado") || target.ends_with("error=correo"),
        "unexpected redirect {target}"
    );

    let body = get_text(&shop, format!("{}/mayorista/pedidos/{order_id}", storefront_url())).await;
    assert!(body.contains("Confirmado"));

    // The cart was emptied by checkout
    let resp = shop
        .get(format!("{}/mayorista/checkout", storefront_url()))
        .send()
        .await
        .expect("Failed to get checkout");
    assert_eq!(location(&resp), "/mayorista?error=vacio");
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_below_minimum_cannot_check_out() {
    let pool = pool().await;
    let buyer = TestBuyer::new();
    let shop = client();
    let admin = client();

    buyer.register(&shop).await;
    let profile_id = buyer.mark_verified(&pool).await;
    admin_login(&admin).await;
    approve_profile(&admin, profile_id).await;
    buyer.login(&shop).await;

    shop.post(format!("{}/mayorista/carrito/agregar", storefront_url()))
        .form(&[("sku", SKU), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to cart");

    let resp = shop
        .post(format!("{}/mayorista/checkout", storefront_url()))
        .form(&[("notes", "")])
        .send()
        .await
        .expect("Failed to post checkout");
    assert!(location(&resp).starts_with("/mayorista/checkout?error="));
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_orders_of_other_buyers_are_not_found() {
    let pool = pool().await;
    let owner = TestBuyer::new();
    let other = TestBuyer::new();
    let owner_client = client();
    let other_client = client();
    let admin = client();
    admin_login(&admin).await;

    for (buyer, shop) in [(&owner, &owner_client), (&other, &other_client)] {
        buyer.register(shop).await;
        let id = buyer.mark_verified(&pool).await;
        approve_profile(&admin, id).await;
        buyer.login(shop).await;
    }

    owner_client
        .post(format!("{}/mayorista/carrito/agregar", storefront_url()))
        .form(&[("sku", SKU), ("quantity", "6")])
        .send()
        .await
        .expect("Failed to add to cart");
    let resp = owner_client
        .post(format!("{}/mayorista/checkout", storefront_url()))
        .form(&[("notes", "")])
        .send()
        .await
        .expect("Failed to place order");
    let detail = location(&resp);
    let detail = detail.trim_end_matches("?nuevo=1");

    let resp = other_client
        .get(format!("{}{detail}", storefront_url()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running servers and database"]
async fn test_rejected_buyer_sees_rejection() {
    let pool = pool().await;
    let buyer = TestBuyer::new();
    let shop = client();
    let admin = client();

    buyer.register(&shop).await;
    let profile_id = buyer.mark_verified(&pool).await;
    admin_login(&admin).await;
    let resp = admin
        .post(format!("{}/usuarios/{profile_id}/rechazar", admin_url()))
        .send()
        .await
        .expect("Failed to reject profile");
    let target = location(&resp);
    assert!(target == "/usuarios?aviso=rechazado" || target == "/usuarios?error=correo");

    buyer.login(&shop).await;
    let body = get_text(&shop, format!("{}/mayorista/pendiente", storefront_url())).await;
    assert!(body.contains("no fue aprobada"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_duplicate_registration_is_refused() {
    let buyer = TestBuyer::new();
    let resp = buyer.register(&client()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = buyer.register(&client()).await;
    let body = resp.text().await.expect("Failed to read response");
    assert!(!body.contains("Revisa tu correo"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unverified_buyer_can_request_new_link() {
    let pool = pool().await;
    let buyer = TestBuyer::new();
    let shop = client();

    buyer.register(&shop).await;
    buyer.login(&shop).await;
    let body = get_text(&shop, format!("{}/mayorista/pendiente", storefront_url())).await;
    assert!(body.contains("/auth/verificar/reenviar"));

    for _ in 0..2 {
        let resp = shop
            .post(format!("{}/auth/verificar/reenviar", storefront_url()))
            .send()
            .await
            .expect("Failed to resend link");
        let target = location(&resp);
        assert!(
            target == "/mayorista/pendiente?aviso=reenviado"
                || target == "/mayorista/pendiente?aviso=error_correo",
            "unexpected redirect {target}"
        );
    }

    // Each issue replaces the previous link instead of piling up rows
    assert_eq!(token_count(&pool, &buyer.email, "verify_email").await, 1);

    // Verified buyers are sent on instead of getting another link
    buyer.mark_verified(&pool).await;
    let resp = shop
        .post(format!("{}/auth/verificar/reenviar", storefront_url()))
        .send()
        .await
        .expect("Failed to resend link");
    assert_eq!(location(&resp), "/mayorista");
    assert_eq!(token_count(&pool, &buyer.email, "verify_email").await, 1);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_password_reset_confirms_email() {
    let pool = pool().await;
    let buyer = TestBuyer::new();
    buyer.register(&client()).await;

    let auth = AuthService::new(&pool);
    let (_, first) = auth
        .request_password_reset(&buyer.email)
        .await
        .expect("Failed to request reset")
        .expect("Registered buyer should get a reset link");
    let (_, token) = auth
        .request_password_reset(&buyer.email)
        .await
        .expect("Failed to request reset")
        .expect("Registered buyer should get a reset link");
    assert_eq!(token_count(&pool, &buyer.email, "password_reset").await, 1);
    assert!(!auth.is_reset_token_live(&first).await.expect("Failed to check token"));

    auth.reset_password(&token, "otra-clave-segura-9")
        .await
        .expect("Failed to reset password");

    let verified = sqlx::query_scalar::<_, bool>(
        "SELECT email_verified FROM tienda.profile WHERE lower(email) = lower($1)",
    )
    .bind(&buyer.email)
    .fetch_one(&pool)
    .await
    .expect("Failed to load profile");
    assert!(verified);
}
