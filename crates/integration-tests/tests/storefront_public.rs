//! Public storefront pages and the distributor API.
//!
//! Requires the storefront running against a migrated database with at
//! least one public socio (`df-cli seed socios`).

use delicias_core::{Coordinates, catalog, format_clp};
use delicias_integration_tests::{client, storefront_url};
use reqwest::{StatusCode, header};
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_health_and_readiness() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to get /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to get /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_catalog_lists_every_tier_price() {
    let resp = client()
        .get(format!("{}/productos", storefront_url()))
        .send()
        .await
        .expect("Failed to get catalog");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");

    for product in catalog() {
        assert!(body.contains(product.name), "missing {}", product.name);
        for tier in product.tiers {
            let price = format_clp(tier.unit_price());
            assert!(body.contains(&price), "missing {price} for {}", product.sku);
        }
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_map_page_allows_openstreetmap_tiles() {
    let resp = client()
        .get(format!("{}/distribuidores", storefront_url()))
        .send()
        .await
        .expect("Failed to get map page");
    assert_eq!(resp.status(), StatusCode::OK);

    let csp = resp
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .and_then(|v| v.to_str().ok())
        .expect("missing CSP")
        .to_string();
    assert!(csp.contains("tile.openstreetmap.org"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_distributor_list_only_has_placed_socios() {
    let resp = client()
        .get(format!("{}/api/distribuidores", storefront_url()))
        .send()
        .await
        .expect("Failed to get distributors");
    assert_eq!(resp.status(), StatusCode::OK);

    let socios: Vec<Value> = resp.json().await.expect("Invalid JSON");
    assert!(!socios.is_empty(), "seed at least one public socio");
    for socio in &socios {
        assert!(socio["name"].is_string());
        assert!(socio["latitude"].is_f64());
        assert!(socio["longitude"].is_f64());
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_nearby_is_sorted_and_limited() {
    // Plaza de Armas, Santiago
    let origin = Coordinates::new(-33.4378, -70.6505).expect("valid origin");
    let resp = client()
        .get(format!(
            "{}/api/distribuidores/cercanos?lat={}&lng={}&limit=2",
            storefront_url(),
            origin.latitude(),
            origin.longitude()
        ))
        .send()
        .await
        .expect("Failed to get nearby distributors");
    assert_eq!(resp.status(), StatusCode::OK);

    let nearby: Vec<Value> = resp.json().await.expect("Invalid JSON");
    assert!(nearby.len() <= 2);

    let distances: Vec<f64> = nearby
        .iter()
        .map(|s| s["distance_km"].as_f64().expect("distance_km"))
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));

    for socio in &nearby {
        let at = Coordinates::new(
            socio["latitude"].as_f64().expect("latitude"),
            socio["longitude"].as_f64().expect("longitude"),
        )
        .expect("valid socio location");
        let reported = socio["distance_km"].as_f64().expect("distance_km");
        assert!((origin.distance_km(&at) - reported).abs() <= 0.05 + 1e-9);
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_nearby_rejects_bad_coordinates() {
    let client = client();
    let base_url = storefront_url();

    for query in ["lat=95&lng=-70", "lat=-33&lng=181", "lat=abc&lng=-70", "lng=-70"] {
        let resp = client
            .get(format!("{base_url}/api/distribuidores/cercanos?{query}"))
            .send()
            .await
            .expect("Failed to get nearby distributors");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {query}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_wholesale_portal_requires_login() {
    let resp = client()
        .get(format!("{}/mayorista", storefront_url()))
        .send()
        .await
        .expect("Failed to get portal");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()[header::LOCATION].to_str().expect("Location");
    assert!(location.starts_with("/auth/login"));
}
