//! Distributor map and locator API.
//!
//! The map page renders the listing server-side and Leaflet fetches the same
//! data from `/api/distribuidores` to place markers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
};
use delicias_core::{Coordinates, SocioId, nearest};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::models::Socio;
use crate::state::AppState;

/// Results returned by the nearby lookup when no limit is given.
const DEFAULT_NEARBY_LIMIT: usize = 5;

/// Upper bound for the nearby lookup.
const MAX_NEARBY_LIMIT: usize = 20;

/// A socio as exposed by the public API.
#[derive(Debug, Clone, Serialize)]
pub struct SocioJson {
    pub id: SocioId,
    pub name: String,
    pub address: String,
    pub comuna: String,
    pub region: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl SocioJson {
    /// Public view of a listed socio; `None` without coordinates.
    fn from_socio(socio: &Socio) -> Option<Self> {
        let location = socio.location?;
        Some(Self {
            id: socio.id,
            name: socio.name.clone(),
            address: socio.address.clone(),
            comuna: socio.comuna.clone(),
            region: socio.region.clone(),
            phone: socio.phone.clone(),
            email: socio.email.clone(),
            instagram: socio.instagram.clone(),
            latitude: location.latitude(),
            longitude: location.longitude(),
        })
    }
}

/// A socio with its distance from the searched point.
#[derive(Debug, Clone, Serialize)]
pub struct NearbySocio {
    #[serde(flatten)]
    pub socio: SocioJson,
    /// Great-circle distance, rounded to 0.1 km.
    pub distance_km: f64,
}

/// Query for the nearby lookup.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub limit: Option<usize>,
}

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "distributors/index.html")]
pub struct DistributorsTemplate {
    pub socios: Vec<SocioJson>,
}

/// Display the distributor map.
///
/// # Errors
///
/// Returns an error if the listing cannot be loaded.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<DistributorsTemplate, AppError> {
    let socios = state.public_socios().await?;
    Ok(DistributorsTemplate {
        socios: socios.iter().filter_map(SocioJson::from_socio).collect(),
    })
}

/// `GET /api/distribuidores` - every socio shown on the map.
///
/// # Errors
///
/// Returns an error if the listing cannot be loaded.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SocioJson>>, AppError> {
    let socios = state.public_socios().await?;
    Ok(Json(socios.iter().filter_map(SocioJson::from_socio).collect()))
}

/// `GET /api/distribuidores/cercanos?lat=&lng=&limit=` - closest socios first.
///
/// # Errors
///
/// Returns 400 for out-of-range coordinates.
#[instrument(skip(state))]
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbySocio>>, AppError> {
    let origin = Coordinates::new(query.lat, query.lng)
        .map_err(|e| AppError::BadRequest(format!("Coordenadas inválidas: {e}")))?;
    let limit = clamp_limit(query.limit);

    let socios = state.public_socios().await?;
    Ok(Json(nearby_socios(origin, &socios, limit)))
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_NEARBY_LIMIT)
        .clamp(1, MAX_NEARBY_LIMIT)
}

fn nearby_socios(origin: Coordinates, socios: &[Socio], limit: usize) -> Vec<NearbySocio> {
    nearest(origin, socios, limit)
        .into_iter()
        .filter_map(|(socio, distance)| {
            SocioJson::from_socio(socio).map(|socio| NearbySocio {
                socio,
                distance_km: (distance * 10.0).round() / 10.0,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use delicias_core::ApprovalStatus;

    use super::*;

    fn socio(id: i32, name: &str, lat: f64, lng: f64) -> Socio {
        Socio {
            id: SocioId::new(id),
            name: name.to_owned(),
            address: "Calle 1".to_owned(),
            comuna: "Comuna".to_owned(),
            region: "Región".to_owned(),
            phone: None,
            email: None,
            instagram: Some("@socio".to_owned()),
            location: Some(Coordinates::new(lat, lng).unwrap()),
            status: ApprovalStatus::Approved,
            is_public: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_map_page_pins_leaflet_assets() {
        let html = DistributorsTemplate { socios: Vec::new() }.render().unwrap();
        for asset in ["leaflet.css", "leaflet.js"] {
            let tag = html
                .lines()
                .find(|line| line.contains("unpkg.com") && line.contains(asset))
                .unwrap();
            assert!(tag.contains(r#"integrity="sha256-"#), "{asset}");
            assert!(tag.contains("crossorigin"), "{asset}");
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_NEARBY_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_NEARBY_LIMIT);
    }

    #[test]
    fn test_nearby_sorted_with_distance() {
        let socios = vec![
            socio(1, "Valparaíso", -33.0472, -71.6127),
            socio(2, "Providencia", -33.4314, -70.6093),
            socio(3, "Concepción", -36.8201, -73.0444),
        ];
        let plaza_de_armas = Coordinates::new(-33.4378, -70.6504).unwrap();

        let found = nearby_socios(plaza_de_armas, &socios, 2);
        let names: Vec<_> = found.iter().map(|n| n.socio.name.as_str()).collect();
        assert_eq!(names, ["Providencia", "Valparaíso"]);
        assert!(found[0].distance_km < 5.0);
        assert!((90.0..110.0).contains(&found[1].distance_km));
    }

    #[test]
    fn test_socio_json_shape() {
        let json = serde_json::to_value(NearbySocio {
            socio: SocioJson::from_socio(&socio(7, "Ñuñoa", -33.45, -70.6)).unwrap(),
            distance_km: 1.2,
        })
        .unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["latitude"], -33.45);
        assert_eq!(json["distance_km"], 1.2);
        assert_eq!(json["instagram"], "@socio");
    }
}
