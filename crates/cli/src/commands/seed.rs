//! Seed distributor listings from a YAML file.
//!
//! Each entry is upserted by name and comuna, approved and public. Entries
//! with `lat`/`lng` land on the map right away; the rest wait for
//! "Ubicar dirección" in the back office. Re-seeding a socio with a new
//! address and no coordinates drops its old pin.
//!
//! ```yaml
//! - name: Almacén Doña Rosa
//!   address: Colón 1500
//!   comuna: Talcahuano
//!   region: Biobío
//!   instagram: "@donarosa"
//!   lat: -36.72431
//!   lng: -73.11689
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use delicias_admin::db::{self, RepositoryError, SocioRepository};
use delicias_admin::models::SocioInput;
use delicias_core::Coordinates;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The seed file could not be read.
    #[error("Cannot read {0}: {1}")]
    Io(String, std::io::Error),

    /// The seed file is not valid YAML for socios.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// One or more entries failed validation.
    #[error("{0} invalid entries")]
    Invalid(usize),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upsert failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One socio in the seed file.
#[derive(Debug, Deserialize)]
struct SeedSocio {
    #[serde(flatten)]
    input: SocioInput,
    lat: Option<f64>,
    lng: Option<f64>,
}

/// A validated entry, ready to upsert.
#[derive(Debug)]
struct SeedEntry {
    input: SocioInput,
    location: Option<Coordinates>,
}

impl SeedSocio {
    fn validate(self) -> Result<SeedEntry, String> {
        let input = self.input.normalized()?;
        let location = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                Some(Coordinates::new(lat, lng).map_err(|e| e.to_string())?)
            }
            (None, None) => None,
            _ => return Err("lat and lng must be given together".to_owned()),
        };
        Ok(SeedEntry { input, location })
    }
}

/// Parse and validate a seed file, collecting every problem.
fn parse_entries(content: &str) -> Result<Vec<SeedEntry>, SeedError> {
    let raw: Vec<SeedSocio> = serde_yaml::from_str(content)?;

    let mut entries = Vec::with_capacity(raw.len());
    let mut invalid = 0;
    for (index, socio) in raw.into_iter().enumerate() {
        let label = format!("#{} {}", index + 1, socio.input.name.trim());
        match socio.validate() {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                error!("  - {label}: {reason}");
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(entries)
}

/// Upsert socios from a YAML file.
///
/// The whole file is validated before connecting, so a bad entry leaves the
/// database untouched, and the upserts share one transaction.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or if the
/// database is unreachable.
pub async fn socios(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading socios from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Io(file_path.to_owned(), e))?;
    let entries = parse_entries(&content)?;
    info!(socios = entries.len(), "Seed file validated");

    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("ADMIN_DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let batch: Vec<_> = entries
        .into_iter()
        .map(|entry| (entry.input, entry.location))
        .collect();
    let socios = SocioRepository::new(&pool).upsert_approved_all(&batch).await?;

    let mut unplaced = 0;
    for socio in &socios {
        if socio.location.is_none() {
            unplaced += 1;
        }
        info!(socio_id = %socio.id, "Upserted {} ({})", socio.name, socio.comuna);
    }

    info!("Seeding complete!");
    info!("  Socios upserted: {}", socios.len());
    if unplaced > 0 {
        warn!(
            "  {} socios have no coordinates and stay off the map until geocoded",
            unplaced
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries_with_and_without_coordinates() {
        let yaml = r#"
- name: Almacén Doña Rosa
  address: Colón 1500
  comuna: Talcahuano
  region: Biobío
  instagram: "@donarosa"
  lat: -36.72431
  lng: -73.11689
- name: "  Minimarket Los Andes "
  address: Independencia 540
  comuna: Los Andes
  region: Valparaíso
  phone: ""
"#;
        let entries = parse_entries(yaml).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.input.instagram.as_deref(), Some("@donarosa"));
        let location = first.location.unwrap();
        assert!((location.latitude() - -36.724_31).abs() < 1e-9);

        let second = &entries[1];
        assert_eq!(second.input.name, "Minimarket Los Andes");
        assert_eq!(second.input.phone, None);
        assert!(second.location.is_none());
    }

    #[test]
    fn test_half_coordinates_are_invalid() {
        let yaml = "- {name: A, address: B, comuna: C, region: D, lat: -33.4}\n";
        assert!(matches!(parse_entries(yaml), Err(SeedError::Invalid(1))));
    }

    #[test]
    fn test_out_of_range_and_missing_fields_are_counted() {
        let yaml = "\
- {name: A, address: B, comuna: C, region: D, lat: -95.0, lng: -70.0}
- {name: E, address: F, comuna: '', region: G}
- {name: H, address: I, comuna: J, region: K}
";
        assert!(matches!(parse_entries(yaml), Err(SeedError::Invalid(2))));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse_entries("name: [unclosed"),
            Err(SeedError::Yaml(_))
        ));
    }

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let content = include_str!("../../seeds/socios.yaml");
        let entries = parse_entries(content).unwrap();
        assert!(!entries.is_empty());
    }
}
