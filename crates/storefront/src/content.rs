//! Markdown content pages (nosotros, preguntas frecuentes, términos...).
//!
//! Pages are loaded from `content/pages/*.md` at startup. Each file starts
//! with YAML frontmatter:
//!
//! ```markdown
//! ---
//! title: Nosotros
//! description: Repostería artesanal desde 2009
//! ---
//! # Nuestra historia
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;
use thiserror::Error;

/// Errors loading content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Page frontmatter.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// In-memory store of rendered pages.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load every page under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store; a page that fails to parse
    /// is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Pages directory does not exist");
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            let loaded = std::fs::read_to_string(&path)
                .map_err(|e| ContentError::Io(e.to_string()))
                .and_then(|raw| {
                    let slug = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?;
                    parse_page(slug, &raw)
                });

            match loaded {
                Ok(page) => {
                    tracing::info!(slug = %page.slug, "Loaded page");
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to load page"),
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Get a page by slug.
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }
}

/// Parse frontmatter and render the markdown body of one page.
///
/// # Errors
///
/// Returns `ContentError::Parse` if the frontmatter is missing or invalid.
pub fn parse_page(slug: &str, raw: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(raw)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug: slug.to_owned(),
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

/// Render markdown to HTML with the GitHub Flavored Markdown extensions.
///
/// Content is authored in the repository, so raw HTML is allowed.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FAQ: &str = "---\ntitle: Preguntas frecuentes\ndescription: Dudas comunes\nupdated_at: 2024-03-01\n---\n## ¿Cuál es el pedido mínimo?\n\n| Tramo | Unidades |\n|---|---|\n| 1 | 6+ |\n";

    #[test]
    fn test_parse_page_frontmatter_and_markdown() {
        let page = parse_page("preguntas-frecuentes", FAQ).unwrap();
        assert_eq!(page.meta.title, "Preguntas frecuentes");
        assert_eq!(page.meta.updated_at, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(page.content_html.contains("<h2"));
        assert!(page.content_html.contains("<table>"));
    }

    #[test]
    fn test_parse_page_requires_frontmatter() {
        assert!(parse_page("sin-meta", "# Solo texto").is_err());
    }

    #[test]
    fn test_load_reads_markdown_files_only() {
        let dir = std::env::temp_dir().join(format!("df-content-{}", std::process::id()));
        let pages = dir.join("pages");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("nosotros.md"), "---\ntitle: Nosotros\n---\nHola").unwrap();
        std::fs::write(pages.join("notas.txt"), "ignorar").unwrap();
        std::fs::write(pages.join("roto.md"), "sin frontmatter").unwrap();

        let store = ContentStore::load(&dir).unwrap();
        assert_eq!(store.get_page("nosotros").unwrap().meta.title, "Nosotros");
        assert!(store.get_page("notas").is_none());
        assert!(store.get_page("roto").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let store = ContentStore::load(Path::new("/nonexistent/content")).unwrap();
        assert!(store.get_page("nosotros").is_none());
    }
}
