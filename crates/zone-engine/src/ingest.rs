//! Document ingestion: turning an uploaded PDF into template pages
//!
//! Each page's MediaBox gives its native size in points. Pages that do not
//! carry their own MediaBox inherit it through the page tree; when none is
//! found the page is taken to be US Letter.

use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::coords::compare_dimensions;
use crate::dimensions::PhysicalSize;
use crate::model::{NewPage, TemplatePatch};
use crate::persistence::ZonePersistence;
use crate::types::{Result, TemplateId, ZoneError};
use crate::units::Unit;
use chrono::Utc;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Result of [`ingest_document`]
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub success: bool,
    pub message: String,
    pub pages_created: usize,
    /// Advisory messages such as dimension mismatches
    pub warnings: Vec<String>,
}

/// Load a PDF document
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::fs::read(&path).await?;
    let doc = tokio::task::spawn_blocking(move || Document::load_mem(&bytes)).await??;
    Ok(doc)
}

/// Native size of every page, in page order
pub fn page_sizes(doc: &Document) -> Vec<PhysicalSize> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let (width, height) = media_box_size(doc, page_id).unwrap_or(DEFAULT_PAGE_DIMENSIONS);
            PhysicalSize {
                width,
                height,
                unit: Unit::Point,
            }
        })
        .collect()
}

/// Width and height of the nearest MediaBox up the page tree
fn media_box_size(doc: &Document, page_id: ObjectId) -> Option<(f64, f64)> {
    let mut current = Some(page_id);
    // Guard against cyclic Parent references
    let mut depth = 0;
    while let Some(id) = current {
        depth += 1;
        if depth > 32 {
            break;
        }
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let media_box = match media_box {
                Object::Reference(r) => doc.get_object(*r).ok()?,
                other => other,
            };
            let values: Vec<f64> = media_box
                .as_array()
                .ok()?
                .iter()
                .filter_map(number)
                .collect();
            if let [x0, y0, x1, y1] = values[..] {
                let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());
                if width > 0.0 && height > 0.0 {
                    return Some((width, height));
                }
            }
            return None;
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    None
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Replace a template's pages with the pages of the PDF at `path`.
///
/// Existing pages (and their placements) are removed first, so uploading a
/// new revision of the document starts from a clean page list. Zone
/// definitions are template-wide and survive.
///
/// Pages whose aspect ratio differs from the template (or from page 1) by
/// more than `mismatch_tolerance` are reported in the outcome's warnings.
pub async fn ingest_document(
    service: &ZonePersistence,
    template_id: TemplateId,
    path: impl AsRef<Path>,
    mismatch_tolerance: f64,
) -> Result<IngestOutcome> {
    let path = path.as_ref();
    let template = service.get_template(template_id).await?;
    let doc = load_pdf(path).await?;
    let sizes = page_sizes(&doc);
    if sizes.is_empty() {
        return Err(ZoneError::NoPages);
    }
    log::info!("Ingesting {} pages from {}", sizes.len(), path.display());

    let mut warnings = Vec::new();
    if let Some(warning) = compare_dimensions(&template.dimensions, &sizes[0], mismatch_tolerance) {
        log::warn!("{}", warning);
        warnings.push(warning.to_string());
    }
    for (index, size) in sizes.iter().enumerate().skip(1) {
        if compare_dimensions(&sizes[0], size, mismatch_tolerance).is_some() {
            warnings.push(format!(
                "Page {} is {} while page 1 is {}",
                index + 1,
                size,
                sizes[0]
            ));
        }
    }

    for page in service.list_pages(template_id).await? {
        service.delete_page(page.id).await?;
    }

    let mut pages_created = 0;
    for (index, size) in sizes.iter().enumerate() {
        let created = service
            .create_page(NewPage {
                template_id,
                page_number: index as u32 + 1,
                preview_image_url: None,
                native_size: Some(*size),
            })
            .await;
        match created {
            Ok(_) => pages_created += 1,
            Err(e) => {
                return Ok(IngestOutcome {
                    success: false,
                    message: format!(
                        "Created {} of {} pages before failing: {}",
                        pages_created,
                        sizes.len(),
                        e
                    ),
                    pages_created,
                    warnings,
                });
            }
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut metadata = BTreeMap::new();
    metadata.insert("page_count".to_string(), sizes.len().to_string());
    metadata.insert("file_name".to_string(), file_name.clone());
    metadata.insert("ingested_at".to_string(), Utc::now().to_rfc3339());
    service
        .update_template(
            template_id,
            TemplatePatch {
                original_document_url: Some(path.display().to_string()),
                document_metadata: Some(metadata),
                is_active: None,
            },
        )
        .await?;

    Ok(IngestOutcome {
        success: true,
        message: format!("Ingested {} pages from {}", pages_created, file_name),
        pages_created,
        warnings,
    })
}
