use lopdf::{Dictionary, Document, Object, Stream};
use std::sync::Arc;
use tempfile::NamedTempFile;
use zone_engine::constants::DEFAULT_MISMATCH_TOLERANCE as TOLERANCE;
use zone_engine::*;

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

/// Build a PDF whose pages use the given sizes; `None` inherits the
/// MediaBox of the page tree root, which is set to A4.
fn create_test_pdf(sizes: &[Option<(i64, i64)>]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for size in sizes {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some((width, height)) = size {
            page.set("MediaBox", media_box(*width, *height));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(sizes.len() as i64)),
        ("MediaBox", media_box(595, 842)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

fn write_pdf(mut doc: Document) -> NamedTempFile {
    let temp = NamedTempFile::new().unwrap();
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    std::fs::write(temp.path(), writer).unwrap();
    temp
}

async fn a4_template() -> (ZonePersistence, Template) {
    let service = ZonePersistence::new(Arc::new(MemoryStore::new()));
    let template = service
        .create_template(NewTemplate::new(
            "Poster",
            "poster",
            "210x297mm".parse().unwrap(),
        ))
        .await
        .unwrap();
    (service, template)
}

#[test]
fn test_page_sizes_inherit_media_box() {
    let doc = create_test_pdf(&[Some((612, 792)), None]);
    let sizes = page_sizes(&doc);
    assert_eq!(sizes.len(), 2);
    assert_eq!((sizes[0].width, sizes[0].height), (612.0, 792.0));
    assert_eq!((sizes[1].width, sizes[1].height), (595.0, 842.0));
    assert!(sizes.iter().all(|s| s.unit == Unit::Point));
}

#[tokio::test]
async fn test_load_pdf() {
    let temp = write_pdf(create_test_pdf(&[None, None, None]));
    let loaded = load_pdf(temp.path()).await.unwrap();
    assert_eq!(loaded.get_pages().len(), 3);
}

#[tokio::test]
async fn test_ingest_creates_pages_with_native_sizes() {
    let (service, template) = a4_template().await;
    let temp = write_pdf(create_test_pdf(&[None, None]));

    let outcome = ingest_document(&service, template.id, temp.path(), TOLERANCE)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.pages_created, 2);
    assert!(outcome.warnings.is_empty());

    let pages = service.list_pages(template.id).await.unwrap();
    assert_eq!(
        pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(pages[0].native_units, Some(Unit::Point));
    assert_eq!(pages[0].native_page_width, Some(595.0));

    let template = service.get_template(template.id).await.unwrap();
    assert!(template.original_document_url.is_some());
    assert_eq!(
        template.document_metadata.get("page_count").map(String::as_str),
        Some("2")
    );
}

#[tokio::test]
async fn test_ingest_warns_on_mismatched_document() {
    let (service, template) = a4_template().await;
    let temp = write_pdf(create_test_pdf(&[Some((612, 792))]));

    let outcome = ingest_document(&service, template.id, temp.path(), TOLERANCE)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("differs from the template size"));
}

#[tokio::test]
async fn test_ingest_respects_configured_tolerance() {
    let (service, template) = a4_template().await;
    let temp = write_pdf(create_test_pdf(&[Some((612, 792)), Some((595, 842))]));

    // Letter is about 9% off A4, under a 10% tolerance
    let outcome = ingest_document(&service, template.id, temp.path(), 0.10)
        .await
        .unwrap();
    assert!(outcome.success);
    assert!(outcome.warnings.is_empty());

    let outcome = ingest_document(&service, template.id, temp.path(), 0.01)
        .await
        .unwrap();
    assert_eq!(outcome.warnings.len(), 2);
}

#[tokio::test]
async fn test_reingest_replaces_pages() {
    let (service, template) = a4_template().await;
    let first = write_pdf(create_test_pdf(&[None, None, None]));
    ingest_document(&service, template.id, first.path(), TOLERANCE)
        .await
        .unwrap();

    let second = write_pdf(create_test_pdf(&[None]));
    let outcome = ingest_document(&service, template.id, second.path(), TOLERANCE)
        .await
        .unwrap();

    assert_eq!(outcome.pages_created, 1);
    assert_eq!(service.list_pages(template.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_ingest_empty_document() {
    let (service, template) = a4_template().await;
    let temp = write_pdf(create_test_pdf(&[]));

    let result = ingest_document(&service, template.id, temp.path(), TOLERANCE).await;
    assert!(matches!(result, Err(ZoneError::NoPages)));
}
