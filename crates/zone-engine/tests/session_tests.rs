use std::sync::Arc;
use zone_engine::session::*;
use zone_engine::*;

async fn two_page_template() -> (ZonePersistence, Template, Vec<TemplatePage>) {
    let service = ZonePersistence::new(Arc::new(MemoryStore::new()));
    let template = service
        .create_template(NewTemplate::new(
            "Greeting Card",
            "card",
            "600x800pt".parse().unwrap(),
        ))
        .await
        .unwrap();
    let mut pages = Vec::new();
    for number in 1..=2 {
        pages.push(
            service
                .create_page(NewPage {
                    template_id: template.id,
                    page_number: number,
                    preview_image_url: None,
                    native_size: Some(PhysicalSize::new(600.0, 800.0, Unit::Point).unwrap()),
                })
                .await
                .unwrap(),
        );
    }
    (service, template, pages)
}

#[tokio::test]
async fn test_editor_save_and_reload() {
    let (service, template, pages) = two_page_template().await;
    let context = PageContext::new(pages[0].clone(), 600.0, 800.0).unwrap();
    let mut editor = ZoneEditor::default();

    editor
        .apply(EditIntent::Create {
            zone_type: ZoneType::Image,
            name: None,
        })
        .unwrap();
    let EditEvent::Created(title) = editor
        .apply(EditIntent::Create {
            zone_type: ZoneType::Text,
            name: Some("Title".into()),
        })
        .unwrap()
    else {
        panic!("expected a created zone");
    };

    let set = editor.desired_set();
    let report = service
        .reconcile_zone_set(&set.zones, template.id, true, &context)
        .await
        .unwrap();
    editor.apply_report(&set, &report);
    assert!(!editor.is_dirty());
    assert!(editor.get(title).unwrap().id().is_some());

    // Delete one zone and save again
    editor.apply(EditIntent::Delete(title)).unwrap();
    assert!(editor.is_dirty());
    let set = editor.desired_set();
    let report = service
        .reconcile_zone_set(&set.zones, template.id, false, &context)
        .await
        .unwrap();
    assert_eq!(report.deleted.len(), 1);
    assert_eq!(report.unchanged.len(), 1);

    let mut reloaded = ZoneEditor::default();
    reloaded.load(service.load_canvas_zones(&context).await.unwrap());
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.zones()[0].1.name(), "Image Zone 1");
}

#[tokio::test]
async fn test_customization_walks_pages_and_checks_types() {
    let (service, template, pages) = two_page_template().await;
    let first = PageContext::new(pages[0].clone(), 600.0, 800.0).unwrap();
    let second = PageContext::new(pages[1].clone(), 600.0, 800.0).unwrap();

    let photo = service
        .create_zone(
            template.id,
            &ZoneGeometry::new(ZoneType::Image, "Photo", Rect::new(50.0, 50.0, 200.0, 150.0))
                .unwrap(),
            &first,
        )
        .await
        .unwrap();
    let greeting = service
        .create_zone(
            template.id,
            &ZoneGeometry::new(ZoneType::Text, "Greeting", Rect::new(50.0, 300.0, 300.0, 60.0))
                .unwrap(),
            &second,
        )
        .await
        .unwrap();

    let mut session =
        CustomizationSession::open(service, SessionScope::new(), template.id, 600.0, 800.0)
            .await
            .unwrap();
    assert_eq!(session.page_count(), 2);
    assert_eq!(session.current_page().page_number, 1);
    assert_eq!(session.placements().len(), 1);
    assert_eq!(session.canvas_zones()[0].rect(), Rect::new(50.0, 50.0, 200.0, 150.0));

    assert!(matches!(
        session.set_content(
            photo.zone_id,
            ZoneContent::Text {
                text: "Hi".into()
            }
        ),
        Err(ZoneError::ContentTypeMismatch { .. })
    ));
    // Zone not placed on this page
    assert!(matches!(
        session.set_content(
            greeting.zone_id,
            ZoneContent::Text {
                text: "Hi".into()
            }
        ),
        Err(ZoneError::NotFound { .. })
    ));

    session
        .set_content(
            photo.zone_id,
            ZoneContent::Image {
                uri: "file:///tmp/cat.jpg".into(),
            },
        )
        .unwrap();
    assert!(session.has_unsaved_changes());
    assert_eq!(session.completion(), Completion { filled: 1, total: 1 });

    assert!(session.next_page().await.unwrap());
    assert!(!session.next_page().await.unwrap());
    assert_eq!(session.completion(), Completion { filled: 1, total: 2 });

    session
        .set_content(
            greeting.zone_id,
            ZoneContent::Text {
                text: "Happy birthday".into(),
            },
        )
        .unwrap();
    assert!(session.completion().is_complete());

    session.go_to_page(1).await.unwrap();
    assert!(!session.previous_page().await.unwrap());
    assert!(session.go_to_page(9).await.is_err());
    assert!(session.content(photo.zone_id, pages[0].id).is_some());

    session.mark_saved();
    assert!(!session.has_unsaved_changes());
}

#[tokio::test]
async fn test_repeating_zone_content_is_per_page() {
    let (service, template, pages) = two_page_template().await;
    let first = PageContext::new(pages[0].clone(), 600.0, 800.0).unwrap();
    let footer = service
        .create_zone(
            template.id,
            &ZoneGeometry::new(ZoneType::Text, "Footer", Rect::new(0.0, 700.0, 600.0, 50.0))
                .unwrap()
                .with_repeating(true),
            &first,
        )
        .await
        .unwrap();

    let mut session =
        CustomizationSession::open(service, SessionScope::new(), template.id, 600.0, 800.0)
            .await
            .unwrap();
    session
        .set_content(footer.zone_id, ZoneContent::Text { text: "One".into() })
        .unwrap();
    session.next_page().await.unwrap();
    assert_eq!(session.placements().len(), 1);
    session
        .set_content(footer.zone_id, ZoneContent::Text { text: "Two".into() })
        .unwrap();

    assert_eq!(
        session.content(footer.zone_id, pages[0].id),
        Some(&ZoneContent::Text { text: "One".into() })
    );
    assert_eq!(
        session.content(footer.zone_id, pages[1].id),
        Some(&ZoneContent::Text { text: "Two".into() })
    );
}

#[tokio::test]
async fn test_session_on_torn_down_scope_is_cancelled() {
    let (service, template, _) = two_page_template().await;
    let scope = SessionScope::new();
    scope.teardown();

    let result = CustomizationSession::open(service, scope, template.id, 600.0, 800.0).await;
    assert!(matches!(result, Err(ZoneError::Cancelled)));
}

#[tokio::test]
async fn test_template_without_pages_cannot_be_customized() {
    let service = ZonePersistence::new(Arc::new(MemoryStore::new()));
    let template = service
        .create_template(NewTemplate::new("Empty", "misc", "4x6in".parse().unwrap()))
        .await
        .unwrap();

    let result =
        CustomizationSession::open(service, SessionScope::new(), template.id, 600.0, 800.0).await;
    assert!(matches!(result, Err(ZoneError::NoPages)));
}
