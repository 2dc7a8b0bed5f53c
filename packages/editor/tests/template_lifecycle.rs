//! Pages, resizing and save/load against the in-memory adapter

use clause_editor::{
    CellBounds, Content, EditKey, EditorConfig, EditorError, FieldType, ImageSize, MemoryAdapter,
    PersistenceAdapter, Position, TemplateController, TemplatePayload,
};
use std::time::Instant;

fn blank_controller() -> TemplateController {
    let mut controller = TemplateController::with_pages(EditorConfig::default(), vec![Content::blank()]);
    controller
        .surface_mut()
        .place_caret(Position::new(vec![0], 0))
        .unwrap();
    controller
}

fn type_text(controller: &mut TemplateController, text: &str) {
    let now = Instant::now();
    for c in text.chars() {
        controller.handle_key(EditKey::Char(c), 0.0, now).unwrap();
    }
}

#[test]
fn test_delete_only_page_rejected() {
    let mut controller = blank_controller();
    type_text(&mut controller, "keep me");

    assert!(matches!(controller.delete_page(), Err(EditorError::LastPage)));
    assert_eq!(controller.page_count(), 1);
    assert_eq!(controller.surface().content().text_content(), "keep me");
}

#[test]
fn test_page_switch_resets_history_and_keeps_edits() {
    let mut controller = blank_controller();
    type_text(&mut controller, "one");
    controller.snapshot();
    assert_eq!(controller.history().len(), 2);

    assert_eq!(controller.add_page(), 1);
    assert_eq!(controller.history().len(), 1);
    assert!(!controller.undo());

    assert!(controller.prev_page());
    assert_eq!(controller.surface().content().text_content(), "one");
    assert_eq!(controller.history().len(), 1);

    controller.go_to_page(1).unwrap();
    assert_eq!(controller.delete_page().unwrap(), 0);
    assert_eq!(controller.page_count(), 1);
    assert_eq!(controller.surface().content().text_content(), "one");
    assert!(matches!(
        controller.go_to_page(5),
        Err(EditorError::PageOutOfRange { index: 5, len: 1 })
    ));
}

#[test]
fn test_resize_clamps() {
    let mut controller = blank_controller();
    let table = controller.insert_table(2, 2).unwrap();
    let mut cell = table;
    cell.extend([0, 0, 1]);

    let bounds = CellBounds { right: 300.0, width: 100.0 };
    assert!(controller.column_pointer_down(cell, bounds, 300.0));
    // Requested width of 5
    assert_eq!(controller.column_pointer_move(205.0).unwrap(), Some(20.0));
    assert!(controller.column_pointer_up());
    assert_eq!(controller.column_pointer_move(400.0).unwrap(), None);

    controller
        .surface_mut()
        .place_caret(Position::new(vec![0], 0))
        .unwrap();
    let image = controller.insert_image("logo.png").unwrap();
    let size = ImageSize { width: 200.0, height: 80.0 };
    assert!(controller.image_grab(image, size, 500.0));
    // Requested width of 10
    assert_eq!(controller.image_pointer_move(310.0).unwrap(), Some((50.0, 20.0)));
    assert!(controller.image_release());
    assert_eq!(controller.listeners().attached(), 0);
}

#[tokio::test]
async fn test_empty_name_rejected_without_adapter_call() {
    let adapter = MemoryAdapter::new();
    let mut controller = blank_controller();
    type_text(&mut controller, "body");

    for name in ["", "   "] {
        controller.set_name(name);
        let result = controller.save(&adapter).await;
        assert!(matches!(result, Err(EditorError::EmptyTemplateName)));
        assert!(result.unwrap_err().is_validation());
    }
    assert_eq!(adapter.calls(), 0);
    assert!(!controller.is_saving());
    assert_eq!(controller.id(), None);
}

#[tokio::test]
async fn test_save_creates_then_updates() {
    let adapter = MemoryAdapter::new();
    let mut controller = blank_controller();
    controller.set_name("전세 계약서");
    controller.set_category("임대차");
    controller.insert_variable(FieldType::Text, "임차인 성명").unwrap();

    let id = controller.save(&adapter).await.unwrap();
    assert_eq!(controller.id(), Some(id.as_str()));
    assert_eq!(adapter.creates(), 1);

    controller.add_page();
    type_text(&mut controller, "특약사항");
    assert_eq!(controller.save(&adapter).await.unwrap(), id);
    assert_eq!(adapter.updates(), 1);

    let stored = adapter.stored(&id).await.unwrap();
    assert_eq!(stored.name, "전세 계약서");
    assert_eq!(stored.category, "임대차");
    assert_eq!(stored.field_schema.len(), 1);
    assert_eq!(stored.document.matches("<!-- GENUINE_PAGE_BREAK -->").count(), 1);
    assert!(stored.document.contains("특약사항"));
}

#[tokio::test]
async fn test_failed_save_keeps_edits_for_retry() {
    let adapter = MemoryAdapter::new();
    let mut controller = blank_controller();
    controller.set_name("draft");
    type_text(&mut controller, "unsaved work");

    adapter.fail_next("network down").await;
    let result = controller.save(&adapter).await;
    assert!(matches!(result, Err(EditorError::Persistence(_))));
    assert_eq!(controller.id(), None);
    assert!(!controller.is_saving());
    assert_eq!(controller.surface().content().text_content(), "unsaved work");

    let id = controller.save(&adapter).await.unwrap();
    let stored = adapter.get_template(&id).await.unwrap();
    assert!(stored.document.contains("unsaved work"));
}

#[tokio::test]
async fn test_load_roundtrip() {
    let adapter = MemoryAdapter::new();
    let mut controller = blank_controller();
    controller.set_name("매매 계약서");
    controller.insert_variable(FieldType::Currency, "매매 대금").unwrap();
    controller.add_page();
    controller
        .surface_mut()
        .place_caret(Position::new(vec![0], 0))
        .unwrap();
    controller.insert_variable(FieldType::Signature, "매수인 서명").unwrap();
    let id = controller.save(&adapter).await.unwrap();

    let loaded = TemplateController::load(&adapter, &id, EditorConfig::default())
        .await
        .unwrap();
    assert_eq!(loaded.id(), Some(id.as_str()));
    assert_eq!(loaded.name(), "매매 계약서");
    assert_eq!(loaded.page_count(), 2);
    assert_eq!(loaded.active_page(), 0);
    assert_eq!(loaded.history().len(), 1);
    assert_eq!(loaded.field_schema(), controller.field_schema());
}

#[tokio::test]
async fn test_failed_open_leaves_state() {
    let adapter = MemoryAdapter::new();
    let mut controller = blank_controller();
    controller.set_name("local");
    type_text(&mut controller, "mine");

    let result = controller.open(&adapter, "missing").await;
    assert!(matches!(result, Err(EditorError::Persistence(_))));
    assert_eq!(controller.name(), "local");
    assert_eq!(controller.surface().content().text_content(), "mine");
}

#[tokio::test]
async fn test_open_refused_while_save_outstanding() {
    let adapter = MemoryAdapter::new();
    adapter
        .insert(
            "B",
            TemplatePayload {
                name: "B".to_string(),
                document: "<p>bee</p>".to_string(),
                ..TemplatePayload::default()
            },
        )
        .await;

    let mut controller = blank_controller();
    controller.set_name("A");
    type_text(&mut controller, "ay");
    let request = controller.begin_save().unwrap();
    assert_eq!(request.id, None);

    let result = controller.open(&adapter, "B").await;
    assert!(matches!(result, Err(EditorError::SaveInProgress)));
    assert_eq!(adapter.fetches(), 0);
    assert_eq!(controller.name(), "A");

    assert_eq!(controller.complete_save(Ok(Some("A-new".to_string()))).unwrap(), "A-new");
    assert_eq!(controller.id(), Some("A-new"));
    assert_eq!(controller.surface().content().text_content(), "ay");

    controller.open(&adapter, "B").await.unwrap();
    assert_eq!(controller.id(), Some("B"));
    assert_eq!(controller.surface().content().text_content(), "bee");
}

#[tokio::test]
async fn test_open_legacy_payload() {
    let adapter = MemoryAdapter::new();
    let legacy: TemplatePayload = serde_json::from_str(
        r#"{
            "name": "구 양식",
            "category": "기타",
            "formSchema": [
                {"key": "계약자", "label": "계약자", "type": "text"},
                {"key": "기본정보", "label": "기본 정보", "type": "section"}
            ],
            "htmlTemplate": "<p>{{계약자}} {{기본정보}}</p>"
        }"#,
    )
    .unwrap();
    adapter.insert("legacy-1", legacy).await;

    let mut controller = TemplateController::default();
    controller.open(&adapter, "legacy-1").await.unwrap();
    let placeholders = controller.surface().content().placeholders();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].1.key, "계약자");
    assert_eq!(controller.surface().content().text_content(), "{{계약자}} {{기본정보}}");
}
