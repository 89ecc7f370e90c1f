use form_saver::dom::document::{DISPATCH_JOURNAL_LIMIT, Document, Element, EventKind};

// =========================================================================
// Event journal
// =========================================================================

#[test]
fn event_journal_keeps_only_recent_events() {
    let mut doc = Document::new();
    let body = doc.body();
    let field = doc.append(body, Element::input("text")).unwrap();

    doc.dispatch(field, EventKind::Blur).unwrap();
    for _ in 0..DISPATCH_JOURNAL_LIMIT + 50 {
        doc.type_text(field, "x").unwrap();
    }

    assert_eq!(doc.dispatched().count(), DISPATCH_JOURNAL_LIMIT);
    let first = doc.dispatched().next().unwrap();
    assert_eq!(first.target, field);
    assert_ne!(first.kind, EventKind::Blur, "oldest entries are dropped");
    assert_eq!(doc.dispatched_on(field).len(), DISPATCH_JOURNAL_LIMIT);
}

#[test]
fn event_journal_records_in_dispatch_order() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = doc.append(body, Element::input("checkbox")).unwrap();
    let b = doc.append(body, Element::input("text")).unwrap();

    doc.click(a).unwrap();
    doc.type_text(b, "hi").unwrap();

    let kinds: Vec<_> = doc.dispatched().map(|e| (e.target, e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (a, EventKind::Click),
            (a, EventKind::Input),
            (a, EventKind::Change),
            (b, EventKind::Input),
            (b, EventKind::Keyup),
        ]
    );
    assert!(doc.element(a).unwrap().checked);
}
