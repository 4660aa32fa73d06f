//! Integration tests for the #[derive(Identifiable)] macro.

use horizon_strata_core::{ComponentId, Identifiable};
use horizon_strata_macros::Identifiable;

#[derive(Clone, Identifiable)]
struct Label {
    #[id]
    key: String,
    text: String,
    lines: u8,
}

#[derive(Clone, Identifiable)]
struct Message {
    #[id]
    thread: u64,
    #[id]
    seq: u32,
    body: String,
    #[content(skip)]
    read_receipts: Vec<u64>,
}

#[derive(Clone, Identifiable)]
struct Tagged<T: Clone + PartialEq> {
    #[id]
    tag: &'static str,
    value: T,
}

#[derive(Clone, Identifiable)]
struct OnlyId {
    #[id]
    key: u8,
}

fn label(key: &str, text: &str) -> Label {
    Label {
        key: key.to_string(),
        text: text.to_string(),
        lines: 1,
    }
}

#[test]
fn test_single_id_field() {
    let a = label("title", "Hello");
    let id: String = a.id();
    assert_eq!(id, "title");
    assert_eq!(ComponentId::of(&a), ComponentId::new("title".to_string()));
}

#[test]
fn test_content_comparison_is_reflexive_false() {
    let a = label("title", "Hello");
    assert!(!a.should_content_update(&a.clone()));
}

#[test]
fn test_content_comparison_detects_each_field() {
    let a = label("title", "Hello");
    let mut b = a.clone();
    b.text = "Bye".to_string();
    assert!(a.should_content_update(&b));

    let mut c = a.clone();
    c.lines = 2;
    assert!(a.should_content_update(&c));
}

#[test]
fn test_tuple_id() {
    let m = Message {
        thread: 9,
        seq: 3,
        body: "hi".into(),
        read_receipts: vec![],
    };
    assert_eq!(m.id(), (9u64, 3u32));
}

#[test]
fn test_skipped_field_is_ignored() {
    let m = Message {
        thread: 1,
        seq: 1,
        body: "hi".into(),
        read_receipts: vec![],
    };
    let mut read = m.clone();
    read.read_receipts.push(42);
    assert!(!m.should_content_update(&read));

    let mut edited = m.clone();
    edited.body = "hello".into();
    assert!(m.should_content_update(&edited));
}

#[test]
fn test_generic_struct() {
    let a = Tagged { tag: "n", value: 1.5f32 };
    let b = Tagged { tag: "n", value: 2.5f32 };
    assert_eq!(a.id(), b.id());
    assert!(a.should_content_update(&b));
}

#[test]
fn test_id_only_struct_never_updates() {
    let a = OnlyId { key: 1 };
    assert!(!a.should_content_update(&OnlyId { key: 1 }));
}
