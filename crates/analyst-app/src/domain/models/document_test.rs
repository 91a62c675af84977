use analyst_types::DocType;
use analyst_types::DocumentPayload;

use super::session_from_filename;
use super::Document;
use super::DocumentStatus;

#[test]
fn it_builds_from_a_bare_path() {
    let payload = DocumentPayload::from_path("docs/s1__20240501_101500_bug_fix_login.docx");
    let document = Document::from_payload(&payload).unwrap();

    assert_eq!(document.id, "s1__20240501_101500_bug_fix_login.docx");
    assert_eq!(document.filename, document.id);
    assert_eq!(document.doc_type, DocType::BugFix);
    assert_eq!(document.session_id.as_deref(), Some("s1"));
    assert_eq!(document.status, DocumentStatus::Pending);
}

#[test]
fn it_prefers_the_server_id_and_type() {
    let payload = DocumentPayload {
        id: Some("doc-7".to_string()),
        filename: Some("report.docx".to_string()),
        doc_type: Some(DocType::Prd),
        created: Some("2024-05-01T10:15:00".to_string()),
        ..Default::default()
    };
    let document = Document::from_payload(&payload).unwrap();
    assert_eq!(document.id, "doc-7");
    assert_eq!(document.doc_type, DocType::Prd);
    assert!(document.created_at.is_some());
    assert!(document.session_id.is_none());
}

#[test]
fn it_rejects_unkeyed_payloads() {
    assert!(Document::from_payload(&DocumentPayload::default()).is_none());
}

#[test]
fn it_merges_only_present_fields() {
    let mut document = Document::from_payload(&DocumentPayload {
        filename: Some("a.docx".to_string()),
        title: Some("Original".to_string()),
        size: Some(10),
        ..Default::default()
    })
    .unwrap();

    document.merge(&DocumentPayload {
        filename: Some("a.docx".to_string()),
        size: Some(42),
        ..Default::default()
    });

    assert_eq!(document.title.as_deref(), Some("Original"));
    assert_eq!(document.size, Some(42));
}

#[test]
fn it_matches_by_id_or_filename() {
    let document = Document::from_payload(&DocumentPayload {
        id: Some("doc-1".to_string()),
        filename: Some("a.docx".to_string()),
        ..Default::default()
    })
    .unwrap();

    assert!(document.matches(&DocumentPayload {
        id: Some("doc-1".to_string()),
        ..Default::default()
    }));
    assert!(document.matches(&DocumentPayload {
        filename: Some("a.docx".to_string()),
        ..Default::default()
    }));
    assert!(!document.matches(&DocumentPayload {
        filename: Some("b.docx".to_string()),
        ..Default::default()
    }));
}

#[test]
fn it_reads_session_prefixes() {
    assert_eq!(session_from_filename("abc__x.docx").as_deref(), Some("abc"));
    assert_eq!(session_from_filename("__x.docx"), None);
    assert_eq!(session_from_filename("plain.docx"), None);
}
