//! Quality gate verdicts read back from `qa.json`

use kodegen_tools_pagearchive::archive_engine::{
    ArchiveError, QaResult, evaluate, judge, read_qa_result, write_qa_result,
};
use tempfile::TempDir;

fn scored(pct_visible: f64) -> QaResult {
    QaResult {
        pct_visible,
        warnings: vec!["large overlay".into()],
        ..QaResult::default()
    }
}

#[test]
fn below_threshold_fails_with_score_and_warnings() {
    match judge(scored(49.0), 50) {
        Err(ArchiveError::QaFailed { score, warnings, .. }) => {
            assert!((score - 49.0).abs() < f64::EPSILON);
            assert_eq!(warnings, ["large overlay"]);
        }
        other => panic!("expected QaFailed, got {other:?}"),
    }
}

#[test]
fn threshold_itself_passes() {
    let qa = judge(scored(50.0), 50).expect("50 passes a threshold of 50");
    assert!((qa.pct_visible - 50.0).abs() < f64::EPSILON);
}

#[test]
fn zero_threshold_accepts_empty_pages() {
    assert!(judge(QaResult::default(), 0).is_ok());
}

#[tokio::test]
async fn written_result_reads_back_unchanged() {
    let dir = TempDir::new().unwrap();
    let qa = QaResult {
        pct_visible: 87.0,
        warnings: Vec::new(),
        error_text: None,
        main_content_title: Some("Example Domain".into()),
        main_content_author: Some("IANA".into()),
        main_content_date: None,
        description: Some("Illustrative examples".into()),
    };

    write_qa_result(dir.path(), &qa).await.unwrap();
    assert_eq!(read_qa_result(dir.path()).await.unwrap(), qa);
    assert_eq!(evaluate(dir.path(), 50).await.unwrap(), qa);
}

#[tokio::test]
async fn missing_or_malformed_qa_is_unreadable() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        evaluate(dir.path(), 50).await,
        Err(ArchiveError::QaUnreadable(_))
    ));

    tokio::fs::write(dir.path().join("qa.json"), b"{not json").await.unwrap();
    assert!(matches!(
        read_qa_result(dir.path()).await,
        Err(ArchiveError::QaUnreadable(_))
    ));
}

#[tokio::test]
async fn optional_fields_may_be_omitted() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("qa.json"), br#"{"pct_visible": 64.5}"#)
        .await
        .unwrap();

    let qa = read_qa_result(dir.path()).await.unwrap();
    assert!((qa.pct_visible - 64.5).abs() < f64::EPSILON);
    assert!(qa.warnings.is_empty());
    assert!(qa.main_content_title.is_none());
}
