use std::sync::Arc;

use paper_core::model::{BankId, Points, ReviewUpdate};
use paper_core::time::fixed_clock;
use services::papers::GroupRef;
use services::{
    AppServices, PaperError, PaperMode, PaperRequest, PracticeRequest, TitlePageRequest,
};
use storage::BankCatalog;
use storage::fs::FsBankRepository;
use storage::repository::{InMemoryRepository, Storage};

const BANK: &str = r#"{
  "topics": {
    "Topic 10 Data types": [
      {"group_id": "DT1", "tags": ["records"], "questions": [
        {"question_id": "dt1a", "question_text": "Define a record.", "points": 2, "images": ["images/dt1a.png"]},
        {"question_id": "dt1b", "question_text": "Declare a record type.", "points": 3, "images": ["images/dt1b.png"]}
      ]},
      {"questions": [
        {"question_id": "dt2a", "question_text": "Explain enumerated types.", "parts": [{"points": 1}, {"points": 2}]}
      ]}
    ],
    "Topic 9 Algorithms": [
      {"group_id": "AL1", "questions": [
        {"question_id": "al1a", "question_text": "Trace the binary search.", "points": 4, "answer_images": ["images/al1a_ms.png"]}
      ]},
      {"group_id": "AL2", "questions": [
        {"question_id": "al2a", "question_text": "Write a recursive function.", "points": 6, "tags": ["unrelated"]}
      ]}
    ]
  }
}"#;

fn setup() -> (tempfile::TempDir, AppServices, BankId) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(BankCatalog::builtin(dir.path()));
    let id = BankId::new("CSA2").unwrap();
    let paths = catalog.paths(&id).unwrap();
    std::fs::create_dir_all(&paths.images_dir).unwrap();
    std::fs::write(&paths.json_path, BANK).unwrap();

    let repo = InMemoryRepository::new();
    let storage = Storage {
        banks: Arc::new(FsBankRepository::new(Arc::clone(&catalog))),
        reviews: Arc::new(repo.clone()),
        notes: Arc::new(repo),
    };
    let services = AppServices::new(catalog, &storage, fixed_clock());
    (dir, services, id)
}

#[tokio::test]
async fn browse_lists_topics_in_document_order() {
    let (_dir, services, id) = setup();
    let summary = services.browse().bank_summary(&id).await.unwrap();
    let topics: Vec<_> = summary
        .topics
        .iter()
        .map(|t| (t.name.as_str(), t.topic_points))
        .collect();
    assert_eq!(
        topics,
        vec![
            ("Topic 10 Data types", Points::from(8)),
            ("Topic 9 Algorithms", Points::from(10)),
        ]
    );
    assert_eq!(summary.label, "Computer Science A2");

    let hits = services.browse().search(&id, "record").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].group_title, "DT1 (5 pts)");
}

#[tokio::test]
async fn automatic_paper_respects_target_and_filters() {
    let (_dir, services, id) = setup();
    let request = PaperRequest {
        topics: vec!["Topic 9 Algorithms".into(), "Topic 10 Data types".into()],
        mode: PaperMode::Automatic {
            target_points: Points::from(100),
            exclude_unrelated: true,
            seed: Some(42),
        },
        title_page: Some(TitlePageRequest::default()),
    };

    let paper = services.papers().generate(&id, request).await.unwrap();
    assert_eq!(paper.total_points, Points::from(12));
    assert!(paper
        .questions
        .iter()
        .all(|q| q.question_id.as_ref().unwrap().as_str() != "al2a"));

    let page = paper.title_page.unwrap();
    assert_eq!(page.title, "Computer Science A2");
    assert_eq!(page.breakdown.len(), 3);
    let breakdown_total: Points = page.breakdown.iter().map(|row| row.total).sum();
    assert_eq!(breakdown_total, Points::from(12));
}

#[tokio::test]
async fn custom_paper_and_errors() {
    let (_dir, services, id) = setup();
    let request = PaperRequest {
        topics: vec!["Topic 9 Algorithms".into()],
        mode: PaperMode::Custom {
            selections: vec!["Topic 9 Algorithms|1".parse::<GroupRef>().unwrap()],
        },
        title_page: None,
    };
    let paper = services.papers().generate(&id, request).await.unwrap();
    assert_eq!(paper.total_points, Points::from(6));

    let request = PaperRequest {
        topics: vec![],
        mode: PaperMode::Custom { selections: vec![] },
        title_page: None,
    };
    let err = services.papers().generate(&id, request).await.unwrap_err();
    assert!(matches!(err, PaperError::NoTopics));

    let request = PaperRequest {
        topics: vec!["Topic 9 Algorithms".into()],
        mode: PaperMode::Custom { selections: vec![] },
        title_page: None,
    };
    let err = services
        .papers()
        .generate(&BankId::new("PHAS").unwrap(), request)
        .await
        .unwrap_err();
    assert!(matches!(err, PaperError::Storage(_)));
}

#[tokio::test]
async fn practice_review_and_notes_share_the_bank() {
    let (_dir, services, id) = setup();

    let items = services
        .practice()
        .draw(
            &id,
            &PracticeRequest {
                seed: Some(7),
                ..PracticeRequest::default()
            },
        )
        .await
        .unwrap();
    let mut ids: Vec<_> = items.iter().map(|item| item.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec!["AL1", "DT1"]);

    let groups = services.reviews().groups(&id).await.unwrap();
    assert_eq!(groups.first().unwrap().topic, "Topic 9 Algorithms");
    assert_eq!(groups.len(), 4);

    let status = services
        .reviews()
        .update(
            &id,
            ReviewUpdate {
                key: "Topic 9 Algorithms|0".into(),
                status: Some("ok".into()),
                ..ReviewUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(status.entries.len(), 1);

    services.notes().submit(&id, "al1a mark scheme cropped").await.unwrap();
    assert_eq!(services.notes().list(&id).await.unwrap().len(), 1);
}
