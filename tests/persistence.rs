use chrono::Utc;
use forecast_lib::db::{models::VISITOR_COUNTER, Database};
use forecast_lib::survey::{
    builder::{build_submission, PlacedItem, SavePredictionsPayload, SubmissionPolicy},
    normalize::Prediction,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Database {
    Database::new(dir.path().join("forecast.sqlite3")).unwrap()
}

fn payload(email: &str, anonymize: bool) -> SavePredictionsPayload {
    SavePredictionsPayload {
        items: vec![
            PlacedItem {
                name: "HAL".into(),
                x: 90.0,
                y: 90.0,
            },
            PlacedItem {
                name: "HER".into(),
                x: 30.0,
                y: 10.0,
            },
        ],
        email: Some(email.into()),
        join_community: true,
        anonymize_data: anonymize,
        average_prediction: None,
    }
}

#[tokio::test]
async fn stores_and_reads_back_submissions_in_order() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    for email in ["first@example.org", "second@example.org"] {
        let built =
            build_submission(&payload(email, false), SubmissionPolicy::default(), Utc::now())
                .unwrap();
        db.insert_submission(&built.submission, built.contact.as_ref())
            .await
            .unwrap();
    }

    let stored = db.get_all_submissions().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].email.as_deref(), Some("first@example.org"));
    assert_eq!(stored[1].email.as_deref(), Some("second@example.org"));
    assert_eq!(stored[0].predictions["HAL"], Prediction { x: 40, y: -40 });
    assert_eq!(stored[0].predictions["HER"], Prediction { x: -20, y: 40 });
    // mean of (90, 90) and (30, 10) is (60, 50)
    assert_eq!(stored[0].average_prediction, Prediction { x: 10, y: 0 });
}

#[tokio::test]
async fn anonymized_submission_is_not_linked_to_contact() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    let built = build_submission(
        &payload("private@example.org", true),
        SubmissionPolicy::default(),
        Utc::now(),
    )
    .unwrap();
    db.insert_submission(&built.submission, built.contact.as_ref())
        .await
        .unwrap();

    let stored = db.get_all_submissions().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].email.is_none());
    assert!(stored[0].anonymize);

    let contacts = db.get_all_contacts().await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].email, "private@example.org");
    assert!(contacts[0].data_opt_out);
    assert!(contacts[0].marketing_opt_in);
    assert_ne!(contacts[0].id, stored[0].id);
    assert!(contacts
        .iter()
        .all(|contact| contact.created_at != stored[0].created_at));
}

#[tokio::test]
async fn anonymized_contact_cannot_be_joined_on_timestamp() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    for (email, anonymize) in [
        ("v0@example.org", false),
        ("v1@example.org", true),
        ("v2@example.org", false),
    ] {
        let built =
            build_submission(&payload(email, anonymize), SubmissionPolicy::default(), Utc::now())
                .unwrap();
        db.insert_submission(&built.submission, built.contact.as_ref())
            .await
            .unwrap();
    }

    let stored = db.get_all_submissions().await.unwrap();
    let anonymized: Vec<_> = stored.iter().filter(|s| s.anonymize).collect();
    assert_eq!(anonymized.len(), 1);

    let contacts = db.get_all_contacts().await.unwrap();
    assert_eq!(contacts.len(), 3);
    let joined: Vec<&str> = contacts
        .iter()
        .filter(|c| c.created_at == anonymized[0].created_at)
        .map(|c| c.email.as_str())
        .collect();
    assert!(joined.is_empty(), "joined on created_at: {joined:?}");
}

#[tokio::test]
async fn survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let db = open(&dir);
        let built =
            build_submission(&payload("a@b.co", false), SubmissionPolicy::default(), Utc::now())
                .unwrap();
        db.insert_submission(&built.submission, None).await.unwrap();
        db.increment_counter(VISITOR_COUNTER, "pageLoad").await.unwrap();
    }

    let db = open(&dir);
    assert_eq!(db.get_all_submissions().await.unwrap().len(), 1);
    assert!(db.get_all_contacts().await.unwrap().is_empty());
    assert_eq!(db.get_counter(VISITOR_COUNTER).await.unwrap()["pageLoad"], 1);
}

#[tokio::test]
async fn first_increment_initializes_to_one() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    assert!(db.get_counter(VISITOR_COUNTER).await.unwrap().is_empty());
    assert_eq!(db.increment_counter(VISITOR_COUNTER, "itemMove").await.unwrap(), 1);
    assert_eq!(db.increment_counter(VISITOR_COUNTER, "itemMove").await.unwrap(), 2);

    let values = db.get_counter(VISITOR_COUNTER).await.unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values["itemMove"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    db.increment_counter(VISITOR_COUNTER, "pageLoad").await.unwrap();

    let tasks: Vec<_> = (0..64)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.increment_counter(VISITOR_COUNTER, "pageLoad").await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let values = db.get_counter(VISITOR_COUNTER).await.unwrap();
    assert_eq!(values["pageLoad"], 65);
}
