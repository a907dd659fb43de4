//! Readers sharing a session, and readers racing writers.

use std::sync::Arc;

use msbuild_lsp::model::ObjectHandle;
use msbuild_lsp::xml::SyntaxKind;
use msbuild_lsp::{Position, SessionStatus, TextRange};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::helpers::fixtures::{PROJECT, PROJECT_EDITED, harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_agree() {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    // Inside "a.cs;b.cs".
    let at = Position::new(6, 22);
    let mut tasks = JoinSet::new();
    for _ in 0..32 {
        let session = Arc::clone(&h.session);
        tasks.spawn(async move {
            let node = session.find_syntax_at(at).await.unwrap();
            node.map(|n| (n.kind(), n.text_range()))
        });
    }

    let mut results: Vec<Option<(SyntaxKind, TextRange)>> = Vec::new();
    while let Some(result) = tasks.join_next().await {
        results.push(result.unwrap());
    }

    assert_eq!(results.len(), 32);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(results[0].map(|(kind, _)| kind), Some(SyntaxKind::ATTRIBUTE_VALUE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_a_partial_update() {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();

    let writer = {
        let session = Arc::clone(&h.session);
        tokio::spawn(async move {
            for round in 0..20 {
                let text = if round % 2 == 0 { PROJECT_EDITED } else { PROJECT };
                session.update(text, &CancellationToken::new()).await.unwrap();
            }
        })
    };

    let mut readers = JoinSet::new();
    for _ in 0..8 {
        let session = Arc::clone(&h.session);
        readers.spawn(async move {
            for _ in 0..20 {
                // Both revisions put TargetFramework's value at the same place.
                let entry = session.find_evaluated_at(Position::new(2, 21)).await.unwrap();
                assert_eq!(entry.map(|e| e.object.handle), Some(ObjectHandle(3)));

                let text = session.text().await.unwrap();
                assert!(&*text == PROJECT || &*text == PROJECT_EDITED);
                tokio::task::yield_now().await;
            }
        });
    }

    writer.await.unwrap();
    while let Some(result) = readers.join_next().await {
        result.unwrap();
    }

    assert_eq!(h.session.status().await, SessionStatus::Evaluated);
    assert_eq!(h.engine.live_projects(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_suggestions_share_the_cache() {
    let h = harness();
    h.session.load(PROJECT, &CancellationToken::new()).await.unwrap();
    h.registry.push_ids(&["Newtonsoft.Json"]);

    // Prime the cache, then hit it from many tasks.
    h.session
        .suggest_package_ids("New", &CancellationToken::new())
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let session = Arc::clone(&h.session);
        tasks.spawn(async move {
            session
                .suggest_package_ids("New", &CancellationToken::new())
                .await
                .unwrap()
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().contains("Newtonsoft.Json"));
    }
    assert_eq!(h.registry.id_calls(), 1);
}
