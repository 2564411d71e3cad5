//! Tag suggestions from a synced tag list and a Roam page export

mod common;

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use common::{file_syncer, library, tag, FakeLibrary};
use zotroam_core::tags::MergeType;
use zotroam_core::{MemoryCache, PageIndex, Syncer};

fn roam_export(dir: &TempDir) -> PageIndex {
    let path = dir.path().join("pages.json");
    std::fs::write(
        &path,
        json!([
            {"title": "housing", "uid": "r-1"},
            {"title": "Housing", "uid": "r-2"},
            {"title": "Self-care", "uid": "r-3"},
        ])
        .to_string(),
    )
    .unwrap();
    PageIndex::load(&path).unwrap()
}

#[tokio::test]
async fn suggestions_cover_each_cluster() {
    let remote = FakeLibrary::new(3);
    remote.set_tags(
        "users/42/tags",
        vec![
            tag("PKM", 0),
            tag("PKM", 1),
            tag("housing", 0),
            tag("self care", 1),
            tag("self-care", 0),
            tag("zettelkasten", 0),
        ],
    );
    let dir = TempDir::new().unwrap();
    let syncer = file_syncer(&remote, &dir);
    let index = roam_export(&dir);

    let buckets = syncer.tag_suggestions(&library(), &index).await.unwrap();

    let names: Vec<&str> = buckets.iter().map(|b| b.bucket.as_str()).collect();
    assert_eq!(names, vec!["h", "p", "s", "z"]);

    // Two Roam spellings: a human has to choose
    let housing = &buckets[0].entries[0];
    assert_eq!(housing.suggestion.recommend, None);
    assert_eq!(housing.suggestion.merge_type, Some(MergeType::Manual));
    assert_eq!(housing.suggestion.uses.roam, vec!["housing", "Housing"]);
    assert!(housing.suggestion.uses.zotero.is_empty());

    // Manual and automatic variants of one spelling
    let pkm = &buckets[1].entries[0];
    assert_eq!(pkm.suggestion.recommend.as_deref(), Some("PKM"));
    assert_eq!(pkm.suggestion.merge_type, Some(MergeType::Auto));
    assert_eq!(pkm.suggestion.uses.zotero, vec!["PKM"]);

    // Compound variants cluster together; the Roam title only matches exactly
    let self_care = &buckets[2].entries[0];
    assert_eq!(self_care.entry.token, "self-care");
    assert_eq!(self_care.entry.zotero.len(), 2);
    assert_eq!(self_care.suggestion.recommend.as_deref(), Some("Self-care"));
    assert_eq!(self_care.suggestion.merge_type, Some(MergeType::Auto));

    // Nothing to clean up
    let zettel = &buckets[3].entries[0];
    assert_eq!(zettel.suggestion.recommend.as_deref(), Some("zettelkasten"));
    assert_eq!(zettel.suggestion.merge_type, None);
}

#[tokio::test]
async fn suggestions_serialize_with_wire_names() {
    let remote = FakeLibrary::new(1);
    remote.set_tags("users/42/tags", vec![tag("PKM", 0), tag("PKM", 1)]);
    let syncer = Syncer::new(remote.clone(), Arc::new(MemoryCache::new()));

    let buckets = syncer
        .tag_suggestions(&library(), &PageIndex::default())
        .await
        .unwrap();
    let value = serde_json::to_value(&buckets).unwrap();

    assert_eq!(
        value[0]["entries"][0]["suggestion"],
        json!({"recommend": "PKM", "type": "auto", "use": {"roam": [], "zotero": ["PKM"]}})
    );
    assert_eq!(value[0]["entries"][0]["token"], "pkm");
    assert_eq!(value[0]["entries"][0]["zotero"][1]["meta"]["type"], 1);
}

#[tokio::test]
async fn suggestions_use_cached_tags_when_present() {
    let remote = FakeLibrary::new(1);
    remote.set_tags("users/42/tags", vec![tag("rust", 0)]);
    let dir = TempDir::new().unwrap();
    let syncer = file_syncer(&remote, &dir);
    syncer.sync_tags(&library()).await.unwrap();
    let calls = remote.calls().len();

    remote.set_offline(true);
    let buckets = syncer
        .tag_suggestions(&library(), &PageIndex::default())
        .await
        .unwrap();

    assert_eq!(buckets.len(), 1);
    assert_eq!(remote.calls().len(), calls);
}
