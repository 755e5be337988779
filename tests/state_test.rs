mod common;

use assert2::{check, let_assert};
use common::{CorpusWorkspace, SAMPLE_CORPUS, corpus_workspace, empty_workspace};
use mdsearch::cache::{load_from_path, save_to_path};
use mdsearch::schema::{Document, FieldSchema};
use mdsearch::search::{BuiltIndex, Filters};
use mdsearch::state::load_or_build;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_use_builds_and_caches(corpus_workspace: CorpusWorkspace) {
    let state = corpus_workspace.state();
    check!(state.current().await.is_none());
    check!(!corpus_workspace.cache_path().exists());

    let index = state.index().await.unwrap();
    check!(index.len() == SAMPLE_CORPUS.len());
    check!(corpus_workspace.cache_path().exists());

    let filenames: Vec<_> = index.documents().iter().map(Document::filename).collect();
    let expected: Vec<_> = SAMPLE_CORPUS.iter().map(|(name, _)| *name).collect();
    check!(filenames == expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_calls_share_one_index(corpus_workspace: CorpusWorkspace) {
    let state = corpus_workspace.state();
    let first = state.index().await.unwrap();
    let second = state.index().await.unwrap();
    check!(Arc::ptr_eq(&first, &second));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_state_loads_from_cache(corpus_workspace: CorpusWorkspace) {
    let built = corpus_workspace.state().index().await.unwrap();
    let cached = load_from_path(corpus_workspace.cache_path()).unwrap();
    check!(cached == *built);

    let reloaded = corpus_workspace.state().index().await.unwrap();
    check!(*reloaded == *built);
}

#[rstest]
fn cache_hit_skips_rebuild(corpus_workspace: CorpusWorkspace) {
    let config = &corpus_workspace.config;
    let built = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();
    let modified = std::fs::metadata(&config.cache_path)
        .and_then(|m| m.modified())
        .unwrap();

    let loaded = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();
    let modified_again = std::fs::metadata(&config.cache_path)
        .and_then(|m| m.modified())
        .unwrap();

    check!(loaded == built);
    check!(modified == modified_again);
}

#[rstest]
fn changed_corpus_invalidates_cache(corpus_workspace: CorpusWorkspace) {
    let config = &corpus_workspace.config;
    let before = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();

    corpus_workspace.create_doc("servers/prompts.md", "# Prompts\n\nPrompt templates.\n");
    let after = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();

    check!(after.len() == before.len() + 1);
    check!(after.fingerprint() != before.fingerprint());
    check!(load_from_path(&config.cache_path).unwrap() == after);
}

#[rstest]
fn corrupt_cache_is_rebuilt_and_overwritten(corpus_workspace: CorpusWorkspace) {
    let config = &corpus_workspace.config;
    corpus_workspace
        .workspace
        .create_file("cache/index.bin", b"\x00\x01garbage");

    let index = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();
    check!(index.len() == SAMPLE_CORPUS.len());

    let_assert!(Ok(reloaded) = load_from_path(&config.cache_path));
    check!(reloaded == index);
}

#[rstest]
fn missing_corpus_serves_valid_cache(corpus_workspace: CorpusWorkspace) {
    let config = &corpus_workspace.config;
    let built = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();

    corpus_workspace.workspace.remove_dir("docs");
    let served = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();
    check!(served == built);
}

#[rstest]
fn missing_corpus_without_cache_fails(corpus_workspace: CorpusWorkspace) {
    let config = &corpus_workspace.config;
    corpus_workspace.workspace.remove_dir("docs");

    let_assert!(Err(e) = load_or_build(&config.corpus_dir, &config.cache_path));
    check!(format!("{:#}", e).contains("Corpus directory does not exist"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_corpus_builds_empty_index(empty_workspace: CorpusWorkspace) {
    let index = empty_workspace.state().index().await.unwrap();
    check!(index.is_empty());
    check!(index.search("anything", &Filters::new(), 5).unwrap().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rebuild_swaps_without_touching_readers(corpus_workspace: CorpusWorkspace) {
    let state = corpus_workspace.state();
    let old = state.index().await.unwrap();
    let old_hits = old.search("prompt", &Filters::new(), 5).unwrap().len();
    check!(old_hits == 0);

    corpus_workspace.create_doc("servers/prompts.md", "# Prompts\n\nA prompt template.\n");
    let new = state.rebuild().await.unwrap();

    check!(!Arc::ptr_eq(&old, &new));
    check!(old.len() == SAMPLE_CORPUS.len());
    check!(old.search("prompt", &Filters::new(), 5).unwrap().is_empty());
    check!(new.search("prompt", &Filters::new(), 5).unwrap().len() == 1);

    let_assert!(Some(current) = state.current().await);
    check!(Arc::ptr_eq(&current, &new));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replace_returns_previous_index(corpus_workspace: CorpusWorkspace) {
    let state = corpus_workspace.state();
    let original = state.index().await.unwrap();

    let replacement = Arc::new(BuiltIndex::fit(
        FieldSchema::markdown(),
        [Document::new().with("filename", "x.md").with("content", "x")],
    ));
    let_assert!(Some(previous) = state.replace(Arc::clone(&replacement)).await);
    check!(Arc::ptr_eq(&previous, &original));
    check!(Arc::ptr_eq(&state.index().await.unwrap(), &replacement));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_calls_build_once(corpus_workspace: CorpusWorkspace) {
    let state = corpus_workspace.state();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.index().await.unwrap() })
        })
        .collect();

    let mut indexes = Vec::new();
    for handle in handles {
        indexes.push(handle.await.unwrap());
    }

    for index in &indexes[1..] {
        check!(Arc::ptr_eq(index, &indexes[0]));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_searches_during_rebuild(corpus_workspace: CorpusWorkspace) {
    let state = corpus_workspace.state();
    state.index().await.unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                for _ in 0..20 {
                    let index = state.index().await.unwrap();
                    let hits = index.search("server", &Filters::new(), 10).unwrap();
                    assert!(!hits.is_empty());
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    state.rebuild().await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[rstest]
fn snapshot_written_elsewhere_is_stale_for_other_corpus(corpus_workspace: CorpusWorkspace) {
    let config = &corpus_workspace.config;
    let unrelated = BuiltIndex::fit(
        FieldSchema::markdown(),
        [Document::new().with("filename", "other.md").with("content", "unrelated")],
    );
    save_to_path(&unrelated, &config.cache_path).unwrap();

    let index = load_or_build(&config.corpus_dir, &config.cache_path).unwrap();
    check!(index.len() == SAMPLE_CORPUS.len());
    check!(index.search("unrelated", &Filters::new(), 5).unwrap().is_empty());
}
