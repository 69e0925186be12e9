use mood_core::catalog::{CatalogBuilder, CatalogSource};
use mood_core::classifier::MoodClassifier;
use mood_core::issuer::AccessLinkIssuer;
use mood_core::models::FALLBACK_MARKER;
use mood_core::moods::Mood;
use mood_core::pipeline::{MusicService, RecommendError, RefreshMode};
use mood_core::selector::SelectionError;
use providers::{JsonCompletion, JsonPrompt, LlmProvider, ProviderError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use storage::memory::MemoryStore;
use storage::ObjectStore;
use tempfile::tempdir;

const FOREST_SCENE: &str = "주인공이 숲 속을 탐험하며 여관을 찾아 나선다";

struct Scripted(String);

#[async_trait::async_trait]
impl LlmProvider for Scripted {
    async fn complete_json(&self, _prompt: &JsonPrompt) -> Result<JsonCompletion, ProviderError> {
        Ok(JsonCompletion {
            content: self.0.clone(),
        })
    }
}

struct Stalled;

#[async_trait::async_trait]
impl LlmProvider for Stalled {
    async fn complete_json(&self, _prompt: &JsonPrompt) -> Result<JsonCompletion, ProviderError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(ProviderError::RequestFailed("too late".into()))
    }
}

fn answer(primary: &str, secondary: &str, intensity: f64) -> Arc<dyn LlmProvider> {
    Arc::new(Scripted(
        serde_json::json!({
            "primary_mood": primary,
            "secondary_mood": secondary,
            "intensity": intensity,
            "emotional_tags": ["모험"],
            "reasoning": "scripted"
        })
        .to_string(),
    ))
}

fn library() -> MemoryStore {
    MemoryStore::new("scene-music").with_objects([
        "Fantasy_mp3/Elven Glade.mp3",
        "Fantasy_mp3/Crystal Cave.mp3",
        "World_mp3/Desert Caravan.mp3",
        "Miscellaneous_World_Folk_mp3/Village Dance.mp3",
        "Miscellaneous_Chill_mp3/Lazy Afternoon.mp3",
        "Horror_mp3/Creaking Door.mp3",
        "Underscoring_mp3/Quiet Pulse.mp3",
        "Epic_Dramatic_mp3/Last Stand.mp3",
    ])
}

async fn service(provider: Arc<dyn LlmProvider>, store: MemoryStore, timeout: Duration) -> MusicService {
    let store: Arc<dyn ObjectStore> = Arc::new(store);
    let issuer = AccessLinkIssuer::new(store.clone(), "scene-music", Duration::from_secs(3600)).unwrap();
    MusicService::start(
        MoodClassifier::new(provider, timeout),
        CatalogBuilder::for_mood_table(),
        store,
        issuer,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn forest_exploration_scene_gets_exploration_track() {
    let svc = service(answer("exploration", "peaceful", 0.65), library(), Duration::from_secs(5)).await;
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..20 {
        let rec = svc.recommend_with_rng(FOREST_SCENE, &mut rng).await.unwrap();
        assert_eq!(rec.analysis.primary_mood, Mood::Exploration);
        assert_eq!(rec.analysis.secondary_mood, Some(Mood::Peaceful));
        assert_eq!(rec.analysis.intensity, 0.65);
        assert_eq!(rec.music.mood, Mood::Exploration);
        let folder = rec.music.file_path.split('/').next().unwrap();
        assert!(Mood::Exploration.folders().contains(&folder), "{folder}");
    }
}

#[tokio::test]
async fn streaming_url_matches_selected_track() {
    let svc = service(answer("exploration", "peaceful", 0.65), library(), Duration::from_secs(5)).await;
    let rec = svc
        .recommend_with_rng(FOREST_SCENE, &mut StdRng::seed_from_u64(5))
        .await
        .unwrap();
    let encoded = storage::encode_object_path(&rec.music.file_path);
    assert!(rec
        .music
        .streaming_url
        .starts_with(&format!("memory://scene-music/{encoded}?")));
    assert!(rec.music.file_path.ends_with(&rec.music.filename));
}

#[tokio::test]
async fn classifier_timeout_uses_peaceful_fallback() {
    let svc = service(Arc::new(Stalled), library(), Duration::from_millis(50)).await;
    let rec = svc
        .recommend_with_rng("어두운 복도", &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    assert_eq!(rec.analysis.primary_mood, Mood::Peaceful);
    assert_eq!(rec.analysis.intensity, 0.5);
    assert!(rec.analysis.reasoning.starts_with(FALLBACK_MARKER));
    assert_eq!(rec.music.file_path, "Miscellaneous_Chill_mp3/Lazy Afternoon.mp3");
}

#[tokio::test]
async fn curiosity_scene_is_not_served_horror() {
    let svc = service(answer("horror", "", 0.8), library(), Duration::from_secs(5)).await;
    let rec = svc
        .recommend_with_rng("호기심에 이끌려 오래된 저택의 문을 연다", &mut StdRng::seed_from_u64(9))
        .await
        .unwrap();
    assert_eq!(rec.analysis.primary_mood, Mood::Mysterious);
    assert!(!rec.music.file_path.starts_with("Horror_mp3/"));
}

#[tokio::test]
async fn empty_primary_and_default_is_no_tracks() {
    let store = MemoryStore::new("scene-music").with_objects(["Epic_Dramatic_mp3/Last Stand.mp3"]);
    let svc = service(answer("horror", "", 0.9), store, Duration::from_secs(5)).await;
    let err = svc
        .recommend_with_rng("공포가 엄습한다", &mut StdRng::seed_from_u64(2))
        .await
        .unwrap_err();
    match err {
        RecommendError::Selection(SelectionError::NoTracksAvailable { tried }) => {
            assert_eq!(tried, vec![Mood::Horror, Mood::Peaceful]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn blank_scene_is_rejected() {
    let svc = service(answer("peaceful", "", 0.2), library(), Duration::from_secs(5)).await;
    assert!(matches!(
        svc.recommend("   ").await,
        Err(RecommendError::EmptyScene)
    ));
}

#[tokio::test]
async fn signing_failure_is_surfaced() {
    let svc = service(answer("exploration", "", 0.5), library().fail_signing(), Duration::from_secs(5)).await;
    assert!(matches!(
        svc.recommend(FOREST_SCENE).await,
        Err(RecommendError::Issuance(_))
    ));
}

#[tokio::test]
async fn unavailable_listing_halts_startup() {
    let store: Arc<dyn ObjectStore> = Arc::new(library().fail_listing("Horror_mp3"));
    let issuer = AccessLinkIssuer::new(store.clone(), "scene-music", Duration::from_secs(60)).unwrap();
    let result = MusicService::start(
        MoodClassifier::new(answer("peaceful", "", 0.1), Duration::from_secs(5)),
        CatalogBuilder::for_mood_table(),
        store,
        issuer,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn live_refresh_replaces_snapshot_catalog() {
    let temp = tempdir().unwrap();
    let snapshot = temp.path().join("gcs_music_files.json");
    fs::write(&snapshot, r#"["Horror_mp3/Only Snapshot.mp3"]"#).unwrap();

    let store: Arc<dyn ObjectStore> = Arc::new(library());
    let issuer = AccessLinkIssuer::new(store.clone(), "scene-music", Duration::from_secs(60)).unwrap();
    let svc = MusicService::start(
        MoodClassifier::new(answer("horror", "", 0.9), Duration::from_secs(5)),
        CatalogBuilder::for_mood_table().with_snapshot(&snapshot),
        store,
        issuer,
    )
    .await
    .unwrap();
    assert_eq!(
        svc.catalog().tracks("Horror_mp3").unwrap()[0].filename,
        "Only Snapshot.mp3"
    );
    assert_eq!(svc.catalog().source(), CatalogSource::Live);

    let stats = svc.refresh_catalog(RefreshMode::LiveOnly).await.unwrap();
    assert_eq!(stats.total_tracks, 8);
    assert_eq!(
        svc.catalog().tracks("Horror_mp3").unwrap()[0].filename,
        "Creaking Door.mp3"
    );

    let health = svc.health();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.bucket, "scene-music");
    assert_eq!(health.total_files, 8);
    assert_eq!(svc.moods().len(), 19);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_catalog() {
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("b").fail_listing("Horror_mp3"));
    let issuer = AccessLinkIssuer::new(store.clone(), "b", Duration::from_secs(60)).unwrap();
    let mut folders = std::collections::BTreeMap::new();
    folders.insert(
        "Horror_mp3".to_string(),
        vec![mood_core::models::Track::new("Horror_mp3", "kept.mp3")],
    );
    let svc = MusicService::with_catalog(
        MoodClassifier::new(answer("horror", "", 0.9), Duration::from_secs(5)),
        mood_core::catalog::Catalog::new(folders, CatalogSource::Cached),
        CatalogBuilder::for_mood_table(),
        store,
        issuer,
    );
    assert!(svc.refresh_catalog(RefreshMode::LiveOnly).await.is_err());
    assert_eq!(svc.catalog().total_tracks(), 1);
    assert_eq!(svc.health().total_files, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_partial_catalog_during_refresh() {
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("b").with_objects(
        (0..40)
            .map(|i| format!("Horror_mp3/new-{i}.mp3"))
            .chain((0..20).map(|i| format!("Miscellaneous_Chill_mp3/new-{i}.mp3"))),
    ));
    let issuer = AccessLinkIssuer::new(store.clone(), "b", Duration::from_secs(60)).unwrap();
    let mut folders = std::collections::BTreeMap::new();
    folders.insert(
        "Horror_mp3".to_string(),
        (0..3)
            .map(|i| mood_core::models::Track::new("Horror_mp3", &format!("old-{i}.mp3")))
            .collect::<Vec<_>>(),
    );
    folders.insert(
        "Miscellaneous_Chill_mp3".to_string(),
        vec![mood_core::models::Track::new("Miscellaneous_Chill_mp3", "old-0.mp3")],
    );
    let svc = Arc::new(MusicService::with_catalog(
        MoodClassifier::new(answer("horror", "", 0.9), Duration::from_secs(5)),
        mood_core::catalog::Catalog::new(folders, CatalogSource::Cached),
        CatalogBuilder::new(["Horror_mp3", "Miscellaneous_Chill_mp3"]),
        store,
        issuer,
    ));

    let analysis = mood_core::models::SceneAnalysis::new(Mood::Horror, None, 0.9, vec![], "");
    let mut readers = Vec::new();
    for seed in 0..4u64 {
        let svc = svc.clone();
        let analysis = analysis.clone();
        readers.push(tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..500 {
                let catalog = svc.catalog();
                let generation = match catalog.total_tracks() {
                    4 => "old-",
                    60 => "new-",
                    other => panic!("reader saw a catalog with {other} tracks"),
                };
                for folder in ["Horror_mp3", "Miscellaneous_Chill_mp3"] {
                    assert!(catalog
                        .tracks(folder)
                        .unwrap()
                        .iter()
                        .all(|t| t.filename.starts_with(generation)));
                }
                let sel = mood_core::selector::select_track(&analysis, &catalog, &mut rng).unwrap();
                assert!(sel.track.filename.starts_with(generation));
                tokio::task::yield_now().await;
            }
        }));
    }

    let refresher = {
        let svc = svc.clone();
        tokio::spawn(async move {
            for _ in 0..10 {
                svc.refresh_catalog(RefreshMode::LiveOnly).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };
    refresher.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(svc.catalog().total_tracks(), 60);
}
