use crate::catalog::{Catalog, CatalogBuilder, CatalogError, CatalogHandle, CatalogStats};
use crate::classifier::MoodClassifier;
use crate::config::AppConfig;
use crate::issuer::{AccessLinkIssuer, IssuanceError};
use crate::models::{MusicInfo, Recommendation, SceneAnalysis};
use crate::moods::{MoodEntry, MOOD_TABLE};
use crate::rules;
use crate::selector::{self, SelectionError};
use anyhow::Context;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storage::gcs::{GcsConfig, GcsStore};
use storage::ObjectStore;
use thiserror::Error;
use tracing::{info, warn};

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("scene text is empty")]
    EmptyScene,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Issuance(#[from] IssuanceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    SnapshotThenLive,
    LiveOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub bucket: String,
    pub total_files: usize,
    pub catalog: CatalogStats,
}

/// Scene text in, track and streaming URL out.
pub struct MusicService {
    classifier: MoodClassifier,
    catalog: CatalogHandle,
    builder: CatalogBuilder,
    store: Arc<dyn ObjectStore>,
    issuer: AccessLinkIssuer,
}

impl MusicService {
    /// Builds the initial catalog; a catalog that cannot be built stops
    /// start-up.
    pub async fn start(
        classifier: MoodClassifier,
        builder: CatalogBuilder,
        store: Arc<dyn ObjectStore>,
        issuer: AccessLinkIssuer,
    ) -> Result<Self, CatalogError> {
        info!("Building library catalog...");
        let catalog = builder.build(store.as_ref()).await?;
        Ok(Self::with_catalog(classifier, catalog, builder, store, issuer))
    }

    pub fn with_catalog(
        classifier: MoodClassifier,
        catalog: Catalog,
        builder: CatalogBuilder,
        store: Arc<dyn ObjectStore>,
        issuer: AccessLinkIssuer,
    ) -> Self {
        Self {
            classifier,
            catalog: CatalogHandle::new(catalog),
            builder,
            store,
            issuer,
        }
    }

    /// Classification followed by keyword correction.
    pub async fn analyze(&self, scene: &str) -> SceneAnalysis {
        let analysis = self.classifier.classify(scene).await;
        rules::correct(analysis, scene)
    }

    pub async fn recommend(&self, scene: &str) -> Result<Recommendation, RecommendError> {
        let mut rng = StdRng::from_os_rng();
        self.recommend_with_rng(scene, &mut rng).await
    }

    pub async fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        scene: &str,
        rng: &mut R,
    ) -> Result<Recommendation, RecommendError> {
        let scene = scene.trim();
        if scene.is_empty() {
            return Err(RecommendError::EmptyScene);
        }
        info!(chars = scene.chars().count(), "received scene");

        let analysis = self.analyze(scene).await;
        let catalog = self.catalog.current();
        let selection = selector::select_track(&analysis, &catalog, rng)?;
        let link = self.issuer.issue(&selection.track).await?;

        Ok(Recommendation {
            analysis,
            music: MusicInfo {
                mood: selection.mood,
                filename: link.track.filename,
                file_path: link.track.path,
                streaming_url: link.url,
                expires_at: link.expires_at,
            },
        })
    }

    pub fn moods(&self) -> &'static [MoodEntry] {
        &MOOD_TABLE
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.current()
    }

    pub fn health(&self) -> HealthReport {
        let stats = self.catalog.current().stats();
        let status = if stats.total_tracks > 0 {
            "healthy"
        } else {
            "degraded"
        };
        HealthReport {
            status: status.to_string(),
            version: SERVICE_VERSION.to_string(),
            bucket: self.issuer.bucket().to_string(),
            total_files: stats.total_tracks,
            catalog: stats,
        }
    }

    /// Rebuilds the catalog and swaps it in. On failure the current catalog
    /// stays active.
    pub async fn refresh_catalog(&self, mode: RefreshMode) -> Result<CatalogStats, CatalogError> {
        info!(mode = ?mode, "Refreshing library catalog...");
        let fresh = match mode {
            RefreshMode::SnapshotThenLive => self.builder.build(self.store.as_ref()).await,
            RefreshMode::LiveOnly => self.builder.build_live(self.store.as_ref()).await,
        };
        let fresh = match fresh {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "catalog refresh failed, keeping the current catalog");
                return Err(e);
            }
        };
        let stats = fresh.stats();
        self.catalog.replace(fresh);
        info!(tracks = stats.total_tracks, "Catalog refresh complete.");
        Ok(stats)
    }
}

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_llm("noop", Arc::new(NoopProvider));

    if let Some(key) = std::env::var_os("OPENAI_API_KEY") {
        let base = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| config.classifier.base_url.clone());
        match OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base,
            chat_model: config.classifier.model.clone(),
            timeout: config.classifier.timeout(),
        }) {
            Ok(provider) => reg = reg.with_llm("openai", Arc::new(provider)),
            Err(e) => warn!(error = %e, "openai provider unavailable"),
        }
    }

    reg.set_preferred_llm(&config.classifier.provider)
}

pub fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let credentials = config
        .storage
        .credentials_path
        .as_deref()
        .context("storage.credentials_path is not set")?;
    let store = GcsStore::new(GcsConfig {
        bucket: config.storage.bucket.clone(),
        credentials_path: PathBuf::from(credentials),
        timeout: Duration::from_secs(config.storage.request_timeout_secs),
    })
    .context("initialize GCS client")?;
    Ok(Arc::new(store))
}

pub fn build_builder(config: &AppConfig) -> CatalogBuilder {
    let builder = CatalogBuilder::for_mood_table();
    match &config.storage.snapshot_path {
        Some(path) => builder.with_snapshot(path),
        None => builder,
    }
}

/// Wires every component from configuration and builds the first catalog.
pub async fn build_service(
    config: &AppConfig,
    store: Arc<dyn ObjectStore>,
) -> anyhow::Result<MusicService> {
    let registry = build_registry(config);
    let classifier = MoodClassifier::from_registry(&registry, None, config.classifier.timeout())
        .with_temperature(config.classifier.temperature);
    let bucket = store.bucket().to_string();
    let issuer = AccessLinkIssuer::new(store.clone(), &bucket, config.links.ttl()).context("link ttl")?;
    let service = MusicService::start(classifier, build_builder(config), store, issuer)
        .await
        .context("build catalog")?;
    Ok(service)
}
