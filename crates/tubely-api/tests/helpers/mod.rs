//! Test helpers: build AppState and router for integration tests.
//!
//! The router is the real one from `setup::routes`; the database, object store and
//! media tools are replaced by in-memory doubles so no Postgres, S3 or ffmpeg is needed.
//! Run with `cargo test -p tubely-api`.

#![allow(dead_code)]

pub mod doubles;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_test::TestServer;
use chrono::Utc;
use tempfile::TempDir;
use tubely_api::auth::JwtService;
use tubely_api::setup::routes;
use tubely_api::state::AppState;
use tubely_core::{BaseConfig, Config, MediaConfig, StorageBackend, StorageConfig, Video};
use uuid::Uuid;

use doubles::{CopyRemuxer, FixedProber, MemoryStorage, MemoryVideos};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_BUCKET: &str = "tubely-test";
pub const TEST_REGION: &str = "us-east-2";
pub const TEST_PORT: u16 = 8091;

pub fn create_test_config(scratch_dir: &Path, assets_root: &Path, environment: &str) -> Config {
    Config {
        base: BaseConfig {
            server_port: TEST_PORT,
            environment: environment.to_string(),
            cors_origins: vec!["*".to_string()],
            jwt_secret: TEST_JWT_SECRET.to_string(),
        },
        database_url: "postgres://unused".to_string(),
        storage: StorageConfig {
            backend: StorageBackend::S3,
            s3_bucket: Some(TEST_BUCKET.to_string()),
            s3_region: Some(TEST_REGION.to_string()),
            s3_endpoint: None,
            local_storage_path: None,
            local_storage_base_url: None,
        },
        media: MediaConfig {
            max_video_size_bytes: 1024 * 1024,
            video_allowed_content_types: vec!["video/mp4".to_string()],
            max_thumbnail_size_bytes: 64 * 1024,
            thumbnail_allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
            ],
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            media_tool_timeout_secs: 5,
            scratch_dir: Some(scratch_dir.to_path_buf()),
            assets_root: assets_root.to_path_buf(),
        },
    }
}

/// Test application: server plus handles on every double.
pub struct TestApp {
    pub server: TestServer,
    pub videos: Arc<MemoryVideos>,
    pub storage: Arc<MemoryStorage>,
    pub prober: Arc<FixedProber>,
    pub remuxer: Arc<CopyRemuxer>,
    pub scratch: TempDir,
    pub assets: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files left behind in the scratch directory.
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch.path())
            .expect("Failed to read scratch dir")
            .map(|e| e.expect("Failed to read entry").path())
            .collect()
    }

    /// Insert a video owned by `user_id` and return it.
    pub fn seed_video(&self, user_id: Uuid) -> Video {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            user_id,
            title: "Boots".to_string(),
            description: Some("A pair of boots".to_string()),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        };
        self.videos.insert(video.clone());
        video
    }
}

pub struct TestAppBuilder {
    prober: FixedProber,
    storage: MemoryStorage,
    videos: MemoryVideos,
    remuxer: CopyRemuxer,
    environment: String,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            prober: FixedProber::landscape(),
            storage: MemoryStorage::new(TEST_BUCKET, TEST_REGION),
            videos: MemoryVideos::default(),
            remuxer: CopyRemuxer::default(),
            environment: "test".to_string(),
        }
    }
}

impl TestAppBuilder {
    pub fn with_prober(mut self, prober: FixedProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn environment(mut self, environment: &str) -> Self {
        self.environment = environment.to_string();
        self
    }

    pub fn failing_remuxer(mut self) -> Self {
        self.remuxer = CopyRemuxer::failing();
        self
    }

    pub fn failing_storage(mut self) -> Self {
        self.storage = self.storage.failing();
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.videos = self.videos.failing_updates();
        self
    }

    pub fn build(self) -> TestApp {
        let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
        let assets = tempfile::tempdir().expect("Failed to create assets dir");
        let config = create_test_config(scratch.path(), assets.path(), &self.environment);

        let videos = Arc::new(self.videos);
        let storage = Arc::new(self.storage);
        let prober = Arc::new(self.prober);
        let remuxer = Arc::new(self.remuxer);

        let state = Arc::new(AppState::new(
            config,
            videos.clone(),
            storage.clone(),
            prober.clone(),
            remuxer.clone(),
        ));
        let router = routes::build_router(state).expect("Failed to build router");
        let server = TestServer::new(router).expect("Failed to create test server");

        TestApp {
            server,
            videos,
            storage,
            prober,
            remuxer,
            scratch,
            assets,
        }
    }
}

pub fn setup_test_app() -> TestApp {
    TestAppBuilder::default().build()
}

/// A valid bearer token for `user_id`.
pub fn token_for(user_id: Uuid) -> String {
    JwtService::new(TEST_JWT_SECRET)
        .issue_token(user_id, chrono::Duration::hours(1))
        .expect("Failed to issue token")
}

pub fn bearer(user_id: Uuid) -> String {
    format!("Bearer {}", token_for(user_id))
}
