use crate::{
    abstract_trait::media::DynMediaUploader,
    config::Config,
    di::{DependenciesInject, DependenciesInjectDeps},
    media::CloudinaryUploader,
    middleware::multipart::UploadDir,
};
use anyhow::{Context, Result};
use axum::extract::FromRef;
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynHashing,
    config::{ConnectionPool, Hashing},
    utils::{SystemMetrics, run_metrics_collector},
};
use std::{fmt, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub di_container: DependenciesInject,
    pub upload_dir: PathBuf,
    pub registry: Arc<Mutex<Registry>>,
    pub system_metrics: Arc<SystemMetrics>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("deps", &self.di_container)
            .field("upload_dir", &self.upload_dir)
            .field("system_metrics", &self.system_metrics)
            .finish()
    }
}

impl AppState {
    pub async fn new(pool: ConnectionPool, config: &Config) -> Result<Self> {
        let hashing = Arc::new(Hashing::new()) as DynHashing;
        let media = Arc::new(
            CloudinaryUploader::new(config.cloudinary.clone())
                .context("Failed to create Cloudinary uploader")?,
        ) as DynMediaUploader;

        let mut registry = Registry::default();

        let deps = DependenciesInjectDeps {
            pool,
            hash: hashing,
            media,
        };

        let di_container = DependenciesInject::new(deps, &mut registry)
            .context("Failed to initialize dependency injection container")?;

        let state = Self::with_dependencies(di_container, config.upload_dir.clone(), registry);

        tokio::spawn(run_metrics_collector(state.system_metrics.clone()));

        Ok(state)
    }

    /// Assembles the state around an already built container.
    pub fn with_dependencies(
        di_container: DependenciesInject,
        upload_dir: PathBuf,
        mut registry: Registry,
    ) -> Self {
        let system_metrics = Arc::new(SystemMetrics::new());
        system_metrics.register(&mut registry);

        Self {
            di_container,
            upload_dir,
            registry: Arc::new(Mutex::new(registry)),
            system_metrics,
        }
    }
}

impl FromRef<Arc<AppState>> for UploadDir {
    fn from_ref(state: &Arc<AppState>) -> Self {
        UploadDir(state.upload_dir.clone())
    }
}
