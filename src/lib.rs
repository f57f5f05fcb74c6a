pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod contact;
pub mod media;
pub mod store;

use config::Config;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::auth::AuthGate;
use crate::media::ImageStore;
use crate::store::ProjectStore;

pub struct AppState {
    pub config: Config,
    pub projects: ProjectStore,
    pub auth: AuthGate,
    pub images: ImageStore,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let projects = ProjectStore::new(config.projects_file());
        let auth = AuthGate::from_config(&config);
        let images = ImageStore::from_config(&config.uploads);
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            projects,
            auth,
            images,
            rate_limiter,
        }
    }
}
