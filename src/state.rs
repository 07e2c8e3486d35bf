use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::Config;
use crate::db::Store;
use crate::files::StreamWrappers;
use crate::files::archive::DocumentArchiver;
use crate::handlers::HandlerRegistry;
use crate::handlers::case_management::CaseManagementHandler;
use crate::handlers::document::DocumentHandler;
use crate::handlers::electoral::ElectoralServicesHandler;
use crate::handlers::grant::GrantDocumentHandler;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub handlers: HandlerRegistry,
    pub http: reqwest::Client,
    pub wrappers: StreamWrappers,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config, clock: Arc<dyn Clock>) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        let wrappers = StreamWrappers::from_config(&config.files);
        let archiver = Arc::new(DocumentArchiver::new(wrappers.clone()));

        let mut handlers = HandlerRegistry::new();
        handlers.register(Arc::new(CaseManagementHandler::new(
            http.clone(),
            store.clone(),
            config.case_management.clone(),
            &config.base_url,
            clock.clone(),
        )));
        handlers.register(Arc::new(DocumentHandler::new(archiver.clone(), store.clone())));
        handlers.register(Arc::new(GrantDocumentHandler::new(
            archiver,
            store.clone(),
            &config.files.retrieval_folder,
        )));
        handlers.register(Arc::new(ElectoralServicesHandler::new(
            wrappers.clone(),
            store.clone(),
            clock.clone(),
        )));

        Ok(Self {
            store,
            config,
            handlers,
            http,
            wrappers,
            clock,
        })
    }
}
