//! Wiring shared by every subcommand.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use log::info;

use photopipe::{
    load_config, CommandTools, Config, ContentStorage, Database, MediaEventBroadcaster,
    MediaRepository, ProcessingContext, ProcessingSettings, ProcessorRegistry, StageTable,
    StateMachine,
};
use photopipe::worker::JobScheduler;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

/// Loaded configuration plus the long-lived collaborators built from it.
pub struct App {
    pub config: Config,
    pub db: Database,
    pub records: Arc<MediaRepository>,
    pub content: Arc<ContentStorage>,
    pub events: MediaEventBroadcaster,
}

impl App {
    pub fn load(config_path: &Path) -> CliResult<Self> {
        let config = load_config(config_path)?;
        let db_path = config
            .database_path()
            .ok_or("Could not determine a database path; set database_path in the config")?;
        let db = Database::open(&db_path)?;
        info!("Using media root {}", config.media_root.display());

        Ok(Self {
            records: Arc::new(MediaRepository::new(db.clone())),
            content: Arc::new(ContentStorage::new(&config.media_root)),
            events: MediaEventBroadcaster::new(config.events.capacity),
            db,
            config,
        })
    }

    pub fn context(&self) -> ProcessingContext {
        ProcessingContext::new(
            self.records.clone(),
            self.content.clone(),
            Arc::new(CommandTools::from_config(&self.config.tools)),
            ProcessingSettings::from_config(&self.config),
        )
        .with_events(self.events.clone())
    }

    pub fn state_machine(&self, scheduler: Arc<dyn JobScheduler>) -> CliResult<StateMachine> {
        let registry = ProcessorRegistry::standard()?;
        Ok(StateMachine::new(
            StageTable::standard(),
            &registry,
            self.context(),
            scheduler,
        )?)
    }
}
