use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use anyhow::Context;
use debounce::EventDebouncer;
use log::{error, warn};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

pub struct ConfigManager<T> {
    path: PathBuf,
    current: Arc<RwLock<T>>,
    debouncer: debounce::EventDebouncer<UpdateConfigEvent>,
}

const CONFIG_DEBOUNCE_DURATION_MS: u64 = 200;

pub trait Config:
    Sized + Default + Clone + Send + Sync + Serialize + for<'a> Deserialize<'a> + 'static
{
    fn get_path() -> &'static str;

    fn is_valid(&self) -> bool {
        true
    }

    fn create_manager() -> anyhow::Result<ConfigManager<Self>> {
        Self::create_manager_in(Path::new("."))
    }

    /// Like [`Config::create_manager`], with the file resolved relative to `directory`.
    fn create_manager_in(directory: &Path) -> anyhow::Result<ConfigManager<Self>> {
        let path = directory.join(Self::get_path());
        let mut manager = ConfigManager::new(path.clone());
        manager
            .load_if_exists()
            .with_context(|| format!("Failed to load config from {:?}", path))?;
        Ok(manager)
    }
}

#[derive(Clone, Copy, PartialEq)]
struct UpdateConfigEvent;

fn write_config<T: Config>(path: &Path, config: &T) -> anyhow::Result<()> {
    let serialized = ron::ser::to_string_pretty(config, PrettyConfig::default())
        .context("Failed to serialize config")?;
    let mut writer =
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    writer.write_all(serialized.as_bytes())?;
    Ok(())
}

impl<T> ConfigManager<T>
where
    T: Config,
{
    pub fn new(path: PathBuf) -> Self {
        let current = Arc::new(RwLock::new(T::default()));
        let current_clone = current.clone();
        let path_clone = path.clone();

        let write_event = move |_event: UpdateConfigEvent| {
            let config = current_clone
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();

            if !config.is_valid() {
                warn!("Attempted to write invalid config to {:?}", &path_clone);
                return;
            }

            if let Err(err) = write_config(&path_clone, &config) {
                error!("Failed to save config: {:#}", err);
            }
        };

        Self {
            path,
            current,
            debouncer: EventDebouncer::new(
                Duration::from_millis(CONFIG_DEBOUNCE_DURATION_MS),
                write_event,
            ),
        }
    }

    pub fn get(&self) -> Arc<RwLock<T>> {
        self.current.clone()
    }

    /// Copy of the current value.
    pub fn snapshot(&self) -> T {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file if present. A file that parses but fails validation is
    /// ignored with a warning and the defaults stay in place.
    pub fn load_if_exists(&mut self) -> anyhow::Result<()> {
        if self.path.exists() {
            let config_data = std::fs::read_to_string(&self.path)?;

            if config_data.is_empty() {
                return Ok(());
            }

            let config: T = ron::from_str(&config_data)
                .with_context(|| format!("Failed to parse config from {:?}", &self.path))?;

            if !config.is_valid() {
                warn!("Ignoring invalid config in {:?}", &self.path);
                return Ok(());
            }

            self.current
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clone_from(&config);
        }
        Ok(())
    }

    pub fn update_and_save<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut T),
    {
        {
            let mut config = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            update_fn(&mut *config);
        }
        self.debouncer.put(UpdateConfigEvent);
    }

    /// Writes the current value immediately, bypassing the debouncer.
    pub fn save_now(&self) -> anyhow::Result<()> {
        let config = self.snapshot();
        anyhow::ensure!(config.is_valid(), "Refusing to save invalid config");
        write_config(&self.path, &config)
    }
}
