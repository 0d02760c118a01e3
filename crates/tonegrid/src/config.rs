use crate::events::AppEvent;
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sectors::grid::{MAX_CIRCUMFERENTIAL_DIVISIONS, MAX_RADIAL_DIVISIONS};
use sectors::{GridConfig, GridConfigError, LearningConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Durable user settings, kept in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_radial_divisions")]
    pub radial_divisions: u32,
    #[serde(default = "default_circumferential_divisions")]
    pub circumferential_divisions: u32,
    #[serde(default)]
    pub show_colors: bool,
    #[serde(default)]
    pub learning: LearningConfig,
}

fn default_radial_divisions() -> u32 {
    GridConfig::default().radial_divisions()
}

fn default_circumferential_divisions() -> u32 {
    GridConfig::default().circumferential_divisions()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            radial_divisions: default_radial_divisions(),
            circumferential_divisions: default_circumferential_divisions(),
            show_colors: false,
            learning: LearningConfig::default(),
        }
    }
}

impl Settings {
    /// Out-of-range stored values fall back to their defaults.
    fn sanitized(mut self) -> Self {
        if !(1..=MAX_RADIAL_DIVISIONS).contains(&self.radial_divisions) {
            log::warn!(
                "Ignoring radial_divisions = {}, using {}",
                self.radial_divisions,
                default_radial_divisions()
            );
            self.radial_divisions = default_radial_divisions();
        }
        if !(1..=MAX_CIRCUMFERENTIAL_DIVISIONS).contains(&self.circumferential_divisions) {
            log::warn!(
                "Ignoring circumferential_divisions = {}, using {}",
                self.circumferential_divisions,
                default_circumferential_divisions()
            );
            self.circumferential_divisions = default_circumferential_divisions();
        }
        self
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig::new(self.radial_divisions, self.circumferential_divisions).unwrap_or_default()
    }

    pub fn set_grid(&mut self, grid: GridConfig) {
        self.radial_divisions = grid.radial_divisions();
        self.circumferential_divisions = grid.circumferential_divisions();
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Validates the two numeric inputs of the settings panel.
pub fn parse_grid_input(radial: &str, circumferential: &str) -> Result<GridConfig, GridConfigError> {
    let radial = radial
        .trim()
        .parse()
        .map_err(|_| GridConfigError::RadialOutOfRange(0))?;
    let circumferential = circumferential
        .trim()
        .parse()
        .map_err(|_| GridConfigError::CircumferentialOutOfRange(0))?;
    GridConfig::new(radial, circumferential)
}

pub fn get_config_path() -> Result<std::path::PathBuf, SettingsError> {
    let proj_dirs = ProjectDirs::from("org", "tonegrid", "tonegrid")
        .ok_or(SettingsError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

fn deserialize(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Settings, SettingsError> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    Ok(settings.sanitized())
}

pub fn load_settings() -> Result<Settings, SettingsError> {
    let config_path = get_config_path()?;

    deserialize(
        config::Config::builder()
            .add_source(config::File::from(config_path).required(false))
            .add_source(config::Environment::with_prefix("TONEGRID")),
    )
}

pub fn load_or_default() -> Settings {
    match load_settings() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Using default settings: {}", e);
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<std::path::PathBuf, SettingsError> {
    let path = get_config_path()?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(&path, toml::to_string_pretty(settings)?)?;
    Ok(path)
}

/// Whether a watcher event on the config directory concerns the settings file.
fn touches_settings(event: &notify::Event, settings_path: &std::path::Path) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| p == settings_path)
}

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) if touches_settings(&event, &config_path) => {
                log::debug!("Settings file changed: {:?}", event.kind);
                if tx.send(AppEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectors::Modality;

    fn from_toml(s: &str) -> Settings {
        deserialize(
            config::Config::builder().add_source(config::File::from_str(s, config::FileFormat::Toml)),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = from_toml("");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.grid(), GridConfig::default());
        assert!(!settings.show_colors);
    }

    #[test]
    fn test_values_are_read() {
        let settings = from_toml(
            r#"
radial_divisions = 8
circumferential_divisions = 12
show_colors = true

[learning]
cues = ["Tone", "colour"]
recalls = ["spatial"]
"#,
        );
        assert_eq!(settings.grid(), GridConfig::new(8, 12).unwrap());
        assert!(settings.show_colors);
        assert_eq!(
            settings.learning,
            LearningConfig::new([Modality::Piano, Modality::Color], [Modality::Spatial])
        );
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let settings = from_toml("radial_divisions = 9\ncircumferential_divisions = 0\n");
        assert_eq!(settings.radial_divisions, 3);
        assert_eq!(settings.circumferential_divisions, 8);
    }

    #[test]
    fn test_saved_form_reads_back() {
        let mut settings = Settings::default();
        settings.set_grid(GridConfig::new(5, 20).unwrap());
        settings.show_colors = true;

        let encoded = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(from_toml(&encoded), settings);
    }

    #[test]
    fn test_only_settings_file_changes_reload() {
        use notify::event::{AccessKind, CreateKind, ModifyKind};
        let path = std::path::Path::new("/cfg/tonegrid/config.toml");
        let event = |kind, p: &str| notify::Event::new(kind).add_path(p.into());

        assert!(touches_settings(
            &event(EventKind::Modify(ModifyKind::Any), "/cfg/tonegrid/config.toml"),
            path
        ));
        assert!(touches_settings(
            &event(EventKind::Create(CreateKind::File), "/cfg/tonegrid/config.toml"),
            path
        ));
        assert!(!touches_settings(
            &event(EventKind::Modify(ModifyKind::Any), "/cfg/tonegrid/config.toml.swp"),
            path
        ));
        assert!(!touches_settings(
            &event(EventKind::Access(AccessKind::Any), "/cfg/tonegrid/config.toml"),
            path
        ));
    }

    #[test]
    fn test_grid_input_validation() {
        assert_eq!(parse_grid_input(" 4 ", "12"), GridConfig::new(4, 12));
        assert_eq!(
            parse_grid_input("abc", "12").unwrap_err().to_string(),
            "Please enter a valid number for Radial Divisions (1-8)."
        );
        assert_eq!(
            parse_grid_input("3", "-1"),
            Err(GridConfigError::CircumferentialOutOfRange(0))
        );
        assert_eq!(
            parse_grid_input("3", "21"),
            Err(GridConfigError::CircumferentialOutOfRange(21))
        );
    }
}
