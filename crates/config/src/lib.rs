// Configuration loading

pub mod settings;

pub use settings::{
    ClipboardSettings, GridSettings, NavigationSettings, RowSettings, SearchSettings,
    SettingsError, TextDirection, ViewportSettings,
};
