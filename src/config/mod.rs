//! Invocation settings resolved from flags, environment and profile file.

mod settings;

pub use settings::{
    CACHE_FILE_NAME, Credentials, Settings, SettingsSource, default_cache_dir, load_profile, profile_path,
    read_password_file,
};
