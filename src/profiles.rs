use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File holding the saved logins inside a profile directory
pub const SIGNONS_DATABASE: &str = "signons.sqlite";

/// Suffix of the profile directories created by default
const DEFAULT_PROFILE_SUFFIX: &str = ".default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFamily {
    Firefox,
    Thunderbird,
}

impl ProfileFamily {
    pub fn all() -> [ProfileFamily; 2] {
        [ProfileFamily::Firefox, ProfileFamily::Thunderbird]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProfileFamily::Firefox => "Firefox",
            ProfileFamily::Thunderbird => "Thunderbird",
        }
    }

    /// Directory holding this application's profiles under `home`
    pub fn profiles_root(&self, home: &Path) -> PathBuf {
        match self {
            ProfileFamily::Firefox => home.join(".mozilla").join("firefox"),
            ProfileFamily::Thunderbird => home.join(".thunderbird"),
        }
    }

    /// Default profile directories (`<root>/*.default/`), sorted by name.
    pub fn detect_profiles(&self, home: &Path) -> Vec<PathBuf> {
        let root = self.profiles_root(home);
        if !root.is_dir() {
            debug!("{} profile directory {:?} not found", self.name(), root);
            return Vec::new();
        }

        let profiles: Vec<PathBuf> = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && name.ends_with(DEFAULT_PROFILE_SUFFIX)
            })
            .map(|e| e.into_path())
            .collect();

        debug!("Found {} {} profile(s) in {:?}", profiles.len(), self.name(), root);
        profiles
    }
}

/// Login database path for a profile directory
pub fn signons_path(profile_path: &Path) -> PathBuf {
    profile_path.join(SIGNONS_DATABASE)
}

/// Default profiles of every known application under `home`
pub fn default_profiles_in(home: &Path) -> Vec<PathBuf> {
    ProfileFamily::all()
        .iter()
        .flat_map(|family| family.detect_profiles(home))
        .collect()
}

/// Default profiles of the current user
pub fn default_profiles() -> Vec<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) => default_profiles_in(Path::new(&home)),
        None => {
            warn!("HOME is not set, skipping profile auto detection");
            Vec::new()
        }
    }
}
