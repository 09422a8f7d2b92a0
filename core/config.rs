use crate::context::ScanContext;
use crate::error::{AppError, Result};
use crate::pattern::PatternSet;
use crate::rules::RuleSet;
use log;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Accepted configuration file names, probed in this order.
pub const CONFIG_FILENAMES: [&str; 2] = ["maid.json", ".maid.json"];
pub const DEFAULT_OUTPUT_FILENAME: &str = "_content.md";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "match")]
    pub start: String,
    pub delete: String,
    #[serde(default)]
    pub keep_start: bool,
}

impl Config {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str::<Config>(content).map_err(|e| AppError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let json_content = fs::read_to_string(config_path).map_err(|e| AppError::ConfigRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&json_content, config_path)
    }
}

/// A parsed configuration file together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: Config,
}

impl LoadedConfig {
    pub fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

/// First accepted config file directly inside `directory`.
pub fn find_config_file(directory: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| directory.join(name))
        .find(|candidate| candidate.is_file())
}

/// Global search path: the working directory, then per-user locations.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs_to_probe = Vec::new();
    match env::current_dir() {
        Ok(cwd) => dirs_to_probe.push(cwd),
        Err(e) => log::warn!("Cannot determine current directory: {}", e),
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_probe.extend([
            home.clone(),
            home.join(".maid"),
            home.join(".local").join("share").join("maid"),
            home.join(".config").join("maid"),
        ]);
        log::trace!("Global configuration search path: {:?}", dirs_to_probe);
    } else {
        log::debug!("No home directory found; only the working directory is searched.");
    }
    dirs_to_probe
}

fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Loads global and per-directory configuration. Every file is parsed at most
/// once per resolver; the resolver lives for one run.
#[derive(Debug)]
pub struct ConfigResolver {
    search_dirs: Vec<PathBuf>,
    loaded: HashMap<PathBuf, Rc<LoadedConfig>>,
    global_key: Option<PathBuf>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::with_search_dirs(default_search_dirs())
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            loaded: HashMap::new(),
            global_key: None,
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Number of distinct configuration files parsed so far.
    pub fn parsed_count(&self) -> usize {
        self.loaded.len()
    }

    fn load_cached(&mut self, path: &Path) -> Result<Rc<LoadedConfig>> {
        let key = cache_key(path);
        if let Some(hit) = self.loaded.get(&key) {
            log::trace!("Configuration cache hit: {}", path.display());
            return Ok(Rc::clone(hit));
        }
        let config = Config::load_from_path(path)?;
        log::debug!(
            "Parsed {} ({} patterns, {} rules)",
            path.display(),
            config.patterns.len(),
            config.rules.len()
        );
        let loaded = Rc::new(LoadedConfig {
            path: path.to_path_buf(),
            config,
        });
        self.loaded.insert(key, Rc::clone(&loaded));
        Ok(loaded)
    }

    /// Probes the search path and loads the first config file found. Errors in
    /// that file are fatal; later locations are never consulted.
    pub fn load_global(&mut self) -> Result<Option<Rc<LoadedConfig>>> {
        let selected = self
            .search_dirs
            .iter()
            .find_map(|dir| find_config_file(dir));
        match selected {
            Some(path) => {
                log::info!("Using global configuration: {}", path.display());
                self.load_explicit(&path).map(Some)
            }
            None => {
                log::debug!("No global configuration found in {:?}", self.search_dirs);
                Ok(None)
            }
        }
    }

    /// Loads `path` as the global configuration. A missing file is an error.
    pub fn load_explicit(&mut self, path: &Path) -> Result<Rc<LoadedConfig>> {
        let loaded = self.load_cached(path)?;
        self.global_key = Some(cache_key(path));
        Ok(loaded)
    }

    /// Loads the config file inside `directory`, if any. An unreadable file is
    /// reported and treated as absent; a malformed one is fatal.
    pub fn load_local(&mut self, directory: &Path) -> Result<Option<Rc<LoadedConfig>>> {
        let Some(path) = find_config_file(directory) else {
            return Ok(None);
        };
        log::info!("Found {} in {}", path.display(), directory.display());
        match self.load_cached(&path) {
            Ok(loaded) => Ok(Some(loaded)),
            Err(AppError::ConfigRead { path, source }) => {
                log::warn!(
                    "Ignoring unreadable local configuration '{}': {}",
                    path.display(),
                    source
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Context for `directory`: the parent's context plus the directory's own
    /// configuration. Without one, the parent's state is shared as-is.
    pub fn extend(&mut self, parent: &ScanContext, directory: &Path) -> Result<ScanContext> {
        let Some(local) = self.load_local(directory)? else {
            return Ok(parent.clone());
        };
        if self.global_key.as_deref() == Some(cache_key(&local.path).as_path()) {
            log::debug!(
                "{} is the global configuration; not applying it twice",
                local.path.display()
            );
            return Ok(parent.clone());
        }
        let origin = local.origin();
        let patterns = PatternSet::compile(&local.config.patterns, directory, &origin)?;
        let rules = RuleSet::compile(&local.config.rules, &origin)?;
        Ok(parent.extended(&patterns, &rules))
    }
}

/// The part of the configuration that is not tied to a directory in the walk:
/// built-in ignores, the global config file and command-line patterns.
/// Patterns are anchored at whichever root is being scanned.
#[derive(Debug, Clone)]
pub struct GlobalScope {
    builtin: Vec<String>,
    config: Option<Rc<LoadedConfig>>,
    extra: Vec<String>,
    rules: RuleSet,
}

impl GlobalScope {
    pub fn new(
        builtin: Vec<String>,
        config: Option<Rc<LoadedConfig>>,
        extra: Vec<String>,
    ) -> Result<Self> {
        let rules = match &config {
            Some(loaded) => RuleSet::compile(&loaded.config.rules, &loaded.origin())?,
            None => RuleSet::new(),
        };
        let scope = Self {
            builtin,
            config,
            extra,
            rules,
        };
        // Surface bad patterns before anything is written.
        scope.context_for(Path::new("."))?;
        Ok(scope)
    }

    pub fn context_for(&self, anchor: &Path) -> Result<ScanContext> {
        let mut patterns = PatternSet::compile(&self.builtin, anchor, "built-in ignores")?;
        if let Some(loaded) = &self.config {
            let global = PatternSet::compile(&loaded.config.patterns, anchor, &loaded.origin())?;
            patterns = patterns.extended(&global);
        }
        let extra = PatternSet::compile(&self.extra, anchor, "command line")?;
        patterns = patterns.extended(&extra);
        Ok(ScanContext::new(patterns, self.rules.clone()))
    }

    pub fn pattern_texts(&self) -> Vec<&str> {
        let from_config = self
            .config
            .iter()
            .flat_map(|loaded| loaded.config.patterns.iter());
        self.builtin
            .iter()
            .chain(from_config)
            .chain(self.extra.iter())
            .map(String::as_str)
            .collect()
    }
}
