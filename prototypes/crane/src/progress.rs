//! # Progress
//!
//! Win counters and money spent, kept for the whole session in a [`Progress`] store every scene can reach through its tick, and flushed to a JSON file when the game exits:
//!
//! ```json
//! { "prizes": { "Abra": 2, "Zubat": 0 }, "spent": 1.5 }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{config::Config, resources::Catalog};

/// what a prize is worth if it has no entry in the value table
pub const DEFAULT_PRIZE_VALUE: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("couldn't access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{path} is not a valid progress file: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The persisted part: prize name to times won, and total spent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub prizes: BTreeMap<String, u64>,
    #[serde(default)]
    pub spent: f64,
}

impl Counters {
    /// nothing won yet: every prize in the catalog at zero
    pub fn fresh(catalog: &Catalog) -> Self {
        Self {
            prizes: catalog.names().map(|name| (name.to_owned(), 0)).collect(),
            spent: 0.0,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ProgressError> {
        let json = fs::read_to_string(path).map_err(|source| ProgressError::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ProgressError::Json {
            path: path.to_owned(),
            source,
        })
    }

    /// Writes the counters to `path`.
    ///
    /// The file is written next to `path` first and then renamed over it, so a crash mid-save leaves the old counters in place.
    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        let io_err = |source| ProgressError::Io {
            path: path.to_owned(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| ProgressError::Json {
            path: path.to_owned(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }
}

/// The session's store: counters plus what's needed to make sense of them.
#[derive(Debug, Clone)]
pub struct Progress {
    counters: Counters,
    catalog: Arc<Catalog>,
    play_price: f64,
    prize_values: BTreeMap<String, f64>,
}

impl Progress {
    pub fn new(counters: Counters, catalog: Arc<Catalog>, config: &Config) -> Self {
        Self {
            counters,
            catalog,
            play_price: config.play_price,
            prize_values: config.prize_values.clone(),
        }
    }

    /// loads the counters at `path`. a missing or unreadable file means starting over, never an error
    pub fn load_or_default(path: &Path, catalog: Arc<Catalog>, config: &Config) -> Self {
        let counters = match Counters::load(path) {
            Ok(counters) => {
                log::info!(
                    "loaded progress: {} prizes won, {:.2} spent",
                    counters.prizes.values().sum::<u64>(),
                    counters.spent
                );
                counters
            }
            Err(ProgressError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::info!("no progress at {}, starting fresh", path.display());
                Counters::fresh(&catalog)
            }
            Err(err) => {
                log::warn!("{err}, starting fresh");
                Counters::fresh(&catalog)
            }
        };
        Self::new(counters, catalog, config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        self.counters.save(path)?;
        log::info!("saved progress to {}", path.display());
        Ok(())
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn increment_prize(&mut self, name: &str) {
        *self.counters.prizes.entry(name.to_owned()).or_insert(0) += 1;
    }

    /// pays for one drop of the claw
    pub fn charge_play(&mut self) {
        self.counters.spent += self.play_price;
    }

    pub fn prize_count(&self, name: &str) -> u64 {
        self.counters.prizes.get(name).copied().unwrap_or(0)
    }

    pub fn total_prizes(&self) -> u64 {
        self.counters.prizes.values().sum()
    }

    /// how many different prizes have been won at least once
    pub fn unique_prizes(&self) -> usize {
        self.counters.prizes.values().filter(|n| **n > 0).count()
    }

    pub fn total_spent(&self) -> f64 {
        self.counters.spent
    }

    pub fn prize_value(&self, name: &str) -> f64 {
        self.prize_values
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_PRIZE_VALUE)
    }

    /// what everything won so far is worth
    pub fn total_won(&self) -> f64 {
        self.counters
            .prizes
            .iter()
            .map(|(name, count)| *count as f64 * self.prize_value(name))
            .sum()
    }

    /// won over spent, or 1 before anything was spent
    pub fn ratio(&self) -> f64 {
        if self.counters.spent == 0.0 {
            1.0
        } else {
            self.total_won() / self.counters.spent
        }
    }
}
