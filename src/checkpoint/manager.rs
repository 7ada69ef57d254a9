use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ai::PolicyGradientAgent;
use crate::brain::{Network, NetworkSnapshot};
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;

const BRAIN_FILE: &str = "brain.json";
const METADATA_FILE: &str = "metadata.json";
const LATEST_FILE: &str = "latest";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    /// Additionally kept: the highest-scoring checkpoints.
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 1,
        }
    }
}

/// A loaded checkpoint: where it lives, what it recorded, and the network.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
    pub network: Network,
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Self {
        CheckpointManager { config }
    }

    pub fn config(&self) -> &CheckpointManagerConfig {
        &self.config
    }

    /// Save the agent's network and configuration as
    /// `checkpoint_{games_played:07}`.
    pub fn save_checkpoint(
        &self,
        agent: &PolicyGradientAgent,
        metrics: &CheckpointMetrics,
        games_played: usize,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", games_played);
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        save_network(&tmp_dir.join(BRAIN_FILE), agent.network())?;

        let metadata = CheckpointMetadata {
            games_played,
            timestamp: unix_timestamp(),
            hyperparameters: agent.network().hyperparameters(),
            agent: agent.config().clone(),
            metrics: metrics.clone(),
        };
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest(&dir_name)?;
        self.prune_old_checkpoints()?;

        info!("Saved checkpoint to {}", final_dir.display());
        Ok(final_dir)
    }

    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        let metadata = read_metadata(&dir.join(METADATA_FILE))?;
        let brain_path = dir.join(BRAIN_FILE);
        let snapshot: NetworkSnapshot = read_json(&brain_path)?;
        let network = Network::from_snapshot(snapshot)?;
        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
            network,
        })
    }

    /// Load the checkpoint named by the `latest` pointer file.
    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let pointer = self.config.checkpoint_dir.join(LATEST_FILE);
        if !pointer.is_file() {
            return Err(CheckpointError::NoLatest(self.config.checkpoint_dir.clone()));
        }
        let name = fs::read_to_string(&pointer).map_err(|e| CheckpointError::Read {
            path: pointer.clone(),
            source: e,
        })?;
        self.load_checkpoint(&self.config.checkpoint_dir.join(name.trim()))
    }

    /// List all checkpoints sorted by games played (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        if !self.config.checkpoint_dir.is_dir() {
            return Ok(results);
        }
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("checkpoint_") || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join(METADATA_FILE);
            if meta_path.exists() {
                let metadata = read_metadata(&meta_path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.games_played);
        Ok(results)
    }

    /// Delete checkpoints outside the last N by games played and the best N by score.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = checkpoints.len();
        let mut keep: HashSet<usize> = (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_score: Vec<(usize, f32)> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, (_, m))| (i, m.metrics.score))
            .collect();
        by_score.sort_by(|a, b| b.1.total_cmp(&a.1));
        keep.extend(by_score.iter().take(self.config.keep_best_n).map(|(i, _)| *i));

        for (i, (path, _)) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                debug!("pruning {}", path.display());
                fs::remove_dir_all(path)?;
            }
        }
        Ok(())
    }

    /// Point `latest` at the given checkpoint directory name.
    fn update_latest(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let pointer = self.config.checkpoint_dir.join(LATEST_FILE);
        let tmp = self.config.checkpoint_dir.join(format!("{}.tmp", LATEST_FILE));
        fs::write(&tmp, dir_name)?;
        fs::rename(&tmp, &pointer)?;
        Ok(())
    }
}

/// Write a network snapshot as JSON.
pub fn save_network(path: &Path, network: &Network) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string(&network.snapshot())?)?;
    Ok(())
}

/// Load a previously saved network.
///
/// Returns `Ok(None)` when nothing exists at `path`, so the caller can start
/// from a freshly initialized network. A file that exists but cannot be read
/// or does not describe a valid network is an error.
pub fn load_pretrained(path: &Path) -> Result<Option<Network>, CheckpointError> {
    if !path.exists() {
        return Ok(None);
    }
    let snapshot: NetworkSnapshot = read_json(path)?;
    Ok(Some(Network::from_snapshot(snapshot)?))
}

fn read_metadata(path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::PgConfig;
    use crate::brain::{Activation, Hyperparameters, LayerSpec};

    fn test_network() -> Network {
        Network::with_seed(
            &[
                LayerSpec::input(4),
                LayerSpec::new(6, Activation::Relu),
                LayerSpec::new(3, Activation::Sigmoid),
            ],
            Hyperparameters::default(),
            9,
        )
        .unwrap()
    }

    fn test_agent() -> PolicyGradientAgent {
        let config = PgConfig {
            experience_batch_size: 8,
            experience_buffer_size: 32,
            ..Default::default()
        };
        PolicyGradientAgent::with_seed(test_network(), config, 1).unwrap()
    }

    fn test_metrics(score: f32) -> CheckpointMetrics {
        CheckpointMetrics {
            score,
            win_pct: 70.0,
            loss_pct: 20.0,
            average_game_length: 7.5,
            mean_experience_value: 0.1,
            cost: Some(0.05),
            cost_ema: None,
        }
    }

    fn manager(dir: &Path, keep_last_n: usize, keep_best_n: usize) -> CheckpointManager {
        CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.to_path_buf(),
            keep_last_n,
            keep_best_n,
        })
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 1);
        let agent = test_agent();

        let path = manager.save_checkpoint(&agent, &test_metrics(50.0), 1000).unwrap();
        assert!(path.ends_with("checkpoint_0001000"));
        assert!(path.join("brain.json").exists());
        assert!(path.join("metadata.json").exists());

        let data = manager.load_checkpoint(&path).unwrap();
        assert_eq!(data.metadata.games_played, 1000);
        assert_eq!(data.metadata.agent, *agent.config());
        assert_eq!(data.metadata.metrics, test_metrics(50.0));
        assert_eq!(data.network.snapshot(), agent.network().snapshot());
    }

    #[test]
    fn test_latest_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 1);
        let agent = test_agent();

        manager.save_checkpoint(&agent, &test_metrics(0.0), 1000).unwrap();
        manager.save_checkpoint(&agent, &test_metrics(0.0), 2000).unwrap();

        let latest = manager.load_latest().unwrap();
        assert_eq!(latest.metadata.games_played, 2000);
        assert!(!dir.path().join("latest.tmp").exists());
    }

    #[test]
    fn test_load_latest_without_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 1);
        let err = manager.load_latest().unwrap_err();
        assert!(
            matches!(err, CheckpointError::NoLatest(_)),
            "expected NoLatest, got: {err}"
        );
    }

    #[test]
    fn test_list_checkpoints_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 10, 0);
        let agent = test_agent();

        for games in [3000, 1000, 2000] {
            manager.save_checkpoint(&agent, &test_metrics(0.0), games).unwrap();
        }

        let games: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.games_played)
            .collect();
        assert_eq!(games, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir.path().join("nope"), 5, 1);
        assert!(manager.list_checkpoints().unwrap().is_empty());
    }

    #[test]
    fn test_pruning_keeps_last_and_best() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 2, 1);
        let agent = test_agent();

        let scores = [10.0, 90.0, -30.0, 20.0, 40.0];
        for (i, &score) in scores.iter().enumerate() {
            manager
                .save_checkpoint(&agent, &test_metrics(score), (i + 1) * 1000)
                .unwrap();
        }

        let games: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.games_played)
            .collect();
        assert_eq!(games, vec![2000, 4000, 5000]);
    }

    #[test]
    fn test_metadata_without_metrics_parses() {
        let json = r#"{
            "games_played": 400,
            "timestamp": 1700000000,
            "hyperparameters": { "learning_rate": 0.2, "momentum": 0.9, "regularization": 0.01 },
            "agent": { "discount_factor": 0.5 }
        }"#;
        let meta: CheckpointMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.games_played, 400);
        assert_eq!(meta.agent.experience_batch_size, PgConfig::default().experience_batch_size);
        assert_eq!(meta.metrics, CheckpointMetrics::default());
    }

    #[test]
    fn test_load_pretrained_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_pretrained(&dir.path().join("brain.json")).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_pretrained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("brain.json");
        let network = test_network();

        save_network(&path, &network).unwrap();
        let loaded = load_pretrained(&path).unwrap().unwrap();
        assert_eq!(loaded.snapshot(), network.snapshot());
    }

    #[test]
    fn test_load_pretrained_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_pretrained(&path),
            Err(CheckpointError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_pretrained_rejects_bad_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        let mut snapshot = test_network().snapshot();
        snapshot.weights.pop();
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();
        assert!(matches!(
            load_pretrained(&path),
            Err(CheckpointError::InvalidSnapshot(_))
        ));
    }
}
