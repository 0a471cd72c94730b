use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read .mhsreplrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().flatten() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self {
            inner: map,
            config_path,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    /// Interpreter adapter binary; a bare name is resolved on PATH.
    pub fn engine_bin(&self) -> String {
        self.get("MHS_ENGINE_BIN")
            .unwrap_or_else(|| "mhs-engine".into())
    }

    /// Extra arguments for the adapter, whitespace-separated.
    pub fn engine_args(&self) -> Vec<String> {
        self.get("MHS_ENGINE_ARGS")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn history_path(&self) -> PathBuf {
        self.get("MHS_HISTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join("history"))
    }

    pub fn log_level(&self) -> String {
        self.get("MHS_LOG_LEVEL").unwrap_or_else(|| "warn".into())
    }
}

fn is_config_key(k: &str) -> bool {
    k.starts_with("MHS_")
}

fn config_dir() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("mhs_repl")
}

fn default_config_path() -> PathBuf {
    config_dir().join(".mhsreplrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("MHS_ENGINE_BIN".into(), "mhs-engine".into());
    m.insert("MHS_ENGINE_ARGS".into(), "".into());
    m.insert(
        "MHS_HISTORY_PATH".into(),
        config_dir().join("history").to_string_lossy().into_owned(),
    );
    m.insert("MHS_LOG_LEVEL".into(), "warn".into());

    m
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn rc_file_overlays_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join(".mhsreplrc");
        let mut file = fs::File::create(&rc).expect("create rc");
        writeln!(file, "# adapter settings").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "MHS_ENGINE_BIN = /opt/mhs/bin/adapter").unwrap();
        writeln!(file, "MHS_ENGINE_ARGS = --rts -K64m").unwrap();
        drop(file);

        let cfg = Config::load_from(rc);
        assert_eq!(cfg.engine_bin(), "/opt/mhs/bin/adapter");
        assert_eq!(
            cfg.engine_args(),
            vec!["--rts".to_string(), "-K64m".to_string()]
        );
        assert_eq!(cfg.log_level(), "warn");
    }

    #[test]
    fn missing_rc_file_keeps_defaults() {
        let cfg = Config::load_from(PathBuf::from("/definitely/not/here/.mhsreplrc"));
        assert_eq!(cfg.engine_bin(), "mhs-engine");
        assert!(cfg.engine_args().is_empty());
    }
}
