use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::new());
}

/// Transport stream layout used by the muxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TSConfig {
    /// PID carrying the video elementary stream (also the PCR PID)
    pub video_pid: u16,
    /// PID carrying the audio elementary stream
    pub audio_pid: u16,
    /// PID carrying the program map table
    pub pmt_pid: u16,
    /// Minimum spacing between two program clock references
    pub pcr_interval: Duration,
    /// PAT/PMT repetition period for programs without a video stream
    pub psi_interval: Duration,
}

impl Default for TSConfig {
    fn default() -> Self {
        Self {
            video_pid: 0x100,
            audio_pid: 0x101,
            pmt_pid: 0x1000,
            pcr_interval: Duration::from_millis(40),
            psi_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ts: TSConfig,
}

impl Config {
    fn new() -> Self {
        let mut config = Config {
            ts: TSConfig::default(),
        };

        // Environment first, config file values win
        for (key, var) in [
            ("video_pid", "LSTK_VIDEO_PID"),
            ("audio_pid", "LSTK_AUDIO_PID"),
            ("pmt_pid", "LSTK_PMT_PID"),
            ("pcr_interval_ms", "LSTK_PCR_INTERVAL_MS"),
            ("psi_interval_ms", "LSTK_PSI_INTERVAL_MS"),
        ] {
            if let Ok(value) = env::var(var) {
                config.apply(key, &value);
            }
        }

        let config_paths = ["./lstk_config.toml", "./config.toml"];
        for path in &config_paths {
            if let Ok(mut file) = File::open(path) {
                let mut content = String::new();
                if file.read_to_string(&mut content).is_ok() {
                    config.apply_file(&content);
                }
            }
        }

        config
    }

    fn apply_file(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                self.apply(key.trim(), value);
            }
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        let parsed = match value.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => value.parse::<u64>(),
        };
        let Ok(parsed) = parsed else {
            log::warn!("ignoring non-numeric config value {}={}", key, value);
            return;
        };
        match key {
            "video_pid" => self.ts.video_pid = (parsed & 0x1fff) as u16,
            "audio_pid" => self.ts.audio_pid = (parsed & 0x1fff) as u16,
            "pmt_pid" => self.ts.pmt_pid = (parsed & 0x1fff) as u16,
            "pcr_interval_ms" => self.ts.pcr_interval = Duration::from_millis(parsed),
            "psi_interval_ms" => self.ts.psi_interval = Duration::from_millis(parsed),
            _ => log::debug!("unknown config key {}", key),
        }
    }

    pub fn reload() {
        let new_config = Config::new();
        *CONFIG.write() = new_config;
    }
}

/// Returns the transport stream settings from configuration
pub fn ts_config() -> TSConfig {
    CONFIG.read().ts.clone()
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# LSTK Configuration
# This is a template. Replace the values with your actual configuration.

video_pid = 256
audio_pid = 257
pmt_pid = 4096
pcr_interval_ms = 40
psi_interval_ms = 100
"#;
        std::fs::write(path, template)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_file() {
        let mut config = Config {
            ts: TSConfig::default(),
        };
        config.apply_file(
            "# comment\nvideo_pid = 0x200\naudio_pid = \"513\"\npcr_interval_ms=100\npsi_interval_ms = 250\nbogus = 1\n",
        );
        assert_eq!(config.ts.video_pid, 0x200);
        assert_eq!(config.ts.audio_pid, 513);
        assert_eq!(config.ts.pmt_pid, 0x1000);
        assert_eq!(config.ts.pcr_interval, Duration::from_millis(100));
        assert_eq!(config.ts.psi_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_value_is_ignored() {
        let mut config = Config {
            ts: TSConfig::default(),
        };
        config.apply("video_pid", "abc");
        assert_eq!(config.ts.video_pid, 0x100);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let path = env::temp_dir().join(format!("lstk_config_{}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);
        create_default_config_template(&path).unwrap();

        let mut config = Config {
            ts: TSConfig {
                video_pid: 1,
                audio_pid: 2,
                pmt_pid: 3,
                pcr_interval: Duration::ZERO,
                psi_interval: Duration::ZERO,
            },
        };
        config.apply_file(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(config.ts, TSConfig::default());
        std::fs::remove_file(&path).unwrap();
    }
}
