//! Engine settings and the configuration file.
//!
//! The file is line oriented `key = value`, values may be quoted, `#`
//! starts a comment line. Unknown keys or bad values are reported and
//! otherwise ignored, so a broken config never stops the engine.

use std::path::{Path, PathBuf};

use log::warn;

pub const CONFIG_FILE: &str = "riposte.conf";
pub const BOOK_FILE: &str = "book.bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgbbLoadType {
    FourMen,
    FiveMen,
    Smart,
    None,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookMode {
    Off,
    Mem,
    Disk,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    pub egbb_max_men: i32,
    pub egbb_load_type: EgbbLoadType,
    /// Bitbase cache size in bytes.
    pub egbb_cache_size: usize,
    pub egbb_path: String,
    pub book_file: PathBuf,
    /// Worker threads for perft; <= 0 means detect the CPU count.
    pub nthreads: i32,
    pub book_mode: BookMode,
    pub use_learning: bool,
    pub use_log: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hash_mb: 32,
            egbb_max_men: 4,
            egbb_load_type: EgbbLoadType::Off,
            egbb_cache_size: 4 * 0x0010_0000,
            egbb_path: String::new(),
            book_file: PathBuf::from(BOOK_FILE),
            nthreads: -1,
            book_mode: BookMode::Mem,
            use_learning: true,
            use_log: false,
        }
    }
}

impl Settings {
    fn set_option(&mut self, name: &str, value: &str) {
        match name {
            "hash" => match value.parse::<usize>() {
                Ok(mb) if mb > 0 => self.hash_mb = mb,
                _ => warn!("config: invalid hash size: {value}"),
            },
            "egbb_5men" => match value {
                "on" => self.egbb_max_men = 5,
                "off" => self.egbb_max_men = 4,
                _ => warn!("config: invalid egbb_5men value: {value}"),
            },
            "egbb_load_type" => match value {
                "4men" => self.egbb_load_type = EgbbLoadType::FourMen,
                "5men" => self.egbb_load_type = EgbbLoadType::FiveMen,
                "smart" => self.egbb_load_type = EgbbLoadType::Smart,
                "none" => self.egbb_load_type = EgbbLoadType::None,
                "off" => self.egbb_load_type = EgbbLoadType::Off,
                _ => warn!("config: invalid egbb load type: {value}"),
            },
            "egbb_cache" => match value.parse::<usize>() {
                Ok(mb) if mb > 0 => self.egbb_cache_size = mb * 0x0010_0000,
                _ => warn!("config: invalid egbb cache size: {value}"),
            },
            "egbb_path" => {
                if !value.is_empty() {
                    self.egbb_path = value.to_string();
                    if !self.egbb_path.ends_with('/') {
                        self.egbb_path.push('/');
                    }
                }
            }
            "bookmode" => match value {
                "off" => self.book_mode = BookMode::Off,
                "mem" => self.book_mode = BookMode::Mem,
                "disk" => self.book_mode = BookMode::Disk,
                _ => warn!("config: invalid book mode: {value}"),
            },
            "learn" => match value {
                "on" => self.use_learning = true,
                "off" => self.use_learning = false,
                _ => warn!("config: invalid learning mode: {value}"),
            },
            "logfile" => match value {
                "on" => self.use_log = true,
                "off" => self.use_log = false,
                _ => warn!("config: invalid logfile mode: {value}"),
            },
            "threads" => match value.parse::<i32>() {
                Ok(n) if n > 0 => self.nthreads = n,
                _ => warn!("config: invalid thread count: {value}"),
            },
            _ => warn!("config: invalid option: {name}"),
        }
    }

    /// Apply options from config-file text.
    pub fn apply_config_text(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                warn!("config: malformed line: {line}");
                continue;
            };
            let name = name.trim();
            let value = value.trim().trim_matches('"');
            if name.is_empty() {
                warn!("config: malformed line: {line}");
                continue;
            }
            self.set_option(name, value);
        }
    }

    /// Read the config file if it exists; a missing or unreadable file
    /// only disables configuration, never the engine.
    pub fn load_from(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(text) => self.apply_config_text(&text),
            Err(err) => warn!("can't read config file {}: {err}", path.display()),
        }
    }

    /// The config file path: `$XDG_CONFIG_HOME/riposte/` or
    /// `$HOME/.config/riposte/` when present there, else the working
    /// directory.
    #[must_use]
    pub fn config_path() -> PathBuf {
        let home_config = std::env::var_os("XDG_CONFIG_HOME")
            .map(|dir| PathBuf::from(dir).join("riposte").join(CONFIG_FILE))
            .or_else(|| {
                std::env::var_os("HOME")
                    .map(|dir| PathBuf::from(dir).join(".config/riposte").join(CONFIG_FILE))
            });
        match home_config {
            Some(path) if path.exists() || !Path::new(CONFIG_FILE).exists() => path,
            _ => PathBuf::from(CONFIG_FILE),
        }
    }

    /// The book file path, honoring `$XDG_DATA_HOME` like the config.
    #[must_use]
    pub fn default_book_path() -> PathBuf {
        let home_book = std::env::var_os("XDG_DATA_HOME")
            .map(|dir| PathBuf::from(dir).join("riposte").join(BOOK_FILE))
            .or_else(|| {
                std::env::var_os("HOME")
                    .map(|dir| PathBuf::from(dir).join(".local/share/riposte").join(BOOK_FILE))
            });
        match home_book {
            Some(path) if path.exists() || !Path::new(BOOK_FILE).exists() => path,
            _ => PathBuf::from(BOOK_FILE),
        }
    }

    /// Number of perft worker threads after CPU detection.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        if self.nthreads > 0 {
            self.nthreads as usize
        } else {
            num_cpus::get().max(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_options() {
        let mut s = Settings::default();
        s.apply_config_text(
            "hash = 64\n\
             egbb_5men = on\n\
             egbb_load_type = smart\n\
             egbb_cache = 8\n\
             egbb_path = \"/opt/egbb\"\n\
             bookmode = disk\n\
             learn = off\n\
             logfile = on\n\
             threads = 3\n",
        );
        assert_eq!(s.hash_mb, 64);
        assert_eq!(s.egbb_max_men, 5);
        assert_eq!(s.egbb_load_type, EgbbLoadType::Smart);
        assert_eq!(s.egbb_cache_size, 8 * 0x0010_0000);
        assert_eq!(s.egbb_path, "/opt/egbb/");
        assert_eq!(s.book_mode, BookMode::Disk);
        assert!(!s.use_learning);
        assert!(s.use_log);
        assert_eq!(s.nthreads, 3);
    }

    #[test]
    fn ignores_comments_and_unknown_keys() {
        let mut s = Settings::default();
        let before_hash = s.hash_mb;
        s.apply_config_text(
            "# a comment\n\
             \n\
             frobnicate = yes\n\
             hash = not-a-number\n",
        );
        assert_eq!(s.hash_mb, before_hash);
    }

    #[test]
    fn egbb_path_gets_trailing_slash() {
        let mut s = Settings::default();
        s.apply_config_text("egbb_path = /tmp/egbb");
        assert_eq!(s.egbb_path, "/tmp/egbb/");
        s.apply_config_text("egbb_path = /tmp/other/");
        assert_eq!(s.egbb_path, "/tmp/other/");
    }

    #[test]
    fn thread_count_detects_cpus() {
        let mut s = Settings::default();
        s.nthreads = -1;
        assert!(s.thread_count() >= 1);
        s.nthreads = 2;
        assert_eq!(s.thread_count(), 2);
    }
}
