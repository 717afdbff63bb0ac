//! Line-oriented game log and the error log.

use std::fs::OpenOptions;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;

use crate::board::Color;

const GAME_LOG: &str = "gamelog.txt";
const ERROR_LOG: &str = "errlog.txt";

fn append_line(path: &str, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}

/// Seconds since the epoch, for the error log's timestamps.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Append a timestamped line to the error log (if logging is on) no
/// matter what; used on fatal exits.
pub fn log_error_line(enabled: bool, msg: &str) {
    if !enabled {
        return;
    }
    let line = format!("{msg} at unix {}\n", unix_now());
    if let Err(err) = append_line(ERROR_LOG, &line) {
        warn!("can't write {ERROR_LOG}: {err}");
    }
}

pub struct GameLog {
    enabled: bool,
}

impl GameLog {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        GameLog { enabled }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// A new game starts: drop the old move log.
    pub fn clear(&self) {
        if !self.enabled {
            return;
        }
        match std::fs::remove_file(GAME_LOG) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("can't delete {GAME_LOG}: {err}"),
        }
    }

    /// Record one played move. `score` is in centipawns from the mover's
    /// view; `None` for opponent moves, "book" for book moves.
    pub fn update(
        &self,
        mover: Color,
        game_ply_before: usize,
        san: &str,
        score: Option<i32>,
        book_used: bool,
    ) {
        if !self.enabled {
            return;
        }
        let move_num = game_ply_before / 2 + 1;
        let mut line = String::new();
        if mover == Color::White {
            line.push_str(&format!("\n{move_num}."));
        }
        line.push_str(&format!(" {san}"));
        if book_used {
            line.push_str(" {book}");
        } else if let Some(score) = score {
            line.push_str(&format!(" {{{:+.2}}}", f64::from(score) / 100.0));
        }
        if let Err(err) = append_line(GAME_LOG, &line) {
            warn!("can't write {GAME_LOG}: {err}");
        }
    }
}
