//! Choosing which executable in a game folder is the "real" game.
//!
//! Game folders often ship installers, uninstallers, redistributables and
//! launchers next to the actual game binary. Candidates are ranked with a
//! fixed additive score against a game-name hint and the folder name.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Substrings that mark helper executables rather than the game itself.
pub const BAD_EXE_TOKENS: &[&str] = &[
    "unins", "uninstall", "setup", "installer", "vcredist", "dxsetup", "redist", "patch",
    "update", "launcher", "config", "settings", "crash", "helper", "server", "editor", "tool",
];

/// Raw base names that hint at a generic game entry point.
const GENERIC_GAME_NAMES: &[&str] = &["game", "start", "play"];

const BAD_TOKEN_PENALTY: i32 = 70;
const MAX_LENGTH_PENALTY: i32 = 20;
const DEFAULT_TARGET_LEN: usize = 6;

/// Lowercase and keep only `[a-z0-9]`.
pub fn normalize_token(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Score `(exact, starts_with, contains)` tiers; the first match applies.
fn tier_score(name: &str, hint: &str, weights: (i32, i32, i32)) -> i32 {
    if hint.is_empty() {
        0
    } else if name == hint {
        weights.0
    } else if name.starts_with(hint) {
        weights.1
    } else if name.contains(hint) {
        weights.2
    } else {
        0
    }
}

/// Score an extension-stripped executable name against the hints.
///
/// | Rule | Points |
/// |------|--------|
/// | game name exact / prefix / substring | +140 / +80 / +50 |
/// | folder name exact / prefix / substring | +90 / +50 / +25 |
/// | raw name is `game`, `start` or `play` | +10 |
/// | each [`BAD_EXE_TOKENS`] substring | −70 |
/// | length beyond the game name (or 6) | −1 per char, max −20 |
///
/// An empty base name gets the lowest possible score.
pub fn score_exe_candidate(base_name: &str, game_name: &str, folder_name: &str) -> i32 {
    if base_name.is_empty() {
        return i32::MIN;
    }
    let normalized = normalize_token(base_name);
    let game = normalize_token(game_name);
    let folder = normalize_token(folder_name);

    let mut score = tier_score(&normalized, &game, (140, 80, 50))
        + tier_score(&normalized, &folder, (90, 50, 25));

    if GENERIC_GAME_NAMES.contains(&base_name.to_lowercase().as_str()) {
        score += 10;
    }

    for token in BAD_EXE_TOKENS {
        if normalized.contains(token) {
            score -= BAD_TOKEN_PENALTY;
        }
    }

    let target_len = if game.is_empty() { DEFAULT_TARGET_LEN } else { game.len() };
    let excess = normalized.len().saturating_sub(target_len);
    score -= (excess as i32).min(MAX_LENGTH_PENALTY);

    score
}

fn base_name(candidate: &str) -> &str {
    Path::new(candidate)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(candidate)
}

/// Order by UTF-16 length, then by UTF-16 code units.
fn utf16_order(a: &str, b: &str) -> Ordering {
    a.encode_utf16()
        .count()
        .cmp(&b.encode_utf16().count())
        .then_with(|| a.encode_utf16().cmp(b.encode_utf16()))
}

/// Pick the most likely game executable from candidate file names.
///
/// Highest score wins; ties go to the shorter name, then the
/// lexicographically smaller one, both measured in UTF-16 code units.
/// Names with an empty base name are never picked from several candidates.
pub fn pick_best_exe_candidate<'a, S: AsRef<str>>(
    candidates: &'a [S],
    game_name: &str,
    folder_name: &str,
) -> Option<&'a S> {
    match candidates {
        [] => return None,
        [only] => return Some(only),
        _ => {}
    }

    let mut best: Option<(i32, &'a S)> = None;
    for candidate in candidates {
        let name = candidate.as_ref();
        let base = base_name(name);
        if base.is_empty() {
            continue;
        }
        let score = score_exe_candidate(base, game_name, folder_name);
        log::trace!("exe candidate {name}: score {score}");

        let better = match best {
            None => true,
            Some((best_score, current)) => {
                score > best_score
                    || (score == best_score && utf16_order(name, current.as_ref()).is_lt())
            }
        };
        if better {
            best = Some((score, candidate));
        }
    }

    best.map(|(_, candidate)| candidate)
}

/// List `.exe` files directly inside `dir` (case-insensitive, not recursive).
///
/// An unreadable directory yields no candidates.
pub fn list_exe_candidates(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.to_lowercase().ends_with(".exe"))
        .collect()
}

/// Find the best game executable in `dir`, using the directory name as the folder hint.
pub fn find_best_exe_path(dir: &Path, game_name: Option<&str>) -> Option<PathBuf> {
    let candidates = list_exe_candidates(dir);
    let folder_name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pick = pick_best_exe_candidate(&candidates, game_name.unwrap_or(""), &folder_name)?;
    log::debug!(
        "picked {pick} out of {} executable(s) in {}",
        candidates.len(),
        dir.display()
    );
    Some(dir.join(pick))
}
