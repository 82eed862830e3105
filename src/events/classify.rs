//! Path-based fallback classification.
//!
//! When no snapshot can be produced, changed paths are classified by
//! base name and parent directory alone. Coarser than diffing, but it
//! keeps the observer talking while the parser is down.

use std::path::{Path, PathBuf};

use super::EventKind;

/// Coarse save-file categories, ordered by selection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SaveKind {
    /// `Level.sav`: the world save itself.
    World,
    /// Any file under a `Players` directory.
    Player,
    /// `LocalData.sav`.
    Local,
    /// `LevelMeta.sav` or `WorldOption.sav`.
    Meta,
    /// Unrecognized; never selected for emission.
    Unknown,
}

impl SaveKind {
    /// Event kind emitted for this save category.
    ///
    /// Returns `None` for [`SaveKind::Unknown`].
    #[must_use]
    pub fn event_kind(self) -> Option<EventKind> {
        match self {
            Self::World => Some(EventKind::WorldSave),
            Self::Player => Some(EventKind::PlayerSave),
            Self::Local => Some(EventKind::LocalSave),
            Self::Meta => Some(EventKind::MetaSave),
            Self::Unknown => None,
        }
    }
}

/// Classify one changed path by its base name and parent directory.
#[must_use]
pub fn classify_path(path: &Path) -> SaveKind {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return SaveKind::Unknown;
    };

    if file_name == "Level.sav" {
        return SaveKind::World;
    }

    // Player saves live at Players/<UID>.sav or under per-player
    // subdirectories; anything below a Players directory counts,
    // including LocalData.sav files that belong to one player.
    if path
        .ancestors()
        .skip(1)
        .filter_map(|a| a.file_name().and_then(|n| n.to_str()))
        .any(|dir| dir == "Players")
    {
        return SaveKind::Player;
    }

    match file_name {
        "LocalData.sav" => SaveKind::Local,
        "LevelMeta.sav" | "WorldOption.sav" => SaveKind::Meta,
        _ => SaveKind::Unknown,
    }
}

/// Pick the most significant classification across a changed-path set.
///
/// Selection order is `world > player > local > meta`; `unknown` paths
/// never win. Returns the winning path alongside its kind.
#[must_use]
pub fn select_best(paths: &[PathBuf]) -> Option<(SaveKind, &Path)> {
    paths
        .iter()
        .map(|p| (classify_path(p), p.as_path()))
        .filter(|(kind, _)| *kind != SaveKind::Unknown)
        .min_by_key(|(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_world_save() {
        let path = PathBuf::from("/saves/SaveGames/7656/WORLD1/Level.sav");
        assert_eq!(classify_path(&path), SaveKind::World);
    }

    #[test]
    fn test_classify_player_save() {
        let path = PathBuf::from("/saves/SaveGames/7656/WORLD1/Players/UID1.sav");
        assert_eq!(classify_path(&path), SaveKind::Player);

        // Nested player files classify the same way.
        let nested = PathBuf::from("/saves/WORLD1/Players/UID1/LocalData.sav");
        assert_eq!(classify_path(&nested), SaveKind::Player);
    }

    #[test]
    fn test_classify_local_and_meta() {
        assert_eq!(
            classify_path(Path::new("/saves/WORLD1/LocalData.sav")),
            SaveKind::Local
        );
        assert_eq!(
            classify_path(Path::new("/saves/WORLD1/LevelMeta.sav")),
            SaveKind::Meta
        );
        assert_eq!(
            classify_path(Path::new("/saves/WORLD1/WorldOption.sav")),
            SaveKind::Meta
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            classify_path(Path::new("/saves/WORLD1/backup.zip")),
            SaveKind::Unknown
        );
    }

    #[test]
    fn test_select_best_prefers_world() {
        let paths = vec![
            PathBuf::from("/saves/WORLD1/Players/UID1.sav"),
            PathBuf::from("/saves/WORLD1/Level.sav"),
            PathBuf::from("/saves/WORLD1/LevelMeta.sav"),
        ];
        let (kind, path) = select_best(&paths).unwrap();
        assert_eq!(kind, SaveKind::World);
        assert!(path.ends_with("Level.sav"));
    }

    #[test]
    fn test_select_best_skips_unknown() {
        let paths = vec![PathBuf::from("/saves/WORLD1/backup.zip")];
        assert!(select_best(&paths).is_none());
    }

    #[test]
    fn test_select_best_player_only() {
        // Degraded-path scenario: only a player file changed.
        let paths = vec![PathBuf::from("/saves/WORLD1/Players/UID1/LocalData.sav")];
        let (kind, _) = select_best(&paths).unwrap();
        assert_eq!(kind, SaveKind::Player);
        assert_eq!(kind.event_kind(), Some(EventKind::PlayerSave));
    }
}
