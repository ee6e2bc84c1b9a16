//! Closed key sets for each state section and dotted-path parsing.

use std::fmt;

macro_rules! section_keys {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(key: &str) -> Option<Self> {
                match key {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

section_keys!(
    /// Keys of the `data` section
    DataKey {
        AllContainers => "allContainers",
        AllImages => "allImages",
        AllLocalDatabases => "allLocalDatabases",
        AllMigratedDatabases => "allMigratedDatabases",
        DatabaseTypes => "databaseTypes",
    }
);

section_keys!(
    /// Keys of the `ui` section
    UiKey {
        ActiveTab => "activeTab",
        SelectedDbType => "selectedDbType",
        SelectedTemplateForDb => "selectedTemplateForDb",
        CurrentChartType => "currentChartType",
    }
);

section_keys!(
    /// Keys of the `modal` section
    ModalKey {
        CurrentRenameContainerId => "currentRenameContainerId",
        CurrentSql => "currentSQL",
        CurrentVolume => "currentVolume",
        CurrentMonitoringContainer => "currentMonitoringContainer",
    }
);

section_keys!(
    /// Keys of the `monitoring` section
    MonitoringKey {
        Interval => "interval",
        CpuChart => "cpuChart",
        MemoryChart => "memoryChart",
        CpuHistory => "cpuHistory",
        MemoryHistory => "memoryHistory",
        MaxHistoryPoints => "maxHistoryPoints",
    }
);

section_keys!(
    /// Keys of the `migration` section
    MigrationKey {
        LocalPostgresConfig => "localPostgresConfig",
    }
);

section_keys!(
    /// Named slots for live UI component handles
    ComponentKey {
        SearchFilters => "searchFilters",
        ImagesSearchFilters => "imagesSearchFilters",
        MigrationSearchFilters => "migrationSearchFilters",
        ComposeManager => "composeManager",
        ContainersVirtualScroll => "containersVirtualScroll",
        TemplateSelect => "templateSelect",
        VersionSelect => "versionSelect",
    }
);

/// A validated `section.key` path into the state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatePath {
    Data(DataKey),
    Ui(UiKey),
    Modal(ModalKey),
    Monitoring(MonitoringKey),
    Migration(MigrationKey),
}

impl StatePath {
    /// Parse a dotted path such as `ui.activeTab`.
    pub fn parse(path: &str) -> Option<Self> {
        let (section, key) = path.split_once('.')?;
        match section {
            "data" => DataKey::parse(key).map(StatePath::Data),
            "ui" => UiKey::parse(key).map(StatePath::Ui),
            "modal" => ModalKey::parse(key).map(StatePath::Modal),
            "monitoring" => MonitoringKey::parse(key).map(StatePath::Monitoring),
            "migration" => MigrationKey::parse(key).map(StatePath::Migration),
            _ => None,
        }
    }

    pub fn section(&self) -> &'static str {
        match self {
            StatePath::Data(_) => "data",
            StatePath::Ui(_) => "ui",
            StatePath::Modal(_) => "modal",
            StatePath::Monitoring(_) => "monitoring",
            StatePath::Migration(_) => "migration",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            StatePath::Data(k) => k.as_str(),
            StatePath::Ui(k) => k.as_str(),
            StatePath::Modal(k) => k.as_str(),
            StatePath::Monitoring(k) => k.as_str(),
            StatePath::Migration(k) => k.as_str(),
        }
    }

    /// Every known path, section by section.
    pub fn all() -> Vec<StatePath> {
        DataKey::ALL
            .iter()
            .copied()
            .map(StatePath::Data)
            .chain(UiKey::ALL.iter().copied().map(StatePath::Ui))
            .chain(ModalKey::ALL.iter().copied().map(StatePath::Modal))
            .chain(MonitoringKey::ALL.iter().copied().map(StatePath::Monitoring))
            .chain(MigrationKey::ALL.iter().copied().map(StatePath::Migration))
            .collect()
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key())
    }
}

impl std::str::FromStr for StatePath {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatePath::parse(s).ok_or_else(|| crate::Error::UnknownStatePath(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(
            StatePath::parse("ui.activeTab"),
            Some(StatePath::Ui(UiKey::ActiveTab))
        );
        assert_eq!(
            StatePath::parse("modal.currentSQL"),
            Some(StatePath::Modal(ModalKey::CurrentSql))
        );
        assert_eq!(StatePath::parse("ui.nope"), None);
        assert_eq!(StatePath::parse("modals.currentSQL"), None);
        assert_eq!(StatePath::parse("activeTab"), None);
    }

    #[test]
    fn test_display_round_trips_every_path() {
        for path in StatePath::all() {
            assert_eq!(StatePath::parse(&path.to_string()), Some(path));
        }
        assert_eq!(StatePath::all().len(), 20);
    }
}
