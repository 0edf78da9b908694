//! Core type definitions for Outpost.

use std::fmt;

/// The synced entity collections managed by Outpost.
///
/// Each kind owns one storage slot (`<namespace>_<slot>`), maps to one
/// remote table and appears under one field of a full backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKind {
    /// Gate log: vehicle and visitor entries.
    Entries,
    /// Utility meters.
    Meters,
    /// Meter readings.
    Readings,
    /// Received packages.
    Packages,
    /// Work shifts.
    Shifts,
    /// Breakfast list.
    Breakfast,
    /// Patrol rounds.
    Patrols,
    /// Operational audit log.
    Logs,
}

impl CollectionKind {
    /// Every synced collection, in backup order.
    pub const ALL: [CollectionKind; 8] = [
        CollectionKind::Entries,
        CollectionKind::Breakfast,
        CollectionKind::Packages,
        CollectionKind::Meters,
        CollectionKind::Readings,
        CollectionKind::Shifts,
        CollectionKind::Logs,
        CollectionKind::Patrols,
    ];

    /// Storage slot suffix.
    #[must_use]
    pub const fn slot(self) -> &'static str {
        match self {
            CollectionKind::Entries => "entries",
            CollectionKind::Meters => "meters",
            CollectionKind::Readings => "meter_readings",
            CollectionKind::Packages => "packages",
            CollectionKind::Shifts => "shifts",
            CollectionKind::Breakfast => "breakfast",
            CollectionKind::Patrols => "patrols",
            CollectionKind::Logs => "logs",
        }
    }

    /// Name of the remote table, also recorded in tombstones.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            CollectionKind::Entries => "vehicle_entries",
            CollectionKind::Meters => "meters",
            CollectionKind::Readings => "meter_readings",
            CollectionKind::Packages => "packages",
            CollectionKind::Shifts => "work_shifts",
            CollectionKind::Breakfast => "breakfast_list",
            CollectionKind::Patrols => "patrols",
            CollectionKind::Logs => "app_logs",
        }
    }

    /// Field name of this collection in a full backup.
    #[must_use]
    pub const fn backup_field(self) -> &'static str {
        match self {
            CollectionKind::Entries => "entries",
            CollectionKind::Meters => "meters",
            CollectionKind::Readings => "readings",
            CollectionKind::Packages => "packages",
            CollectionKind::Shifts => "shifts",
            CollectionKind::Breakfast => "breakfast",
            CollectionKind::Patrols => "patrols",
            CollectionKind::Logs => "logs",
        }
    }

    /// Looks up a kind by slot, remote table or backup field name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.slot() == name || k.table() == name || k.backup_field() == name)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot())
    }
}

/// Who performed an action, for attribution in the audit log.
///
/// Passed explicitly into log-creating calls instead of being read from
/// a process-wide session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorContext {
    operator_name: Option<String>,
}

impl OperatorContext {
    /// Name recorded when no operator is logged in.
    pub const SYSTEM_NAME: &'static str = "Sistema";

    /// An action performed by the system itself.
    #[must_use]
    pub fn system() -> Self {
        Self::default()
    }

    /// An action performed by the named operator.
    #[must_use]
    pub fn operator(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            operator_name: (!name.trim().is_empty()).then_some(name),
        }
    }

    /// The operator name, if one is logged in.
    #[must_use]
    pub fn operator_name(&self) -> Option<&str> {
        self.operator_name.as_deref()
    }

    /// The name to record in a log entry.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.operator_name().unwrap_or(Self::SYSTEM_NAME)
    }
}
