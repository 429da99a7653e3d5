// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the scheduler, orchestrator, and storage collaborators.
//!
//! Artifact file names are the only source of ordering information: every
//! name encodes its unit, namespace, category, and a sortable timestamp, so
//! retention never depends on filesystem metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::KeeperError;

/// File extension carried by every artifact.
pub const ARTIFACT_EXTENSION: &str = ".tar.gz";

const STAGING_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIER_DATE_FORMAT: &str = "%Y%m%d";

/// One of the three backup cadences.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
}

impl Tier {
    /// All tiers in evaluation order.
    pub const ALL: [Tier; 3] = [Tier::Daily, Tier::Weekly, Tier::Monthly];
}

/// The two artifact kinds every unit must produce.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Application,
    Database,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Application, Category::Database];

    /// Marker used in staging file names (`{unit}_backup_...`, `{unit}_db_backup_...`).
    fn staging_marker(self) -> &'static str {
        match self {
            Category::Application => "backup",
            Category::Database => "db_backup",
        }
    }
}

/// Where an artifact lives: the untiered staging area or one tier's directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Staging,
    Tier(Tier),
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Staging => f.write_str("staging"),
            Namespace::Tier(tier) => write!(f, "{tier}"),
        }
    }
}

/// Check that a unit name is usable inside artifact file names.
///
/// Underscores are the field separator in artifact names, so only lowercase
/// ASCII alphanumerics and hyphens are accepted.
pub fn validate_unit_name(name: &str) -> Result<(), KeeperError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(KeeperError::InvalidUnitName(name.to_string()))
    }
}

/// One backed-up subject (an application's data plus its database).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupUnit {
    name: String,
}

impl BackupUnit {
    pub fn new(name: impl Into<String>) -> Result<Self, KeeperError> {
        let name = name.into();
        validate_unit_name(&name)?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for BackupUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An immutable, timestamped backup output of one unit and category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub unit: String,
    pub category: Category,
    pub namespace: Namespace,
    pub created: NaiveDateTime,
}

impl Artifact {
    /// A freshly produced artifact in the staging area.
    pub fn staged(unit: &str, category: Category, created: NaiveDateTime) -> Self {
        Self {
            unit: unit.to_string(),
            category,
            namespace: Namespace::Staging,
            created: truncate_to_seconds(created),
        }
    }

    /// A tier copy; tier names carry only the date.
    pub fn tiered(unit: &str, tier: Tier, category: Category, date: NaiveDate) -> Self {
        Self {
            unit: unit.to_string(),
            category,
            namespace: Namespace::Tier(tier),
            created: date.and_time(NaiveTime::MIN),
        }
    }

    /// The artifact's file name inside its namespace directory.
    pub fn file_name(&self) -> String {
        match self.namespace {
            Namespace::Staging => format!(
                "{}_{}_{}{ARTIFACT_EXTENSION}",
                self.unit,
                self.category.staging_marker(),
                self.created.format(STAGING_TIMESTAMP_FORMAT)
            ),
            Namespace::Tier(tier) => format!(
                "{}_{}_{}_{}{ARTIFACT_EXTENSION}",
                self.unit,
                tier,
                self.category,
                self.created.date().format(TIER_DATE_FORMAT)
            ),
        }
    }

    /// Recover an artifact from a file name found in `namespace`.
    ///
    /// Returns `None` for anything that does not follow the naming scheme,
    /// including tier files that name a different tier than their directory.
    pub fn parse(namespace: Namespace, file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(ARTIFACT_EXTENSION)?;
        match namespace {
            Namespace::Staging => parse_staged(stem),
            Namespace::Tier(tier) => parse_tiered(tier, stem),
        }
    }
}

fn parse_staged(stem: &str) -> Option<Artifact> {
    let mut parts = stem.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    let rest = parts.next()?;

    let created =
        NaiveDateTime::parse_from_str(&format!("{date}_{time}"), STAGING_TIMESTAMP_FORMAT).ok()?;

    let (unit, category) = if let Some(unit) = rest.strip_suffix("_db_backup") {
        (unit, Category::Database)
    } else if let Some(unit) = rest.strip_suffix("_backup") {
        (unit, Category::Application)
    } else {
        return None;
    };
    validate_unit_name(unit).ok()?;

    Some(Artifact {
        unit: unit.to_string(),
        category,
        namespace: Namespace::Staging,
        created,
    })
}

fn parse_tiered(tier: Tier, stem: &str) -> Option<Artifact> {
    let mut parts = stem.rsplitn(4, '_');
    let date = parts.next()?;
    let category = Category::from_str(parts.next()?).ok()?;
    let named_tier = Tier::from_str(parts.next()?).ok()?;
    let unit = parts.next()?;

    if named_tier != tier {
        return None;
    }
    validate_unit_name(unit).ok()?;
    let date = NaiveDate::parse_from_str(date, TIER_DATE_FORMAT).ok()?;

    Some(Artifact::tiered(unit, tier, category, date))
}

fn truncate_to_seconds(at: NaiveDateTime) -> NaiveDateTime {
    at.with_nanosecond(0).unwrap_or(at)
}

/// Sort artifacts newest first by their name-derived timestamp.
pub fn sort_newest_first(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| {
        b.created
            .cmp(&a.created)
            .then_with(|| b.file_name().cmp(&a.file_name()))
    });
}

/// The timestamp meaning "this tier has never run".
pub fn never_run() -> NaiveDateTime {
    DateTime::UNIX_EPOCH.naive_utc()
}

/// Last-run timestamps per tier, owned by the scheduler runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    #[serde(default)]
    last_run: BTreeMap<Tier, NaiveDateTime>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `tier` last ran, or the epoch if it never did.
    pub fn last_run(&self, tier: Tier) -> NaiveDateTime {
        self.last_run.get(&tier).copied().unwrap_or_else(never_run)
    }

    /// Whether `tier` has run since this state was created or restored.
    pub fn has_run(&self, tier: Tier) -> bool {
        self.last_run.contains_key(&tier)
    }

    pub fn record(&mut self, tier: Tier, at: NaiveDateTime) {
        self.last_run.insert(tier, at);
    }
}
