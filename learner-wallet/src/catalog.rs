//! Reward catalog.
//!
//! Courses and books are *scopes*; their lessons and chapters are reward
//! units. The catalog is read-only to the ledger: it only answers which
//! unit pays what.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use reward_ledger::{Cents, CompletionRecord, RewardUnit};

/// Catalog lookup and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown course or book: {0}")]
    UnknownScope(String),

    #[error("Unknown unit {unit} in {scope}")]
    UnknownUnit { scope: String, unit: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Invalid catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Whether a scope is a course or a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeKind {
    /// Lessons pay points and cash
    Course,
    /// Chapters pay points only
    Book,
}

/// A course or book and its reward units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CatalogScope {
    pub id: String,
    pub title: String,
    pub kind: ScopeKind,
    pub units: Vec<RewardUnit>,
}

impl CatalogScope {
    pub fn unit(&self, unit_id: &str) -> Option<&RewardUnit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }

    /// Points and cash paid for completing every unit, before multipliers.
    pub fn reward_pool(&self) -> (u64, Cents) {
        self.units.iter().fold((0, Cents::ZERO), |(points, cash), unit| {
            (
                points.saturating_add(unit.reward_points),
                cash.checked_add(unit.reward_cash).unwrap_or(Cents::new(u64::MAX)),
            )
        })
    }
}

/// Source of reward metadata.
pub trait CatalogProvider: Send + Sync {
    /// All scopes, in display order.
    fn scopes(&self) -> Vec<CatalogScope>;

    fn scope(&self, scope_id: &str) -> Option<CatalogScope>;

    /// Resolve one unit.
    fn unit(&self, scope_id: &str, unit_id: &str) -> Result<RewardUnit, CatalogError> {
        let scope = self
            .scope(scope_id)
            .ok_or_else(|| CatalogError::UnknownScope(scope_id.to_string()))?;
        scope
            .unit(unit_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownUnit {
                scope: scope_id.to_string(),
                unit: unit_id.to_string(),
            })
    }

    /// Percentage of a scope's units present in `record`, rounded half up.
    fn progress(&self, scope_id: &str, record: Option<&CompletionRecord>) -> Option<u8> {
        let scope = self.scope(scope_id)?;
        if scope.units.is_empty() {
            return Some(100);
        }
        let done = record
            .map(|record| scope.units.iter().filter(|unit| record.contains(&unit.id)).count())
            .unwrap_or(0);
        let total = scope.units.len();
        Some(((done * 200 + total) / (2 * total)) as u8)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    scopes: Vec<CatalogScope>,
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    scopes: Vec<CatalogScope>,
}

impl StaticCatalog {
    /// Build a catalog. Scope IDs and unit IDs within a scope must be unique.
    pub fn new(scopes: Vec<CatalogScope>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for scope in &scopes {
            if !seen.insert(scope.id.as_str()) {
                return Err(CatalogError::Duplicate(format!("scope {}", scope.id)));
            }
            let mut units = HashSet::new();
            for unit in &scope.units {
                if !units.insert(unit.id.as_str()) {
                    return Err(CatalogError::Duplicate(format!("unit {} in {}", unit.id, scope.id)));
                }
            }
        }
        Ok(Self { scopes })
    }

    /// Load catalog from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.scopes)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(&CatalogFile {
            scopes: self.scopes.clone(),
        })?)
    }

    /// The platform's built-in courses and books.
    pub fn seeded() -> Self {
        let lesson = |id: &str, title: &str, points: u64, dollars: u64| {
            RewardUnit::new(id, points, Cents::from_dollars(dollars)).with_title(title)
        };
        let chapter = |id: &str, title: &str, points: u64| RewardUnit::new(id, points, Cents::ZERO).with_title(title);

        Self {
            scopes: vec![
                CatalogScope {
                    id: "1".to_string(),
                    title: "Financial Freedom 101".to_string(),
                    kind: ScopeKind::Course,
                    units: vec![
                        lesson("l1", "Mindset Shift", 20, 5),
                        lesson("l2", "Scarcity vs Abundance", 20, 5),
                        lesson("l3", "The Snowball Method", 50, 15),
                    ],
                },
                CatalogScope {
                    id: "2".to_string(),
                    title: "Mastering React & TS".to_string(),
                    kind: ScopeKind::Course,
                    units: vec![
                        lesson("rl1", "useState Deep Dive", 30, 10),
                        lesson("rl2", "useEffect Lifecycle", 30, 10),
                    ],
                },
                CatalogScope {
                    id: "b1".to_string(),
                    title: "The Intelligent Investor 2024".to_string(),
                    kind: ScopeKind::Book,
                    units: vec![
                        chapter("c1", "Investment vs Speculation", 15),
                        chapter("c2", "The Investor and Inflation", 15),
                    ],
                },
                CatalogScope {
                    id: "b2".to_string(),
                    title: "Algorithms to Live By".to_string(),
                    kind: ScopeKind::Book,
                    units: vec![chapter("c1", "Optimal Stopping", 20)],
                },
                CatalogScope {
                    id: "b3".to_string(),
                    title: "Atomic Habits".to_string(),
                    kind: ScopeKind::Book,
                    units: vec![chapter("c1", "The Power of 1%", 10)],
                },
            ],
        }
    }
}

impl CatalogProvider for StaticCatalog {
    fn scopes(&self) -> Vec<CatalogScope> {
        self.scopes.clone()
    }

    fn scope(&self, scope_id: &str) -> Option<CatalogScope> {
        self.scopes.iter().find(|scope| scope.id == scope_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_units() {
        let catalog = StaticCatalog::seeded();
        let l3 = catalog.unit("1", "l3").unwrap();
        assert_eq!(l3.reward_points, 50);
        assert_eq!(l3.reward_cash, Cents::from_dollars(15));

        let chapter = catalog.unit("b2", "c1").unwrap();
        assert_eq!(chapter.reward_points, 20);
        assert!(chapter.reward_cash.is_zero());

        assert_eq!(catalog.scopes().len(), 5);
        assert_eq!(
            catalog.scope("1").unwrap().reward_pool(),
            (90, Cents::from_dollars(25))
        );
    }

    #[test]
    fn test_unknown_lookups() {
        let catalog = StaticCatalog::seeded();
        assert!(matches!(catalog.unit("9", "l1"), Err(CatalogError::UnknownScope(_))));
        assert!(matches!(catalog.unit("1", "zz"), Err(CatalogError::UnknownUnit { .. })));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let catalog = StaticCatalog::seeded();
        let yaml = catalog.to_yaml().unwrap();
        let parsed = StaticCatalog::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.scopes(), catalog.scopes());
    }

    #[test]
    fn test_yaml_with_defaults() {
        let yaml = r#"
scopes:
  - id: workshop
    title: Budgeting Workshop
    kind: COURSE
    units:
      - id: w1
        rewardPoints: 5
        rewardCash: 250
"#;
        let catalog = StaticCatalog::from_yaml(yaml).unwrap();
        let unit = catalog.unit("workshop", "w1").unwrap();
        assert_eq!(unit.reward_cash, Cents::new(250));
        assert!(unit.title.is_empty());
    }

    #[test]
    fn test_duplicates_rejected() {
        let scope = CatalogScope {
            id: "1".to_string(),
            title: "Dup".to_string(),
            kind: ScopeKind::Course,
            units: vec![
                RewardUnit::new("l1", 1, Cents::ZERO),
                RewardUnit::new("l1", 2, Cents::ZERO),
            ],
        };
        assert!(matches!(StaticCatalog::new(vec![scope]), Err(CatalogError::Duplicate(_))));
    }

    #[test]
    fn test_progress() {
        let catalog = StaticCatalog::seeded();
        assert_eq!(catalog.progress("1", None), Some(0));
        assert_eq!(catalog.progress("missing", None), None);
    }
}
