// 🏷️ Commission Rules - Rules as Data
// Lane (origin ↔ destination) → driver commission value

use crate::normalize::normalize_key;
use serde::{Deserialize, Serialize};

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    /// Rule ID for tracking
    pub id: String,

    pub origin: String,
    pub destination: String,

    /// Commission paid to the driver for a trip on this lane
    pub commission_value: f64,
}

impl CommissionRule {
    pub fn new(id: &str, origin: &str, destination: &str, commission_value: f64) -> Self {
        CommissionRule {
            id: id.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            commission_value,
        }
    }

    /// Lanes are undirected: A→B and B→A are the same lane
    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        Lane::new(&self.origin, &self.destination).matches(&Lane::new(origin, destination))
    }
}

/// Normalized lane endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
struct Lane {
    a: String,
    b: String,
}

impl Lane {
    fn new(origin: &str, destination: &str) -> Self {
        Lane {
            a: normalize_key(origin),
            b: normalize_key(destination),
        }
    }

    fn matches(&self, other: &Lane) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

// ============================================================================
// COMMISSION TABLE
// ============================================================================

/// Commission rule table, searched in the order the rules were given
#[derive(Debug, Clone, Default)]
pub struct CommissionTable {
    rules: Vec<(Lane, CommissionRule)>,
}

impl CommissionTable {
    pub fn new() -> Self {
        CommissionTable { rules: Vec::new() }
    }

    pub fn from_rules(rules: Vec<CommissionRule>) -> Self {
        let mut table = CommissionTable::new();
        for rule in rules {
            table.add_rule(rule);
        }
        table
    }

    pub fn add_rule(&mut self, rule: CommissionRule) {
        let lane = Lane::new(&rule.origin, &rule.destination);
        self.rules.push((lane, rule));
    }

    /// First rule whose lane matches (origin, destination) in either order
    pub fn lookup(&self, origin: &str, destination: &str) -> Option<&CommissionRule> {
        let lane = Lane::new(origin, destination);
        self.rules
            .iter()
            .find(|(rule_lane, _)| rule_lane.matches(&lane))
            .map(|(_, rule)| rule)
    }

    /// Commission for a lane, None when no rule covers it
    pub fn commission_for(&self, origin: &str, destination: &str) -> Option<f64> {
        self.lookup(origin, destination).map(|rule| rule.commission_value)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_matches_both_directions() {
        let rule = CommissionRule::new("r1", "A", "B", 50.0);

        assert!(rule.matches("A", "B"));
        assert!(rule.matches("B", "A"));
        assert!(!rule.matches("A", "C"));
        assert!(!rule.matches("A", "A"));
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let table = CommissionTable::from_rules(vec![CommissionRule::new("r1", "A", "B", 50.0)]);

        assert_eq!(table.commission_for("A", "B"), Some(50.0));
        assert_eq!(table.commission_for("B", "A"), Some(50.0));
    }

    #[test]
    fn test_lookup_normalizes_city_names() {
        let table = CommissionTable::from_rules(vec![CommissionRule::new(
            "r1",
            "São Paulo",
            "Rio de Janeiro",
            120.0,
        )]);

        assert_eq!(table.commission_for("SAO PAULO", "rio de janeiro"), Some(120.0));
        assert_eq!(table.commission_for("Rio De Janeiro ", "sao paulo"), Some(120.0));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = CommissionTable::from_rules(vec![
            CommissionRule::new("first", "SP", "RJ", 100.0),
            CommissionRule::new("second", "RJ", "SP", 80.0),
        ]);

        assert_eq!(table.lookup("RJ", "SP").map(|r| r.id.as_str()), Some("first"));
    }

    #[test]
    fn test_zero_rule_is_not_absent() {
        let table = CommissionTable::from_rules(vec![CommissionRule::new("r0", "SP", "BH", 0.0)]);

        assert_eq!(table.commission_for("SP", "BH"), Some(0.0));
        assert_eq!(table.commission_for("SP", "RJ"), None);
    }
}
