//! Pre-migration static analyzer.
//!
//! A pure function over `FirewallConfig` producing an `AnalysisReport`:
//! duplicate detection, shadow detection, security-risk scoring, and
//! zero-hit-rule detection (spec.md §4.3). Never mutates its input.

use crate::ir::{Address, FirewallConfig, Rule, Service, is_subset_with_universal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Severity of a security finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskSeverity {
    fn weight(self) -> i64 {
        match self {
            Self::Critical => 20,
            Self::High => 10,
            Self::Medium => 5,
            Self::Low => 2,
        }
    }
}

/// A group of entities (addresses or services) sharing a canonical key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub original: String,
    pub duplicates: Vec<String>,
}

/// Rule `rule` is shadowed by the earlier-matching `shadowed_by`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlappingRule {
    pub shadowed_by: String,
    pub rule: String,
}

/// A single security-risk finding attached to one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRisk {
    pub rule: String,
    pub severity: RiskSeverity,
    pub reason: String,
}

/// Full analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub duplicate_addresses: Vec<DuplicateGroup>,
    pub duplicate_services: Vec<DuplicateGroup>,
    pub overlapping_rules: Vec<OverlappingRule>,
    pub security_risks: Vec<SecurityRisk>,
    pub zero_hit_rules: Vec<String>,
    pub optimization_score: i64,
    pub security_score: i64,
    pub complexity_score: i64,
    pub overall_score: i64,
}

/// Run the full analysis pipeline over a config. Pure: never mutates `config`.
#[must_use]
pub fn analyze(config: &FirewallConfig) -> AnalysisReport {
    let duplicate_addresses = find_duplicate_addresses(config);
    let duplicate_services = find_duplicate_services(config);
    let overlapping_rules = find_shadowed_rules(config);
    let security_risks = find_security_risks(config);
    let zero_hit_rules = find_zero_hit_rules(config);

    let duplicate_count = duplicate_addresses.len() + duplicate_services.len();
    let optimization_score = clamp_score(100 - 5 * duplicate_count as i64 - 2 * zero_hit_rules.len() as i64);

    let security_penalty: i64 = security_risks.iter().map(|r| r.severity.weight()).sum();
    let security_score = clamp_score(100 - security_penalty);

    let rule_count = config.rules.len();
    let size_penalty = if rule_count > 500 {
        20
    } else if rule_count > 200 {
        10
    } else {
        0
    };
    let complexity_score = clamp_score(100 - 10 * overlapping_rules.len() as i64 - size_penalty);

    let overall = 0.25 * optimization_score as f64 + 0.50 * security_score as f64 + 0.25 * complexity_score as f64;
    let overall_score = clamp_score(overall.round() as i64);

    info!(
        optimization_score,
        security_score, complexity_score, overall_score, "analysis complete"
    );

    AnalysisReport {
        duplicate_addresses,
        duplicate_services,
        overlapping_rules,
        security_risks,
        zero_hit_rules,
        optimization_score,
        security_score,
        complexity_score,
        overall_score,
    }
}

fn clamp_score(score: i64) -> i64 {
    score.clamp(0, 100)
}

fn find_duplicate_addresses(config: &FirewallConfig) -> Vec<DuplicateGroup> {
    group_by_fingerprint(config.addresses.values(), Address::fingerprint)
}

fn find_duplicate_services(config: &FirewallConfig) -> Vec<DuplicateGroup> {
    group_by_fingerprint(config.services.values(), Service::fingerprint)
}

fn group_by_fingerprint<'a, T: 'a>(
    items: impl Iterator<Item = &'a T>,
    fingerprint: impl Fn(&T) -> String,
) -> Vec<DuplicateGroup>
where
    T: Named,
{
    let mut by_key: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        by_key.entry(fingerprint(item)).or_default().push(item.name().to_string());
    }
    by_key
        .into_iter()
        .filter_map(|(key, mut names)| {
            if names.len() < 2 {
                return None;
            }
            names.sort();
            let original = names.remove(0);
            Some(DuplicateGroup {
                key,
                original,
                duplicates: names,
            })
        })
        .collect()
}

trait Named {
    fn name(&self) -> &str;
}

impl Named for Address {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Service {
    fn name(&self) -> &str {
        &self.name
    }
}

/// O(n²) ordered-pair subset check over `config.rules_in_order()` (spec.md
/// §4.3, §9 Open Questions notes this does not scale past ~10k rules).
fn find_shadowed_rules(config: &FirewallConfig) -> Vec<OverlappingRule> {
    let rules = config.rules_in_order();
    let mut overlaps = Vec::new();
    for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            let (earlier, later) = (rules[i], rules[j]);
            if earlier.action == later.action && rule_is_shadowed(earlier, later) {
                overlaps.push(OverlappingRule {
                    shadowed_by: earlier.name.clone(),
                    rule: later.name.clone(),
                });
            }
        }
    }
    overlaps
}

fn rule_is_shadowed(broader: &Rule, narrower: &Rule) -> bool {
    is_subset_with_universal(&narrower.sources, &broader.sources)
        && is_subset_with_universal(&narrower.destinations, &broader.destinations)
        && is_subset_with_universal(&narrower.services, &broader.services)
}

fn find_security_risks(config: &FirewallConfig) -> Vec<SecurityRisk> {
    let mut risks = Vec::new();
    for rule in &config.rules {
        if rule.action != crate::ir::RuleAction::Allow {
            continue;
        }
        if rule.is_fully_open() {
            risks.push(SecurityRisk {
                rule: rule.name.clone(),
                severity: RiskSeverity::Critical,
                reason: "allow rule with source, destination, and service all unrestricted".into(),
            });
        } else if crate::ir::is_universal_set(&rule.services) {
            risks.push(SecurityRisk {
                rule: rule.name.clone(),
                severity: RiskSeverity::High,
                reason: "allow rule permits any service".into(),
            });
        }
        if !rule.log {
            risks.push(SecurityRisk {
                rule: rule.name.clone(),
                severity: RiskSeverity::Medium,
                reason: "logging disabled on an allow rule".into(),
            });
        }
    }
    for rule in &config.rules {
        if !rule.enabled {
            risks.push(SecurityRisk {
                rule: rule.name.clone(),
                severity: RiskSeverity::Low,
                reason: "rule is disabled; candidate for cleanup".into(),
            });
        }
        if rule.remark.is_none() {
            risks.push(SecurityRisk {
                rule: rule.name.clone(),
                severity: RiskSeverity::Low,
                reason: "rule has no remark/description".into(),
            });
        }
    }
    risks
}

/// Flag enabled rules with `hit_count == Some(0)`, but only if at least one
/// rule in the config carries non-zero hit-count data — otherwise hit-count
/// is assumed absent entirely (spec.md §4.3).
fn find_zero_hit_rules(config: &FirewallConfig) -> Vec<String> {
    let has_hit_data = config.rules.iter().any(|r| matches!(r.hit_count, Some(n) if n > 0));
    if !has_hit_data {
        return Vec::new();
    }
    config
        .rules
        .iter()
        .filter(|r| r.enabled && r.hit_count == Some(0))
        .map(|r| r.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AddressKind, RuleAction};
    use std::collections::BTreeSet;

    fn rule(name: &str, sources: &[&str], destinations: &[&str], services: &[&str]) -> Rule {
        Rule {
            sequence_id: 0,
            name: name.to_string(),
            action: RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            destinations: destinations.iter().map(|s| s.to_string()).collect(),
            services: services.iter().map(|s| s.to_string()).collect(),
            applications: BTreeSet::new(),
            remark: Some("documented".to_string()),
        }
    }

    #[test]
    fn detects_duplicate_addresses_by_fingerprint() {
        let mut config = FirewallConfig::new();
        config.addresses.insert(
            "a".to_string(),
            Address {
                name: "a".to_string(),
                kind: AddressKind::Host,
                value1: "1.2.3.4".to_string(),
                value2: None,
            },
        );
        config.addresses.insert(
            "b".to_string(),
            Address {
                name: "b".to_string(),
                kind: AddressKind::Host,
                value1: "1.2.3.4".to_string(),
                value2: None,
            },
        );
        let report = analyze(&config);
        assert_eq!(report.duplicate_addresses.len(), 1);
        assert_eq!(report.duplicate_addresses[0].original, "a");
        assert_eq!(report.duplicate_addresses[0].duplicates, vec!["b".to_string()]);
    }

    #[test]
    fn shadow_detection_matches_scenario_from_spec() {
        let mut config = FirewallConfig::new();
        config.rules.push(Rule {
            sequence_id: 1,
            ..rule("A", &["any"], &["any"], &["any"])
        });
        config.rules.push(Rule {
            sequence_id: 2,
            ..rule("B", &["host_1.2.3.4"], &["host_5.6.7.8"], &["TCP_80"])
        });

        let report = analyze(&config);
        assert_eq!(report.overlapping_rules.len(), 1);
        assert_eq!(report.overlapping_rules[0].shadowed_by, "A");
        assert_eq!(report.overlapping_rules[0].rule, "B");
    }

    #[test]
    fn fully_open_allow_rule_is_critical() {
        let mut config = FirewallConfig::new();
        let mut r = rule("open", &["any"], &["any"], &["any"]);
        r.log = true;
        config.rules.push(r);

        let report = analyze(&config);
        assert!(report
            .security_risks
            .iter()
            .any(|risk| risk.rule == "open" && risk.severity == RiskSeverity::Critical));
    }

    #[test]
    fn zero_hit_rules_require_some_nonzero_hit_data_present() {
        let mut config = FirewallConfig::new();
        let mut no_data = rule("no-data", &["any"], &["any"], &["any"]);
        no_data.hit_count = Some(0);
        config.rules.push(no_data);
        // No rule anywhere has non-zero hit_count: treated as absent data.
        assert!(analyze(&config).zero_hit_rules.is_empty());

        let mut with_data = rule("with-data", &["any"], &["any"], &["any"]);
        with_data.hit_count = Some(5);
        config.rules.push(with_data);
        let report = analyze(&config);
        assert_eq!(report.zero_hit_rules, vec!["no-data".to_string()]);
    }

    #[test]
    fn overall_score_is_always_within_bounds() {
        let config = FirewallConfig::new();
        let report = analyze(&config);
        assert!((0..=100).contains(&report.overall_score));
    }
}
