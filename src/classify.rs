//! Entity classification and money-flow labels for the wire ledger.

use std::collections::HashSet;
use std::fmt;

/// Fill colours keyed by a fragment of the short flow label. First match wins.
const FLOW_FILLS: [(&str, u32); 8] = [
    ("MONEY IN", 0x00D5_F5E3),
    ("INTERNAL MOVE", 0x00FC_E4D6),
    ("MONEY OUT", 0x00FA_DBD8),
    ("BANK", 0x00D6_EAF8),
    ("SHELL", 0x00D6_EAF8),
    ("INTERBANK", 0x00F2_F3F4),
    ("PASS-THROUGH", 0x00F2_F3F4),
    ("EXTERNAL", 0x00F2_F3F4),
];

/// Names shorter than this (after trimming) are not classified.
const MIN_NAME_CHARS: usize = 3;

/// Fill for flow labels that match nothing in [`FLOW_FILLS`].
const PASS_FILL: u32 = 0x00F2_F3F4;

/// Keyword tables used to classify ledger entity names.
///
/// Patterns are lowercase substrings matched against the name lowercased with
/// `_` folded to a space. Bank patterns are checked before entity patterns.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classifier {
    /// Substrings that mark a bank or custodian.
    bank_patterns: Vec<String>,
    /// Substrings that mark an Epstein-controlled entity.
    entity_patterns: Vec<String>,
    /// Display names that are always shells, compared after trimming.
    shell_entities: HashSet<String>,
}

impl Classifier {
    /// Classify one entity name.
    pub fn classify(&self, name: &str) -> EntityKind {
        let trimmed = name.trim();
        if trimmed.chars().count() < MIN_NAME_CHARS {
            return EntityKind::Unknown;
        }
        let folded = fold(trimmed);
        if self.bank_patterns.iter().any(|p| return folded.contains(p.as_str())) {
            return EntityKind::Bank;
        }
        if self.entity_patterns.iter().any(|p| return folded.contains(p.as_str())) {
            return EntityKind::Epstein;
        }
        return EntityKind::External;
    }

    /// Whether `name` is a known shell or matches an entity pattern.
    ///
    /// Bank patterns are not consulted, so `Gratitude America Ltd. (First Bank PR)`
    /// is a shell even though it classifies as a bank.
    pub fn is_shell(&self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        if self.shell_entities.contains(trimmed) {
            return true;
        }
        let folded = fold(trimmed);
        return self.entity_patterns.iter().any(|p| return folded.contains(p.as_str()));
    }
}

/// What kind of party an entity name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Bank or custodian.
    Bank,
    /// Epstein-controlled trust, shell, account, or attorney.
    Epstein,
    /// Anyone else.
    External,
    /// Name too short to classify.
    Unknown,
}

impl EntityKind {
    /// Label used in report cells.
    pub const fn label(self) -> &'static str {
        return match self {
            Self::Bank => "BANK/CUSTODIAN",
            Self::Epstein => "EPSTEIN ENTITY",
            Self::External => "EXTERNAL PARTY",
            Self::Unknown => "UNKNOWN",
        };
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.label());
    }
}

/// Direction of a wire, from the kinds of its two parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flow {
    /// Bank paying a non-Epstein party.
    BankToExternal,
    /// Bank paying an Epstein entity.
    BankToShell,
    /// External party depositing at a bank.
    ExternalToBank,
    /// Between two banks.
    Interbank,
    /// Between two Epstein entities.
    InternalMove,
    /// External money entering the network.
    MoneyIn,
    /// Network money leaving to external beneficiaries.
    MoneyOut,
    /// Any pairing involving an unclassified name.
    Other {
        /// Kind of the paying party.
        from: EntityKind,
        /// Kind of the receiving party.
        to: EntityKind,
    },
    /// Between two external parties.
    PassThrough,
    /// Epstein entity depositing at a bank.
    ShellToBank,
}

impl Flow {
    /// Flow for a wire from a `from` party to a `to` party.
    pub const fn between(from: EntityKind, to: EntityKind) -> Self {
        return match (from, to) {
            (EntityKind::Bank, EntityKind::Bank) => Self::Interbank,
            (EntityKind::Bank, EntityKind::Epstein) => Self::BankToShell,
            (EntityKind::Bank, EntityKind::External) => Self::BankToExternal,
            (EntityKind::Epstein, EntityKind::Bank) => Self::ShellToBank,
            (EntityKind::Epstein, EntityKind::Epstein) => Self::InternalMove,
            (EntityKind::Epstein, EntityKind::External) => Self::MoneyOut,
            (EntityKind::External, EntityKind::Bank) => Self::ExternalToBank,
            (EntityKind::External, EntityKind::Epstein) => Self::MoneyIn,
            (EntityKind::External, EntityKind::External) => Self::PassThrough,
            (from, to) => Self::Other { from, to },
        };
    }

    /// One-line explanation, empty for [`Flow::Other`].
    pub const fn description(self) -> &'static str {
        return match self {
            Self::BankToExternal => "Custodian disbursement to non-Epstein party",
            Self::BankToShell => "Custodian disbursement to Epstein entity",
            Self::ExternalToBank => "External party depositing to bank",
            Self::Interbank => "Between financial institutions",
            Self::InternalMove => "Reshuffled between Epstein trusts/shells",
            Self::MoneyIn => "External funds entering Epstein network",
            Self::MoneyOut => "Funds leaving to external beneficiaries",
            Self::Other { .. } => "",
            Self::PassThrough => "Between external parties (attorney, trust admin)",
            Self::ShellToBank => "Epstein entity depositing to bank/custodian",
        };
    }

    /// Background fill for rows of this flow, as `0xRRGGBB`.
    pub fn fill(self) -> u32 {
        let short = self.short();
        return FLOW_FILLS
            .iter()
            .find(|(key, _)| return short.contains(key))
            .map_or(PASS_FILL, |&(_, rgb)| return rgb);
    }

    /// Short label such as `MONEY IN` or `BANK → SHELL`.
    pub fn short(self) -> String {
        let fixed = match self {
            Self::BankToExternal => "BANK → EXTERNAL",
            Self::BankToShell => "BANK → SHELL",
            Self::ExternalToBank => "EXTERNAL → BANK",
            Self::Interbank => "INTERBANK",
            Self::InternalMove => "INTERNAL MOVE",
            Self::MoneyIn => "MONEY IN",
            Self::MoneyOut => "MONEY OUT",
            Self::Other { from, to } => return format!("{from} → {to}"),
            Self::PassThrough => "PASS-THROUGH",
            Self::ShellToBank => "SHELL → BANK",
        };
        return fixed.to_string();
    }
}

/// Lowercase and fold `_` to a space for pattern matching.
fn fold(name: &str) -> String {
    return name.to_lowercase().replace('_', " ");
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        return toml::from_str(
            r#"
            bank_patterns = ["deutsche", "ubs "]
            entity_patterns = ["southern trust", "haze trust", "kahn"]
            shell_entities = ["Plan D LLC"]
            "#,
        )
        .unwrap();
    }

    #[test]
    fn bank_patterns_win_over_entity_patterns() {
        let c = classifier();
        assert_eq!(c.classify("The Haze Trust (Deutsche)"), EntityKind::Bank);
        assert_eq!(c.classify("The Haze Trust"), EntityKind::Epstein);
    }

    #[test]
    fn underscores_fold_to_spaces() {
        let c = classifier();
        assert_eq!(c.classify("SOUTHERN_TRUST"), EntityKind::Epstein);
        assert!(c.is_shell("SOUTHERN_TRUST"));
    }

    #[test]
    fn short_names_are_unknown() {
        let c = classifier();
        assert_eq!(c.classify("  AB "), EntityKind::Unknown);
        assert_eq!(c.classify(""), EntityKind::Unknown);
        assert_eq!(c.classify("Leon Black"), EntityKind::External);
    }

    #[test]
    fn shell_list_is_exact_after_trim() {
        let c = classifier();
        assert!(c.is_shell(" Plan D LLC "));
        assert!(!c.is_shell("plan d llc"));
        assert!(!c.is_shell(""));
        assert!(!c.is_shell("UBS AG"));
    }

    #[test]
    fn flow_labels_cover_every_known_pair() {
        assert_eq!(Flow::between(EntityKind::External, EntityKind::Epstein).short(), "MONEY IN");
        assert_eq!(Flow::between(EntityKind::Bank, EntityKind::Epstein).short(), "BANK → SHELL");
        assert_eq!(Flow::between(EntityKind::Bank, EntityKind::Bank).short(), "INTERBANK");
        let other = Flow::between(EntityKind::Unknown, EntityKind::Epstein);
        assert_eq!(other.short(), "UNKNOWN → EPSTEIN ENTITY");
        assert_eq!(other.description(), "");
    }

    #[test]
    fn flow_fill_takes_first_matching_fragment() {
        assert_eq!(Flow::MoneyIn.fill(), 0x00D5_F5E3);
        assert_eq!(Flow::ExternalToBank.fill(), 0x00D6_EAF8);
        assert_eq!(Flow::Interbank.fill(), 0x00D6_EAF8);
        assert_eq!(Flow::PassThrough.fill(), 0x00F2_F3F4);
        assert_eq!(Flow::between(EntityKind::Unknown, EntityKind::Unknown).fill(), PASS_FILL);
    }
}
