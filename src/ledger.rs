//! The master wire ledger and the aggregates the workbook is built from.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::classify::{Classifier, EntityKind, Flow};
use crate::error::Error;

/// Names this short or shorter are left out of per-entity positions.
const MIN_POSITION_CHARS: usize = 2;

/// Inflow and outflow totals for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntityFlows {
    /// Wires received.
    pub in_count: u32,
    /// Sum of wires received.
    pub inflow: f64,
    /// Wires sent.
    pub out_count: u32,
    /// Sum of wires sent.
    pub outflow: f64,
}

impl EntityFlows {
    /// Inflow minus outflow.
    pub const fn net(&self) -> f64 {
        return self.inflow - self.outflow;
    }

    /// Record a received wire.
    fn receive(&mut self, amount: f64) {
        self.inflow += amount;
        self.in_count = self.in_count.saturating_add(1);
    }

    /// Record a sent wire.
    fn send(&mut self, amount: f64) {
        self.outflow += amount;
        self.out_count = self.out_count.saturating_add(1);
    }

    /// Inflow plus outflow, the ordering key for entity tables.
    pub const fn volume(&self) -> f64 {
        return self.inflow + self.outflow;
    }
}

/// One entity's position across the whole ledger.
#[derive(Debug, Clone)]
pub struct EntityPosition {
    /// Totals in and out.
    pub flows: EntityFlows,
    /// Classification of the name.
    pub kind: EntityKind,
    /// Sanitized display name.
    pub name: String,
    /// Whether the name is a known or pattern-matched shell.
    pub shell: bool,
    /// Non-empty evidence sources seen on this entity's wires, sorted.
    pub sources: BTreeSet<String>,
}

/// Wires sharing one flow direction.
#[derive(Debug, Clone)]
pub struct FlowSummary {
    /// Number of wires.
    pub count: u32,
    /// The direction.
    pub flow: Flow,
    /// Largest single wire.
    pub largest: f64,
    /// `from → to` of the largest wire, each side cut to 25 characters.
    pub largest_example: String,
    /// Sum of all wires.
    pub total: f64,
}

/// The whole ledger, as loaded from JSON.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Wires in file order.
    pub wires: Vec<Wire>,
}

impl Ledger {
    /// Wires above `threshold`, largest first.
    pub fn above(&self, threshold: f64) -> Vec<&Wire> {
        return self.by_amount_desc().into_iter().filter(|w| return w.amount > threshold).collect();
    }

    /// Every wire, largest first. Ties keep file order.
    pub fn by_amount_desc(&self) -> Vec<&Wire> {
        let mut sorted: Vec<&Wire> = self.wires.iter().collect();
        sorted.sort_by(|a, b| return b.amount.total_cmp(&a.amount));
        return sorted;
    }

    /// Group the wires by flow direction, largest total first.
    pub fn flow_summary(&self, classifier: &Classifier) -> Vec<FlowSummary> {
        let mut summaries: Vec<FlowSummary> = Vec::new();
        for wire in &self.wires {
            let flow = wire.flow(classifier);
            let index = match summaries.iter().position(|s| return s.flow == flow) {
                Some(index) => index,
                None => {
                    summaries.push(FlowSummary {
                        count: 0,
                        flow,
                        largest: 0.0,
                        largest_example: String::new(),
                        total: 0.0,
                    });
                    summaries.len().saturating_sub(1)
                },
            };
            let Some(summary) = summaries.get_mut(index) else {
                continue;
            };
            summary.count = summary.count.saturating_add(1);
            summary.total += wire.amount;
            if wire.amount > summary.largest {
                summary.largest = wire.amount;
                summary.largest_example = format!(
                    "{} → {}",
                    truncate_chars(&sanitize(&wire.entity_from), 25),
                    truncate_chars(&sanitize(&wire.entity_to), 25)
                );
            }
        }
        summaries.sort_by(|a, b| return b.total.total_cmp(&a.total));
        return summaries;
    }

    /// Totals per entity keyed by the raw name uppercased.
    pub fn flows_by_upper_name(&self) -> HashMap<String, EntityFlows> {
        let mut flows: HashMap<String, EntityFlows> = HashMap::new();
        for wire in &self.wires {
            if !wire.entity_from.is_empty() {
                flows.entry(wire.entity_from.to_uppercase()).or_default().send(wire.amount);
            }
            if !wire.entity_to.is_empty() {
                flows.entry(wire.entity_to.to_uppercase()).or_default().receive(wire.amount);
            }
        }
        return flows;
    }

    /// Count names by kind over both sides of every wire.
    pub fn kind_counts(&self, classifier: &Classifier) -> Vec<(EntityKind, u32)> {
        let mut counts: HashMap<EntityKind, u32> = HashMap::new();
        for wire in &self.wires {
            for name in [&wire.entity_from, &wire.entity_to] {
                let count = counts.entry(classifier.classify(name)).or_default();
                *count = count.saturating_add(1);
            }
        }
        let mut counts: Vec<(EntityKind, u32)> = counts.into_iter().collect();
        counts.sort();
        return counts;
    }

    /// Read a ledger from a JSON array of wire objects.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if `path` does not exist, `Error::Json` if
    /// it is not a wire array, and `Error::LedgerEmpty` if the array is empty.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.to_path_buf() });
        }
        let content = std::fs::read_to_string(path)?;
        let wires: Vec<Wire> = serde_json::from_str(&content)?;
        if wires.is_empty() {
            return Err(Error::LedgerEmpty { path: path.to_path_buf() });
        }
        return Ok(Self { wires });
    }

    /// Per-entity positions over sanitized names, highest volume first.
    pub fn positions(&self, classifier: &Classifier) -> Vec<EntityPosition> {
        let mut positions: Vec<EntityPosition> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for wire in &self.wires {
            let sides = [(sanitize(&wire.entity_from), false), (sanitize(&wire.entity_to), true)];
            for (name, incoming) in sides {
                if name.chars().count() <= MIN_POSITION_CHARS {
                    continue;
                }
                let at = *index.entry(name.clone()).or_insert_with(|| {
                    positions.push(EntityPosition {
                        flows: EntityFlows::default(),
                        kind: classifier.classify(&name),
                        name: name.clone(),
                        shell: classifier.is_shell(&name),
                        sources: BTreeSet::new(),
                    });
                    return positions.len().saturating_sub(1);
                });
                let Some(position) = positions.get_mut(at) else {
                    continue;
                };
                if incoming {
                    position.flows.receive(wire.amount);
                } else {
                    position.flows.send(wire.amount);
                }
                if !wire.source.is_empty() {
                    position.sources.insert(wire.source.clone());
                }
            }
        }
        positions.sort_by(|a, b| return b.flows.volume().total_cmp(&a.flows.volume()));
        return positions;
    }

    /// Wires whose amount appeared more than once in the amount-only dedup,
    /// grouped by amount to the cent. Groups are ordered by amount times
    /// instance count, largest first, and capped at `limit`.
    pub fn repeat_amounts(&self, limit: usize) -> Vec<RepeatGroup<'_>> {
        let mut groups: Vec<RepeatGroup<'_>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for wire in self.wires.iter().filter(|w| return w.was_in_amount_dedup.unwrap_or(false)) {
            let at = *index.entry(format!("{:.2}", wire.amount)).or_insert_with(|| {
                groups.push(RepeatGroup { amount: wire.amount, wires: Vec::new() });
                return groups.len().saturating_sub(1);
            });
            if let Some(group) = groups.get_mut(at) {
                group.wires.push(wire);
            }
        }
        groups.retain(|g| return g.wires.len() > 1);
        groups.sort_by(|a, b| return b.weight().total_cmp(&a.weight()));
        groups.truncate(limit);
        for group in &mut groups {
            group.wires.sort_by(|a, b| return a.date_sort_key().cmp(b.date_sort_key()));
        }
        return groups;
    }

    /// Wires with a shell on either side, largest first.
    pub fn shell_wires(&self, classifier: &Classifier) -> Vec<ShellWire<'_>> {
        return self
            .by_amount_desc()
            .into_iter()
            .filter_map(|wire| {
                let from_shell = classifier.is_shell(&sanitize(&wire.entity_from));
                let to_shell = classifier.is_shell(&sanitize(&wire.entity_to));
                return (from_shell || to_shell).then_some(ShellWire {
                    shell_to_shell: from_shell && to_shell,
                    wire,
                });
            })
            .collect();
    }

    /// Sum of every wire.
    pub fn total(&self) -> f64 {
        return self.wires.iter().map(|w| return w.amount).sum();
    }
}

/// Wires that share one amount.
#[derive(Debug, Clone)]
pub struct RepeatGroup<'a> {
    /// The shared amount.
    pub amount: f64,
    /// Members, earliest date first with undated wires last.
    pub wires: Vec<&'a Wire>,
}

impl RepeatGroup<'_> {
    /// Value recovered by counting every instance instead of one.
    pub fn extra(&self) -> f64 {
        return self.amount * count_f64(self.wires.len().saturating_sub(1));
    }

    /// Amount times instance count.
    fn weight(&self) -> f64 {
        return self.amount * count_f64(self.wires.len());
    }
}

/// A wire touching at least one shell.
#[derive(Debug, Clone, Copy)]
pub struct ShellWire<'a> {
    /// Both sides are shells.
    pub shell_to_shell: bool,
    /// The wire.
    pub wire: &'a Wire,
}

/// One wire transfer.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Wire {
    /// Amount in US dollars.
    pub amount: f64,
    /// Transaction date as written in the evidence, usually `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Paying party.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entity_from: String,
    /// Receiving party.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entity_to: String,
    /// Court exhibit or bates reference.
    #[serde(default)]
    pub exhibit: Option<String>,
    /// Recovered by the date-aware census.
    #[serde(default)]
    pub is_date_recovery: Option<bool>,
    /// Extraction table the wire came from, e.g. `verified_wires`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    /// Collapsed by the earlier amount-only dedup.
    #[serde(default)]
    pub was_in_amount_dedup: Option<bool>,
}

impl Wire {
    /// Sort key that puts undated wires after every dated one.
    fn date_sort_key(&self) -> &str {
        return match self.date.as_deref() {
            Some(date) if !date.is_empty() => date,
            _ => "zzz",
        };
    }

    /// Date text, or empty when absent.
    pub fn date_text(&self) -> &str {
        return self.date.as_deref().unwrap_or_default();
    }

    /// Sanitized exhibit reference, or empty.
    pub fn exhibit_text(&self) -> String {
        return sanitize(self.exhibit.as_deref().unwrap_or_default());
    }

    /// Flow direction from the classified parties.
    pub fn flow(&self, classifier: &Classifier) -> Flow {
        return Flow::between(classifier.classify(&self.entity_from), classifier.classify(&self.entity_to));
    }

    /// Recovered by date dedup after being collapsed by amount dedup.
    pub fn recovered_by_date(&self) -> bool {
        return self.is_date_recovery.unwrap_or(false) && self.was_in_amount_dedup.unwrap_or(false);
    }
}

/// Convert a count to `f64` for cell values and ratios.
pub fn count_f64(n: usize) -> f64 {
    return u32::try_from(n).map_or(f64::from(u32::MAX), f64::from);
}

/// Whole dollars with thousands separators, e.g. `$1,964,229,742`.
pub fn format_usd(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(digits.len().saturating_add(digits.len() / 3));
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && digits.len().saturating_sub(i).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && grouped != "0" { "-" } else { "" };
    return format!("{sign}${grouped}");
}

/// Characters cut from ledger text before it reaches a cell.
const fn is_stripped(c: char) -> bool {
    return matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}'..='\u{9f}');
}

/// Accept `null` where a string is expected.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    return Ok(value.unwrap_or_default());
}

/// Drop control characters, turn newlines into spaces, and trim.
pub fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| return !is_stripped(c))
        .map(|c| return if c == '\n' { ' ' } else { c })
        .collect();
    return cleaned.trim().to_string();
}

/// At most `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    return text.chars().take(max).collect();
}
