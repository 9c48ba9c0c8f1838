//! Forensic workbook: eleven tabs built from the wire ledger and the fixed
//! tables in `data/workbook_tables.toml`.

use std::path::Path;

use rust_xlsxwriter::{Color, ColNum, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet, XlsxError};

use crate::classify::{Classifier, EntityKind, Flow};
use crate::driver;
use crate::error::Error;
use crate::ledger::{Ledger, count_f64, format_usd, sanitize, truncate_chars};

/// Fill for wires above the verified cap.
const ABOVE_CAP_FILL: u32 = 0x00F9_E79F;

/// Plain body text.
const BODY: Style = Style::font(10, 0x0000_0000);

/// Emphasised data cell.
const BOLD_DATA: Style = Style::font(10, 0x001B_2A4A).bold();

/// Fill for phases and bugs that removed money.
const BUG_NEG_FILL: u32 = 0x00FA_DBD8;

/// Fill for phases and bugs that recovered money.
const BUG_POS_FILL: u32 = 0x00D5_F5E3;

/// Tables compiled into the binary.
const BUILTIN_TABLES: &str = include_str!("../data/workbook_tables.toml");

/// Header fill for summary tables.
const DARK_HEADER: u32 = 0x001F_4E79;

/// Fill behind the scope disclaimer row.
const DISCLAIMER_FILL: u32 = 0x00FF_FFCC;

/// Header fill for the above-cap tab.
const GOLD_HEADER: u32 = 0x007F_6000;

/// Header fill for ledger tables.
const GREEN_HEADER: u32 = 0x0037_5623;

/// Bold green used for totals and positive amounts.
const GREEN_NUM: Style = Style::font(11, 0x001B_6B3A).bold();

/// White bold header text; the fill is set per table.
const HEADER: Style = Style::font(11, 0x00FF_FFFF).bold().center();

/// Whole-dollar currency.
const MONEY: &str = "$#,##0";

/// Currency with negatives in parentheses and zero as a dash.
const MONEY_NEG: &str = "$#,##0;($#,##0);\"-\"";

/// Grey italic subtitle under a tab title.
const NOTE: Style = Style::font(10, 0x007F_8C8D).italic();

/// One decimal percentage.
const PCT: &str = "0.0%";

/// Fill for evidence sources marked PROVEN.
const PROVEN_FILL: u32 = 0x00BD_D7EE;

/// Header fill for the hierarchy and date recovery tabs.
const PURPLE_HEADER: u32 = 0x006C_3483;

/// Header fill for flow and bug tables.
const RED_HEADER: u32 = 0x00C0_0000;

/// Red used for negative amounts.
const RED_NUM: Style = Style::font(10, 0x00C0_392B);

/// Fill for section headings inside a tab.
const SECTION_FILL: u32 = 0x00D9_E2F3;

/// Fill for shell-to-shell wires and Epstein entities.
const SHELL_PAIR_FILL: u32 = 0x00FC_E4EC;

/// Small explanatory text.
const SMALL: Style = Style::font(9, 0x0000_0000);

/// Section heading inside a tab.
const SUBTITLE: Style = Style::font(11, 0x002C_3E6B).bold();

/// Number of tabs the workbook holds.
pub const TAB_COUNT: usize = 11;

/// Header fill for the extraction phase log.
const TEAL_HEADER: u32 = 0x001A_5276;

/// Tab title.
const TITLE: Style = Style::font(14, 0x001B_2A4A).bold();

/// Fill for total rows and the publication tier.
const TOTAL_FILL: u32 = 0x00C6_EFCE;

/// Label at the start of a total row.
const TOTAL_LABEL: Style = Style::font(11, 0x0000_0000).bold();

/// Fill for wires from the court-verified table.
const VERIFIED_FILL: u32 = 0x00C6_EFCE;

/// Disclaimer text.
const WARN: Style = Style::font(9, 0x00CC_0000).italic().left_wrap();

/// Fill for even data rows.
const ZEBRA_FILL: u32 = 0x00F2_F7FB;

/// Annotation for a known above-cap wire, keyed by whole-dollar amount.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AboveCapNote {
    /// Whole-dollar amount the note applies to.
    amount: f64,
    /// What the transaction was.
    note: String,
}

/// Horizontal placement of cell text.
#[derive(Debug, Clone, Copy)]
enum Align {
    /// Centered both ways, wrapped.
    Center,
    /// Excel's default.
    General,
    /// Left, vertically centered, wrapped.
    LeftWrap,
}

/// A contamination bug found during extraction.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Bug {
    /// How it was fixed.
    fix: String,
    /// Dollar impact; a leading `-` or `+` picks the row colour.
    impact: String,
    /// Short name.
    name: String,
    /// Phase where it was caught.
    phase: String,
    /// What went wrong.
    problem: String,
}

/// One entity in the shell trust hierarchy.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct HierarchyEntry {
    /// What the entity does with money.
    description: String,
    /// Entity name as it appears in the ledger.
    entity: String,
    /// Role in the network.
    role: String,
    /// 1 receives external money, 4 is a terminal account.
    tier: u8,
}

/// Label and value for the executive summary.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyFinding {
    /// Row label.
    label: String,
    /// Display value.
    value: String,
}

/// One row of the extraction phase log.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Phase {
    /// Dollars added, negative when removed.
    amount: f64,
    /// Key finding.
    finding: String,
    /// Phase id such as `14.5B`.
    id: String,
    /// How the phase was run.
    method: String,
    /// What the phase did.
    name: String,
    /// Gate applied; `BUG FIX` marks a correction.
    quality_check: String,
    /// Cumulative total after the phase.
    running_total: f64,
}

/// Suspicious-activity total reported for one bank.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SarBenchmark {
    /// Reported amount.
    amount: f64,
    /// Bank name.
    bank: String,
    /// Who reported it.
    source: String,
}

/// Font, fill, alignment and number format of one cell.
#[derive(Debug, Clone, Copy)]
struct Style {
    /// Text placement.
    align: Align,
    /// Bold font.
    bold: bool,
    /// Thin grey bottom border.
    border: bool,
    /// Font colour as `0xRRGGBB`.
    color: u32,
    /// Solid background as `0xRRGGBB`.
    fill: Option<u32>,
    /// Italic font.
    italic: bool,
    /// Excel number format.
    num: Option<&'static str>,
    /// Font size in points.
    size: u8,
}

impl Style {
    /// Bold font.
    const fn bold(mut self) -> Self {
        self.bold = true;
        return self;
    }

    /// Thin grey bottom border.
    const fn border(mut self) -> Self {
        self.border = true;
        return self;
    }

    /// Centered and wrapped.
    const fn center(mut self) -> Self {
        self.align = Align::Center;
        return self;
    }

    /// Solid background.
    const fn fill(mut self, rgb: u32) -> Self {
        self.fill = Some(rgb);
        return self;
    }

    /// Arial at `size` points in `color`.
    const fn font(size: u8, color: u32) -> Self {
        return Self {
            align: Align::General,
            bold: false,
            border: false,
            color,
            fill: None,
            italic: false,
            num: None,
            size,
        };
    }

    /// Build the writer's format.
    fn format(self) -> Format {
        let mut format = Format::new()
            .set_font_name("Arial")
            .set_font_size(f64::from(self.size))
            .set_font_color(Color::RGB(self.color));
        if self.bold {
            format = format.set_bold();
        }
        if self.italic {
            format = format.set_italic();
        }
        if self.border {
            format = format.set_border_bottom(FormatBorder::Thin).set_border_bottom_color(Color::RGB(0x00D0_D0D0));
        }
        if let Some(rgb) = self.fill {
            format = format.set_background_color(Color::RGB(rgb));
        }
        if let Some(num) = self.num {
            format = format.set_num_format(num);
        }
        format = match self.align {
            Align::Center => format.set_align(FormatAlign::Center).set_align(FormatAlign::VerticalCenter).set_text_wrap(),
            Align::General => format,
            Align::LeftWrap => format.set_align(FormatAlign::Left).set_align(FormatAlign::VerticalCenter).set_text_wrap(),
        };
        return format;
    }

    /// Italic font.
    const fn italic(mut self) -> Self {
        self.italic = true;
        return self;
    }

    /// Left aligned and wrapped.
    const fn left_wrap(mut self) -> Self {
        self.align = Align::LeftWrap;
        return self;
    }

    /// Background when `fill` is set, none otherwise.
    const fn maybe_fill(mut self, fill: Option<u32>) -> Self {
        self.fill = fill;
        return self;
    }

    /// Excel number format.
    const fn num(mut self, num: &'static str) -> Self {
        self.num = Some(num);
        return self;
    }
}

/// One confidence tier on the executive summary.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Tier {
    /// Extracted amount.
    amount: f64,
    /// What the tier includes.
    included: String,
    /// Tier name.
    name: String,
    /// Tier number as displayed.
    number: String,
    /// The tier used for publication; highlighted.
    publication: bool,
    /// Duplication risk.
    risk: String,
}

/// Headline totals.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Totals {
    /// Sum of court-verified wires above the old cap.
    above_cap: f64,
    /// Wires strictly above this are above-cap.
    above_cap_threshold: f64,
    /// Amount-unique base extraction.
    base: f64,
    /// Recovered by the date-aware census.
    date_recovered: f64,
    /// Publication total.
    grand_total: f64,
    /// Combined suspicious-activity benchmark.
    sar_benchmark: f64,
}

/// Everything in the workbook that does not come from the ledger.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkbookTables {
    /// Notes for known above-cap wires.
    above_cap_note: Vec<AboveCapNote>,
    /// Bugs caught during extraction.
    bug: Vec<Bug>,
    /// Entity keyword tables.
    pub classification: Classifier,
    /// Scope disclaimer shown above ledger-driven tabs.
    disclaimer: String,
    /// Shell trust hierarchy.
    hierarchy: Vec<HierarchyEntry>,
    /// Executive summary facts.
    key_finding: Vec<KeyFinding>,
    /// Methodology caveats.
    limitations: Vec<String>,
    /// Extraction phase log.
    phase: Vec<Phase>,
    /// Per-bank suspicious-activity figures.
    sar_benchmark: Vec<SarBenchmark>,
    /// Confidence tiers.
    tier: Vec<Tier>,
    /// Headline totals.
    totals: Totals,
}

impl WorkbookTables {
    /// The tables compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the embedded data does not parse.
    pub fn builtin() -> Result<Self, Error> {
        return Self::parse(BUILTIN_TABLES);
    }

    /// Parse tables from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` on malformed TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        return Ok(toml::from_str(content)?);
    }
}

/// Add a named, coloured worksheet.
fn add_tab<'a>(workbook: &'a mut Workbook, name: &str, color: u32) -> Result<&'a mut Worksheet, XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    sheet.set_tab_color(Color::RGB(color));
    return Ok(sheet);
}

/// Fill `cols` cells of `row` so untouched cells share the row's style.
fn blank_row(sheet: &mut Worksheet, row: RowNum, cols: ColNum, style: Style) -> Result<(), XlsxError> {
    let format = style.format();
    for col in 0..cols {
        sheet.write_blank(row, col, &format)?;
    }
    return Ok(());
}

/// Build every tab in memory.
///
/// # Errors
///
/// Returns `Error::Xlsx` if the writer rejects a sheet name, range, or format.
pub fn build_workbook(ledger: &Ledger, tables: &WorkbookTables) -> Result<Workbook, Error> {
    let classifier = &tables.classification;
    let mut workbook = Workbook::new();
    tab_executive_summary(add_tab(&mut workbook, "Executive Summary", 0x001B_2A4A)?, tables)?;
    tab_extraction_phases(add_tab(&mut workbook, "Extraction Phases", 0x002E_86C1)?, tables)?;
    tab_money_flow_patterns(add_tab(&mut workbook, "Money Flow Patterns", 0x00E7_4C3C)?, ledger, classifier)?;
    tab_shell_hierarchy(add_tab(&mut workbook, "Shell Trust Hierarchy", 0x008E_44AD)?, ledger, tables)?;
    tab_master_ledger(add_tab(&mut workbook, "Master Wire Ledger", 0x0027_AE60)?, ledger, tables)?;
    tab_above_cap(add_tab(&mut workbook, "Above-Cap Verified", 0x00F3_9C12)?, ledger, tables)?;
    tab_date_recovery(add_tab(&mut workbook, "Date Recovery", 0x008E_44AD)?, ledger)?;
    tab_entity_pl(add_tab(&mut workbook, "Entity P&L", 0x001A_BC9C)?, ledger, tables)?;
    tab_shell_network(add_tab(&mut workbook, "Shell Network", 0x00E7_4C3C)?, ledger, tables)?;
    tab_sar_comparison(add_tab(&mut workbook, "SAR Comparison", 0x002C_3E50)?, tables)?;
    tab_methodology(add_tab(&mut workbook, "Methodology", 0x007F_8C8D)?, tables)?;
    return Ok(workbook);
}

/// Scope disclaimer across the first row; tables on the tab start at row 1.
fn disclaimer(sheet: &mut Worksheet, cols: ColNum, text: &str) -> Result<(), XlsxError> {
    let last = cols.clamp(2, 12).saturating_sub(1);
    sheet.merge_range(0, 0, 0, last, text, &WARN.fill(DISCLAIMER_FILL).format())?;
    sheet.set_row_height(0, 42.0)?;
    return Ok(());
}

/// Section B of the flow tab: every wire, largest first.
fn flow_wires(sheet: &mut Worksheet, start: RowNum, ledger: &Ledger, classifier: &Classifier) -> Result<(), XlsxError> {
    title(sheet, start, 7, "SECTION B: EVERY WIRE CLASSIFIED BY FLOW DIRECTION", SUBTITLE.fill(SECTION_FILL))?;
    let columns = [
        "Flow Direction",
        "Money Source (From)",
        "Money Destination (To)",
        "Wire Amount",
        "Date",
        "Source Classification",
        "From Entity Type",
        "To Entity Type",
    ];
    header_cells(sheet, start.saturating_add(1), &columns, DARK_HEADER)?;
    let first = start.saturating_add(2);
    for (i, (row, wire)) in (first..).zip(ledger.by_amount_desc()).enumerate() {
        let from_kind = classifier.classify(&wire.entity_from);
        let to_kind = classifier.classify(&wire.entity_to);
        let flow = Flow::between(from_kind, to_kind);
        let cell = BODY.maybe_fill(zebra(i)).border();
        text(sheet, row, 0, &flow.short(), BOLD_DATA.fill(flow.fill()).border())?;
        text(sheet, row, 1, &sanitize(&wire.entity_from), cell)?;
        text(sheet, row, 2, &sanitize(&wire.entity_to), cell)?;
        number(sheet, row, 3, wire.amount, cell.num(MONEY))?;
        text(sheet, row, 4, wire.date_text(), cell)?;
        text(sheet, row, 5, &wire.source, cell)?;
        text(sheet, row, 6, from_kind.label(), cell.center())?;
        text(sheet, row, 7, to_kind.label(), cell.center())?;
    }
    return Ok(());
}

/// Frozen header row.
fn header(sheet: &mut Worksheet, row: RowNum, columns: &[&str], fill: u32) -> Result<(), XlsxError> {
    header_cells(sheet, row, columns, fill)?;
    sheet.set_row_height(row, 36.0)?;
    sheet.set_freeze_panes(row.saturating_add(1), 0)?;
    return Ok(());
}

/// Header cells without freezing, for tables below other content.
fn header_cells(sheet: &mut Worksheet, row: RowNum, columns: &[&str], fill: u32) -> Result<(), XlsxError> {
    let style = HEADER.fill(fill).border();
    for (col, name) in (0..).zip(columns) {
        text(sheet, row, col, name, style)?;
    }
    return Ok(());
}

/// Fill for an entity kind on the P&L tab.
const fn kind_fill(kind: EntityKind) -> Option<u32> {
    return match kind {
        EntityKind::Bank => Some(0x00D6_EAF8),
        EntityKind::Epstein => Some(SHELL_PAIR_FILL),
        EntityKind::External => Some(0x00D5_F5E3),
        EntityKind::Unknown => None,
    };
}

/// Bold green for non-negative amounts, red otherwise.
const fn net_style(net: f64) -> Style {
    if net >= 0.0 {
        return GREEN_NUM;
    }
    return RED_NUM;
}

/// Write a number.
fn number(sheet: &mut Worksheet, row: RowNum, col: ColNum, value: f64, style: Style) -> Result<(), XlsxError> {
    sheet.write_number_with_format(row, col, value, &style.format())?;
    return Ok(());
}

/// `part / whole`, or zero when `whole` is zero.
const fn ratio(part: f64, whole: f64) -> f64 {
    if whole.abs() < f64::EPSILON {
        return 0.0;
    }
    return part / whole;
}

/// Wires above the cap with their court exhibits.
fn tab_above_cap(sheet: &mut Worksheet, ledger: &Ledger, tables: &WorkbookTables) -> Result<(), XlsxError> {
    let classifier = &tables.classification;
    let threshold = tables.totals.above_cap_threshold;
    let above = ledger.above(threshold);
    let heading = format!(
        "PHASE 24: {} Court-Verified Wires Above the {} Safety Cap",
        above.len(),
        format_usd(threshold)
    );
    title(sheet, 0, 6, &heading, SUBTITLE)?;
    title(
        sheet,
        1,
        6,
        "Earlier phases capped extraction to prevent balance contamination. Phase 24 lifted the cap for \
         court-exhibit authenticated wires with dates and bates numbers.",
        SMALL.left_wrap(),
    )?;
    sheet.set_row_height(1, 48.0)?;
    let columns = [
        "Transaction Date",
        "Money Source (From)",
        "Money Destination (To)",
        "Wire Amount (USD)",
        "Court Exhibit",
        "What This Transaction Was",
        "Flow Direction",
    ];
    header(sheet, 3, &columns, GOLD_HEADER)?;

    let mut row: RowNum = 4;
    for wire in &above {
        let from = sanitize(&wire.entity_from);
        let to = sanitize(&wire.entity_to);
        let note = tables
            .above_cap_note
            .iter()
            .find(|n| return (n.amount - wire.amount.trunc()).abs() < 0.5)
            .map_or("", |n| return n.note.as_str());
        let direction = format!("{} → {}", classifier.classify(&from), classifier.classify(&to));
        let cell = BODY.fill(ABOVE_CAP_FILL).border();
        text(sheet, row, 0, wire.date_text(), cell)?;
        text(sheet, row, 1, &from, cell)?;
        text(sheet, row, 2, &to, cell)?;
        number(sheet, row, 3, wire.amount, GREEN_NUM.num(MONEY).fill(ABOVE_CAP_FILL).border())?;
        text(sheet, row, 4, &wire.exhibit_text(), cell)?;
        text(sheet, row, 5, note, cell)?;
        text(sheet, row, 6, &direction, cell)?;
        row = row.saturating_add(1);
    }
    blank_row(sheet, row, 7, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 2, "TOTAL", TOTAL_LABEL.fill(TOTAL_FILL))?;
    let total: f64 = above.iter().map(|w| return w.amount).sum();
    number(sheet, row, 3, total, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    return widths(sheet, &[14.0, 36.0, 36.0, 18.0, 16.0, 52.0, 24.0]);
}

/// Repeat wires that amount-only dedup collapsed.
fn tab_date_recovery(sheet: &mut Worksheet, ledger: &Ledger) -> Result<(), XlsxError> {
    title(sheet, 0, 6, "PHASE 23: Same Dollar Amount, Different Dates = Different Wires", SUBTITLE)?;
    title(
        sheet,
        1,
        6,
        "Amount-only dedup counted repeat wires on different dates as one. An amount, entity and date \
         signature recovers each extra instance.",
        SMALL.left_wrap(),
    )?;
    sheet.set_row_height(1, 48.0)?;
    let columns = [
        "Wire Amount",
        "# Separate Instances",
        "Extra Value Recovered",
        "Transaction Date",
        "Money Source (From)",
        "Money Destination (To)",
        "Evidence Source",
    ];
    header(sheet, 3, &columns, PURPLE_HEADER)?;

    let group_fill = 0x00E8_DAEF;
    let mut row: RowNum = 4;
    let mut recovered = 0.0;
    let mut members: usize = 0;
    for group in ledger.repeat_amounts(30) {
        recovered += group.extra();
        blank_row(sheet, row, 7, BODY.fill(group_fill).border())?;
        number(sheet, row, 0, group.amount, BOLD_DATA.num(MONEY).fill(group_fill).border())?;
        number(sheet, row, 1, count_f64(group.wires.len()), BOLD_DATA.center().fill(group_fill).border())?;
        number(sheet, row, 2, group.extra(), GREEN_NUM.num(MONEY).fill(group_fill).border())?;
        row = row.saturating_add(1);
        for wire in &group.wires {
            let cell = SMALL.maybe_fill(zebra(members)).border();
            blank_row(sheet, row, 3, cell)?;
            let date = if wire.date_text().is_empty() { "no date" } else { wire.date_text() };
            text(sheet, row, 3, date, cell)?;
            text(sheet, row, 4, &truncate_chars(&sanitize(&wire.entity_from), 40), cell)?;
            text(sheet, row, 5, &truncate_chars(&sanitize(&wire.entity_to), 40), cell)?;
            text(sheet, row, 6, &wire.source, cell)?;
            members = members.saturating_add(1);
            row = row.saturating_add(1);
        }
    }
    row = row.saturating_add(1);
    blank_row(sheet, row, 7, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 0, "TOTAL RECOVERED", TOTAL_LABEL.fill(TOTAL_FILL))?;
    number(sheet, row, 2, recovered, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    return widths(sheet, &[16.0, 14.0, 18.0, 14.0, 38.0, 38.0, 18.0]);
}

/// Inflow, outflow and net position of every named entity.
fn tab_entity_pl(sheet: &mut Worksheet, ledger: &Ledger, tables: &WorkbookTables) -> Result<(), XlsxError> {
    disclaimer(sheet, 9, &tables.disclaimer)?;
    let columns = [
        "Entity Name",
        "Entity Type",
        "Total Money Received (USD)",
        "Total Money Sent (USD)",
        "Net Position (USD)",
        "# Wires In",
        "# Wires Out",
        "Epstein Shell?",
        "Evidence Sources",
    ];
    header(sheet, 1, &columns, GREEN_HEADER)?;

    for (i, (row, position)) in (2..).zip(ledger.positions(&tables.classification)).enumerate() {
        let fill = zebra(i);
        let cell = BODY.maybe_fill(fill).border();
        let net = position.flows.net();
        let sources: Vec<&str> = position.sources.iter().map(String::as_str).collect();
        text(sheet, row, 0, &position.name, cell)?;
        let kind = kind_fill(position.kind).or(fill);
        text(sheet, row, 1, position.kind.label(), BODY.center().maybe_fill(kind).border())?;
        number(sheet, row, 2, position.flows.inflow, cell.num(MONEY))?;
        number(sheet, row, 3, position.flows.outflow, cell.num(MONEY))?;
        number(sheet, row, 4, net, net_style(net).num(MONEY_NEG).maybe_fill(fill).border())?;
        number(sheet, row, 5, f64::from(position.flows.in_count), cell.center())?;
        number(sheet, row, 6, f64::from(position.flows.out_count), cell.center())?;
        let (shell, shell_fill) = if position.shell { ("YES", Some(0x00FF_F3E0)) } else { ("", fill) };
        text(sheet, row, 7, shell, BODY.center().maybe_fill(shell_fill).border())?;
        text(sheet, row, 8, &sources.join(", "), SMALL.maybe_fill(fill).border())?;
    }
    return widths(sheet, &[40.0, 16.0, 18.0, 18.0, 18.0, 10.0, 10.0, 12.0, 34.0]);
}

/// Headline total, confidence tiers and key findings.
fn tab_executive_summary(sheet: &mut Worksheet, tables: &WorkbookTables) -> Result<(), XlsxError> {
    let totals = &tables.totals;
    title(sheet, 0, 7, "EPSTEIN EFTA FORENSIC FINANCIAL EXTRACTION", TITLE)?;
    title(sheet, 1, 7, "Pro Bono Analysis · 19 Datasets · 1.575M Files · 24 Extraction Phases", NOTE)?;

    title(sheet, 3, 1, "TOTAL FINANCIAL ACTIVITY EXTRACTED", SUBTITLE)?;
    number(sheet, 3, 2, totals.grand_total, Style::font(16, 0x001B_6B3A).bold().num(MONEY))?;
    title(sheet, 4, 1, "FinCEN SAR Benchmark", BODY)?;
    number(sheet, 4, 2, totals.sar_benchmark, BOLD_DATA.num(MONEY))?;
    title(sheet, 5, 1, "Extraction Coverage (% of SAR)", BODY)?;
    sheet.write_formula_with_format(5, 2, "=C4/C5", &GREEN_NUM.num(PCT).format())?;

    title(sheet, 7, 5, "THREE-TIER CONFIDENCE FRAMEWORK", SUBTITLE)?;
    let columns = ["Tier", "Name", "Extracted Amount", "% of SAR", "What's Included", "Duplication Risk"];
    header_cells(sheet, 8, &columns, DARK_HEADER)?;
    let mut row: RowNum = 9;
    for (i, tier) in tables.tier.iter().enumerate() {
        let fill = if tier.publication { Some(TOTAL_FILL) } else { zebra(i) };
        let name = if tier.publication { BOLD_DATA } else { BODY };
        let cell = BODY.maybe_fill(fill).border();
        text(sheet, row, 0, &tier.number, cell.center())?;
        text(sheet, row, 1, &tier.name, name.maybe_fill(fill).border())?;
        number(sheet, row, 2, tier.amount, cell.num(MONEY))?;
        number(sheet, row, 3, ratio(tier.amount, totals.sar_benchmark), cell.num(PCT))?;
        text(sheet, row, 4, &tier.included, SMALL.maybe_fill(fill).border())?;
        text(sheet, row, 5, &tier.risk, SMALL.maybe_fill(fill).border())?;
        row = row.saturating_add(1);
    }

    row = row.saturating_add(1);
    title(sheet, row, 5, "KEY FINDINGS", SUBTITLE)?;
    for finding in &tables.key_finding {
        row = row.saturating_add(1);
        text(sheet, row, 0, &finding.label, BODY.border())?;
        text(sheet, row, 1, &finding.value, BOLD_DATA.border())?;
    }
    return widths(sheet, &[34.0, 26.0, 22.0, 14.0, 46.0, 36.0]);
}

/// Phase-by-phase log of what each extraction added or removed.
fn tab_extraction_phases(sheet: &mut Worksheet, tables: &WorkbookTables) -> Result<(), XlsxError> {
    let totals = &tables.totals;
    disclaimer(sheet, 8, &tables.disclaimer)?;
    let columns = [
        "Phase",
        "What We Did",
        "How We Did It",
        "Amount Added/Removed",
        "Running Total",
        "% of SAR Recovered",
        "Quality Check",
        "Key Finding",
    ];
    header(sheet, 1, &columns, TEAL_HEADER)?;

    let mut row: RowNum = 2;
    for (i, phase) in tables.phase.iter().enumerate() {
        let (fill, amount) = if phase.amount < 0.0 {
            (Some(BUG_NEG_FILL), RED_NUM)
        } else if phase.quality_check.contains("BUG FIX") {
            (Some(BUG_POS_FILL), GREEN_NUM)
        } else {
            (zebra(i), BODY)
        };
        let cell = BODY.maybe_fill(fill).border();
        text(sheet, row, 0, &phase.id, BOLD_DATA.center().maybe_fill(fill).border())?;
        text(sheet, row, 1, &phase.name, cell)?;
        text(sheet, row, 2, &phase.method, SMALL.maybe_fill(fill).border())?;
        number(sheet, row, 3, phase.amount, amount.num(MONEY).maybe_fill(fill).border())?;
        number(sheet, row, 4, phase.running_total, cell.num(MONEY))?;
        number(sheet, row, 5, ratio(phase.running_total, totals.sar_benchmark), cell.num(PCT))?;
        text(sheet, row, 6, &phase.quality_check, SMALL.maybe_fill(fill).border())?;
        text(sheet, row, 7, &phase.finding, SMALL.maybe_fill(fill).border())?;
        row = row.saturating_add(1);
    }

    blank_row(sheet, row, 8, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 0, "FINAL", TOTAL_LABEL.fill(TOTAL_FILL))?;
    number(sheet, row, 3, totals.grand_total, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    number(sheet, row, 4, totals.grand_total, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    number(sheet, row, 5, ratio(totals.grand_total, totals.sar_benchmark), GREEN_NUM.num(PCT).fill(TOTAL_FILL))?;
    return widths(sheet, &[10.0, 28.0, 46.0, 18.0, 18.0, 14.0, 22.0, 54.0]);
}

/// Every wire with its classification and dedup flags.
fn tab_master_ledger(sheet: &mut Worksheet, ledger: &Ledger, tables: &WorkbookTables) -> Result<(), XlsxError> {
    let classifier = &tables.classification;
    let threshold = tables.totals.above_cap_threshold;
    disclaimer(sheet, 12, &tables.disclaimer)?;
    let columns = [
        "#",
        "Evidence Source",
        "Transaction Date",
        "Money Source (From)",
        "Money Destination (To)",
        "Wire Amount (USD)",
        "Court Exhibit/Reference",
        "Source Entity Type",
        "Destination Entity Type",
        "Flow Direction",
        "Recovered via Date Dedup?",
        "Above Prior $10M Cap?",
    ];
    header(sheet, 1, &columns, GREEN_HEADER)?;

    let mut row: RowNum = 2;
    for (i, wire) in ledger.by_amount_desc().into_iter().enumerate() {
        let from = sanitize(&wire.entity_from);
        let to = sanitize(&wire.entity_to);
        let from_kind = classifier.classify(&from);
        let to_kind = classifier.classify(&to);
        let above = wire.amount > threshold;
        let source_fill = if above {
            Some(ABOVE_CAP_FILL)
        } else if wire.source == "verified_wires" {
            Some(VERIFIED_FILL)
        } else if wire.source.contains("PROVEN") {
            Some(PROVEN_FILL)
        } else {
            zebra(i)
        };
        let cell = BODY.maybe_fill(zebra(i)).border();
        number(sheet, row, 0, count_f64(i.saturating_add(1)), cell.center())?;
        text(sheet, row, 1, &wire.source, BODY.maybe_fill(source_fill).border())?;
        text(sheet, row, 2, wire.date_text(), cell)?;
        text(sheet, row, 3, &from, cell)?;
        text(sheet, row, 4, &to, cell)?;
        number(sheet, row, 5, wire.amount, cell.num(MONEY))?;
        text(sheet, row, 6, &wire.exhibit_text(), cell)?;
        text(sheet, row, 7, from_kind.label(), cell.center())?;
        text(sheet, row, 8, to_kind.label(), cell.center())?;
        text(sheet, row, 9, &Flow::between(from_kind, to_kind).short(), cell)?;
        text(sheet, row, 10, yes(wire.recovered_by_date()), cell.center())?;
        text(sheet, row, 11, yes(above), cell.center())?;
        row = row.saturating_add(1);
    }

    blank_row(sheet, row, 12, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 4, "TOTAL", TOTAL_LABEL.fill(TOTAL_FILL))?;
    number(sheet, row, 5, ledger.total(), GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    return widths(sheet, &[6.0, 18.0, 12.0, 38.0, 38.0, 16.0, 18.0, 16.0, 16.0, 24.0, 14.0, 14.0]);
}

/// Closing notes: bugs found and limitations.
fn tab_methodology(sheet: &mut Worksheet, tables: &WorkbookTables) -> Result<(), XlsxError> {
    title(sheet, 0, 4, "METHODOLOGY, QUALITY ASSURANCE & LIMITATIONS", TITLE)?;
    let subtitle = format!(
        "24-phase extraction pipeline · {} bugs caught · {}-tier confidence framework",
        tables.bug.len(),
        tables.tier.len()
    );
    title(sheet, 1, 4, &subtitle, NOTE)?;

    title(sheet, 3, 4, "CONTAMINATION BUGS FOUND & CORRECTED", SUBTITLE)?;
    let columns = ["Phase", "Bug Name", "Dollar Impact", "What Went Wrong", "How We Fixed It"];
    header_cells(sheet, 4, &columns, RED_HEADER)?;
    let mut row: RowNum = 5;
    for bug in &tables.bug {
        let (fill, impact) = if bug.impact.starts_with('-') {
            (BUG_NEG_FILL, RED_NUM)
        } else if bug.impact.starts_with('+') {
            (BUG_POS_FILL, GREEN_NUM)
        } else {
            (ZEBRA_FILL, BODY)
        };
        text(sheet, row, 0, &bug.phase, BODY.center().fill(fill).border())?;
        text(sheet, row, 1, &bug.name, BOLD_DATA.left_wrap().fill(fill).border())?;
        text(sheet, row, 2, &bug.impact, impact.center().fill(fill).border())?;
        text(sheet, row, 3, &bug.problem, SMALL.left_wrap().fill(fill).border())?;
        text(sheet, row, 4, &bug.fix, SMALL.left_wrap().fill(fill).border())?;
        sheet.set_row_height(row, 48.0)?;
        row = row.saturating_add(1);
    }

    row = row.saturating_add(1);
    title(sheet, row, 4, "LIMITATIONS & CAVEATS", SUBTITLE)?;
    for limitation in &tables.limitations {
        row = row.saturating_add(1);
        title(sheet, row, 4, &format!("• {limitation}"), SMALL.left_wrap())?;
        sheet.set_row_height(row, 28.0)?;
    }
    return widths(sheet, &[14.0, 18.0, 14.0, 52.0, 52.0]);
}

/// Flow-direction summary followed by every wire classified.
fn tab_money_flow_patterns(sheet: &mut Worksheet, ledger: &Ledger, classifier: &Classifier) -> Result<(), XlsxError> {
    title(
        sheet,
        0,
        7,
        "HOW THE MONEY MOVED: External Sources → Epstein Trusts → Banks → Shells → Beneficiaries",
        TITLE,
    )?;
    title(
        sheet,
        1,
        7,
        "Money enters from external donors, is redistributed through trusts and shell companies, and \
         exits to beneficiaries or personal accounts.",
        SMALL.left_wrap(),
    )?;
    sheet.set_row_height(1, 48.0)?;

    title(sheet, 3, 7, "SECTION A: MONEY FLOW SUMMARY BY DIRECTION", SUBTITLE.fill(SECTION_FILL))?;
    let columns = [
        "Flow Direction",
        "What This Means",
        "# of Wires",
        "Total Amount",
        "% of Ledger",
        "Largest Single Wire",
        "Key Example",
    ];
    header_cells(sheet, 4, &columns, RED_HEADER)?;
    let total = ledger.total();
    let mut row: RowNum = 5;
    for summary in ledger.flow_summary(classifier) {
        let fill = summary.flow.fill();
        let cell = BODY.fill(fill).border();
        text(sheet, row, 0, &summary.flow.short(), BOLD_DATA.fill(fill).border())?;
        text(sheet, row, 1, summary.flow.description(), SMALL.fill(fill).border())?;
        number(sheet, row, 2, f64::from(summary.count), cell.center())?;
        number(sheet, row, 3, summary.total, cell.num(MONEY))?;
        number(sheet, row, 4, ratio(summary.total, total), cell.num(PCT))?;
        number(sheet, row, 5, summary.largest, cell.num(MONEY))?;
        text(sheet, row, 6, &summary.largest_example, SMALL.fill(fill).border())?;
        row = row.saturating_add(1);
    }
    blank_row(sheet, row, 7, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 0, "TOTAL LEDGER VALUE", TOTAL_LABEL.fill(TOTAL_FILL))?;
    number(sheet, row, 2, count_f64(ledger.wires.len()), BODY.center().fill(TOTAL_FILL))?;
    number(sheet, row, 3, total, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;

    flow_wires(sheet, row.saturating_add(2), ledger, classifier)?;
    return widths(sheet, &[22.0, 38.0, 38.0, 16.0, 12.0, 18.0, 16.0, 16.0]);
}

/// Per-bank benchmarks against the extracted total, then how the total is reached.
fn tab_sar_comparison(sheet: &mut Worksheet, tables: &WorkbookTables) -> Result<(), XlsxError> {
    let totals = &tables.totals;
    disclaimer(sheet, 6, &tables.disclaimer)?;
    let columns = [
        "Bank",
        "SAR Suspicious Activity (USD)",
        "Our Extraction (USD)",
        "Coverage %",
        "Source Authority",
        "Status",
    ];
    header(sheet, 1, &columns, DARK_HEADER)?;
    let mut row: RowNum = 2;
    for (i, benchmark) in tables.sar_benchmark.iter().enumerate() {
        let fill = zebra(i);
        let cell = BODY.maybe_fill(fill).border();
        text(sheet, row, 0, &benchmark.bank, BOLD_DATA.maybe_fill(fill).border())?;
        number(sheet, row, 1, benchmark.amount, cell.num(MONEY))?;
        text(sheet, row, 2, "—", cell.center())?;
        text(sheet, row, 3, "—", cell.center())?;
        text(sheet, row, 4, &benchmark.source, SMALL.maybe_fill(fill).border())?;
        text(sheet, row, 5, "Included in combined total", SMALL.maybe_fill(fill).border())?;
        row = row.saturating_add(1);
    }

    let coverage = ratio(totals.grand_total, totals.sar_benchmark);
    let status = if totals.grand_total >= totals.sar_benchmark { "EXCEEDED ✓" } else { "BELOW BENCHMARK" };
    blank_row(sheet, row, 6, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 0, "COMBINED BENCHMARK", TOTAL_LABEL.fill(TOTAL_FILL))?;
    number(sheet, row, 1, totals.sar_benchmark, TOTAL_LABEL.num(MONEY).fill(TOTAL_FILL))?;
    number(sheet, row, 2, totals.grand_total, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    number(sheet, row, 3, coverage, GREEN_NUM.num(PCT).fill(TOTAL_FILL))?;
    text(sheet, row, 4, "All banks combined", BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 5, status, GREEN_NUM.fill(TOTAL_FILL))?;

    row = row.saturating_add(2);
    let heading = format!("CALCULATION BREAKDOWN: How We Reached {}", format_usd(totals.grand_total));
    title(sheet, row, 5, &heading, SUBTITLE)?;
    let new_amounts = totals.grand_total - totals.base - totals.date_recovered - totals.above_cap;
    let breakdown = [
        ("Base: amount-unique OCR extraction across 19 datasets", totals.base),
        ("+ Phase 23: same-amount different-date wire recovery", totals.date_recovered),
        ("+ Phase 24: new amounts from master ledger tables", new_amounts),
        ("+ Phase 24: above-cap court-verified wires", totals.above_cap),
    ];
    for (i, (label, amount)) in breakdown.into_iter().enumerate() {
        row = row.saturating_add(1);
        let fill = zebra(i);
        text(sheet, row, 0, label, BODY.maybe_fill(fill).border())?;
        number(sheet, row, 1, amount, BODY.num(MONEY).maybe_fill(fill).border())?;
    }
    row = row.saturating_add(1);
    blank_row(sheet, row, 3, BODY.fill(TOTAL_FILL))?;
    text(sheet, row, 0, "PUBLICATION TOTAL", TOTAL_LABEL.fill(TOTAL_FILL))?;
    number(sheet, row, 1, totals.grand_total, GREEN_NUM.num(MONEY).fill(TOTAL_FILL))?;
    let share = format!("{:.1}% of SAR benchmark", coverage * 100.0);
    text(sheet, row, 2, &share, GREEN_NUM.fill(TOTAL_FILL))?;
    return widths(sheet, &[50.0, 22.0, 22.0, 14.0, 32.0, 22.0]);
}

/// Hierarchy entities with their ledger inflow and outflow.
fn tab_shell_hierarchy(sheet: &mut Worksheet, ledger: &Ledger, tables: &WorkbookTables) -> Result<(), XlsxError> {
    title(sheet, 0, 8, "EPSTEIN SHELL COMPANY & TRUST HIERARCHY: How Money Was Layered", TITLE)?;
    title(
        sheet,
        1,
        8,
        "Tier 1 = holding trusts that receive external money. Tier 2 = pass-through trusts that redistribute. \
         Tier 3 = operating shells that pay beneficiaries. Tier 4 = personal accounts (terminal destinations).",
        SMALL.left_wrap(),
    )?;
    sheet.set_row_height(1, 48.0)?;
    title(sheet, 3, 8, "SECTION A: TRUST NETWORK STRUCTURE", SUBTITLE.fill(SECTION_FILL))?;
    let columns = [
        "Tier",
        "Entity Name",
        "Role in Network",
        "Total Money Received",
        "Total Money Sent",
        "Net Position",
        "# Sources",
        "# Destinations",
        "Description",
    ];
    header_cells(sheet, 4, &columns, PURPLE_HEADER)?;

    let flows = ledger.flows_by_upper_name();
    for (row, entry) in (5..).zip(&tables.hierarchy) {
        let totals = flows.get(&entry.entity.to_uppercase()).copied().unwrap_or_default();
        let net = totals.net();
        let tier = Style::font(10, 0x00FF_FFFF).bold().center().maybe_fill(tier_fill(entry.tier)).border();
        text(sheet, row, 0, &format!("TIER {}", entry.tier), tier)?;
        text(sheet, row, 1, &entry.entity, BOLD_DATA.border())?;
        text(sheet, row, 2, &entry.role, SMALL.border())?;
        number(sheet, row, 3, totals.inflow, BODY.num(MONEY).border())?;
        number(sheet, row, 4, totals.outflow, BODY.num(MONEY).border())?;
        number(sheet, row, 5, net, net_style(net).num(MONEY_NEG).border())?;
        number(sheet, row, 6, f64::from(totals.in_count), BODY.center().border())?;
        number(sheet, row, 7, f64::from(totals.out_count), BODY.center().border())?;
        text(sheet, row, 8, &entry.description, SMALL.left_wrap().border())?;
        sheet.set_row_height(row, 36.0)?;
    }
    return widths(sheet, &[10.0, 36.0, 30.0, 18.0, 18.0, 18.0, 10.0, 12.0, 60.0]);
}

/// Wires with a shell on either side.
fn tab_shell_network(sheet: &mut Worksheet, ledger: &Ledger, tables: &WorkbookTables) -> Result<(), XlsxError> {
    let classifier = &tables.classification;
    disclaimer(sheet, 9, &tables.disclaimer)?;
    let columns = [
        "Money Source (From)",
        "Money Destination (To)",
        "Wire Amount (USD)",
        "Transaction Date",
        "Source Type",
        "Destination Type",
        "Shell-to-Shell?",
        "Flow Direction",
        "Evidence Source",
    ];
    header(sheet, 1, &columns, RED_HEADER)?;

    for (i, (row, shell)) in (2..).zip(ledger.shell_wires(classifier)).enumerate() {
        let wire = shell.wire;
        let from = sanitize(&wire.entity_from);
        let to = sanitize(&wire.entity_to);
        let from_kind = classifier.classify(&from);
        let to_kind = classifier.classify(&to);
        let fill = zebra(i);
        let cell = BODY.maybe_fill(fill).border();
        let pair_fill = if shell.shell_to_shell { Some(SHELL_PAIR_FILL) } else { fill };
        text(sheet, row, 0, &from, cell)?;
        text(sheet, row, 1, &to, cell)?;
        number(sheet, row, 2, wire.amount, cell.num(MONEY))?;
        text(sheet, row, 3, wire.date_text(), cell)?;
        text(sheet, row, 4, from_kind.label(), cell.center())?;
        text(sheet, row, 5, to_kind.label(), cell.center())?;
        text(sheet, row, 6, yes(shell.shell_to_shell), BODY.center().maybe_fill(pair_fill).border())?;
        text(sheet, row, 7, &Flow::between(from_kind, to_kind).short(), cell)?;
        text(sheet, row, 8, &wire.source, cell)?;
    }
    return widths(sheet, &[38.0, 38.0, 16.0, 12.0, 16.0, 16.0, 14.0, 24.0, 18.0]);
}

/// Write a string.
fn text(sheet: &mut Worksheet, row: RowNum, col: ColNum, value: &str, style: Style) -> Result<(), XlsxError> {
    sheet.write_string_with_format(row, col, value, &style.format())?;
    return Ok(());
}

/// Fill for a hierarchy tier: green receives, orange redistributes, red disburses, blue is terminal.
const fn tier_fill(tier: u8) -> Option<u32> {
    return match tier {
        1 => Some(0x00D5_F5E3),
        2 => Some(0x00FC_E4D6),
        3 => Some(0x00FA_DBD8),
        4 => Some(0x00D6_EAF8),
        _ => None,
    };
}

/// Title row merged across `0..=last_col`.
fn title(sheet: &mut Worksheet, row: RowNum, last_col: ColNum, value: &str, style: Style) -> Result<(), XlsxError> {
    sheet.merge_range(row, 0, row, last_col, value, &style.format())?;
    return Ok(());
}

/// Column widths from the left.
fn widths(sheet: &mut Worksheet, sizes: &[f64]) -> Result<(), XlsxError> {
    for (col, &width) in (0..).zip(sizes) {
        sheet.set_column_width(col, width)?;
    }
    return Ok(());
}

/// Build the workbook and write it to `output`, replacing any existing file.
///
/// # Errors
///
/// Returns `Error::Xlsx` if the workbook cannot be built or serialized, and
/// I/O errors from writing `output`.
pub fn write_workbook(ledger: &Ledger, tables: &WorkbookTables, output: &Path) -> Result<(), Error> {
    let mut workbook = build_workbook(ledger, tables)?;
    let bytes = workbook.save_to_buffer()?;
    driver::write_atomic(output, &bytes)?;
    return Ok(());
}

/// `YES` or an empty cell.
const fn yes(flag: bool) -> &'static str {
    if flag {
        return "YES";
    }
    return "";
}

/// Zebra fill for the `index`-th data row.
const fn zebra(index: usize) -> Option<u32> {
    if index.is_multiple_of(2) {
        return Some(ZEBRA_FILL);
    }
    return None;
}
