//! Per-type normalization of raw spreadsheet extracts.
//!
//! Each data type registers a [`NormalizationRule`] describing how many
//! header rows to skip, which source columns are mandatory, and how rows
//! are transformed into the target row-sets. Adding a new extract type
//! means registering a new rule, not growing a branch chain.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use sortfeed_core::{CellValue, DataType, NormalizedRow, Sorter, TableDescriptor, TableUpdate};

pub const CRATE_NAME: &str = "sortfeed-normalize";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("extract is not a readable workbook: {0}")]
    Unreadable(String),
    #[error("required column missing: {0}")]
    MissingColumn(String),
    #[error("no usable rows in extract for table {0}")]
    EmptyResult(&'static str),
    #[error("extract covers {found} but {expected} was selected")]
    DateMismatch {
        expected: NaiveDate,
        found: NaiveDate,
    },
    #[error("the \"Total\" row is missing or not numeric")]
    BadTotal,
}

// Target table descriptors. Table and column names are the deployed
// schema's and must match it byte for byte, accents included.

pub const EVT_DEFAUTS: TableDescriptor = TableDescriptor {
    table: "LTH_Evt_defauts",
    key_columns: &["Date"],
    columns: &[
        "Date heure de début",
        "Date heure de fin",
        "Machine",
        "Message",
        "Date",
    ],
    require_rows: true,
    replace_all: false,
};

pub const OPB_BOURRAGE: TableDescriptor = TableDescriptor {
    table: "OPB_Bourrage_LTH",
    key_columns: &["Date", "Type"],
    columns: &["Date", "Type", "Duree", "Nombre de défauts"],
    require_rows: false,
    replace_all: false,
};

pub const OPB_SCORE: TableDescriptor = TableDescriptor {
    table: "OPB_LTH",
    key_columns: &["Date"],
    columns: &["Date", "Duree_ponderee"],
    require_rows: false,
    replace_all: false,
};

pub const INJECTIONS_ANTENNES: TableDescriptor = TableDescriptor {
    table: "LTH_Injections_Antennes",
    key_columns: &["Date", "Antenne"],
    columns: &[
        "Antenne",
        "Colis codés",
        "Colis poussés",
        "Flashage pistolet",
        "Colis inadmis",
        "Rejets non lu",
        "Pourcentage Rejets non lu",
        "Multilabels",
        "Pourcentage Multilabel",
        "Total injecté",
        "Temps d'utilisation",
        "Cadence en fonctionnement",
        "Date",
    ],
    require_rows: false,
    replace_all: false,
};

pub const INJECTION_JOUR: TableDescriptor = TableDescriptor {
    table: "Injection_par_jour_LTH",
    key_columns: &["Date"],
    columns: &["Date", "nombre de colis injectés"],
    require_rows: true,
    replace_all: false,
};

pub const TRAFIC_SORTIE: TableDescriptor = TableDescriptor {
    table: "LTH_Trafic_par_sortie",
    key_columns: &["Date", "Trieur", "Sortie"],
    columns: &[
        "Trieur",
        "Sortie",
        "Nb total de colis",
        "Nb de colis en bac",
        "Type de sortie",
        "Rejet Saturation/CP Absent/Mal positionné",
        "Rejet sortie inhibée/fermée",
        "Nb Saturation",
        "Tps Saturation",
        "Nb Bourrage",
        "Tps Bourrage",
        "Date",
    ],
    require_rows: true,
    replace_all: false,
};

pub const QUALITE_TRI: TableDescriptor = TableDescriptor {
    table: "LTH_Qualite_de_tri",
    key_columns: &[
        "Date",
        "Trieur",
        "Tri/contrôle ou rejet",
        "Type de tri/contrôle/rejet",
        "Détail de tri/rejet",
    ],
    columns: &[
        "Trieur",
        "Tri/contrôle ou rejet",
        "Type de tri/contrôle/rejet",
        "Détail de tri/rejet",
        "Nb total colis",
        "Nb de colis en bac",
        "En pourcentage",
        "Date",
    ],
    require_rows: false,
    replace_all: false,
};

pub const TMPS_FONCTIONNEMENT: TableDescriptor = TableDescriptor {
    table: "LTH_Tmps_fonctionnement",
    key_columns: &["Date", "Système"],
    columns: &["Système", "Temps de fonctionnement (s)", "Date"],
    require_rows: false,
    replace_all: false,
};

pub const INTERVENTIONS: TableDescriptor = TableDescriptor {
    table: "Interventions_LTH",
    key_columns: &["Code de l'intervention"],
    columns: &[
        "Code de l'intervention",
        "Date initiale de début",
        "Date/heure de début de l'intervention",
        "Date/heure de fin de l'intervention",
        "Date de dernière modification",
        "Charge prévue",
    ],
    require_rows: false,
    replace_all: false,
};

pub const MVT_STOCK: TableDescriptor = TableDescriptor {
    table: "LTH_MVT_Stock",
    key_columns: &[
        "Date et heure du mouvement de stock",
        "Article",
        "Quantité du mouvement",
        "Magasin de stockage",
    ],
    columns: &[
        "Date et heure du mouvement de stock",
        "Date et heure de valorisation stock",
        "Article",
        "Quantité du mouvement",
        "Magasin de stockage",
    ],
    require_rows: false,
    replace_all: false,
};

pub const INVENTAIRE: TableDescriptor = TableDescriptor {
    table: "LTH_Inventaire",
    key_columns: &["Article", "Magasin de stockage"],
    columns: &["Article", "Magasin de stockage", "Quantité en stock"],
    require_rows: false,
    replace_all: false,
};

pub const POIDS_CARBONE: TableDescriptor = TableDescriptor {
    table: "Poids_carbone_LTH",
    key_columns: &[],
    columns: &["Article", "Libellé", "Poids carbone (kgCO2eq)"],
    require_rows: true,
    replace_all: true,
};

/// A parsed worksheet: trimmed header names plus the data rows projected
/// onto the columns whose header cell is non-blank (summary extracts pad
/// their layout with unnamed spacer columns).
#[derive(Debug, Clone)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
}

impl Sheet {
    pub fn from_xlsx_bytes(bytes: &[u8], header_skip: usize) -> Result<Sheet, NormalizeError> {
        let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|err| NormalizeError::Unreadable(err.to_string()))?;
        let sheet_names = workbook.sheet_names().to_vec();
        let first = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| NormalizeError::Unreadable("workbook has no sheets".to_string()))?;
        let range = workbook
            .worksheet_range(&first)
            .map_err(|err| NormalizeError::Unreadable(err.to_string()))?;

        let mut rows = range.rows().skip(header_skip);
        let header_row: Vec<Data> = rows
            .next()
            .ok_or_else(|| {
                NormalizeError::Unreadable(format!(
                    "no header row after skipping {header_skip} rows"
                ))
            })?
            .to_vec();
        let data_rows: Vec<Vec<Data>> = rows.map(<[Data]>::to_vec).collect();
        Ok(Self::assemble(header_row, data_rows))
    }

    /// Build a sheet from in-memory cells; used by fixtures and tests.
    pub fn from_cells(headers: Vec<&str>, rows: Vec<Vec<Data>>) -> Sheet {
        let header_row = headers
            .into_iter()
            .map(|h| Data::String(h.to_string()))
            .collect();
        Self::assemble(header_row, rows)
    }

    fn assemble(header_row: Vec<Data>, data_rows: Vec<Vec<Data>>) -> Sheet {
        let mut kept = Vec::new();
        let mut headers = Vec::new();
        for (index, cell) in header_row.iter().enumerate() {
            let name = match cell {
                Data::String(s) => s.trim().to_string(),
                Data::Empty => String::new(),
                other => other.to_string().trim().to_string(),
            };
            if !name.is_empty() {
                kept.push(index);
                headers.push(name);
            }
        }
        let rows = data_rows
            .into_iter()
            .map(|row| {
                kept.iter()
                    .map(|&index| row.get(index).cloned().unwrap_or(Data::Empty))
                    .collect()
            })
            .collect();
        Sheet { headers, rows }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name.trim())
    }

    pub fn require_columns(&self, columns: &[&str]) -> Result<(), NormalizeError> {
        for &column in columns {
            if self.column_index(column).is_none() {
                return Err(NormalizeError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |cells| RowView { sheet: self, cells })
    }

    /// Carry the last non-empty value of the named columns downward, for
    /// sources that spell a hierarchical header only on its first row.
    pub fn forward_filled(mut self, columns: &[&str]) -> Sheet {
        for &column in columns {
            let Some(index) = self.column_index(column) else { continue };
            let mut last: Option<Data> = None;
            for row in &mut self.rows {
                let Some(cell) = row.get_mut(index) else { continue };
                if cell_is_empty(cell) {
                    if let Some(previous) = &last {
                        *cell = previous.clone();
                    }
                } else {
                    last = Some(cell.clone());
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    sheet: &'a Sheet,
    cells: &'a [Data],
}

impl<'a> RowView<'a> {
    pub fn cell(&self, column: &str) -> Option<&'a Data> {
        self.sheet
            .column_index(column)
            .and_then(|index| self.cells.get(index))
    }

    pub fn cell_at(&self, index: usize) -> Option<&'a Data> {
        self.cells.get(index)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(cell_is_empty)
    }
}

fn cell_is_empty(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        _ => None,
    }
}

/// Numeric text as exported by the facility tooling: comma decimal
/// separator and non-breaking-space thousand groups.
fn clean_numeric_text(text: &str) -> String {
    text.trim().replace('\u{a0}', "").replace(',', ".")
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => clean_numeric_text(s).parse().ok(),
        _ => None,
    }
}

fn cell_i64(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) => Some(*f as i64),
        Data::String(s) => clean_numeric_text(s).parse().ok(),
        _ => None,
    }
}

fn parse_day_first_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value);
        }
    }
    for format in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(value) = NaiveDate::parse_from_str(text, format) {
            return value.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::String(s) => parse_day_first_datetime(s),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok(),
        _ => None,
    }
}

/// Generic cell-to-value mapping for columns carried through unchanged.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Int(i64::from(*b)),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) => cell_datetime(&Data::DateTimeIso(s.clone()))
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        _ => CellValue::Null,
    }
}

fn timestamp_or_null(cell: Option<&Data>) -> CellValue {
    cell.and_then(cell_datetime)
        .map(CellValue::Timestamp)
        .unwrap_or(CellValue::Null)
}

fn text_or_null(cell: Option<&Data>) -> CellValue {
    cell.and_then(cell_text)
        .map(CellValue::Text)
        .unwrap_or(CellValue::Null)
}

fn value_or_null(cell: Option<&Data>) -> CellValue {
    cell.map(cell_value).unwrap_or(CellValue::Null)
}

/// Convert duration text to float seconds. Accepts `HH:MM:SS` with an
/// optional fractional-second part, and `"N day(s), HH:MM:SS"`. Unparsable
/// input yields the caller's fallback instead of failing the row.
pub fn duration_seconds(text: &str, fallback: f64) -> f64 {
    parse_duration_seconds(text).unwrap_or(fallback)
}

fn parse_duration_seconds(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(seconds) = parse_hms(text) {
        return Some(seconds);
    }
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() == 3 {
        let unit = parts[1].trim_end_matches(',');
        if unit == "day" || unit == "days" {
            let days: i64 = parts[0].parse().ok()?;
            let rest = parse_hms(parts[2])?;
            return Some(days as f64 * 86400.0 + rest);
        }
    }
    None
}

fn parse_hms(text: &str) -> Option<f64> {
    let mut fields = text.split(':');
    let (h, m, s) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    let seconds: f64 = s.parse().ok()?;
    if hours >= 24 || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

/// Duration in a spreadsheet cell: text, an Excel time serial (fraction of
/// a day), or a plain number of seconds.
fn cell_duration_seconds(cell: Option<&Data>, fallback: f64) -> f64 {
    match cell {
        Some(Data::String(s)) => duration_seconds(s, fallback),
        Some(Data::DateTime(dt)) => dt.as_f64() * 86400.0,
        Some(Data::Float(f)) => f * 86400.0,
        Some(Data::Int(i)) => *i as f64,
        _ => fallback,
    }
}

/// Caller-supplied inputs to normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizeContext {
    pub reporting_date: NaiveDate,
    /// Fault-message weighting lookup (`CLE_BOURRAGE` -> `COEFF`) used by
    /// the severity-score derivation of the events extract.
    pub fault_weights: HashMap<String, f64>,
}

impl NormalizeContext {
    pub fn new(reporting_date: NaiveDate) -> Self {
        Self {
            reporting_date,
            fault_weights: HashMap::new(),
        }
    }

    pub fn with_fault_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.fault_weights = weights;
        self
    }
}

pub trait NormalizationRule: Send + Sync {
    fn header_skip(&self) -> usize;
    fn required_columns(&self) -> &'static [&'static str] {
        &[]
    }
    fn normalize(
        &self,
        sheet: Sheet,
        ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError>;
}

pub fn rule_for(data_type: DataType) -> Box<dyn NormalizationRule> {
    match data_type {
        DataType::EvtDefauts => Box::new(EvtDefautsRule),
        DataType::InjectionHaut | DataType::InjectionBas => Box::new(InjectionsRule),
        DataType::TraficSortieHaut => Box::new(TraficSortieRule { sorter: Sorter::Haut }),
        DataType::TraficSortieBas => Box::new(TraficSortieRule { sorter: Sorter::Bas }),
        DataType::QualiteTri => Box::new(QualiteTriRule),
        DataType::TempsFonctionnement => Box::new(TempsFonctionnementRule),
        DataType::Interventions => Box::new(InterventionsRule),
        DataType::MvtStock => Box::new(MvtStockRule),
        DataType::EtatStock => Box::new(EtatStockRule),
        DataType::PoidsCarbone => Box::new(PoidsCarboneRule),
    }
}

/// Parse and normalize one raw extract into its target row-sets.
pub fn normalize_extract(
    bytes: &[u8],
    data_type: DataType,
    ctx: &NormalizeContext,
) -> Result<Vec<TableUpdate>, NormalizeError> {
    let rule = rule_for(data_type);
    let sheet = Sheet::from_xlsx_bytes(bytes, rule.header_skip())?;
    sheet.require_columns(rule.required_columns())?;
    rule.normalize(sheet, ctx)
}

/// Read the facility-wide injected total from one per-sorter injection
/// extract: the summary row where `Trieur` is `Total`, column
/// `Total injecté`, as an integer.
pub fn injected_daily_total(bytes: &[u8]) -> Result<i64, NormalizeError> {
    let sheet = Sheet::from_xlsx_bytes(bytes, 0)?;
    total_from_sheet(&sheet)
}

fn total_from_sheet(sheet: &Sheet) -> Result<i64, NormalizeError> {
    let total_row = sheet
        .rows()
        .find(|row| {
            row.cell("Trieur")
                .and_then(cell_text)
                .is_some_and(|t| t == "Total")
        })
        .ok_or(NormalizeError::BadTotal)?;
    total_row
        .cell("Total injecté")
        .and_then(cell_i64)
        .ok_or(NormalizeError::BadTotal)
}

struct FaultEvent {
    debut: NaiveDateTime,
    fin: Option<NaiveDateTime>,
    machine: Option<String>,
    message: String,
}

impl FaultEvent {
    fn duration_hours(&self) -> Option<f64> {
        let fin = self.fin?;
        Some((fin - self.debut).num_seconds() as f64 / 3600.0)
    }
}

/// Events/faults extract. Three outputs from one source: the raw fault
/// log, the jam/IOB aggregate, and the duration-weighted severity score.
struct EvtDefautsRule;

impl NormalizationRule for EvtDefautsRule {
    fn header_skip(&self) -> usize {
        5
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["Date heure de début", "Date heure de fin", "Machine", "Message"]
    }

    fn normalize(
        &self,
        sheet: Sheet,
        ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let mut events = Vec::new();
        for row in sheet.rows() {
            let Some(message) = row.cell("Message").and_then(cell_text) else {
                continue;
            };
            // "Fin :" lines close an earlier fault; they are not occurrences.
            if message.starts_with("Fin :") {
                continue;
            }
            let Some(debut) = row.cell("Date heure de début").and_then(cell_datetime) else {
                continue;
            };
            events.push(FaultEvent {
                debut,
                fin: row.cell("Date heure de fin").and_then(cell_datetime),
                machine: row.cell("Machine").and_then(cell_text),
                message,
            });
        }

        let Some(first) = events.first() else {
            return Err(NormalizeError::EmptyResult(EVT_DEFAUTS.table));
        };
        // The fault log is the one extract whose date comes from its own
        // content; it still has to agree with the day the operator picked.
        let derived = first.debut.date();
        if derived != ctx.reporting_date {
            return Err(NormalizeError::DateMismatch {
                expected: ctx.reporting_date,
                found: derived,
            });
        }

        let fault_rows = events
            .iter()
            .map(|event| {
                let mut row = NormalizedRow::new();
                row.set("Date heure de début", CellValue::Timestamp(event.debut));
                row.set(
                    "Date heure de fin",
                    event
                        .fin
                        .map(CellValue::Timestamp)
                        .unwrap_or(CellValue::Null),
                );
                row.set(
                    "Machine",
                    event
                        .machine
                        .clone()
                        .map(CellValue::Text)
                        .unwrap_or(CellValue::Null),
                );
                row.set("Message", CellValue::Text(event.message.clone()));
                row.set("Date", CellValue::Date(derived));
                row
            })
            .collect();
        let mut updates = vec![TableUpdate::new(EVT_DEFAUTS, fault_rows)];

        let mut buckets: BTreeMap<&'static str, (f64, i64)> = BTreeMap::new();
        for event in &events {
            let kind = if event.message.contains("Erreur IOB") {
                "IOB"
            } else if event.message.contains("Bourrage") {
                "Bourrage"
            } else {
                continue;
            };
            let Some(hours) = event.duration_hours() else { continue };
            let entry = buckets.entry(kind).or_insert((0.0, 0));
            entry.0 += hours;
            entry.1 += 1;
        }
        if !buckets.is_empty() {
            let rows = buckets
                .into_iter()
                .map(|(kind, (hours, count))| {
                    let mut row = NormalizedRow::new();
                    row.set("Date", CellValue::Date(derived));
                    row.set("Type", CellValue::Text(kind.to_string()));
                    row.set("Duree", CellValue::Float(hours));
                    row.set("Nombre de défauts", CellValue::Int(count));
                    row
                })
                .collect();
            updates.push(TableUpdate::new(OPB_BOURRAGE, rows));
        }

        let mut score = 0.0;
        let mut matched = false;
        for event in &events {
            let Some(coeff) = ctx.fault_weights.get(&event.message) else {
                continue;
            };
            let Some(hours) = event.duration_hours() else { continue };
            score += hours * coeff;
            matched = true;
        }
        if matched {
            let mut row = NormalizedRow::new();
            row.set("Date", CellValue::Date(derived));
            row.set("Duree_ponderee", CellValue::Float(score));
            updates.push(TableUpdate::new(OPB_SCORE, vec![row]));
        }

        Ok(updates)
    }
}

const INJECTION_SOURCE_COLUMNS: &[&str] = &[
    "Antenne",
    "Colis codés",
    "Colis poussés",
    "Flashage pistolet",
    "Colis inadmis",
    "Rejets\nnon lu",
    "Pourcentage\nRejets non lu",
    "Multilabels",
    "Pourcentage Multilabel",
    "Total injecté",
    "Temps d'utilisation",
    "Cadence en fonctionnement",
];

/// Per-antenna injection counts. The source spells two headers across two
/// lines; those are renamed on the way out.
struct InjectionsRule;

impl NormalizationRule for InjectionsRule {
    fn header_skip(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &'static [&'static str] {
        INJECTION_SOURCE_COLUMNS
    }

    fn normalize(
        &self,
        sheet: Sheet,
        ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let renames: HashMap<&str, &str> = HashMap::from([
            ("Rejets\nnon lu", "Rejets non lu"),
            ("Pourcentage\nRejets non lu", "Pourcentage Rejets non lu"),
        ]);
        let mut rows = Vec::new();
        for view in sheet.rows() {
            // The summary footer has no antenna; skip it along with padding rows.
            if view.cell("Antenne").map(cell_is_empty).unwrap_or(true) {
                continue;
            }
            let mut row = NormalizedRow::new();
            for &source in INJECTION_SOURCE_COLUMNS {
                let target = renames.get(source).copied().unwrap_or(source);
                row.set(target, value_or_null(view.cell(source)));
            }
            row.set("Date", CellValue::Date(ctx.reporting_date));
            rows.push(row);
        }
        Ok(vec![TableUpdate::new(INJECTIONS_ANTENNES, rows)])
    }
}

/// Per-exit traffic for one sub-sorter. Rows of the other sorter are
/// dropped; jam durations become float seconds with a zero fallback.
struct TraficSortieRule {
    sorter: Sorter,
}

const TRAFIC_PASSTHROUGH_COLUMNS: &[&str] = &[
    "Nb total de colis",
    "Nb de colis en bac",
    "Type de sortie",
    "Rejet Saturation/CP Absent/Mal positionné",
    "Rejet sortie inhibée/fermée",
    "Nb Saturation",
    "Tps Saturation",
    "Nb Bourrage",
];

impl NormalizationRule for TraficSortieRule {
    fn header_skip(&self) -> usize {
        6
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["Trieur", "Sortie"]
    }

    fn normalize(
        &self,
        sheet: Sheet,
        ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let wanted = format!("Trieur {}", self.sorter.as_str());
        let has_tps_bourrage = sheet.column_index("Tps Bourrage").is_some();
        let mut rows = Vec::new();
        for view in sheet.rows() {
            let Some(trieur) = view.cell("Trieur").and_then(cell_text) else {
                continue;
            };
            if trieur != wanted {
                continue;
            }
            let sortie = value_or_null(view.cell("Sortie"));
            if sortie.is_null() {
                continue;
            }
            let mut row = NormalizedRow::new();
            row.set("Trieur", CellValue::Text(trieur));
            row.set("Sortie", sortie);
            for &column in TRAFIC_PASSTHROUGH_COLUMNS {
                row.set(column, value_or_null(view.cell(column)));
            }
            row.set(
                "Tps Bourrage",
                if has_tps_bourrage {
                    CellValue::Float(cell_duration_seconds(view.cell("Tps Bourrage"), 0.0))
                } else {
                    CellValue::Null
                },
            );
            row.set("Date", CellValue::Date(ctx.reporting_date));
            rows.push(row);
        }
        Ok(vec![TableUpdate::new(TRAFIC_SORTIE, rows)])
    }
}

/// Sorting-quality breakdown. The source repeats its three grouping
/// columns only on the first row of each block.
struct QualiteTriRule;

impl NormalizationRule for QualiteTriRule {
    fn header_skip(&self) -> usize {
        3
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "Trieur",
            "Tri/contrôle ou rejet",
            "Type de tri/contrôle/rejet",
            "Détail de tri/rejet",
            "Nb total colis",
            "Nb de colis en bac",
            "En pourcentage",
        ]
    }

    fn normalize(
        &self,
        sheet: Sheet,
        ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let sheet = sheet.forward_filled(&[
            "Trieur",
            "Tri/contrôle ou rejet",
            "Type de tri/contrôle/rejet",
        ]);
        let mut rows = Vec::new();
        for view in sheet.rows() {
            let Some(detail) = view.cell("Détail de tri/rejet").and_then(cell_text) else {
                continue;
            };
            let mut row = NormalizedRow::new();
            row.set("Trieur", text_or_null(view.cell("Trieur")));
            row.set(
                "Tri/contrôle ou rejet",
                text_or_null(view.cell("Tri/contrôle ou rejet")),
            );
            row.set(
                "Type de tri/contrôle/rejet",
                text_or_null(view.cell("Type de tri/contrôle/rejet")),
            );
            row.set("Détail de tri/rejet", CellValue::Text(detail));
            row.set("Nb total colis", value_or_null(view.cell("Nb total colis")));
            row.set(
                "Nb de colis en bac",
                value_or_null(view.cell("Nb de colis en bac")),
            );
            row.set("En pourcentage", value_or_null(view.cell("En pourcentage")));
            row.set("Date", CellValue::Date(ctx.reporting_date));
            if row.has_complete_key(&QUALITE_TRI) {
                rows.push(row);
            }
        }
        Ok(vec![TableUpdate::new(QUALITE_TRI, rows)])
    }
}

/// Machine uptime. Positional layout: first column is the system name,
/// second its running time. The sheet trails off into footnotes after the
/// first blank row, and carries a grand-total row that must not be loaded.
struct TempsFonctionnementRule;

impl NormalizationRule for TempsFonctionnementRule {
    fn header_skip(&self) -> usize {
        3
    }

    fn normalize(
        &self,
        sheet: Sheet,
        ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        if sheet.width() < 2 {
            return Err(NormalizeError::MissingColumn(
                "Temps de fonctionnement (s)".to_string(),
            ));
        }
        let mut rows = Vec::new();
        for view in sheet.rows() {
            if view.is_blank() {
                break;
            }
            let Some(systeme) = view.cell_at(0).and_then(cell_text) else {
                continue;
            };
            if systeme == "Total" {
                continue;
            }
            let seconds = cell_duration_seconds(view.cell_at(1), 86400.0);
            let mut row = NormalizedRow::new();
            row.set("Système", CellValue::Text(systeme));
            row.set("Temps de fonctionnement (s)", CellValue::Float(seconds));
            row.set("Date", CellValue::Date(ctx.reporting_date));
            rows.push(row);
        }
        Ok(vec![TableUpdate::new(TMPS_FONCTIONNEMENT, rows)])
    }
}

/// Maintenance interventions export. Keyed by the intervention code alone:
/// a re-export updates interventions in place regardless of date.
struct InterventionsRule;

const INTERVENTION_DATETIME_COLUMNS: &[&str] = &[
    "Date initiale de début",
    "Date/heure de début de l'intervention",
    "Date/heure de fin de l'intervention",
    "Date de dernière modification",
];

impl NormalizationRule for InterventionsRule {
    fn header_skip(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "Code de l'intervention",
            "Date initiale de début",
            "Date/heure de début de l'intervention",
            "Date/heure de fin de l'intervention",
            "Date de dernière modification",
            "Charge prévue",
        ]
    }

    fn normalize(
        &self,
        sheet: Sheet,
        _ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let mut rows = Vec::new();
        for view in sheet.rows() {
            let Some(code) = view.cell("Code de l'intervention").and_then(cell_text) else {
                continue;
            };
            let mut row = NormalizedRow::new();
            row.set("Code de l'intervention", CellValue::Text(code));
            for &column in INTERVENTION_DATETIME_COLUMNS {
                row.set(column, timestamp_or_null(view.cell(column)));
            }
            row.set(
                "Charge prévue",
                CellValue::Float(cell_duration_seconds(view.cell("Charge prévue"), 86400.0)),
            );
            rows.push(row);
        }
        Ok(vec![TableUpdate::new(INTERVENTIONS, rows)])
    }
}

/// Stock movements export. The movement tuple itself is the key, so a
/// re-export of an overlapping window replaces rather than duplicates.
struct MvtStockRule;

impl NormalizationRule for MvtStockRule {
    fn header_skip(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "Date et heure du mouvement de stock",
            "Date et heure de valorisation stock",
            "Article",
            "Quantité du mouvement",
            "Magasin de stockage",
        ]
    }

    fn normalize(
        &self,
        sheet: Sheet,
        _ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let mut rows = Vec::new();
        for view in sheet.rows() {
            let mut row = NormalizedRow::new();
            row.set(
                "Date et heure du mouvement de stock",
                timestamp_or_null(view.cell("Date et heure du mouvement de stock")),
            );
            row.set(
                "Date et heure de valorisation stock",
                timestamp_or_null(view.cell("Date et heure de valorisation stock")),
            );
            row.set("Article", text_or_null(view.cell("Article")));
            row.set(
                "Quantité du mouvement",
                value_or_null(view.cell("Quantité du mouvement")),
            );
            row.set(
                "Magasin de stockage",
                text_or_null(view.cell("Magasin de stockage")),
            );
            if row.has_complete_key(&MVT_STOCK) {
                rows.push(row);
            }
        }
        Ok(vec![TableUpdate::new(MVT_STOCK, rows)])
    }
}

/// Inventory snapshot, keyed by article and warehouse.
struct EtatStockRule;

impl NormalizationRule for EtatStockRule {
    fn header_skip(&self) -> usize {
        0
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &["Article", "Magasin de stockage", "Quantité en stock"]
    }

    fn normalize(
        &self,
        sheet: Sheet,
        _ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        let mut rows = Vec::new();
        for view in sheet.rows() {
            let mut row = NormalizedRow::new();
            row.set("Article", text_or_null(view.cell("Article")));
            row.set(
                "Magasin de stockage",
                text_or_null(view.cell("Magasin de stockage")),
            );
            row.set(
                "Quantité en stock",
                value_or_null(view.cell("Quantité en stock")),
            );
            if row.has_complete_key(&INVENTAIRE) {
                rows.push(row);
            }
        }
        Ok(vec![TableUpdate::new(INVENTAIRE, rows)])
    }
}

/// Carbon-weight reference table. Positional three-column source; the
/// whole table is replaced on every load.
struct PoidsCarboneRule;

impl NormalizationRule for PoidsCarboneRule {
    fn header_skip(&self) -> usize {
        0
    }

    fn normalize(
        &self,
        sheet: Sheet,
        _ctx: &NormalizeContext,
    ) -> Result<Vec<TableUpdate>, NormalizeError> {
        if sheet.width() < 3 {
            return Err(NormalizeError::MissingColumn(
                "Poids carbone (kgCO2eq)".to_string(),
            ));
        }
        let mut rows = Vec::new();
        for view in sheet.rows() {
            let Some(article) = view.cell_at(0).and_then(cell_text) else {
                continue;
            };
            let mut row = NormalizedRow::new();
            row.set("Article", CellValue::Text(article));
            row.set("Libellé", text_or_null(view.cell_at(1)));
            row.set(
                "Poids carbone (kgCO2eq)",
                view.cell_at(2)
                    .and_then(cell_f64)
                    .map(CellValue::Float)
                    .unwrap_or(CellValue::Null),
            );
            rows.push(row);
        }
        Ok(vec![TableUpdate::new(POIDS_CARBONE, rows)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn f(value: f64) -> Data {
        Data::Float(value)
    }

    #[test]
    fn duration_parsing_round_trips() {
        assert_eq!(duration_seconds("01:02:03", 0.0), 3723.0);
        assert_eq!(duration_seconds("01:02:03.500000", 0.0), 3723.5);
        assert_eq!(duration_seconds("2 days, 01:00:00", 0.0), 176400.0);
        assert_eq!(duration_seconds("1 day, 00:30:00", 0.0), 88200.0);
        assert_eq!(duration_seconds("n/a", 0.0), 0.0);
        assert_eq!(duration_seconds("n/a", 86400.0), 86400.0);
    }

    #[test]
    fn blank_header_columns_are_dropped() {
        let sheet = Sheet::from_cells(
            vec!["Trieur", "", "Sortie"],
            vec![vec![s("Trieur haut"), s("spacer"), f(4.0)]],
        );
        assert_eq!(sheet.width(), 2);
        assert!(sheet.column_index("Sortie").is_some());
        let row = sheet.rows().next().unwrap();
        assert_eq!(row.cell("Sortie"), Some(&f(4.0)));
    }

    fn evt_sheet() -> Sheet {
        Sheet::from_cells(
            vec!["Date heure de début", "Date heure de fin", "Machine", "Message"],
            vec![
                vec![
                    s("02/04/2025 05:10:00"),
                    s("02/04/2025 05:40:00"),
                    s("TRI-01"),
                    s("Défaut de Bourrage injecteur 3"),
                ],
                vec![
                    s("02/04/2025 06:00:00"),
                    s("02/04/2025 06:30:00"),
                    s("TRI-01"),
                    s("Fin : Défaut de Bourrage injecteur 3"),
                ],
                vec![
                    s("02/04/2025 07:00:00"),
                    s("02/04/2025 09:00:00"),
                    s("TRI-02"),
                    s("Erreur IOB cellule 12"),
                ],
            ],
        )
    }

    #[test]
    fn fault_rows_exclude_closure_events() {
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = EvtDefautsRule.normalize(evt_sheet(), &ctx).unwrap();
        let faults = &updates[0];
        assert_eq!(faults.descriptor.table, "LTH_Evt_defauts");
        assert_eq!(faults.rows.len(), 2);
        for row in &faults.rows {
            assert!(row.has_complete_key(&EVT_DEFAUTS));
            assert_ne!(row.get("Message").unwrap().as_text().unwrap(), "Fin : Défaut de Bourrage injecteur 3");
        }
    }

    #[test]
    fn fault_date_must_match_the_selected_day() {
        let ctx = NormalizeContext::new(d(2025, 4, 3));
        let err = EvtDefautsRule.normalize(evt_sheet(), &ctx).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::DateMismatch { expected, found }
                if expected == d(2025, 4, 3) && found == d(2025, 4, 2)
        ));
    }

    #[test]
    fn jam_and_iob_events_are_aggregated_by_type() {
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = EvtDefautsRule.normalize(evt_sheet(), &ctx).unwrap();
        let aggregate = updates
            .iter()
            .find(|u| u.descriptor.table == "OPB_Bourrage_LTH")
            .unwrap();
        assert_eq!(aggregate.rows.len(), 2);
        let bourrage = aggregate
            .rows
            .iter()
            .find(|r| r.get("Type").unwrap().as_text() == Some("Bourrage"))
            .unwrap();
        assert_eq!(bourrage.get("Duree"), Some(&CellValue::Float(0.5)));
        assert_eq!(bourrage.get("Nombre de défauts"), Some(&CellValue::Int(1)));
    }

    #[test]
    fn severity_score_sums_weighted_durations_of_matching_messages() {
        let weights = HashMap::from([("Défaut de Bourrage injecteur 3".to_string(), 2.0)]);
        let ctx = NormalizeContext::new(d(2025, 4, 2)).with_fault_weights(weights);
        let updates = EvtDefautsRule.normalize(evt_sheet(), &ctx).unwrap();
        let score = updates
            .iter()
            .find(|u| u.descriptor.table == "OPB_LTH")
            .unwrap();
        assert_eq!(score.rows.len(), 1);
        // 0.5h * coeff 2.0
        assert_eq!(score.rows[0].get("Duree_ponderee"), Some(&CellValue::Float(1.0)));
        assert_eq!(score.rows[0].get("Date"), Some(&CellValue::Date(d(2025, 4, 2))));
    }

    #[test]
    fn empty_fault_extract_is_rejected() {
        let sheet = Sheet::from_cells(
            vec!["Date heure de début", "Date heure de fin", "Machine", "Message"],
            vec![vec![
                s("02/04/2025 06:00:00"),
                s("02/04/2025 06:30:00"),
                s("TRI-01"),
                s("Fin : Défaut de Bourrage injecteur 3"),
            ]],
        );
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        assert!(matches!(
            EvtDefautsRule.normalize(sheet, &ctx),
            Err(NormalizeError::EmptyResult(_))
        ));
    }

    fn injection_headers() -> Vec<&'static str> {
        vec![
            "Trieur",
            "Antenne",
            "Colis codés",
            "Colis poussés",
            "Flashage pistolet",
            "Colis inadmis",
            "Rejets\nnon lu",
            "Pourcentage\nRejets non lu",
            "Multilabels",
            "Pourcentage Multilabel",
            "Total injecté",
            "Temps d'utilisation",
            "Cadence en fonctionnement",
        ]
    }

    fn injection_row(antenne: Data, total: Data) -> Vec<Data> {
        vec![
            s("Trieur haut"),
            antenne,
            f(10.0),
            f(2.0),
            f(1.0),
            f(0.0),
            f(3.0),
            f(0.3),
            f(1.0),
            f(0.1),
            total,
            s("06:00:00"),
            f(1200.0),
        ]
    }

    #[test]
    fn injection_rows_without_antenna_are_dropped_and_headers_renamed() {
        let sheet = Sheet::from_cells(
            injection_headers(),
            vec![
                injection_row(f(3.0), f(5000.0)),
                injection_row(Data::Empty, f(9000.0)),
            ],
        );
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = InjectionsRule.normalize(sheet, &ctx).unwrap();
        assert_eq!(updates.len(), 1);
        let rows = &updates[0].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Rejets non lu"), Some(&CellValue::Float(3.0)));
        assert!(rows[0].get("Rejets\nnon lu").is_none());
        assert_eq!(rows[0].get("Date"), Some(&CellValue::Date(d(2025, 4, 2))));
        assert!(rows[0].has_complete_key(&INJECTIONS_ANTENNES));
    }

    #[test]
    fn traffic_rows_keep_only_the_selected_sorter() {
        let sheet = Sheet::from_cells(
            vec!["Trieur", "Sortie", "Nb total de colis", "Tps Bourrage"],
            vec![
                vec![s("Trieur haut"), f(1.0), f(120.0), s("00:05:00")],
                vec![s("Trieur bas"), f(2.0), f(80.0), s("00:01:00")],
                vec![s("Trieur haut"), f(3.0), f(60.0), s("oops")],
            ],
        );
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = TraficSortieRule { sorter: Sorter::Haut }
            .normalize(sheet, &ctx)
            .unwrap();
        let rows = &updates[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Tps Bourrage"), Some(&CellValue::Float(300.0)));
        // Unparsable jam time falls back to zero instead of failing the row.
        assert_eq!(rows[1].get("Tps Bourrage"), Some(&CellValue::Float(0.0)));
        assert!(rows.iter().all(|r| r.has_complete_key(&TRAFIC_SORTIE)));
    }

    #[test]
    fn quality_grouping_columns_are_forward_filled() {
        let sheet = Sheet::from_cells(
            vec![
                "Trieur",
                "Tri/contrôle ou rejet",
                "Type de tri/contrôle/rejet",
                "Détail de tri/rejet",
                "Nb total colis",
                "Nb de colis en bac",
                "En pourcentage",
            ],
            vec![
                vec![s("Trieur haut"), s("Tri"), s("Direct"), s("Bac plein"), f(10.0), f(8.0), f(0.8)],
                vec![Data::Empty, Data::Empty, Data::Empty, s("Bac vide"), f(4.0), f(1.0), f(0.25)],
                vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty, f(1.0), f(1.0), f(1.0)],
            ],
        );
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = QualiteTriRule.normalize(sheet, &ctx).unwrap();
        let rows = &updates[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Trieur").unwrap().as_text(), Some("Trieur haut"));
        assert_eq!(
            rows[1].get("Type de tri/contrôle/rejet").unwrap().as_text(),
            Some("Direct")
        );
        assert!(rows.iter().all(|r| r.has_complete_key(&QUALITE_TRI)));
    }

    #[test]
    fn uptime_truncates_at_first_blank_row_and_drops_the_total() {
        let sheet = Sheet::from_cells(
            vec!["Système", "Temps de fonctionnement", "Date"],
            vec![
                vec![s("Trieur haut"), s("12:00:00"), Data::Empty],
                vec![s("Total"), s("23:00:00"), Data::Empty],
                vec![s("Trieur bas"), s("bad value"), Data::Empty],
                vec![Data::Empty, Data::Empty, Data::Empty],
                vec![s("Footnote: extraction générée automatiquement"), Data::Empty, Data::Empty],
            ],
        );
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = TempsFonctionnementRule.normalize(sheet, &ctx).unwrap();
        let rows = &updates[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("Temps de fonctionnement (s)"),
            Some(&CellValue::Float(43200.0))
        );
        // Unparsable uptime falls back to a full day.
        assert_eq!(
            rows[1].get("Temps de fonctionnement (s)"),
            Some(&CellValue::Float(86400.0))
        );
    }

    #[test]
    fn interventions_parse_day_first_timestamps_and_planned_load() {
        let sheet = Sheet::from_cells(
            vec![
                "Code de l'intervention",
                "Date initiale de début",
                "Date/heure de début de l'intervention",
                "Date/heure de fin de l'intervention",
                "Date de dernière modification",
                "Charge prévue",
            ],
            vec![vec![
                s("INT-881"),
                s("01/04/2025"),
                s("01/04/2025 08:00:00"),
                s("01/04/2025 10:30:00"),
                s("02/04/2025 09:15:00"),
                s("02:30:00"),
            ]],
        );
        let ctx = NormalizeContext::new(d(2025, 4, 2));
        let updates = InterventionsRule.normalize(sheet, &ctx).unwrap();
        let row = &updates[0].rows[0];
        assert_eq!(
            row.get("Date/heure de début de l'intervention"),
            Some(&CellValue::Timestamp(
                d(2025, 4, 1).and_hms_opt(8, 0, 0).unwrap()
            ))
        );
        assert_eq!(row.get("Charge prévue"), Some(&CellValue::Float(9000.0)));
        assert!(row.has_complete_key(&INTERVENTIONS));
    }

    #[test]
    fn stock_movements_without_a_complete_key_are_dropped() {
        let sheet = Sheet::from_cells(
            vec![
                "Date et heure du mouvement de stock",
                "Date et heure de valorisation stock",
                "Article",
                "Quantité du mouvement",
                "Magasin de stockage",
            ],
            vec![
                vec![s("01/04/2025 11:00:00"), s("01/04/2025 12:00:00"), s("VIS-M8"), f(-4.0), s("MAG1")],
                vec![s("01/04/2025 11:05:00"), s("01/04/2025 12:00:00"), s("VIS-M8"), f(2.0), Data::Empty],
            ],
        );
        let updates = MvtStockRule
            .normalize(sheet, &NormalizeContext::new(d(2025, 4, 2)))
            .unwrap();
        assert_eq!(updates[0].rows.len(), 1);
    }

    #[test]
    fn carbon_weights_map_positionally_onto_the_reference_columns() {
        let sheet = Sheet::from_cells(
            vec!["Code article", "Désignation", "kgCO2eq"],
            vec![vec![s("VIS-M8"), s("Vis M8"), f(0.12)]],
        );
        let updates = PoidsCarboneRule
            .normalize(sheet, &NormalizeContext::new(d(2025, 4, 2)))
            .unwrap();
        assert!(updates[0].descriptor.replace_all);
        let row = &updates[0].rows[0];
        assert_eq!(row.get("Article").unwrap().as_text(), Some("VIS-M8"));
        assert_eq!(
            row.get("Poids carbone (kgCO2eq)"),
            Some(&CellValue::Float(0.12))
        );
    }

    #[test]
    fn daily_total_reads_the_total_row() {
        let sheet = Sheet::from_cells(
            vec!["Trieur", "Antenne", "Total injecté"],
            vec![
                vec![s("Trieur haut"), f(1.0), f(5000.0)],
                vec![s("Total"), Data::Empty, f(61234.0)],
            ],
        );
        assert_eq!(total_from_sheet(&sheet).unwrap(), 61234);
    }

    #[test]
    fn missing_or_textual_total_is_rejected() {
        let no_total = Sheet::from_cells(
            vec!["Trieur", "Total injecté"],
            vec![vec![s("Trieur haut"), f(5000.0)]],
        );
        assert!(matches!(
            total_from_sheet(&no_total),
            Err(NormalizeError::BadTotal)
        ));

        let textual = Sheet::from_cells(
            vec!["Trieur", "Total injecté"],
            vec![vec![s("Total"), s("indisponible")]],
        );
        assert!(matches!(
            total_from_sheet(&textual),
            Err(NormalizeError::BadTotal)
        ));
    }
}
