//! Core domain model and reporting-calendar types for sortfeed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "sortfeed-core";

/// Daily extract categories accepted by the intake form.
///
/// Each variant corresponds to one uploadable file. The two physical
/// sub-sorters ("haut"/"bas") get distinct variants because their extracts
/// are distinct files with distinct completeness tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    EvtDefauts,
    InjectionHaut,
    InjectionBas,
    TraficSortieHaut,
    TraficSortieBas,
    QualiteTri,
    TempsFonctionnement,
    Interventions,
    MvtStock,
    EtatStock,
    PoidsCarbone,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        DataType::EvtDefauts,
        DataType::InjectionHaut,
        DataType::InjectionBas,
        DataType::TraficSortieHaut,
        DataType::TraficSortieBas,
        DataType::QualiteTri,
        DataType::TempsFonctionnement,
        DataType::Interventions,
        DataType::MvtStock,
        DataType::EtatStock,
        DataType::PoidsCarbone,
    ];

    /// Label recorded in the completeness ledger (`Dates_data."Data_type"`).
    /// These are the historical labels of the deployed schema; changing them
    /// would orphan every ledger row already written.
    pub fn ledger_label(&self) -> &'static str {
        match self {
            DataType::EvtDefauts => "OPB",
            DataType::InjectionHaut => "Injection_haut",
            DataType::InjectionBas => "Injection_bas",
            DataType::TraficSortieHaut => "Trafic_par_sortie_trieur_haut",
            DataType::TraficSortieBas => "Trafic_par_sortie_trieur_bas",
            DataType::QualiteTri => "Qualité_de_tri",
            DataType::TempsFonctionnement => "Temps_fonctionnement",
            DataType::Interventions => "Interventions",
            DataType::MvtStock => "Mvt_stock",
            DataType::EtatStock => "Etat_stock",
            DataType::PoidsCarbone => "Poids_carbone",
        }
    }

    /// File name under which the raw extract is archived in blob storage.
    pub fn blob_file_name(&self) -> &'static str {
        match self {
            DataType::EvtDefauts => "Evenementsetdefauts.xlsx",
            DataType::InjectionHaut => "Injectiondescolisauxantennes_trieur_haut.xlsx",
            DataType::InjectionBas => "Injectiondescolisauxantennes_trieur_bas.xlsx",
            DataType::TraficSortieHaut => "Trafic_par_sortie_trieur_haut.xlsx",
            DataType::TraficSortieBas => "Trafic_par_sortie_trieur_bas.xlsx",
            DataType::QualiteTri => "Qualité_de_tri.xlsx",
            DataType::TempsFonctionnement => "Temps_de_fonctionnement_et_arrêts_machine.xlsx",
            DataType::Interventions => "Interventions.xlsx",
            DataType::MvtStock => "Mouvements_de_stock.xlsx",
            DataType::EtatStock => "Etat_stock.xlsx",
            DataType::PoidsCarbone => "Poids_carbone.xlsx",
        }
    }

    /// URL-safe identifier used by the web routes and the CLI.
    pub fn slug(&self) -> &'static str {
        match self {
            DataType::EvtDefauts => "evt-defauts",
            DataType::InjectionHaut => "injection-haut",
            DataType::InjectionBas => "injection-bas",
            DataType::TraficSortieHaut => "trafic-sortie-haut",
            DataType::TraficSortieBas => "trafic-sortie-bas",
            DataType::QualiteTri => "qualite-tri",
            DataType::TempsFonctionnement => "temps-fonctionnement",
            DataType::Interventions => "interventions",
            DataType::MvtStock => "mvt-stock",
            DataType::EtatStock => "etat-stock",
            DataType::PoidsCarbone => "poids-carbone",
        }
    }

    pub fn from_slug(slug: &str) -> Option<DataType> {
        DataType::ALL.iter().copied().find(|t| t.slug() == slug)
    }

    /// Human-facing title shown on the intake form.
    pub fn display_name(&self) -> &'static str {
        match self {
            DataType::EvtDefauts => "Évènements et défauts",
            DataType::InjectionHaut => "Injections aux antennes (trieur haut)",
            DataType::InjectionBas => "Injections aux antennes (trieur bas)",
            DataType::TraficSortieHaut => "Trafic par sortie (trieur haut)",
            DataType::TraficSortieBas => "Trafic par sortie (trieur bas)",
            DataType::QualiteTri => "Qualité de tri",
            DataType::TempsFonctionnement => "Temps de fonctionnement et arrêts machine",
            DataType::Interventions => "Interventions",
            DataType::MvtStock => "Mouvements de stock",
            DataType::EtatStock => "État du stock",
            DataType::PoidsCarbone => "Poids carbone",
        }
    }

    /// The sub-sorter this extract belongs to, for the per-sorter types.
    pub fn sorter(&self) -> Option<Sorter> {
        match self {
            DataType::InjectionHaut | DataType::TraficSortieHaut => Some(Sorter::Haut),
            DataType::InjectionBas | DataType::TraficSortieBas => Some(Sorter::Bas),
            _ => None,
        }
    }

    /// Whether this is one half of the antenna-injection sibling pair whose
    /// daily total is derived once both files are present.
    pub fn is_injection(&self) -> bool {
        matches!(self, DataType::InjectionHaut | DataType::InjectionBas)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sorter {
    Haut,
    Bas,
}

impl Sorter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sorter::Haut => "haut",
            Sorter::Bas => "bas",
        }
    }
}

/// A typed cell of a normalized output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One output row for a target table: column name to typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    values: BTreeMap<String, CellValue>,
}

impl NormalizedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: CellValue) -> &mut Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// Ordered key-column values, or `None` if any key column is absent or
    /// null. Rows answering `None` must never reach the store writer.
    pub fn key_tuple(&self, key_columns: &[&str]) -> Option<Vec<CellValue>> {
        let mut tuple = Vec::with_capacity(key_columns.len());
        for column in key_columns {
            match self.values.get(*column) {
                Some(value) if !value.is_null() => tuple.push(value.clone()),
                _ => return None,
            }
        }
        Some(tuple)
    }

    pub fn has_complete_key(&self, descriptor: &TableDescriptor) -> bool {
        self.key_tuple(descriptor.key_columns).is_some()
    }
}

/// Static configuration of one target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub table: &'static str,
    /// Natural-key columns used for delete-then-append replacement.
    pub key_columns: &'static [&'static str],
    /// Every column written on insert, in order (includes the key columns).
    pub columns: &'static [&'static str],
    /// When true, a write with zero surviving rows signals a malformed
    /// source and must be rejected instead of silently committing nothing.
    pub require_rows: bool,
    /// When true the whole table is replaced on every load (reference data
    /// with no natural date key).
    pub replace_all: bool,
}

/// One normalized row-set bound for one target table.
#[derive(Debug, Clone, Serialize)]
pub struct TableUpdate {
    pub descriptor: TableDescriptor,
    pub rows: Vec<NormalizedRow>,
}

impl TableUpdate {
    pub fn new(descriptor: TableDescriptor, rows: Vec<NormalizedRow>) -> Self {
        Self { descriptor, rows }
    }
}

/// Expected-reporting-day calendar: Monday through Saturday, minus the
/// holiday exclusion list. Sundays are never reporting days.
#[derive(Debug, Clone, Default)]
pub struct ReportingCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl ReportingCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_reporting_day(&self, date: NaiveDate) -> bool {
        date.weekday() != Weekday::Sun && !self.holidays.contains(&date)
    }

    /// Every reporting day in `[from, to]`, ascending. Empty when `from > to`.
    pub fn expected_dates(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut current = from;
        while current <= to {
            if self.is_reporting_day(current) {
                dates.push(current);
            }
            current = current.succ_opt().expect("date range within chrono bounds");
        }
        dates
    }

    /// Expected reporting days in `[from, to]` with no entry in `present`,
    /// most recent first. Dates outside the range never appear, even when
    /// `present` carries stray entries before `from`.
    pub fn missing_dates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        present: &BTreeSet<NaiveDate>,
    ) -> Vec<NaiveDate> {
        let mut missing: Vec<NaiveDate> = self
            .expected_dates(from, to)
            .into_iter()
            .filter(|date| !present.contains(date))
            .collect();
        missing.reverse();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sundays_are_never_reporting_days() {
        let calendar = ReportingCalendar::default();
        // 2023-01-01 was a Sunday.
        assert!(!calendar.is_reporting_day(d(2023, 1, 1)));
        assert!(calendar.is_reporting_day(d(2023, 1, 2)));
        assert!(calendar.is_reporting_day(d(2023, 1, 7)));
    }

    #[test]
    fn holidays_are_excluded() {
        let calendar = ReportingCalendar::new([d(2023, 5, 1)]);
        assert!(!calendar.is_reporting_day(d(2023, 5, 1)));
        assert!(calendar.is_reporting_day(d(2023, 5, 2)));
    }

    #[test]
    fn expected_dates_is_ascending_and_finite() {
        let calendar = ReportingCalendar::new([d(2023, 1, 6)]);
        let dates = calendar.expected_dates(d(2023, 1, 1), d(2023, 1, 9));
        // Jan 1 and Jan 8 are Sundays, Jan 6 is a holiday.
        assert_eq!(
            dates,
            vec![d(2023, 1, 2), d(2023, 1, 3), d(2023, 1, 4), d(2023, 1, 5), d(2023, 1, 7), d(2023, 1, 9)]
        );
    }

    #[test]
    fn expected_dates_empty_range_yields_empty() {
        let calendar = ReportingCalendar::default();
        assert!(calendar.expected_dates(d(2023, 2, 1), d(2023, 1, 1)).is_empty());
    }

    #[test]
    fn missing_dates_returns_exact_gap_set_descending() {
        let calendar = ReportingCalendar::default();
        let from = d(2023, 1, 2);
        let to = d(2023, 1, 14);
        let mut present: BTreeSet<NaiveDate> =
            calendar.expected_dates(from, to).into_iter().collect();
        present.remove(&d(2023, 1, 3));
        present.remove(&d(2023, 1, 10));
        present.remove(&d(2023, 1, 13));
        // Stray entries outside the window must not leak into the result.
        present.insert(d(2022, 12, 30));

        let missing = calendar.missing_dates(from, to, &present);
        assert_eq!(missing, vec![d(2023, 1, 13), d(2023, 1, 10), d(2023, 1, 3)]);
    }

    #[test]
    fn missing_dates_never_contains_sundays() {
        let calendar = ReportingCalendar::default();
        let missing = calendar.missing_dates(d(2023, 1, 1), d(2023, 1, 8), &BTreeSet::new());
        assert!(missing.iter().all(|date| date.weekday() != Weekday::Sun));
    }

    #[test]
    fn key_tuple_requires_every_key_column() {
        let mut row = NormalizedRow::new();
        row.set("Date", CellValue::Date(d(2025, 4, 2)));
        row.set("Antenne", CellValue::Int(12));
        assert!(row.key_tuple(&["Date", "Antenne"]).is_some());
        assert!(row.key_tuple(&["Date", "Sortie"]).is_none());

        row.set("Antenne", CellValue::Null);
        assert!(row.key_tuple(&["Date", "Antenne"]).is_none());
    }

    #[test]
    fn data_type_slugs_round_trip() {
        for data_type in DataType::ALL {
            assert_eq!(DataType::from_slug(data_type.slug()), Some(data_type));
        }
        assert_eq!(DataType::from_slug("unknown"), None);
    }
}
