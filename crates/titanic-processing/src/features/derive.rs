//! Stateless feature derivations.
//!
//! Everything here depends on a single row only, so it can run on any split
//! without fitted parameters.

use crate::error::Result;
use crate::utils::{column_names, f64_values, frame_from_series, i64_values, series, string_values};
use polars::prelude::*;

/// Title used when a name has no comma-separated title.
pub const UNKNOWN_TITLE: &str = "Unknown";
/// Cabin letter for passengers without a cabin.
pub const MISSING_CABIN_LETTER: &str = "n";

/// Numeric columns produced by derivation, in output order.
pub const DERIVED_NUMERIC: [&str; 3] = ["Name_Len", "Age_Null_Flag", "Ticket_Len"];
/// Categorical columns produced by derivation.
pub const DERIVED_CATEGORICAL: [&str; 4] = ["Name_Title", "Fam_Size", "Ticket_Lett", "Cabin_Letter"];
/// Intermediate cabin number, replaced by bin indicators on transform.
pub const CABIN_NUMBER: &str = "Cabin_num";

/// Raw columns consumed by derivation.
const CONSUMED: [&str; 5] = ["Name", "SibSp", "Parch", "Ticket", "Cabin"];

const KEPT_TICKET_LETTERS: [char; 7] = ['1', '2', '3', 'S', 'P', 'C', 'A'];
const LOW_TICKET_LETTERS: [char; 7] = ['W', '4', '7', '6', 'L', '5', '8'];

/// Title token of a passenger name, e.g. `"Mr."` for `"Braund, Mr. Owen Harris"`.
pub fn name_title(name: &str) -> String {
    name.split_once(',')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or(UNKNOWN_TITLE)
        .to_string()
}

/// Family size bucket for `SibSp + Parch`.
pub fn family_size(relatives: i64) -> &'static str {
    match relatives {
        i64::MIN..=0 => "Solo",
        1..=3 => "Nuclear",
        _ => "Big",
    }
}

/// Ticket prefix bucket.
pub fn ticket_letter(ticket: &str) -> String {
    match ticket.chars().next() {
        Some(c) if KEPT_TICKET_LETTERS.contains(&c) => c.to_string(),
        Some(c) if LOW_TICKET_LETTERS.contains(&c) => "Low_ticket".to_string(),
        _ => "Other_ticket".to_string(),
    }
}

/// First letter of a cabin, `"n"` when missing.
pub fn cabin_letter(cabin: Option<&str>) -> String {
    cabin
        .and_then(|c| c.chars().next())
        .map_or_else(|| MISSING_CABIN_LETTER.to_string(), |c| c.to_string())
}

/// Number of the last cabin listed, e.g. `27` for `"C23 C25 C27"`.
pub fn cabin_number(cabin: Option<&str>) -> Option<f64> {
    let last = cabin?.split_whitespace().last()?;
    let mut chars = last.chars();
    chars.next()?;
    chars.as_str().parse::<i64>().ok().map(|n| n as f64)
}

/// Apply all row-level derivations.
///
/// Consumed raw columns are dropped; all other input columns pass through in
/// order, followed by the derived numeric, categorical and cabin number
/// columns.
pub fn derive(df: &DataFrame) -> Result<DataFrame> {
    let names = string_values(df, "Name")?;
    let ages = f64_values(df, "Age")?;
    let sib_sp = i64_values(df, "SibSp")?;
    let parch = i64_values(df, "Parch")?;
    let tickets = string_values(df, "Ticket")?;
    let cabins = string_values(df, "Cabin")?;

    let name_len: Vec<Option<i64>> = names
        .iter()
        .map(|n| n.as_ref().map(|n| n.chars().count() as i64))
        .collect();
    let titles: Vec<String> = names
        .iter()
        .map(|n| n.as_deref().map_or_else(|| UNKNOWN_TITLE.to_string(), name_title))
        .collect();
    let age_null: Vec<i64> = ages.iter().map(|a| i64::from(a.is_none())).collect();
    let fam_size: Vec<Option<&str>> = sib_sp
        .iter()
        .zip(&parch)
        .map(|(s, p)| Some(family_size(s.unwrap_or(0) + p.unwrap_or(0))))
        .collect();
    let ticket_len: Vec<Option<i64>> = tickets
        .iter()
        .map(|t| t.as_ref().map(|t| t.chars().count() as i64))
        .collect();
    let ticket_lett: Vec<Option<String>> = tickets
        .iter()
        .map(|t| t.as_deref().map(ticket_letter))
        .collect();
    let cabin_lett: Vec<String> = cabins.iter().map(|c| cabin_letter(c.as_deref())).collect();
    let cabin_num: Vec<Option<f64>> = cabins.iter().map(|c| cabin_number(c.as_deref())).collect();

    let mut columns: Vec<Series> = Vec::with_capacity(df.width() + 8);
    for name in column_names(df) {
        if !CONSUMED.contains(&name.as_str()) {
            columns.push(series(df, &name)?.clone());
        }
    }
    columns.push(Series::new("Name_Len".into(), name_len));
    columns.push(Series::new("Age_Null_Flag".into(), age_null));
    columns.push(Series::new("Ticket_Len".into(), ticket_len));
    columns.push(Series::new("Name_Title".into(), titles));
    columns.push(Series::new("Fam_Size".into(), fam_size));
    columns.push(Series::new("Ticket_Lett".into(), ticket_lett));
    columns.push(Series::new("Cabin_Letter".into(), cabin_lett));
    columns.push(Series::new(CABIN_NUMBER.into(), cabin_num));

    frame_from_series(columns)
}
