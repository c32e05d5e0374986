//! Starter catalog of FRED series, grouped by the industries they track.

use crate::error::InvalidInput;
use crate::models::SeriesId;

pub const STARTER_GROUPS: &[(&str, &[&str])] = &[
    ("Automotive", &["AUINSA", "TOTALSA", "ALTSALES", "IPG33611S", "CAPUTLG33611S"]),
    ("Commercial Auto Insurance", &["PCU9241269241263"]),
    ("Construction", &["HOUST", "HSN1F", "MORTGAGE30US", "IPG321S"]),
    ("CPG_Food and Paper", &["IPG311S", "IPG322S"]),
    (
        "Industrial Production",
        &["TRUCKD11", "INDPRO", "IPMAN", "IPG311A2S", "IPG333S", "IPG322S", "IPG3361T3S", "MCUMFN"],
    ),
    ("Personal Consumption Trends", &["DFXARX1Q020SBEA", "A136RC1Q027SBEA"]),
    ("Retail", &["RSAFS"]),
    ("Retail Inventories", &["RETAILIRSA", "RETAILSMSA", "RETAILIMSA"]),
];

/// Every starter series with its group, first listing wins for IDs that
/// appear in more than one group.
pub fn starter_metrics() -> Result<Vec<(SeriesId, &'static str)>, InvalidInput> {
    let mut out: Vec<(SeriesId, &'static str)> = Vec::new();
    for (group, ids) in STARTER_GROUPS {
        for raw in *ids {
            let id = SeriesId::parse(raw)?;
            if !out.iter().any(|(existing, _)| *existing == id) {
                out.push((id, *group));
            }
        }
    }
    Ok(out)
}
