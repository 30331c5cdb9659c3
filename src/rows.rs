//! Typed rows for the institution and course tables
//!
//! Every field is optional: a column may be absent from the source file, and
//! any cell may be missing.

use serde::{Deserialize, Serialize};

/// One institution, as shown in the institution table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InstitutionRow {
    pub co_ies: Option<i64>,
    pub no_ies: Option<String>,
    pub sg_uf_ies: Option<String>,
    pub tp_rede: Option<String>,
    pub igc: Option<f64>,
    #[serde(rename = "Ano IGC")]
    pub ano_igc: Option<i64>,
    pub ci: Option<f64>,
    #[serde(rename = "CI-EaD")]
    pub ci_ead: Option<f64>,
}

/// One course offering, as shown in the course table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CourseRow {
    pub co_ies: Option<i64>,
    pub no_ies: Option<String>,
    pub no_curso: Option<String>,
    pub sg_uf: Option<String>,
    pub no_municipio: Option<String>,
    pub no_cine_area_especifica: Option<String>,
    pub tp_grau_academico: Option<String>,
    pub tp_modalidade_ensino: Option<String>,
    pub cc: Option<f64>,
    pub cpc: Option<f64>,
    pub enade: Option<f64>,
    pub idd: Option<f64>,
    pub qt_vg_total: Option<f64>,
    pub qt_inscrito_total: Option<f64>,
    #[serde(rename = "Situação")]
    pub situacao: Option<String>,
}

impl CourseRow {
    /// Candidates per seat, when both counts are present and positive
    #[must_use]
    pub fn candidates_per_seat(&self) -> Option<f64> {
        match (self.qt_inscrito_total, self.qt_vg_total) {
            (Some(inscribed), Some(seats)) if inscribed > 0.0 && seats > 0.0 => Some(inscribed / seats),
            _ => None,
        }
    }
}
