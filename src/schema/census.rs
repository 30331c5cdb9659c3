//! Census column preset
//!
//! Column names follow the INEP higher-education census extract. Only the
//! columns listed here are coerced or relabelled; the rest are normalized.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::compute::kernels::cast;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::conversions::{coerce_integer, coerce_numeric, map_codes, normalize_array};
use crate::schema::field::{FieldDefinition, FieldType};

pub const CO_IES: &str = "CO_IES";
pub const NO_IES: &str = "NO_IES";
pub const SG_UF_IES: &str = "SG_UF_IES";
pub const SG_UF: &str = "SG_UF";
pub const TP_REDE: &str = "TP_REDE";
pub const IGC: &str = "IGC";
pub const ANO_IGC: &str = "Ano IGC";
pub const CI: &str = "CI";
pub const CI_EAD: &str = "CI-EaD";
pub const NO_CURSO: &str = "NO_CURSO";
pub const NO_MUNICIPIO: &str = "NO_MUNICIPIO";
pub const NO_CINE_AREA_ESPECIFICA: &str = "NO_CINE_AREA_ESPECIFICA";
pub const TP_GRAU_ACADEMICO: &str = "TP_GRAU_ACADEMICO";
pub const TP_MODALIDADE_ENSINO: &str = "TP_MODALIDADE_ENSINO";
pub const CC: &str = "CC";
pub const CPC: &str = "CPC";
pub const ENADE: &str = "ENADE";
pub const IDD: &str = "IDD";
pub const QT_VG_TOTAL: &str = "QT_VG_TOTAL";
pub const QT_INSCRITO_TOTAL: &str = "QT_INSCRITO_TOTAL";
pub const SITUACAO: &str = "Situação";

/// Columns coerced to numbers on load
pub const NUMERIC_COLUMNS: [&str; 9] = [
    CI,
    CI_EAD,
    IGC,
    CC,
    CPC,
    ENADE,
    IDD,
    QT_VG_TOTAL,
    QT_INSCRITO_TOTAL,
];

/// Definitions for every census column the engine knows about
#[must_use]
pub fn census_fields() -> Vec<FieldDefinition> {
    let mut fields = vec![
        FieldDefinition::new(CO_IES, FieldType::Identifier),
        FieldDefinition::new(NO_IES, FieldType::Text),
        FieldDefinition::new(SG_UF_IES, FieldType::Text),
        FieldDefinition::new(SG_UF, FieldType::Text),
        FieldDefinition::new(NO_CURSO, FieldType::Text),
        FieldDefinition::new(NO_MUNICIPIO, FieldType::Text),
        FieldDefinition::new(NO_CINE_AREA_ESPECIFICA, FieldType::Text),
        FieldDefinition::new(SITUACAO, FieldType::Text),
        FieldDefinition::new(ANO_IGC, FieldType::Integer),
        FieldDefinition::new(TP_REDE, FieldType::Category)
            .with_label(1.0, "Pública")
            .with_label(2.0, "Privada"),
        FieldDefinition::new(TP_MODALIDADE_ENSINO, FieldType::Category)
            .with_label(1.0, "Presencial")
            .with_label(2.0, "EAD"),
        FieldDefinition::new(TP_GRAU_ACADEMICO, FieldType::Category)
            .with_label(1.0, "Bacharelado")
            .with_label(2.0, "Licenciatura")
            .with_label(3.0, "Tecnológico"),
    ];

    fields.extend(
        NUMERIC_COLUMNS
            .iter()
            .map(|name| FieldDefinition::new(*name, FieldType::Decimal)),
    );

    fields
}

/// Coerce and relabel the census columns present in a batch
///
/// Columns with no definition are normalized so that every column ends up
/// as `Utf8`, `Int64` or `Float64`.
pub fn apply_census_transform(batch: &RecordBatch, definitions: &[FieldDefinition]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let (field, converted) = match definitions.iter().find(|d| d.name == *field.name()) {
            Some(definition) => {
                let converted = match definition.field_type {
                    FieldType::Identifier | FieldType::Integer => coerce_integer(column)?,
                    FieldType::Decimal => coerce_numeric(column)?,
                    FieldType::Category => map_codes(column, definition)?,
                    FieldType::Text => normalize_array(column)?,
                };
                let target = definition.to_arrow_field();
                let converted = cast::cast(&converted, target.data_type())?;
                (target, converted)
            }
            None => {
                let converted = normalize_array(column)?;
                (Field::new(field.name(), converted.data_type().clone(), true), converted)
            }
        };

        fields.push(field);
        columns.push(converted);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
