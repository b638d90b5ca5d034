use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Kind of a `notas` row. Stored explicitly instead of being guessed from
/// which text fields happen to be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoNota {
    /// Progress note, content in `nota_avances`
    Avance,
    /// Note template with public/internal variants
    Plantilla,
    /// Free-form reusable snippet, content in `plantilla`
    Adicional,
}

impl TipoNota {
    pub const TEMPLATE_KINDS: [TipoNota; 2] = [TipoNota::Plantilla, TipoNota::Adicional];

    pub fn as_str(&self) -> &'static str {
        match self {
            TipoNota::Avance => "avance",
            TipoNota::Plantilla => "plantilla",
            TipoNota::Adicional => "adicional",
        }
    }

    /// Best guess for requests that do not say what they are creating
    pub fn infer(campos: &CamposNota) -> Self {
        if !is_blank(&campos.nota_publica) || !is_blank(&campos.nota_interna) {
            TipoNota::Plantilla
        } else if !is_blank(&campos.plantilla) {
            TipoNota::Adicional
        } else {
            TipoNota::Avance
        }
    }

    /// Name of the field(s) that must carry content for this kind
    pub fn content_fields(&self) -> &'static [&'static str] {
        match self {
            TipoNota::Avance => &["nota_avances"],
            TipoNota::Plantilla => &["nota_publica", "nota_interna"],
            TipoNota::Adicional => &["plantilla"],
        }
    }

    pub fn has_content(&self, campos: &CamposNota) -> bool {
        match self {
            TipoNota::Avance => !is_blank(&campos.nota_avances),
            TipoNota::Plantilla => !is_blank(&campos.nota_publica) || !is_blank(&campos.nota_interna),
            TipoNota::Adicional => !is_blank(&campos.plantilla),
        }
    }

    pub fn is_template(&self) -> bool {
        Self::TEMPLATE_KINDS.contains(self)
    }
}

impl TryFrom<String> for TipoNota {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "avance" => Ok(TipoNota::Avance),
            "plantilla" => Ok(TipoNota::Plantilla),
            "adicional" => Ok(TipoNota::Adicional),
            other => Err(format!("unknown tipo '{}'", other)),
        }
    }
}

impl std::fmt::Display for TipoNota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Nota {
    pub id: i64,
    pub usuario_id: Option<i64>,
    pub plantilla_id: Option<i64>,
    #[sqlx(try_from = "String")]
    pub tipo: TipoNota,
    pub novedad: String,
    pub nota_publica: String,
    pub nota_interna: String,
    pub nota_avances: String,
    pub plantilla: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The four optional text fields, as sent by clients. Absent or `null` means
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CamposNota {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nota_publica: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nota_interna: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nota_avances: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub plantilla: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /api/notas`. There is deliberately no `usuario_id` field:
/// the owner always comes from the token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NuevaNota {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub novedad: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo: Option<TipoNota>,
    #[serde(flatten)]
    pub campos: CamposNota,
}

/// Body of `POST /api/notas/asignar`
#[derive(Debug, Clone, Deserialize)]
pub struct AsignarPlantilla {
    pub plantilla_id: i64,
    /// Optional label for the copy; defaults to the base template's
    #[serde(default)]
    pub novedad: Option<String>,
}

/// Body of `PUT /api/notas/plantilla/:id`. Full replace: omitted text fields
/// are written as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReemplazoPlantilla {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub novedad: String,
    #[serde(default)]
    pub tipo: Option<TipoNota>,
    #[serde(flatten)]
    pub campos: CamposNota,
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Whether a template label looks auto-generated or empty: blank, or ending in
/// `" - "` followed by a millisecond timestamp (10+ digits).
pub fn is_misnamed(novedad: &str) -> bool {
    let trimmed = novedad.trim();
    if trimmed.is_empty() {
        return true;
    }

    match trimmed.rsplit_once(" - ") {
        Some((_, suffix)) => suffix.len() >= 10 && suffix.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
