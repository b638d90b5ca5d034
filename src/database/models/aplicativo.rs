use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Bookmarked external application, grouped by category in the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Aplicativo {
    pub id: i64,
    pub nombre: String,
    pub url: String,
    pub categoria: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/aplicativos` and `PUT /api/aplicativos/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatosAplicativo {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub categoria: String,
}
