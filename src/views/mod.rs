//! Per-view presentation state for list screens: saved ordering, category
//! grouping and name filtering. Nothing here touches the database; the CLI
//! persists a [`PreferencesStore`] next to its session file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::database::models::aplicativo::Aplicativo;
use crate::database::models::nota::Nota;

pub const SIN_CATEGORIA: &str = "Sin categoría";

/// Anything a view can reorder by id
pub trait Ordenable {
    fn orden_id(&self) -> i64;
}

/// Anything a view can filter by display name
pub trait Nombrado {
    fn nombre(&self) -> &str;
}

impl Ordenable for Nota {
    fn orden_id(&self) -> i64 {
        self.id
    }
}

impl Nombrado for Nota {
    fn nombre(&self) -> &str {
        &self.novedad
    }
}

impl Ordenable for Aplicativo {
    fn orden_id(&self) -> i64 {
        self.id
    }
}

impl Nombrado for Aplicativo {
    fn nombre(&self) -> &str {
        &self.nombre
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewPreferences {
    #[serde(default)]
    pub orden: Vec<i64>,
    #[serde(default)]
    pub categorias: Vec<String>,
}

impl ViewPreferences {
    /// Sort `items` by the saved order. Unknown items keep their incoming
    /// order after the known ones. `orden` is rewritten to match the result,
    /// which drops ids that no longer exist.
    pub fn apply_order<T: Ordenable>(&mut self, items: Vec<T>) -> Vec<T> {
        let (mut known, unknown): (Vec<T>, Vec<T>) = items
            .into_iter()
            .partition(|item| self.orden.contains(&item.orden_id()));

        known.sort_by_key(|item| self.orden.iter().position(|id| *id == item.orden_id()));
        known.extend(unknown);

        self.orden = known.iter().map(Ordenable::orden_id).collect();
        known
    }

    /// Move the entry at `from` to position `to`, shifting the rest. Returns
    /// false and changes nothing when `from` is out of range; `to` is clamped.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.orden.len() {
            return false;
        }
        let id = self.orden.remove(from);
        let to = to.min(self.orden.len());
        self.orden.insert(to, id);
        true
    }

    /// Replace the saved order outright, skipping repeated ids
    pub fn set_order(&mut self, ids: &[i64]) {
        let mut seen = HashSet::new();
        self.orden = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    }

    /// Sort category groups by the saved category order, same rules as
    /// [`apply_order`](Self::apply_order).
    pub fn apply_categoria_order<'a>(
        &mut self,
        groups: Vec<(String, Vec<&'a Aplicativo>)>,
    ) -> Vec<(String, Vec<&'a Aplicativo>)> {
        let (mut known, unknown): (Vec<_>, Vec<_>) = groups
            .into_iter()
            .partition(|(categoria, _)| self.categorias.contains(categoria));

        known.sort_by_key(|(categoria, _)| self.categorias.iter().position(|c| c == categoria));
        known.extend(unknown);

        self.categorias = known.iter().map(|(categoria, _)| categoria.clone()).collect();
        known
    }
}

/// Group aplicativos by category, keeping first-seen category order.
/// Blank categories collect under [`SIN_CATEGORIA`].
pub fn group_by_categoria(aplicativos: &[Aplicativo]) -> Vec<(String, Vec<&Aplicativo>)> {
    let mut groups: Vec<(String, Vec<&Aplicativo>)> = Vec::new();

    for aplicativo in aplicativos {
        let categoria = match aplicativo.categoria.trim() {
            "" => SIN_CATEGORIA,
            other => other,
        };

        match groups.iter().position(|(name, _)| name == categoria) {
            Some(index) => groups[index].1.push(aplicativo),
            None => groups.push((categoria.to_string(), vec![aplicativo])),
        }
    }

    groups
}

/// Case-insensitive substring match on the display name. A blank needle
/// matches everything.
pub fn filter_by_nombre<'a, T: Nombrado>(items: &'a [T], needle: &str) -> Vec<&'a T> {
    let needle = needle.trim().to_lowercase();
    items
        .iter()
        .filter(|item| needle.is_empty() || item.nombre().to_lowercase().contains(&needle))
        .collect()
}

/// Preferences for every view, keyed by view name (`aplicativos`,
/// `notas-avances`, `plantillas-adicionales`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesStore {
    #[serde(default)]
    pub vistas: BTreeMap<String, ViewPreferences>,
}

impl PreferencesStore {
    /// Missing file means no saved preferences yet
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn view(&self, key: &str) -> ViewPreferences {
        self.vistas.get(key).cloned().unwrap_or_default()
    }

    pub fn view_mut(&mut self, key: &str) -> &mut ViewPreferences {
        self.vistas.entry(key.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn aplicativo(id: i64, nombre: &str, categoria: &str) -> Aplicativo {
        Aplicativo {
            id,
            nombre: nombre.into(),
            url: format!("https://example.com/{}", id),
            categoria: categoria.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(items: &[Aplicativo]) -> Vec<i64> {
        items.iter().map(|a| a.id).collect()
    }

    #[test]
    fn apply_order_puts_known_first_and_appends_new() {
        let mut prefs = ViewPreferences {
            orden: vec![3, 99, 1],
            ..Default::default()
        };
        let items = vec![aplicativo(1, "a", "x"), aplicativo(2, "b", "x"), aplicativo(3, "c", "x")];

        let ordered = prefs.apply_order(items);
        assert_eq!(ids(&ordered), vec![3, 1, 2]);
        assert_eq!(prefs.orden, vec![3, 1, 2]);
    }

    #[test]
    fn apply_order_without_preferences_keeps_input() {
        let mut prefs = ViewPreferences::default();
        let ordered = prefs.apply_order(vec![aplicativo(5, "a", "x"), aplicativo(4, "b", "x")]);
        assert_eq!(ids(&ordered), vec![5, 4]);
    }

    #[test]
    fn move_item_behaves_like_drag_and_drop() {
        let mut prefs = ViewPreferences {
            orden: vec![1, 2, 3, 4],
            ..Default::default()
        };
        assert!(prefs.move_item(0, 2));
        assert_eq!(prefs.orden, vec![2, 3, 1, 4]);
        assert!(prefs.move_item(3, 0));
        assert_eq!(prefs.orden, vec![4, 2, 3, 1]);
        assert!(prefs.move_item(1, 100));
        assert_eq!(prefs.orden, vec![4, 3, 1, 2]);
        assert!(!prefs.move_item(9, 0));
    }

    #[test]
    fn set_order_drops_duplicates() {
        let mut prefs = ViewPreferences::default();
        prefs.set_order(&[3, 1, 3, 2, 1]);
        assert_eq!(prefs.orden, vec![3, 1, 2]);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let items = vec![
            aplicativo(1, "Drive", "Ofimática"),
            aplicativo(2, "Jira", "Soporte"),
            aplicativo(3, "Sheets", "Ofimática"),
            aplicativo(4, "Wiki", " "),
        ];
        let groups = group_by_categoria(&items);
        let names: Vec<&str> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Ofimática", "Soporte", SIN_CATEGORIA]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn saved_category_order_wins() {
        let items = vec![aplicativo(1, "a", "A"), aplicativo(2, "b", "B"), aplicativo(3, "c", "C")];
        let mut prefs = ViewPreferences {
            categorias: vec!["C".into(), "A".into()],
            ..Default::default()
        };
        let groups = prefs.apply_categoria_order(group_by_categoria(&items));
        let names: Vec<&str> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let items = vec![aplicativo(1, "Google Drive", "x"), aplicativo(2, "Jira", "x")];
        assert_eq!(filter_by_nombre(&items, "drive").len(), 1);
        assert_eq!(filter_by_nombre(&items, "DRIVE")[0].id, 1);
        assert_eq!(filter_by_nombre(&items, "  ").len(), 2);
        assert!(filter_by_nombre(&items, "slack").is_empty());
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferencias.json");

        assert_eq!(PreferencesStore::load(&path).unwrap(), PreferencesStore::default());

        let mut store = PreferencesStore::default();
        store.view_mut("aplicativos").set_order(&[2, 1]);
        store.save(&path).unwrap();

        let loaded = PreferencesStore::load(&path).unwrap();
        assert_eq!(loaded.view("aplicativos").orden, vec![2, 1]);
        assert_eq!(loaded.view("notas-avances"), ViewPreferences::default());
    }
}
