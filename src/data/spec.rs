// --- Файл: src/data/spec.rs ---

//! Спецификация выборки: требуемый FOV для каждого слоя.

use crate::volume::Fov;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Отображение имени слоя в требуемый FOV.
///
/// Хранится в `BTreeMap`, поэтому обход всегда идет в лексикографическом
/// порядке имен. Это гарантирует воспроизводимость многослойных выборок
/// при фиксированном seed: порядок извлечения патчей не зависит от порядка
/// вставки слоев.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSpec {
    fovs: BTreeMap<String, Fov>,
}

impl SampleSpec {
    /// Создает пустую спецификацию.
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет слой (builder-стиль).
    pub fn with(mut self, name: impl Into<String>, fov: impl Into<Fov>) -> Self {
        self.fovs.insert(name.into(), fov.into());
        self
    }

    /// Добавляет или заменяет слой.
    pub fn insert(&mut self, name: impl Into<String>, fov: impl Into<Fov>) {
        self.fovs.insert(name.into(), fov.into());
    }

    /// FOV слоя по имени.
    pub fn get(&self, name: &str) -> Option<Fov> {
        self.fovs.get(name).copied()
    }

    /// Изменяемая ссылка на FOV слоя.
    pub fn fov_mut(&mut self, name: &str) -> Option<&mut Fov> {
        self.fovs.get_mut(name)
    }

    /// Проверяет наличие слоя.
    pub fn contains(&self, name: &str) -> bool {
        self.fovs.contains_key(name)
    }

    /// Количество слоев.
    pub fn len(&self) -> usize {
        self.fovs.len()
    }

    /// Проверяет, пуста ли спецификация.
    pub fn is_empty(&self) -> bool {
        self.fovs.is_empty()
    }

    /// Имена слоев в лексикографическом порядке.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.fovs.keys()
    }

    /// Обход пар (имя, FOV) в лексикографическом порядке.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Fov)> {
        self.fovs.iter()
    }

    /// Обход с изменяемыми FOV, в том же порядке.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Fov)> {
        self.fovs.iter_mut()
    }
}

impl FromIterator<(String, Fov)> for SampleSpec {
    fn from_iter<T: IntoIterator<Item = (String, Fov)>>(iter: T) -> Self {
        Self {
            fovs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_sorted() {
        let spec = SampleSpec::new()
            .with("zebra", (1, 1, 1))
            .with("alpha", (2, 2, 2))
            .with("mid", (3, 3, 3));

        let names: Vec<_> = spec.names().cloned().collect();
        assert_eq!(names, vec!["alpha", "mid", "zebra"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut spec = SampleSpec::new().with("raw", (10, 128, 128));
        spec.insert("raw", (20, 256, 256));

        assert_eq!(spec.len(), 1);
        assert_eq!(spec.get("raw"), Some(Fov::new(20, 256, 256)));
    }

    #[test]
    fn test_fov_mut() {
        let mut spec = SampleSpec::new().with("raw", (10, 128, 128));
        spec.fov_mut("raw").unwrap().z += 8;
        assert_eq!(spec.get("raw"), Some(Fov::new(18, 128, 128)));
    }
}
