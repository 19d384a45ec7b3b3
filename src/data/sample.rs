// --- Файл: src/data/sample.rs ---

//! Выборка: набор выровненных по центру патчей, по одному на слой.

use crate::volume::{LabelTransform, Patch};
use std::collections::BTreeMap;

/// Отображение имени слоя-метки в политику преобразования.
pub type TransformMap = BTreeMap<String, LabelTransform>;

/// Один обучающий пример: патч на каждый слой спецификации.
///
/// Все патчи выровнены по центру на одну глобальную координату. Выборка
/// создается заново при каждом извлечении и целиком принадлежит
/// вызывающему коду: ее изменение (в том числе стадиями аугментации)
/// не затрагивает внутреннее хранилище датасета.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    patches: BTreeMap<String, Patch>,
}

impl Sample {
    /// Создает пустую выборку.
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет патч слоя.
    pub fn insert(&mut self, name: impl Into<String>, patch: Patch) {
        self.patches.insert(name.into(), patch);
    }

    /// Патч слоя по имени.
    pub fn get(&self, name: &str) -> Option<&Patch> {
        self.patches.get(name)
    }

    /// Изменяемая ссылка на патч слоя.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Patch> {
        self.patches.get_mut(name)
    }

    /// Форма патча слоя `[c, z, y, x]`.
    pub fn shape(&self, name: &str) -> Option<[usize; 4]> {
        self.patches.get(name).map(|p| {
            let (c, z, y, x) = p.dim();
            [c, z, y, x]
        })
    }

    /// Проверяет наличие слоя.
    pub fn contains(&self, name: &str) -> bool {
        self.patches.contains_key(name)
    }

    /// Количество слоев.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Проверяет, пуста ли выборка.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Имена слоев в лексикографическом порядке.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.patches.keys()
    }

    /// Обход пар (имя, патч) в лексикографическом порядке.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Patch)> {
        self.patches.iter()
    }

    /// Обход с изменяемыми патчами, в том же порядке.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Patch)> {
        self.patches.iter_mut()
    }
}
