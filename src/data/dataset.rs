// --- Файл: src/data/dataset.rs ---

//! Датасет объёмных данных: реестр слоев, активная спецификация и
//! пересеченный диапазон допустимых центров выборки.

use super::sample::{Sample, TransformMap};
use super::spec::SampleSpec;
use crate::geometry::{Box3, Vec3i};
use crate::volume::{VolumeError, VolumeSource};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Слой '{0}' не зарегистрирован в датасете")]
    UnknownLayer(String),
    #[error("Спецификация не содержит зарегистрированный слой '{0}'")]
    MissingLayer(String),
    #[error("Пересечение допустимых диапазонов слоев пусто")]
    EmptyRange,
    #[error("Координата {pos} вне допустимого диапазона {range}")]
    OutOfRange { pos: Vec3i, range: Box3 },
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Роль слоя в обучении.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    Image,
    Label,
    Mask,
}

struct Layer {
    source: Box<dyn VolumeSource>,
    role: LayerRole,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("source", &"<dyn VolumeSource>")
            .field("role", &self.role)
            .finish()
    }
}

/// Датасет совместно зарегистрированных объёмных слоев.
///
/// Владеет отображением имени слоя в источник данных, активной
/// спецификацией (FOV на слой) и диапазоном допустимых центров выборки —
/// пересечением диапазонов всех слоев. Диапазон пересчитывается при каждой
/// смене спецификации.
///
/// Датасет рассчитан на однопоточное использование: спецификация и
/// диапазон — разделяемое изменяемое состояние без блокировок. Для
/// параллельных воркеров создавайте по экземпляру на воркер.
pub struct VolumeDataset {
    layers: BTreeMap<String, Layer>,
    images: Vec<String>,
    labels: Vec<String>,
    spec: SampleSpec,
    range: Box3,
}

impl std::fmt::Debug for VolumeDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeDataset")
            .field("layers", &self.layers)
            .field("images", &self.images)
            .field("labels", &self.labels)
            .field("spec", &self.spec)
            .field("range", &self.range)
            .finish()
    }
}

impl VolumeDataset {
    /// Активная спецификация.
    pub fn spec(&self) -> &SampleSpec {
        &self.spec
    }

    /// Текущий диапазон допустимых центров выборки.
    pub fn range(&self) -> Box3 {
        self.range
    }

    /// Количество различных позиций выборки в диапазоне.
    pub fn num_samples(&self) -> i64 {
        self.range.num_points()
    }

    /// Имена слоев-изображений (отсортированы).
    pub fn image_names(&self) -> &[String] {
        &self.images
    }

    /// Имена слоев-меток (отсортированы).
    pub fn label_names(&self) -> &[String] {
        &self.labels
    }

    /// Заменяет активную спецификацию и пересчитывает диапазон.
    ///
    /// Имена проверяются до каких-либо изменений: спецификация с
    /// незарегистрированным слоем ([`DatasetError::UnknownLayer`]) или без
    /// одного из зарегистрированных ([`DatasetError::MissingLayer`])
    /// отклоняется, не затрагивая прежние спецификацию и диапазон. Пустое
    /// пересечение диапазонов — ошибка [`DatasetError::EmptyRange`]; в этом
    /// случае FOV источников откатываются к прежней спецификации.
    pub fn set_spec(&mut self, spec: SampleSpec) -> DatasetResult<()> {
        for name in spec.names() {
            if !self.layers.contains_key(name) {
                return Err(DatasetError::UnknownLayer(name.clone()));
            }
        }
        for name in self.layers.keys() {
            if !spec.contains(name) {
                return Err(DatasetError::MissingLayer(name.clone()));
            }
        }

        match self.apply_spec(&spec) {
            Ok(range) => {
                debug!("spec обновлен: слоев {}, диапазон {}", spec.len(), range);
                self.spec = spec;
                self.range = range;
                Ok(())
            }
            Err(err) => {
                // Откат FOV источников: прежняя спецификация была валидна.
                if !self.spec.is_empty() {
                    let prev = self.spec.clone();
                    let _ = self.apply_spec(&prev);
                }
                Err(err)
            }
        }
    }

    /// Проталкивает FOV в источники и пересекает их диапазоны.
    fn apply_spec(&mut self, spec: &SampleSpec) -> DatasetResult<Box3> {
        let mut range: Option<Box3> = None;
        for (name, fov) in spec.iter() {
            let layer = self
                .layers
                .get_mut(name)
                .ok_or_else(|| DatasetError::UnknownLayer(name.clone()))?;
            layer.source.set_fov(*fov)?;
            let r = layer.source.range();
            range = Some(match range {
                None => r,
                Some(acc) => acc.intersect(&r),
            });
        }
        range
            .filter(|r| !r.is_empty())
            .ok_or(DatasetError::EmptyRange)
    }

    /// Извлекает выборку с центром в `pos`.
    ///
    /// Слои обходятся в лексикографическом порядке имен, поэтому результат
    /// детерминирован. Каждый патч имеет форму, равную FOV своего слоя в
    /// активной спецификации, и выровнен по центру на `pos`.
    pub fn get_sample(&self, pos: Vec3i) -> DatasetResult<(Sample, TransformMap)> {
        if !self.range.contains(pos) {
            return Err(DatasetError::OutOfRange {
                pos,
                range: self.range,
            });
        }

        let mut sample = Sample::new();
        for name in self.spec.names() {
            let layer = self
                .layers
                .get(name)
                .ok_or_else(|| DatasetError::UnknownLayer(name.clone()))?;
            sample.insert(name.clone(), layer.source.get_patch(pos)?);
        }

        let mut transform = TransformMap::new();
        for name in &self.labels {
            if let Some(layer) = self.layers.get(name) {
                transform.insert(name.clone(), layer.source.label_transform());
            }
        }

        trace!("выборка извлечена: центр {}", pos);
        Ok((sample, transform))
    }

    /// Извлекает выборку в равномерно случайной позиции диапазона.
    ///
    /// Если передана `spec`, она действует только на время этого вызова:
    /// прежние спецификация и диапазон восстанавливаются на любом пути
    /// выхода, включая ошибочный.
    pub fn random_sample(
        &mut self,
        rng: &mut StdRng,
        spec: Option<SampleSpec>,
    ) -> DatasetResult<(Sample, TransformMap)> {
        match spec {
            None => {
                let pos = self.random_location(rng);
                self.get_sample(pos)
            }
            Some(temp) => {
                let original = self.spec.clone();
                let outcome = self.set_spec(temp).and_then(|()| {
                    let pos = self.random_location(rng);
                    self.get_sample(pos)
                });
                // Восстанавливаем исходную спецификацию на обоих исходах.
                self.set_spec(original)?;
                outcome
            }
        }
    }

    /// Следующая выборка последовательности.
    ///
    /// Пока последовательной стратегии нет: выборка берется случайно, и
    /// никаких гарантий порядка вызывающий код иметь не должен.
    pub fn next_sample(
        &mut self,
        rng: &mut StdRng,
        spec: Option<SampleSpec>,
    ) -> DatasetResult<(Sample, TransformMap)> {
        self.random_sample(rng, spec)
    }

    /// Равномерно случайная позиция внутри диапазона.
    ///
    /// По каждой оси независимо выбирается целое смещение в `[0, size)`,
    /// к которому прибавляется минимальный угол диапазона. Распределение
    /// равномерно по объему диапазона и не зависит от содержимого данных.
    fn random_location(&self, rng: &mut StdRng) -> Vec3i {
        let s = self.range.size();
        let z = rng.random_range(0..s.z);
        let y = rng.random_range(0..s.y);
        let x = rng.random_range(0..s.x);
        Vec3i::new(z, y, x) + self.range.min()
    }
}

/// Конструктор [`VolumeDataset`].
///
/// Слои регистрируются по ролям; маски обрабатываются на этапе `build`,
/// когда FOV соответствующих меток уже известны.
#[derive(Default)]
pub struct VolumeDatasetBuilder {
    layers: BTreeMap<String, Layer>,
    masks: Vec<(String, Box<dyn VolumeSource>, String)>,
}

impl VolumeDatasetBuilder {
    /// Создает пустой конструктор.
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует слой-изображение.
    pub fn image(mut self, name: impl Into<String>, source: impl VolumeSource + 'static) -> Self {
        self.layers.insert(
            name.into(),
            Layer {
                source: Box::new(source),
                role: LayerRole::Image,
            },
        );
        self
    }

    /// Регистрирует слой-метку.
    pub fn label(mut self, name: impl Into<String>, source: impl VolumeSource + 'static) -> Self {
        self.layers.insert(
            name.into(),
            Layer {
                source: Box::new(source),
                role: LayerRole::Label,
            },
        );
        self
    }

    /// Регистрирует слой-маску, привязанную к слою-метке `label`.
    ///
    /// Пространственный FOV маски наследуется от метки при `build`.
    pub fn mask(
        mut self,
        name: impl Into<String>,
        source: impl VolumeSource + 'static,
        label: impl Into<String>,
    ) -> Self {
        self.masks
            .push((name.into(), Box::new(source), label.into()));
        self
    }

    /// Строит датасет.
    ///
    /// Спецификация по умолчанию составляется из текущих FOV источников,
    /// после чего сразу вычисляется диапазон выборки.
    pub fn build(mut self) -> DatasetResult<VolumeDataset> {
        // Маски: наследуем пространственный FOV от своей метки,
        // сохраняя собственное число каналов.
        for (name, mut source, label) in std::mem::take(&mut self.masks) {
            let label_fov = match self.layers.get(&label) {
                Some(layer) if layer.role == LayerRole::Label => layer.source.fov(),
                _ => return Err(DatasetError::UnknownLayer(label)),
            };
            let mut fov = label_fov;
            fov.c = source.fov().c;
            source.set_fov(fov)?;
            self.layers.insert(
                name,
                Layer {
                    source,
                    role: LayerRole::Mask,
                },
            );
        }

        let images = self
            .layers
            .iter()
            .filter(|(_, l)| l.role == LayerRole::Image)
            .map(|(n, _)| n.clone())
            .collect();
        let labels = self
            .layers
            .iter()
            .filter(|(_, l)| l.role == LayerRole::Label)
            .map(|(n, _)| n.clone())
            .collect();

        let spec: SampleSpec = self
            .layers
            .iter()
            .map(|(n, l)| (n.clone(), l.source.fov()))
            .collect();

        let mut dataset = VolumeDataset {
            layers: self.layers,
            images,
            labels,
            spec: SampleSpec::new(),
            range: Box3::new(Vec3i::ZERO, Vec3i::ZERO),
        };
        dataset.set_spec(spec)?;
        Ok(dataset)
    }
}
