//! # Volumetric Layer Sources
//!
//! Per-layer volumetric storage behind the [`VolumeSource`] trait.
//!
//! ## Key Components
//!
//! - [`Fov`]: Required patch shape (channels + three spatial axes)
//! - [`VolumeSource`]: Trait for layer data sources (FOV bookkeeping,
//!   valid-range reporting, patch extraction)
//! - [`TensorVolume`]: In-memory source backed by an `ndarray` array
//! - [`LabelTransform`]: Downstream label-conversion policy token

pub mod tensor;

pub use tensor::TensorVolume;

use crate::geometry::{Box3, Vec3i};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Патч объёмных данных: `[каналы, z, y, x]`.
pub type Patch = Array4<f32>;

pub type VolumeResult<T> = std::result::Result<T, VolumeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("Ожидался 3D или 4D массив, получено осей: {0}")]
    BadDimensionality(usize),
    #[error("FOV {fov} не совпадает по каналам с данными (каналов: {channels})")]
    ChannelMismatch { fov: Fov, channels: usize },
    #[error("FOV {0} содержит нулевую ось")]
    ZeroFov(Fov),
    #[error("Патч с центром {0} выходит за пределы данных")]
    PatchOutOfBounds(Vec3i),
}

/// Требуемая форма патча.
///
/// Задается либо тремя пространственными осями (один канал), либо
/// четырьмя осями с ведущим числом каналов. Для вычисления диапазона
/// допустимых центров учитываются только пространственные оси.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fov {
    pub c: usize,
    pub z: usize,
    pub y: usize,
    pub x: usize,
}

impl Fov {
    /// Создает FOV с одним каналом.
    pub fn new(z: usize, y: usize, x: usize) -> Self {
        Self { c: 1, z, y, x }
    }

    /// Создает FOV с явным числом каналов.
    pub fn with_channels(c: usize, z: usize, y: usize, x: usize) -> Self {
        Self { c, z, y, x }
    }

    /// Полная форма патча `[c, z, y, x]`.
    pub fn shape(&self) -> [usize; 4] {
        [self.c, self.z, self.y, self.x]
    }

    /// Пространственные оси `[z, y, x]`.
    pub fn spatial(&self) -> [usize; 3] {
        [self.z, self.y, self.x]
    }

    /// Пространственные оси как вектор.
    pub fn spatial_vec(&self) -> Vec3i {
        Vec3i::new(self.z as i64, self.y as i64, self.x as i64)
    }

    /// Отступ от центра до минимального угла патча по каждой оси.
    pub fn top_margin(&self) -> Vec3i {
        Vec3i::new(
            (self.z / 2) as i64,
            (self.y / 2) as i64,
            (self.x / 2) as i64,
        )
    }
}

impl From<(usize, usize, usize)> for Fov {
    fn from((z, y, x): (usize, usize, usize)) -> Self {
        Self::new(z, y, x)
    }
}

impl From<(usize, usize, usize, usize)> for Fov {
    fn from((c, z, y, x): (usize, usize, usize, usize)) -> Self {
        Self::with_channels(c, z, y, x)
    }
}

impl fmt::Display for Fov {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.c, self.z, self.y, self.x)
    }
}

/// Политика преобразования слоя-метки в обучающую цель.
///
/// Вычисляется вместе с выборкой, но самим конвейером аугментации
/// не изменяется: преобразование выполняет обучающий цикл.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelTransform {
    #[default]
    None,
    Affinity,
    Boundary,
}

/// Источник объёмных данных одного именованного слоя.
///
/// Источник хранит данные, следит за требуемой формой патча (FOV) и умеет:
/// - сообщать диапазон допустимых центров, из которых патч текущего FOV
///   извлекается без выхода за границы данных;
/// - извлекать патч с центром в заданной глобальной координате.
pub trait VolumeSource: Send + Sync {
    /// Объявляет требуемую форму патча.
    fn set_fov(&mut self, fov: Fov) -> VolumeResult<()>;

    /// Текущая форма патча.
    fn fov(&self) -> Fov;

    /// Диапазон допустимых центров патча при текущем FOV.
    ///
    /// Может быть пустым, если FOV больше самих данных.
    fn range(&self) -> Box3;

    /// Извлекает патч с центром в `pos`.
    ///
    /// Возвращаемый патч — глубокая копия: его изменение не затрагивает
    /// внутреннее хранилище источника.
    fn get_patch(&self, pos: Vec3i) -> VolumeResult<Patch>;

    /// Политика преобразования метки. Имеет смысл только для слоев-меток.
    fn label_transform(&self) -> LabelTransform {
        LabelTransform::None
    }
}
