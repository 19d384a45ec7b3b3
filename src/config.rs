// --- Файл: src/config.rs ---

//! Конфигурационные записи датасета.
//!
//! Датасет описывается явным списком слоев с перечисленными параметрами.
//! Все параметры разрешаются на этапе построения; никакого динамического
//! поиска атрибутов во время выборки не происходит. Сами объемы данных
//! передаются отдельно, уже загруженными: разбор файлов и форматы хранения
//! не входят в задачи этого слоя.

use crate::data::{DatasetError, LayerRole, VolumeDataset, VolumeDatasetBuilder};
use crate::geometry::Vec3i;
use crate::volume::{LabelTransform, TensorVolume, VolumeError};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Для слоя '{0}' не передан объем данных")]
    MissingVolume(String),
    #[error("Маска '{0}' не указывает слой-метку (mask_of)")]
    MaskWithoutLabel(String),
    #[error(transparent)]
    Volume(#[from] VolumeError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Описание одного слоя датасета.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub role: LayerRole,
    /// Глобальная координата нулевого вокселя (z, y, x).
    #[serde(default)]
    pub offset: Option<[i64; 3]>,
    /// Политика преобразования метки (только для роли `label`).
    #[serde(default)]
    pub transform: Option<LabelTransform>,
    /// Имя слоя-метки, к которому привязана маска (только для роли `mask`).
    #[serde(default)]
    pub mask_of: Option<String>,
}

/// Описание датасета: список слоев.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub layers: Vec<LayerConfig>,
}

impl DatasetConfig {
    /// Строит датасет из описания и уже загруженных объемов.
    ///
    /// Для каждого слоя в `volumes` должен лежать массив (3D или 4D) под
    /// его именем. Маски привязываются к своим меткам и наследуют их FOV
    /// на этапе построения.
    pub fn build(&self, mut volumes: HashMap<String, ArrayD<f32>>) -> ConfigResult<VolumeDataset> {
        let mut builder = VolumeDatasetBuilder::new();

        for layer in &self.layers {
            let data = volumes
                .remove(&layer.name)
                .ok_or_else(|| ConfigError::MissingVolume(layer.name.clone()))?;
            let offset = layer.offset.map(Vec3i::from).unwrap_or(Vec3i::ZERO);
            let volume = TensorVolume::from_dyn(data, offset)?;

            builder = match layer.role {
                LayerRole::Image => builder.image(&layer.name, volume),
                LayerRole::Label => {
                    let volume = match layer.transform {
                        Some(t) => volume.with_transform(t),
                        None => volume,
                    };
                    builder.label(&layer.name, volume)
                }
                LayerRole::Mask => {
                    let label = layer
                        .mask_of
                        .clone()
                        .ok_or_else(|| ConfigError::MaskWithoutLabel(layer.name.clone()))?;
                    builder.mask(&layer.name, volume, label)
                }
            };
        }

        Ok(builder.build()?)
    }
}
