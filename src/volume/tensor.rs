// --- Файл: src/volume/tensor.rs ---

//! Источник объёмных данных, хранящий массив в памяти.

use super::{Fov, LabelTransform, Patch, VolumeError, VolumeResult, VolumeSource};
use crate::geometry::{Box3, Vec3i};
use ndarray::{s, Array3, Array4, ArrayD, Axis, Ix4};
use std::sync::Arc;

/// Источник, хранящий 4D массив `[c, z, y, x]` целиком в памяти.
///
/// Координата `offset` привязывает нулевой воксель массива к глобальной
/// системе координат, общей для всех слоев датасета. Патчи извлекаются
/// по центру в глобальных координатах и всегда копируются.
#[derive(Debug, Clone)]
pub struct TensorVolume {
    data: Arc<Array4<f32>>,
    offset: Vec3i,
    fov: Fov,
    transform: LabelTransform,
}

impl TensorVolume {
    /// Создает источник из 4D массива `[c, z, y, x]`.
    ///
    /// Начальный FOV равен полному пространственному размеру данных.
    pub fn new(data: Array4<f32>, offset: Vec3i) -> Self {
        let (c, z, y, x) = data.dim();
        Self {
            data: Arc::new(data),
            offset,
            fov: Fov::with_channels(c, z, y, x),
            transform: LabelTransform::None,
        }
    }

    /// Создает источник из 3D массива, добавляя канальную ось.
    pub fn from_3d(data: Array3<f32>, offset: Vec3i) -> Self {
        Self::new(data.insert_axis(Axis(0)), offset)
    }

    /// Создает источник из массива произвольной размерности (3D или 4D).
    pub fn from_dyn(data: ArrayD<f32>, offset: Vec3i) -> VolumeResult<Self> {
        let data = match data.ndim() {
            3 => data.insert_axis(Axis(0)),
            4 => data,
            n => return Err(VolumeError::BadDimensionality(n)),
        };
        // После проверки выше преобразование не может не удаться.
        let data = data.into_dimensionality::<Ix4>().unwrap();
        Ok(Self::new(data, offset))
    }

    /// Задает политику преобразования метки.
    pub fn with_transform(mut self, transform: LabelTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Полная форма данных `[c, z, y, x]`.
    pub fn shape(&self) -> [usize; 4] {
        let (c, z, y, x) = self.data.dim();
        [c, z, y, x]
    }

    /// Глобальная координата нулевого вокселя.
    pub fn offset(&self) -> Vec3i {
        self.offset
    }

    fn spatial_dims(&self) -> Vec3i {
        let (_, z, y, x) = self.data.dim();
        Vec3i::new(z as i64, y as i64, x as i64)
    }
}

impl VolumeSource for TensorVolume {
    fn set_fov(&mut self, fov: Fov) -> VolumeResult<()> {
        if fov.c == 0 || fov.z == 0 || fov.y == 0 || fov.x == 0 {
            return Err(VolumeError::ZeroFov(fov));
        }
        let channels = self.data.dim().0;
        if fov.c != channels {
            return Err(VolumeError::ChannelMismatch { fov, channels });
        }
        self.fov = fov;
        Ok(())
    }

    fn fov(&self) -> Fov {
        self.fov
    }

    fn range(&self) -> Box3 {
        // Число допустимых центров по оси: dim - fov + 1 (может быть <= 0).
        let dims = self.spatial_dims();
        let f = self.fov.spatial_vec();
        let min = self.offset + self.fov.top_margin();
        let size = dims - f + Vec3i::new(1, 1, 1);
        Box3::from_min_size(min, size)
    }

    fn get_patch(&self, pos: Vec3i) -> VolumeResult<Patch> {
        let start = pos - self.offset - self.fov.top_margin();
        let f = self.fov.spatial_vec();
        let dims = self.spatial_dims();

        let inside = start.z >= 0
            && start.y >= 0
            && start.x >= 0
            && start.z + f.z <= dims.z
            && start.y + f.y <= dims.y
            && start.x + f.x <= dims.x;
        if !inside {
            return Err(VolumeError::PatchOutOfBounds(pos));
        }

        let (z0, y0, x0) = (start.z as usize, start.y as usize, start.x as usize);
        let patch = self
            .data
            .slice(s![
                ..,
                z0..z0 + self.fov.z,
                y0..y0 + self.fov.y,
                x0..x0 + self.fov.x
            ])
            .to_owned();
        Ok(patch)
    }

    fn label_transform(&self) -> LabelTransform {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn sequential_volume(z: usize, y: usize, x: usize) -> TensorVolume {
        let data = Array3::from_shape_vec(
            (z, y, x),
            (0..z * y * x).map(|v| v as f32).collect(),
        )
        .unwrap();
        TensorVolume::from_3d(data, Vec3i::ZERO)
    }

    #[test]
    fn test_range_matches_fov() {
        let mut vol = sequential_volume(50, 64, 64);
        vol.set_fov(Fov::new(10, 32, 32)).unwrap();

        let r = vol.range();
        assert_eq!(r.min(), Vec3i::new(5, 16, 16));
        assert_eq!(r.size(), Vec3i::new(41, 33, 33));
    }

    #[test]
    fn test_range_empty_when_fov_exceeds_data() {
        let mut vol = sequential_volume(8, 8, 8);
        vol.set_fov(Fov::new(10, 8, 8)).unwrap();
        assert!(vol.range().is_empty());
    }

    #[test]
    fn test_get_patch_is_centered() {
        let mut vol = sequential_volume(10, 10, 10);
        vol.set_fov(Fov::new(3, 3, 3)).unwrap();

        let patch = vol.get_patch(Vec3i::new(5, 5, 5)).unwrap();
        assert_eq!(patch.shape(), &[1, 3, 3, 3]);
        // Центральный воксель патча совпадает с вокселем (5, 5, 5)
        assert_eq!(patch[[0, 1, 1, 1]], (5 * 100 + 5 * 10 + 5) as f32);
    }

    #[test]
    fn test_get_patch_respects_offset() {
        let data = Array3::<f32>::zeros((10, 10, 10));
        let mut vol = TensorVolume::from_3d(data, Vec3i::new(100, 200, 300));
        vol.set_fov(Fov::new(3, 3, 3)).unwrap();

        let r = vol.range();
        assert_eq!(r.min(), Vec3i::new(101, 201, 301));
        assert!(vol.get_patch(Vec3i::new(105, 205, 305)).is_ok());
        assert_eq!(
            vol.get_patch(Vec3i::new(5, 5, 5)),
            Err(VolumeError::PatchOutOfBounds(Vec3i::new(5, 5, 5)))
        );
    }

    #[test]
    fn test_get_patch_out_of_bounds() {
        let mut vol = sequential_volume(10, 10, 10);
        vol.set_fov(Fov::new(3, 3, 3)).unwrap();

        assert!(vol.get_patch(Vec3i::new(0, 5, 5)).is_err());
        assert!(vol.get_patch(Vec3i::new(9, 5, 5)).is_err());
        assert!(vol.get_patch(Vec3i::new(8, 8, 8)).is_ok());
    }

    #[test]
    fn test_patch_is_deep_copy() {
        let mut vol = sequential_volume(6, 6, 6);
        vol.set_fov(Fov::new(3, 3, 3)).unwrap();

        let mut patch = vol.get_patch(Vec3i::new(3, 3, 3)).unwrap();
        let before = vol.get_patch(Vec3i::new(3, 3, 3)).unwrap();
        patch.fill(-1.0);
        let after = vol.get_patch(Vec3i::new(3, 3, 3)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_channel_mismatch() {
        let mut vol = sequential_volume(10, 10, 10);
        let err = vol.set_fov(Fov::with_channels(2, 3, 3, 3)).unwrap_err();
        assert!(matches!(err, VolumeError::ChannelMismatch { .. }));
    }
}
