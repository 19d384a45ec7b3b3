// --- Файл: src/augment/drop.rs ---

//! Стадия выпадения срезов (артефакт пропущенных сечений).

use super::stage::{center_crop, common_axis_len, Augment, AugmentError, AugmentResult};
use crate::data::{Sample, SampleSpec};
use crate::volume::Patch;
use ndarray::{concatenate, s, Axis};
use rand::rngs::StdRng;
use rand::Rng;

/// Удаление блока соседних z-срезов из всех слоев выборки.
///
/// Моделирует пропущенные при съемке сечения: из объема вырезается блок
/// из четного числа срезов вокруг случайной позиции, а оставшиеся части
/// смыкаются. Геометрия меняется у всех слоев одинаково, чтобы сохранить
/// взаимное выравнивание изображений и меток.
///
/// В `prepare` стадия запрашивает запас `max_drop` по оси z и в `apply`
/// всегда потребляет его целиком: если гейт не сработал или выпало меньше
/// `max_drop` срезов, остаток запаса срезается центральной вырезкой.
/// Поэтому выход всегда на `max_drop` срезов короче входа.
pub struct SliceDrop {
    skip_ratio: f32,
    max_drop: usize,
}

impl SliceDrop {
    /// Создает стадию с параметрами по умолчанию.
    pub fn new() -> Self {
        Self {
            skip_ratio: 0.3,
            max_drop: 8,
        }
    }

    /// Задает вероятность пропуска.
    pub fn skip_ratio(mut self, p: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&p),
            "skip_ratio must be in [0, 1], got {}",
            p
        );
        self.skip_ratio = p;
        self
    }

    /// Задает максимальное число удаляемых срезов (четное, не меньше 2).
    pub fn max_drop(mut self, max_drop: usize) -> Self {
        assert!(
            max_drop >= 2 && max_drop % 2 == 0,
            "max_drop must be even and >= 2, got {}",
            max_drop
        );
        self.max_drop = max_drop;
        self
    }
}

impl Default for SliceDrop {
    fn default() -> Self {
        Self::new()
    }
}

impl Augment for SliceDrop {
    fn prepare(&self, spec: &SampleSpec) -> AugmentResult<SampleSpec> {
        let mut spec = spec.clone();
        for (_, fov) in spec.iter_mut() {
            fov.z += self.max_drop;
        }
        Ok(spec)
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        let fire = rng.random::<f32>() >= self.skip_ratio;

        let z = common_axis_len(&sample, 1, 'z')?;
        if z <= self.max_drop {
            let layer = sample.names().next().cloned().unwrap_or_default();
            return Err(AugmentError::PatchTooSmall {
                layer,
                axis: 'z',
                len: z,
                needed: self.max_drop + 1,
            });
        }
        let out_z = z - self.max_drop;

        if fire {
            // Четное число срезов и позиция, не задевающая границы
            let dropped = 2 * rng.random_range(1..=self.max_drop / 2);
            let location = rng.random_range(dropped / 2..=z - dropped / 2);
            for (_, patch) in sample.iter_mut() {
                let spliced = drop_slices(patch, location, dropped);
                *patch = center_crop(&spliced, [out_z, spliced.dim().2, spliced.dim().3]);
            }
        } else {
            for (_, patch) in sample.iter_mut() {
                *patch = center_crop(patch, [out_z, patch.dim().2, patch.dim().3]);
            }
        }
        Ok(sample)
    }
}

/// Удаляет `dropped` срезов вокруг `location` и смыкает оставшиеся части.
fn drop_slices(patch: &Patch, location: usize, dropped: usize) -> Patch {
    let head = patch.slice(s![.., ..location - dropped / 2, .., ..]);
    let tail = patch.slice(s![.., location + dropped / 2.., .., ..]);
    // Формы частей совместимы по построению
    concatenate(Axis(1), &[head, tail]).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use rand::SeedableRng;

    fn sample(z: usize) -> Sample {
        let mut s = Sample::new();
        s.insert(
            "raw",
            Array4::from_shape_fn((1, z, 4, 4), |(_, a, _, _)| a as f32),
        );
        s.insert(
            "soma_label",
            Array4::from_shape_fn((1, z, 4, 4), |(_, a, _, _)| a as f32),
        );
        s
    }

    #[test]
    fn test_prepare_adds_z_margin() {
        let stage = SliceDrop::new().max_drop(6);
        let spec = SampleSpec::new().with("raw", (10, 32, 32));
        let out = stage.prepare(&spec).unwrap();
        assert_eq!(out.get("raw").unwrap().spatial(), [16, 32, 32]);
    }

    #[test]
    fn test_output_consumes_margin_regardless_of_gate() {
        for skip in [0.0, 1.0] {
            let stage = SliceDrop::new().max_drop(6).skip_ratio(skip);
            let mut rng = StdRng::seed_from_u64(21);
            let out = stage.apply(sample(16), &mut rng).unwrap();
            assert_eq!(out.shape("raw"), Some([1, 10, 4, 4]));
            assert_eq!(out.shape("soma_label"), Some([1, 10, 4, 4]));
        }
    }

    #[test]
    fn test_layers_stay_aligned() {
        let stage = SliceDrop::new().max_drop(6).skip_ratio(0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let out = stage.apply(sample(16), &mut rng).unwrap();
        // Оба слоя режутся одинаково
        assert_eq!(out.get("raw"), out.get("soma_label"));
    }

    #[test]
    fn test_drop_removes_contiguous_block() {
        let patch = Array4::from_shape_fn((1, 10, 1, 1), |(_, z, _, _)| z as f32);
        let out = drop_slices(&patch, 5, 4);
        assert_eq!(out.shape(), &[1, 6, 1, 1]);
        let values: Vec<f32> = out.iter().copied().collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_patch_too_small() {
        let stage = SliceDrop::new().max_drop(8);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            stage.apply(sample(8), &mut rng),
            Err(AugmentError::PatchTooSmall { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "max_drop must be even")]
    fn test_odd_max_drop_rejected() {
        SliceDrop::new().max_drop(5);
    }
}
