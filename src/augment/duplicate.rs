// --- Файл: src/augment/duplicate.rs ---

//! Стадия дублирования срезов (артефакт повторной съемки).

use super::stage::{Augment, AugmentError, AugmentResult};
use crate::data::Sample;
use rand::rngs::StdRng;
use rand::Rng;

/// Замена блока z-срезов копиями одного среза в слоях-изображениях.
///
/// Моделирует повторно отснятые сечения: несколько подряд идущих срезов
/// изображения заменяются копией первого из них. Метки не трогаются —
/// истинная структура ткани при таком артефакте не меняется. Форма патча
/// сохраняется, запас FOV не нужен.
pub struct Duplicate {
    targets: Vec<String>,
    skip_ratio: f32,
    max_slices: usize,
}

impl Duplicate {
    /// Создает стадию для перечисленных слоев-изображений.
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            skip_ratio: 0.8,
            max_slices: 4,
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

    /// Задает максимальную длину дублируемого блока.
    pub fn max_slices(mut self, n: usize) -> Self {
        assert!(n >= 1, "max_slices must be >= 1, got {}", n);
        self.max_slices = n;
        self
    }
}

impl Augment for Duplicate {
    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        let fire = rng.random::<f32>() >= self.skip_ratio;
        if !fire {
            return Ok(sample);
        }

        // Общий размер z целевых слоев
        let mut z: Option<usize> = None;
        for name in &self.targets {
            let patch = sample
                .get(name)
                .ok_or_else(|| AugmentError::MissingLayer(name.clone()))?;
            let len = patch.dim().1;
            match z {
                None => z = Some(len),
                Some(expected) if expected != len => {
                    return Err(AugmentError::ShapeMismatch {
                        layer: name.clone(),
                        axis: 'z',
                        expected,
                        found: len,
                    })
                }
                Some(_) => {}
            }
        }
        let z = match z {
            Some(z) => z,
            None => return Ok(sample),
        };
        if z <= self.max_slices {
            return Err(AugmentError::PatchTooSmall {
                layer: self.targets[0].clone(),
                axis: 'z',
                len: z,
                needed: self.max_slices + 1,
            });
        }

        let slices = rng.random_range(1..=self.max_slices);
        let location = rng.random_range(0..z - slices);

        for name in &self.targets {
            let patch = sample
                .get_mut(name)
                .ok_or_else(|| AugmentError::MissingLayer(name.clone()))?;
            let template = patch.index_axis(ndarray::Axis(1), location).to_owned();
            for k in 1..=slices {
                patch
                    .index_axis_mut(ndarray::Axis(1), location + k)
                    .assign(&template);
            }
        }
        Ok(sample)
    }
}
