// --- Файл: src/augment/crop.rs ---

//! Стадия случайного сдвига кадрирования.

use super::stage::{Augment, AugmentError, AugmentResult};
use crate::data::{Sample, SampleSpec};
use ndarray::s;
use rand::rngs::StdRng;
use rand::Rng;

/// Случайный сдвиг кадра выборки (translation jitter).
///
/// В `prepare` стадия добавляет каждому слою запас `jitter` по
/// пространственным осям, а в `apply` выбирает одно общее случайное
/// смещение в `[0, jitter]` по каждой оси и вырезает из каждого патча окно
/// размером `input − jitter` с этим смещением. Общий сдвиг сохраняет
/// взаимное выравнивание слоев, а случайность смещения дает датасету
/// трансляционное разнообразие.
///
/// Гейта у стадии нет: случайность уже заключена в выборе смещения,
/// а запас должен потребляться при каждом вызове.
pub struct Crop {
    jitter: [usize; 3],
}

impl Crop {
    /// Создает стадию с запасом `jitter` по осям (z, y, x).
    pub fn new(jitter: [usize; 3]) -> Self {
        assert!(
            jitter.iter().any(|&j| j > 0),
            "jitter must be non-zero on some axis"
        );
        Self { jitter }
    }
}

impl Augment for Crop {
    fn prepare(&self, spec: &SampleSpec) -> AugmentResult<SampleSpec> {
        let mut spec = spec.clone();
        for (_, fov) in spec.iter_mut() {
            fov.z += self.jitter[0];
            fov.y += self.jitter[1];
            fov.x += self.jitter[2];
        }
        Ok(spec)
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        // Одно смещение на все слои
        let off = [
            rng.random_range(0..=self.jitter[0]),
            rng.random_range(0..=self.jitter[1]),
            rng.random_range(0..=self.jitter[2]),
        ];

        for (name, patch) in sample.iter_mut() {
            let (_, z, y, x) = patch.dim();
            for (axis, (&len, &j)) in [z, y, x].iter().zip(self.jitter.iter()).enumerate() {
                if len <= j {
                    return Err(AugmentError::PatchTooSmall {
                        layer: name.clone(),
                        axis: ['z', 'y', 'x'][axis],
                        len,
                        needed: j + 1,
                    });
                }
            }
            *patch = patch
                .slice(s![
                    ..,
                    off[0]..off[0] + (z - self.jitter[0]),
                    off[1]..off[1] + (y - self.jitter[1]),
                    off[2]..off[2] + (x - self.jitter[2])
                ])
                .to_owned();
        }
        Ok(sample)
    }
}
