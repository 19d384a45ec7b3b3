// --- Файл: src/augment/stitch.rs ---

//! Стадия шва сшивки (артефакт разрывной стыковки полос съемки).

use super::stage::{center_crop, common_axis_len, Augment, AugmentError, AugmentResult};
use crate::data::{Sample, SampleSpec};
use crate::volume::Patch;
use ndarray::{s, Array4, Axis};
use rand::rngs::StdRng;
use rand::Rng;

/// Разрывной шов вдоль оси y на случайной x-позиции.
///
/// Объем разрезается вертикальной плоскостью x = location: столбцы левее
/// шва берут строки y со сдвигом `error`, столбцы правее — без сдвига,
/// после чего обе части смыкаются. Изображение получает резкий разрыв —
/// именно его сеть должна научиться переживать. В слоях из `smooth`
/// (обычно метки) переходная полоса шириной `2 * band` вокруг шва
/// заполняется плавно сдвинутыми столбцами, чтобы истинная структура
/// оставалась связной поперек шва.
///
/// Геометрия меняется у всех слоев одинаково. В `prepare` запрашивается
/// запас `max_error` по оси y, и `apply` всегда потребляет его целиком:
/// выход короче входа ровно на `max_error` строк.
pub struct Stitch {
    skip_ratio: f32,
    max_error: usize,
    band: usize,
    smooth: Vec<String>,
}

impl Stitch {
    /// Создает стадию; `smooth` — слои со сглаживаемым швом.
    pub fn new(smooth: Vec<String>) -> Self {
        Self {
            skip_ratio: 0.7,
            max_error: 20,
            band: 10,
            smooth,
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

    /// Задает максимальную величину сдвига на шве (четная, не меньше 2).
    pub fn max_error(mut self, max_error: usize) -> Self {
        assert!(
            max_error >= 2 && max_error % 2 == 0,
            "max_error must be even and >= 2, got {}",
            max_error
        );
        self.max_error = max_error;
        self
    }

    /// Задает полуширину переходной полосы вокруг шва.
    pub fn band(mut self, band: usize) -> Self {
        assert!(band >= 1, "band must be >= 1, got {}", band);
        self.band = band;
        self
    }
}

impl Augment for Stitch {
    fn prepare(&self, spec: &SampleSpec) -> AugmentResult<SampleSpec> {
        let mut spec = spec.clone();
        for (_, fov) in spec.iter_mut() {
            fov.y += self.max_error;
        }
        Ok(spec)
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        let fire = rng.random::<f32>() >= self.skip_ratio;

        let y = common_axis_len(&sample, 2, 'y')?;
        let x = common_axis_len(&sample, 3, 'x')?;
        if y <= self.max_error {
            let layer = sample.names().next().cloned().unwrap_or_default();
            return Err(AugmentError::PatchTooSmall {
                layer,
                axis: 'y',
                len: y,
                needed: self.max_error + 1,
            });
        }
        if x <= 2 * self.band {
            let layer = sample.names().next().cloned().unwrap_or_default();
            return Err(AugmentError::PatchTooSmall {
                layer,
                axis: 'x',
                len: x,
                needed: 2 * self.band + 1,
            });
        }
        let out_y = y - self.max_error;

        if fire {
            // Четный сдвиг и x-позиция шва, не задевающая переходную полосу
            let error = 2 * rng.random_range(1..=self.max_error / 2);
            let location = rng.random_range(self.band..=x - self.band);
            for (name, patch) in sample.iter_mut() {
                let mut spliced = stitch_splice(patch, error, location);
                if self.smooth.contains(name) {
                    smooth_seam(&mut spliced, patch, error, location, self.band);
                }
                *patch = center_crop(&spliced, [spliced.dim().1, out_y, spliced.dim().3]);
            }
        } else {
            for (_, patch) in sample.iter_mut() {
                *patch = center_crop(patch, [patch.dim().1, out_y, patch.dim().3]);
            }
        }
        Ok(sample)
    }
}

/// Смыкает объем вдоль y со сдвигом `error` по разные стороны от шва.
fn stitch_splice(patch: &Patch, error: usize, location: usize) -> Patch {
    let (c, z, y, x) = patch.dim();
    let out_y = y - error;
    let mut out = Array4::zeros((c, z, out_y, x));
    // Левее шва строки берутся со сдвигом, правее — с начала
    out.slice_mut(s![.., .., .., ..location])
        .assign(&patch.slice(s![.., .., error.., ..location]));
    out.slice_mut(s![.., .., .., location..])
        .assign(&patch.slice(s![.., .., ..out_y, location..]));
    out
}

/// Заполняет переходную полосу вокруг шва плавно сдвинутыми столбцами.
fn smooth_seam(out: &mut Patch, original: &Patch, error: usize, location: usize, band: usize) {
    let (_, _, y, _) = original.dim();
    let out_y = y - error;
    let half = (error / 2) as isize;
    let width = 2 * band;

    let fill = original.slice(s![
        ..,
        ..,
        error / 2..y - error / 2,
        location - band..location + band
    ]);

    for i in 0..width {
        // Линейный профиль сдвига поперек полосы: от -error/2 до +error/2
        let t = i as f32 / (width - 1) as f32;
        let shift = (-(half as f32) + error as f32 * t).round() as isize;

        let src = fill.index_axis(Axis(3), i);
        let mut dst = out.slice_mut(s![.., .., .., location - band + i]);
        // Циклический сдвиг столбца вдоль y
        for j in 0..out_y {
            let from = (j as isize - shift).rem_euclid(out_y as isize) as usize;
            dst.slice_mut(s![.., .., j])
                .assign(&src.slice(s![.., .., from]));
        }
    }
}
