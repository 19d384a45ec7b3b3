// --- Файл: src/augment/occlude.rs ---

//! Стадия частичного заслонения структуры (occlusion).

use super::stage::{Augment, AugmentError, AugmentResult};
use crate::data::Sample;
use rand::rngs::StdRng;
use rand::Rng;

/// Гауссово "пятно" фонового шума поверх случайного вокселя структуры.
///
/// Вокруг случайно выбранного ненулевого вокселя слоя-метки строится
/// гауссова маска с единицей в центре. Целевые слои-изображения в этой
/// области смешиваются с шумом, имеющим среднее и разброс фона
/// (вокселей области, где метка нулевая): чем ближе к центру пятна, тем
/// сильнее воксель замещается шумом. Метка не меняется — сеть учится
/// восстанавливать структуру под артефактом.
///
/// Если в патче метки нет ни одного ненулевого вокселя, заслонять нечего
/// и выборка возвращается без изменений.
pub struct Occlude {
    label: String,
    targets: Vec<String>,
    skip_ratio: f32,
    radius: [usize; 3],
    sigma_range: (f32, f32),
    z_scale: f32,
}

impl Occlude {
    /// Создает стадию: `label` — слой-метка, `targets` — заслоняемые
    /// слои-изображения.
    pub fn new(label: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            label: label.into(),
            targets,
            skip_ratio: 0.85,
            radius: [8, 50, 50],
            sigma_range: (3.0, 20.0),
            z_scale: 6.157,
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

    /// Задает полуразмеры области пятна по осям (z, y, x).
    pub fn radius(mut self, radius: [usize; 3]) -> Self {
        assert!(
            radius.iter().all(|&r| r >= 1),
            "radius must be >= 1, got {:?}",
            radius
        );
        self.radius = radius;
        self
    }

    /// Задает диапазон размеров пятна (sigma по y/x).
    pub fn sigma_range(mut self, lo: f32, hi: f32) -> Self {
        assert!(0.0 < lo && lo < hi, "invalid sigma range [{}, {})", lo, hi);
        self.sigma_range = (lo, hi);
        self
    }
}

impl Augment for Occlude {
    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        let fire = rng.random::<f32>() >= self.skip_ratio;
        if !fire {
            return Ok(sample);
        }

        let label = sample
            .get(&self.label)
            .ok_or_else(|| AugmentError::MissingLayer(self.label.clone()))?;
        let (_, lz, ly, lx) = label.dim();
        let label = label.index_axis(ndarray::Axis(0), 0).to_owned();

        // Случайный воксель структуры
        let foreground = label.iter().filter(|&&v| v > 0.0).count();
        if foreground == 0 {
            return Ok(sample);
        }
        let pick = rng.random_range(0..foreground);
        let mut center = (0usize, 0usize, 0usize);
        let mut seen = 0usize;
        for ((z, y, x), &v) in label.indexed_iter() {
            if v > 0.0 {
                if seen == pick {
                    center = (z, y, x);
                    break;
                }
                seen += 1;
            }
        }

        // Область пятна, обрезанная границами патча
        let z0 = center.0.saturating_sub(self.radius[0]);
        let y0 = center.1.saturating_sub(self.radius[1]);
        let x0 = center.2.saturating_sub(self.radius[2]);
        let z1 = (center.0 + self.radius[0]).min(lz);
        let y1 = (center.1 + self.radius[1]).min(ly);
        let x1 = (center.2 + self.radius[2]).min(lx);
        let (nz, ny, nx) = (z1 - z0, y1 - y0, x1 - x0);

        // Гауссова маска с единицей в центре области
        let u = self.sigma_range.0 + rng.random::<f32>() * (self.sigma_range.1 - self.sigma_range.0);
        let sigma = [u / self.z_scale, u, u];
        let kz = axis_profile(nz, sigma[0]);
        let ky = axis_profile(ny, sigma[1]);
        let kx = axis_profile(nx, sigma[2]);

        for name in &self.targets {
            let patch = sample
                .get_mut(name)
                .ok_or_else(|| AugmentError::MissingLayer(name.clone()))?;
            let (_, pz, py, px) = patch.dim();
            if (pz, py, px) != (lz, ly, lx) {
                return Err(AugmentError::ShapeMismatch {
                    layer: name.clone(),
                    axis: 'z',
                    expected: lz,
                    found: pz,
                });
            }

            // Статистика фона области (метка нулевая)
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            let mut count = 0usize;
            for z in z0..z1 {
                for y in y0..y1 {
                    for x in x0..x1 {
                        if label[[z, y, x]] <= 0.0 {
                            let v = patch[[0, z, y, x]] as f64;
                            sum += v;
                            sum_sq += v * v;
                            count += 1;
                        }
                    }
                }
            }
            let (mean, std) = if count > 0 {
                let mean = sum / count as f64;
                let var = (sum_sq / count as f64 - mean * mean).max(0.0);
                (mean as f32, var.sqrt() as f32)
            } else {
                (0.0, 1.0)
            };

            let channels = patch.dim().0;
            for c in 0..channels {
                for z in z0..z1 {
                    for y in y0..y1 {
                        for x in x0..x1 {
                            let w = kz[z - z0] * ky[y - y0] * kx[x - x0];
                            let noise = mean + std * gaussian_draw(rng);
                            let v = patch[[c, z, y, x]];
                            patch[[c, z, y, x]] = v * (1.0 - w) + w * noise;
                        }
                    }
                }
            }
        }
        Ok(sample)
    }
}

/// Гауссов профиль вдоль оси с единицей в центре области.
fn axis_profile(n: usize, sigma: f32) -> Vec<f32> {
    let center = (n / 2) as f32;
    (0..n)
        .map(|i| {
            let d = i as f32 - center;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect()
}

/// Одно значение стандартного нормального распределения (Box-Muller).
fn gaussian_draw(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.random::<f32>().max(1e-12);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use rand::SeedableRng;

    fn sample_with_blob() -> Sample {
        let mut s = Sample::new();
        // Неоднородный фон, чтобы у шума была ненулевая дисперсия
        s.insert(
            "raw",
            Array4::from_shape_fn((1, 8, 16, 16), |(_, z, y, x)| {
                ((z * 31 + y * 7 + x * 3) % 13) as f32 / 13.0
            }),
        );
        let mut label = Array4::zeros((1, 8, 16, 16));
        label[[0, 4, 8, 8]] = 255.0;
        label[[0, 4, 8, 9]] = 255.0;
        s.insert("soma_label", label);
        s
    }

    #[test]
    fn test_occludes_near_foreground() {
        let stage = Occlude::new("soma_label", vec!["raw".into()])
            .skip_ratio(0.0)
            .radius([2, 4, 4]);
        let input = sample_with_blob();
        let mut rng = StdRng::seed_from_u64(31);
        let out = stage.apply(input.clone(), &mut rng).unwrap();

        // Центр пятна заметно изменился, форма и метка — нет
        assert_eq!(out.shape("raw"), input.shape("raw"));
        assert_eq!(out.get("soma_label"), input.get("soma_label"));
        assert_ne!(out.get("raw"), input.get("raw"));

        // Дальний от пятна угол не тронут
        assert_eq!(
            out.get("raw").unwrap()[[0, 0, 0, 0]],
            input.get("raw").unwrap()[[0, 0, 0, 0]]
        );
    }

    #[test]
    fn test_empty_label_is_noop() {
        let mut s = Sample::new();
        s.insert("raw", Array4::from_elem((1, 8, 16, 16), 0.5));
        s.insert("soma_label", Array4::zeros((1, 8, 16, 16)));

        let stage = Occlude::new("soma_label", vec!["raw".into()]).skip_ratio(0.0);
        let mut rng = StdRng::seed_from_u64(31);
        let out = stage.apply(s.clone(), &mut rng).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn test_never_fires_with_skip_one() {
        let stage = Occlude::new("soma_label", vec!["raw".into()]).skip_ratio(1.0);
        let input = sample_with_blob();
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..100 {
            assert_eq!(stage.apply(input.clone(), &mut rng).unwrap(), input);
        }
    }

    #[test]
    fn test_missing_label_layer() {
        let mut s = Sample::new();
        s.insert("raw", Array4::from_elem((1, 4, 4, 4), 0.5));

        let stage = Occlude::new("ghost", vec!["raw".into()]).skip_ratio(0.0);
        let mut rng = StdRng::seed_from_u64(31);
        assert_eq!(
            stage.apply(s, &mut rng),
            Err(AugmentError::MissingLayer("ghost".into()))
        );
    }
}
