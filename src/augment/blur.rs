// --- Файл: src/augment/blur.rs ---

//! Стадия гауссова размытия.

use super::stage::{Augment, AugmentError, AugmentResult};
use crate::data::Sample;
use crate::volume::Patch;
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::Rng;

/// Сепарабельное 3D гауссово размытие слоев-изображений.
///
/// При срабатывании гейта sigma по каждой пространственной оси
/// разыгрывается равномерно в `[0, sigma_max)`, после чего патч
/// сворачивается с одномерным гауссовым ядром вдоль каждой оси по очереди.
/// Границы обрабатываются отражением, поэтому форма патча сохраняется и
/// запас FOV не нужен.
pub struct GaussianBlur {
    targets: Vec<String>,
    skip_ratio: f32,
    sigma_max: [f32; 3],
}

impl GaussianBlur {
    /// Создает стадию для перечисленных слоев-изображений.
    ///
    /// По умолчанию sigma по z меньше, чем по y и x: разрешение вдоль оси
    /// срезов обычно грубее, и сильное размытие по ней нереалистично.
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            skip_ratio: 0.3,
            sigma_max: [0.1666, 1.0, 1.0],
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

    /// Задает максимальные sigma по осям (z, y, x).
    pub fn sigma_max(mut self, sigma: [f32; 3]) -> Self {
        assert!(
            sigma.iter().all(|&s| s > 0.0),
            "sigma_max must be positive, got {:?}",
            sigma
        );
        self.sigma_max = sigma;
        self
    }
}

impl Augment for GaussianBlur {
    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        let fire = rng.random::<f32>() >= self.skip_ratio;
        if !fire {
            return Ok(sample);
        }

        let sigma = [
            rng.random::<f32>() * self.sigma_max[0],
            rng.random::<f32>() * self.sigma_max[1],
            rng.random::<f32>() * self.sigma_max[2],
        ];

        for name in &self.targets {
            let patch = sample
                .get_mut(name)
                .ok_or_else(|| AugmentError::MissingLayer(name.clone()))?;
            for (axis, &s) in sigma.iter().enumerate() {
                let kernel = gaussian_kernel(s);
                if kernel.len() > 1 {
                    // Пространственные оси патча: 1, 2, 3
                    blur_axis(patch, Axis(axis + 1), &kernel);
                }
            }
        }
        Ok(sample)
    }
}

/// Нормированное одномерное гауссово ядро с радиусом 3*sigma.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma < 1e-3 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as i64;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| {
            let d = i as f32;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Свертка вдоль одной оси с отражением на границах.
fn blur_axis(patch: &mut Patch, axis: Axis, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as i64;
    let mut buf: Vec<f32> = Vec::new();
    for mut lane in patch.lanes_mut(axis) {
        let n = lane.len() as i64;
        buf.clear();
        buf.extend(lane.iter().copied());
        for i in 0..n {
            let mut acc = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let mut j = i + k as i64 - radius;
                // Отражение индекса на границах
                if j < 0 {
                    j = -j - 1;
                }
                if j >= n {
                    j = 2 * n - j - 1;
                }
                acc += w * buf[j as usize];
            }
            lane[i as usize] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use rand::SeedableRng;

    #[test]
    fn test_kernel_normalized() {
        let k = gaussian_kernel(1.0);
        assert_eq!(k.len(), 7);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_blur_preserves_constant_field() {
        let mut sample = Sample::new();
        sample.insert("raw", Array4::from_elem((1, 4, 8, 8), 0.25));

        let stage = GaussianBlur::new(vec!["raw".into()]).skip_ratio(0.0);
        let mut rng = StdRng::seed_from_u64(11);
        let out = stage.apply(sample, &mut rng).unwrap();

        for &v in out.get("raw").unwrap().iter() {
            assert!((v - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_blur_preserves_shape() {
        let mut sample = Sample::new();
        sample.insert(
            "raw",
            Array4::from_shape_fn((1, 4, 9, 9), |(_, z, y, x)| ((z + y + x) % 2) as f32),
        );

        let stage = GaussianBlur::new(vec!["raw".into()])
            .skip_ratio(0.0)
            .sigma_max([1.0, 2.0, 2.0]);
        let mut rng = StdRng::seed_from_u64(11);
        let out = stage.apply(sample, &mut rng).unwrap();
        assert_eq!(out.shape("raw"), Some([1, 4, 9, 9]));
    }

    #[test]
    fn test_never_fires_with_skip_one() {
        let mut sample = Sample::new();
        sample.insert(
            "raw",
            Array4::from_shape_fn((1, 4, 8, 8), |(_, z, y, x)| (z * 64 + y * 8 + x) as f32),
        );

        let stage = GaussianBlur::new(vec!["raw".into()]).skip_ratio(1.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let out = stage.apply(sample.clone(), &mut rng).unwrap();
            assert_eq!(out, sample);
        }
    }
}
