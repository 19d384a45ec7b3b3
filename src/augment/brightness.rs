// --- Файл: src/augment/brightness.rs ---

//! Стадия случайного сдвига яркости.

use super::stage::{Augment, AugmentError, AugmentResult};
use crate::data::Sample;
use rand::rngs::StdRng;
use rand::Rng;

/// Аддитивный сдвиг яркости слоев-изображений.
///
/// При срабатывании гейта ко всем целевым слоям прибавляется один и тот же
/// случайный сдвиг из `[0, max_shift)`. Формы патчей не меняются, запас
/// FOV не требуется.
pub struct Brightness {
    targets: Vec<String>,
    skip_ratio: f32,
    max_shift: f32,
}

impl Brightness {
    /// Создает стадию для перечисленных слоев-изображений.
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            skip_ratio: 0.9,
            max_shift: 0.05,
        }
    }

    /// Задает вероятность пропуска.
    ///
    /// # Panics
    /// Паникует, если `p` не лежит в `[0, 1]`.
    pub fn skip_ratio(mut self, p: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&p),
            "skip_ratio must be in [0, 1], got {}",
            p
        );
        self.skip_ratio = p;
        self
    }

    /// Задает максимальный сдвиг яркости.
    pub fn max_shift(mut self, shift: f32) -> Self {
        assert!(shift > 0.0, "max_shift must be positive, got {}", shift);
        self.max_shift = shift;
        self
    }
}

impl Augment for Brightness {
    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        let fire = rng.random::<f32>() >= self.skip_ratio;
        if !fire {
            return Ok(sample);
        }

        let shift = rng.random::<f32>() * self.max_shift;
        for name in &self.targets {
            let patch = sample
                .get_mut(name)
                .ok_or_else(|| AugmentError::MissingLayer(name.clone()))?;
            patch.mapv_inplace(|v| v + shift);
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampleSpec;
    use ndarray::Array4;
    use rand::SeedableRng;

    fn sample() -> Sample {
        let mut s = Sample::new();
        s.insert("raw", Array4::from_elem((1, 4, 8, 8), 0.5));
        s.insert("soma_label", Array4::from_elem((1, 4, 8, 8), 1.0));
        s
    }

    #[test]
    fn test_never_fires_with_skip_one() {
        let stage = Brightness::new(vec!["raw".into()]).skip_ratio(1.0);
        let input = sample();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let out = stage.apply(input.clone(), &mut rng).unwrap();
            assert_eq!(out, input);
        }
    }

    #[test]
    fn test_shifts_only_targets() {
        let stage = Brightness::new(vec!["raw".into()]).skip_ratio(0.0);
        let input = sample();
        let mut rng = StdRng::seed_from_u64(3);

        let out = stage.apply(input.clone(), &mut rng).unwrap();
        assert!(out.get("raw").unwrap()[[0, 0, 0, 0]] >= 0.5);
        assert_eq!(out.get("soma_label"), input.get("soma_label"));
        assert_eq!(out.shape("raw"), input.shape("raw"));
    }

    #[test]
    fn test_missing_target_is_error() {
        let stage = Brightness::new(vec!["ghost".into()]).skip_ratio(0.0);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            stage.apply(sample(), &mut rng),
            Err(AugmentError::MissingLayer("ghost".into()))
        );
    }

    #[test]
    fn test_prepare_is_identity() {
        let stage = Brightness::new(vec!["raw".into()]);
        let spec = SampleSpec::new().with("raw", (4, 8, 8));
        assert_eq!(stage.prepare(&spec).unwrap(), spec);
    }

    #[test]
    #[should_panic(expected = "skip_ratio must be in [0, 1]")]
    fn test_invalid_skip_ratio() {
        Brightness::new(vec![]).skip_ratio(1.5);
    }
}
