// --- Файл: src/augment/compose.rs ---

//! Композиция стадий аугментации в упорядоченный конвейер.

use super::stage::{Augment, AugmentResult};
use crate::data::{Sample, SampleSpec};
use rand::rngs::StdRng;

/// Упорядоченная последовательность стадий аугментации.
///
/// Обе фазы сворачиваются в одном и том же порядке: выход `prepare`
/// каждой стадии подается на вход следующей, так что поздние стадии видят
/// спецификацию с уже учтенными запасами ранних, а датасету достается
/// объединение всех запасов. `apply` идет в том же порядке, и каждая
/// стадия потребляет собственный запас.
pub struct Compose {
    stages: Vec<Box<dyn Augment>>,
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compose")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl Compose {
    /// Создает пустой конвейер.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Создает конвейер из списка стадий.
    pub fn from_stages(stages: Vec<Box<dyn Augment>>) -> Self {
        Self { stages }
    }

    /// Добавляет стадию в конец конвейера.
    pub fn add<T: Augment + 'static>(mut self, stage: T) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Количество стадий.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Проверяет, пуст ли конвейер.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for Compose {
    fn default() -> Self {
        Self::new()
    }
}

impl Augment for Compose {
    fn prepare(&self, spec: &SampleSpec) -> AugmentResult<SampleSpec> {
        let mut spec = spec.clone();
        for stage in &self.stages {
            spec = stage.prepare(&spec)?;
        }
        Ok(spec)
    }

    fn apply(&self, mut sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample> {
        for stage in &self.stages {
            sample = stage.apply(sample, rng)?;
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{Crop, SliceDrop};
    use ndarray::Array4;
    use rand::SeedableRng;

    fn sample(z: usize, y: usize, x: usize) -> Sample {
        let mut s = Sample::new();
        s.insert("raw", Array4::from_shape_fn((1, z, y, x), |(_, a, b, c)| {
            (a * 10000 + b * 100 + c) as f32
        }));
        s
    }

    #[test]
    fn test_prepare_accumulates_margins() {
        let pipeline = Compose::new()
            .add(Crop::new([2, 4, 4]))
            .add(SliceDrop::new().max_drop(6));

        let base = SampleSpec::new().with("raw", (10, 32, 32));
        let inflated = pipeline.prepare(&base).unwrap();

        let fov = inflated.get("raw").unwrap();
        assert_eq!(fov.spatial(), [10 + 2 + 6, 32 + 4, 32 + 4]);
    }

    #[test]
    fn test_prepare_matches_manual_fold() {
        let a = Crop::new([2, 4, 4]);
        let b = SliceDrop::new().max_drop(6);
        let pipeline = Compose::new().add(Crop::new([2, 4, 4])).add(SliceDrop::new().max_drop(6));

        let base = SampleSpec::new().with("raw", (10, 32, 32));
        let manual = b.prepare(&a.prepare(&base).unwrap()).unwrap();
        assert_eq!(pipeline.prepare(&base).unwrap(), manual);
    }

    #[test]
    fn test_apply_matches_manual_fold() {
        let pipeline = Compose::new()
            .add(Crop::new([2, 4, 4]))
            .add(SliceDrop::new().max_drop(6));
        let a = Crop::new([2, 4, 4]);
        let b = SliceDrop::new().max_drop(6);

        let input = sample(18, 36, 36);

        let mut rng_pipeline = StdRng::seed_from_u64(99);
        let mut rng_manual = StdRng::seed_from_u64(99);

        let through_pipeline = pipeline.apply(input.clone(), &mut rng_pipeline).unwrap();
        let through_manual = b
            .apply(a.apply(input, &mut rng_manual).unwrap(), &mut rng_manual)
            .unwrap();

        assert_eq!(through_pipeline, through_manual);
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Compose::new();
        let base = SampleSpec::new().with("raw", (10, 32, 32));
        assert_eq!(pipeline.prepare(&base).unwrap(), base);

        let input = sample(10, 32, 32);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pipeline.apply(input.clone(), &mut rng).unwrap(), input);
    }
}
