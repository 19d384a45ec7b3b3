// --- Файл: src/data/feeder.rs ---

//! Провайдер данных: датасет + конвейер аугментации + генератор случайности.

use super::dataset::{DatasetError, VolumeDataset};
use super::sample::{Sample, TransformMap};
use super::spec::SampleSpec;
use crate::augment::{Augment, AugmentError, Compose};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Augment(#[from] AugmentError),
}

/// Провайдер обучающих выборок.
///
/// Связывает три части в единый порядок работы:
/// 1. при создании конвейер согласует базовую спецификацию
///    (стадии добавляют запасы FOV) и результат устанавливается в датасет;
/// 2. `random_sample` извлекает выборку в случайной позиции;
/// 3. конвейер применяет стадии к извлеченной выборке, потребляя запасы,
///    так что итоговые патчи имеют формы базовой спецификации.
///
/// Генератор случайности передается явно при создании, поэтому выборка
/// полностью воспроизводима при фиксированном seed.
pub struct DataProvider {
    dataset: VolumeDataset,
    pipeline: Compose,
    base_spec: SampleSpec,
    rng: StdRng,
}

impl std::fmt::Debug for DataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProvider")
            .field("dataset", &self.dataset)
            .field("pipeline", &self.pipeline)
            .field("base_spec", &self.base_spec)
            .field("rng", &self.rng)
            .finish()
    }
}

impl DataProvider {
    /// Создает провайдер с seed от операционной системы.
    pub fn new(
        dataset: VolumeDataset,
        pipeline: Compose,
        base_spec: SampleSpec,
    ) -> ProviderResult<Self> {
        Self::with_rng(dataset, pipeline, base_spec, StdRng::from_os_rng())
    }

    /// Создает провайдер с фиксированным seed.
    pub fn with_seed(
        dataset: VolumeDataset,
        pipeline: Compose,
        base_spec: SampleSpec,
        seed: u64,
    ) -> ProviderResult<Self> {
        Self::with_rng(dataset, pipeline, base_spec, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        mut dataset: VolumeDataset,
        pipeline: Compose,
        base_spec: SampleSpec,
        rng: StdRng,
    ) -> ProviderResult<Self> {
        let inflated = pipeline.prepare(&base_spec)?;
        dataset.set_spec(inflated)?;
        debug!(
            "провайдер готов: слоев {}, позиций выборки {}",
            base_spec.len(),
            dataset.num_samples()
        );
        Ok(Self {
            dataset,
            pipeline,
            base_spec,
            rng,
        })
    }

    /// Базовая (несогласованная) спецификация.
    pub fn base_spec(&self) -> &SampleSpec {
        &self.base_spec
    }

    /// Датасет провайдера.
    pub fn dataset(&self) -> &VolumeDataset {
        &self.dataset
    }

    /// Извлекает случайную выборку и прогоняет ее через конвейер.
    ///
    /// Основной вызов обучающего цикла. Возвращает выборку с патчами
    /// размеров базовой спецификации и политики преобразования меток.
    pub fn random_sample(&mut self) -> ProviderResult<(Sample, TransformMap)> {
        let (sample, transform) = self.dataset.random_sample(&mut self.rng, None)?;
        let sample = self.pipeline.apply(sample, &mut self.rng)?;
        Ok((sample, transform))
    }

    /// Следующая выборка. Пока эквивалентна [`DataProvider::random_sample`].
    pub fn next_sample(&mut self) -> ProviderResult<(Sample, TransformMap)> {
        self.random_sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{Brightness, SliceDrop};
    use crate::data::dataset::VolumeDatasetBuilder;
    use crate::geometry::Vec3i;
    use crate::volume::TensorVolume;
    use ndarray::Array3;

    fn dataset(dim: (usize, usize, usize)) -> VolumeDataset {
        VolumeDatasetBuilder::new()
            .image(
                "raw",
                TensorVolume::from_3d(Array3::<f32>::zeros(dim), Vec3i::ZERO),
            )
            .label(
                "soma_label",
                TensorVolume::from_3d(Array3::<f32>::zeros(dim), Vec3i::ZERO),
            )
            .build()
            .unwrap()
    }

    fn base_spec() -> SampleSpec {
        SampleSpec::new()
            .with("raw", (10, 32, 32))
            .with("soma_label", (10, 32, 32))
    }

    #[test]
    fn test_provider_returns_base_spec_shapes() {
        let pipeline = Compose::new()
            .add(Brightness::new(vec!["raw".into()]))
            .add(SliceDrop::new().max_drop(4));

        let mut provider =
            DataProvider::with_seed(dataset((30, 64, 64)), pipeline, base_spec(), 42).unwrap();

        // Датасет работает с раздутой спецификацией
        assert_eq!(
            provider.dataset().spec().get("raw").unwrap().z,
            10 + 4
        );

        for _ in 0..20 {
            let (sample, _) = provider.random_sample().unwrap();
            assert_eq!(sample.shape("raw"), Some([1, 10, 32, 32]));
            assert_eq!(sample.shape("soma_label"), Some([1, 10, 32, 32]));
        }
    }

    #[test]
    fn test_provider_empty_pipeline() {
        let mut provider =
            DataProvider::with_seed(dataset((30, 64, 64)), Compose::new(), base_spec(), 1)
                .unwrap();
        let (sample, transform) = provider.random_sample().unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(transform.len(), 1);
    }

    #[test]
    fn test_provider_inflated_spec_too_large() {
        // Запас стадии делает FOV больше данных: ошибка при создании
        let pipeline = Compose::new().add(SliceDrop::new().max_drop(30));
        let err = DataProvider::with_seed(dataset((30, 64, 64)), pipeline, base_spec(), 1)
            .unwrap_err();
        assert_eq!(err, ProviderError::Dataset(DatasetError::EmptyRange));
    }

    #[test]
    fn test_provider_reproducible_with_seed() {
        let make = || {
            DataProvider::with_seed(
                dataset((30, 64, 64)),
                Compose::new().add(Brightness::new(vec!["raw".into()])),
                base_spec(),
                7,
            )
            .unwrap()
        };
        let mut a = make();
        let mut b = make();
        for _ in 0..5 {
            let (sa, _) = a.random_sample().unwrap();
            let (sb, _) = b.random_sample().unwrap();
            assert_eq!(sa, sb);
        }
    }
}
