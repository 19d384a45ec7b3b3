// --- Файл: src/main.rs ---

//! Демонстрация полного цикла подготовки обучающих выборок.

use ndarray::Array3;
use rustyvox::augment::{Brightness, Compose, Duplicate, GaussianBlur, Occlude, SliceDrop};
use rustyvox::data::{DataProvider, SampleSpec, VolumeDatasetBuilder};
use rustyvox::geometry::Vec3i;
use rustyvox::volume::{LabelTransform, TensorVolume};

/// Синтетический объем: плавный градиент яркости с шаром-"сомой" в центре.
fn synthetic_pair(dim: (usize, usize, usize)) -> (Array3<f32>, Array3<f32>) {
    let (dz, dy, dx) = dim;
    let center = (dz as f32 / 2.0, dy as f32 / 2.0, dx as f32 / 2.0);
    let radius = dz.min(dy).min(dx) as f32 / 4.0;

    let raw = Array3::from_shape_fn(dim, |(z, y, x)| {
        0.3 + 0.4 * (z + y + x) as f32 / (dz + dy + dx) as f32
    });
    let label = Array3::from_shape_fn(dim, |(z, y, x)| {
        let d = (z as f32 - center.0).powi(2)
            + (y as f32 - center.1).powi(2)
            + (x as f32 - center.2).powi(2);
        if d.sqrt() < radius {
            255.0
        } else {
            0.0
        }
    });
    (raw, label)
}

fn main() {
    env_logger::init();

    println!("--- Демонстрация провайдера объёмных данных RustyVox ---");

    let dim = (32, 192, 192);
    let (raw, label) = synthetic_pair(dim);
    println!("[1] Синтетический объем {:?} построен.", dim);

    let dataset = VolumeDatasetBuilder::new()
        .image("raw", TensorVolume::from_3d(raw, Vec3i::ZERO))
        .label(
            "soma_label",
            TensorVolume::from_3d(label, Vec3i::ZERO).with_transform(LabelTransform::Affinity),
        )
        .build()
        .expect("датасет из корректных объемов");
    println!("[2] Датасет собран: слои raw + soma_label.");

    let pipeline = Compose::new()
        .add(Brightness::new(vec!["raw".into()]).skip_ratio(0.5))
        .add(GaussianBlur::new(vec!["raw".into()]).skip_ratio(0.5))
        .add(Duplicate::new(vec!["raw".into()]).skip_ratio(0.5))
        .add(Occlude::new("soma_label", vec!["raw".into()]).skip_ratio(0.5))
        .add(SliceDrop::new().max_drop(4).skip_ratio(0.5));

    let spec = SampleSpec::new()
        .with("raw", (8, 64, 64))
        .with("soma_label", (8, 64, 64));

    let mut provider = DataProvider::with_seed(dataset, pipeline, spec, 42)
        .expect("согласованная спецификация помещается в объем");
    println!(
        "[3] Провайдер готов: позиций выборки {}.",
        provider.dataset().num_samples()
    );

    println!("\n--- ИЗВЛЕЧЕНИЕ ВЫБОРОК ---\n");
    for i in 0..5 {
        let (sample, transforms) = provider
            .random_sample()
            .expect("выборка внутри допустимого диапазона");
        let raw = sample.get("raw").expect("слой raw");
        let mean = raw.mean().unwrap_or(0.0);
        println!(
            "Выборка {:<2}: raw {:?}, soma_label {:?}, среднее raw {:.4}, transform {:?}",
            i + 1,
            raw.shape(),
            sample.get("soma_label").map(|p| p.shape()).unwrap_or(&[]),
            mean,
            transforms.get("soma_label")
        );
    }

    println!("\n--- ДЕМОНСТРАЦИЯ ЗАВЕРШЕНА ---");
}
