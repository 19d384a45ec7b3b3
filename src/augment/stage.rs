// --- Файл: src/augment/stage.rs ---

//! Контракт стадии аугментации и общие операции над патчами.

use crate::data::{Sample, SampleSpec};
use ndarray::s;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::volume::Patch;

pub type AugmentResult<T> = std::result::Result<T, AugmentError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AugmentError {
    #[error("Слой '{0}' отсутствует в выборке")]
    MissingLayer(String),
    #[error("Патч слоя '{layer}' слишком мал по оси {axis}: {len} < {needed}")]
    PatchTooSmall {
        layer: String,
        axis: char,
        len: usize,
        needed: usize,
    },
    #[error("Слои не согласованы по оси {axis}: у слоя '{layer}' размер {found}, ожидался {expected}")]
    ShapeMismatch {
        layer: String,
        axis: char,
        expected: usize,
        found: usize,
    },
}

/// Стадия конвейера аугментации.
///
/// Контракт двухфазный:
/// 1. `prepare` — согласование спецификации до выборки. Стадия может только
///    увеличить FOV слоя (запросить запас под свое будущее преобразование),
///    но никогда не уменьшает требования вызывающего кода. Стадии без
///    запаса возвращают вход без изменений.
/// 2. `apply` — применение после выборки. Один свежий розыгрыш гейта на
///    вызов решает, выполнять ли преобразование. Запрошенный в `prepare`
///    запас потребляется всегда, независимо от гейта, поэтому формы
///    выходных патчей от гейта не зависят.
///
/// Стадия не хранит изменяемого состояния между вызовами и не зависит от
/// других стадий, кроме явного порядка, который задает конвейер. Стадия,
/// обнаружившая несовместимость данных со своей конфигурацией, обязана
/// вернуть ошибку: молчаливая подмена преобразования тождественным
/// незаметно искажает обучающие данные.
pub trait Augment: Send + Sync {
    /// Фаза согласования: чистая функция над спецификацией.
    fn prepare(&self, spec: &SampleSpec) -> AugmentResult<SampleSpec> {
        Ok(spec.clone())
    }

    /// Фаза применения: стохастическое преобразование выборки.
    fn apply(&self, sample: Sample, rng: &mut StdRng) -> AugmentResult<Sample>;
}

/// Центральная вырезка патча до заданной пространственной формы.
///
/// Канальная ось не затрагивается. Вызывающий код обязан гарантировать,
/// что целевая форма не больше исходной.
pub(crate) fn center_crop(patch: &Patch, target: [usize; 3]) -> Patch {
    let (_, z, y, x) = patch.dim();
    debug_assert!(target[0] <= z && target[1] <= y && target[2] <= x);
    let dz = (z - target[0]) / 2;
    let dy = (y - target[1]) / 2;
    let dx = (x - target[2]) / 2;
    patch
        .slice(s![
            ..,
            dz..dz + target[0],
            dy..dy + target[1],
            dx..dx + target[2]
        ])
        .to_owned()
}

/// Общий размер пространственной оси по всем слоям выборки.
///
/// Геометрические стадии режут все слои одинаково, поэтому требуют,
/// чтобы затрагиваемая ось имела один размер у каждого патча.
pub(crate) fn common_axis_len(sample: &Sample, axis: usize, name: char) -> AugmentResult<usize> {
    let mut common: Option<usize> = None;
    for (layer, patch) in sample.iter() {
        let len = patch.shape()[axis];
        match common {
            None => common = Some(len),
            Some(expected) if expected != len => {
                return Err(AugmentError::ShapeMismatch {
                    layer: layer.clone(),
                    axis: name,
                    expected,
                    found: len,
                })
            }
            Some(_) => {}
        }
    }
    // Пустая выборка не дает осмысленного размера; вернем ноль.
    Ok(common.unwrap_or(0))
}
