// --- Файл: src/geometry/box3.rs ---

//! Осеориентированный параллелепипед в целочисленных координатах.

use super::vec3::Vec3i;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Полуоткрытый параллелепипед `[min, max)`.
///
/// Может быть пустым: если по какой-либо оси `max <= min`, параллелепипед
/// не содержит ни одной точки. Пересечение двух непересекающихся
/// параллелепипедов дает именно такой пустой результат, поэтому перед
/// использованием диапазона его нужно проверять через [`Box3::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Box3 {
    min: Vec3i,
    max: Vec3i,
}

impl Box3 {
    /// Создает параллелепипед по углам `[min, max)`.
    pub fn new(min: Vec3i, max: Vec3i) -> Self {
        Self { min, max }
    }

    /// Создает параллелепипед по минимальному углу и размеру.
    pub fn from_min_size(min: Vec3i, size: Vec3i) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Минимальный угол.
    pub fn min(&self) -> Vec3i {
        self.min
    }

    /// Максимальный угол (не включается).
    pub fn max(&self) -> Vec3i {
        self.max
    }

    /// Размер по каждой оси. Для пустого параллелепипеда компоненты равны нулю.
    pub fn size(&self) -> Vec3i {
        Vec3i::new(
            (self.max.z - self.min.z).max(0),
            (self.max.y - self.min.y).max(0),
            (self.max.x - self.min.x).max(0),
        )
    }

    /// Количество целочисленных точек внутри.
    pub fn num_points(&self) -> i64 {
        let s = self.size();
        s.z * s.y * s.x
    }

    /// Проверяет, пуст ли параллелепипед.
    pub fn is_empty(&self) -> bool {
        self.max.z <= self.min.z || self.max.y <= self.min.y || self.max.x <= self.min.x
    }

    /// Проверяет, лежит ли точка внутри.
    pub fn contains(&self, p: Vec3i) -> bool {
        self.min.z <= p.z
            && p.z < self.max.z
            && self.min.y <= p.y
            && p.y < self.max.y
            && self.min.x <= p.x
            && p.x < self.max.x
    }

    /// Пересечение двух параллелепипедов.
    ///
    /// Результат может быть пустым.
    pub fn intersect(&self, other: &Box3) -> Box3 {
        Box3::new(self.min.max(other.min), self.max.min(other.max))
    }
}

impl fmt::Display for Box3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_points() {
        let b = Box3::from_min_size(Vec3i::new(5, 5, 5), Vec3i::new(41, 385, 385));
        assert_eq!(b.size(), Vec3i::new(41, 385, 385));
        assert_eq!(b.num_points(), 41 * 385 * 385);
        assert!(!b.is_empty());
    }

    #[test]
    fn test_contains_half_open() {
        let b = Box3::new(Vec3i::new(0, 0, 0), Vec3i::new(10, 10, 10));
        assert!(b.contains(Vec3i::new(0, 0, 0)));
        assert!(b.contains(Vec3i::new(9, 9, 9)));
        // Верхняя граница не включается
        assert!(!b.contains(Vec3i::new(10, 0, 0)));
        assert!(!b.contains(Vec3i::new(0, -1, 0)));
    }

    #[test]
    fn test_intersect_overlap() {
        let a = Box3::new(Vec3i::new(0, 0, 0), Vec3i::new(10, 10, 10));
        let b = Box3::new(Vec3i::new(5, 5, 5), Vec3i::new(20, 20, 20));

        let c = a.intersect(&b);
        assert_eq!(c.min(), Vec3i::new(5, 5, 5));
        assert_eq!(c.max(), Vec3i::new(10, 10, 10));
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = Box3::new(Vec3i::new(0, 0, 0), Vec3i::new(5, 5, 5));
        let b = Box3::new(Vec3i::new(10, 10, 10), Vec3i::new(20, 20, 20));

        let c = a.intersect(&b);
        assert!(c.is_empty());
        assert_eq!(c.size(), Vec3i::ZERO);
        assert_eq!(c.num_points(), 0);
    }

    #[test]
    fn test_intersect_identity() {
        let a = Box3::new(Vec3i::new(2, 3, 4), Vec3i::new(8, 9, 10));
        assert_eq!(a.intersect(&a), a);
    }
}
