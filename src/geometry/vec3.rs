// --- Файл: src/geometry/vec3.rs ---

//! Целочисленный 3D-вектор в глобальной системе координат.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Целочисленный вектор с осями в порядке (z, y, x).
///
/// Порядок осей совпадает с порядком осей объёмных данных:
/// сначала срезы (z), затем строки (y) и столбцы (x).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec3i {
    pub z: i64,
    pub y: i64,
    pub x: i64,
}

impl Vec3i {
    /// Нулевой вектор.
    pub const ZERO: Self = Self { z: 0, y: 0, x: 0 };

    /// Создает вектор из компонент.
    pub fn new(z: i64, y: i64, x: i64) -> Self {
        Self { z, y, x }
    }

    /// Покомпонентный минимум.
    pub fn min(self, other: Self) -> Self {
        Self {
            z: self.z.min(other.z),
            y: self.y.min(other.y),
            x: self.x.min(other.x),
        }
    }

    /// Покомпонентный максимум.
    pub fn max(self, other: Self) -> Self {
        Self {
            z: self.z.max(other.z),
            y: self.y.max(other.y),
            x: self.x.max(other.x),
        }
    }

    /// Возвращает компоненты как массив `[z, y, x]`.
    pub fn to_array(self) -> [i64; 3] {
        [self.z, self.y, self.x]
    }
}

impl Add for Vec3i {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.z + rhs.z, self.y + rhs.y, self.x + rhs.x)
    }
}

impl AddAssign for Vec3i {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3i {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.z - rhs.z, self.y - rhs.y, self.x - rhs.x)
    }
}

impl SubAssign for Vec3i {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Vec3i {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.z, -self.y, -self.x)
    }
}

impl From<(i64, i64, i64)> for Vec3i {
    fn from((z, y, x): (i64, i64, i64)) -> Self {
        Self::new(z, y, x)
    }
}

impl From<[i64; 3]> for Vec3i {
    fn from([z, y, x]: [i64; 3]) -> Self {
        Self::new(z, y, x)
    }
}

impl fmt::Display for Vec3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.z, self.y, self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vec3i::new(1, 2, 3);
        let b = Vec3i::new(10, 20, 30);

        assert_eq!(a + b, Vec3i::new(11, 22, 33));
        assert_eq!(b - a, Vec3i::new(9, 18, 27));
        assert_eq!(-a, Vec3i::new(-1, -2, -3));
    }

    #[test]
    fn test_min_max() {
        let a = Vec3i::new(1, 20, 3);
        let b = Vec3i::new(10, 2, 30);

        assert_eq!(a.min(b), Vec3i::new(1, 2, 3));
        assert_eq!(a.max(b), Vec3i::new(10, 20, 30));
    }

    #[test]
    fn test_display() {
        assert_eq!(Vec3i::new(5, -1, 0).to_string(), "(5, -1, 0)");
    }
}
