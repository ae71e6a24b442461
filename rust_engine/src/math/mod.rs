//! 坐标空间
//!
//! 变换数学本身由 glam 提供；这里只定义"父空间 + 到父空间的矩阵"这一能力，
//! 以及沿父链合成矩阵的工具函数。父空间为 None 即父空间是世界空间（单位变换）。

use glam::{Mat4, Vec3};

/// 具有父空间的坐标空间节点
pub trait CoordinateSpace: Sized {
    /// 父空间，None 表示父空间为世界
    fn parent_space(&self) -> Option<Self>;

    /// 本空间 -> 父空间
    fn matrix(&self) -> Mat4;

    /// 父空间 -> 本空间
    fn inverse_matrix(&self) -> Mat4;
}

/// 本空间 -> 世界空间
pub fn conversion_to_world<S: CoordinateSpace>(space: &S) -> Mat4 {
    let mut result = space.matrix();
    let mut current = space.parent_space();
    while let Some(parent) = current {
        result = parent.matrix() * result;
        current = parent.parent_space();
    }
    result
}

/// 世界空间 -> 本空间
pub fn conversion_from_world<S: CoordinateSpace>(space: &S) -> Mat4 {
    let mut result = space.inverse_matrix();
    let mut current = space.parent_space();
    while let Some(parent) = current {
        result *= parent.inverse_matrix();
        current = parent.parent_space();
    }
    result
}

/// `from` 空间 -> `to` 空间（两者须在同一世界下）
pub fn conversion_matrix<S: CoordinateSpace>(from: &S, to: &S) -> Mat4 {
    conversion_from_world(to) * conversion_to_world(from)
}

/// 把 `from` 空间中的点变换到 `to` 空间
pub fn transform_point<S: CoordinateSpace>(from: &S, to: &S, point: Vec3) -> Vec3 {
    conversion_matrix(from, to).transform_point3(point)
}
