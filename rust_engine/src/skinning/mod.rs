//! 顶点蒙皮与面法线计算

mod skinning;

pub use skinning::{face_normal, recompute_face_normals, skin_vertex, skin_vertices};

use glam::Vec3;

use crate::model::VertexWeightSet;

/// 蒙皮输入数据（来自源模型，只读）
pub struct SkinningInput<'a> {
    /// 绑定姿态顶点位置
    pub positions: &'a [Vec3],
    /// 顶点权重，与 positions 按下标对齐
    pub weights: &'a [Option<VertexWeightSet>],
}

/// 蒙皮统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkinningStats {
    /// 被重新写入的顶点数
    pub skinned_vertices: usize,
    /// 被重新计算法线的面数
    pub updated_faces: usize,
}
