//! 线性混合蒙皮

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::model::{BoneIndex, ObjMesh, VertexWeightSet};

use super::SkinningInput;

/// 计算单个顶点的蒙皮结果
///
/// `resolve` 把权重里的骨骼索引映射为蒙皮矩阵，找不到的骨骼被跳过。
/// 结果除以实际命中的权重之和；和为 0 时返回 None（顶点保持原值）。
pub fn skin_vertex<F>(position: Vec3, weights: &VertexWeightSet, resolve: &F) -> Option<Vec3>
where
    F: Fn(BoneIndex) -> Option<Mat4>,
{
    let mut sum = Vec3::ZERO;
    let mut weight_sum = 0.0f32;

    for &(bone, weight) in weights.iter() {
        let Some(m) = resolve(bone) else {
            continue;
        };
        sum += m.transform_point3(position) * weight;
        weight_sum += weight;
    }

    if weight_sum == 0.0 {
        None
    } else {
        Some(sum / weight_sum)
    }
}

/// 对所有顶点蒙皮并写入 `output`，返回被写入的顶点数
///
/// 没有权重的顶点不会被写入。并行与串行路径逐顶点计算完全相同。
pub fn skin_vertices<F>(
    input: &SkinningInput,
    output: &mut [Vec3],
    resolve: &F,
    parallel: bool,
) -> usize
where
    F: Fn(BoneIndex) -> Option<Mat4> + Sync,
{
    let compute = |out: &mut Vec3, position: &Vec3, weights: &Option<VertexWeightSet>| -> usize {
        match weights
            .as_ref()
            .and_then(|weights| skin_vertex(*position, weights, resolve))
        {
            Some(skinned) => {
                *out = skinned;
                1
            }
            None => 0,
        }
    };

    if parallel {
        output
            .par_iter_mut()
            .zip(input.positions.par_iter())
            .zip(input.weights.par_iter())
            .map(|((out, position), weights)| compute(out, position, weights))
            .sum()
    } else {
        output
            .iter_mut()
            .zip(input.positions.iter())
            .zip(input.weights.iter())
            .map(|((out, position), weights)| compute(out, position, weights))
            .sum()
    }
}

/// 三角形面法线：normalize((c - b) × (a - b))，退化三角形返回零向量
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (c - b).cross(a - b).normalize_or_zero()
}

/// 用当前顶点位置重算面法线，返回更新的面数
///
/// 只处理恰好 3 个顶点索引且恰好 3 个法线索引的面，其余面整体跳过，
/// 顶点或法线索引越界的面同样跳过，不写入任何槽位。
/// 同一法线槽被多个面共享时，按面顺序后写入者生效。
pub fn recompute_face_normals(mesh: &mut ObjMesh) -> usize {
    let mut updated = 0;

    for face in &mesh.faces {
        let Some(ref normal_indices) = face.normal_indices else {
            continue;
        };
        if face.num_vertices() != 3 || normal_indices.len() != 3 {
            continue;
        }
        if normal_indices
            .iter()
            .any(|&index| index as usize >= mesh.normals.len())
        {
            continue;
        }

        let vertex = |i: usize| mesh.vertices.get(face.vertex_indices[i] as usize).copied();
        let (Some(a), Some(b), Some(c)) = (vertex(0), vertex(1), vertex(2)) else {
            continue;
        };
        let normal = face_normal(a, b, c);

        for &index in normal_indices {
            mesh.normals[index as usize] = normal;
        }
        updated += 1;
    }

    updated
}
