//! 网格、面、顶点权重与骨架模板

use std::fmt;

use glam::{Quat, Vec2, Vec3};

use crate::{ModelError, Result};

/// 骨骼复合索引：(骨架序号, 骨架内骨骼序号)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneIndex {
    pub armature: usize,
    pub bone: usize,
}

impl BoneIndex {
    pub fn new(armature: usize, bone: usize) -> Self {
        Self { armature, bone }
    }
}

/// 单个顶点的骨骼权重列表
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexWeightSet {
    pub weights: Vec<(BoneIndex, f32)>,
}

impl VertexWeightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_weight(&mut self, bone: BoneIndex, weight: f32) {
        self.weights.push((bone, weight));
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(BoneIndex, f32)> {
        self.weights.iter()
    }
}

impl FromIterator<(BoneIndex, f32)> for VertexWeightSet {
    fn from_iter<T: IntoIterator<Item = (BoneIndex, f32)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// 面：顶点索引，以及可选的 UV / 法线索引
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjFace {
    pub vertex_indices: Vec<u32>,
    pub tex_coord_indices: Option<Vec<u32>>,
    pub normal_indices: Option<Vec<u32>>,
}

impl ObjFace {
    pub fn new(vertex_indices: Vec<u32>) -> Self {
        Self {
            vertex_indices,
            tex_coord_indices: None,
            normal_indices: None,
        }
    }

    pub fn with_normals(mut self, normal_indices: Vec<u32>) -> Self {
        self.normal_indices = Some(normal_indices);
        self
    }

    pub fn with_tex_coords(mut self, tex_coord_indices: Vec<u32>) -> Self {
        self.tex_coord_indices = Some(tex_coord_indices);
        self
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_indices.len()
    }

    pub fn contains_normal_indices(&self) -> bool {
        self.normal_indices.is_some()
    }
}

/// 骨骼模板
#[derive(Clone, Debug, PartialEq)]
pub struct ObjBone {
    /// 父骨骼序号，只能指向更早的骨骼
    pub parent: Option<usize>,
    pub name: String,
    /// 绑定姿态位置
    pub position: Vec3,
    /// 绑定姿态旋转
    pub rotation: Quat,
    pub length: f32,
}

impl ObjBone {
    pub fn new(
        parent: Option<usize>,
        name: impl Into<String>,
        position: Vec3,
        rotation: Quat,
        length: f32,
    ) -> Self {
        Self {
            parent,
            name: name.into(),
            position,
            rotation,
            length,
        }
    }
}

/// 骨架模板：按顺序排列的骨骼
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjArmature {
    pub name: String,
    pub bones: Vec<ObjBone>,
}

impl ObjArmature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    pub fn add_bone(&mut self, bone: ObjBone) -> usize {
        self.bones.push(bone);
        self.bones.len() - 1
    }

    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }
}

/// 网格 + 骨架模板
///
/// `weights` 与 `vertices` 按下标对齐，None 表示顶点不受骨骼影响。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjMesh {
    pub vertices: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<ObjFace>,
    pub weights: Vec<Option<VertexWeightSet>>,
    pub armatures: Vec<ObjArmature>,
}

impl ObjMesh {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 构建 ==========

    /// 添加顶点，返回其序号
    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.vertices.push(position);
        self.weights.push(None);
        (self.vertices.len() - 1) as u32
    }

    /// 给最后添加的顶点追加一条权重
    pub fn add_weight(&mut self, bone: BoneIndex, weight: f32) {
        if let Some(slot) = self.weights.last_mut() {
            slot.get_or_insert_with(VertexWeightSet::new)
                .add_weight(bone, weight);
        }
    }

    pub fn add_tex_coord(&mut self, uv: Vec2) -> u32 {
        self.tex_coords.push(uv);
        (self.tex_coords.len() - 1) as u32
    }

    pub fn add_normal(&mut self, normal: Vec3) -> u32 {
        self.normals.push(normal);
        (self.normals.len() - 1) as u32
    }

    pub fn add_face(&mut self, face: ObjFace) {
        self.faces.push(face);
    }

    /// 添加骨架，之后的 [`ObjMesh::add_bone`] 都写入它
    pub fn add_armature(&mut self, name: impl Into<String>) -> usize {
        self.armatures.push(ObjArmature::new(name));
        self.armatures.len() - 1
    }

    /// 给最后添加的骨架追加骨骼；没有骨架时返回 None
    pub fn add_bone(&mut self, bone: ObjBone) -> Option<BoneIndex> {
        let armature = self.armatures.len().checked_sub(1)?;
        let bone = self.armatures[armature].add_bone(bone);
        Some(BoneIndex::new(armature, bone))
    }

    // ========== 查询 ==========

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_normals(&self) -> usize {
        self.normals.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_armatures(&self) -> usize {
        self.armatures.len()
    }

    pub fn vertex_weights(&self, index: usize) -> Option<&VertexWeightSet> {
        self.weights.get(index).and_then(Option::as_ref)
    }

    /// 顶点包围盒 (min, max)，空网格返回 None
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), v| (min.min(*v), max.max(*v))),
        )
    }

    /// 平铺为 f32 缓冲区（x, y, z, x, y, z, ...）
    pub fn positions_raw(&self) -> Vec<f32> {
        flatten(&self.vertices)
    }

    pub fn normals_raw(&self) -> Vec<f32> {
        flatten(&self.normals)
    }

    /// 检查面与权重中的索引是否越界
    ///
    /// 运行时不做这些检查；资源层可以在构建 Model 之前调用。
    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != self.vertices.len() {
            return Err(ModelError::MeshIndexOutOfRange {
                what: "weight list",
                index: self.weights.len(),
                len: self.vertices.len(),
            });
        }
        for face in &self.faces {
            check_indices(&face.vertex_indices, self.vertices.len(), "vertex")?;
            if let Some(ref indices) = face.tex_coord_indices {
                check_indices(indices, self.tex_coords.len(), "tex coord")?;
            }
            if let Some(ref indices) = face.normal_indices {
                check_indices(indices, self.normals.len(), "normal")?;
            }
        }
        for armature in &self.armatures {
            for (bone_index, bone) in armature.bones.iter().enumerate() {
                if let Some(parent) = bone.parent {
                    if parent >= bone_index {
                        return Err(ModelError::InvalidBoneParent {
                            armature: armature.name.clone(),
                            bone: bone_index,
                            parent,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ObjMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Obj[#vertices={},#texCoords={},#normals={},#faces={},#armatures={}]",
            self.vertices.len(),
            self.tex_coords.len(),
            self.normals.len(),
            self.faces.len(),
            self.armatures.len()
        )
    }
}

fn check_indices(indices: &[u32], len: usize, what: &'static str) -> Result<()> {
    match indices.iter().find(|&&i| i as usize >= len) {
        Some(&index) => Err(ModelError::MeshIndexOutOfRange {
            what,
            index: index as usize,
            len,
        }),
        None => Ok(()),
    }
}

fn flatten(values: &[Vec3]) -> Vec<f32> {
    let mut raw = Vec::with_capacity(values.len() * 3);
    for v in values {
        raw.extend_from_slice(&[v.x, v.y, v.z]);
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_attach_to_last_vertex() {
        let mut mesh = ObjMesh::new();
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_vertex(Vec3::X);
        mesh.add_weight(BoneIndex::new(0, 1), 0.5);
        mesh.add_weight(BoneIndex::new(0, 2), 0.5);

        assert!(mesh.vertex_weights(0).is_none());
        assert_eq!(mesh.vertex_weights(1).map(VertexWeightSet::len), Some(2));
    }

    #[test]
    fn test_bones_go_to_last_armature() {
        let mut mesh = ObjMesh::new();
        assert!(mesh
            .add_bone(ObjBone::new(None, "orphan", Vec3::ZERO, Quat::IDENTITY, 1.0))
            .is_none());

        mesh.add_armature("A");
        mesh.add_armature("B");
        let index = mesh.add_bone(ObjBone::new(None, "root", Vec3::ZERO, Quat::IDENTITY, 1.0));
        assert_eq!(index, Some(BoneIndex::new(1, 0)));
        assert_eq!(mesh.armatures[0].num_bones(), 0);
    }

    #[test]
    fn test_validate_catches_bad_indices() {
        let mut mesh = ObjMesh::new();
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_vertex(Vec3::X);
        mesh.add_vertex(Vec3::Y);
        mesh.add_normal(Vec3::Z);
        mesh.add_face(ObjFace::new(vec![0, 1, 2]).with_normals(vec![0, 0, 0]));
        assert!(mesh.validate().is_ok());

        mesh.add_face(ObjFace::new(vec![0, 1, 2]).with_normals(vec![0, 0, 1]));
        assert_eq!(
            mesh.validate(),
            Err(ModelError::MeshIndexOutOfRange {
                what: "normal",
                index: 1,
                len: 1
            })
        );
    }

    #[test]
    fn test_validate_catches_forward_parent() {
        let mut mesh = ObjMesh::new();
        mesh.add_armature("Armature");
        mesh.add_bone(ObjBone::new(Some(1), "a", Vec3::ZERO, Quat::IDENTITY, 1.0));
        mesh.add_bone(ObjBone::new(None, "b", Vec3::ZERO, Quat::IDENTITY, 1.0));
        assert!(matches!(
            mesh.validate(),
            Err(ModelError::InvalidBoneParent { bone: 0, parent: 1, .. })
        ));
    }

    #[test]
    fn test_bounds_and_raw() {
        let mut mesh = ObjMesh::new();
        assert!(mesh.bounds().is_none());
        mesh.add_vertex(Vec3::new(1.0, -2.0, 3.0));
        mesh.add_vertex(Vec3::new(-1.0, 4.0, 0.0));

        assert_eq!(
            mesh.bounds(),
            Some((Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 4.0, 3.0)))
        );
        assert_eq!(mesh.positions_raw(), vec![1.0, -2.0, 3.0, -1.0, 4.0, 0.0]);
    }
}
