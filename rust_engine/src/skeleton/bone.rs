//! 骨骼节点

use glam::{Mat4, Quat, Vec3};

/// 骨骼节点
///
/// 父子关系用骨架内的序号表示，骨骼本身由 [`super::Armature`] 持有。
#[derive(Clone, Debug)]
pub struct Bone {
    // 层级（加载后只读，骨架依赖它与名称表保持一致）
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,
    pub length: f32,

    // 绑定姿态（构建后不变）
    /// 骨骼本地空间 -> 世界空间（绑定姿态）
    rest_to_world: Mat4,
    /// 世界空间 -> 骨骼本地空间（绑定姿态）
    world_to_rest: Mat4,
    /// 相对父骨骼的绑定姿态
    rest_transform: Mat4,

    // 动画状态
    pub rotation: Quat,
    pub translation: Vec3,

    // 变换结果
    local_transform: Mat4,
    matrix: Mat4,
    inverse_matrix: Mat4,
    world_matrix: Mat4,
    final_matrix: Mat4,
}

impl Bone {
    /// 创建骨骼；`parent` 为父骨骼序号及其引用，根骨骼传 None
    pub fn new(
        name: impl Into<String>,
        length: f32,
        rest_to_world: Mat4,
        parent: Option<(usize, &Bone)>,
    ) -> Self {
        let world_to_rest = rest_to_world.inverse();
        let rest_transform = match parent {
            Some((_, parent)) => parent.world_to_rest * rest_to_world,
            None => rest_to_world,
        };

        Self {
            name: name.into(),
            parent: parent.map(|(index, _)| index),
            children: Vec::new(),
            length,
            rest_to_world,
            world_to_rest,
            rest_transform,
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
            local_transform: Mat4::IDENTITY,
            matrix: rest_transform,
            inverse_matrix: rest_transform.inverse(),
            world_matrix: rest_to_world,
            final_matrix: Mat4::IDENTITY,
        }
    }

    /// 绑定姿态矩阵：先旋转再平移（平移位于旋转后的本地坐标系）
    pub fn rest_matrix(position: Vec3, rotation: Quat) -> Mat4 {
        Mat4::from_quat(rotation) * Mat4::from_translation(position)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub(super) fn add_child(&mut self, index: usize) {
        self.children.push(index);
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// 重置动画状态为绑定姿态
    pub fn reset_pose(&mut self) {
        self.rotation = Quat::IDENTITY;
        self.translation = Vec3::ZERO;
    }

    pub fn set_pose(&mut self, rotation: Quat, translation: Vec3) {
        self.rotation = rotation;
        self.translation = translation;
    }

    /// 更新矩阵
    ///
    /// `parent_to_world` 为父骨骼当前帧的 本地 -> 世界 矩阵（根骨骼为单位矩阵），
    /// 因此必须先更新父骨骼。
    pub fn update_matrices(&mut self, parent_to_world: Mat4) {
        self.local_transform = Mat4::from_quat(self.rotation) * Mat4::from_translation(self.translation);
        self.matrix = self.rest_transform * self.local_transform;
        self.inverse_matrix = self.matrix.inverse();
        self.world_matrix = parent_to_world * self.matrix;
        self.final_matrix = self.world_matrix * self.world_to_rest;
    }

    pub fn rest_to_world(&self) -> Mat4 {
        self.rest_to_world
    }

    pub fn world_to_rest(&self) -> Mat4 {
        self.world_to_rest
    }

    pub fn rest_transform(&self) -> Mat4 {
        self.rest_transform
    }

    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// 当前帧 本地 -> 父空间
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn inverse_matrix(&self) -> Mat4 {
        self.inverse_matrix
    }

    /// 当前帧 本地 -> 世界
    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    /// 蒙皮矩阵：绑定姿态世界坐标 -> 当前姿态世界坐标
    pub fn final_matrix(&self) -> Mat4 {
        self.final_matrix
    }

    /// 骨骼头部的世界坐标
    pub fn head_position(&self) -> Vec3 {
        self.world_matrix.transform_point3(Vec3::ZERO)
    }

    /// 骨骼尾部的世界坐标（沿本地 +Y 延伸 length）
    pub fn tail_position(&self) -> Vec3 {
        self.world_matrix.transform_point3(Vec3::Y * self.length)
    }
}
