//! MC Model Engine - Minecraft 模组用的骨骼模型运行时
//!
//! 提供：
//! - 骨架（Armature）加载与骨骼层级
//! - 动作通道采样（seek frame）
//! - 骨骼矩阵自顶向下传播
//! - 线性混合蒙皮与面法线重算
//!
//! 渲染、着色器与模型文件解析由宿主负责。

pub mod animation;
pub mod config;
pub mod math;
pub mod model;
pub mod skeleton;
pub mod skinning;

pub use animation::{
    ActObject, Action, ActionLibrary, BezierCurve, Channel, ChannelProperty, Interpolation,
    Keyframe, KeyframeCurve,
};
pub use config::EngineConfig;
pub use math::CoordinateSpace;
pub use model::{
    BoneIndex, Model, ModelInstance, ObjArmature, ObjBone, ObjFace, ObjMesh, VertexWeightSet,
};
pub use skeleton::{Armature, Bone, BoneSpace};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("bone {bone} of armature '{armature}' references parent {parent}, which is not an earlier bone")]
    InvalidBoneParent {
        armature: String,
        bone: usize,
        parent: usize,
    },

    #[error("armature not found: {0}")]
    ArmatureNotFound(String),

    #[error("bone not found: {0}")]
    BoneNotFound(String),

    #[error("{what} index {index} out of range (len {len})")]
    MeshIndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
