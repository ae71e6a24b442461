//! 模型：源数据与运行时实例

mod instance;
mod mesh;
mod source;

pub use instance::ModelInstance;
pub use mesh::{BoneIndex, ObjArmature, ObjBone, ObjFace, ObjMesh, VertexWeightSet};
pub use source::Model;
