//! 源模型（只读，可被多个实例共享）

use crate::animation::ActionLibrary;

use super::ObjMesh;

/// 源模型：网格 + 骨架模板 + 动作库
///
/// 构建后不再修改；实例通过 `Arc<Model>` 共享它。
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    pub obj: ObjMesh,
    pub actions: ActionLibrary,
}

impl Model {
    pub fn new(name: impl Into<String>, obj: ObjMesh, actions: ActionLibrary) -> Self {
        Self {
            name: name.into(),
            obj,
            actions,
        }
    }

    /// 无动作的静态模型
    pub fn from_mesh(name: impl Into<String>, obj: ObjMesh) -> Self {
        Self::new(name, obj, ActionLibrary::new())
    }
}
