//! 骨架：骨骼层级 + 当前动作

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::animation::{ActObject, Action, ActionLibrary};
use crate::math::{self, CoordinateSpace};
use crate::model::ObjArmature;
use crate::{ModelError, Result};

use super::Bone;

/// 骨架
pub struct Armature {
    pub name: String,
    /// 在所属模型实例中的序号
    pub index: usize,
    bones: Vec<Bone>,
    root_bones: Vec<usize>,
    bone_map: HashMap<String, usize>,
    act_object: Option<Arc<ActObject>>,
    action: Option<Arc<Action>>,
}

impl Armature {
    /// 从骨架模板构建
    ///
    /// 骨骼按模板顺序创建，父序号必须指向更早的骨骼。
    pub fn load(index: usize, template: &ObjArmature, actions: &ActionLibrary) -> Result<Self> {
        let mut bones: Vec<Bone> = Vec::with_capacity(template.bones.len());
        let mut root_bones = Vec::new();

        for (bone_index, obj_bone) in template.bones.iter().enumerate() {
            let rest_to_world = Bone::rest_matrix(obj_bone.position, obj_bone.rotation);
            let bone = match obj_bone.parent {
                Some(parent) => {
                    let parent_bone =
                        bones
                            .get(parent)
                            .ok_or_else(|| ModelError::InvalidBoneParent {
                                armature: template.name.clone(),
                                bone: bone_index,
                                parent,
                            })?;
                    Bone::new(
                        obj_bone.name.clone(),
                        obj_bone.length,
                        rest_to_world,
                        Some((parent, parent_bone)),
                    )
                }
                None => {
                    root_bones.push(bone_index);
                    Bone::new(obj_bone.name.clone(), obj_bone.length, rest_to_world, None)
                }
            };
            if let Some(parent) = bone.parent() {
                bones[parent].add_child(bone_index);
            }
            bones.push(bone);
        }

        let bone_map = bones
            .iter()
            .enumerate()
            .map(|(i, bone)| (bone.name().to_string(), i))
            .collect();

        let act_object = actions.get_object(&template.name);
        if act_object.is_none() {
            log::debug!("骨架 '{}' 没有对应的动作数据", template.name);
        }

        Ok(Self {
            name: template.name.clone(),
            index,
            bones,
            root_bones,
            bone_map,
            act_object,
            action: None,
        })
    }

    // ========== 动作 ==========

    /// 选择动作；名称不存在时清空当前动作
    pub fn start_action(&mut self, name: &str) {
        self.action = self
            .act_object
            .as_ref()
            .and_then(|object| object.get_action(name));
        if self.action.is_none() {
            log::debug!("骨架 '{}' 没有名为 '{}' 的动作", self.name, name);
        }
    }

    pub fn stop_action(&mut self) {
        self.action = None;
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.action.as_deref()
    }

    pub fn act_object(&self) -> Option<&ActObject> {
        self.act_object.as_deref()
    }

    /// 可用动作名称
    pub fn action_names(&self) -> Vec<&str> {
        self.act_object
            .as_deref()
            .map(ActObject::action_names)
            .unwrap_or_default()
    }

    /// 当前动作的帧范围
    pub fn frame_range(&self) -> Option<(f32, f32)> {
        self.action.as_ref().and_then(|action| action.frame_range())
    }

    /// 采样当前动作并写入骨骼位姿
    ///
    /// 没有动作时不做任何事；找不到骨骼或属性未知的通道被跳过。
    pub fn seek_frame(&mut self, frame: f32) {
        let Some(action) = self.action.clone() else {
            return;
        };

        for channel in &action.channels {
            let Some(ref target) = channel.target else {
                continue;
            };
            let Some(&bone_index) = self.bone_map.get(&target.bone_name) else {
                continue;
            };
            let value = channel.sample(frame);
            let bone = &mut self.bones[bone_index];
            target
                .property
                .apply(&mut bone.rotation, &mut bone.translation, value);
        }
    }

    // ========== 变换 ==========

    /// 从每个根骨骼开始先序遍历更新矩阵（父骨骼先于子骨骼）
    pub fn update_bones(&mut self) {
        for i in 0..self.root_bones.len() {
            let root = self.root_bones[i];
            self.update_bone_recursive(root);
        }
    }

    fn update_bone_recursive(&mut self, index: usize) {
        // 父骨骼本帧已更新，直接取其世界矩阵
        let parent_to_world = match self.bones[index].parent() {
            Some(parent) => self.bones[parent].world_matrix(),
            None => Mat4::IDENTITY,
        };
        self.bones[index].update_matrices(parent_to_world);

        for i in 0..self.bones[index].children().len() {
            let child = self.bones[index].children()[i];
            self.update_bone_recursive(child);
        }
    }

    /// 所有骨骼回到绑定姿态（矩阵需再次 update 才会刷新）
    pub fn reset_pose(&mut self) {
        for bone in &mut self.bones {
            bone.reset_pose();
        }
    }

    // ========== 查询 ==========

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// 根骨骼序号
    pub fn root_bones(&self) -> &[usize] {
        &self.root_bones
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_map.get(name).copied()
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bone_index(name).map(|i| &self.bones[i])
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        let index = self.bone_index(name)?;
        self.bones.get_mut(index)
    }

    pub fn bone_checked(&self, name: &str) -> Result<&Bone> {
        self.bone(name)
            .ok_or_else(|| ModelError::BoneNotFound(name.to_string()))
    }

    pub fn bone_at(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bone_at_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }

    /// 骨骼的坐标空间视图
    pub fn space(&self, index: usize) -> BoneSpace<'_> {
        BoneSpace {
            armature: self,
            index,
        }
    }
}

/// 骨骼坐标空间：骨架 + 骨骼序号
#[derive(Clone, Copy)]
pub struct BoneSpace<'a> {
    armature: &'a Armature,
    index: usize,
}

impl<'a> BoneSpace<'a> {
    pub fn bone(&self) -> &'a Bone {
        &self.armature.bones[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 本骨骼空间 -> 世界
    pub fn to_world(&self) -> Mat4 {
        math::conversion_to_world(self)
    }
}

impl CoordinateSpace for BoneSpace<'_> {
    fn parent_space(&self) -> Option<Self> {
        self.bone().parent().map(|index| BoneSpace {
            armature: self.armature,
            index,
        })
    }

    fn matrix(&self) -> Mat4 {
        self.bone().matrix()
    }

    fn inverse_matrix(&self) -> Mat4 {
        self.bone().inverse_matrix()
    }
}
