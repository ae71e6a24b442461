//! 动作（动画片段）与动作库
//!
//! 动作库按骨架名称索引 [`ActObject`]，每个 ActObject 再按名称保存若干 [`Action`]。

use std::collections::HashMap;
use std::sync::Arc;

use super::{Channel, KeyframeCurve};

/// 动作：一组通道
#[derive(Clone, Debug, Default)]
pub struct Action {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
        }
    }

    /// 添加通道（名称在此处解析为目标骨骼和属性）
    pub fn add_channel(&mut self, name: impl Into<String>, curve: KeyframeCurve) -> &mut Self {
        self.channels.push(Channel::new(name, curve));
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 所有通道关键帧的最小/最大帧号
    pub fn frame_range(&self) -> Option<(f32, f32)> {
        self.channels
            .iter()
            .filter_map(|c| c.curve.frame_range())
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }
}

/// 单个骨架可用的动作集合
#[derive(Clone, Debug, Default)]
pub struct ActObject {
    pub name: String,
    actions: HashMap<String, Arc<Action>>,
}

impl ActObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    pub fn insert_action(&mut self, action: Action) -> Option<Arc<Action>> {
        self.actions.insert(action.name.clone(), Arc::new(action))
    }

    pub fn get_action(&self, name: &str) -> Option<Arc<Action>> {
        self.actions.get(name).cloned()
    }

    /// 按名称排序的动作列表
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

/// 动作库（骨架名称 -> ActObject）
#[derive(Clone, Debug, Default)]
pub struct ActionLibrary {
    objects: HashMap<String, Arc<ActObject>>,
}

impl ActionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_object(&mut self, object: ActObject) -> Option<Arc<ActObject>> {
        self.objects.insert(object.name.clone(), Arc::new(object))
    }

    /// 查找骨架对应的动作集合，不存在是合法的
    pub fn get_object(&self, armature_name: &str) -> Option<Arc<ActObject>> {
        self.objects.get(armature_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Keyframe;

    #[test]
    fn test_frame_range_spans_channels() {
        let mut action = Action::new("walk");
        action
            .add_channel(
                "Leg.rx",
                KeyframeCurve::from_keyframes([Keyframe::new(2.0, 0.0), Keyframe::new(8.0, 1.0)]),
            )
            .add_channel(
                "Arm.tz",
                KeyframeCurve::from_keyframes([Keyframe::new(0.0, 0.0), Keyframe::new(5.0, 1.0)]),
            )
            .add_channel("Empty.ty", KeyframeCurve::new());

        assert_eq!(action.channel_count(), 3);
        assert_eq!(action.frame_range(), Some((0.0, 8.0)));
        assert_eq!(Action::new("idle").frame_range(), None);
    }

    #[test]
    fn test_library_lookup() {
        let mut object = ActObject::new("Armature");
        object.insert_action(Action::new("walk"));
        object.insert_action(Action::new("idle"));

        let mut library = ActionLibrary::new();
        library.insert_object(object);

        let found = library.get_object("Armature").unwrap();
        assert_eq!(found.action_names(), vec!["idle", "walk"]);
        assert!(found.get_action("run").is_none());
        assert!(library.get_object("Other").is_none());
    }
}
