//! 动作通道
//!
//! 通道名形如 `"<骨骼名>.<属性>"`，在构建时解析一次，逐帧采样只做枚举分派。

use glam::{Quat, Vec3};

use super::KeyframeCurve;

/// 通道驱动的单个位姿分量
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelProperty {
    RotX,
    RotY,
    RotZ,
    RotW,
    TransX,
    TransY,
    TransZ,
}

impl ChannelProperty {
    /// 解析属性后缀，未知后缀返回 None
    pub fn parse(suffix: &str) -> Option<Self> {
        match suffix {
            "rx" => Some(Self::RotX),
            "ry" => Some(Self::RotY),
            "rz" => Some(Self::RotZ),
            "rw" => Some(Self::RotW),
            "tx" => Some(Self::TransX),
            "ty" => Some(Self::TransY),
            "tz" => Some(Self::TransZ),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::RotX => "rx",
            Self::RotY => "ry",
            Self::RotZ => "rz",
            Self::RotW => "rw",
            Self::TransX => "tx",
            Self::TransY => "ty",
            Self::TransZ => "tz",
        }
    }

    /// 只写入一个分量，其余分量保持不变
    pub fn apply(&self, rotation: &mut Quat, translation: &mut Vec3, value: f32) {
        let [x, y, z, w] = rotation.to_array();
        match self {
            Self::RotX => *rotation = Quat::from_xyzw(value, y, z, w),
            Self::RotY => *rotation = Quat::from_xyzw(x, value, z, w),
            Self::RotZ => *rotation = Quat::from_xyzw(x, y, value, w),
            Self::RotW => *rotation = Quat::from_xyzw(x, y, z, value),
            Self::TransX => translation.x = value,
            Self::TransY => translation.y = value,
            Self::TransZ => translation.z = value,
        }
    }
}

/// 通道目标：骨骼名 + 属性
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelTarget {
    pub bone_name: String,
    pub property: ChannelProperty,
}

impl ChannelTarget {
    /// 在最后一个 '.' 处拆分；无分隔符或属性未知时返回 None
    pub fn parse(name: &str) -> Option<Self> {
        let (bone_name, suffix) = name.rsplit_once('.')?;
        let property = ChannelProperty::parse(suffix)?;
        Some(Self {
            bone_name: bone_name.to_string(),
            property,
        })
    }
}

/// 动画通道
#[derive(Clone, Debug)]
pub struct Channel {
    pub name: String,
    /// None 表示通道名无法解析，采样时跳过
    pub target: Option<ChannelTarget>,
    pub curve: KeyframeCurve,
}

impl Channel {
    pub fn new(name: impl Into<String>, curve: KeyframeCurve) -> Self {
        let name = name.into();
        let target = ChannelTarget::parse(&name);
        if target.is_none() {
            log::debug!("动作通道 '{}' 无法解析，采样时将跳过", name);
        }
        Self {
            name,
            target,
            curve,
        }
    }

    pub fn sample(&self, frame: f32) -> f32 {
        self.curve.sample(frame)
    }
}
