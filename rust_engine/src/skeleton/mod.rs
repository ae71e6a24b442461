//! 骨骼系统

mod armature;
mod bone;

pub use armature::{Armature, BoneSpace};
pub use bone::Bone;
