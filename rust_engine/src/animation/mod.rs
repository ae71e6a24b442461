//! 动画系统
//!
//! 关键帧曲线、动作通道、动作与按骨架划分的动作库。

mod action;
mod bezier;
mod channel;
mod keyframe;

pub use action::{ActObject, Action, ActionLibrary};
pub use bezier::BezierCurve;
pub use channel::{Channel, ChannelProperty, ChannelTarget};
pub use keyframe::{Interpolation, Keyframe, KeyframeCurve};
