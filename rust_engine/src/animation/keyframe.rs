//! 标量关键帧与关键帧曲线

use super::BezierCurve;

/// 关键帧到下一关键帧之间的插值方式
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interpolation {
    /// 保持当前值直到下一关键帧
    Constant,
    Linear,
    Bezier(BezierCurve),
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Linear
    }
}

impl Interpolation {
    /// 把 [0,1] 进度映射为混合系数
    fn amount(&self, t: f32) -> f32 {
        match self {
            Interpolation::Constant => 0.0,
            Interpolation::Linear => t,
            Interpolation::Bezier(curve) => curve.evaluate(t),
        }
    }
}

/// 标量关键帧
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: f32,
    pub value: f32,
    /// 从本帧过渡到下一帧的方式
    pub interpolation: Interpolation,
}

impl Keyframe {
    pub fn new(frame: f32, value: f32) -> Self {
        Self {
            frame,
            value,
            interpolation: Interpolation::Linear,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// 关键帧曲线（按帧号升序）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyframeCurve {
    keyframes: Vec<Keyframe>,
}

impl KeyframeCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从任意顺序的关键帧构建，同帧号保留后插入者
    pub fn from_keyframes(keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut curve = Self::new();
        for keyframe in keyframes {
            curve.insert_keyframe(keyframe);
        }
        curve
    }

    /// 插入关键帧，返回被替换的旧关键帧
    pub fn insert_keyframe(&mut self, keyframe: Keyframe) -> Option<Keyframe> {
        let pos = self.keyframes.partition_point(|k| k.frame < keyframe.frame);
        match self.keyframes.get_mut(pos) {
            Some(existing) if existing.frame == keyframe.frame => {
                Some(std::mem::replace(existing, keyframe))
            }
            _ => {
                self.keyframes.insert(pos, keyframe);
                None
            }
        }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// 首尾关键帧的帧号
    pub fn frame_range(&self) -> Option<(f32, f32)> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        Some((first.frame, last.frame))
    }

    /// 在任意（可为小数）帧号处采样
    ///
    /// 首帧之前取首帧值，末帧之后取末帧值，空曲线为 0。
    /// NaN 帧号按首帧处理。
    pub fn sample(&self, frame: f32) -> f32 {
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if frame.is_nan() || frame <= first.frame {
            return first.value;
        }
        if frame >= last.frame {
            return last.value;
        }

        // 第一个帧号大于 frame 的关键帧；上面的边界判断保证 1 <= next < len
        let next = self.keyframes.partition_point(|k| k.frame <= frame);
        let prev = &self.keyframes[next - 1];
        let next = &self.keyframes[next];

        let span = next.frame - prev.frame;
        let t = (frame - prev.frame) / span;
        let amount = prev.interpolation.amount(t);
        prev.value + (next.value - prev.value) * amount
    }
}
