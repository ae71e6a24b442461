//! 贝塞尔曲线插值

/// 归一化三次贝塞尔缓动曲线
///
/// 端点固定为 (0,0) 和 (1,1)，(x1,y1)、(x2,y2) 为两个控制点，
/// x 分量须在 [0,1] 内以保证 x(s) 单调。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl BezierCurve {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    /// 线性插值
    pub fn linear() -> Self {
        Self::new(0.25, 0.25, 0.75, 0.75)
    }

    /// 从 `[x1, y1, x2, y2]` 控制点创建
    pub fn from_control_points(points: [f32; 4]) -> Self {
        Self::new(points[0], points[1], points[2], points[3])
    }

    /// 评估贝塞尔曲线，`t` 为两关键帧之间的归一化进度
    pub fn evaluate(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        // 使用牛顿法求解 x(s) = t 的 s 值
        let mut s = t;
        for _ in 0..15 {
            let x = self.bezier_x(s);
            let dx = self.bezier_dx(s);

            if dx.abs() < 1e-6 {
                break;
            }

            let new_s = (s - (x - t) / dx).clamp(0.0, 1.0);
            if (new_s - s).abs() < 1e-6 {
                s = new_s;
                break;
            }
            s = new_s;
        }

        self.bezier_y(s)
    }

    fn bezier_x(&self, s: f32) -> f32 {
        let s2 = s * s;
        let s3 = s2 * s;
        let t = 1.0 - s;
        let t2 = t * t;

        3.0 * t2 * s * self.x1 + 3.0 * t * s2 * self.x2 + s3
    }

    fn bezier_y(&self, s: f32) -> f32 {
        let s2 = s * s;
        let s3 = s2 * s;
        let t = 1.0 - s;
        let t2 = t * t;

        3.0 * t2 * s * self.y1 + 3.0 * t * s2 * self.y2 + s3
    }

    fn bezier_dx(&self, s: f32) -> f32 {
        let s2 = s * s;
        let t = 1.0 - s;

        3.0 * t * t * self.x1 + 6.0 * t * s * (self.x2 - self.x1) + 3.0 * s2 * (1.0 - self.x2)
    }
}
