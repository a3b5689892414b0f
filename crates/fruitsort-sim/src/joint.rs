//! 机械臂关节定义
//!
//! 分拣单元使用五关节 UR 构型机械臂（腕 3 固定不用）。
//! [`JointVector`] 是按关节索引的定长容器，用于目标位姿与位置反馈。

use std::fmt;
use std::ops::{Index, IndexMut};

/// 机械臂关节（按运动链顺序编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArmJoint {
    /// 肩部回转
    ShoulderPan = 0,
    /// 肩部抬升
    ShoulderLift = 1,
    /// 肘部
    Elbow = 2,
    /// 腕关节 1（带位置反馈，用于状态机的到位判断）
    Wrist1 = 3,
    /// 腕关节 2
    Wrist2 = 4,
}

impl ArmJoint {
    /// 关节总数
    pub const COUNT: usize = 5;

    /// 全部关节（按索引顺序）
    pub const ALL: [ArmJoint; Self::COUNT] = [
        ArmJoint::ShoulderPan,
        ArmJoint::ShoulderLift,
        ArmJoint::Elbow,
        ArmJoint::Wrist1,
        ArmJoint::Wrist2,
    ];

    /// 关节索引（0..=4）
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引构造关节
    ///
    /// # 返回
    /// 索引超出 `0..COUNT` 时返回 `None`。
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ArmJoint::ShoulderPan),
            1 => Some(ArmJoint::ShoulderLift),
            2 => Some(ArmJoint::Elbow),
            3 => Some(ArmJoint::Wrist1),
            4 => Some(ArmJoint::Wrist2),
            _ => None,
        }
    }

    /// 仿真器中的关节设备名
    pub const fn device_name(self) -> &'static str {
        match self {
            ArmJoint::ShoulderPan => "shoulder_pan_joint",
            ArmJoint::ShoulderLift => "shoulder_lift_joint",
            ArmJoint::Elbow => "elbow_joint",
            ArmJoint::Wrist1 => "wrist_1_joint",
            ArmJoint::Wrist2 => "wrist_2_joint",
        }
    }
}

impl fmt::Display for ArmJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.device_name())
    }
}

/// 按关节索引的定长容器
///
/// # 示例
///
/// ```
/// use fruitsort_sim::{ArmJoint, JointVector};
///
/// let mut targets = JointVector::splat(0.0);
/// targets[ArmJoint::Wrist1] = -2.363176;
/// assert_eq!(targets[ArmJoint::Wrist1], -2.363176);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointVector<T> {
    data: [T; ArmJoint::COUNT],
}

impl<T> JointVector<T> {
    /// 从定长数组构造
    pub const fn new(data: [T; ArmJoint::COUNT]) -> Self {
        Self { data }
    }

    /// 借用底层数组
    pub fn as_array(&self) -> &[T; ArmJoint::COUNT] {
        &self.data
    }

    /// 取出底层数组
    pub fn into_array(self) -> [T; ArmJoint::COUNT] {
        self.data
    }

    /// 按 `(关节, 值)` 迭代
    pub fn iter(&self) -> impl Iterator<Item = (ArmJoint, &T)> {
        ArmJoint::ALL.iter().copied().zip(self.data.iter())
    }

    /// 逐元素映射
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> JointVector<U> {
        JointVector {
            data: [
                f(&self.data[0]),
                f(&self.data[1]),
                f(&self.data[2]),
                f(&self.data[3]),
                f(&self.data[4]),
            ],
        }
    }
}

impl<T: Copy> JointVector<T> {
    /// 所有关节填同一个值
    pub fn splat(value: T) -> Self {
        Self {
            data: [value; ArmJoint::COUNT],
        }
    }
}

impl<T: Default + Copy> Default for JointVector<T> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl<T> From<[T; ArmJoint::COUNT]> for JointVector<T> {
    fn from(data: [T; ArmJoint::COUNT]) -> Self {
        Self { data }
    }
}

impl<T> Index<ArmJoint> for JointVector<T> {
    type Output = T;

    fn index(&self, joint: ArmJoint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<ArmJoint> for JointVector<T> {
    fn index_mut(&mut self, joint: ArmJoint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for joint in ArmJoint::ALL {
            assert_eq!(ArmJoint::from_index(joint.index()), Some(joint));
        }
        assert_eq!(ArmJoint::from_index(5), None);
    }

    #[test]
    fn device_names_are_unique() {
        let names: Vec<&str> = ArmJoint::ALL.iter().map(|j| j.device_name()).collect();
        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn vector_index_and_map() {
        let mut v = JointVector::splat(1.0_f64);
        v[ArmJoint::Elbow] = 2.5;
        let doubled = v.map(|x| x * 2.0);
        assert_eq!(doubled[ArmJoint::Elbow], 5.0);
        assert_eq!(doubled[ArmJoint::Wrist2], 2.0);
    }

    #[test]
    fn iter_visits_joints_in_order() {
        let v = JointVector::new([0.0, 0.1, 0.2, 0.3, 0.4]);
        let joints: Vec<ArmJoint> = v.iter().map(|(j, _)| j).collect();
        assert_eq!(joints, ArmJoint::ALL.to_vec());
    }
}
