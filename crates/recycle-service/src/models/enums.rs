//! 回收平台枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 可回收材料类型
///
/// 每种材料有固定的每公斤积分率，审核通过时按率折算积分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialKind {
    /// PET 塑料瓶
    Pet,
    /// 普通塑料
    Plastic,
    /// 玻璃
    Glass,
    /// 纸类
    Paper,
    /// 金属
    Metal,
    /// 电子废弃物
    Electronic,
    /// 有机垃圾
    Organic,
}

impl MaterialKind {
    /// 每公斤可得积分率
    pub fn points_per_kg(&self) -> f64 {
        match self {
            Self::Pet => 10.0,
            Self::Plastic => 8.0,
            Self::Glass => 5.0,
            Self::Paper => 3.0,
            Self::Metal => 15.0,
            Self::Electronic => 20.0,
            Self::Organic => 2.0,
        }
    }

    /// 按重量计算积分（向下取整）
    pub fn points_for_weight(&self, weight_kg: f64) -> i64 {
        (weight_kg * self.points_per_kg()).floor() as i64
    }

    /// 所有材料类型（用于展示回收指南）
    pub fn all() -> &'static [MaterialKind] {
        &[
            Self::Pet,
            Self::Plastic,
            Self::Glass,
            Self::Paper,
            Self::Metal,
            Self::Electronic,
            Self::Organic,
        ]
    }
}

/// 投递状态
///
/// 投递由公民提交后进入待审核，运营人员审核后进入终态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryState {
    /// 待审核 - 已提交，等待运营人员验证
    #[default]
    Pending,
    /// 已通过 - 审核通过，积分已入账
    Approved,
    /// 已拒绝 - 审核未通过，不产生积分
    Rejected,
}

impl DeliveryState {
    /// 是否为终态（终态不允许再次审核）
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// 兑换状态
///
/// 兑换申请的完整生命周期，拒绝和取消会触发积分退还
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionState {
    /// 已申请 - 积分已扣、库存已占，等待审核
    #[default]
    Requested,
    /// 已批准 - 审核通过，等待发放
    Approved,
    /// 发放中 - 奖励正在配送/发放
    InProgress,
    /// 已送达 - 流程完成
    Delivered,
    /// 已拒绝 - 审核未通过，积分与库存已退还
    Rejected,
    /// 已取消 - 用户在审核前主动取消，积分与库存已退还
    Cancelled,
}

impl RedemptionState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Cancelled)
    }

    /// 进入该状态时是否需要退还积分和库存
    ///
    /// 只有 Rejected 和 Cancelled 触发补偿，且两者都只能从
    /// Requested 进入，因此补偿至多发生一次
    pub fn triggers_refund(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }

    /// 校验状态迁移是否合法
    ///
    /// 发放中是可选的中间态，批准后可以直接确认送达
    pub fn can_transition_to(&self, next: RedemptionState) -> bool {
        use RedemptionState::*;
        matches!(
            (self, next),
            (Requested, Approved)
                | (Requested, Rejected)
                | (Requested, Cancelled)
                | (Approved, InProgress)
                | (Approved, Delivered)
                | (InProgress, Delivered)
        )
    }
}

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// 公民 - 投递材料、兑换奖励
    #[default]
    Citizen,
    /// 运营人员 - 审核投递和兑换
    Operator,
    /// 管理员 - 运营权限 + 奖励管理、用户管理
    Admin,
}

impl UserRole {
    /// 是否为平台工作人员（可执行审核操作）
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Operator | Self::Admin)
    }
}

/// 奖励分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardCategory {
    /// 奖学金
    Scholarship,
    /// 经济援助
    FinancialAid,
    /// 商户折扣
    Discount,
    /// 公共服务
    PublicService,
    /// 文化
    Culture,
    /// 体育
    Sports,
    /// 健康
    Health,
}

/// 积分账本变动类型
///
/// 采用复式记账思想，记录用户积分余额的每一次变动
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// 投递入账（+）- 投递审核通过
    DeliveryCredit,
    /// 兑换扣减（-）- 兑换申请成立
    RedemptionDebit,
    /// 兑换退还（+）- 兑换被拒绝或取消
    RedemptionRefund,
    /// 人工调整（±）- 运营后台操作
    Adjustment,
}

impl ChangeType {
    /// 返回该变动类型的数量符号
    /// 正数表示增加，负数表示减少（Adjustment 以金额符号为准）
    pub fn sign(&self) -> i32 {
        match self {
            Self::DeliveryCredit | Self::RedemptionRefund => 1,
            Self::RedemptionDebit => -1,
            Self::Adjustment => 0,
        }
    }
}

/// 账本关联来源类型
///
/// 与 ref_id 一起构成变动的幂等键，用于追溯和防止重复入账
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// 投递流程产生
    Delivery,
    /// 兑换流程产生
    Redemption,
    /// 运营手动操作
    Manual,
}
