//! 奖励实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RewardCategory;

/// 不限量库存哨兵值
///
/// quantity 为该值时表示库存无限，预占/释放均不修改数量
pub const UNLIMITED_STOCK: i64 = -1;

/// 可兑换奖励
///
/// `quantity` 为剩余库存，兑换申请成立时原子减一、
/// 兑换失败补偿时原子加一；-1 表示不限量
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    /// 奖励标题
    pub title: String,
    /// 奖励描述
    pub description: String,
    /// 奖励分类
    pub category: RewardCategory,
    /// 兑换所需积分
    pub cost_points: i64,
    /// 等价货币价值（展示用）
    pub monetary_value: f64,
    /// 展示图片 URL
    #[sqlx(default)]
    pub image_url: Option<String>,
    /// 剩余库存（-1 表示不限量）
    pub quantity: i64,
    /// 是否上架
    pub active: bool,
    /// 兑换条件说明（JSON 数组）
    pub requirements: serde_json::Value,
    /// 有效期开始（null 表示立即生效）
    #[sqlx(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// 有效期结束（null 表示长期有效）
    #[sqlx(default)]
    pub valid_until: Option<DateTime<Utc>>,
    /// 创建人 ID
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// 检查是否有库存
    pub fn has_stock(&self) -> bool {
        self.quantity == UNLIMITED_STOCK || self.quantity > 0
    }

    /// 是否不限量
    pub fn is_unlimited(&self) -> bool {
        self.quantity == UNLIMITED_STOCK
    }

    /// 检查指定时刻是否在有效期窗口内（左闭右开）
    pub fn is_within_validity(&self, now: DateTime<Utc>) -> bool {
        let after_start = self.valid_from.map(|from| now >= from).unwrap_or(true);
        let before_end = self.valid_until.map(|until| now < until).unwrap_or(true);
        after_start && before_end
    }

    /// 检查当前是否可兑换（上架 + 有效期内 + 有库存）
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.active && self.is_within_validity(now) && self.has_stock()
    }
}

/// 奖励更新字段（None 表示不修改）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<RewardCategory>,
    pub cost_points: Option<i64>,
    pub monetary_value: Option<f64>,
    pub image_url: Option<String>,
    pub quantity: Option<i64>,
    pub requirements: Option<serde_json::Value>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_reward(quantity: i64) -> Reward {
        Reward {
            id: "r-1".to_string(),
            title: "市政泳池月票".to_string(),
            description: "30 天免费使用市政泳池".to_string(),
            category: RewardCategory::Sports,
            cost_points: 500,
            monetary_value: 25.0,
            image_url: None,
            quantity,
            active: true,
            requirements: serde_json::json!([]),
            valid_from: None,
            valid_until: None,
            created_by: "admin-1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_stock() {
        assert!(sample_reward(3).has_stock());
        assert!(sample_reward(UNLIMITED_STOCK).has_stock());
        assert!(!sample_reward(0).has_stock());
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut reward = sample_reward(1);
        assert!(reward.is_within_validity(now));

        reward.valid_from = Some(now + Duration::days(1));
        assert!(!reward.is_within_validity(now));

        reward.valid_from = Some(now - Duration::days(1));
        reward.valid_until = Some(now - Duration::hours(1));
        assert!(!reward.is_within_validity(now));

        // 截止时刻本身已过期（右开区间）
        reward.valid_until = Some(now);
        assert!(!reward.is_within_validity(now));

        reward.valid_until = Some(now + Duration::hours(1));
        assert!(reward.is_within_validity(now));
    }

    #[test]
    fn test_is_redeemable() {
        let now = Utc::now();
        let mut reward = sample_reward(1);
        assert!(reward.is_redeemable(now));

        reward.active = false;
        assert!(!reward.is_redeemable(now));

        reward.active = true;
        reward.quantity = 0;
        assert!(!reward.is_redeemable(now));
    }
}
