//! 内存仓储
//!
//! 基于 DashMap 实现全部仓储接口，用于本地开发和路由级测试。
//! 原子操作通过持有用户条目的写锁完成，多条目加锁顺序为先用户后奖品

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::traits::{
    LeaderboardRepositoryTrait, PointsRepositoryTrait, RedemptionRepositoryTrait,
    RewardRepositoryTrait, UserRepositoryTrait,
};
use crate::error::{GamificationError, Result};
use crate::models::{
    AwardRecord, CategoryPoints, EventCategory, LeaderboardEntry, NewPointsHistory,
    NewRedemption, NewReward, NewUser, PointsHistory, Redemption, RedemptionStatus, Reward,
    Standing, User, rank_standings, ranking_order,
};

/// 内存仓储
#[derive(Debug)]
pub struct InMemoryRepository {
    users: DashMap<String, User>,
    history: DashMap<String, Vec<PointsHistory>>,
    category_points: DashMap<(String, EventCategory), CategoryPoints>,
    rewards: DashMap<i64, Reward>,
    redemptions: DashMap<i64, Redemption>,
    idempotency_keys: DashMap<String, i64>,
    leaderboard: DashMap<String, Standing>,
    next_history_id: AtomicI64,
    next_reward_id: AtomicI64,
    next_redemption_id: AtomicI64,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            history: DashMap::new(),
            category_points: DashMap::new(),
            rewards: DashMap::new(),
            redemptions: DashMap::new(),
            idempotency_keys: DashMap::new(),
            leaderboard: DashMap::new(),
            next_history_id: AtomicI64::new(1),
            next_reward_id: AtomicI64::new(1),
            next_redemption_id: AtomicI64::new(1),
        }
    }

    fn next_id(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::SeqCst)
    }

    fn sorted_standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> =
            self.leaderboard.iter().map(|e| e.value().clone()).collect();
        standings.sort_by(ranking_order);
        standings
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        match self.users.entry(user.user_id.clone()) {
            Entry::Occupied(_) => Err(GamificationError::UserAlreadyExists(user.user_id.clone())),
            Entry::Vacant(slot) => {
                let created = user.clone().into_user(Utc::now());
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }
}

#[async_trait]
impl PointsRepositoryTrait for InMemoryRepository {
    async fn has_attended_event(&self, user_id: &str, event_id: &str) -> Result<bool> {
        Ok(self
            .history
            .get(user_id)
            .is_some_and(|entries| entries.value().iter().any(|e| e.event_id == event_id)))
    }

    async fn record_award(&self, award: &NewPointsHistory) -> Result<AwardRecord> {
        let mut user = self
            .users
            .get_mut(&award.user_id)
            .ok_or_else(|| GamificationError::UserNotFound(award.user_id.clone()))?;

        let entry = award
            .clone()
            .with_id(Self::next_id(&self.next_history_id));
        self.history
            .entry(award.user_id.clone())
            .or_default()
            .push(entry.clone());

        let points = i64::from(award.points);
        user.balance += points;
        user.lifetime_points += points;
        if !user.attended_categories.contains(&award.category) {
            user.attended_categories.push(award.category);
        }
        user.updated_at = Utc::now();

        self.category_points
            .entry((award.user_id.clone(), award.category))
            .and_modify(|totals| {
                totals.total_points += points;
                totals.award_count += 1;
                totals.last_awarded_at = award.awarded_at;
            })
            .or_insert_with(|| CategoryPoints {
                user_id: award.user_id.clone(),
                category: award.category,
                total_points: points,
                award_count: 1,
                last_awarded_at: award.awarded_at,
            });

        Ok(AwardRecord {
            entry,
            balance: user.balance,
            lifetime_points: user.lifetime_points,
        })
    }

    async fn list_history(&self, user_id: &str, limit: i64) -> Result<Vec<PointsHistory>> {
        let mut entries = self
            .history
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.awarded_at.cmp(&a.awarded_at).then(b.id.cmp(&a.id)));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn list_category_totals(&self, user_id: &str) -> Result<Vec<CategoryPoints>> {
        let mut totals: Vec<CategoryPoints> = self
            .category_points
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .collect();
        totals.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then(a.category.cmp(&b.category))
        });
        Ok(totals)
    }
}

#[async_trait]
impl RewardRepositoryTrait for InMemoryRepository {
    async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        let now = Utc::now();
        let created = Reward {
            id: Self::next_id(&self.next_reward_id),
            name: reward.name.clone(),
            description: reward.description.clone(),
            cost: reward.cost,
            available: reward.available,
            stock: reward.stock,
            created_at: now,
            updated_at: now,
        };
        self.rewards.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        Ok(self.rewards.get(&id).map(|r| r.value().clone()))
    }

    async fn list_rewards(&self, only_available: bool) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| !only_available || r.available)
            .map(|r| r.value().clone())
            .collect();
        rewards.sort_by(|a, b| a.cost.cmp(&b.cost).then(a.id.cmp(&b.id)));
        Ok(rewards)
    }

    async fn update_availability(&self, id: i64, available: bool) -> Result<Option<Reward>> {
        Ok(self.rewards.get_mut(&id).map(|mut reward| {
            reward.available = available;
            reward.updated_at = Utc::now();
            reward.value().clone()
        }))
    }
}

#[async_trait]
impl RedemptionRepositoryTrait for InMemoryRepository {
    async fn get_by_idempotency_key(&self, idempotency_key: &str) -> Result<Option<Redemption>> {
        let Some(id) = self.idempotency_keys.get(idempotency_key).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.redemptions.get(&id).map(|r| r.value().clone()))
    }

    async fn create_redemption(&self, redemption: &NewRedemption) -> Result<Redemption> {
        let mut user = self
            .users
            .get_mut(&redemption.user_id)
            .ok_or_else(|| GamificationError::UserNotFound(redemption.user_id.clone()))?;
        let mut reward = self
            .rewards
            .get_mut(&redemption.reward_id)
            .ok_or(GamificationError::RewardNotFound(redemption.reward_id))?;

        if let Some(key) = &redemption.idempotency_key {
            if self.idempotency_keys.contains_key(key) {
                return Err(GamificationError::DuplicateRedemption(key.clone()));
            }
        }

        if !reward.available {
            return Err(GamificationError::RewardUnavailable(reward.id));
        }
        if !reward.has_stock() {
            return Err(GamificationError::RewardOutOfStock(reward.id));
        }
        if user.balance < reward.cost {
            return Err(GamificationError::InsufficientPoints {
                required: reward.cost,
                available: user.balance,
            });
        }

        let id = Self::next_id(&self.next_redemption_id);
        if let Some(key) = &redemption.idempotency_key {
            match self.idempotency_keys.entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(GamificationError::DuplicateRedemption(key.clone()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        let now = Utc::now();
        if let Some(stock) = reward.stock.as_mut() {
            *stock -= 1;
        }
        reward.updated_at = now;
        user.balance -= reward.cost;
        user.updated_at = now;

        let created = Redemption {
            id,
            redemption_no: redemption.redemption_no.clone(),
            user_id: redemption.user_id.clone(),
            reward_id: reward.id,
            reward_name: reward.name.clone(),
            cost: reward.cost,
            status: RedemptionStatus::Pending,
            idempotency_key: redemption.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };
        self.redemptions.insert(id, created.clone());
        Ok(created)
    }

    async fn get_redemption(&self, id: i64) -> Result<Option<Redemption>> {
        Ok(self.redemptions.get(&id).map(|r| r.value().clone()))
    }

    async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Redemption>> {
        let mut redemptions: Vec<Redemption> = self
            .redemptions
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        redemptions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        redemptions.truncate(limit.max(0) as usize);
        Ok(redemptions)
    }

    async fn update_status(
        &self,
        id: i64,
        from: RedemptionStatus,
        to: RedemptionStatus,
    ) -> Result<Option<Redemption>> {
        let Some(mut redemption) = self.redemptions.get_mut(&id) else {
            return Ok(None);
        };
        if redemption.status != from {
            return Ok(None);
        }
        redemption.status = to;
        redemption.updated_at = Utc::now();
        Ok(Some(redemption.value().clone()))
    }
}

#[async_trait]
impl LeaderboardRepositoryTrait for InMemoryRepository {
    async fn upsert_standing(
        &self,
        user_id: &str,
        display_name: &str,
        total_points: i64,
    ) -> Result<()> {
        let now = Utc::now();
        self.leaderboard
            .entry(user_id.to_string())
            .and_modify(|standing| {
                standing.display_name = display_name.to_string();
                standing.total_points = standing.total_points.max(total_points);
                standing.updated_at = now;
            })
            .or_insert_with(|| Standing {
                user_id: user_id.to_string(),
                display_name: display_name.to_string(),
                total_points,
                updated_at: now,
            });
        Ok(())
    }

    async fn list_standings(&self, limit: i64, offset: i64) -> Result<Vec<Standing>> {
        Ok(self
            .sorted_standings()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_standings(&self) -> Result<i64> {
        Ok(self.leaderboard.len() as i64)
    }

    async fn find_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>> {
        Ok(rank_standings(self.sorted_standings(), 0)
            .into_iter()
            .find(|e| e.user_id == user_id))
    }

    async fn rebuild(&self) -> Result<u64> {
        // 先汇总流水并释放锁，再读取用户，与发放时的加锁顺序保持一致
        let totals: Vec<(String, i64)> = self
            .history
            .iter()
            .filter(|entries| !entries.value().is_empty())
            .map(|entries| {
                let sum: i64 = entries.value().iter().map(|e| i64::from(e.points)).sum();
                (entries.key().clone(), sum)
            })
            .collect();

        let now = Utc::now();
        let rebuilt: Vec<Standing> = totals
            .into_iter()
            .filter_map(|(user_id, total_points)| {
                let display_name = self.users.get(&user_id)?.display_name.clone();
                Some(Standing {
                    user_id,
                    display_name,
                    total_points,
                    updated_at: now,
                })
            })
            .collect();

        self.leaderboard.clear();
        let count = rebuilt.len() as u64;
        for standing in rebuilt {
            self.leaderboard.insert(standing.user_id.clone(), standing);
        }
        Ok(count)
    }
}
