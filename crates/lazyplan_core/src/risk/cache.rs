//! Time-bounded cache of risk assessments keyed by goal id.

use crate::model::EntityId;
use crate::risk::predictor::GoalRiskAssessment;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AssessmentCache {
    ttl: Duration,
    entries: HashMap<EntityId, GoalRiskAssessment>,
}

impl AssessmentCache {
    /// Non-positive `ttl_seconds` disables caching.
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl: Duration::try_seconds(ttl_seconds.max(0)).unwrap_or_else(Duration::zero),
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh entry for `goal_id`, if any.
    pub fn get(&self, goal_id: &EntityId, now: DateTime<Utc>) -> Option<&GoalRiskAssessment> {
        self.entries
            .get(goal_id)
            .filter(|assessment| self.is_fresh(assessment, now))
    }

    /// Returns the cached assessment or computes and stores a new one.
    pub fn get_or_assess<F>(
        &mut self,
        goal_id: EntityId,
        now: DateTime<Utc>,
        assess: F,
    ) -> GoalRiskAssessment
    where
        F: FnOnce() -> GoalRiskAssessment,
    {
        if let Some(hit) = self.get(&goal_id, now) {
            debug!("event=risk_cache module=risk status=hit goal_id={goal_id}");
            return hit.clone();
        }
        let assessment = assess();
        debug!("event=risk_cache module=risk status=miss goal_id={goal_id}");
        if !assessment.fallback && self.ttl > Duration::zero() {
            self.entries.insert(goal_id, assessment.clone());
        }
        assessment
    }

    pub fn invalidate(&mut self, goal_id: &EntityId) -> bool {
        self.entries.remove(goal_id).is_some()
    }

    /// Drops stale entries and returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, assessment| now - assessment.assessed_at < ttl);
        before - self.entries.len()
    }

    fn is_fresh(&self, assessment: &GoalRiskAssessment, now: DateTime<Utc>) -> bool {
        now - assessment.assessed_at < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::AssessmentCache;
    use crate::model::goal::Goal;
    use crate::risk::context::HistoricalData;
    use crate::risk::predictor::RiskPredictor;
    use chrono::{Duration, TimeZone, Utc};
    use std::cell::Cell;

    #[test]
    fn entries_expire_after_ttl() {
        let predictor = RiskPredictor::default();
        let goal = Goal::new("Write a novel");
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let calls = Cell::new(0);
        let mut cache = AssessmentCache::new(900);
        let mut assess = |at| {
            cache.get_or_assess(goal.id, at, || {
                calls.set(calls.get() + 1);
                predictor.assess_goal_risk_at(&goal, &[], &HistoricalData::default(), at)
            })
        };

        assess(now);
        assess(now + Duration::minutes(10));
        assert_eq!(calls.get(), 1);
        assess(now + Duration::minutes(16));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn purge_and_invalidate() {
        let predictor = RiskPredictor::default();
        let goal = Goal::new("Write a novel");
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let mut cache = AssessmentCache::new(900);
        cache.get_or_assess(goal.id, now, || {
            predictor.assess_goal_risk_at(&goal, &[], &HistoricalData::default(), now)
        });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired(now + Duration::minutes(5)), 0);
        assert!(cache.invalidate(&goal.id));
        assert!(cache.is_empty());
    }
}
