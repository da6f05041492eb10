//! Nutrition statistics: pure reductions over the record set.
//!
//! Records are bucketed by UTC calendar date of their capture timestamp.
//! Nothing here is persisted; every aggregate is recomputed on demand.

pub mod handlers;

use chrono::{DateTime, Duration, NaiveDate};
use serde::Serialize;

use crate::models::record::{FoodRecord, Macronutrients};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_calories: i64,
    pub meal_count: usize,
    pub avg_calories_per_meal: i64,
    pub macronutrients: Macronutrients,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_calories: i64,
    pub avg_daily_calories: i64,
    pub daily_stats: Vec<DailyStats>,
    pub macronutrients: Macronutrients,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Under,
    Met,
    Over,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub percentage: i64,
    pub remaining: i64,
    pub status: GoalStatus,
}

fn record_date(timestamp_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|dt| dt.date_naive())
}

fn add(acc: Macronutrients, m: &Macronutrients) -> Macronutrients {
    Macronutrients {
        carbs: acc.carbs + m.carbs,
        protein: acc.protein + m.protein,
        fat: acc.fat + m.fat,
        sugar: acc.sugar + m.sugar,
    }
}

/// Sums calories and macronutrients over the records captured on `date`.
/// Mean calories per meal is rounded, and zero when there are no meals.
pub fn calculate_daily_stats(records: &[FoodRecord], date: NaiveDate) -> DailyStats {
    let mut total_calories = 0_i64;
    let mut meal_count = 0_usize;
    let mut macronutrients = Macronutrients::default();

    for record in records
        .iter()
        .filter(|r| record_date(r.timestamp) == Some(date))
    {
        total_calories += record.calories;
        meal_count += 1;
        macronutrients = add(macronutrients, &record.macronutrients);
    }

    let avg_calories_per_meal = if meal_count > 0 {
        (total_calories as f64 / meal_count as f64).round() as i64
    } else {
        0
    };

    DailyStats {
        date,
        total_calories,
        meal_count,
        avg_calories_per_meal,
        macronutrients,
    }
}

/// Aggregates the trailing 7 days, inclusive of `today`.
pub fn calculate_weekly_stats(records: &[FoodRecord], today: NaiveDate) -> WeeklyStats {
    let start_date = today - Duration::days(6);

    let daily_stats: Vec<DailyStats> = (0..7)
        .map(|i| calculate_daily_stats(records, start_date + Duration::days(i)))
        .collect();

    let total_calories: i64 = daily_stats.iter().map(|d| d.total_calories).sum();
    let avg_daily_calories = (total_calories as f64 / 7.0).round() as i64;
    let macronutrients = daily_stats
        .iter()
        .fold(Macronutrients::default(), |acc, d| {
            add(acc, &d.macronutrients)
        });

    WeeklyStats {
        start_date,
        end_date: today,
        total_calories,
        avg_daily_calories,
        daily_stats,
        macronutrients,
    }
}

/// Goal attainment: `percentage = round(current / goal * 100)`,
/// under below 90, met from 90 through 110 inclusive, over above.
/// A non-positive goal reports 0% rather than dividing by zero; the
/// settings layer rejects such goals at write time.
pub fn calculate_goal_progress(current_calories: i64, goal_calories: i64) -> GoalProgress {
    if goal_calories <= 0 {
        return GoalProgress {
            percentage: 0,
            remaining: goal_calories - current_calories,
            status: GoalStatus::Under,
        };
    }

    let percentage = (current_calories as f64 / goal_calories as f64 * 100.0).round() as i64;
    let status = if percentage < 90 {
        GoalStatus::Under
    } else if percentage <= 110 {
        GoalStatus::Met
    } else {
        GoalStatus::Over
    };

    GoalProgress {
        percentage,
        remaining: goal_calories - current_calories,
        status,
    }
}
