use crate::models::{JournalEntry, Mood, MoodBadge, MoodChartPoint};
use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCount {
    pub week: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodStats {
    pub total: usize,
    pub frequent_mood: Option<Mood>,
    pub weekly: Vec<WeeklyCount>,
    pub streak: u32,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: MoodStats,
    pub frequent_mood: Option<MoodBadge>,
    pub chart: Vec<MoodChartPoint>,
}

pub fn build_stats(entries: &[JournalEntry]) -> MoodStats {
    build_stats_in(entries, &Local)
}

/// Aggregates entries using calendar days of `tz`.
pub fn build_stats_in<Tz: TimeZone>(entries: &[JournalEntry], tz: &Tz) -> MoodStats {
    if entries.is_empty() {
        return MoodStats {
            total: 0,
            frequent_mood: None,
            weekly: Vec::new(),
            streak: 0,
        };
    }

    let days: Vec<NaiveDate> = entries
        .iter()
        .map(|entry| entry.created_at.with_timezone(tz).date_naive())
        .collect();

    MoodStats {
        total: entries.len(),
        frequent_mood: frequent_mood(entries),
        weekly: weekly_counts(&days),
        streak: longest_streak(&days),
    }
}

pub fn build_dashboard(entries: &[JournalEntry]) -> DashboardResponse {
    let stats = build_stats(entries);
    let chart = entries
        .iter()
        .map(|entry| MoodChartPoint {
            date: date_key(entry.created_at.with_timezone(&Local).date_naive()),
            mood: entry.mood,
        })
        .collect();

    DashboardResponse {
        frequent_mood: stats.frequent_mood.map(MoodBadge::from),
        stats,
        chart,
    }
}

// Ties resolve to the lowest mood code.
fn frequent_mood(entries: &[JournalEntry]) -> Option<Mood> {
    let mut counts: BTreeMap<Mood, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.mood).or_default() += 1;
    }

    let mut sorted: Vec<(Mood, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.first().map(|(mood, _)| *mood)
}

fn weekly_counts(days: &[NaiveDate]) -> Vec<WeeklyCount> {
    let mut weekly: Vec<WeeklyCount> = Vec::new();
    for day in days {
        let label = week_label(*day);
        match weekly.iter_mut().find(|bucket| bucket.week == label) {
            Some(bucket) => bucket.count += 1,
            None => weekly.push(WeeklyCount {
                week: label,
                count: 1,
            }),
        }
    }
    weekly
}

fn longest_streak(days: &[NaiveDate]) -> u32 {
    let distinct: BTreeSet<NaiveDate> = days.iter().copied().collect();

    let mut longest = 0u32;
    let mut current = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for day in distinct {
        current = match previous {
            Some(prev) if day - prev == Duration::days(1) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
