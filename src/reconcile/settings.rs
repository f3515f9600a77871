use crate::language;
use crate::models::{defaults, BalanceBaseline, SettingsSnapshot};

/// Trimmed, non-blank, first occurrence wins.
pub fn sanitize_categories(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let trimmed = name.trim();
        if !trimmed.is_empty() && !out.iter().any(|c| c == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Negative or non-finite budgets clear the budget.
pub fn sanitize_budget(budget: Option<f64>) -> Option<f64> {
    budget.filter(|b| b.is_finite() && *b >= 0.0)
}

pub fn clamp_cycle_day(day: i64) -> u32 {
    day.clamp(1, 31) as u32
}

/// Legacy configs stored the last day of the cycle instead of the first.
pub fn cycle_end_to_start(end_day: i64) -> u32 {
    if end_day <= 0 || end_day >= 31 {
        1
    } else {
        (end_day + 1).min(31) as u32
    }
}

/// A remote baseline is kept only when both parts are usable.
pub fn sanitize_remote_baseline(baseline: Option<BalanceBaseline>) -> Option<BalanceBaseline> {
    baseline.filter(|b| b.amount.is_finite() && b.amount >= 0.0 && b.date_millis > 0)
}

fn or_default(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitize every field of a remote snapshot independently. The result is clean.
pub fn sanitize_remote(remote: &SettingsSnapshot) -> SettingsSnapshot {
    SettingsSnapshot {
        language: language::sanitize(&remote.language),
        currency: or_default(&remote.currency, defaults::CURRENCY),
        expense_categories: sanitize_categories(&remote.expense_categories),
        income_categories: sanitize_categories(&remote.income_categories),
        budget_monthly: sanitize_budget(remote.budget_monthly),
        budget_cycle_start_day: clamp_cycle_day(remote.budget_cycle_start_day as i64),
        theme_mode: or_default(&remote.theme_mode, defaults::THEME_MODE),
        accent_color: or_default(&remote.accent_color, defaults::ACCENT_COLOR),
        balance_baseline: sanitize_remote_baseline(remote.balance_baseline),
        updated_at: remote.updated_at,
        dirty: false,
    }
}

/// Whether a fetched remote snapshot may replace local settings.
///
/// A dirty local snapshot always blocks. Two never-synced snapshots (both at
/// the zero sentinel) always apply. Otherwise remote must be strictly newer.
pub fn should_apply(local: &SettingsSnapshot, remote: &SettingsSnapshot) -> bool {
    if local.dirty {
        return false;
    }
    if local.updated_at == 0 && remote.updated_at == 0 {
        return true;
    }
    remote.updated_at > local.updated_at
}
