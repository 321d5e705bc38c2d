//! Per-user monthly summary transformation.
//!
//! Reshapes flat timesheet rows into one sheet per user, with hours
//! aggregated by month and project:
//!
//! ```text
//! Flat input (one row per entry)      →  Per-user sheets
//! ┌───────────────────────────────┐      ┌─────────────────────────────────┐
//! │ Alice, Apollo, 2024-01-03, 5h │      │ Sheet "Alice_Beta"              │
//! │ Alice, Hermes, 2024-01-10, 15h│  →   │ Jan-24  Apollo  5.0   25.00%    │
//! │ Bob,   Apollo, 2024-01-04, 8h │      │ Jan-24  Hermes  15.0  75.00%    │
//! └───────────────────────────────┘      ├─────────────────────────────────┤
//!                                        │ Sheet "Bob"                     │
//!                                        │ Jan-24  Apollo  8.0   100.00%   │
//!                                        └─────────────────────────────────┘
//! ```
//!
//! Percentages are fractions of the user's monthly total. A month whose
//! total is zero yields NaN percentages; the division is propagated
//! untouched.

use std::collections::BTreeMap;

use crate::models::{SummaryRow, TimeEntry, UserSheet, NO_PROJECT_LABEL, SHEET_NAME_LIMIT};

/// Build one summary sheet per distinct user, in first-seen order.
pub fn summarize(entries: &[TimeEntry]) -> Vec<UserSheet> {
    distinct_users(entries)
        .into_iter()
        .map(|user| {
            let user_entries: Vec<&TimeEntry> =
                entries.iter().filter(|e| e.user == user).collect();
            UserSheet {
                name: sheet_name(&user, &user_entries),
                rows: summarize_user(&user_entries),
            }
        })
        .collect()
}

/// Distinct users in first-seen order. The order across sheets is not
/// contractual but must be deterministic per run.
fn distinct_users(entries: &[TimeEntry]) -> Vec<String> {
    let mut users: Vec<String> = Vec::new();
    for entry in entries {
        if !users.contains(&entry.user) {
            users.push(entry.user.clone());
        }
    }
    users
}

/// Aggregate one user's entries into summary rows ordered by
/// (month-year label, project).
fn summarize_user(entries: &[&TimeEntry]) -> Vec<SummaryRow> {
    // BTreeMap keys give the lexical (label, project) row order directly
    let mut groups: BTreeMap<(String, String), f64> = BTreeMap::new();
    for entry in entries {
        let project = entry
            .project
            .clone()
            .unwrap_or_else(|| NO_PROJECT_LABEL.to_string());
        *groups.entry((entry.month_label(), project)).or_insert(0.0) += entry.hours;
    }

    let mut month_totals: BTreeMap<String, f64> = BTreeMap::new();
    for ((month, _), hours) in &groups {
        *month_totals.entry(month.clone()).or_insert(0.0) += hours;
    }

    groups
        .into_iter()
        .map(|((month_year, project), total_hours)| {
            // NaN when the month total is zero
            let percentage = total_hours / month_totals[&month_year];
            SummaryRow {
                month_year,
                project,
                total_hours,
                percentage,
            }
        })
        .collect()
}

/// Sheet name: user id plus the sorted distinct organizational units,
/// joined with underscores, hard-truncated to the XLSX limit. Collisions
/// after truncation are not resolved; the writer lets the last one win.
fn sheet_name(user: &str, entries: &[&TimeEntry]) -> String {
    let mut units: Vec<&str> = Vec::new();
    for entry in entries {
        if let Some(unit) = entry.unit.as_deref() {
            if !units.contains(&unit) {
                units.push(unit);
            }
        }
    }
    units.sort_unstable();

    let name = if units.is_empty() {
        user.to_string()
    } else {
        format!("{}_{}", user, units.join("_"))
    };

    name.chars().take(SHEET_NAME_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(user: &str, project: Option<&str>, date: (i32, u32, u32), hours: f64) -> TimeEntry {
        TimeEntry {
            user: user.to_string(),
            project: project.map(String::from),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            hours,
            unit: None,
        }
    }

    fn entry_with_unit(
        user: &str,
        project: Option<&str>,
        date: (i32, u32, u32),
        hours: f64,
        unit: &str,
    ) -> TimeEntry {
        TimeEntry {
            unit: Some(unit.to_string()),
            ..entry(user, project, date, hours)
        }
    }

    #[test]
    fn test_alice_january_percentages() {
        let entries = vec![
            entry("Alice", Some("Project A"), (2024, 1, 3), 5.0),
            entry("Alice", Some("Project B"), (2024, 1, 10), 15.0),
        ];

        let sheets = summarize(&entries);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Alice");

        let rows = &sheets[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month_year, "Jan-24");
        assert_eq!(rows[0].project, "Project A");
        assert_eq!(rows[0].total_hours, 5.0);
        assert!((rows[0].percentage - 0.25).abs() < 1e-9);
        assert_eq!(rows[1].project, "Project B");
        assert_eq!(rows[1].total_hours, 15.0);
        assert!((rows[1].percentage - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_sum_to_one_per_month() {
        let entries = vec![
            entry("Carol", Some("A"), (2024, 3, 1), 3.5),
            entry("Carol", Some("B"), (2024, 3, 2), 1.25),
            entry("Carol", Some("C"), (2024, 3, 3), 7.75),
            entry("Carol", Some("A"), (2024, 4, 1), 2.0),
            entry("Carol", Some("B"), (2024, 4, 2), 6.0),
        ];

        let sheets = summarize(&entries);
        let rows = &sheets[0].rows;

        let mut by_month: std::collections::HashMap<&str, f64> = std::collections::HashMap::new();
        for row in rows {
            *by_month.entry(row.month_year.as_str()).or_insert(0.0) += row.percentage;
        }
        for (month, sum) in by_month {
            assert!((sum - 1.0).abs() < 1e-9, "month {month} sums to {sum}");
        }
    }

    #[test]
    fn test_missing_project_gets_sentinel() {
        let entries = vec![entry("Dave", None, (2024, 2, 5), 4.0)];

        let sheets = summarize(&entries);
        assert_eq!(sheets[0].rows[0].project, NO_PROJECT_LABEL);
        assert!((sheets[0].rows[0].percentage - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_project_hours_accumulate() {
        let entries = vec![
            entry("Eve", Some("A"), (2024, 1, 2), 2.0),
            entry("Eve", Some("A"), (2024, 1, 9), 3.0),
            entry("Eve", Some("A"), (2024, 1, 16), 5.0),
        ];

        let rows = &summarize(&entries)[0].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_hours, 10.0);
    }

    #[test]
    fn test_zero_month_total_propagates_nan() {
        let entries = vec![
            entry("Frank", Some("A"), (2024, 1, 2), 0.0),
            entry("Frank", Some("B"), (2024, 1, 3), 0.0),
        ];

        let rows = &summarize(&entries)[0].rows;
        assert!(rows[0].percentage.is_nan());
        assert!(rows[1].percentage.is_nan());
    }

    #[test]
    fn test_sheet_name_with_sorted_units() {
        let entries = vec![
            entry_with_unit("Greg", Some("A"), (2024, 1, 2), 1.0, "Zeta"),
            entry_with_unit("Greg", Some("A"), (2024, 1, 3), 1.0, "Alpha"),
            entry_with_unit("Greg", Some("A"), (2024, 1, 4), 1.0, "Zeta"),
        ];

        let sheets = summarize(&entries);
        assert_eq!(sheets[0].name, "Greg_Alpha_Zeta");
    }

    #[test]
    fn test_sheet_name_truncated_to_31_chars() {
        let entries = vec![entry_with_unit(
            "Hannah-Alexandra",
            Some("A"),
            (2024, 1, 2),
            1.0,
            "Very Long Company Name Sp. z o.o.",
        )];

        let sheets = summarize(&entries);
        assert_eq!(sheets[0].name.chars().count(), 31);
        assert!(sheets[0].name.starts_with("Hannah-Alexandra_Very"));
    }

    #[test]
    fn test_users_in_first_seen_order() {
        let entries = vec![
            entry("Zoe", Some("A"), (2024, 1, 2), 1.0),
            entry("Adam", Some("A"), (2024, 1, 2), 1.0),
            entry("Zoe", Some("B"), (2024, 1, 3), 1.0),
        ];

        let sheets = summarize(&entries);
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zoe", "Adam"]);
    }

    #[test]
    fn test_rows_ordered_by_label_then_project() {
        // Lexical label order: Apr-24 sorts before Jan-24
        let entries = vec![
            entry("Ivy", Some("B"), (2024, 1, 2), 1.0),
            entry("Ivy", Some("A"), (2024, 1, 3), 1.0),
            entry("Ivy", Some("A"), (2024, 4, 4), 1.0),
        ];

        let rows = &summarize(&entries)[0].rows;
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.month_year.as_str(), r.project.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("Apr-24", "A"), ("Jan-24", "A"), ("Jan-24", "B")]
        );
    }
}
