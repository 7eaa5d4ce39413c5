//! Preventive rule library: rules grouped by machine model, and per-machine
//! monthly load.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::duration::format_minutes;
use crate::types::DbId;
use crate::workload::{self, FrequencyBucket, MonthlyLoad, RuleFacts, RuleLoad};

/// Label for machines with no model recorded.
pub const NO_MODEL: &str = "(no model)";

/// What the library needs to know about one preventive task row.
pub trait LibraryFacts: RuleFacts {
    fn machine_id(&self) -> DbId;
    fn machine_name(&self) -> &str;
    fn model(&self) -> Option<&str>;
    fn section(&self) -> Option<&str>;
    fn unit(&self) -> Option<&str>;
    fn task(&self) -> &str;
}

/// One distinct rule within a model group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryRule {
    pub task: String,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub frequency_hours: i32,
    pub duration_min: i32,
    pub duration_label: String,
    pub bucket: FrequencyBucket,
    pub runs_per_month: f64,
    /// How many machines of the model carry this rule.
    pub machine_count: usize,
}

/// Rules shared by one machine model. `workload` is the monthly load of the
/// most heavily scheduled machine of that model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelGroup {
    pub model: String,
    pub machines: Vec<String>,
    pub rules: Vec<LibraryRule>,
    pub workload: MonthlyLoad,
}

type RuleKey = (FrequencyBucket, String, Option<String>, Option<String>, i32, i32);

#[derive(Default)]
struct ModelAccumulator {
    machines: Vec<String>,
    rules: BTreeMap<RuleKey, usize>,
    loads: BTreeMap<DbId, Vec<RuleLoad>>,
}

/// Group preventive rows by model. Identical rules on several machines of
/// the same model collapse into one entry. Groups are ordered by model name
/// and rules by frequency bucket, then description.
pub fn group_by_model<R: LibraryFacts>(rows: &[R]) -> Vec<ModelGroup> {
    let mut groups: BTreeMap<String, ModelAccumulator> = BTreeMap::new();

    for row in rows {
        let Some(frequency_hours) = row.frequency_hours().filter(|h| *h > 0) else {
            continue;
        };
        let duration_min = row.duration_min().unwrap_or(0).max(0);
        let model = row.model().unwrap_or(NO_MODEL).to_string();
        let group = groups.entry(model).or_default();

        if !group.machines.iter().any(|m| m == row.machine_name()) {
            group.machines.push(row.machine_name().to_string());
        }
        group
            .loads
            .entry(row.machine_id())
            .or_default()
            .push(RuleLoad {
                frequency_hours,
                duration_min,
            });
        let key = (
            FrequencyBucket::classify(frequency_hours),
            row.task().to_string(),
            row.section().map(str::to_string),
            row.unit().map(str::to_string),
            frequency_hours,
            duration_min,
        );
        *group.rules.entry(key).or_default() += 1;
    }

    groups
        .into_iter()
        .map(|(model, group)| {
            let ModelAccumulator {
                mut machines,
                rules,
                loads,
            } = group;
            machines.sort();
            let rules: Vec<LibraryRule> = rules
                .into_iter()
                .map(
                    |((bucket, task, section, unit, frequency_hours, duration_min), count)| {
                        LibraryRule {
                            task,
                            section,
                            unit,
                            frequency_hours,
                            duration_min,
                            duration_label: format_minutes(Some(duration_min)),
                            bucket,
                            runs_per_month: workload::runs_per_month(frequency_hours),
                            machine_count: count,
                        }
                    },
                )
                .collect();
            let workload = loads
                .values()
                .map(|l| workload::calculate_preventive_monthly_load(l))
                .max_by(|a, b| a.minutes.total_cmp(&b.minutes))
                .unwrap_or_else(|| workload::calculate_preventive_monthly_load::<RuleLoad>(&[]));
            ModelGroup {
                model,
                machines,
                workload,
                rules,
            }
        })
        .collect()
}

/// Monthly preventive load of one machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineLoad {
    pub machine_id: DbId,
    pub machine_name: String,
    pub load: MonthlyLoad,
}

/// Per-machine monthly load, heaviest first.
pub fn load_by_machine<R: LibraryFacts>(rows: &[R]) -> Vec<MachineLoad> {
    let mut by_machine: BTreeMap<DbId, (String, Vec<RuleLoad>)> = BTreeMap::new();
    for row in rows {
        let entry = by_machine
            .entry(row.machine_id())
            .or_insert_with(|| (row.machine_name().to_string(), Vec::new()));
        entry.1.push(RuleLoad {
            frequency_hours: row.frequency_hours().unwrap_or(0),
            duration_min: row.duration_min().unwrap_or(0),
        });
    }
    let mut out: Vec<MachineLoad> = by_machine
        .into_iter()
        .map(|(machine_id, (machine_name, loads))| MachineLoad {
            machine_id,
            machine_name,
            load: workload::calculate_preventive_monthly_load(&loads),
        })
        .collect();
    out.sort_by(|a, b| b.load.minutes.total_cmp(&a.load.minutes));
    out
}
