use std::collections::{HashMap, HashSet};

use crate::models::{PendingOp, SavingsGoal};

pub fn remove_stale_deletes(goals: Vec<SavingsGoal>) -> Vec<SavingsGoal> {
    goals.into_iter().filter(|g| !g.is_stale_tombstone()).collect()
}

/// Case-insensitive by name, id as tie-break so the order is stable.
pub fn sort_by_name(goals: &mut [SavingsGoal]) {
    goals.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// What the user sees: no tombstones, sorted.
pub fn displayable(goals: Vec<SavingsGoal>) -> Vec<SavingsGoal> {
    let mut visible: Vec<SavingsGoal> = goals.into_iter().filter(|g| !g.deleted).collect();
    sort_by_name(&mut visible);
    visible
}

fn visible_fields_differ(a: &SavingsGoal, b: &SavingsGoal) -> bool {
    a.name != b.name || a.target != b.target || a.deadline_millis != b.deadline_millis
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalMerge {
    pub goals: Vec<SavingsGoal>,
    /// Entries actually changed by the remote list.
    pub applied: usize,
}

/// Three-way merge of the local goal list with the remote one, per goal id.
pub fn merge_goals(local: Vec<SavingsGoal>, remote: &[SavingsGoal]) -> GoalMerge {
    let mut local_by_id: HashMap<String, SavingsGoal> =
        local.into_iter().map(|g| (g.id.clone(), g)).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut result: Vec<SavingsGoal> = Vec::new();
    let mut applied = 0;

    for remote_goal in remote {
        if !seen.insert(remote_goal.id.as_str()) {
            continue;
        }
        let adopted = SavingsGoal {
            pending_op: None,
            ..remote_goal.clone()
        };
        match local_by_id.remove(&remote_goal.id) {
            None => {
                // Never create a tombstone for an id we never had.
                if !remote_goal.deleted {
                    result.push(adopted);
                    applied += 1;
                }
            }
            Some(local_goal) if local_goal.is_dirty() => {
                if remote_goal.updated_at > local_goal.updated_at {
                    if !remote_goal.deleted {
                        result.push(adopted);
                        applied += 1;
                    } else if !local_goal.deleted {
                        applied += 1;
                    }
                } else {
                    result.push(local_goal);
                }
            }
            Some(local_goal) => {
                if remote_goal.deleted {
                    if !local_goal.deleted {
                        applied += 1;
                    }
                } else if remote_goal.updated_at > local_goal.updated_at
                    || visible_fields_differ(remote_goal, &local_goal)
                {
                    result.push(adopted);
                    applied += 1;
                } else {
                    result.push(local_goal);
                }
            }
        }
    }

    // Not yet observed by the server.
    result.extend(local_by_id.into_values().filter(|g| !g.is_stale_tombstone()));

    let mut goals = remove_stale_deletes(result);
    sort_by_name(&mut goals);
    GoalMerge { goals, applied }
}

/// Apply push acknowledgements: clear the pending op, take the server's
/// canonical name/target/timestamp, drop anything acknowledged as deleted.
pub fn apply_acks(current: Vec<SavingsGoal>, acks: &[SavingsGoal]) -> Vec<SavingsGoal> {
    let by_id: HashMap<&str, &SavingsGoal> = acks.iter().map(|a| (a.id.as_str(), a)).collect();
    let known: HashSet<String> = current.iter().map(|g| g.id.clone()).collect();

    let mut updated: Vec<SavingsGoal> = current
        .into_iter()
        .filter_map(|goal| match by_id.get(goal.id.as_str()) {
            None => Some(goal),
            Some(ack) if ack.deleted => None,
            Some(ack) => Some(SavingsGoal {
                name: ack.name.clone(),
                target: ack.target,
                updated_at: ack.updated_at,
                pending_op: None,
                deleted: false,
                ..goal
            }),
        })
        .collect();

    updated.extend(
        acks.iter()
            .filter(|a| !a.deleted && !known.contains(&a.id))
            .map(|a| SavingsGoal {
                pending_op: None,
                ..a.clone()
            }),
    );
    let mut goals = remove_stale_deletes(updated);
    sort_by_name(&mut goals);
    goals
}

/// Re-offer every goal after a bootstrap.
pub fn flag_for_bootstrap(goals: Vec<SavingsGoal>, now: i64) -> Vec<SavingsGoal> {
    goals
        .into_iter()
        .map(|g| SavingsGoal {
            pending_op: Some(PendingOp::for_bootstrap(g.pending_op, g.deleted)),
            updated_at: now,
            ..g
        })
        .collect()
}
