use std::cmp::Ordering;

use serde::Serialize;

use super::types::{Item, Plan, PlanLine, Scenario};

#[derive(Copy, Clone, Debug)]
struct Eligible<'a> {
    item: &'a Item,
    rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickEstimate {
    pub item_id: u32,
    pub name: String,
    pub minus5_cost: f64,
    pub current_cost: f64,
    pub plus5_cost: f64,
}

pub fn allocate(items: &[Item], target: f64, scenario: Scenario) -> Plan {
    let mut plan = Plan::empty(scenario);
    if !target.is_finite() || target <= 0.0 {
        return plan;
    }

    let eligible = eligible_items(items, scenario);
    if eligible.is_empty() {
        return plan;
    }

    // Stable sort: catalog order survives for equal rates.
    let mut by_rate = eligible.clone();
    by_rate.sort_by(|a, b| b.rate.total_cmp(&a.rate));

    let mut lines: Vec<PlanLine> = Vec::new();
    let mut remaining = target;
    for entry in &by_rate {
        if remaining <= 0.0 {
            break;
        }
        let affordable = (remaining / entry.rate).floor() as u64;
        let count = entry
            .item
            .limit
            .map_or(affordable, |limit| limit.min(affordable));
        if count > 0 {
            remaining -= count as f64 * entry.rate;
            lines.push(line_for(entry, count));
        }
    }

    if remaining > 0.0 {
        if let Some(extra) = best_top_up(&eligible, &lines, remaining) {
            match lines.iter_mut().find(|line| line.item_id == extra.item_id) {
                Some(line) => line.count += extra.count,
                None => lines.push(extra),
            }
        }
    }

    lines.sort_by(|a, b| b.contribution().total_cmp(&a.contribution()));
    plan.total_tera = lines.iter().map(PlanLine::contribution).sum();
    plan.total_cost = lines.iter().map(PlanLine::cost).sum();
    plan.lines = lines;
    plan
}

pub fn quick_estimate(items: &[Item], target: f64) -> Option<QuickEstimate> {
    if !target.is_finite() || target <= 0.0 {
        return None;
    }

    let mut best: Option<(&Item, f64)> = None;
    for item in items {
        let Some(rate) = item.rate(Scenario::Current) else {
            continue;
        };
        // Strict comparison keeps the first catalog entry on ties.
        if best.is_none_or(|(_, best_rate)| rate > best_rate) {
            best = Some((item, rate));
        }
    }

    let (item, _) = best?;
    let rates = item.rates?;
    Some(QuickEstimate {
        item_id: item.id,
        name: item.name.clone(),
        minus5_cost: target / rates.minus5 * item.cash,
        current_cost: target / rates.current * item.cash,
        plus5_cost: target / rates.plus5 * item.cash,
    })
}

fn eligible_items(items: &[Item], scenario: Scenario) -> Vec<Eligible<'_>> {
    items
        .iter()
        .filter_map(|item| item.rate(scenario).map(|rate| Eligible { item, rate }))
        .collect()
}

fn line_for(entry: &Eligible<'_>, count: u64) -> PlanLine {
    PlanLine {
        item_id: entry.item.id,
        name: entry.item.name.clone(),
        cash: entry.item.cash,
        rate: entry.rate,
        count,
    }
}

fn best_top_up(
    eligible: &[Eligible<'_>],
    lines: &[PlanLine],
    shortfall: f64,
) -> Option<PlanLine> {
    let mut best: Option<(f64, f64, PlanLine)> = None;
    for entry in eligible {
        let used = lines
            .iter()
            .find(|line| line.item_id == entry.item.id)
            .map_or(0, |line| line.count);
        let needed = (shortfall / entry.rate).ceil() as u64;
        if needed == 0 {
            continue;
        }
        if let Some(limit) = entry.item.limit {
            if limit.saturating_sub(used) < needed {
                continue;
            }
        }

        let overshoot = needed as f64 * entry.rate - shortfall;
        let cost = needed as f64 * entry.item.cash;
        let improves = match &best {
            None => true,
            Some((best_overshoot, best_cost, _)) => match overshoot.total_cmp(best_overshoot) {
                Ordering::Less => true,
                Ordering::Equal => cost < *best_cost,
                Ordering::Greater => false,
            },
        };
        if improves {
            best = Some((overshoot, cost, line_for(entry, needed)));
        }
    }
    best.map(|(_, _, line)| line)
}
