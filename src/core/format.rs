use super::types::{Plan, PlanLine};

pub fn rate_line(rate: f64) -> String {
    format!("1 : {rate:.2}")
}

pub fn plan_line(line: &PlanLine) -> String {
    format!(
        "{} : {} ({})",
        line.name,
        line.count,
        line.contribution().round() as i64
    )
}

pub fn plan_summary(plan: &Plan) -> [String; 2] {
    [
        format!("total tera : {}", plan.total_tera.round() as i64),
        format!("total cost : {} won", plan.total_cost.round() as i64),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scenario;

    fn sample_line() -> PlanLine {
        PlanLine {
            item_id: 1,
            name: "Bind Cube".to_string(),
            cash: 1_000.0,
            rate: 9.0,
            count: 2,
        }
    }

    #[test]
    fn rate_line_keeps_two_decimals() {
        assert_eq!(rate_line(9.0), "1 : 9.00");
        assert_eq!(rate_line(8.549), "1 : 8.55");
        assert_eq!(rate_line(3.6), "1 : 3.60");
    }

    #[test]
    fn plan_line_rounds_the_contribution() {
        assert_eq!(plan_line(&sample_line()), "Bind Cube : 2 (18)");

        let mut fractional = sample_line();
        fractional.rate = 3.6;
        fractional.count = 1;
        assert_eq!(plan_line(&fractional), "Bind Cube : 1 (4)");
    }

    #[test]
    fn plan_summary_rounds_both_totals() {
        let plan = Plan {
            scenario: Scenario::Current,
            lines: vec![sample_line()],
            total_tera: 21.6,
            total_cost: 4_500.0,
        };
        let [tera, cost] = plan_summary(&plan);
        assert_eq!(tera, "total tera : 22");
        assert_eq!(cost, "total cost : 4500 won");
    }

    #[test]
    fn empty_plan_summary_shows_zero_totals() {
        let plan = Plan::empty(Scenario::Minus5);
        let [tera, cost] = plan_summary(&plan);
        assert_eq!(tera, "total tera : 0");
        assert_eq!(cost, "total cost : 0 won");
    }
}
