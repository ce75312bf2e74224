use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Scenario {
    Minus5,
    Current,
    Plus5,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Current, Scenario::Plus5, Scenario::Minus5];
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldQuote {
    pub minus5: f64,
    pub current: f64,
    pub plus5: f64,
}

impl YieldQuote {
    pub fn rate(self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Minus5 => self.minus5,
            Scenario::Current => self.current,
            Scenario::Plus5 => self.plus5,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ExchangeConfig {
    pub fee_rate: f64,
    pub price_tick: f64,
}

#[derive(Clone, Debug)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub cash: f64,
    pub limit: Option<u64>,
    pub rates: Option<YieldQuote>,
}

impl Item {
    pub fn new(id: u32, name: impl Into<String>, cash: f64, limit: Option<u64>) -> Self {
        Self {
            id,
            name: name.into(),
            cash,
            limit,
            rates: None,
        }
    }

    pub fn rate(&self, scenario: Scenario) -> Option<f64> {
        self.rates
            .map(|quote| quote.rate(scenario))
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub items: Vec<Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn item(&self, id: u32) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub(crate) fn item_mut(&mut self, id: u32) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLine {
    pub item_id: u32,
    pub name: String,
    pub cash: f64,
    pub rate: f64,
    pub count: u64,
}

impl PlanLine {
    pub fn contribution(&self) -> f64 {
        self.count as f64 * self.rate
    }

    pub fn cost(&self) -> f64 {
        self.count as f64 * self.cash
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub scenario: Scenario,
    pub lines: Vec<PlanLine>,
    pub total_tera: f64,
    pub total_cost: f64,
}

impl Plan {
    pub fn empty(scenario: Scenario) -> Self {
        Self {
            scenario,
            lines: Vec::new(),
            total_tera: 0.0,
            total_cost: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
