use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Catalog, ExchangeConfig, Item, Plan, QuickEstimate, Scenario, allocate, parse_amount,
    plan_line, plan_summary, quick_estimate, rate_line,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "tera-exchange",
    about = "Won-to-tera exchange rate calculator and purchase planner"
)]
struct Cli {
    #[arg(long, default_value_t = 10.0, help = "Auction house fee in percent")]
    fee_rate: f64,
    #[arg(long, default_value_t = 5.0, help = "Auction price tick in percent")]
    price_tick: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    fn to_amount(&self) -> Option<f64> {
        match self {
            RawAmount::Number(value) => Some(*value).filter(|value| value.is_finite()),
            RawAmount::Text(raw) => parse_amount(raw),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExchangePayload {
    fee_rate: Option<f64>,
    price_tick: Option<f64>,
    items: Option<Vec<ItemPayload>>,
    auction_prices: Vec<AuctionPriceInput>,
    target: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemPayload {
    id: u32,
    name: String,
    cash: f64,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuctionPriceInput {
    item_id: u32,
    price: Option<RawAmount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogItemView {
    id: u32,
    name: String,
    cash: f64,
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogResponse {
    fee_rate: f64,
    price_tick: f64,
    items: Vec<CatalogItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateRowView {
    item_id: u32,
    name: String,
    cash: f64,
    limit: Option<u64>,
    minus5: Option<f64>,
    current: Option<f64>,
    plus5: Option<f64>,
    minus5_display: Option<String>,
    current_display: Option<String>,
    plus5_display: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanLineView {
    item_id: u32,
    name: String,
    count: u64,
    tera: f64,
    cost: f64,
    display: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanView {
    scenario: Scenario,
    lines: Vec<PlanLineView>,
    total_tera: f64,
    total_cost: f64,
    summary: [String; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResponse {
    fee_rate: f64,
    price_tick: f64,
    rates: Vec<RateRowView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<QuickEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plans: Option<Vec<PlanView>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_cli_for_api() -> Cli {
    Cli {
        fee_rate: 10.0,
        price_tick: 5.0,
    }
}

fn default_catalog() -> Vec<Item> {
    vec![
        Item::new(1, "Bind Cube", 1_000.0, Some(40)),
        Item::new(2, "Catalyst", 2_500.0, Some(30)),
        Item::new(3, "Black Dragon Artifact", 33_000.0, None),
    ]
}

fn build_config(cli: Cli) -> Result<ExchangeConfig, String> {
    if !cli.fee_rate.is_finite() || !(0.0..100.0).contains(&cli.fee_rate) {
        return Err("--fee-rate must be between 0 and 100".to_string());
    }
    if !cli.price_tick.is_finite() || !(0.0..100.0).contains(&cli.price_tick) {
        return Err("--price-tick must be between 0 and 100".to_string());
    }

    Ok(ExchangeConfig {
        fee_rate: cli.fee_rate / 100.0,
        price_tick: cli.price_tick / 100.0,
    })
}

fn build_catalog(payload_items: Option<Vec<ItemPayload>>) -> Result<Catalog, String> {
    let items = match payload_items {
        None => default_catalog(),
        Some(entries) => {
            if entries.is_empty() {
                return Err("items must not be empty".to_string());
            }
            entries
                .into_iter()
                .map(|entry| {
                    if entry.name.trim().is_empty() {
                        return Err(format!("item {} must have a name", entry.id));
                    }
                    if !entry.cash.is_finite() || entry.cash <= 0.0 {
                        return Err(format!("item {} must have a positive cash price", entry.id));
                    }
                    Ok(Item::new(entry.id, entry.name, entry.cash, entry.limit))
                })
                .collect::<Result<Vec<_>, String>>()?
        }
    };

    for (idx, item) in items.iter().enumerate() {
        if items[..idx].iter().any(|other| other.id == item.id) {
            return Err(format!("duplicate item id {}", item.id));
        }
    }

    Ok(Catalog::new(items))
}

fn exchange_response_from_payload(payload: ExchangePayload) -> Result<ExchangeResponse, String> {
    let mut cli = default_cli_for_api();
    if let Some(v) = payload.fee_rate {
        cli.fee_rate = v;
    }
    if let Some(v) = payload.price_tick {
        cli.price_tick = v;
    }
    let config = build_config(cli)?;

    let mut catalog = build_catalog(payload.items)?;
    for input in &payload.auction_prices {
        let price = input.price.as_ref().and_then(RawAmount::to_amount);
        catalog.set_auction_price(input.item_id, price, &config);
    }

    let target = payload.target.as_ref().and_then(RawAmount::to_amount);

    let rates = catalog.items.iter().map(rate_row_view).collect();
    let estimate = target.and_then(|target| quick_estimate(&catalog.items, target));
    let plans = target.map(|target| {
        Scenario::ALL
            .into_iter()
            .map(|scenario| plan_view(allocate(&catalog.items, target, scenario)))
            .collect::<Vec<_>>()
    });

    Ok(ExchangeResponse {
        fee_rate: config.fee_rate,
        price_tick: config.price_tick,
        rates,
        estimate,
        plans,
    })
}

fn rate_row_view(item: &Item) -> RateRowView {
    let rates = item.rates;
    RateRowView {
        item_id: item.id,
        name: item.name.clone(),
        cash: item.cash,
        limit: item.limit,
        minus5: rates.map(|quote| quote.minus5),
        current: rates.map(|quote| quote.current),
        plus5: rates.map(|quote| quote.plus5),
        minus5_display: rates.map(|quote| rate_line(quote.minus5)),
        current_display: rates.map(|quote| rate_line(quote.current)),
        plus5_display: rates.map(|quote| rate_line(quote.plus5)),
    }
}

fn plan_view(plan: Plan) -> PlanView {
    let lines = plan
        .lines
        .iter()
        .map(|line| PlanLineView {
            item_id: line.item_id,
            name: line.name.clone(),
            count: line.count,
            tera: line.contribution(),
            cost: line.cost(),
            display: plan_line(line),
        })
        .collect();

    PlanView {
        scenario: plan.scenario,
        summary: plan_summary(&plan),
        lines,
        total_tera: plan.total_tera,
        total_cost: plan.total_cost,
    }
}

fn build_catalog_response(config: &ExchangeConfig, items: &[Item]) -> CatalogResponse {
    CatalogResponse {
        fee_rate: config.fee_rate,
        price_tick: config.price_tick,
        items: items
            .iter()
            .map(|item| CatalogItemView {
                id: item.id,
                name: item.name.clone(),
                cash: item.cash,
                limit: item.limit,
            })
            .collect(),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/exchange", post(exchange_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Tera exchange planner listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn catalog_handler() -> Response {
    let config = match build_config(default_cli_for_api()) {
        Ok(config) => config,
        Err(msg) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &msg),
    };
    json_response(
        StatusCode::OK,
        build_catalog_response(&config, &default_catalog()),
    )
}

async fn exchange_handler(Json(payload): Json<ExchangePayload>) -> Response {
    match exchange_response_from_payload(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn exchange_response_from_json(json: &str) -> Result<ExchangeResponse, String> {
    let payload = serde_json::from_str::<ExchangePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    exchange_response_from_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn build_config_converts_percent_defaults() {
        let config = build_config(default_cli_for_api()).expect("valid defaults");
        assert_approx(config.fee_rate, 0.10);
        assert_approx(config.price_tick, 0.05);
    }

    #[test]
    fn build_config_rejects_out_of_range_values() {
        let mut cli = default_cli_for_api();
        cli.fee_rate = 120.0;
        assert!(build_config(cli).expect_err("must reject").contains("--fee-rate"));

        let mut cli = default_cli_for_api();
        cli.price_tick = -1.0;
        assert!(
            build_config(cli)
                .expect_err("must reject")
                .contains("--price-tick")
        );
    }

    #[test]
    fn build_catalog_rejects_bad_item_lists() {
        assert!(build_catalog(Some(Vec::new())).is_err());

        let duplicate = vec![
            ItemPayload {
                id: 1,
                name: "A".to_string(),
                cash: 100.0,
                limit: None,
            },
            ItemPayload {
                id: 1,
                name: "B".to_string(),
                cash: 200.0,
                limit: None,
            },
        ];
        assert!(
            build_catalog(Some(duplicate))
                .expect_err("must reject")
                .contains("duplicate item id")
        );

        let zero_cash = vec![ItemPayload {
            id: 1,
            name: "A".to_string(),
            cash: 0.0,
            limit: None,
        }];
        assert!(
            build_catalog(Some(zero_cash))
                .expect_err("must reject")
                .contains("positive cash price")
        );
    }

    #[test]
    fn default_catalog_passes_validation() {
        let catalog = build_catalog(None).expect("default catalog is valid");
        assert_eq!(catalog.items.len(), 3);
        assert!(catalog.items.iter().all(|item| item.cash > 0.0));
    }

    #[test]
    fn payload_accepts_numbers_and_raw_strings() {
        let json = r#"{
          "auctionPrices": [
            {"itemId": 1, "price": "10000"},
            {"itemId": 2, "price": 10000}
          ],
          "target": "20"
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");

        let cube = &response.rates[0];
        assert_approx(cube.current.expect("quoted"), 9.0);
        assert_eq!(cube.current_display.as_deref(), Some("1 : 9.00"));

        let catalyst = &response.rates[1];
        assert_approx(catalyst.current.expect("quoted"), 3.6);
    }

    #[test]
    fn exchange_response_reproduces_the_worked_plan() {
        let json = r#"{
          "auctionPrices": [
            {"itemId": 1, "price": 10000},
            {"itemId": 2, "price": 10000}
          ],
          "target": 20
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");

        let plans = response.plans.expect("plans present");
        assert_eq!(plans.len(), 3);
        let current = &plans[0];
        assert_eq!(current.scenario, Scenario::Current);
        assert_eq!(current.lines.len(), 2);
        assert_eq!(current.lines[0].display, "Bind Cube : 2 (18)");
        assert_eq!(current.lines[1].display, "Catalyst : 1 (4)");
        assert_approx(current.total_tera, 21.6);
        assert_approx(current.total_cost, 4_500.0);
        assert_eq!(current.summary[0], "total tera : 22");
        assert_eq!(current.summary[1], "total cost : 4500 won");
    }

    #[test]
    fn missing_or_invalid_target_omits_plans() {
        let no_target = r#"{"auctionPrices": [{"itemId": 1, "price": 10000}]}"#;
        let response = exchange_response_from_json(no_target).expect("json should parse");
        assert!(response.plans.is_none());
        assert!(response.estimate.is_none());

        let bad_target = r#"{
          "auctionPrices": [{"itemId": 1, "price": 10000}],
          "target": "abc"
        }"#;
        let response = exchange_response_from_json(bad_target).expect("json should parse");
        assert!(response.plans.is_none());
    }

    #[test]
    fn invalid_price_leaves_the_row_without_value() {
        let json = r#"{
          "auctionPrices": [
            {"itemId": 1, "price": "abc"},
            {"itemId": 2, "price": ""}
          ]
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");

        assert!(response.rates[0].current.is_none());
        assert!(response.rates[0].current_display.is_none());
        assert!(response.rates[1].minus5.is_none());
    }

    #[test]
    fn fee_and_tick_overrides_apply() {
        let json = r#"{
          "feeRate": 20,
          "priceTick": 10,
          "auctionPrices": [{"itemId": 1, "price": 10000}]
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");

        assert_approx(response.fee_rate, 0.20);
        assert_approx(response.price_tick, 0.10);
        assert_approx(response.rates[0].current.expect("quoted"), 8.0);
    }

    #[test]
    fn custom_catalog_replaces_the_default() {
        let json = r#"{
          "items": [{"id": 7, "name": "Custom", "cash": 500, "limit": 3}],
          "auctionPrices": [{"itemId": 7, "price": 1000}],
          "target": 5
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");

        assert_eq!(response.rates.len(), 1);
        assert_eq!(response.rates[0].item_id, 7);
        let plans = response.plans.expect("plans present");
        assert!(plans[0].lines.iter().all(|line| line.count <= 3));
    }

    #[test]
    fn response_serialization_contains_expected_fields() {
        let json = r#"{
          "auctionPrices": [
            {"itemId": 1, "price": 10000},
            {"itemId": 2, "price": 10000}
          ],
          "target": 20
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");
        let serialized = serde_json::to_string(&response).expect("response should serialize");

        assert!(serialized.contains("\"rates\""));
        assert!(serialized.contains("\"plans\""));
        assert!(serialized.contains("\"estimate\""));
        assert!(serialized.contains("\"totalTera\""));
        assert!(serialized.contains("\"summary\""));
        assert!(serialized.contains("\"currentDisplay\""));
        assert!(serialized.contains("\"scenario\":\"current\""));
        assert!(serialized.contains("\"scenario\":\"plus5\""));
        assert!(serialized.contains("\"scenario\":\"minus5\""));
        assert!(serialized.contains("1 : 9.00"));
    }

    #[test]
    fn quick_estimate_rides_along_with_the_plans() {
        let json = r#"{
          "auctionPrices": [
            {"itemId": 1, "price": 10000},
            {"itemId": 2, "price": 10000}
          ],
          "target": 18
        }"#;
        let response = exchange_response_from_json(json).expect("json should parse");

        let estimate = response.estimate.expect("estimate present");
        assert_eq!(estimate.item_id, 1);
        assert_approx(estimate.current_cost, 2_000.0);
    }
}
