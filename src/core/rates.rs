use super::types::{Catalog, ExchangeConfig, YieldQuote};

pub fn quote(
    cash_price: f64,
    auction_price: f64,
    config: &ExchangeConfig,
) -> Option<YieldQuote> {
    if !auction_price.is_finite() || auction_price <= 0.0 {
        return None;
    }

    let base = auction_price * (1.0 - config.fee_rate) / cash_price;
    if !base.is_finite() || base <= 0.0 {
        return None;
    }

    Some(YieldQuote {
        minus5: base * (1.0 - config.price_tick),
        current: base,
        plus5: base * (1.0 + config.price_tick),
    })
}

impl Catalog {
    pub fn set_auction_price(
        &mut self,
        id: u32,
        auction_price: Option<f64>,
        config: &ExchangeConfig,
    ) -> bool {
        let Some(item) = self.item_mut(id) else {
            return false;
        };

        // Invalid input clears the displayed rates but never the stored ones.
        match auction_price.and_then(|price| quote(item.cash, price, config)) {
            Some(rates) => {
                item.rates = Some(rates);
                true
            }
            None => false,
        }
    }
}
