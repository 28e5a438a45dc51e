//! Price Alerts
//!
//! Standing conditions on a symbol's price. An alert fires at most once:
//! evaluation removes every alert it returns.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::price::PriceData;
use crate::domain::shared::{AgentAddress, AlertId, Symbol, Timestamp};

/// Absolute 24h change, in percent, that a `change` alert fires above.
pub const CHANGE_THRESHOLD: Decimal = dec!(5);

/// What an alert watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    /// Price strictly above the target.
    Above,
    /// Price strictly below the target.
    Below,
    /// Absolute 24h change strictly above 5%. The target is ignored.
    Change,
}

impl AlertCondition {
    /// Evaluate the condition against a fresh snapshot.
    #[must_use]
    pub fn is_met(self, target_price: Decimal, data: &PriceData) -> bool {
        match self {
            Self::Above => data.price > target_price,
            Self::Below => data.price < target_price,
            Self::Change => data.change_24h.abs() > CHANGE_THRESHOLD,
        }
    }

    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::Change => "change",
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Caller-chosen identifier.
    pub alert_id: AlertId,
    /// Watched symbol.
    pub symbol: Symbol,
    /// Threshold for `above` and `below`.
    pub target_price: Decimal,
    /// Trigger condition.
    pub condition: AlertCondition,
    /// Wallet address the alert was raised for.
    pub user_address: String,
    /// Agent that registered the alert and receives the notification.
    pub owner: AgentAddress,
    /// When the alert was registered.
    pub created_at: Timestamp,
}

impl Alert {
    /// Whether this alert fires for the given snapshot.
    #[must_use]
    pub fn is_triggered_by(&self, data: &PriceData) -> bool {
        self.symbol == data.symbol && self.condition.is_met(self.target_price, data)
    }
}

/// Registered alerts, grouped by symbol.
#[derive(Debug, Default)]
pub struct AlertBook {
    by_symbol: HashMap<Symbol, HashMap<AlertId, Alert>>,
}

impl AlertBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an alert. Returns the alert it replaced, if the id was taken.
    pub fn register(&mut self, alert: Alert) -> Option<Alert> {
        self.by_symbol
            .entry(alert.symbol.clone())
            .or_default()
            .insert(alert.alert_id.clone(), alert)
    }

    /// Remove and return every alert on the snapshot's symbol that fires.
    ///
    /// A symbol left with no alerts is dropped.
    pub fn evaluate(&mut self, data: &PriceData) -> Vec<Alert> {
        let Some(alerts) = self.by_symbol.get_mut(&data.symbol) else {
            return Vec::new();
        };

        let fired_ids: Vec<AlertId> = alerts
            .values()
            .filter(|alert| alert.is_triggered_by(data))
            .map(|alert| alert.alert_id.clone())
            .collect();

        let mut fired: Vec<Alert> = fired_ids
            .iter()
            .filter_map(|id| alerts.remove(id))
            .collect();
        fired.sort_by(|a, b| a.alert_id.cmp(&b.alert_id));

        if alerts.is_empty() {
            self.by_symbol.remove(&data.symbol);
        }

        fired
    }

    /// Number of alerts on a symbol.
    #[must_use]
    pub fn count_for(&self, symbol: &Symbol) -> usize {
        self.by_symbol.get(symbol).map_or(0, HashMap::len)
    }

    /// Whether any alert is registered on the symbol.
    #[must_use]
    pub fn has_symbol(&self, symbol: &Symbol) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    /// Total number of registered alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_symbol.values().map(HashMap::len).sum()
    }

    /// Returns true when no alert is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn alert(id: &str, symbol: &str, target: Decimal, condition: AlertCondition) -> Alert {
        Alert {
            alert_id: AlertId::new(id),
            symbol: Symbol::new(symbol),
            target_price: target,
            condition,
            user_address: "0xabc".to_string(),
            owner: AgentAddress::new("client"),
            created_at: Timestamp::now(),
        }
    }

    fn snapshot(symbol: &str, price: Decimal, change: Decimal) -> PriceData {
        PriceData::new(Symbol::new(symbol), price, change, dec!(1))
    }

    #[test_case(AlertCondition::Above, dec!(101), true ; "above fires when higher")]
    #[test_case(AlertCondition::Above, dec!(100), false ; "above is strict")]
    #[test_case(AlertCondition::Below, dec!(99), true ; "below fires when lower")]
    #[test_case(AlertCondition::Below, dec!(100), false ; "below is strict")]
    fn price_conditions(condition: AlertCondition, price: Decimal, expected: bool) {
        let data = snapshot("BTC", price, dec!(0));
        assert_eq!(condition.is_met(dec!(100), &data), expected);
    }

    #[test_case(dec!(5.01), true ; "positive move")]
    #[test_case(dec!(-6), true ; "negative move")]
    #[test_case(dec!(5), false ; "threshold is strict")]
    #[test_case(dec!(-4.9), false ; "small move")]
    fn change_condition_uses_absolute_change(change: Decimal, expected: bool) {
        let data = snapshot("AVAX", dec!(25), change);
        assert_eq!(AlertCondition::Change.is_met(dec!(0), &data), expected);
    }

    #[test]
    fn fired_alerts_are_removed_and_symbol_dropped() {
        let mut book = AlertBook::new();
        book.register(alert("a1", "BTC", dec!(40000), AlertCondition::Above));

        let fired = book.evaluate(&snapshot("BTC", dec!(45000), dec!(0)));
        assert_eq!(fired.len(), 1);
        assert!(!book.has_symbol(&Symbol::new("BTC")));

        let again = book.evaluate(&snapshot("BTC", dec!(46000), dec!(0)));
        assert!(again.is_empty());
    }

    #[test]
    fn unfired_alerts_stay() {
        let mut book = AlertBook::new();
        book.register(alert("up", "ETH", dec!(5000), AlertCondition::Above));
        book.register(alert("down", "ETH", dec!(3500), AlertCondition::Below));

        let fired = book.evaluate(&snapshot("ETH", dec!(3000), dec!(0)));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].alert_id.as_str(), "down");
        assert_eq!(book.count_for(&Symbol::new("ETH")), 1);
    }

    #[test]
    fn reregistering_replaces() {
        let mut book = AlertBook::new();
        assert!(book
            .register(alert("a1", "SOL", dec!(10), AlertCondition::Above))
            .is_none());
        let replaced = book.register(alert("a1", "SOL", dec!(500), AlertCondition::Above));
        assert_eq!(replaced.map(|a| a.target_price), Some(dec!(10)));
        assert_eq!(book.len(), 1);

        assert!(book.evaluate(&snapshot("SOL", dec!(100), dec!(0))).is_empty());
    }

    #[test]
    fn untracked_symbols_never_fire() {
        let mut book = AlertBook::new();
        book.register(alert("a1", "DOGE", dec!(0), AlertCondition::Above));
        assert!(book.evaluate(&snapshot("BTC", dec!(1), dec!(50))).is_empty());
        assert_eq!(book.len(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn an_alert_fires_at_most_once(
                targets in prop::collection::vec(0i64..200, 1..10),
                prices in prop::collection::vec(0i64..200, 1..10),
            ) {
                let mut book = AlertBook::new();
                for (i, target) in targets.iter().enumerate() {
                    book.register(alert(&format!("a{i}"), "BTC", Decimal::from(*target), AlertCondition::Above));
                }

                let mut seen = std::collections::HashSet::new();
                for price in prices {
                    for fired in book.evaluate(&snapshot("BTC", Decimal::from(price), dec!(0))) {
                        prop_assert!(seen.insert(fired.alert_id));
                    }
                }
                prop_assert_eq!(seen.len() + book.len(), targets.len());
            }
        }
    }
}
