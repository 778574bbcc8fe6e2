use std::{collections::BTreeMap, path::Path, str::FromStr};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{
    ser::{Error as _, SerializeMap},
    Deserialize, Serialize, Serializer,
};
use thiserror::Error;

/// Currencies a package can be bought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Aed,
    Usd,
    Eur,
    Pkr,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Aed, Currency::Usd, Currency::Eur, Currency::Pkr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Aed => "AED",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Pkr => "PKR",
        }
    }
}

impl FromStr for Currency {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::UnknownCurrency(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unsupported currency: {0}")]
    UnknownCurrency(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid catalog: {0}")]
    Invalid(String),

    #[error("read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parses a positive decimal amount in major units.
pub fn parse_amount(raw: &str) -> Result<Decimal, CatalogError> {
    let amount =
        Decimal::from_str(raw.trim()).map_err(|_| CatalogError::InvalidAmount(raw.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(CatalogError::InvalidAmount(raw.to_string()));
    }
    Ok(amount)
}

/// Major units to minor units: ×100, half away from zero.
pub fn to_minor_units(amount: Decimal) -> Result<i64, CatalogError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| CatalogError::InvalidAmount(amount.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinPackage {
    pub id: u32,
    pub coins: u32,
    /// Reads numbers or strings; written as JSON numbers for the client.
    #[serde(serialize_with = "prices_as_numbers")]
    pub price: BTreeMap<Currency, Decimal>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub popular: bool,
}

fn prices_as_numbers<S: Serializer>(
    prices: &BTreeMap<Currency, Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(prices.len()))?;
    for (currency, price) in prices {
        let number: serde_json::Number = price.normalize().to_string().parse().map_err(S::Error::custom)?;
        map.serialize_entry(currency, &number)?;
    }
    map.end()
}

impl CoinPackage {
    pub fn price_in(&self, currency: Currency) -> Option<Decimal> {
        self.price.get(&currency).copied()
    }
}

/// The one catalog served to clients and used to price intents.
#[derive(Debug, Clone)]
pub struct Catalog {
    packages: Vec<CoinPackage>,
}

impl Catalog {
    pub fn new(packages: Vec<CoinPackage>) -> Result<Self, CatalogError> {
        if packages.is_empty() {
            return Err(CatalogError::Invalid("no packages".into()));
        }
        let mut last_coins = 0;
        for p in &packages {
            if p.coins == 0 {
                return Err(CatalogError::Invalid(format!("package {} has no coins", p.id)));
            }
            if p.coins < last_coins {
                return Err(CatalogError::Invalid(format!(
                    "package {} breaks ascending coin order",
                    p.id
                )));
            }
            last_coins = p.coins;
            for currency in Currency::ALL {
                match p.price_in(currency) {
                    Some(price) if price > Decimal::ZERO => {}
                    _ => {
                        return Err(CatalogError::Invalid(format!(
                            "package {} lacks a {} price",
                            p.id,
                            currency.as_str()
                        )))
                    }
                }
            }
        }
        Ok(Self { packages })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let packages: Vec<CoinPackage> = serde_json::from_str(&raw)?;
        Self::new(packages)
    }

    pub fn packages(&self) -> &[CoinPackage] {
        &self.packages
    }

    /// Package selling `coins` for exactly `amount` in `currency`.
    pub fn find_offer(&self, coins: u32, currency: Currency, amount: Decimal) -> Option<&CoinPackage> {
        self.packages
            .iter()
            .find(|p| p.coins == coins && p.price_in(currency) == Some(amount))
    }
}

fn package(id: u32, coins: u32, prices: [&str; 4], popular: bool) -> CoinPackage {
    let price = Currency::ALL
        .into_iter()
        .zip(prices)
        .map(|(c, p)| (c, Decimal::from_str(p).unwrap_or_default()))
        .collect();
    CoinPackage { id, coins, price, popular }
}

impl Default for Catalog {
    fn default() -> Self {
        // AED, USD, EUR, PKR
        let packages = vec![
            package(1, 500, ["22.41", "6.10", "5.60", "1700"], false),
            package(2, 1000, ["44.29", "12.05", "11.05", "3350"], false),
            package(3, 2000, ["88.05", "23.96", "21.98", "6650"], false),
            package(4, 3000, ["131.82", "35.87", "32.90", "9950"], false),
            package(5, 5000, ["219.35", "59.70", "54.78", "16580"], true),
            package(6, 10000, ["438.17", "119.30", "109.46", "33100"], false),
            package(7, 17500, ["766.40", "208.60", "191.50", "57925"], false),
            package(8, 20000, ["875.81", "238.40", "218.75", "66200"], false),
        ];
        Self { packages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_eight_fully_priced_packages() {
        let catalog = Catalog::default();
        assert_eq!(catalog.packages().len(), 8);
        for p in catalog.packages() {
            for c in Currency::ALL {
                assert!(p.price_in(c).is_some_and(|v| v > Decimal::ZERO), "{} {:?}", p.id, c);
            }
        }
        assert!(catalog.packages().windows(2).all(|w| w[0].coins <= w[1].coins));
        // the built-in table must pass the same checks as a loaded one
        assert!(Catalog::new(catalog.packages().to_vec()).is_ok());
    }

    #[test]
    fn only_the_5000_package_is_popular() {
        let popular: Vec<u32> = Catalog::default()
            .packages()
            .iter()
            .filter(|p| p.popular)
            .map(|p| p.coins)
            .collect();
        assert_eq!(popular, vec![5000]);
    }

    #[test]
    fn minor_units_round_half_up() {
        assert_eq!(to_minor_units(parse_amount("22.41").unwrap()).unwrap(), 2241);
        assert_eq!(to_minor_units(parse_amount("6.10").unwrap()).unwrap(), 610);
        assert_eq!(to_minor_units(parse_amount("1700").unwrap()).unwrap(), 170000);
        assert_eq!(to_minor_units(parse_amount("0.005").unwrap()).unwrap(), 1);
        assert_eq!(to_minor_units(parse_amount("10.994").unwrap()).unwrap(), 1099);
    }

    #[test]
    fn parse_amount_rejects_garbage_and_non_positive() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5.00").is_err());
    }

    #[test]
    fn find_offer_compares_prices_numerically() {
        let catalog = Catalog::default();
        let offer = catalog.find_offer(500, Currency::Usd, parse_amount("6.1").unwrap());
        assert_eq!(offer.map(|p| p.id), Some(1));
        assert!(catalog.find_offer(500, Currency::Usd, parse_amount("0.01").unwrap()).is_none());
        assert!(catalog.find_offer(501, Currency::Usd, parse_amount("6.10").unwrap()).is_none());
    }

    #[test]
    fn currency_parsing_is_case_insensitive() {
        assert_eq!("aed".parse::<Currency>().unwrap(), Currency::Aed);
        assert_eq!("PKR".parse::<Currency>().unwrap(), Currency::Pkr);
        assert!("GBP".parse::<Currency>().is_err());
    }

    #[test]
    fn catalog_serializes_prices_by_currency_code() {
        let json = serde_json::to_value(&Catalog::default().packages()[4]).unwrap();
        assert_eq!(json["coins"], 5000);
        assert_eq!(json["popular"], true);
        assert_eq!(json["price"]["AED"].as_f64(), Some(219.35));
        assert_eq!(json["price"]["PKR"].as_u64(), Some(16580));
        assert!(Currency::ALL.iter().all(|c| json["price"][c.as_str()].is_number()));
        assert!(serde_json::to_value(&Catalog::default().packages()[0]).unwrap()["popular"].is_null());
    }

    #[test]
    fn catalog_file_accepts_numeric_and_quoted_prices() {
        let raw = r#"[
            {"id":1,"coins":500,"price":{"AED":22.41,"USD":"6.10","EUR":5.6,"PKR":1700}},
            {"id":2,"coins":1000,"price":{"AED":44.29,"USD":12.05,"EUR":11.05,"PKR":3350},"popular":true}
        ]"#;
        let packages: Vec<CoinPackage> = serde_json::from_str(raw).unwrap();
        let catalog = Catalog::new(packages).unwrap();
        let offer = catalog.find_offer(500, Currency::Aed, parse_amount("22.41").unwrap());
        assert_eq!(offer.map(|p| p.id), Some(1));
        assert_eq!(catalog.packages()[0].price_in(Currency::Usd), Some(parse_amount("6.1").unwrap()));
        assert!(catalog.packages()[1].popular);
    }

    #[test]
    fn new_rejects_missing_currency() {
        let mut p = Catalog::default().packages()[0].clone();
        p.price.remove(&Currency::Eur);
        assert!(matches!(Catalog::new(vec![p]), Err(CatalogError::Invalid(_))));
    }
}
