// Filtering and ordering of product listings by expiry date.
//
// Shared by the in-memory repository (server side) and by the sync coordinator
// when it answers a filtered listing from the local cache.

use crate::modules::products::core::product::Product;
use chrono::{Datelike, Days, NaiveDate};
use std::cmp::Ordering;

const EXPIRING_SOON_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFilter {
    WithDate,
    WithoutDate,
    Expired,
    ExpiringSoon,
    ExpiringThisMonth,
    Valid,
}

impl ProductFilter {
    /// Case-insensitive; unknown values yield `None`, which means "no filter".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "withdate" => Some(Self::WithDate),
            "withoutdate" => Some(Self::WithoutDate),
            "expired" => Some(Self::Expired),
            "expiringsoon" => Some(Self::ExpiringSoon),
            "expiringthismonth" => Some(Self::ExpiringThisMonth),
            "valid" => Some(Self::Valid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithDate => "withDate",
            Self::WithoutDate => "withoutDate",
            Self::Expired => "expired",
            Self::ExpiringSoon => "expiringSoon",
            Self::ExpiringThisMonth => "expiringThisMonth",
            Self::Valid => "valid",
        }
    }

    pub fn matches(&self, expiry: Option<NaiveDate>, today: NaiveDate) -> bool {
        match (self, expiry) {
            (Self::WithDate, date) => date.is_some(),
            (Self::WithoutDate, date) => date.is_none(),
            (Self::Valid, None) => true,
            (Self::Valid, Some(date)) => date >= today,
            (_, None) => false,
            (Self::Expired, Some(date)) => date < today,
            (Self::ExpiringSoon, Some(date)) => {
                let horizon = today
                    .checked_add_days(Days::new(EXPIRING_SOON_DAYS))
                    .unwrap_or(NaiveDate::MAX);
                date >= today && date <= horizon
            }
            (Self::ExpiringThisMonth, Some(date)) => date >= today && date <= end_of_month(today),
        }
    }
}

fn end_of_month(today: NaiveDate) -> NaiveDate {
    let (year, month) = match today.month() {
        12 => (today.year() + 1, 1),
        month => (today.year(), month + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` in any casing sorts descending; everything else ascends.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: Option<ProductFilter>,
    pub sort_order: SortOrder,
}

impl ListQuery {
    pub fn from_params(filter: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            filter: filter.and_then(ProductFilter::parse),
            sort_order: sort_order.map(SortOrder::parse).unwrap_or_default(),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(filter) = self.filter {
            pairs.push(("filter", filter.as_str()));
        }
        pairs.push(("sortOrder", self.sort_order.as_str()));
        pairs
    }

    /// Ascending puts unset dates last; descending puts them first. Ties order by id.
    pub fn apply(&self, products: Vec<Product>, today: NaiveDate) -> Vec<Product> {
        let mut selected: Vec<Product> = match self.filter {
            Some(filter) => products
                .into_iter()
                .filter(|product| filter.matches(product.expiry_date.map(|d| d.date()), today))
                .collect(),
            None => products,
        };
        let order = self.sort_order;
        selected.sort_by(|a, b| {
            let by_date = match (a.expiry_date, b.expiry_date) {
                (Some(x), Some(y)) => match order {
                    SortOrder::Asc => x.cmp(&y),
                    SortOrder::Desc => y.cmp(&x),
                },
                (None, None) => Ordering::Equal,
                (None, Some(_)) => match order {
                    SortOrder::Asc => Ordering::Greater,
                    SortOrder::Desc => Ordering::Less,
                },
                (Some(_), None) => match order {
                    SortOrder::Asc => Ordering::Less,
                    SortOrder::Desc => Ordering::Greater,
                },
            };
            by_date.then_with(|| a.id.cmp(&b.id))
        });
        selected
    }
}
