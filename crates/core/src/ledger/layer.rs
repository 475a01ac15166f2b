//! Balance layers.
//!
//! A layer key is `offset(layer_type) + currency_id`. Offsets are fixed bands
//! of [`BAND_WIDTH`], so every key decodes back to exactly one
//! `(LayerType, CurrencyId)` pair as long as currency ids stay below the band
//! width. [`CurrencyId::new`] enforces that bound.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Width of every layer band.
pub const BAND_WIDTH: u32 = 1000;

/// Semantic category of a balance layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerType {
    /// Settled balances.
    Base,
    /// In-flight funds of pending transactions.
    Pending,
    /// Credit extended to an account.
    CreditAllowances,
    /// Reserved funds.
    OnHold,
    /// Usage counted against a daily limit.
    DailyLimit,
    /// Usage counted against a cumulative limit.
    CumulativeLimit,
    /// Fees.
    Fee,
}

impl LayerType {
    /// Every layer type in offset order.
    pub const ALL: [Self; 7] = [
        Self::Base,
        Self::Pending,
        Self::CreditAllowances,
        Self::OnHold,
        Self::DailyLimit,
        Self::CumulativeLimit,
        Self::Fee,
    ];

    /// Layer types unwound when a pending transaction completes.
    pub const OFFSET_LAYERS: [Self; 6] = [
        Self::Pending,
        Self::OnHold,
        Self::Fee,
        Self::DailyLimit,
        Self::CumulativeLimit,
        Self::CreditAllowances,
    ];

    /// Start of this layer type's band.
    #[must_use]
    pub const fn offset(self) -> u32 {
        match self {
            Self::Base => 0,
            Self::Pending => 1000,
            Self::CreditAllowances => 2000,
            Self::OnHold => 3000,
            Self::DailyLimit => 4000,
            Self::CumulativeLimit => 5000,
            Self::Fee => 6000,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "Base",
            Self::Pending => "Pending",
            Self::CreditAllowances => "Credit Allowances",
            Self::OnHold => "On Hold",
            Self::DailyLimit => "Daily Limit",
            Self::CumulativeLimit => "Cumulative Limit",
            Self::Fee => "Fee",
        }
    }

    /// Returns the layer type whose band starts at `offset`.
    #[must_use]
    pub fn from_offset(offset: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.offset() == offset)
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric currency id, always below [`BAND_WIDTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct CurrencyId(u16);

impl CurrencyId {
    /// Validates a currency id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BandOverflow`] if `id >= BAND_WIDTH`.
    pub fn new(id: u16) -> Result<Self, LedgerError> {
        if u32::from(id) >= BAND_WIDTH {
            return Err(LedgerError::BandOverflow { currency_id: id });
        }
        Ok(Self(id))
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for CurrencyId {
    type Error = LedgerError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyId> for u16 {
    fn from(id: CurrencyId) -> Self {
        id.0
    }
}

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layer key: band offset plus currency id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(u32);

impl Layer {
    /// Base layer of currency 0.
    pub const BASE: Self = Self(0);

    /// Builds the layer for a type and currency.
    #[must_use]
    pub fn of(layer_type: LayerType, currency: CurrencyId) -> Self {
        Self(layer_type.offset() + u32::from(currency.0))
    }

    /// Wraps a stored layer value without checking it.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw layer value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Splits the key back into its type and currency.
    ///
    /// Returns `None` for values outside every known band.
    #[must_use]
    pub fn decode(self) -> Option<(LayerType, CurrencyId)> {
        Some((self.layer_type()?, self.currency_id()))
    }

    /// Layer type of the band this key falls in.
    #[must_use]
    pub fn layer_type(self) -> Option<LayerType> {
        LayerType::from_offset(self.0 - self.0 % BAND_WIDTH)
    }

    /// Currency part of the key.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn currency_id(self) -> CurrencyId {
        // remainder is below BAND_WIDTH
        CurrencyId((self.0 % BAND_WIDTH) as u16)
    }

    /// Returns true if the key lies in the band of `layer_type`.
    #[must_use]
    pub const fn is_in_band(self, layer_type: LayerType) -> bool {
        let start = layer_type.offset();
        self.0 >= start && self.0 < start + BAND_WIDTH
    }

    /// Same currency, different band.
    #[must_use]
    pub fn with_type(self, layer_type: LayerType) -> Self {
        Self::of(layer_type, self.currency_id())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `offset(layer_type) + currency`.
#[must_use]
pub fn layer_for(layer_type: LayerType, currency: CurrencyId) -> Layer {
    Layer::of(layer_type, currency)
}

/// Returns true if `layer` lies in the band of `layer_type`.
#[must_use]
pub const fn is_in_band(layer: Layer, layer_type: LayerType) -> bool {
    layer.is_in_band(layer_type)
}
