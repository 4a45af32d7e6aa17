//! Network element definitions.
//!
//! Elements reference each other by name. Names are resolved into dense
//! integer indices once, by the indexing layer in `emix-algo`.

mod bus;
mod consumer;
mod energy_source;
mod supply;
mod transmission;

pub use bus::{Bus, Dsr};
pub use consumer::{AggregatedConsumer, DemandProfile, LocalBalancingStack};
pub use energy_source::{CapacityBounds, Generator, GeneratorType, Storage, StorageType};
pub use supply::{CapacityFactor, EmissionFee, Fuel};
pub use transmission::{Line, TransmissionFee};

/// Hour-of-year series, one value per hour (`n_hours` long)
pub type HourlySeries = Vec<f64>;

/// Per-year series (`n_years` long)
pub type YearlySeries = Vec<f64>;

/// Per-year optional bound; `None` leaves the year unbounded
pub type YearlyBounds = Vec<Option<f64>>;

/// Yearly bounds with every year left open
pub fn unbounded(n_years: usize) -> YearlyBounds {
    vec![None; n_years]
}
