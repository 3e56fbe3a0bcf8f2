//! Shipment dataset ingestion.
//!
//! Reads shipment rows, drops incomplete ones, resolves seller and customer
//! cities against a fixed coordinate table and turns every resolved order into
//! a pickup/delivery pair. Rows whose cities cannot be resolved are dropped
//! with a warning; the routing core only ever sees a consistent model.

use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::RoutingError;
use crate::model::{Location, PickupDelivery, ProblemData, ProblemModel, TimeWindow};

/// One raw dataset row. Missing or unparsable fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShipmentRecord {
    pub order_id: Option<String>,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
    pub seller_city: Option<String>,
    pub seller_state: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub product_weight_g: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub freight_value: Option<f64>,
}

/// A row with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub order_id: String,
    pub customer_city: String,
    pub customer_state: String,
    pub seller_city: String,
    pub seller_state: String,
    /// Item weight in grams.
    pub weight: i64,
    pub freight_value: f64,
}

impl ShipmentRecord {
    pub fn complete(self) -> Option<Shipment> {
        let weight = self.product_weight_g.filter(|weight| *weight >= 0.0)?;
        Some(Shipment {
            order_id: self.order_id?,
            customer_city: self.customer_city?,
            customer_state: self.customer_state?,
            seller_city: self.seller_city?,
            seller_state: self.seller_state?,
            weight: weight as i64,
            freight_value: self.freight_value?,
        })
    }
}

/// Reads shipment rows from CSV with a header line. Extra columns are ignored.
pub fn read_shipments<R: Read>(reader: R) -> Result<Vec<ShipmentRecord>, RoutingError> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader.deserialize().collect::<Result<Vec<ShipmentRecord>, _>>()?;
    Ok(records)
}

pub fn city_key(city: &str, state: &str) -> String {
    format!("{} ({})", city, state)
}

/// Static city -> coordinate lookup keyed as `"{city} ({state})"`.
#[derive(Debug, Clone)]
pub struct CityTable {
    coords: HashMap<String, Location>,
}

impl Default for CityTable {
    fn default() -> Self {
        Self::from_entries(&[
            ("sao paulo (SP)", -23.5505, -46.6333),
            ("barra (BA)", -12.5833, -43.1667),
            ("santo andre (SP)", -23.6639, -46.5383),
            ("belo horizonte (MG)", -19.9167, -43.9345),
            ("itatiba (SP)", -23.0037, -46.8467),
            ("juiz de fora (MG)", -21.7642, -43.3503),
            ("campo largo (PR)", -25.4635, -49.5283),
            ("salvador (BA)", -12.9714, -38.5014),
            ("toledo (PR)", -24.7132, -53.7431),
            ("rio de janeiro (RJ)", -22.9068, -43.1729),
        ])
    }
}

impl CityTable {
    pub fn from_entries(entries: &[(&str, f64, f64)]) -> Self {
        let coords = entries
            .iter()
            .map(|(key, lat, lng)| (key.to_string(), Location::new(*lat, *lng)))
            .collect();
        Self { coords }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn resolve(&self, city: &str, state: &str) -> Result<Location, RoutingError> {
        let key = city_key(city, state);
        match self.coords.get(&key) {
            Some(location) => Ok(*location),
            None => Err(RoutingError::UnresolvableLocation { city: key }),
        }
    }
}

/// How shipments become a routing problem.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub vehicles: usize,
    pub capacity: i64,
    pub depot: Location,
    pub pickup_window: TimeWindow,
    pub delivery_window: TimeWindow,
    /// Only the first `max_orders` complete rows are considered.
    pub max_orders: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vehicles: 2,
            capacity: 15000,
            depot: Location::new(-23.5505, -46.6333),
            pickup_window: TimeWindow::new(0, 240),
            delivery_window: TimeWindow::new(120, 480),
            max_orders: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub records: usize,
    pub incomplete: usize,
    pub unresolved: usize,
    pub orders: usize,
}

/// Builds a problem with the depot at node 0 followed by one
/// (pickup, delivery) node pair per accepted order.
pub fn build_problem(
    records: Vec<ShipmentRecord>,
    table: &CityTable,
    fleet: &FleetConfig,
) -> Result<(ProblemModel, IngestReport), RoutingError> {
    let mut report = IngestReport {
        records: records.len(),
        ..IngestReport::default()
    };

    let shipments: Vec<Shipment> = records.into_iter().filter_map(ShipmentRecord::complete).collect();
    report.incomplete = report.records - shipments.len();

    let mut data = ProblemData {
        locations: vec![fleet.depot],
        demands: vec![0],
        time_windows: vec![TimeWindow::UNRESTRICTED],
        vehicle_capacities: vec![fleet.capacity; fleet.vehicles],
        depot: 0,
        order_ids: vec![None],
        pairs: Vec::new(),
    };

    for shipment in shipments.iter().take(fleet.max_orders) {
        let resolved = table
            .resolve(&shipment.seller_city, &shipment.seller_state)
            .and_then(|seller| {
                table
                    .resolve(&shipment.customer_city, &shipment.customer_state)
                    .map(|customer| (seller, customer))
            });

        let (seller, customer) = match resolved {
            Ok(pair) => pair,
            Err(RoutingError::UnresolvableLocation { city }) => {
                warn!(order = %shipment.order_id, city = %city, "dropping shipment with unknown city");
                report.unresolved += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        let pickup = data.locations.len();
        data.locations.extend([seller, customer]);
        data.demands.extend([-shipment.weight, shipment.weight]);
        data.time_windows.extend([fleet.pickup_window, fleet.delivery_window]);
        data.order_ids
            .extend([Some(shipment.order_id.clone()), Some(shipment.order_id.clone())]);
        data.pairs.push(PickupDelivery::new(pickup, pickup + 1));
        report.orders += 1;
    }

    info!(
        records = report.records,
        incomplete = report.incomplete,
        unresolved = report.unresolved,
        orders = report.orders,
        "shipments ingested"
    );

    let problem = ProblemModel::new(data)?;
    Ok((problem, report))
}
