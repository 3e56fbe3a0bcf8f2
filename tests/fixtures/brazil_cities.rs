//! City coordinates matching the default coordinate table.

/// A named city with coordinates.
#[derive(Debug, Clone)]
pub struct City {
    pub name: &'static str,
    pub state: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl City {
    pub const fn new(name: &'static str, state: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, state, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Greater Sao Paulo (close enough to route within one shift)
// ============================================================================

pub const SAO_PAULO: City = City::new("sao paulo", "SP", -23.5505, -46.6333);
pub const SANTO_ANDRE: City = City::new("santo andre", "SP", -23.6639, -46.5383);
pub const ITATIBA: City = City::new("itatiba", "SP", -23.0037, -46.8467);

// ============================================================================
// Distant cities (hours of driving away from Sao Paulo)
// ============================================================================

pub const RIO_DE_JANEIRO: City = City::new("rio de janeiro", "RJ", -22.9068, -43.1729);
pub const SALVADOR: City = City::new("salvador", "BA", -12.9714, -38.5014);
pub const TOLEDO: City = City::new("toledo", "PR", -24.7132, -53.7431);

/// A city missing from the coordinate table.
pub const UNKNOWN: City = City::new("cidade fantasma", "ZZ", 0.0, 0.0);

pub const HEADER: &str =
    "order_id,customer_city,customer_state,seller_city,seller_state,product_weight_g,freight_value";

/// Builds a shipment CSV with one row per `(order_id, seller, customer, weight)`.
pub fn shipments_csv(rows: &[(&str, &City, &City, f64)]) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for (order_id, seller, customer, weight) in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},10.0\n",
            order_id, customer.name, customer.state, seller.name, seller.state, weight
        ));
    }
    csv
}
