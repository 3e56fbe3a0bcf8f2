//! Console itinerary report.

use std::fmt;

use crate::extract::Extraction;

/// Plain-text rendering of an [`Extraction`], one block per vehicle.
pub struct Report<'a>(pub &'a Extraction);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extraction = self.0;
        if !extraction.solved {
            return writeln!(f, "No solution found.");
        }

        for vehicle in &extraction.vehicles {
            writeln!(f)?;
            writeln!(f, "Route for vehicle {}:", vehicle.vehicle)?;
            for stop in &vehicle.stops {
                writeln!(
                    f,
                    "  Location: ({}, {}), Order ID: {}, Arrival Time: {}",
                    stop.location.lat,
                    stop.location.lng,
                    stop.order_id.as_deref().unwrap_or("Depot"),
                    stop.arrival
                )?;
            }
            writeln!(f, "  Return to Depot")?;
        }
        Ok(())
    }
}
