// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Native query implementations over Arrow record batches.

use geo::{Distance, Euclidean, Geometry, Intersects, Point};

use super::geometry::{column, geometry_at, string_at};
use super::{QueryError, QueryFn, TableStore};

/// Centre of Sedona, AZ.
const SEDONA_CENTER: (f64, f64) = (-111.7610, 34.8697);

/// Roughly 50km expressed in degrees.
const Q1_RADIUS_DEG: f64 = 0.45;

const Q2_ZONE_NAME: &str = "Coconino County";

/// Static registration table: query number to implementation.
pub(crate) const REGISTERED: &[(u32, QueryFn)] = &[(1, q1_trips_near_sedona), (2, q2_trips_in_coconino)];

/// Trips with pickup within 0.45 degrees of Sedona, nearest first.
fn q1_trips_near_sedona(store: &TableStore) -> Result<u64, QueryError> {
    let center = Geometry::Point(Point::new(SEDONA_CENTER.0, SEDONA_CENTER.1));
    let mut matches: Vec<f64> = Vec::new();

    for batch in store.table("trip")? {
        let pickups = column(batch, "trip", "t_pickuploc")?;
        for row in 0..batch.num_rows() {
            let Some(pickup) = geometry_at(pickups, "t_pickuploc", row)? else {
                continue;
            };
            let distance = Euclidean.distance(&pickup, &center);
            if distance <= Q1_RADIUS_DEG {
                matches.push(distance);
            }
        }
    }

    matches.sort_by(f64::total_cmp);
    Ok(matches.len() as u64)
}

/// Count of trip pickups inside the Coconino County zone. Produces one row.
fn q2_trips_in_coconino(store: &TableStore) -> Result<u64, QueryError> {
    let Some(boundary) = find_zone(store, Q2_ZONE_NAME)? else {
        tracing::debug!(zone = Q2_ZONE_NAME, "Zone not present, count is zero");
        return Ok(1);
    };

    let mut count = 0u64;
    for batch in store.table("trip")? {
        let pickups = column(batch, "trip", "t_pickuploc")?;
        for row in 0..batch.num_rows() {
            if let Some(pickup) = geometry_at(pickups, "t_pickuploc", row)? {
                if boundary.intersects(&pickup) {
                    count += 1;
                }
            }
        }
    }

    tracing::debug!(zone = Q2_ZONE_NAME, trips = count, "Counted pickups in zone");
    Ok(1)
}

/// Boundary of the first zone named `name`.
fn find_zone(store: &TableStore, name: &str) -> Result<Option<Geometry<f64>>, QueryError> {
    for batch in store.table("zone")? {
        let names = column(batch, "zone", "z_name")?;
        let boundaries = column(batch, "zone", "z_boundary")?;
        for row in 0..batch.num_rows() {
            if string_at(names, "z_name", row)? == Some(name) {
                return geometry_at(boundaries, "z_boundary", row);
            }
        }
    }
    Ok(None)
}
