// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The twelve SpatialBench queries, rendered per SQL dialect.
//!
//! Every dialect renders the same template table, so all dialects expose the
//! same identifiers by construction. Dialects differ only in how a stored
//! geometry column is read, how geometries are aggregated, and how the
//! k-nearest-neighbour join of q12 is spelled.

/// Centre of Sedona, AZ used by the radius queries.
const SEDONA_CENTER: &str = "ST_GeomFromText('POINT(-111.7610 34.8697)')";

/// How a dialect expresses the q12 nearest-neighbour join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnnStyle {
    /// Join predicate `ST_KNN(left, right, k, use_spheroid)`.
    Predicate,
    /// Ranked window over a distance-bounded join.
    Window,
}

/// Spelling differences between supported SQL dialects.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    name: &'static str,
    /// Function converting a WKB column into a geometry, `None` when the
    /// engine reads geometry columns natively.
    from_wkb: Option<&'static str>,
    union_agg: &'static str,
    knn: KnnStyle,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn geom(&self, column: &str) -> String {
        match self.from_wkb {
            Some(function) => format!("{}({})", function, column),
            None => column.to_string(),
        }
    }
}

/// Supported dialects. Names are case-sensitive.
pub const DIALECTS: [Dialect; 4] = [
    Dialect {
        name: "SedonaSpark",
        from_wkb: Some("ST_GeomFromWKB"),
        union_agg: "ST_Union_Aggr",
        knn: KnnStyle::Predicate,
    },
    Dialect {
        name: "Databricks",
        from_wkb: Some("ST_GeomFromWKB"),
        union_agg: "ST_Union_Agg",
        knn: KnnStyle::Window,
    },
    Dialect {
        name: "DuckDB",
        from_wkb: Some("ST_GeomFromWKB"),
        union_agg: "ST_Union_Agg",
        knn: KnnStyle::Window,
    },
    Dialect {
        name: "SedonaDB",
        from_wkb: None,
        union_agg: "ST_Union_Aggr",
        knn: KnnStyle::Predicate,
    },
];

/// Look up a dialect by exact name.
pub fn dialect(name: &str) -> Option<&'static Dialect> {
    DIALECTS.iter().find(|d| d.name == name)
}

pub(crate) type Template = fn(&Dialect) -> String;

/// Query templates, q1 first.
pub(crate) const TEMPLATES: [Template; 12] = [q1, q2, q3, q4, q5, q6, q7, q8, q9, q10, q11, q12];

/// Trips starting within 50km of Sedona city centre, nearest first.
fn q1(d: &Dialect) -> String {
    let pickup = d.geom("t.t_pickuploc");
    format!(
        "SELECT t.t_tripkey, t.t_pickuptime, t.t_fare, \
         ST_Distance({pickup}, {center}) AS distance_to_center \
         FROM trip t \
         WHERE ST_DWithin({pickup}, {center}, 0.45) \
         ORDER BY distance_to_center ASC, t.t_tripkey ASC",
        pickup = pickup,
        center = SEDONA_CENTER,
    )
}

/// Number of trips starting inside Coconino County.
fn q2(d: &Dialect) -> String {
    format!(
        "SELECT COUNT(*) AS trip_count \
         FROM trip t, (SELECT z_boundary FROM zone WHERE z_name = 'Coconino County' LIMIT 1) z \
         WHERE ST_Intersects({boundary}, {pickup})",
        boundary = d.geom("z.z_boundary"),
        pickup = d.geom("t.t_pickuploc"),
    )
}

/// Monthly trip statistics for trips starting within 15km of the centre.
fn q3(d: &Dialect) -> String {
    format!(
        "SELECT DATE_TRUNC('month', t.t_pickuptime) AS pickup_month, \
         COUNT(t.t_tripkey) AS total_trips, \
         AVG(t.t_distance) AS avg_distance, \
         AVG(t.t_dropofftime - t.t_pickuptime) AS avg_duration, \
         AVG(t.t_fare) AS avg_fare \
         FROM trip t \
         WHERE ST_DWithin({pickup}, {center}, 0.15) \
         GROUP BY pickup_month \
         ORDER BY pickup_month",
        pickup = d.geom("t.t_pickuploc"),
        center = SEDONA_CENTER,
    )
}

/// Zone distribution of the 1000 trips with the highest tips.
fn q4(d: &Dialect) -> String {
    format!(
        "SELECT z.z_zonekey, z.z_name, COUNT(*) AS trip_count \
         FROM zone z \
         JOIN (SELECT t.t_pickuploc FROM trip t ORDER BY t.t_tip DESC, t.t_tripkey ASC LIMIT 1000) top_trips \
         ON ST_Within({pickup}, {boundary}) \
         GROUP BY z.z_zonekey, z.z_name \
         ORDER BY trip_count DESC, z.z_zonekey ASC",
        pickup = d.geom("top_trips.t_pickuploc"),
        boundary = d.geom("z.z_boundary"),
    )
}

/// Monthly travel area of repeat customers, as the hull of their drop-offs.
fn q5(d: &Dialect) -> String {
    format!(
        "SELECT c.c_custkey, c.c_name AS customer_name, \
         DATE_TRUNC('month', t.t_pickuptime) AS pickup_month, \
         ST_Area(ST_ConvexHull({agg}({dropoff}))) AS monthly_travel_hull_area, \
         COUNT(*) AS dropoff_count \
         FROM trip t \
         JOIN customer c ON t.t_custkey = c.c_custkey \
         GROUP BY c.c_custkey, c.c_name, pickup_month \
         HAVING COUNT(*) > 5 \
         ORDER BY dropoff_count DESC, c.c_custkey ASC",
        agg = d.union_agg,
        dropoff = d.geom("t.t_dropoffloc"),
    )
}

/// Statistics for zones fully contained in a 50km box around the centre.
fn q6(d: &Dialect) -> String {
    let boundary = d.geom("z.z_boundary");
    format!(
        "SELECT z.z_zonekey, z.z_name, \
         COUNT(t.t_tripkey) AS total_pickups, \
         AVG(t.t_totalamount) AS avg_total_amount, \
         AVG(t.t_dropofftime - t.t_pickuptime) AS avg_duration \
         FROM trip t, zone z \
         WHERE ST_Intersects(ST_GeomFromText('POLYGON((-112.2110 34.4197, -111.3110 34.4197, \
         -111.3110 35.3197, -112.2110 35.3197, -112.2110 34.4197))'), {boundary}) \
         AND ST_Within({pickup}, {boundary}) \
         GROUP BY z.z_zonekey, z.z_name \
         ORDER BY total_pickups DESC, z.z_zonekey ASC",
        boundary = boundary,
        pickup = d.geom("t.t_pickuploc"),
    )
}

/// Trips whose reported distance exceeds the straight line by more than half.
fn q7(d: &Dialect) -> String {
    format!(
        "WITH trip_lengths AS ( \
         SELECT t.t_tripkey, t.t_distance AS reported_distance_m, \
         ST_Distance({pickup}, {dropoff}) / 0.000009 AS line_distance_m \
         FROM trip t) \
         SELECT t_tripkey, reported_distance_m, line_distance_m, \
         reported_distance_m / NULLIF(line_distance_m, 0) AS detour_ratio \
         FROM trip_lengths \
         WHERE reported_distance_m > line_distance_m * 1.5 \
         ORDER BY detour_ratio DESC, reported_distance_m DESC, t_tripkey ASC",
        pickup = d.geom("t.t_pickuploc"),
        dropoff = d.geom("t.t_dropoffloc"),
    )
}

/// Pickups within 500m of each building.
fn q8(d: &Dialect) -> String {
    format!(
        "SELECT b.b_buildingkey, b.b_name, COUNT(*) AS nearby_pickup_count \
         FROM trip t \
         JOIN building b ON ST_DWithin({pickup}, {boundary}, 0.0045) \
         GROUP BY b.b_buildingkey, b.b_name \
         ORDER BY nearby_pickup_count DESC, b.b_buildingkey ASC",
        pickup = d.geom("t.t_pickuploc"),
        boundary = d.geom("b.b_boundary"),
    )
}

/// Building conflation: intersection over union of overlapping footprints.
fn q9(d: &Dialect) -> String {
    let left = d.geom("b1.b_boundary");
    let right = d.geom("b2.b_boundary");
    format!(
        "WITH pairs AS ( \
         SELECT b1.b_buildingkey AS building_1, b2.b_buildingkey AS building_2, \
         ST_Area({left}) AS area_1, ST_Area({right}) AS area_2, \
         ST_Area(ST_Intersection({left}, {right})) AS overlap_area \
         FROM building b1 \
         JOIN building b2 ON b1.b_buildingkey < b2.b_buildingkey AND ST_Intersects({left}, {right})) \
         SELECT building_1, building_2, area_1, area_2, overlap_area, \
         CASE WHEN area_1 + area_2 - overlap_area = 0 THEN 1.0 \
         ELSE overlap_area / (area_1 + area_2 - overlap_area) END AS iou \
         FROM pairs \
         ORDER BY iou DESC, building_1 ASC, building_2 ASC",
        left = left,
        right = right,
    )
}

/// Per-zone trip statistics for trips starting in each zone.
fn q10(d: &Dialect) -> String {
    format!(
        "SELECT z.z_zonekey, z.z_name AS pickup_zone, \
         AVG(t.t_dropofftime - t.t_pickuptime) AS avg_duration, \
         AVG(t.t_distance) AS avg_distance, \
         COUNT(t.t_tripkey) AS num_trips \
         FROM zone z \
         LEFT JOIN trip t ON ST_Within({pickup}, {boundary}) \
         GROUP BY z.z_zonekey, z.z_name \
         ORDER BY avg_duration DESC NULLS LAST, z.z_zonekey ASC",
        pickup = d.geom("t.t_pickuploc"),
        boundary = d.geom("z.z_boundary"),
    )
}

/// Trips whose pickup and drop-off fall in different zones.
fn q11(d: &Dialect) -> String {
    format!(
        "SELECT COUNT(*) AS cross_zone_trip_count \
         FROM trip t \
         JOIN zone pickup_zone ON ST_Within({pickup}, {pickup_boundary}) \
         JOIN zone dropoff_zone ON ST_Within({dropoff}, {dropoff_boundary}) \
         WHERE pickup_zone.z_zonekey != dropoff_zone.z_zonekey",
        pickup = d.geom("t.t_pickuploc"),
        pickup_boundary = d.geom("pickup_zone.z_boundary"),
        dropoff = d.geom("t.t_dropoffloc"),
        dropoff_boundary = d.geom("dropoff_zone.z_boundary"),
    )
}

/// The five nearest buildings to each trip pickup.
fn q12(d: &Dialect) -> String {
    let pickup = d.geom("t.t_pickuploc");
    let boundary = d.geom("b.b_boundary");
    match d.knn {
        KnnStyle::Predicate => format!(
            "SELECT t.t_tripkey, b.b_buildingkey AS building_key, b.b_name AS building_name, \
             ST_Distance({pickup}, {boundary}) AS distance_to_building \
             FROM trip t \
             JOIN building b ON ST_KNN({pickup}, {boundary}, 5, FALSE) \
             ORDER BY t.t_tripkey ASC, distance_to_building ASC, b.b_buildingkey ASC",
            pickup = pickup,
            boundary = boundary,
        ),
        KnnStyle::Window => format!(
            "WITH ranked AS ( \
             SELECT t.t_tripkey, b.b_buildingkey AS building_key, b.b_name AS building_name, \
             ST_Distance({pickup}, {boundary}) AS distance_to_building, \
             ROW_NUMBER() OVER (PARTITION BY t.t_tripkey \
             ORDER BY ST_Distance({pickup}, {boundary}) ASC, b.b_buildingkey ASC) AS rn \
             FROM trip t \
             JOIN building b ON ST_DWithin({pickup}, {boundary}, 0.1)) \
             SELECT t_tripkey, building_key, building_name, distance_to_building \
             FROM ranked \
             WHERE rn <= 5 \
             ORDER BY t_tripkey ASC, distance_to_building ASC, building_key ASC",
            pickup = pickup,
            boundary = boundary,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_lookup_is_case_sensitive() {
        assert!(dialect("DuckDB").is_some());
        assert!(dialect("duckdb").is_none());
        assert!(dialect("DUCKDB").is_none());
    }

    #[test]
    fn test_native_geometry_dialect_skips_conversion() {
        let sedonadb = dialect("SedonaDB").unwrap();
        assert!(!q1(sedonadb).contains("ST_GeomFromWKB"));

        let duckdb = dialect("DuckDB").unwrap();
        assert!(q1(duckdb).contains("ST_GeomFromWKB(t.t_pickuploc)"));
    }

    #[test]
    fn test_knn_spelling() {
        assert!(q12(dialect("SedonaSpark").unwrap()).contains("ST_KNN"));
        assert!(q12(dialect("Databricks").unwrap()).contains("ROW_NUMBER()"));
    }
}
