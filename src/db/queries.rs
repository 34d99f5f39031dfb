pub const INSERT_ALERT: &str = r#"
INSERT INTO alerts (alert_id, timestamp, lng, lat, source, confirmed, status, confidence, sensor_readings)
VALUES ($1, $2, $3, $4, $5, FALSE, 'new', $6, $7)
RETURNING *;
"#;

pub const SELECT_ALERT_BY_ID: &str = r#"
SELECT * FROM alerts WHERE alert_id = $1;
"#;

pub const SELECT_RECENT_ALERTS: &str = r#"
SELECT * FROM alerts ORDER BY timestamp DESC LIMIT $1;
"#;

// $4/$5 are the target lat/lng in degrees, $6 the radius in meters. The
// BETWEEN predicates are a bounding-box prefilter the (lat, lng) index can
// serve (one degree of latitude is ~111.32 km; longitude shrinks by
// cos(lat)); the haversine term then applies the exact great-circle cutoff.
// The time window is one-sided: [$2, $3] ends at the target timestamp so
// only preceding detections match.
pub const SELECT_RELATED_ALERTS: &str = r#"
SELECT * FROM alerts
WHERE alert_id <> $1
  AND timestamp >= $2
  AND timestamp <= $3
  AND lat BETWEEN $4 - ($6 / 111320.0) AND $4 + ($6 / 111320.0)
  AND lng BETWEEN $5 - ($6 / (111320.0 * cos(radians($4))))
              AND $5 + ($6 / (111320.0 * cos(radians($4))))
  AND 2.0 * 6371000.0 * asin(sqrt(
        pow(sin(radians(lat - $4) / 2.0), 2)
        + cos(radians($4)) * cos(radians(lat))
          * pow(sin(radians(lng - $5) / 2.0), 2)
      )) <= $6
ORDER BY timestamp DESC
LIMIT $7;
"#;

// Mutations write only the fields they own, as single conditional updates.

pub const UPDATE_ALERT_CONFIRMED: &str = r#"
UPDATE alerts
SET confirmed = $2,
    updated_at = NOW()
WHERE alert_id = $1
RETURNING *;
"#;

pub const UPDATE_ALERT_ASSIGNMENT: &str = r#"
UPDATE alerts
SET assigned_ranger = $2,
    status = 'assigned',
    notes = COALESCE($3, notes),
    updated_at = NOW()
WHERE alert_id = $1
RETURNING *;
"#;

pub const UPDATE_ALERT_NOTES: &str = r#"
UPDATE alerts
SET notes = $2,
    updated_at = NOW()
WHERE alert_id = $1
RETURNING *;
"#;

// resolved_at is non-null iff the new status is terminal; COALESCE keeps the
// original resolution time when the same terminal status is set again.
pub const UPDATE_ALERT_STATUS: &str = r#"
UPDATE alerts
SET status = $2,
    resolution_notes = $3,
    resolved_at = CASE
        WHEN $2 IN ('resolved', 'false_positive') THEN COALESCE(resolved_at, NOW())
        ELSE NULL
    END,
    updated_at = NOW()
WHERE alert_id = $1
RETURNING *;
"#;

pub const COUNT_ALERTS_IN_RANGE: &str = r#"
SELECT 'total' AS bucket, COUNT(*)::BIGINT AS count
FROM alerts
WHERE ($1::timestamptz IS NULL OR timestamp >= $1)
  AND ($2::timestamptz IS NULL OR timestamp <= $2);
"#;

pub const COUNT_ALERTS_BY_BUCKET: &str = r#"
SELECT to_char(timestamp, $3) AS bucket, COUNT(*)::BIGINT AS count
FROM alerts
WHERE ($1::timestamptz IS NULL OR timestamp >= $1)
  AND ($2::timestamptz IS NULL OR timestamp <= $2)
GROUP BY bucket
ORDER BY bucket ASC;
"#;

pub const SELECT_ACTIVE_RANGERS: &str = r#"
SELECT * FROM rangers WHERE is_active = TRUE ORDER BY name ASC;
"#;

pub const SELECT_RANGER_BY_ID: &str = r#"
SELECT * FROM rangers WHERE ranger_id = $1;
"#;

pub const UPDATE_RANGER_LOCATION: &str = r#"
UPDATE rangers
SET lng = $2,
    lat = $3,
    updated_at = NOW()
WHERE ranger_id = $1
RETURNING *;
"#;

pub const SELECT_SENSORS: &str = r#"
SELECT * FROM sensors ORDER BY sensor_id ASC;
"#;
