//! Write projected curves as CSV: one row per axis value, one column per
//! compared operator.

use std::io::Write;

use crate::dps::curve::CurvePoint;

/// Header is `axis_value,<label...>`; a label missing from a point leaves
/// its cell empty.
pub fn write_curve_csv<W: Write>(
    points: &[CurvePoint],
    labels: &[String],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(labels.len() + 1);
    header.push("axis_value".to_string());
    header.extend(labels.iter().cloned());
    csv_writer.write_record(&header)?;

    for point in points {
        let mut row = Vec::with_capacity(labels.len() + 1);
        row.push(point.axis_value.to_string());
        for label in labels {
            row.push(
                point
                    .values
                    .get(label)
                    .map(|value| format!("{value:.2}"))
                    .unwrap_or_default(),
            );
        }
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Labels in first-seen order across `points`.
pub fn curve_labels(points: &[CurvePoint]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for point in points {
        for label in point.values.keys() {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn writes_header_and_rows() {
        let points = vec![
            CurvePoint {
                axis_value: 0.0,
                values: BTreeMap::from([("Blaze".to_string(), 100.0)]),
            },
            CurvePoint {
                axis_value: 100.0,
                values: BTreeMap::from([("Blaze".to_string(), 87.5)]),
            },
        ];
        let labels = vec!["Blaze".to_string(), "Amiya".to_string()];
        let mut out = Vec::new();
        write_curve_csv(&points, &labels, &mut out).expect("csv write");

        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "axis_value,Blaze,Amiya\n0,100.00,\n100,87.50,\n");
    }
}
