use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StringArray, make_comparator, new_empty_array};
use arrow::compute::{SortOptions, cast, concat};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use crate::core::TabulaError;

use super::DataFrame;

pub const SUMMARY_COLUMN: &str = "summary";
pub const STATISTICS: [&str; 5] = ["count", "mean", "stddev", "min", "max"];

pub(crate) fn describe(
    frame: &DataFrame,
    columns: Option<&[&str]>,
) -> Result<DataFrame, TabulaError> {
    let schema = frame.schema();
    let targets: Vec<usize> = match columns {
        Some(names) => names
            .iter()
            .map(|name| frame.column_index(name))
            .collect::<Result<_, _>>()?,
        None => schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| is_summarizable(field.data_type()))
            .map(|(index, _)| index)
            .collect(),
    };

    let mut fields = vec![Field::new(SUMMARY_COLUMN, DataType::Utf8, true)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(STATISTICS.to_vec()))];

    for index in targets {
        let field = schema.field(index);
        let column = gather_column(frame.partitions(), index, field.data_type())?;
        let stats = ColumnStats::compute(&column)?;
        fields.push(Field::new(field.name(), DataType::Utf8, true));
        arrays.push(Arc::new(StringArray::from(stats.into_rows())));
    }

    let summary_schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(summary_schema.clone(), arrays)?;
    DataFrame::new(frame.session().clone(), summary_schema, vec![batch])
}

fn is_summarizable(data_type: &DataType) -> bool {
    data_type.is_numeric() || matches!(data_type, DataType::Utf8 | DataType::LargeUtf8)
}

fn gather_column(
    partitions: &[RecordBatch],
    index: usize,
    data_type: &DataType,
) -> Result<ArrayRef, TabulaError> {
    if partitions.is_empty() {
        return Ok(new_empty_array(data_type));
    }
    let pieces: Vec<&dyn Array> = partitions.iter().map(|b| b.column(index).as_ref()).collect();
    Ok(concat(&pieces)?)
}

#[derive(Debug, Default, PartialEq)]
struct ColumnStats {
    count: usize,
    mean: Option<f64>,
    stddev: Option<f64>,
    min: Option<String>,
    max: Option<String>,
}

impl ColumnStats {
    fn compute(column: &ArrayRef) -> Result<Self, TabulaError> {
        let count = column.len() - column.null_count();
        let (mean, stddev) = if column.data_type().is_numeric() {
            moments(column)?
        } else {
            (None, None)
        };
        let (min, max) = extremes(column)?;
        Ok(Self {
            count,
            mean,
            stddev,
            min,
            max,
        })
    }

    /// Values in `STATISTICS` order.
    fn into_rows(self) -> Vec<Option<String>> {
        vec![
            Some(self.count.to_string()),
            self.mean.map(format_double),
            self.stddev.map(format_double),
            self.min,
            self.max,
        ]
    }
}

/// Mean and sample standard deviation; stddev needs two values.
fn moments(column: &ArrayRef) -> Result<(Option<f64>, Option<f64>), TabulaError> {
    let doubles = cast(column, &DataType::Float64)?;
    let values: Vec<f64> = doubles.as_primitive::<Float64Type>().iter().flatten().collect();
    if values.is_empty() {
        return Ok((None, None));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return Ok((Some(mean), None));
    }
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Ok((Some(mean), Some((squares / (n - 1.0)).sqrt())))
}

/// Smallest and largest non-null values, found in one pass.
fn extremes(column: &ArrayRef) -> Result<(Option<String>, Option<String>), TabulaError> {
    let compare = make_comparator(column.as_ref(), column.as_ref(), SortOptions::default())?;
    let mut bounds: Option<(usize, usize)> = None;
    for row in (0..column.len()).filter(|&row| column.is_valid(row)) {
        bounds = Some(match bounds {
            None => (row, row),
            Some((min, max)) => (
                if compare(row, min) == Ordering::Less { row } else { min },
                if compare(row, max) == Ordering::Greater { row } else { max },
            ),
        });
    }

    match bounds {
        Some((min, max)) => Ok((
            Some(array_value_to_string(column.as_ref(), min)?),
            Some(array_value_to_string(column.as_ref(), max)?),
        )),
        None => Ok((None, None)),
    }
}

/// Plain decimal notation that always keeps a fractional part: `2.0`,
/// `10000000000000000.0`, `0.000000025`.
fn format_double(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array};

    use crate::session::Session;

    fn frame(columns: Vec<(&str, ArrayRef)>) -> DataFrame {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        Session::in_memory().create_dataframe(vec![batch]).unwrap()
    }

    fn column(summary: &DataFrame, name: &str) -> Vec<Option<String>> {
        let batch = summary.collect().unwrap();
        let index = batch.schema().index_of(name).unwrap();
        batch
            .column(index)
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_integer_column() {
        let frame = frame(vec![(
            "age",
            Arc::new(Int64Array::from(vec![14, 23, 16])) as ArrayRef,
        )]);
        let summary = frame.describe(None).unwrap();

        assert_eq!(summary.columns(), vec!["summary", "age"]);
        assert_eq!(column(&summary, "summary"), some(&STATISTICS));
        let age = column(&summary, "age");
        assert_eq!(age[0].as_deref(), Some("3"));
        assert_eq!(age[1].as_deref(), Some("17.666666666666668"));
        let stddev: f64 = age[2].as_deref().unwrap().parse().unwrap();
        assert!((stddev - 4.725815626252608).abs() < 1e-9);
        assert_eq!(age[3].as_deref(), Some("14"));
        assert_eq!(age[4].as_deref(), Some("23"));
    }

    #[test]
    fn test_string_column_has_no_moments() {
        let frame = frame(vec![(
            "channel",
            Arc::new(StringArray::from(vec![Some("R"), None, Some("B"), Some("C")])) as ArrayRef,
        )]);
        let summary = frame.describe(Some(&["channel"][..])).unwrap();
        assert_eq!(
            column(&summary, "channel"),
            vec![
                Some("3".to_string()),
                None,
                None,
                Some("B".to_string()),
                Some("R".to_string())
            ]
        );
    }

    #[test]
    fn test_nulls_are_skipped() {
        let frame = frame(vec![(
            "rate",
            Arc::new(Float64Array::from(vec![None, Some(4.0), Some(2.0), None])) as ArrayRef,
        )]);
        let summary = frame.describe(None).unwrap();
        let rate = column(&summary, "rate");
        assert_eq!(rate[0].as_deref(), Some("2"));
        assert_eq!(rate[1].as_deref(), Some("3.0"));
        let stddev: f64 = rate[2].as_deref().unwrap().parse().unwrap();
        assert!((stddev - 2f64.sqrt()).abs() < 1e-12);
        let min: f64 = rate[3].as_deref().unwrap().parse().unwrap();
        let max: f64 = rate[4].as_deref().unwrap().parse().unwrap();
        assert_eq!((min, max), (2.0, 4.0));
    }

    #[test]
    fn test_single_value_has_no_stddev() {
        let frame = frame(vec![(
            "x",
            Arc::new(Int64Array::from(vec![5])) as ArrayRef,
        )]);
        let x = column(&frame.describe(None).unwrap(), "x");
        assert_eq!(x[1].as_deref(), Some("5.0"));
        assert_eq!(x[2], None);
    }

    #[test]
    fn test_all_null_column() {
        let frame = frame(vec![(
            "x",
            Arc::new(Int64Array::from(vec![None, None])) as ArrayRef,
        )]);
        let x = column(&frame.describe(None).unwrap(), "x");
        assert_eq!(x, vec![Some("0".to_string()), None, None, None, None]);
    }

    #[test]
    fn test_default_skips_non_summarizable() {
        let frame = frame(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            (
                "flag",
                Arc::new(arrow::array::BooleanArray::from(vec![true, false])) as ArrayRef,
            ),
        ]);
        let summary = frame.describe(None).unwrap();
        assert_eq!(summary.columns(), vec!["summary", "id"]);
    }

    #[test]
    fn test_extremes_ignore_nulls() {
        let column: ArrayRef = Arc::new(Int64Array::from(vec![None, Some(7), Some(-3), None, Some(12)]));
        assert_eq!(
            extremes(&column).unwrap(),
            (Some("-3".to_string()), Some("12".to_string()))
        );
    }

    #[test]
    fn test_double_rendering_keeps_fraction() {
        assert_eq!(format_double(2.0), "2.0");
        assert_eq!(format_double(17.666666666666668), "17.666666666666668");
        assert_eq!(format_double(1e16), "10000000000000000.0");
        assert_eq!(format_double(2.5e-8), "0.000000025");
        assert_eq!(format_double(-4.0), "-4.0");
    }

    #[test]
    fn test_large_mean_not_in_exponent_form() {
        let frame = frame(vec![(
            "balance",
            Arc::new(Int64Array::from(vec![10_000_000_000_000_000, 10_000_000_000_000_000]))
                as ArrayRef,
        )]);
        let balance = column(&frame.describe(None).unwrap(), "balance");
        assert_eq!(balance[1].as_deref(), Some("10000000000000000.0"));
        assert_eq!(balance[2].as_deref(), Some("0.0"));
    }

    #[test]
    fn test_missing_column() {
        let frame = frame(vec![("id", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]);
        assert_eq!(
            frame.describe(Some(&["nope"][..])).unwrap_err(),
            TabulaError::ColumnNotFound("nope".to_string())
        );
    }

    #[test]
    fn test_summary_types_are_strings() {
        let frame = frame(vec![("id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef)]);
        let summary = frame.describe(None).unwrap();
        for field in summary.schema().fields() {
            assert_eq!(field.data_type(), &DataType::Utf8);
        }
        assert_eq!(summary.count(), STATISTICS.len());
    }
}
