use crate::data::model::Table;
use crate::error::{Error, Result};

/// Average of `y` over one `[lower, upper)` bin of `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    /// `NaN` for an empty bin.
    pub mean: f64,
    pub count: usize,
}

/// Average column `y` within bins of column `x` covering `[start, stop)`.
///
/// Array cells are paired element by element, scalar cells with scalar
/// cells, across every record.  Pairs with a non-finite value, or an `x`
/// outside the range, are ignored.  The last bin is cut at `stop`.
pub fn binned_average(
    table: &Table,
    x: &str,
    y: &str,
    start: f64,
    stop: f64,
    width: f64,
) -> Result<Vec<Bin>> {
    let finite = start.is_finite() && stop.is_finite() && width.is_finite();
    if !finite || width <= 0.0 || stop <= start {
        return Err(Error::InvalidBins { start, stop, width });
    }
    let x_idx = table.column_index(x)?;
    let y_idx = table.column_index(y)?;

    let n_bins = ((stop - start) / width).ceil() as usize;
    let mut sums = vec![0.0; n_bins];
    let mut counts = vec![0usize; n_bins];

    for record in table.records() {
        let xs = record.values[x_idx]
            .as_slice()
            .ok_or_else(|| Error::NotNumeric { column: x.to_string() })?;
        let ys = record.values[y_idx]
            .as_slice()
            .ok_or_else(|| Error::NotNumeric { column: y.to_string() })?;
        if xs.len() != ys.len() {
            return Err(Error::LengthMismatch {
                column: y.to_string(),
                expected: xs.len(),
                found: ys.len(),
            });
        }

        for (&xv, &yv) in xs.iter().zip(ys) {
            if !xv.is_finite() || !yv.is_finite() || xv < start || xv >= stop {
                continue;
            }
            let bin = (((xv - start) / width) as usize).min(n_bins - 1);
            sums[bin] += yv;
            counts[bin] += 1;
        }
    }

    Ok((0..n_bins)
        .map(|i| {
            let lower = start + i as f64 * width;
            let upper = (lower + width).min(stop);
            Bin {
                lower,
                upper,
                center: (lower + upper) / 2.0,
                mean: if counts[i] == 0 {
                    f64::NAN
                } else {
                    sums[i] / counts[i] as f64
                },
                count: counts[i],
            }
        })
        .collect())
}
