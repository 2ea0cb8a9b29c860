use crate::data::model::{FieldValue, Table};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Finite differences
// ---------------------------------------------------------------------------

/// Successive differences `a[i+1] - a[i]`.  Empty for fewer than two values.
pub fn difference(a: &[f64]) -> Vec<f64> {
    a.windows(2).map(|w| w[1] - w[0]).collect()
}

/// First-order estimate of `d(ln f)/dt` between neighbouring samples.
///
/// With `r = Δf / f`, the step in `ln f` is `ln(1 + r) ≈ r - r²/2`; the
/// second term is the correction over the plain `Δf / (f Δt)` estimate.
/// Returns `n - 1` values.
pub fn log_derivative(f: &[f64], t: &[f64]) -> Result<Vec<f64>> {
    if f.len() != t.len() {
        return Err(Error::LengthMismatch {
            column: "t".to_string(),
            expected: f.len(),
            found: t.len(),
        });
    }
    let df = difference(f);
    let dt = difference(t);
    Ok(df
        .iter()
        .zip(&dt)
        .zip(f)
        .map(|((df, dt), f)| {
            let r = df / f;
            (r - r * r / 2.0) / dt
        })
        .collect())
}

/// Mean of the finite entries of [`log_derivative`]; `NaN` when none are.
pub fn average_log_derivative(f: &[f64], t: &[f64]) -> Result<f64> {
    let (sum, n) = log_derivative(f, t)?
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    Ok(if n == 0 { f64::NAN } else { sum / n as f64 })
}

// ---------------------------------------------------------------------------
// Derived column
// ---------------------------------------------------------------------------

/// Default name of the column written by [`append_average_log_derivative`].
pub fn slope_column_name(variable: &str, wrt: &str) -> String {
    format!("dln_{variable}_d{wrt}")
}

/// For every record, average `d(ln variable)/d(wrt)` and append the result
/// as one scalar column called `name`.  Row count and existing values are
/// left untouched.
pub fn append_average_log_derivative(
    table: &mut Table,
    variable: &str,
    wrt: &str,
    name: &str,
) -> Result<()> {
    let f_idx = table.column_index(variable)?;
    let t_idx = table.column_index(wrt)?;

    let slopes = table
        .records()
        .iter()
        .map(|record| {
            let f = numbers(&record.values[f_idx], variable)?;
            let t = numbers(&record.values[t_idx], wrt)?;
            if f.len() != t.len() {
                return Err(Error::LengthMismatch {
                    column: wrt.to_string(),
                    expected: f.len(),
                    found: t.len(),
                });
            }
            average_log_derivative(f, t).map(FieldValue::Float)
        })
        .collect::<Result<Vec<_>>>()?;

    table.append_column(name, slopes)?;
    log::debug!("appended column '{name}' to {} rows", table.len());
    Ok(())
}

fn numbers<'a>(value: &'a FieldValue, column: &str) -> Result<&'a [f64]> {
    value.as_slice().ok_or_else(|| Error::NotNumeric {
        column: column.to_string(),
    })
}
