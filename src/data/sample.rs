use std::path::Path;

use netcdf::types::{NcTypeDescriptor, NcVariableType};

use crate::error::{Error, Result};

/// Fill value written for missing samples.
pub const FILL_VALUE: f64 = -99_999.0;

// ---------------------------------------------------------------------------
// Sounding – contents of one synthetic source file
// ---------------------------------------------------------------------------

/// Variables of one sounding file: a character identifier, scalars on the
/// record dimension and profiles on the record and a level dimension.
/// `NaN` samples are written as [`FILL_VALUE`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sounding {
    pub id_variable: String,
    pub id: String,
    pub scalars: Vec<(String, f64)>,
    pub profiles: Vec<(String, Vec<f64>)>,
}

impl Sounding {
    /// Drop a variable, as a partially processed file would lack it.
    pub fn remove(&mut self, name: &str) {
        self.scalars.retain(|(n, _)| n != name);
        self.profiles.retain(|(n, _)| n != name);
    }
}

/// Write `sounding` as a netCDF-4 file.
pub fn write_sounding(path: &Path, sounding: &Sounding) -> Result<()> {
    let nc_err = |source: netcdf::Error| Error::NetCdf {
        path: path.to_path_buf(),
        source,
    };

    let mut nc = netcdf::create(path).map_err(nc_err)?;
    nc.add_dimension("dim_unlim", 1).map_err(nc_err)?;

    // Identifier padded with fill bytes, like fixed-width char arrays are.
    let id_width = sounding.id.len() + 4;
    nc.add_dimension("dim_char", id_width).map_err(nc_err)?;
    nc.add_variable_with_type(
        &sounding.id_variable,
        &["dim_unlim", "dim_char"],
        &NcVariableType::Char,
    )
    .map_err(nc_err)?;

    for (name, _) in &sounding.scalars {
        let mut var = nc.add_variable::<f64>(name, &["dim_unlim"]).map_err(nc_err)?;
        var.set_fill_value(FILL_VALUE).map_err(nc_err)?;
    }
    for (name, values) in &sounding.profiles {
        let dim = format!("dim_{name}");
        nc.add_dimension(&dim, values.len().max(1)).map_err(nc_err)?;
        let mut var = nc
            .add_variable::<f64>(name, &["dim_unlim", dim.as_str()])
            .map_err(nc_err)?;
        var.set_fill_value(FILL_VALUE).map_err(nc_err)?;
    }

    let missing = |name: &str| Error::MissingVariable {
        path: path.to_path_buf(),
        variable: name.to_string(),
    };

    nc.variable_mut(&sounding.id_variable)
        .ok_or_else(|| missing(&sounding.id_variable))?
        .put_values(&NcChar::padded(&sounding.id, id_width, 0), ..)
        .map_err(nc_err)?;

    for (name, value) in &sounding.scalars {
        nc.variable_mut(name)
            .ok_or_else(|| missing(name))?
            .put_values(&[or_fill(*value)], ..)
            .map_err(nc_err)?;
    }
    for (name, values) in &sounding.profiles {
        let mut data: Vec<f64> = values.iter().copied().map(or_fill).collect();
        if data.is_empty() {
            data.push(FILL_VALUE);
        }
        nc.variable_mut(name)
            .ok_or_else(|| missing(name))?
            .put_values(&data, ..)
            .map_err(nc_err)?;
    }
    Ok(())
}

/// One `NC_CHAR` element.  `i8`/`u8` map to the byte types, so text goes
/// through this wrapper.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NcChar(pub u8);

// SAFETY: single byte, same layout as the C `char` netCDF reads and writes.
unsafe impl NcTypeDescriptor for NcChar {
    fn type_descriptor() -> NcVariableType {
        NcVariableType::Char
    }
}

impl NcChar {
    /// `text` followed by `fill` bytes up to `width` (truncated if longer).
    pub fn padded(text: &str, width: usize, fill: u8) -> Vec<NcChar> {
        let mut chars: Vec<NcChar> = text.bytes().take(width).map(NcChar).collect();
        chars.resize(width, NcChar(fill));
        chars
    }
}

fn or_fill(v: f64) -> f64 {
    if v.is_nan() {
        FILL_VALUE
    } else {
        v
    }
}

// ---------------------------------------------------------------------------
// Synthetic profiles
// ---------------------------------------------------------------------------

/// A sounding carrying every default variable, with exponential bending
/// angle and refractivity profiles over `levels` heights and a little noise.
pub fn synthetic_sounding(id: &str, levels: usize, rng: &mut SimpleRng) -> Sounding {
    let earth_radius = 6_371_000.0;
    let heights: Vec<f64> = (0..levels).map(|i| 1_000.0 + i as f64 * 500.0).collect();
    let lat = rng.uniform(-90.0, 90.0);

    let profile = |f: &dyn Fn(f64) -> f64| heights.iter().map(|&h| f(h)).collect::<Vec<f64>>();
    let mut noisy = |scale: f64, values: Vec<f64>| -> Vec<f64> {
        values.into_iter().map(|v| v * (1.0 + rng.gauss(0.0, scale))).collect()
    };

    let bangle = noisy(0.01, profile(&|h| 0.02 * (-h / 7_000.0).exp()));
    let refrac = noisy(0.005, profile(&|h| 300.0 * (-h / 7_000.0).exp()));
    let snr = noisy(0.05, profile(&|h| 800.0 - h / 100.0));
    let impact = profile(&|h| earth_radius + h);

    Sounding {
        id_variable: "occ_id".to_string(),
        id: id.to_string(),
        scalars: vec![
            ("start_time".to_string(), 6.3e8 + rng.uniform(0.0, 86_400.0)),
            ("lat".to_string(), lat),
            ("lon".to_string(), rng.uniform(-180.0, 180.0)),
            ("overall_qual".to_string(), 100.0),
            ("undulation".to_string(), rng.uniform(-50.0, 50.0)),
            ("roc".to_string(), earth_radius + rng.uniform(-20_000.0, 20_000.0)),
        ],
        profiles: vec![
            ("snr_L2p".to_string(), snr),
            ("bangle".to_string(), bangle),
            ("impact".to_string(), impact.clone()),
            ("impact_opt".to_string(), impact),
            ("refrac".to_string(), refrac),
            ("alt_refrac".to_string(), heights.clone()),
            ("geop_refrac".to_string(), heights.iter().map(|h| h * 0.998).collect()),
            ("r_coc".to_string(), (0..3).map(|_| rng.gauss(0.0, 1e3)).collect()),
        ],
    }
}

/// Deterministic splitmix64 generator for reproducible demo data.
pub struct SimpleRng(u64);

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Normal deviate (Box-Muller, cosine branch only).
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = (1.0 - self.next_f64()).max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_chars_fill_and_truncate() {
        assert_eq!(
            NcChar::padded("AB", 4, b'_'),
            [NcChar(b'A'), NcChar(b'B'), NcChar(b'_'), NcChar(b'_')]
        );
        assert_eq!(NcChar::padded("ABCDE", 2, 0), [NcChar(b'A'), NcChar(b'B')]);
    }

    #[test]
    fn rng_is_reproducible_and_in_range() {
        let mut a = SimpleRng::new(11);
        let mut b = SimpleRng::new(11);
        for _ in 0..1000 {
            let x = a.uniform(-2.0, 3.0);
            assert_eq!(x, b.uniform(-2.0, 3.0));
            assert!((-2.0..3.0).contains(&x));
            assert!(a.gauss(0.0, 1.0).is_finite());
            b.gauss(0.0, 1.0);
        }
    }
}
