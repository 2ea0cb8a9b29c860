use std::path::{Path, PathBuf};

use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// RawVariable – what an array-file hands to the extractor
// ---------------------------------------------------------------------------

/// The first record slice of one variable.  `None` entries are masked
/// (the `'--'` sentinel of the source format).
#[derive(Debug, Clone, PartialEq)]
pub enum RawVariable {
    /// Character data, one entry per byte.
    Chars(Vec<Option<u8>>),
    /// Numeric data, flattened.  `scalar` is set when the slice is a single
    /// value rather than a profile.
    Numbers {
        values: Vec<Option<f64>>,
        scalar: bool,
    },
}

/// A self-describing file of named variables, opened for reading.
pub trait ArrayFile {
    /// Path used in diagnostics.
    fn path(&self) -> &Path;

    /// Read the first record slice of `name`, or `Ok(None)` when the file
    /// has no such variable.
    fn read_first_slice(&self, name: &str) -> Result<Option<RawVariable>>;
}

// ---------------------------------------------------------------------------
// NetCDF implementation
// ---------------------------------------------------------------------------

/// A netCDF file opened read-only.
pub struct NetcdfFile {
    path: PathBuf,
    file: netcdf::File,
}

impl NetcdfFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = netcdf::open(path).map_err(|source| Error::NetCdf {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn nc_err(&self, source: netcdf::Error) -> Error {
        Error::NetCdf {
            path: self.path.clone(),
            source,
        }
    }

    fn read_chars(&self, var: &netcdf::Variable<'_>) -> Result<Vec<Option<u8>>> {
        let fill = char_fill(var);
        let bytes = var.get_raw_values(..).map_err(|e| self.nc_err(e))?;
        let width = first_slice_len(var, bytes.len());
        Ok(bytes
            .into_iter()
            .take(width)
            .map(|b| (b != fill).then_some(b))
            .collect())
    }

    fn read_string(&self, var: &netcdf::Variable<'_>) -> Result<Vec<Option<u8>>> {
        let text = if var.dimensions().is_empty() {
            var.get_string(..)
        } else {
            var.get_string((0,))
        }
        .map_err(|e| self.nc_err(e))?;
        Ok(text.into_bytes().into_iter().map(Some).collect())
    }

    fn read_numbers(
        &self,
        var: &netcdf::Variable<'_>,
        vartype: &NcVariableType,
    ) -> Result<Vec<Option<f64>>> {
        macro_rules! values_as_f64 {
            ($t:ty) => {
                var.get_values::<$t, _>(..)
                    .map_err(|e| self.nc_err(e))?
                    .into_iter()
                    .map(|v| v as f64)
                    .collect::<Vec<f64>>()
            };
        }

        let raw: Vec<f64> = match vartype {
            NcVariableType::Float(FloatType::F32) => values_as_f64!(f32),
            NcVariableType::Float(FloatType::F64) => values_as_f64!(f64),
            NcVariableType::Int(IntType::I8) => values_as_f64!(i8),
            NcVariableType::Int(IntType::U8) => values_as_f64!(u8),
            NcVariableType::Int(IntType::I16) => values_as_f64!(i16),
            NcVariableType::Int(IntType::U16) => values_as_f64!(u16),
            NcVariableType::Int(IntType::I32) => values_as_f64!(i32),
            NcVariableType::Int(IntType::U32) => values_as_f64!(u32),
            NcVariableType::Int(IntType::I64) => values_as_f64!(i64),
            NcVariableType::Int(IntType::U64) => values_as_f64!(u64),
            _ => {
                log::debug!(
                    "{}: variable '{}' has non-numeric type {vartype:?}, reading as missing",
                    self.path.display(),
                    var.name()
                );
                vec![f64::NAN; var.len()]
            }
        };

        let fill = attribute_f64(var, "_FillValue").or_else(|| default_fill(vartype));
        let missing = attribute_f64(var, "missing_value");
        let scale = attribute_f64(var, "scale_factor").unwrap_or(1.0);
        let offset = attribute_f64(var, "add_offset").unwrap_or(0.0);

        let width = first_slice_len(var, raw.len());
        Ok(raw
            .into_iter()
            .take(width)
            .map(|v| {
                let masked = v.is_nan() || Some(v) == fill || Some(v) == missing;
                (!masked).then(|| v * scale + offset)
            })
            .collect())
    }
}

impl ArrayFile for NetcdfFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read_first_slice(&self, name: &str) -> Result<Option<RawVariable>> {
        let Some(var) = self.file.variable(name) else {
            return Ok(None);
        };
        let vartype = var.vartype();
        let raw = match vartype {
            NcVariableType::Char => RawVariable::Chars(self.read_chars(&var)?),
            NcVariableType::String => RawVariable::Chars(self.read_string(&var)?),
            _ => RawVariable::Numbers {
                values: self.read_numbers(&var, &vartype)?,
                scalar: var.dimensions().len() <= 1,
            },
        };
        Ok(Some(raw))
    }
}

/// Number of elements in the slice at index 0 of the first dimension.
fn first_slice_len(var: &netcdf::Variable<'_>, total: usize) -> usize {
    match var.dimensions().first() {
        Some(dim) if dim.len() > 0 => total / dim.len(),
        Some(_) => 0,
        None => total,
    }
}

/// Read a numeric attribute as `f64`, ignoring non-numeric ones.
fn attribute_f64(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    let value = var.attribute_value(name)?.ok()?;
    match value {
        AttributeValue::Uchar(v) => Some(v as f64),
        AttributeValue::Schar(v) => Some(v as f64),
        AttributeValue::Ushort(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Uint(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Uchars(v) => v.first().map(|&x| x as f64),
        AttributeValue::Schars(v) => v.first().map(|&x| x as f64),
        AttributeValue::Shorts(v) => v.first().map(|&x| x as f64),
        AttributeValue::Ints(v) => v.first().map(|&x| x as f64),
        AttributeValue::Floats(v) => v.first().map(|&x| x as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        _ => None,
    }
}

/// Fill byte of a character variable.  The attribute is normally text, but
/// a numeric one is accepted too.
fn char_fill(var: &netcdf::Variable<'_>) -> u8 {
    match var.attribute_value("_FillValue").and_then(|v| v.ok()) {
        Some(AttributeValue::Str(s)) => s.bytes().next().unwrap_or(0),
        _ => attribute_f64(var, "_FillValue").map_or(0, |v| v as u8),
    }
}

/// netCDF default fill value, used when a variable sets no `_FillValue`.
/// Only floating types; integer data (quality flags in particular) keeps
/// every value.
fn default_fill(vartype: &NcVariableType) -> Option<f64> {
    match vartype {
        NcVariableType::Float(FloatType::F32) => Some(9.969_209_968_386_869e36_f32 as f64),
        NcVariableType::Float(FloatType::F64) => Some(9.969_209_968_386_869e36),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fill_applies_to_floating_types_only() {
        assert!(default_fill(&NcVariableType::Float(FloatType::F32)).is_some());
        assert_eq!(
            default_fill(&NcVariableType::Float(FloatType::F64)),
            Some(9.969_209_968_386_869e36)
        );
        for int in [IntType::I8, IntType::U8, IntType::I16, IntType::I32] {
            assert_eq!(default_fill(&NcVariableType::Int(int)), None);
        }
    }
}
