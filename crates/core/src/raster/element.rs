//! Cell value trait for raster grids

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Radiance grids are `f64`; zone grids produced by rasterizing boundaries
/// use integer types. No-data detection differs between the two: floats
/// treat `NaN` as no-data regardless of the declared sentinel.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Sentinel used when a raster has no declared no-data value
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_int {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn default_nodata() -> Self {
                    <$t>::MIN
                }

                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    nodata == Some(*self)
                }
            }
        )*
    };
}

macro_rules! impl_raster_element_float {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn default_nodata() -> Self {
                    <$t>::NAN
                }

                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    if self.is_nan() {
                        return true;
                    }
                    match nodata {
                        Some(nd) if nd.is_nan() => false,
                        Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                        None => false,
                    }
                }
            }
        )*
    };
}

impl_raster_element_int!(i16, i32, u8, u16, u32);
impl_raster_element_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::NAN.is_nodata(Some(-9999.0)));
    }

    #[test]
    fn declared_sentinel_matches() {
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(!(0.0_f64).is_nodata(Some(-9999.0)));
        assert!(0_i32.is_nodata(Some(0)));
        assert!(!7_i32.is_nodata(None));
    }
}
