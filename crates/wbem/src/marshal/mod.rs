//! Value marshalling from native VARIANTs to host values

mod arrays;
mod datetime;
mod value;

pub use arrays::convert_array;
pub use datetime::{cim_datetime_to_millis, ole_date_to_millis, CimDateTime};
pub use value::convert;
