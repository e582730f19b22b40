pub mod csv_io;
pub mod record;

pub use csv_io::*;
pub use record::*;
