//! Concrete sensor realizations
//!
//! Three representative kinds, each applying the shared imperfection
//! pipeline to a different reading shape:
//!
//! - [`ChemicalArraySensor`]: N named channels with cross-sensitivity
//! - [`ThermalImagerSensor`]: 2-D grid with pixel defects and optical blur
//! - [`FieldSensor`]: scalar magnitude with frequency/directional
//!   response, EMI, and optional spectrum output

mod chemical;
mod field;
mod thermal;

pub use chemical::{ChemicalArrayParams, ChemicalArraySensor};
pub use field::{FieldParams, FieldSensor, SpectrumParams};
pub use thermal::{ThermalImagerParams, ThermalImagerSensor};
