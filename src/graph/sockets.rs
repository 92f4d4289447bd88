//! Socket names used when wiring material graphs.

pub const BSDF: &str = "BSDF";
pub const SURFACE: &str = "Surface";
pub const DISPLACEMENT: &str = "Displacement";

pub const BASE_COLOR: &str = "Base Color";
pub const SUBSURFACE: &str = "Subsurface";
pub const METALLIC: &str = "Metallic";
pub const SPECULAR: &str = "Specular";
pub const ROUGHNESS: &str = "Roughness";
pub const EMISSION: &str = "Emission";
pub const ALPHA: &str = "Alpha";
pub const NORMAL: &str = "Normal";

pub const VECTOR: &str = "Vector";
pub const SCALE: &str = "Scale";
pub const UV: &str = "UV";
pub const OBJECT: &str = "Object";
pub const COLOR: &str = "Color";
pub const FAC: &str = "Fac";
pub const HEIGHT: &str = "Height";
pub const VALUE: &str = "Value";
pub const INPUT: &str = "Input";
pub const OUTPUT: &str = "Output";
