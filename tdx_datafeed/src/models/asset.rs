use std::fmt;

use serde::{Deserialize, Serialize};

/// Asset class as understood by the symbol mapper.
///
/// [`AssetClass::code`] gives the short asset-type code (`E`, `I`, `FT`)
/// listing services use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Index,
    Futures,
}

impl AssetClass {
    pub fn code(self) -> &'static str {
        match self {
            AssetClass::Equity => "E",
            AssetClass::Index => "I",
            AssetClass::Futures => "FT",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
