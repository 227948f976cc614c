//! The municipality class table ("gemeenteklassen") of one year: one row per municipality with
//! its province, size class, urbanity and number of residents.

use crate::error::Res;
use crate::model::{Mapping, MunicipalityProfile};
use crate::source::iv3::{parse_profile, RESIDENTS_COLUMN};
use crate::source::{base_name, read_table, MUNICIPALITY_COLUMN};
use anyhow::{anyhow, Context};

pub(crate) const DELIMITER: u8 = b'\t';

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ClassTable {
    profiles: Vec<MunicipalityProfile>,
}

impl ClassTable {
    pub fn parse(text: &str) -> Res<Self> {
        let (headers, data) = read_table(text, DELIMITER)?;
        let mapping = Mapping::new(&headers)?;
        let name_ix = mapping.require(MUNICIPALITY_COLUMN)?;
        mapping.require(RESIDENTS_COLUMN)?;
        let profiles = data
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                parse_profile(&mapping, cells, cells[name_ix].trim())
                    .with_context(|| format!("Bad class data in line {}", i + 2))
            })
            .collect::<Res<Vec<_>>>()?;
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[MunicipalityProfile] {
        &self.profiles
    }

    /// Looks `municipality` up by its name without the ` (gemeente)` suffix.
    pub fn profile(&self, municipality: &str) -> Option<&MunicipalityProfile> {
        let wanted = base_name(municipality);
        self.profiles.iter().find(|p| base_name(&p.name) == wanted)
    }

    pub fn residents(&self, municipality: &str) -> Res<u64> {
        let profile = self
            .profile(municipality)
            .ok_or_else(|| anyhow!("'{municipality}' is not in the municipality classes"))?;
        profile
            .residents
            .ok_or_else(|| anyhow!("The number of residents of '{municipality}' is unknown"))
    }
}
