use crate::models::Vitals;
use crate::settings::VitalAliases;

use super::payload::Payload;

/// Resolves aliased vital-sign keys into canonical vitals.
///
/// For each field the aliases are scanned in priority order. A non-zero reading
/// wins over a zero one regardless of alias priority, because a disconnected
/// sensor commonly reports `0` next to a healthy sensor reporting under another
/// name. With only zero readings present the first of them is used. This is a
/// best-effort heuristic, not a correctness guarantee.
#[derive(Debug, Clone)]
pub struct VitalNormalizer {
    aliases: VitalAliases,
}

impl VitalNormalizer {
    pub fn new(aliases: VitalAliases) -> Self {
        Self { aliases }
    }

    pub fn normalize(&self, payload: &Payload) -> Vitals {
        Vitals {
            heart_rate: resolve(payload, &self.aliases.heart_rate),
            spo2: resolve(payload, &self.aliases.spo2),
            temperature: resolve(payload, &self.aliases.temperature),
        }
    }
}

impl Default for VitalNormalizer {
    fn default() -> Self {
        Self::new(VitalAliases::default())
    }
}

fn resolve(payload: &Payload, aliases: &[String]) -> Option<f64> {
    let mut first_present = None;

    for value in aliases.iter().flat_map(|alias| payload.numbers(alias)) {
        if value != 0.0 {
            return Some(value);
        }
        if first_present.is_none() {
            first_present = Some(value);
        }
    }

    first_present
}
