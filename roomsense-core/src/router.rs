//! Topic classification
//!
//! Topics are slash-delimited paths ending in a sensor-type segment, e.g.
//! `Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_de_CO2`. Classification is
//! substring containment against each known suffix in [`SensorKind::KNOWN`]
//! order; the first match wins.

use crate::events::SensorKind;

/// Classifies topics into sensor kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicRouter;

impl TopicRouter {
    pub const fn new() -> Self {
        Self
    }

    /// Map a topic to its sensor kind. Total: unmatched topics are `Unknown`.
    pub fn classify(&self, topic: &str) -> SensorKind {
        classify(topic)
    }
}

/// Map a topic to its sensor kind
pub fn classify(topic: &str) -> SensorKind {
    SensorKind::KNOWN
        .into_iter()
        .find(|kind| kind.topic_suffix().is_some_and(|suffix| topic.contains(suffix)))
        .unwrap_or(SensorKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "Batiment_3/1er/KM_102/Afficheur_n_1/";

    #[test]
    fn known_topics() {
        let router = TopicRouter::new();
        assert_eq!(
            router.classify(&alloc::format!("{PREFIX}Capteur_temperature_et_humidité")),
            SensorKind::TemperatureHumidity
        );
        assert_eq!(
            router.classify(&alloc::format!("{PREFIX}Capteur_de_CO2")),
            SensorKind::Co2Particulate
        );
        assert_eq!(
            router.classify(&alloc::format!("{PREFIX}Capteur_de_son")),
            SensorKind::Sound
        );
    }

    #[test]
    fn sound_anywhere_in_path() {
        assert_eq!(classify("Capteur_de_son"), SensorKind::Sound);
        assert_eq!(classify("other/building/Capteur_de_son/raw"), SensorKind::Sound);
    }

    #[test]
    fn unknown_topics() {
        assert_eq!(classify(""), SensorKind::Unknown);
        assert_eq!(classify("Batiment_3/1er/KM_102/Afficheur_n_1/Capteur_de_lumiere"), SensorKind::Unknown);
        // Without the accent the suffix does not match
        assert_eq!(classify("a/Capteur_temperature_et_humidite"), SensorKind::Unknown);
        assert_eq!(classify("a/capteur_de_son"), SensorKind::Unknown);
    }

    #[test]
    fn priority_order() {
        assert_eq!(
            classify("Capteur_de_son/Capteur_temperature_et_humidité"),
            SensorKind::TemperatureHumidity
        );
        assert_eq!(classify("Capteur_de_son/Capteur_de_CO2"), SensorKind::Co2Particulate);
    }
}
